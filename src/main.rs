use chrono::Local;
use clap::Parser;
use log::{error, info};
use purgelogs::config::{Overrides, Settings};
use purgelogs::error::ConfigError;
use purgelogs::policy::RetentionPolicy;
use purgelogs::purge::{self, PurgeMode};
use purgelogs::report;
use std::io::Write;
use std::path::PathBuf;
use std::thread;

#[derive(Parser, Debug)]
#[command(version, about = "Purge old logs", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Report what would be purged without deleting anything
    #[arg(long)]
    dry_run: bool,

    /// Root of the log tree [default: /var/www/logs]
    #[arg(long, value_name = "DIR")]
    log_path_dir: Option<PathBuf>,

    /// Continuously run every SECONDS
    #[arg(long = "loop", value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    loop_seconds: Option<u64>,

    /// Purge logs older than this many days [default: 31]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    retention_days: Option<u32>,

    /// Keep the latest successful buildset of each project
    #[arg(long)]
    build_success: bool,

    /// KEY=VALUE file providing defaults for the options above
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Args {
    // Unset switches stay None so the config file can still turn them on
    fn overrides(&self) -> Overrides {
        Overrides {
            log_path_dir: self.log_path_dir.clone(),
            retention_days: self.retention_days,
            dry_run: self.dry_run.then_some(true),
            debug: self.debug.then_some(true),
            loop_seconds: self.loop_seconds,
            build_success: self.build_success.then_some(true),
        }
    }

    fn settings(&self) -> Result<Settings, ConfigError> {
        let file = self.config.as_deref().map(Overrides::load).transpose()?;
        Settings::resolve(self.overrides(), file)
    }
}

fn main() {
    let args = Args::parse();

    let settings = match args.settings() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    setup_logging(settings.debug);
    std::process::exit(run(&settings));
}

fn setup_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}",
                Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                record.level(),
                record.args()
            )
        })
        .init();
}

/// Runs one purge, or keeps purging when a loop interval is set.
/// Returns the process exit code.
fn run(settings: &Settings) -> i32 {
    let mode = if settings.dry_run {
        PurgeMode::DryRun
    } else {
        PurgeMode::Delete
    };

    loop {
        info!("Starting cleaning-up log dir...");
        // Cutoff moves forward on every pass
        let policy = RetentionPolicy::older_than_days(settings.retention_days, Local::now())
            .keep_latest_successful_buildset(settings.build_success);

        match purge::purge(&settings.log_path_dir, &policy, mode) {
            Ok(report) => {
                info!(
                    "Purged {} of {} entries, {} failed",
                    report.deleted.len(),
                    report.scanned(),
                    report.failed.len()
                );
                report::print_summary(&report);
            }
            Err(e) => {
                error!("{e}");
                return 1;
            }
        }

        let Some(interval) = settings.loop_interval else {
            return 0;
        };
        info!("Cleanup done! Sleeping {}s...", interval.as_secs());
        thread::sleep(interval);
    }
}
