use crate::purge::PurgeReport;
use crate::types::EntryKind;
use colored::Colorize;
use comfy_table::{Attribute, Cell, Color, Table};

fn count(report: &PurgeReport, kind: EntryKind) -> usize {
    report.deleted.iter().filter(|e| e.kind == kind).count()
}

#[must_use]
pub fn summary_table(report: &PurgeReport) -> Table {
    let jobs = count(report, EntryKind::JobDir);
    let files = count(report, EntryKind::File);

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_HORIZONTAL_ONLY);
    table.set_header(vec![
        if report.dry_run { "Would delete" } else { "Deleted" },
        "Job dirs",
        "Files",
        "Freed",
        "Retained",
        "Protected",
        "Failed",
    ]);

    let failed = report.failed.len();
    table.add_row(vec![
        Cell::new(report.deleted.len()).add_attribute(Attribute::Bold),
        Cell::new(jobs),
        Cell::new(files),
        Cell::new(human_bytes::human_bytes(report.bytes_freed() as f64)).fg(Color::Green),
        Cell::new(report.retained),
        Cell::new(report.protected).fg(if report.protected > 0 {
            Color::Cyan
        } else {
            Color::White
        }),
        Cell::new(failed).fg(if failed > 0 { Color::Red } else { Color::White }),
    ]);

    table
}

pub fn print_summary(report: &PurgeReport) {
    let title = if report.dry_run {
        "=== Purge Summary (dry run) ==="
    } else {
        "=== Purge Summary ==="
    };
    println!("\n{}", title.cyan());
    println!("{}", summary_table(report));

    if report.failed.is_empty() {
        return;
    }

    println!("\n{}", format!("{} entries could not be deleted:", report.failed.len()).red());
    for err in &report.failed {
        println!("  {} {}", "⚠️".yellow(), err.path.display());
        println!("     Reason: {}", err.source.to_string().red());
    }
}
