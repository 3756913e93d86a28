use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use super::Context;
use crate::error::Result;
use crate::fmt::{euro, fecha};
use crate::preview::{load_raw_records, ImportPreview};

pub fn build(ctx: &Context, file: &Path, caja: Option<&str>) -> Result<(crate::db::SqliteBridge, ImportPreview)> {
    let raw = load_raw_records(file)?;
    let bridge = ctx.open_bridge()?;
    let preview = ImportPreview::build(&bridge, raw, caja)?;
    Ok((bridge, preview))
}

pub fn print_preview(preview: &ImportPreview) {
    let mut table = Table::new();
    table.set_header(vec!["", "Caja", "Fecha", "Concepto", "Importe", "Saldo", "Id"]);
    for r in &preview.records {
        let mark = if r.already_in_database {
            "dup".dimmed().to_string()
        } else {
            "new".green().to_string()
        };
        table.add_row(vec![
            Cell::new(mark),
            Cell::new(&r.caja),
            Cell::new(fecha(&r.fecha)),
            Cell::new(&r.concepto),
            Cell::new(euro(r.importe)),
            Cell::new(r.saldo.map(euro).unwrap_or_default()),
            Cell::new(&r.id),
        ]);
    }
    println!("{table}");

    println!(
        "{} records, {} new, {} already in the database",
        preview.records.len(),
        preview.new_count(),
        preview.records.len() - preview.new_count()
    );
    if preview.dropped > 0 {
        println!("{} records without id were skipped", preview.dropped);
    }
    if !preview.is_descending_order {
        println!("{}", "Records are not in descending date order.".red().bold());
    }
    if preview.balance.is_valid() {
        println!("{}", "Balances are consistent.".green());
    } else {
        println!(
            "{}",
            format!("Found {} balance inconsistencies:", preview.balance.issues.len())
                .yellow()
                .bold()
        );
        for issue in &preview.balance.issues {
            println!(
                "  #{} {}: expected {}, found {} (difference {})",
                issue.index,
                issue.date,
                euro(issue.expected),
                euro(issue.actual),
                euro(issue.difference)
            );
        }
    }
}

pub fn run(ctx: &Context, file: &Path, caja: Option<&str>) -> Result<()> {
    let (_bridge, preview) = build(ctx, file, caja)?;
    print_preview(&preview);
    Ok(())
}
