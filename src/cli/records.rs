use std::io;

use comfy_table::{Cell, Table};

use super::Context;
use crate::bridge::LedgerBridge;
use crate::error::{CajeroError, Result};
use crate::fmt::{euro, fecha};
use crate::search::SearchScope;
use crate::tabs::Category;
use crate::view::{ViewController, ViewSnapshot};

pub struct RecordsQuery {
    pub caja: String,
    pub tab: String,
    pub search: Option<String>,
    pub field: String,
    pub page: usize,
    pub page_size: Option<usize>,
    pub csv: bool,
}

/// Load an account and run the filter pipeline once.
pub fn query_view(bridge: &dyn LedgerBridge, query: &RecordsQuery, page_size: usize) -> Result<ViewController> {
    let tab: Category = query.tab.parse().map_err(CajeroError::Other)?;
    let scope: SearchScope = query.field.parse().map_err(CajeroError::Other)?;
    if !bridge.list_accounts()?.iter().any(|a| *a == query.caja) {
        return Err(CajeroError::UnknownAccount(query.caja.clone()));
    }

    let mut view = ViewController::new(page_size);
    view.load_account(bridge, &query.caja)?;
    view.select_tab(tab);
    view.set_scope(scope);
    if let Some(term) = &query.search {
        view.set_search(term);
    }
    view.goto_page(query.page);
    Ok(view)
}

pub fn tab_bar(snapshot: &ViewSnapshot<'_>) -> String {
    Category::TABS
        .iter()
        .map(|tab| {
            let label = format!("{} ({})", tab.label(), snapshot.counts.get(*tab));
            if *tab == snapshot.active_tab {
                format!("[{label}]")
            } else {
                label
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

pub fn status_line(snapshot: &ViewSnapshot<'_>) -> String {
    format!(
        "Page {}/{} | Rows {} of {} ({})",
        snapshot.page,
        snapshot.total_pages,
        snapshot.rows.len(),
        snapshot.filtered,
        snapshot.counts.all
    )
}

pub fn run(ctx: &Context, query: RecordsQuery) -> Result<()> {
    let bridge = ctx.open_bridge()?;
    let page_size = query.page_size.unwrap_or(ctx.settings.page_size);
    let view = query_view(&bridge, &query, page_size)?;

    if query.csv {
        let mut wtr = csv::Writer::from_writer(io::stdout());
        for record in view.filtered() {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        return Ok(());
    }

    let snapshot = view.snapshot();
    println!("{}  {}", query.caja, tab_bar(&snapshot));

    let mut table = Table::new();
    table.set_header(vec!["", "Fecha", "Concepto", "Importe", "Saldo", "Id"]);
    for r in &snapshot.rows {
        table.add_row(vec![
            Cell::new(if r.is_contabilized { "\u{2713}" } else { "" }),
            Cell::new(fecha(&r.fecha)),
            Cell::new(&r.concepto),
            Cell::new(euro(r.importe)),
            Cell::new(r.saldo.map(euro).unwrap_or_default()),
            Cell::new(&r.id),
        ]);
    }
    println!("{table}");
    println!("{}", status_line(&snapshot));
    Ok(())
}
