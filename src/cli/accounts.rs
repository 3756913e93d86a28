use comfy_table::{Cell, Table};

use super::Context;
use crate::error::Result;
use crate::fmt::euro;

pub fn list(ctx: &Context) -> Result<()> {
    let bridge = ctx.open_bridge()?;
    let summaries = bridge.account_summaries()?;
    if summaries.is_empty() {
        println!("No accounts yet. Import a statement with `cajero import`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Caja", "Movements", "Pending", "Balance"]);
    for s in summaries {
        table.add_row(vec![
            Cell::new(s.caja),
            Cell::new(s.movements),
            Cell::new(s.pending),
            Cell::new(s.balance.map(euro).unwrap_or_default()),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}
