use std::io::{self, BufRead, Write};

use super::Context;
use crate::error::{CajeroError, Result};
use crate::view::ViewController;

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "s" | "S"))
}

pub fn run(ctx: &Context, caja: &str, id: &str, yes: bool) -> Result<()> {
    let bridge = ctx.open_bridge()?;
    let mut view = ViewController::new(ctx.settings.page_size);
    view.load_account(&bridge, caja)?;

    let current = view
        .store()
        .get(id)
        .map(|r| r.is_contabilized)
        .ok_or_else(|| CajeroError::UnknownRecord(id.to_string()))?;
    let target = if current { "not accounted" } else { "accounted" };
    if !yes && !confirm(&format!("Mark {id} as {target}?"))? {
        println!("Cancelled.");
        return Ok(());
    }

    let state = view.toggle_accounted(&bridge, id)?;
    let counts = view.counts();
    println!(
        "{id} is now {}. {} contabilizados, {} pendientes.",
        if state { "accounted" } else { "not accounted" },
        counts.contabilized,
        counts.not_contabilized
    );
    Ok(())
}
