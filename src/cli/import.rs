use std::path::Path;

use super::preview::{build, print_preview};
use super::Context;
use crate::error::{CajeroError, Result};

pub fn run(ctx: &Context, file: &Path, caja: Option<&str>, force: bool, skip: &[String]) -> Result<()> {
    let (bridge, preview) = build(ctx, file, caja)?;
    print_preview(&preview);

    if preview.new_count() == 0 {
        println!("Nothing to import.");
        return Ok(());
    }

    let outcome = preview.import(&bridge, force, skip)?;
    if !outcome.success {
        return Err(CajeroError::Bridge(
            outcome.error.unwrap_or_else(|| "import failed".to_string()),
        ));
    }
    if !skip.is_empty() {
        println!("{} left out", preview.new_count() - preview.selected_records(skip).len());
    }
    println!("{} imported", outcome.count);
    Ok(())
}
