use super::Context;
use crate::bridge::LedgerBridge;
use crate::browser::MovementBrowser;
use crate::error::{CajeroError, Result};

pub fn run(ctx: &Context, caja: Option<String>) -> Result<()> {
    let bridge = ctx.open_bridge()?;
    let accounts = bridge.list_accounts()?;
    let mut browser = MovementBrowser::new(&bridge, accounts, ctx.settings.page_size);
    if let Some(caja) = caja {
        if !browser.select_account(&caja) {
            return Err(CajeroError::UnknownAccount(caja));
        }
    }
    browser.run()?;
    if let Some(outcome) = browser.last_dialog().filter(|o| o.success) {
        log::info!("browser closed after saving {} task(s)", outcome.saved);
    }
    Ok(())
}
