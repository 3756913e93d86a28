use super::Context;
use crate::bridge::LedgerBridge;
use crate::error::Result;

pub fn run(ctx: &Context) -> Result<()> {
    println!("Data dir:   {}", ctx.settings.data_dir().display());
    println!("Database:   {}", ctx.db_path.display());
    println!("Page size:  {}", ctx.settings.page_size);

    if ctx.db_path.exists() {
        let size = std::fs::metadata(&ctx.db_path)?.len();
        println!("DB size:    {size} bytes");

        let bridge = ctx.open_bridge()?;
        let summaries = bridge.account_summaries()?;
        let movements: usize = summaries.iter().map(|s| s.movements).sum();
        let pending: usize = summaries.iter().map(|s| s.pending).sum();

        println!();
        println!("Accounts:      {}", bridge.list_accounts()?.len());
        println!("Movements:     {movements}");
        println!("Pending:       {pending}");
        println!("Tasks:         {}", bridge.task_count()?);
    } else {
        println!();
        println!("Database not found. Run `cajero init` to set up.");
    }

    Ok(())
}
