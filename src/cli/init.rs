use super::Context;
use crate::error::Result;
use crate::settings::{save_settings, shellexpand_path};

pub fn run(mut ctx: Context, data_dir: Option<String>) -> Result<()> {
    if let Some(dir) = data_dir {
        let expanded = shellexpand_path(&dir);
        if ctx.db_path == ctx.settings.db_path() {
            ctx.db_path = std::path::PathBuf::from(&expanded).join("cajero.db");
        }
        ctx.settings.data_dir = expanded;
    }
    std::fs::create_dir_all(ctx.settings.data_dir())?;
    save_settings(&ctx.settings)?;
    ctx.open_bridge()?;

    println!("Data dir:   {}", ctx.settings.data_dir().display());
    println!("Database:   {}", ctx.db_path.display());
    log::info!("initialized {}", ctx.db_path.display());
    Ok(())
}
