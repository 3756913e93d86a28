use std::path::Path;

use serde_json::Value;

use super::Context;
use crate::bridge::LedgerBridge;
use crate::cards::build_card;
use crate::error::{CajeroError, Result};
use crate::fmt::euro;
use crate::tasks::{summarize, Task};

/// A task file holds either a single task or an array of them.
pub fn parse_tasks(content: &str) -> Result<Vec<Task>> {
    let value: Value = serde_json::from_str(content)?;
    Ok(match value {
        Value::Array(_) => serde_json::from_value(value)?,
        other => vec![serde_json::from_value(other)?],
    })
}

pub fn list(ctx: &Context, movement_id: &str) -> Result<()> {
    let bridge = ctx.open_bridge()?;
    if !bridge.record_exists(movement_id)? {
        return Err(CajeroError::UnknownRecord(movement_id.to_string()));
    }
    let tasks = bridge.list_tasks(movement_id)?;
    if tasks.is_empty() {
        println!("No tasks for {movement_id}.");
        return Ok(());
    }
    let accounts = bridge.list_accounts()?;
    for task in &tasks {
        println!("{}", build_card(task, &accounts).to_text());
    }
    let summary = summarize(&tasks);
    println!("{} task(s), total {}", summary.count, euro(summary.total));
    Ok(())
}

pub fn add(ctx: &Context, movement_id: &str, file: &Path) -> Result<()> {
    let tasks = parse_tasks(&std::fs::read_to_string(file)?)?;
    let bridge = ctx.open_bridge()?;
    let saved = bridge.save_tasks(movement_id, &tasks)?;
    println!("Saved {saved} task(s) for {movement_id}");
    Ok(())
}

pub fn delete(ctx: &Context, movement_id: &str) -> Result<()> {
    let bridge = ctx.open_bridge()?;
    if !bridge.record_exists(movement_id)? {
        return Err(CajeroError::UnknownRecord(movement_id.to_string()));
    }
    let removed = bridge.delete_tasks(movement_id)?;
    println!("Removed {removed} task(s) from {movement_id}");
    Ok(())
}
