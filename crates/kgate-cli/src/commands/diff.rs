use anyhow::{Context, Result};
use kgate_config::DiffConfig;
use kgate_predicate::Differ;
use serde_json::Value;

use super::read_json;
use crate::output::print_json;

pub fn run(config: &DiffConfig, old_path: &str, new_path: &str) -> Result<()> {
    let old = read_json(old_path)?;
    let new = read_json(new_path)?;
    match render(config, &old, &new)? {
        Some(diff) => print_json(&diff),
        None => println!("no changes"),
    }
    Ok(())
}

/// The normalized diff as JSON, or `None` when nothing relevant changed.
pub fn render(config: &DiffConfig, old: &Value, new: &Value) -> Result<Option<Value>> {
    let diff = Differ::from_config(config)
        .changed_snapshots(old, new)
        .context("Failed to diff snapshots")?;
    if diff.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_value(&diff)?))
}
