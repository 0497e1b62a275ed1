pub mod config;
pub mod diff;
pub mod evaluate;

use std::fs;

use anyhow::{Context, Result};
use serde_json::Value;

fn read_json(path: &str) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {path}"))
}
