use anyhow::{Context, Result};
use kgate_config::GateConfig;
use kgate_core::WatchEvent;
use kgate_predicate::{EventFilter, PredicateFactory};
use tracing::{info, warn};

use super::read_json;
use crate::output::print_decision;

pub fn run(config: GateConfig, event_path: &str, owner: Option<&str>) -> Result<()> {
    let event: WatchEvent = serde_json::from_value(read_json(event_path)?)
        .with_context(|| format!("{event_path} is not a watch event"))?;
    let factory = PredicateFactory::from_config(config).context("Failed to build predicates")?;
    let trigger = decide(&factory, &event, owner);
    print_decision(trigger);
    Ok(())
}

/// Primary predicate without an owner kind, secondary predicate otherwise.
pub fn decide(factory: &PredicateFactory, event: &WatchEvent, owner: Option<&str>) -> bool {
    let filter: Box<dyn EventFilter> = match owner {
        Some(kind) => {
            let secondary = factory.secondary(kind);
            if !secondary.is_active() {
                warn!(owner = %kind, "owner kind is not registered, nothing will match");
            }
            Box::new(secondary)
        }
        None => Box::new(factory.primary()),
    };
    let trigger = filter.filter(event);
    info!(
        filter = %filter.name(),
        event = %event.event_type(),
        object = %event.object().identity(),
        trigger,
        "Evaluated watch event"
    );
    trigger
}
