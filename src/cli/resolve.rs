//! `resolve` command: one (image, filter set) pair to a derivative path.

use anyhow::{Context, Result};
use serde_json::{Map, Value as JsonValue};

use crate::cache::DerivativeCache;
use crate::config::AppConfig;
use crate::debug;
use crate::intake;

pub fn run(image: &str, filter: &str, json: bool, config: &AppConfig) -> Result<()> {
    let source = intake::open(image, &config.media)?;
    let cache = DerivativeCache::new(config.cache.dir.clone());

    let derivative = cache
        .resolve(&source, filter)
        .with_context(|| format!("failed to resolve `{image}` through `{filter}`"))?;

    debug!(
        "resolve";
        "{} ({})",
        derivative.path.display(),
        if derivative.fresh { "built" } else { "cached" }
    );

    if json {
        // path and identity first, status after (query-style record)
        let mut obj = Map::new();
        obj.insert("source".to_string(), JsonValue::String(source.name));
        obj.insert("filter".to_string(), JsonValue::String(filter.to_string()));
        obj.insert(
            "path".to_string(),
            JsonValue::String(derivative.path.display().to_string()),
        );
        obj.insert("cached".to_string(), JsonValue::Bool(!derivative.fresh));
        println!("{}", serde_json::to_string_pretty(&JsonValue::Object(obj))?);
    } else {
        println!("{}", derivative.path.display());
    }

    Ok(())
}
