//! `filters` command: list registered filter sets.

use anyhow::Result;

use crate::filterset::registry;
use crate::log;

pub fn run(json: bool) -> Result<()> {
    let registry = registry();

    if json {
        let sets: Vec<_> = registry.iter().collect();
        println!("{}", serde_json::to_string_pretty(&sets)?);
        return Ok(());
    }

    for set in registry.iter() {
        let format = set
            .output_format()
            .map(|f| format!(", {f}"))
            .unwrap_or_default();
        log!(
            "filters";
            "{} ({} step{}, quality {}{})",
            set.name,
            set.steps.len(),
            if set.steps.len() == 1 { "" } else { "s" },
            set.quality,
            format
        );
    }
    Ok(())
}
