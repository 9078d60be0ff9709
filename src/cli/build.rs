//! `build` command: precompute every derivative for the media library.

use std::fs;
use std::io;

use anyhow::Result;
use rayon::prelude::*;

use crate::cache::DerivativeCache;
use crate::config::AppConfig;
use crate::filterset::registry;
use crate::intake;
use crate::log;
use crate::logger::ProgressLine;

pub fn run(clean: bool, config: &AppConfig) -> Result<()> {
    if clean {
        match fs::remove_dir_all(&config.cache.dir) {
            Ok(()) => log!("build"; "cleaned {}", config.cache.dir.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    let registry = registry();
    let sources = intake::scan(&config.media, &config.cache.dir);
    if sources.is_empty() {
        log!("build"; "no admitted media in {}", config.media.dir.display());
        return Ok(());
    }

    let pairs: Vec<_> = sources
        .iter()
        .flat_map(|source| registry.iter().map(move |set| (source, set)))
        .collect();

    let cache = DerivativeCache::new(config.cache.dir.clone());
    let progress = ProgressLine::new(&[("derivatives", pairs.len())]);

    let errors: Vec<String> = pairs
        .par_iter()
        .filter_map(|(source, set)| {
            let result = cache.get_or_create(source, set);
            progress.inc("derivatives");
            result
                .err()
                .map(|e| format!("{} / {}: {e}", source.name, set.name))
        })
        .collect();

    progress.finish();

    // builds() counts every pipeline execution, including failed ones.
    let attempted = cache.builds() as usize;
    let built = attempted.saturating_sub(errors.len());
    let reused = pairs.len().saturating_sub(attempted);
    log!(
        "build";
        "{} built, {} reused across {} image{} and {} filter set{}",
        built,
        reused,
        sources.len(),
        if sources.len() == 1 { "" } else { "s" },
        registry.len(),
        if registry.len() == 1 { "" } else { "s" }
    );

    if !errors.is_empty() {
        for error in &errors {
            log!("error"; "{error}");
        }
        anyhow::bail!(
            "{} derivative{} failed",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        );
    }
    Ok(())
}
