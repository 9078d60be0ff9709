//! `ingest` command: admit files into the media library.

use std::path::PathBuf;

use anyhow::Result;

use crate::config::AppConfig;
use crate::intake;
use crate::log;

/// Admit each file, logging assigned names. Rejections are logged and
/// counted; the command fails if any file was rejected.
pub fn run(files: &[PathBuf], config: &AppConfig) -> Result<()> {
    let mut rejected = 0usize;

    for file in files {
        match intake::admit(file, &config.media) {
            Ok(source) => {
                log!("ingest"; "{} -> {}", file.display(), source.name);
            }
            Err(e) => {
                log!("error"; "{e}");
                rejected += 1;
            }
        }
    }

    if rejected > 0 {
        anyhow::bail!(
            "{rejected} file{} rejected",
            if rejected == 1 { "" } else { "s" }
        );
    }
    Ok(())
}
