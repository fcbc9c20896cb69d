//! Convenience helpers for the command handler.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::cli::common::ColumnKeys;

/// Clap-friendly parser for column key lists such as `BINGO` or `B,I,N,G,O`.
pub fn parse_columns(input: &str) -> Result<ColumnKeys, String> {
    let keys: Vec<char> = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if keys.is_empty() {
        return Err("at least one column key is required".to_string());
    }
    for (idx, key) in keys.iter().enumerate() {
        if keys[..idx].contains(key) {
            return Err(format!("column key '{}' is listed more than once", key));
        }
    }
    Ok(ColumnKeys(keys))
}

/// Output path for the card with the given index.
pub fn card_path(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("card{}.png", index))
}

/// Create `dir` (and parents) unless it is the empty path.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))
}

/// Deterministic generator when a seed is given, entropy-seeded otherwise.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
