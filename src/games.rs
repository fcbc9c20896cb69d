use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog::Catalog;

pub const DEFAULT_SEPARATOR: &str = "  ";
const INDEX_WIDTH: usize = 6;

/// Caller sheet: every catalog item, listed once per game in an independent random order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameListing {
    games: Vec<Vec<String>>,
    item_count: usize,
    name_width: usize,
}

impl GameListing {
    pub fn generate<R: Rng + ?Sized>(catalog: &Catalog, game_count: usize, rng: &mut R) -> Self {
        let mut names: Vec<String> = catalog
            .iter()
            .flat_map(|(_, entries)| entries.iter().map(|e| e.display_name()))
            .collect();
        let name_width = names.iter().map(|n| n.chars().count()).max().unwrap_or(0);

        let mut games = Vec::with_capacity(game_count);
        for _ in 0..game_count {
            names.shuffle(rng);
            games.push(names.clone());
        }
        Self {
            games,
            item_count: names.len(),
            name_width,
        }
    }

    pub fn games(&self) -> &[Vec<String>] {
        &self.games
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Table rows, header first, each cell already padded to its column width.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let mut header = vec![pad("item", INDEX_WIDTH)];
        header.extend((0..self.games.len()).map(|g| pad(&format!("game {}", g), self.name_width)));

        let mut rows = Vec::with_capacity(self.item_count + 1);
        rows.push(header);
        for n in 0..self.item_count {
            let mut row = vec![pad(&(n + 1).to_string(), INDEX_WIDTH)];
            row.extend(self.games.iter().map(|game| pad(&game[n], self.name_width)));
            rows.push(row);
        }
        rows
    }

    pub fn render(&self, separator: &str) -> String {
        let mut out = String::new();
        for row in self.rows() {
            out.push_str(&row.join(separator));
            out.push('\n');
        }
        out
    }

    /// Write the rendered table, replacing whatever is at `path`.
    pub fn write(&self, path: &Path, separator: &str) -> Result<()> {
        fs::write(path, self.render(separator))
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(
            "Wrote {} games over {} items to {}",
            self.games.len(),
            self.item_count,
            path.display()
        );
        Ok(())
    }

    pub fn generate_and_write<R: Rng + ?Sized>(
        catalog: &Catalog,
        path: &Path,
        game_count: usize,
        separator: &str,
        rng: &mut R,
    ) -> Result<Self> {
        let listing = Self::generate(catalog, game_count, rng);
        listing.write(path, separator)?;
        Ok(listing)
    }
}

fn pad(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}
