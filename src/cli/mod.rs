//! Command-line interface wiring for the `bingocard` binary.
//!
//! Owns the clap definition and runs the scan, game-sheet, and card steps in order.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use bingocard::{
    BitmapFont, CardLayout, CardSpec, Catalog, GameListing, column_shortfalls, generate_card,
};
use clap::Parser;
use log::{info, warn};

pub mod common;
pub mod utils;

use crate::cli::common::{ColumnKeys, PolicyArg};
use crate::cli::utils::{card_path, ensure_dir, make_rng, parse_columns};

/// Parsed CLI entrypoint for the `bingocard` binary.
#[derive(Parser, Debug)]
#[command(
    name = "bingocard",
    version,
    about = "Generate bingo-style game boards and caller sheets from a folder of images"
)]
pub struct Cli {
    /// Path for input images.
    #[arg(short = 'd', long = "dir_images", default_value = ".")]
    pub dir_images: PathBuf,
    /// Filename prefix of the game images (e.g. 'bingo' for bingo_B_cat.png).
    #[arg(short = 'n', long = "game_name", default_value = "bingo")]
    pub game_name: String,
    /// How many card files should be generated.
    #[arg(short = 'c', long = "card_count", default_value_t = 30)]
    pub card_count: usize,
    /// How many game listings should be generated.
    #[arg(short = 'g', long = "game_count", default_value_t = 6)]
    pub game_count: usize,
    /// Destination for the game listing text file.
    #[arg(short = 'G', long = "game_file", default_value = "games.txt")]
    pub game_file: PathBuf,
    /// Directory the card images are written to.
    #[arg(short = 'o', long = "output_dir", default_value = ".")]
    pub output_dir: PathBuf,
    /// Edge length of a card cell in pixels.
    #[arg(long = "cell_size", default_value_t = 200)]
    pub cell_size: u32,
    /// Rows and columns per card.
    #[arg(long = "cell_count", default_value_t = 5)]
    pub cell_count: u32,
    /// Gap between cells in pixels.
    #[arg(long, default_value_t = 20)]
    pub margin: u32,
    /// Column keys in display order, e.g. BINGO (default: every category, sorted).
    #[arg(long, value_parser = parse_columns)]
    pub columns: Option<ColumnKeys>,
    /// Separator placed between game listing columns.
    #[arg(long, default_value = "  ")]
    pub separator: String,
    /// Seed for reproducible shuffles.
    #[arg(long)]
    pub seed: Option<u64>,
    /// How column images are reordered between cards.
    #[arg(long, default_value_t = PolicyArg::Shuffle, value_enum)]
    pub policy: PolicyArg,
    /// Path to the 'free' image for the center square.
    pub image_free: String,
}

/// Execute a full generation run.
pub fn run(cli: Cli) -> Result<()> {
    if cli.image_free.trim().is_empty() {
        bail!("you must provide a 'free image' path for the center square");
    }
    let layout = CardLayout::new(cli.cell_size, cli.cell_count, cli.margin)
        .context("invalid card layout")?;
    let free_image = PathBuf::from(&cli.image_free);
    let mut rng = make_rng(cli.seed);

    let mut catalog = Catalog::scan(&cli.dir_images, &cli.game_name)
        .context("failed to build image catalog")?;
    let template = CardSpec {
        free_image: Some(free_image.as_path()),
        columns: cli.columns.as_ref().map(|keys| keys.0.as_slice()),
        layout,
        card_number: None,
        policy: cli.policy.into(),
    };
    for (key, available, needed) in column_shortfalls(&catalog, &template) {
        warn!(
            "category '{}' has {} image(s); its column needs {}",
            key, available, needed
        );
    }

    println!(
        "Creating {} games in {}...",
        cli.game_count,
        cli.game_file.display()
    );
    GameListing::generate_and_write(
        &catalog,
        &cli.game_file,
        cli.game_count,
        &cli.separator,
        &mut rng,
    )?;

    ensure_dir(&cli.output_dir)?;
    let font = BitmapFont::default();
    info!(
        "Rendering {} cards ({}x{} cells of {}px, margin {}px, policy {:?})",
        cli.card_count, cli.cell_count, cli.cell_count, cli.cell_size, cli.margin, cli.policy
    );
    for index in 0..cli.card_count {
        let target = card_path(&cli.output_dir, index);
        println!("Creating card {} in {}...", index, target.display());
        let spec = CardSpec {
            card_number: Some(index),
            ..template.clone()
        };
        generate_card(&mut catalog, &spec, &font, &mut rng, &target)
            .with_context(|| format!("failed to create card {}", index))?;
    }

    println!("All done!");
    Ok(())
}
