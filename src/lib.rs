//! Picture-bingo generator: scan a folder of tagged images, compose randomized
//! card montages, and write shuffled caller sheets.

mod catalog;
mod games;
mod render;

pub use catalog::{Catalog, CatalogError, Entry, parse_filenames};
pub use games::{DEFAULT_SEPARATOR, GameListing};
pub use render::{
    BitmapFont, CARD_NUMBER_TEXT_SIZE, CardError, CardLayout, CardSpec, HEADER_TEXT_SIZE,
    SelectionPolicy, TextRenderer, column_shortfalls, compose_card, generate_card, title_case,
};
