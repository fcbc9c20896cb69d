//! Card image composition: grid layout, thumbnails, and the text face used for headers.

pub mod font;
pub mod montage;

pub use font::{BitmapFont, TextRenderer};
pub use montage::{
    CARD_NUMBER_TEXT_SIZE, CardError, CardLayout, CardSpec, HEADER_TEXT_SIZE, SelectionPolicy,
    column_shortfalls, compose_card, generate_card, title_case,
};
