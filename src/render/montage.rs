use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageError, Rgba, RgbaImage};
use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::render::font::TextRenderer;

pub const HEADER_TEXT_SIZE: u32 = 100;
pub const CARD_NUMBER_TEXT_SIZE: u32 = 20;
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 0]);

#[derive(Debug, Error)]
pub enum CardError {
    #[error("cell size and cell count must be at least 1 and the card must fit in u32 pixels")]
    InvalidLayout,
    #[error("column '{0}' has no images in the catalog")]
    UnknownCategory(char),
    #[error("column '{0}' is listed more than once")]
    DuplicateColumn(char),
    /// `index` counts drawn images only; the free cell does not consume one.
    #[error("column '{key}' needs an image at index {index} but only has {available}")]
    NotEnoughImages {
        key: char,
        index: usize,
        available: usize,
    },
    #[error("failed to open image {path}: {source}")]
    OpenImage {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
    #[error("failed to write {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
}

/// How a column's images are reordered once the column has been placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Uniform shuffle only.
    #[default]
    Shuffle,
    /// Shuffle, then stable-sort so the least used images come first.
    LeastUsed,
}

/// Grid geometry of a card: square cells, `cell_count` columns and rows plus a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardLayout {
    pub cell_size: u32,
    pub cell_count: u32,
    pub margin: u32,
}

impl Default for CardLayout {
    fn default() -> Self {
        Self {
            cell_size: 200,
            cell_count: 5,
            margin: 20,
        }
    }
}

impl CardLayout {
    pub fn new(cell_size: u32, cell_count: u32, margin: u32) -> Result<Self, CardError> {
        let layout = Self {
            cell_size,
            cell_count,
            margin,
        };
        layout.canvas_size()?;
        Ok(layout)
    }

    /// Canvas dimensions, or `InvalidLayout` when a side is zero or overflows.
    pub fn canvas_size(&self) -> Result<(u32, u32), CardError> {
        if self.cell_size == 0 || self.cell_count == 0 {
            return Err(CardError::InvalidLayout);
        }
        let pitch = self.cell_size.checked_add(self.margin);
        let width = pitch.and_then(|p| p.checked_mul(self.cell_count));
        let height = pitch.and_then(|p| {
            self.cell_count
                .checked_add(1)
                .and_then(|rows| p.checked_mul(rows))
        });
        match (width, height) {
            (Some(width), Some(height)) => Ok((width, height)),
            _ => Err(CardError::InvalidLayout),
        }
    }

    /// Index of the free row and column.
    pub fn center_index(&self) -> u32 {
        self.cell_count / 2
    }

    /// Images column `col` draws from the catalog. The free cell needs none.
    pub fn images_needed(&self, col: u32, with_free: bool) -> usize {
        let rows = self.cell_count as usize;
        if with_free && col == self.center_index() {
            rows - 1
        } else {
            rows
        }
    }

    /// Top-left anchor of a cell. Row 0 is the header row.
    pub fn cell_origin(&self, col: u32, row: u32) -> (i64, i64) {
        let pitch = self.pitch();
        let half = (self.margin / 2) as i64;
        (half + col as i64 * pitch, half + row as i64 * pitch)
    }

    /// Where an image of the given size lands when centred in the cell anchored at `origin`.
    pub fn centered(&self, origin: (i64, i64), width: u32, height: u32) -> (i64, i64) {
        let cell = self.cell_size as i64;
        (
            origin.0 + (cell - width as i64) / 2,
            origin.1 + (cell - height as i64) / 2,
        )
    }

    fn pitch(&self) -> i64 {
        self.cell_size as i64 + self.margin as i64
    }
}

/// Everything that varies from one card to the next.
#[derive(Debug, Clone, Default)]
pub struct CardSpec<'a> {
    pub free_image: Option<&'a Path>,
    pub columns: Option<&'a [char]>,
    pub layout: CardLayout,
    pub card_number: Option<usize>,
    pub policy: SelectionPolicy,
}

impl CardSpec<'_> {
    /// Keys of the columns actually placed on the card, left to right.
    pub fn placed_columns(&self, catalog: &Catalog) -> Vec<char> {
        let mut keys = match self.columns {
            Some(keys) => keys.to_vec(),
            None => catalog.keys(),
        };
        keys.truncate(self.layout.cell_count as usize);
        keys
    }
}

/// Placed columns whose category holds fewer images than the card draws from it,
/// as `(key, available, needed)`.
pub fn column_shortfalls(catalog: &Catalog, spec: &CardSpec<'_>) -> Vec<(char, usize, usize)> {
    let with_free = spec.free_image.is_some();
    spec.placed_columns(catalog)
        .into_iter()
        .enumerate()
        .filter_map(|(col, key)| {
            let available = catalog.entries(key).map_or(0, <[_]>::len);
            let needed = spec.layout.images_needed(col as u32, with_free);
            (available < needed).then_some((key, available, needed))
        })
        .collect()
}

/// Compose one card and save it to `output`.
pub fn generate_card<R, T>(
    catalog: &mut Catalog,
    spec: &CardSpec<'_>,
    font: &T,
    rng: &mut R,
    output: &Path,
) -> Result<(), CardError>
where
    R: Rng + ?Sized,
    T: TextRenderer + ?Sized,
{
    let montage = compose_card(catalog, spec, font, rng)?;
    montage.save(output).map_err(|source| CardError::Save {
        path: output.to_path_buf(),
        source,
    })
}

/// Lay out one card in memory, drawing images from `catalog` and updating its use counts.
///
/// Each column draws consecutive entries from the front of its list; the free cell is
/// skipped without consuming one. Each placed column is reshuffled afterwards so the
/// next card draws a different subset.
pub fn compose_card<R, T>(
    catalog: &mut Catalog,
    spec: &CardSpec<'_>,
    font: &T,
    rng: &mut R,
) -> Result<RgbaImage, CardError>
where
    R: Rng + ?Sized,
    T: TextRenderer + ?Sized,
{
    let layout = spec.layout;
    let (width, height) = layout.canvas_size()?;
    let mut montage = RgbaImage::from_pixel(width, height, BACKGROUND);

    if let Some(keys) = spec.columns {
        for (idx, key) in keys.iter().enumerate() {
            if keys[..idx].contains(key) {
                return Err(CardError::DuplicateColumn(*key));
            }
        }
    }
    let columns = spec.placed_columns(catalog);
    let center = layout.center_index();

    // the card number sits in a band at the top that headers keep clear of
    let label = spec
        .card_number
        .map(|number| font.render(&format!("card #{}", number), CARD_NUMBER_TEXT_SIZE));
    let band = match &label {
        Some(label) if label.height() < layout.cell_size => label.height(),
        _ => 0,
    };

    for (col, &key) in columns.iter().enumerate() {
        let col = col as u32;
        let header_box = (layout.cell_size, layout.cell_size - band);
        let header = fit_within(
            &font.render(&title_case(&key.to_string()), HEADER_TEXT_SIZE),
            header_box,
        );
        let (hx, hy) = layout.cell_origin(col, 0);
        let x = hx + (header_box.0 as i64 - header.width() as i64) / 2;
        let y = hy + band as i64 + (header_box.1 as i64 - header.height() as i64) / 2;
        imageops::replace(&mut montage, &header, x, y);

        let entries = catalog
            .entries_mut(key)
            .ok_or(CardError::UnknownCategory(key))?;
        let mut next = 0usize;
        for row in 0..layout.cell_count {
            let origin = layout.cell_origin(col, row + 1);
            let free = match spec.free_image {
                Some(path) if col == center && row == center => Some(path),
                _ => None,
            };
            let thumb = match free {
                Some(path) => bounded_thumbnail(open_image(path)?, layout.cell_size),
                None => {
                    let available = entries.len();
                    let entry = entries
                        .get_mut(next)
                        .ok_or(CardError::NotEnoughImages {
                            key,
                            index: next,
                            available,
                        })?;
                    next += 1;
                    let thumb = bounded_thumbnail(open_image(&entry.path)?, layout.cell_size);
                    entry.uses += 1;
                    debug!(
                        "column {} row {}: {} (uses {})",
                        key,
                        row,
                        entry.path.display(),
                        entry.uses
                    );
                    thumb
                }
            };
            paste_centered(&mut montage, &thumb, &layout, origin);
        }

        entries.shuffle(rng);
        if spec.policy == SelectionPolicy::LeastUsed {
            entries.sort_by_key(|entry| entry.uses);
        }
    }

    if let Some(label) = label {
        let x = width as i64 - label.width() as i64;
        imageops::overlay(&mut montage, &label, x, 0);
    }

    Ok(montage)
}

/// Capitalise the first letter of each word and lowercase the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut start_of_word = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if start_of_word {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            start_of_word = false;
        } else {
            out.push(ch);
            start_of_word = true;
        }
    }
    out
}

fn open_image(path: &Path) -> Result<DynamicImage, CardError> {
    image::open(path).map_err(|source| CardError::OpenImage {
        path: path.to_path_buf(),
        source,
    })
}

/// Shrink to fit within `cell` on both sides, keeping aspect ratio. Never enlarges.
fn bounded_thumbnail(image: DynamicImage, cell: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    if w <= cell && h <= cell {
        return image.into_rgba8();
    }
    image.resize(cell, cell, FilterType::Lanczos3).into_rgba8()
}

/// Scale up or down, keeping aspect ratio, until one side meets the box edge.
fn fit_within(image: &RgbaImage, bounds: (u32, u32)) -> RgbaImage {
    let (w, h) = (image.width() as u64, image.height() as u64);
    let (bw, bh) = (bounds.0 as u64, bounds.1 as u64);
    let (nw, nh) = if w * bh > h * bw {
        (bw, h * bw / w)
    } else {
        (w * bh / h, bh)
    };
    imageops::resize(
        image,
        (nw as u32).max(1),
        (nh as u32).max(1),
        FilterType::Lanczos3,
    )
}

fn paste_centered(
    montage: &mut RgbaImage,
    image: &RgbaImage,
    layout: &CardLayout,
    origin: (i64, i64),
) {
    let (x, y) = layout.centered(origin, image.width(), image.height());
    imageops::replace(montage, image, x, y);
}
