use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bingocard::{
    BitmapFont, CARD_NUMBER_TEXT_SIZE, CardError, CardLayout, CardSpec, Catalog,
    DEFAULT_SEPARATOR, GameListing, SelectionPolicy, TextRenderer, compose_card, generate_card,
};
use image::{ColorType, GenericImageView, Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;

const FREE: Rgba<u8> = Rgba([255, 0, 0, 255]);
const PHOTO: Rgba<u8> = Rgba([0, 0, 255, 255]);

fn solid_png(path: &Path, size: u32, color: Rgba<u8>) {
    RgbaImage::from_pixel(size, size, color).save(path).unwrap();
}

/// Directory with `per_key` images for each key plus a free image outside the scan prefix.
fn image_dir(keys: &[char], per_key: usize, size: u32) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    for key in keys {
        for n in 1..=per_key {
            solid_png(&dir.path().join(format!("bingo_{}_{}.png", key, n)), size, PHOTO);
        }
    }
    let free = dir.path().join("free.png");
    solid_png(&free, size, FREE);
    (dir, free)
}

fn uses_by_path(catalog: &Catalog) -> BTreeMap<PathBuf, u32> {
    catalog
        .iter()
        .flat_map(|(_, entries)| entries.iter().map(|e| (e.path.clone(), e.uses)))
        .collect()
}

fn center_pixel(layout: &CardLayout, col: u32, row: u32) -> (u32, u32) {
    let (x, y) = layout.cell_origin(col, row);
    let half = (layout.cell_size / 2) as i64;
    ((x + half) as u32, (y + half) as u32)
}

#[test]
fn two_by_two_card_uses_three_entries_and_the_free_image() {
    let (dir, free) = image_dir(&['A', 'B'], 2, 10);
    let mut catalog = Catalog::scan(dir.path(), "bingo").unwrap();
    assert_eq!(catalog.keys(), vec!['A', 'B']);

    let layout = CardLayout::new(10, 2, 2).unwrap();
    let spec = CardSpec {
        free_image: Some(free.as_path()),
        layout,
        ..CardSpec::default()
    };
    let mut rng = StdRng::seed_from_u64(42);
    let card = compose_card(&mut catalog, &spec, &BitmapFont::default(), &mut rng).unwrap();

    assert_eq!(card.dimensions(), (24, 36));
    let (fx, fy) = center_pixel(&layout, 1, 2);
    assert_eq!(*card.get_pixel(fx, fy), FREE);
    let (px, py) = center_pixel(&layout, 0, 2);
    assert_eq!(*card.get_pixel(px, py), PHOTO);

    let a_uses: Vec<u32> = catalog.entries('A').unwrap().iter().map(|e| e.uses).collect();
    assert_eq!(a_uses, vec![1, 1]);
    let mut b_uses: Vec<u32> = catalog.entries('B').unwrap().iter().map(|e| e.uses).collect();
    b_uses.sort();
    assert_eq!(b_uses, vec![0, 1]);
}

#[test]
fn free_image_stays_centered_and_use_counts_stay_bounded() {
    let (dir, free) = image_dir(&['A', 'B', 'C'], 5, 12);
    let mut catalog = Catalog::scan(dir.path(), "bingo").unwrap();
    let layout = CardLayout::new(12, 3, 4).unwrap();
    let font = BitmapFont::default();
    let mut rng = StdRng::seed_from_u64(7);
    let cards = 4u32;

    let mut previous = uses_by_path(&catalog);
    for number in 0..cards {
        let spec = CardSpec {
            free_image: Some(free.as_path()),
            layout,
            card_number: Some(number as usize),
            ..CardSpec::default()
        };
        let card = compose_card(&mut catalog, &spec, &font, &mut rng).unwrap();
        let (w, h) = layout.canvas_size().unwrap();
        assert_eq!(card.dimensions(), (w, h));

        let (fx, fy) = center_pixel(&layout, 1, 2);
        assert_eq!(*card.get_pixel(fx, fy), FREE);
        for (col, row) in [(0, 1), (1, 1), (2, 3), (1, 3)] {
            let (x, y) = center_pixel(&layout, col, row);
            assert_eq!(*card.get_pixel(x, y), PHOTO);
        }

        let current = uses_by_path(&catalog);
        for (path, uses) in &current {
            assert!(*uses >= previous[path]);
            assert!(*uses <= number + 1);
        }
        previous = current;
    }

    let total: u32 = previous.values().sum();
    assert_eq!(total, cards * (3 * 3 - 1));
}

#[test]
fn short_category_is_fatal() {
    let (dir, free) = image_dir(&['A'], 1, 8);
    let mut catalog = Catalog::scan(dir.path(), "bingo").unwrap();
    let spec = CardSpec {
        free_image: Some(free.as_path()),
        layout: CardLayout::new(8, 2, 0).unwrap(),
        ..CardSpec::default()
    };
    let mut rng = StdRng::seed_from_u64(1);
    let result = compose_card(&mut catalog, &spec, &BitmapFont::default(), &mut rng);
    match result {
        Err(CardError::NotEnoughImages {
            key,
            index,
            available,
        }) => {
            assert_eq!((key, index, available), ('A', 1, 1));
        }
        other => panic!("expected NotEnoughImages, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn generated_card_is_an_rgba_png() {
    let (dir, free) = image_dir(&['A', 'B'], 3, 16);
    let mut catalog = Catalog::scan(dir.path(), "bingo").unwrap();
    let out = dir.path().join("card0.png");
    let layout = CardLayout::new(16, 2, 4).unwrap();
    let spec = CardSpec {
        free_image: Some(free.as_path()),
        layout,
        card_number: Some(0),
        ..CardSpec::default()
    };
    let mut rng = StdRng::seed_from_u64(3);
    generate_card(&mut catalog, &spec, &BitmapFont::default(), &mut rng, &out).unwrap();

    let written = image::open(&out).unwrap();
    assert_eq!(written.color(), ColorType::Rgba8);
    assert_eq!(written.dimensions(), layout.canvas_size().unwrap());
    // unused corner stays transparent white
    let rgba = written.to_rgba8();
    assert_eq!(*rgba.get_pixel(0, rgba.height() - 1), Rgba([255, 255, 255, 0]));
}

#[test]
fn card_number_is_drawn_top_right() {
    let (dir, free) = image_dir(&['A'], 2, 10);
    let layout = CardLayout::new(40, 2, 0).unwrap();
    let font = BitmapFont::default();
    let columns = ['A'];

    let render = |number: Option<usize>| {
        let mut catalog = Catalog::scan(dir.path(), "bingo").unwrap();
        let spec = CardSpec {
            free_image: Some(free.as_path()),
            columns: Some(&columns[..]),
            layout,
            card_number: number,
            ..CardSpec::default()
        };
        let mut rng = StdRng::seed_from_u64(9);
        compose_card(&mut catalog, &spec, &font, &mut rng).unwrap()
    };
    let plain = render(None);
    let numbered = render(Some(5));

    // only one column is filled, so the right-hand header cell is otherwise empty
    let (width, _) = layout.canvas_size().unwrap();
    let inked = (width - 40..width)
        .flat_map(|x| (0..14).map(move |y| (x, y)))
        .filter(|&(x, y)| numbered.get_pixel(x, y)[3] > 0)
        .count();
    assert!(inked > 0);
    assert!(
        (width - 40..width)
            .flat_map(|x| (0..14).map(move |y| (x, y)))
            .all(|(x, y)| plain.get_pixel(x, y)[3] == 0)
    );
}

/// Draws headers normally but leaves the card-number label blank, keeping its size.
struct HeadersOnly(BitmapFont);

impl TextRenderer for HeadersOnly {
    fn measure(&self, text: &str, size: u32) -> (u32, u32) {
        self.0.measure(text, size)
    }

    fn render(&self, text: &str, size: u32) -> RgbaImage {
        let image = self.0.render(text, size);
        if size == CARD_NUMBER_TEXT_SIZE {
            RgbaImage::from_pixel(image.width(), image.height(), Rgba([255, 255, 255, 0]))
        } else {
            image
        }
    }
}

#[test]
fn card_number_never_overlaps_header_text() {
    let (dir, free) = image_dir(&['B', 'I', 'N', 'G', 'O'], 5, 20);
    let layout = CardLayout::default();
    let columns = ['B', 'I', 'N', 'G', 'O'];
    let font = BitmapFont::default();

    let compose = |renderer: &dyn TextRenderer| {
        let mut catalog = Catalog::scan(dir.path(), "bingo").unwrap();
        let spec = CardSpec {
            free_image: Some(free.as_path()),
            columns: Some(&columns[..]),
            layout,
            card_number: Some(3),
            ..CardSpec::default()
        };
        let mut rng = StdRng::seed_from_u64(12);
        compose_card(&mut catalog, &spec, renderer, &mut rng).unwrap()
    };
    let headers = compose(&HeadersOnly(font));
    let numbered = compose(&font);

    let label = font.render("card #3", CARD_NUMBER_TEXT_SIZE);
    let (width, _) = layout.canvas_size().unwrap();
    let x0 = width - label.width();
    let label_ink: Vec<(u32, u32)> = label
        .enumerate_pixels()
        .filter(|(_, _, p)| p[3] > 0)
        .map(|(x, y, _)| (x0 + x, y))
        .collect();
    assert!(!label_ink.is_empty());

    // the last header sits under the label's x-range, so it must start below it
    let (ox, oy) = layout.cell_origin(4, 0);
    let header_ink = (ox as u32..ox as u32 + layout.cell_size)
        .flat_map(|x| (oy as u32..oy as u32 + layout.cell_size).map(move |y| (x, y)))
        .filter(|&(x, y)| headers.get_pixel(x, y)[3] > 0)
        .count();
    assert!(header_ink > 0);

    let overlapping = label_ink
        .iter()
        .filter(|&&(x, y)| headers.get_pixel(x, y)[3] > 0)
        .count();
    assert_eq!(overlapping, 0);
    assert!(label_ink.iter().all(|&(x, y)| *numbered.get_pixel(x, y) == font.ink));
}

#[test]
fn columns_beyond_cell_count_are_ignored() {
    let (dir, _free) = image_dir(&['A', 'B', 'C'], 2, 8);
    let mut catalog = Catalog::scan(dir.path(), "bingo").unwrap();
    let columns = ['C', 'A', 'B'];
    let spec = CardSpec {
        columns: Some(&columns[..]),
        layout: CardLayout::new(8, 2, 0).unwrap(),
        ..CardSpec::default()
    };
    let mut rng = StdRng::seed_from_u64(4);
    compose_card(&mut catalog, &spec, &BitmapFont::default(), &mut rng).unwrap();

    let uses = |key| -> u32 { catalog.entries(key).unwrap().iter().map(|e| e.uses).sum() };
    assert_eq!(uses('C'), 2);
    assert_eq!(uses('A'), 2);
    assert_eq!(uses('B'), 0);
}

#[test]
fn least_used_policy_puts_fresh_images_first() {
    let (dir, free) = image_dir(&['A', 'B'], 4, 8);
    let mut catalog = Catalog::scan(dir.path(), "bingo").unwrap();
    let spec = CardSpec {
        free_image: Some(free.as_path()),
        layout: CardLayout::new(8, 2, 0).unwrap(),
        policy: SelectionPolicy::LeastUsed,
        ..CardSpec::default()
    };
    let mut rng = StdRng::seed_from_u64(5);
    let font = BitmapFont::default();

    compose_card(&mut catalog, &spec, &font, &mut rng).unwrap();
    for (_, entries) in catalog.iter() {
        let uses: Vec<u32> = entries.iter().map(|e| e.uses).collect();
        let mut sorted = uses.clone();
        sorted.sort();
        assert_eq!(uses, sorted);
    }

    // second card draws only unused images, so nothing reaches two uses yet
    compose_card(&mut catalog, &spec, &font, &mut rng).unwrap();
    assert!(uses_by_path(&catalog).values().all(|&u| u <= 1));
}

#[test]
fn rescanning_gives_the_same_catalog_contents() {
    let (dir, _free) = image_dir(&['B', 'I', 'N'], 3, 4);
    fs::write(dir.path().join("bingo_G.png"), b"not matched").unwrap();
    let first = Catalog::scan(dir.path(), "bingo").unwrap();
    let second = Catalog::scan(dir.path(), "bingo").unwrap();
    assert_eq!(first.keys(), second.keys());
    for key in first.keys() {
        let mut a: Vec<_> = first.entries(key).unwrap().iter().map(|e| e.path.clone()).collect();
        let mut b: Vec<_> = second.entries(key).unwrap().iter().map(|e| e.path.clone()).collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }
}

#[test]
fn game_file_lists_every_item_per_game() {
    let (dir, _free) = image_dir(&['A', 'B'], 2, 4);
    let catalog = Catalog::scan(dir.path(), "bingo").unwrap();
    let games = dir.path().join("games.txt");
    let mut rng = StdRng::seed_from_u64(8);
    GameListing::generate_and_write(&catalog, &games, 2, DEFAULT_SEPARATOR, &mut rng).unwrap();

    let text = fs::read_to_string(&games).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("item"));

    let mut game0 = Vec::new();
    let mut game1 = Vec::new();
    for (n, line) in lines[1..].iter().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0], (n + 1).to_string());
        game0.push(fields[1].to_string());
        game1.push(fields[2].to_string());
    }
    game0.sort();
    game1.sort();
    assert_eq!(game0, game1);
    assert_eq!(
        game0,
        vec!["bingo_A_1", "bingo_A_2", "bingo_B_1", "bingo_B_2"]
    );
}
