use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read image directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
}

/// One image available for a column, with the number of cards it has appeared on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub uses: u32,
    pub path: PathBuf,
}

impl Entry {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            uses: 0,
            path: path.into(),
        }
    }

    /// File stem used as the caller-facing item name.
    pub fn display_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Images grouped by category key. Shared across every card of a run, so
/// use counts and ordering carry over from one card to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    categories: BTreeMap<char, Vec<Entry>>,
}

impl Catalog {
    /// Scan `dir` for regular files named `<prefix>_<key>_*`.
    pub fn scan(dir: &Path, prefix: &str) -> Result<Self, CatalogError> {
        let read_err = |source| CatalogError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };
        let root = fs::canonicalize(dir).map_err(read_err)?;
        if !root.is_dir() {
            return Err(CatalogError::NotADirectory(dir.to_path_buf()));
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&root).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            let is_file = entry.file_type().map_err(read_err)?.is_file()
                || entry.path().is_file();
            if !is_file {
                continue;
            }
            names.push(entry.file_name().to_string_lossy().into_owned());
        }

        let grouped = parse_filenames(names.iter().map(String::as_str), prefix);
        let categories: BTreeMap<char, Vec<Entry>> = grouped
            .into_iter()
            .map(|(key, files)| {
                let entries = files
                    .into_iter()
                    .map(|name| Entry::new(root.join(name)))
                    .collect();
                (key, entries)
            })
            .collect();

        let catalog = Self { categories };
        info!(
            "Scanned {}: {} categories, {} images",
            root.display(),
            catalog.len(),
            catalog.total_entries()
        );
        Ok(catalog)
    }

    /// Build a catalog from already-known paths.
    pub fn from_entries<I, P>(groups: I) -> Self
    where
        I: IntoIterator<Item = (char, Vec<P>)>,
        P: Into<PathBuf>,
    {
        let categories = groups
            .into_iter()
            .map(|(key, paths)| (key, paths.into_iter().map(Entry::new).collect()))
            .collect();
        Self { categories }
    }

    pub fn keys(&self) -> Vec<char> {
        self.categories.keys().copied().collect()
    }

    pub fn contains(&self, key: char) -> bool {
        self.categories.contains_key(&key)
    }

    pub fn entries(&self, key: char) -> Option<&[Entry]> {
        self.categories.get(&key).map(Vec::as_slice)
    }

    pub(crate) fn entries_mut(&mut self, key: char) -> Option<&mut Vec<Entry>> {
        self.categories.get_mut(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &[Entry])> {
        self.categories.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn total_entries(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }
}

/// Group filenames shaped like `<prefix>_<key>_<rest>` by their single-character key.
///
/// Anything else is skipped. Within a key, names keep their input order.
pub fn parse_filenames<'a, I>(names: I, prefix: &str) -> BTreeMap<char, Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut grouped: BTreeMap<char, Vec<String>> = BTreeMap::new();
    for name in names {
        match category_key(name, prefix) {
            Some(key) => {
                debug!("matched {} -> {}", name, key);
                grouped.entry(key).or_default().push(name.to_string());
            }
            None => debug!("skipping {}", name),
        }
    }
    grouped
}

fn category_key(name: &str, prefix: &str) -> Option<char> {
    let rest = name.strip_prefix(prefix)?.strip_prefix('_')?;
    let mut chars = rest.chars();
    let key = chars.next()?;
    if key == '_' {
        return None;
    }
    chars.as_str().starts_with('_').then_some(key)
}
