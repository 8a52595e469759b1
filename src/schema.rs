//! Header schema loading.
//!
//! A schema file is a header-less CSV with one record per source column:
//!
//! ```text
//! original_name,new_name[,type_token]
//! ```
//!
//! Records with fewer than two fields, or an empty `new_name`, contribute no
//! entry; an absent entry means "no rename requested". The optional third
//! field carries a type token such as `DATE(YYYY/MM/DD)`.

use std::{collections::HashMap, io::Read, path::Path};

use anyhow::{Context, Result};
use encoding_rs::Encoding;

use crate::io_utils;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaEntry {
    pub name: String,
    pub column_type: String,
}

impl SchemaEntry {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSchema {
    entries: HashMap<String, SchemaEntry>,
}

impl HeaderSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path, encoding: &'static Encoding, delimiter: u8) -> Result<Self> {
        let input = io_utils::open_input(path, encoding)?;
        Self::from_reader(input, delimiter)
            .with_context(|| format!("Reading schema from {path:?}"))
    }

    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader(reader, delimiter, true);
        let mut schema = Self::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Reading schema line {}", idx + 1))?;
            let (Some(original), Some(name)) = (record.get(0), record.get(1)) else {
                continue;
            };
            schema.insert(original, SchemaEntry::new(name, record.get(2).unwrap_or("")));
        }
        Ok(schema)
    }

    /// Adds an entry, ignoring it when the replacement name is empty.
    pub fn insert(&mut self, original: impl Into<String>, entry: SchemaEntry) {
        if entry.name.is_empty() {
            return;
        }
        self.entries.insert(original.into(), entry);
    }

    pub fn get(&self, original: &str) -> Option<&SchemaEntry> {
        self.entries.get(original)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, SchemaEntry)> for HeaderSchema {
    fn from_iter<I: IntoIterator<Item = (K, SchemaEntry)>>(iter: I) -> Self {
        let mut schema = Self::new();
        for (original, entry) in iter {
            schema.insert(original, entry);
        }
        schema
    }
}
