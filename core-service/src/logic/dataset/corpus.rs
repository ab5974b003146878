//! Labelled corpus reader
//!
//! CSV with columns `url`, `label` and an optional `raw_html`.

use std::path::Path;

use serde::Deserialize;

use super::{DatasetError, DatasetResult};
use crate::logic::features::normalize_url;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CorpusRow {
    pub url: String,
    pub label: u8,
    #[serde(default)]
    pub raw_html: Option<String>,
}

/// Read every row, normalizing URLs. Rows with an empty URL are skipped.
pub fn read_corpus(path: &Path) -> DatasetResult<Vec<CorpusRow>> {
    let file = std::fs::File::open(path).map_err(|e| DatasetError::io(path, e))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in reader.deserialize::<CorpusRow>() {
        let mut row = result?;
        row.url = normalize_url(&row.url);
        if row.url.is_empty() {
            skipped += 1;
            continue;
        }
        rows.push(row);
    }

    if skipped > 0 {
        log::warn!("Skipped {} corpus rows with an empty URL", skipped);
    }
    log::info!("Read {} corpus rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Visible text of every row that carries markup
pub fn visible_texts(rows: &[CorpusRow]) -> Vec<String> {
    rows.iter()
        .map(|row| {
            row.raw_html
                .as_deref()
                .map(crate::logic::features::html::visible_text)
                .unwrap_or_default()
        })
        .collect()
}
