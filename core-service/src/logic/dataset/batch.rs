//! Parallel batch extraction
//!
//! Each row is extracted on its own: no row sees another row's state, and
//! the output carries the URL so shards can be joined without relying on
//! position.

use rayon::prelude::*;

use super::corpus::CorpusRow;
use super::DatasetRecord;
use crate::logic::features::{FeaturePipeline, UrlRecord};
use crate::logic::fetch::ContentFetcher;

/// Extract every row. Stored `raw_html` wins; otherwise `fetcher` (if any)
/// supplies the page, and without either the row gets URL features only.
pub fn extract_corpus(
    pipeline: &FeaturePipeline,
    rows: &[CorpusRow],
    fetcher: Option<&dyn ContentFetcher>,
) -> Vec<DatasetRecord> {
    let records: Vec<DatasetRecord> = rows
        .par_iter()
        .filter_map(|row| extract_row(pipeline, row, fetcher))
        .collect();

    log::info!("Extracted {} of {} corpus rows", records.len(), rows.len());
    records
}

fn extract_row(
    pipeline: &FeaturePipeline,
    row: &CorpusRow,
    fetcher: Option<&dyn ContentFetcher>,
) -> Option<DatasetRecord> {
    let record = match UrlRecord::new(&row.url) {
        Ok(record) => record,
        Err(e) => {
            log::warn!("Skipping corpus row: {}", e);
            return None;
        }
    };

    let content = match (&row.raw_html, fetcher) {
        (Some(html), _) => html.clone(),
        (None, Some(fetcher)) => fetcher.fetch(record.url()),
        (None, None) => String::new(),
    };
    let record = record.with_content(content);

    let vector = pipeline.extract(&record);
    Some(DatasetRecord::new(record.url(), row.label, vector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::logic::features::{
        ExtractionOptions, FeatureSchema, KeywordLists, LexicalVocabulary, TrustedDomainSet,
    };
    use crate::logic::fetch::StaticFetcher;

    fn pipeline() -> FeaturePipeline {
        let schema = FeatureSchema::from_names(
            1,
            ExtractionOptions::default(),
            &["url_length", "num_img_tags"],
        )
        .unwrap();
        FeaturePipeline::new(
            Arc::new(schema),
            Arc::new(TrustedDomainSet::empty()),
            Arc::new(LexicalVocabulary::empty()),
            Arc::new(KeywordLists::default()),
        )
        .unwrap()
    }

    fn row(url: &str, label: u8, html: Option<&str>) -> CorpusRow {
        CorpusRow { url: url.into(), label, raw_html: html.map(str::to_string) }
    }

    #[test]
    fn test_rows_are_keyed_by_url() {
        let rows = vec![
            row("https://a.com", 1, Some("<img><img>")),
            row("http://b.ru", 0, None),
            row("   ", 0, None),
        ];
        let fetcher = StaticFetcher::with_page("http://b.ru", "<img>");
        let records = extract_corpus(&pipeline(), &rows, Some(&fetcher as &dyn ContentFetcher));

        assert_eq!(records.len(), 2);
        let a = records.iter().find(|r| r.url == "https://a.com").unwrap();
        assert_eq!(a.features, vec![13.0, 2.0]);
        assert_eq!(a.label, 1);
        let b = records.iter().find(|r| r.url == "http://b.ru").unwrap();
        assert_eq!(b.features, vec![11.0, 1.0]);
    }

    #[test]
    fn test_batch_matches_single_extraction() {
        let p = pipeline();
        let rows = vec![row("https://a.com/x", 1, Some("<img>"))];
        let batch = extract_corpus(&p, &rows, None);

        let single = p.extract(&UrlRecord::new("https://a.com/x").unwrap().with_content("<img>"));
        assert_eq!(batch[0].features, single.values);
        assert_eq!(batch[0].layout_hash, single.layout_hash);
    }
}
