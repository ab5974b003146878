//! Shard merge and training-matrix export
//!
//! Shards are joined on the URL. Mixing layouts or disagreeing duplicates
//! is an error, never silently resolved.

use std::collections::BTreeMap;
use std::path::Path;

use super::writer::read_records;
use super::{DatasetError, DatasetRecord, DatasetResult};
use crate::logic::features::{FeatureSchema, SchemaError};

/// Merge shard files into one record per URL, sorted by URL
pub fn merge_shards<P: AsRef<Path>>(paths: &[P]) -> DatasetResult<Vec<DatasetRecord>> {
    let mut merged: BTreeMap<String, DatasetRecord> = BTreeMap::new();
    let mut layout: Option<(u8, u32)> = None;

    for path in paths {
        for record in read_records(path.as_ref())? {
            match layout {
                None => layout = Some((record.feature_version, record.layout_hash)),
                Some((version, hash)) => {
                    if (version, hash) != (record.feature_version, record.layout_hash) {
                        return Err(SchemaError::LayoutMismatch {
                            expected_version: version,
                            expected_hash: hash,
                            actual_version: record.feature_version,
                            actual_hash: record.layout_hash,
                        }
                        .into());
                    }
                }
            }

            match merged.get(&record.url) {
                Some(existing) if *existing != record => {
                    return Err(DatasetError::Conflict(record.url));
                }
                Some(_) => {}
                None => {
                    merged.insert(record.url.clone(), record);
                }
            }
        }
    }

    log::info!("Merged {} shard(s) into {} records", paths.len(), merged.len());
    Ok(merged.into_values().collect())
}

/// Write a CSV matrix: one column per schema feature, then `label`
pub fn export_csv(schema: &FeatureSchema, records: &[DatasetRecord], path: &Path) -> DatasetResult<()> {
    let file = std::fs::File::create(path).map_err(|e| DatasetError::io(path, e))?;
    let mut writer = csv::Writer::from_writer(file);

    let mut header: Vec<&str> = schema.names().collect();
    header.push("label");
    writer.write_record(&header)?;

    for record in records {
        let vector = record.vector(schema)?;
        let mut row: Vec<String> = vector.values.iter().map(|v| v.to_string()).collect();
        row.push(record.label.to_string());
        writer.write_record(&row)?;
    }

    writer.flush().map_err(|e| DatasetError::io(path, e))?;
    log::info!("Exported {} rows x {} features to {}", records.len(), schema.len(), path.display());
    Ok(())
}
