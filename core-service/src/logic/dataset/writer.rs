//! Dataset Record Writer
//!
//! Append-only JSONL shards, one record per line, rotated by size.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::{DatasetError, DatasetRecord, DatasetResult};

/// Maximum shard size before rotation (50 MB)
pub const MAX_SHARD_SIZE: u64 = 50 * 1024 * 1024;

/// Shard file extension
const SHARD_EXT: &str = ".jsonl";

pub struct DatasetWriter {
    writer: BufWriter<File>,
    current_file: PathBuf,
    current_size: u64,
    max_size: u64,
    base_dir: PathBuf,
    prefix: String,
    shards: Vec<PathBuf>,
    records: u64,
}

impl DatasetWriter {
    /// Create a writer in `base_dir`; shard names start with `prefix`
    pub fn new(base_dir: &Path, prefix: &str, max_size: u64) -> DatasetResult<Self> {
        std::fs::create_dir_all(base_dir).map_err(|e| DatasetError::io(base_dir, e))?;
        let (file_path, file) = Self::open_shard(base_dir, prefix, 0)?;

        Ok(Self {
            writer: BufWriter::new(file),
            current_file: file_path.clone(),
            current_size: 0,
            max_size,
            base_dir: base_dir.to_path_buf(),
            prefix: prefix.to_string(),
            shards: vec![file_path],
            records: 0,
        })
    }

    fn open_shard(base_dir: &Path, prefix: &str, seq: usize) -> DatasetResult<(PathBuf, File)> {
        let filename = format!(
            "{}_{}_{:04}{}",
            prefix,
            Utc::now().format("%Y_%m_%d_%H%M%S"),
            seq,
            SHARD_EXT
        );
        let file_path = base_dir.join(filename);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .map_err(|e| DatasetError::io(&file_path, e))?;

        log::info!("Opened dataset shard: {}", file_path.display());
        Ok((file_path, file))
    }

    pub fn write(&mut self, record: &DatasetRecord) -> DatasetResult<()> {
        let line = serde_json::to_string(record).map_err(|e| DatasetError::Record {
            path: self.current_file.clone(),
            line: self.records as usize + 1,
            source: e,
        })?;
        let bytes = line.as_bytes();

        // Never rotate an empty shard
        if self.current_size > 0 && self.current_size + bytes.len() as u64 + 1 > self.max_size {
            self.rotate()?;
        }

        let path = &self.current_file;
        self.writer.write_all(bytes).map_err(|e| DatasetError::io(path, e))?;
        self.writer.write_all(b"\n").map_err(|e| DatasetError::io(path, e))?;
        self.current_size += bytes.len() as u64 + 1;
        self.records += 1;
        Ok(())
    }

    fn rotate(&mut self) -> DatasetResult<()> {
        self.writer.flush().map_err(|e| DatasetError::io(&self.current_file, e))?;

        let (new_path, new_file) = Self::open_shard(&self.base_dir, &self.prefix, self.shards.len())?;
        self.writer = BufWriter::new(new_file);

        log::info!("Rotated from {} to {}", self.current_file.display(), new_path.display());
        self.current_file = new_path.clone();
        self.current_size = 0;
        self.shards.push(new_path);
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.records
    }

    /// Flush and return every shard written
    pub fn finish(mut self) -> DatasetResult<Vec<PathBuf>> {
        self.writer.flush().map_err(|e| DatasetError::io(&self.current_file, e))?;
        log::info!("Wrote {} records to {} shard(s)", self.records, self.shards.len());
        Ok(self.shards)
    }
}

/// Read all records from a shard
pub fn read_records(path: &Path) -> DatasetResult<Vec<DatasetRecord>> {
    let file = File::open(path).map_err(|e| DatasetError::io(path, e))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| DatasetError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| DatasetError::Record {
            path: path.to_path_buf(),
            line: i + 1,
            source: e,
        })?;
        records.push(record);
    }
    Ok(records)
}
