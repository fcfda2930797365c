//! High-level Parquet writer configuration and orchestration.

use std::collections::BTreeMap;
use std::path::Path;

use parquet::file::properties::WriterProperties;
use tracing::info;

use crate::error::IoError;
use crate::parquet_write;
use crate::series::{EnsembleSeries, SiteSeries};

/// Compression algorithm for Parquet output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    /// No compression.
    None,
    /// Snappy compression (fast, moderate ratio).
    #[default]
    Snappy,
    /// Zstd compression (slower, better ratio).
    Zstd,
}

impl Compression {
    fn to_parquet(self) -> Result<parquet::basic::Compression, IoError> {
        Ok(match self {
            Self::None => parquet::basic::Compression::UNCOMPRESSED,
            Self::Snappy => parquet::basic::Compression::SNAPPY,
            Self::Zstd => {
                let level =
                    parquet::basic::ZstdLevel::try_new(3).map_err(|e| IoError::Parquet {
                        reason: e.to_string(),
                    })?;
                parquet::basic::Compression::ZSTD(level)
            }
        })
    }
}

/// Configuration for writing flow tables to Parquet.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    compression: Compression,
    row_group_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            row_group_size: 1_000_000,
        }
    }
}

impl WriterConfig {
    /// Sets the compression algorithm.
    pub fn with_compression(mut self, comp: Compression) -> Self {
        self.compression = comp;
        self
    }

    /// Sets the maximum number of rows per row group.
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Compression algorithm.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Maximum rows per row group.
    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    fn validate(&self) -> Result<(), IoError> {
        if self.row_group_size == 0 {
            return Err(IoError::Validation {
                count: 1,
                details: "row_group_size must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    fn properties(&self) -> Result<WriterProperties, IoError> {
        self.validate()?;
        Ok(WriterProperties::builder()
            .set_compression(self.compression.to_parquet()?)
            .set_max_row_group_size(self.row_group_size)
            .build())
    }
}

/// Writes one series per site to a Parquet flow table at `path`.
///
/// Columns: `site`, `time` (seconds since the Unix epoch), `value`.
///
/// # Errors
///
/// Returns [`IoError::Validation`] if the configuration is invalid, or
/// [`IoError::Parquet`] on any conversion or file failure.
pub fn write_site_table(
    path: &Path,
    tables: &BTreeMap<String, SiteSeries>,
    config: &WriterConfig,
) -> Result<(), IoError> {
    let props = config.properties()?;
    let schema = parquet_write::build_schema(false);
    let batches = parquet_write::site_batches(tables, &schema)?;
    parquet_write::write_batches(path, &batches, &schema, props)?;
    info!(path = %path.display(), sites = tables.len(), "wrote site table");
    Ok(())
}

/// Writes one ensemble per site to a Parquet flow table at `path`.
///
/// As [`write_site_table`] with an extra `member` column; rows are
/// time-major within each site.
pub fn write_ensemble_table(
    path: &Path,
    tables: &BTreeMap<String, EnsembleSeries>,
    config: &WriterConfig,
) -> Result<(), IoError> {
    let props = config.properties()?;
    let schema = parquet_write::build_schema(true);
    let batches = parquet_write::ensemble_batches(tables, &schema)?;
    parquet_write::write_batches(path, &batches, &schema, props)?;
    info!(path = %path.display(), sites = tables.len(), "wrote ensemble table");
    Ok(())
}
