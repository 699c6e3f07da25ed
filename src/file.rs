//! Delimited text file source. The first line of the file is the header; every
//! following line is a record. Each call opens its own handle and drops it
//! before returning, so nothing stays locked between operations.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use tracing::{debug, info, warn};

use crate::error::{Result, SourceError};
use crate::models::{Dataset, Header, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Dialect knobs for reading and writing.
pub struct FileOptions {
    /// Field separator.
    pub delimiter: u8,
    /// Quote character used when a field needs quoting.
    pub quote: u8,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
        }
    }
}

#[derive(Debug, Clone)]
/// A configured file target.
pub struct FileSource {
    path: PathBuf,
    options: FileOptions,
}

impl FileSource {
    /// Target `path` with the default comma-separated dialect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, FileOptions::default())
    }

    /// Target `path` with a custom delimiter or quote character.
    pub fn with_options(path: impl Into<PathBuf>, options: FileOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    /// The configured file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file, splitting off the first record as the header.
    ///
    /// Records may carry a different number of fields than the header; they
    /// are returned as-is. An empty file produces an empty header and no rows.
    pub fn load(&self) -> Result<(Header, Vec<Row>)> {
        debug!(path = %self.path.display(), "loading delimited file");
        let file = self.open_for_read()?;

        let mut reader = ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let mut records = reader.records();
        let header: Header = match records.next() {
            Some(record) => record
                .map_err(SourceError::format(&self.path))?
                .iter()
                .map(String::from)
                .collect(),
            None => {
                warn!(path = %self.path.display(), "file is empty");
                return Ok((Header::new(), Vec::new()));
            }
        };

        let rows = records
            .map(|record| {
                record
                    .map(|r| r.iter().map(String::from).collect::<Row>())
                    .map_err(SourceError::format(&self.path))
            })
            .collect::<Result<Vec<Row>>>()?;

        info!(
            path = %self.path.display(),
            columns = header.len(),
            rows = rows.len(),
            "loaded file"
        );
        Ok((header, rows))
    }

    /// Write the header followed by every row, truncating any existing file.
    /// Fields are quoted only when they contain the delimiter, a quote, or a
    /// line break; lines end with `\n`.
    ///
    /// A record with no fields (including an empty header) is written as a
    /// single quoted empty field, `""`, so it reads back as one empty string
    /// rather than disappearing from the file.
    pub fn save(&self, rows: &[Row], header: &[String]) -> Result<()> {
        debug!(path = %self.path.display(), "saving delimited file");
        let file = File::create(&self.path).map_err(SourceError::io(&self.path))?;

        let mut writer = WriterBuilder::new()
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .flexible(true)
            .from_writer(BufWriter::new(file));

        writer
            .write_record(header)
            .map_err(SourceError::format(&self.path))?;
        for row in rows {
            writer
                .write_record(row)
                .map_err(SourceError::format(&self.path))?;
        }

        let mut inner = writer
            .into_inner()
            .map_err(|err| SourceError::io(&self.path)(err.into_error()))?;
        inner.flush().map_err(SourceError::io(&self.path))?;

        info!(path = %self.path.display(), rows = rows.len(), "saved file");
        Ok(())
    }

    /// Same as [`FileSource::load`], packed into a `Dataset`.
    pub fn load_dataset(&self) -> Result<Dataset> {
        let (header, rows) = self.load()?;
        Ok(Dataset::new(header, rows))
    }

    fn open_for_read(&self) -> Result<File> {
        File::open(&self.path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), "file not found");
                SourceError::NotFound(format!("file {}", self.path.display()))
            } else {
                SourceError::io(&self.path)(err)
            }
        })
    }
}
