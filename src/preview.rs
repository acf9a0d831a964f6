//! Column names and a handful of sample rows from a CSV file, rendered as plain text.

use crate::Error;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Options controlling how much of the dataset is previewed.
#[derive(Debug, Clone)]
pub struct PreviewOptions {
    /// Number of data rows included in the preview.
    pub sample_rows: usize,
    /// Field delimiter (default: comma).
    pub delimiter: u8,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            sample_rows: 5,
            delimiter: b',',
        }
    }
}

impl PreviewOptions {
    pub fn with_sample_rows(mut self, sample_rows: usize) -> Self {
        self.sample_rows = sample_rows;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// A shallow look at a CSV dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetPreview {
    pub path: PathBuf,
    pub columns: Vec<String>,
    pub sample_rows: Vec<Vec<String>>,
    /// Number of data rows in the whole file.
    pub total_rows: usize,
}

impl DatasetPreview {
    /// Read the header and the first rows of the CSV file at `path`.
    pub fn load(path: impl AsRef<Path>, options: &PreviewOptions) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::DatasetNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        Self::from_reader(path, file, options)
    }

    /// Build a preview from any reader. `path` is only recorded, never opened.
    pub fn from_reader<R: Read>(
        path: impl Into<PathBuf>,
        reader: R,
        options: &PreviewOptions,
    ) -> Result<Self, Error> {
        let mut reader = ReaderBuilder::new()
            .delimiter(options.delimiter)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if columns.iter().all(|c| c.is_empty()) {
            return Err(Error::config("CSV file has no header row"));
        }

        let mut sample_rows = Vec::with_capacity(options.sample_rows);
        let mut total_rows = 0;
        let mut record = StringRecord::new();
        while reader.read_record(&mut record)? {
            if sample_rows.len() < options.sample_rows {
                sample_rows.push(record.iter().map(str::to_string).collect());
            }
            total_rows += 1;
        }

        Ok(Self {
            path: path.into(),
            columns,
            sample_rows,
            total_rows,
        })
    }

    /// Plain-text rendering embedded in the prompt.
    pub fn render(&self) -> Result<String, Error> {
        let mut out = format!(
            "Columns ({}): {}\nRows: {}\n",
            self.columns.len(),
            self.columns.join(", "),
            self.total_rows
        );

        if self.sample_rows.is_empty() {
            out.push_str("Sample rows: (none)\n");
            return Ok(out);
        }

        let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.sample_rows {
            writer.write_record(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))?;

        out.push_str("Sample rows:\n");
        out.push_str(&String::from_utf8_lossy(&bytes));
        Ok(out)
    }
}
