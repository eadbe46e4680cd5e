use crate::error::{CsvError, Result};
use crate::table::{CsvTable, Row};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

const UTF8_BOM: char = '\u{feff}';

pub struct CsvParser {
    delimiter: u8,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvParser {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn parse_file(&self, path: &Path) -> Result<CsvTable> {
        if !path.exists() {
            return Err(CsvError::NotFound(path.display().to_string()));
        }

        info!("Parsing CSV file {}", path.display());
        let file = File::open(path)?;
        self.parse_reader(BufReader::new(file))
    }

    /// Reads a header line followed by data rows.
    ///
    /// Short records produce rows that lack the trailing headers; surplus
    /// cells are dropped.
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<CsvTable> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .delimiter(self.delimiter)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                if i == 0 {
                    h.trim_start_matches(UTF8_BOM).trim().to_string()
                } else {
                    h.to_string()
                }
            })
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(CsvError::NoHeaders);
        }

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| CsvError::Record {
                line: e.position().map(|p| p.line()).unwrap_or(0),
                message: e.to_string(),
            })?;

            let row = Row::from_pairs(
                headers
                    .iter()
                    .zip(record.iter())
                    .map(|(h, v)| (h.clone(), v.to_string())),
            );
            if row.len() < headers.len() {
                debug!(
                    "Row {} has {} of {} cells",
                    rows.len() + 1,
                    row.len(),
                    headers.len()
                );
            }
            rows.push(row);
        }

        info!("Parsed {} rows with {} headers", rows.len(), headers.len());
        Ok(CsvTable::new(headers, rows))
    }
}
