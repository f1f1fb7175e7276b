//! CSV reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;
use sheetcraft_core::Sheet;

/// CSV file reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a new sheet
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<Sheet> {
        let file = File::open(path)?;
        Self::read(file, options)
    }

    /// Read CSV from a reader into a new sheet
    ///
    /// Fails on the first field that falls outside the sheet bounds.
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<Sheet> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(options.has_header)
            .flexible(true)
            .from_reader(reader);

        let mut sheet = Sheet::with_settings(options.settings)?;

        for (row_idx, result) in csv_reader.records().enumerate() {
            let record = result?;

            for (col_idx, field) in record.iter().enumerate() {
                if field.is_empty() {
                    continue;
                }

                let row = u32::try_from(row_idx).unwrap_or(u32::MAX);
                let col = u16::try_from(col_idx).unwrap_or(u16::MAX);
                sheet
                    .set_input_at(row, col, field)
                    .map_err(|source| CsvError::Cell {
                        record: row_idx + 1,
                        field: col_idx + 1,
                        source,
                    })?;
            }
        }

        Ok(sheet)
    }
}
