//! CSV writer

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::CsvResult;
use crate::options::{CsvContent, CsvWriteOptions, LineTerminator};
use sheetcraft_core::Sheet;

/// CSV file writer
pub struct CsvWriter;

impl CsvWriter {
    /// Write a sheet to a CSV file
    pub fn write_file<P: AsRef<Path>>(
        sheet: &Sheet,
        path: P,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let file = File::create(path)?;
        Self::write(sheet, file, options)
    }

    /// Write a sheet to a writer
    ///
    /// Records start at row 1 and fields at column A so the file reads back
    /// into the same addresses. Formula cells write their cached value, so
    /// recalculate first when writing [`CsvContent::Values`].
    pub fn write<W: Write>(sheet: &Sheet, writer: W, options: &CsvWriteOptions) -> CsvResult<()> {
        let terminator = match options.line_terminator {
            LineTerminator::LF => csv::Terminator::Any(b'\n'),
            LineTerminator::CRLF => csv::Terminator::CRLF,
        };

        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .terminator(terminator)
            .flexible(true)
            .from_writer(writer);

        if let Some(range) = sheet.used_range() {
            for row in 0..=range.end.row {
                let mut record = Vec::with_capacity(range.end.col as usize + 1);

                for col in 0..=range.end.col {
                    let text = match sheet.cell_at(row, col) {
                        None => String::new(),
                        Some(cell) => match options.content {
                            CsvContent::Values => cell.value.to_string(),
                            CsvContent::Inputs => cell.input_text(),
                        },
                    };
                    record.push(text);
                }

                csv_writer.write_record(&record)?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }
}
