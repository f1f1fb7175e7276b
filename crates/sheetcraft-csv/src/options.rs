//! CSV options

use sheetcraft_core::SheetSettings;

/// Options for reading CSV files
#[derive(Debug, Clone)]
pub struct CsvReadOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
    /// Skip the first record
    pub has_header: bool,
    /// Bounds of the sheet to read into
    pub settings: SheetSettings,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            has_header: false,
            settings: SheetSettings::default(),
        }
    }
}

/// What a written cell contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvContent {
    /// Literal values and the cached results of formulas
    #[default]
    Values,
    /// What the author typed: formulas as text, literals as values
    Inputs,
}

/// Options for writing CSV files
#[derive(Debug, Clone)]
pub struct CsvWriteOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
    /// Cell content to write
    pub content: CsvContent,
    /// Line terminator
    pub line_terminator: LineTerminator,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            content: CsvContent::Values,
            line_terminator: LineTerminator::LF,
        }
    }
}

/// Line terminator type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTerminator {
    /// Unix-style (LF)
    LF,
    /// Windows-style (CRLF)
    CRLF,
}
