//! sheetcraft CLI - evaluate formulas and recalculate CSV sheets

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sheetcraft::prelude::*;
use sheetcraft::{CsvContent, CsvReadOptions, CsvWriteOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheetcraft")]
#[command(author, version, about = "Evaluate spreadsheet formulas from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Number of rows in the sheet
    #[arg(long, global = true, default_value_t = sheetcraft::DEFAULT_MAX_ROWS)]
    rows: u32,

    /// Number of columns in the sheet
    #[arg(long, global = true, default_value_t = sheetcraft::DEFAULT_MAX_COLS)]
    cols: u16,

    /// Print engine logs to stderr (filter with RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula against an ad-hoc sheet
    Eval {
        /// Formula text, starting with '='
        formula: String,

        /// Cell input as CELL=TEXT, e.g. --set A1=10 --set A2==A1*2
        #[arg(short, long = "set", value_name = "CELL=TEXT")]
        set: Vec<String>,
    },

    /// Print the result of cells in a CSV sheet
    Cell {
        /// Input CSV file
        input: PathBuf,

        /// Cells to evaluate, e.g. A1 B7
        #[arg(required = true)]
        cells: Vec<String>,

        /// Skip the first record of the file
        #[arg(long)]
        header: bool,
    },

    /// Recalculate a CSV sheet and write the computed values
    Calc {
        /// Input CSV file
        input: PathBuf,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the first record of the file
        #[arg(long)]
        header: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .init();
    }

    let settings = SheetSettings::new(cli.rows, cli.cols).context("Invalid sheet size")?;

    match cli.command {
        Commands::Eval { formula, set } => eval(&formula, &set, settings),
        Commands::Cell {
            input,
            cells,
            header,
        } => print_cells(&input, &cells, header, settings),
        Commands::Calc {
            input,
            output,
            header,
        } => calc(&input, output.as_deref(), header, settings),
    }
}

fn eval(formula: &str, inputs: &[String], settings: SheetSettings) -> Result<()> {
    let mut sheet = Sheet::with_settings(settings)?;

    for input in inputs {
        let Some((address, raw)) = input.split_once('=') else {
            bail!("Invalid cell input '{}'. Expected CELL=TEXT", input);
        };
        sheet
            .set_input(address.trim(), raw)
            .with_context(|| format!("Failed to set '{}'", address))?;
    }

    println!("{}", render(&sheetcraft::evaluate_formula(&sheet, formula)));
    Ok(())
}

fn print_cells(input: &Path, cells: &[String], header: bool, settings: SheetSettings) -> Result<()> {
    let sheet = load(input, header, settings)?;
    let evaluator = sheetcraft::Evaluator::new(&sheet);

    for cell in cells {
        let address = CellAddress::parse(cell.trim())
            .with_context(|| format!("Invalid cell address '{}'", cell))?;
        println!("{}\t{}", address, render(&evaluator.evaluate_cell(address)));
    }

    Ok(())
}

fn calc(input: &Path, output: Option<&Path>, header: bool, settings: SheetSettings) -> Result<()> {
    let mut sheet = load(input, header, settings)?;

    let stats = sheet.calculate().context("Failed to calculate formulas")?;
    eprintln!(
        "Calculated {} of {} formulas ({} errors, {} circular, {} syntax errors)",
        stats.cells_calculated,
        stats.formula_count,
        stats.errors,
        stats.circular_references,
        stats.syntax_errors
    );

    let options = CsvWriteOptions {
        content: CsvContent::Values,
        ..Default::default()
    };

    if let Some(output_path) = output {
        CsvWriter::write_file(&sheet, output_path, &options)
            .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
        eprintln!("Wrote '{}'", output_path.display());
    } else {
        CsvWriter::write(&sheet, io::stdout().lock(), &options)
            .context("Failed to write to stdout")?;
    }

    Ok(())
}

fn load(input: &Path, header: bool, settings: SheetSettings) -> Result<Sheet> {
    let options = CsvReadOptions {
        has_header: header,
        settings,
        ..Default::default()
    };
    CsvReader::read_file(input, &options)
        .with_context(|| format!("Failed to open '{}'", input.display()))
}

/// One line describing a result: the value, or the error code with hints
fn render(result: &FormulaResult) -> String {
    match result {
        Ok(value) => value.as_string(),
        Err(FormulaError::Syntax(e)) => format!("#ERROR! {}", e),
        Err(e) => match e.suggestion() {
            Some(hint) => format!("{} {} (hint: {})", e.display_value(), e.message(), hint),
            None => format!("{} {}", e.display_value(), e.message()),
        },
    }
}
