//! `tabinspect` command line.
//!
//! ```bash
//! tabinspect read people.csv --limit 3
//! tabinspect analyze events.jsonl -k 5
//! tabinspect viz people.csv --hist age --out age.svg
//! tabinspect validate people.csv --schema schema.json
//! tabinspect report people.csv --out report.md --bar city --bar-out city.svg
//! ```
//!
//! Exit codes: `0` success, `2` unknown format or an input/configuration problem, `1` anything
//! else.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tabinspect::chart::{self, DEFAULT_BINS};
use tabinspect::ingestion::{
    detect, read_from_path, resolve, CsvOptions, DecodeOptions, ExcelOptions, FormatTag,
    HtmlOptions, JsonLinesObserver, JsonOptions, ParquetOptions, ReadObserver, ReadOptions,
    SqliteOptions, TracingObserver, DEFAULT_DELIMITER_TSV,
};
#[cfg(feature = "excel")]
use tabinspect::ingestion::SheetSelector;
use tabinspect::profiling::{summarize, ProfileReport};
use tabinspect::report::{render_markdown, ChartLink, ReportInput};
use tabinspect::types::{Cell, Table, Value};
use tabinspect::validation::{validate, Schema, ValidationReport};
use tabinspect::{ErrorKind, InspectError, InspectResult};

const EXIT_USAGE: u8 = 2;
const NO_SCHEMA: &str = "No schema provided, skipping rule checks.";

#[derive(Parser)]
#[command(name = "tabinspect")]
#[command(version)]
#[command(about = "Multi-format tabular inspection: read, analyze, chart, validate, report")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Input selection shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct InputArgs {
    /// File to read
    path: PathBuf,

    /// Force a format (csv, tsv, json, jsonl, xlsx, parquet, sqlite, html)
    #[arg(short = 'f', long)]
    format: Option<String>,

    /// Treat JSON input as one object per line
    #[arg(long)]
    lines: bool,

    /// Spreadsheet sheet: digits select by 0-based index, anything else by name
    #[arg(long)]
    sheet: Option<String>,

    /// Field delimiter for delimited text
    #[arg(long)]
    delimiter: Option<char>,

    /// Rows to skip before the header (delimited text, spreadsheets, HTML)
    #[arg(long)]
    header_row: Option<usize>,

    /// Which `<table>` of an HTML page to read (0-based)
    #[arg(long)]
    table_index: Option<usize>,

    /// SQLite table to read
    #[arg(long, conflicts_with = "query")]
    table: Option<String>,

    /// SQLite query to run
    #[arg(long)]
    query: Option<String>,

    /// Parquet columns to read, comma separated
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Text encoding label (utf-8, latin1, ...)
    #[arg(long)]
    encoding: Option<String>,

    /// Parse numeric and boolean looking cells of delimited text
    #[arg(long)]
    infer_types: bool,

    /// Append one JSON line per read outcome to this file
    #[arg(long, value_name = "PATH")]
    read_log: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview records from a dataset
    Read {
        #[command(flatten)]
        input: InputArgs,

        #[arg(short = 'n', long, default_value_t = 5)]
        limit: usize,
    },

    /// Summarize rows, columns, and value distributions
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        #[arg(short = 'k', long, default_value_t = 3)]
        top_k: usize,
    },

    /// Chart one column as a histogram or a bar chart (SVG)
    #[command(visible_alias = "visualize")]
    Viz {
        #[command(flatten)]
        input: InputArgs,

        /// Numeric column to draw as a histogram
        #[arg(long, conflicts_with = "bar", required_unless_present = "bar")]
        hist: Option<String>,

        /// Column to draw as a top-k bar chart
        #[arg(long)]
        bar: Option<String>,

        #[arg(long)]
        out: PathBuf,

        #[arg(short = 'k', long, default_value_t = 3)]
        top_k: usize,

        #[arg(long, default_value_t = DEFAULT_BINS)]
        bins: usize,
    },

    /// Check records against a JSON schema
    Validate {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long)]
        schema: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a Markdown report with analysis, validation, and charts
    Report {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long)]
        out: PathBuf,

        #[arg(long, requires = "hist_out")]
        hist: Option<String>,

        #[arg(long)]
        hist_out: Option<String>,

        #[arg(long, requires = "bar_out")]
        bar: Option<String>,

        #[arg(long)]
        bar_out: Option<String>,

        #[arg(short = 'k', long, default_value_t = 3)]
        top_k: usize,

        #[arg(long)]
        schema: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Read { input, limit } => cmd_read(&input, limit),
        Commands::Analyze { input, top_k } => cmd_analyze(&input, top_k),
        Commands::Viz {
            input,
            hist,
            bar,
            out,
            top_k,
            bins,
        } => cmd_viz(&input, hist.as_deref(), bar.as_deref(), &out, top_k, bins),
        Commands::Validate {
            input,
            schema,
            json,
        } => cmd_validate(&input, schema.as_deref(), json),
        Commands::Report {
            input,
            out,
            hist,
            hist_out,
            bar,
            bar_out,
            top_k,
            schema,
        } => cmd_report(
            &input,
            &out,
            hist.as_deref().zip(hist_out.as_deref()),
            bar.as_deref().zip(bar_out.as_deref()),
            top_k,
            schema.as_deref(),
        ),
    };

    match result {
        Ok(code) => code,
        Err(e) => match e.kind() {
            ErrorKind::FileFormat | ErrorKind::Configuration => {
                eprintln!("Error: {e}");
                ExitCode::from(EXIT_USAGE)
            }
            ErrorKind::Io | ErrorKind::Engine => {
                eprintln!("Unexpected error: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

/// Outcome of loading the input: either a table or an exit code already reported to the user.
enum Loaded {
    Table(Table),
    Exit(ExitCode),
}

fn load(input: &InputArgs, limit: Option<usize>) -> InspectResult<Loaded> {
    let Some(tag) = detect(&input.path, input.format.as_deref()) else {
        println!("Error: unknown or unsupported format for {}", input.path.display());
        return Ok(Loaded::Exit(ExitCode::from(EXIT_USAGE)));
    };
    let (Some(_), Some(format)) = (resolve(&tag), FormatTag::parse(&tag)) else {
        eprintln!("No reader available for format: {tag}");
        return Ok(Loaded::Exit(ExitCode::from(EXIT_USAGE)));
    };

    let mut observers: Vec<Arc<dyn ReadObserver>> = vec![Arc::new(TracingObserver)];
    if let Some(log) = &input.read_log {
        observers.push(Arc::new(JsonLinesObserver::create(log)?));
    }
    let mut options = ReadOptions::default()
        .with_hint(tag.as_str())
        .with_decode(decode_options(input, format))
        .with_observer(Arc::new(observers));
    if let Some(limit) = limit {
        options = options.with_limit(limit);
    }
    debug!(?options, "reading input");
    read_from_path(&input.path, &options).map(Loaded::Table)
}

fn decode_options(input: &InputArgs, format: FormatTag) -> DecodeOptions {
    match format {
        FormatTag::Csv | FormatTag::Tsv => {
            let mut o = CsvOptions::default().with_infer_types(input.infer_types);
            match input.delimiter {
                Some(d) => o = o.with_delimiter(d),
                None if format == FormatTag::Tsv => o = o.with_delimiter(DEFAULT_DELIMITER_TSV),
                None => {}
            }
            if let Some(h) = input.header_row {
                o = o.with_header_row(h);
            }
            if let Some(enc) = &input.encoding {
                o.encoding = enc.clone();
            }
            o.into()
        }
        FormatTag::Json | FormatTag::Jsonl => {
            let mut o = JsonOptions::default().with_lines(input.lines || format == FormatTag::Jsonl);
            if let Some(enc) = &input.encoding {
                o.encoding = enc.clone();
            }
            o.into()
        }
        FormatTag::Xlsx => excel_options(input).into(),
        FormatTag::Parquet => {
            let o = ParquetOptions::default();
            match &input.columns {
                Some(cols) => o.with_columns(cols.iter().map(String::as_str)),
                None => o,
            }
            .into()
        }
        FormatTag::Sqlite => SqliteOptions {
            table: input.table.clone(),
            query: input.query.clone(),
            limit: None,
        }
        .into(),
        FormatTag::Html => {
            let mut o = HtmlOptions::default();
            if let Some(i) = input.table_index {
                o = o.with_table_index(i);
            }
            if let Some(h) = input.header_row {
                o = o.with_header_row(h);
            }
            if let Some(enc) = &input.encoding {
                o.encoding = enc.clone();
            }
            o.into()
        }
    }
}

#[cfg(feature = "excel")]
fn excel_options(input: &InputArgs) -> ExcelOptions {
    let mut o = ExcelOptions::default();
    if let Some(sheet) = &input.sheet {
        o = o.with_sheet(SheetSelector::parse(sheet));
    }
    if let Some(h) = input.header_row {
        o = o.with_header_row(h);
    }
    o
}

#[cfg(not(feature = "excel"))]
fn excel_options(_input: &InputArgs) -> ExcelOptions {
    ExcelOptions::default()
}

macro_rules! load_or_exit {
    ($input:expr, $limit:expr) => {
        match load($input, $limit)? {
            Loaded::Table(t) => t,
            Loaded::Exit(code) => return Ok(code),
        }
    };
}

fn cmd_read(input: &InputArgs, limit: usize) -> InspectResult<ExitCode> {
    let table = load_or_exit!(input, Some(limit));
    println!("columns: {:?}", table.columns());
    println!("shape: {:?}", table.shape());
    println!("records:");
    for row in table.rows().iter().take(limit) {
        let obj: Map<String, JsonValue> = table
            .columns()
            .iter()
            .cloned()
            .zip(row.iter().map(cell_to_json))
            .collect();
        println!("{}", serde_json::to_string(&obj)?);
    }
    Ok(ExitCode::SUCCESS)
}

fn cell_to_json(cell: &Cell) -> JsonValue {
    match cell {
        None => JsonValue::Null,
        Some(Value::Int64(v)) => JsonValue::from(*v),
        Some(Value::Float64(v)) => JsonValue::from(*v),
        Some(Value::Bool(v)) => JsonValue::from(*v),
        Some(Value::Utf8(s)) => JsonValue::from(s.as_str()),
        Some(Value::Bytes(b)) => JsonValue::from(b.clone()),
    }
}

fn cmd_analyze(input: &InputArgs, top_k: usize) -> InspectResult<ExitCode> {
    let table = load_or_exit!(input, None);
    print_profile(&summarize(&table.records(), top_k));
    Ok(ExitCode::SUCCESS)
}

fn print_profile(rep: &ProfileReport) {
    println!("rows: {}", rep.rows);
    println!("columns: {}", rep.columns);
    println!();
    println!("numeric:");
    for ns in &rep.numeric {
        println!(
            " {}\t count={} nulls={} distinct={} min={} max={} mean={}",
            ns.column,
            ns.count,
            ns.nulls,
            ns.distinct,
            display_or_dash(ns.min.as_ref()),
            display_or_dash(ns.max.as_ref()),
            display_or_dash(ns.mean.as_ref()),
        );
    }
    println!("categorical:");
    for cs in &rep.categorical {
        println!(
            " {}\t count={} nulls={} distinct={}, top={:?}",
            cs.column, cs.count, cs.nulls, cs.distinct, cs.top
        );
    }
}

fn display_or_dash<T: ToString>(v: Option<&T>) -> String {
    v.map_or_else(|| "-".to_string(), ToString::to_string)
}

fn cmd_viz(
    input: &InputArgs,
    hist: Option<&str>,
    bar: Option<&str>,
    out: &Path,
    top_k: usize,
    bins: usize,
) -> InspectResult<ExitCode> {
    let table = load_or_exit!(input, None);
    let records = table.records();
    match (hist, bar) {
        (Some(column), _) => {
            chart::histogram(&records, column, bins)?.write_svg(out)?;
            println!("Wrote histogram to {}", out.display());
        }
        (None, Some(column)) => {
            chart::bar_counts(&records, column, top_k)?.write_svg(out)?;
            println!("Wrote bar chart to {}", out.display());
        }
        (None, None) => {
            return Err(InspectError::Configuration {
                message: "must provide --hist or --bar".to_string(),
            });
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_validate(input: &InputArgs, schema: Option<&Path>, json: bool) -> InspectResult<ExitCode> {
    let table = load_or_exit!(input, None);
    let Some(schema_path) = schema else {
        println!("{NO_SCHEMA}");
        return Ok(ExitCode::from(EXIT_USAGE));
    };
    let schema = Schema::from_path(schema_path)?;
    let report = validate(&table.records(), &schema);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_validation(&report);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_validation(report: &ValidationReport) {
    println!("rows: {}", report.row_count);
    println!("columns: {}", report.column_count);
    for issue in &report.issues {
        println!(
            "code={} column={} count={} examples={:?}",
            issue.code, issue.column, issue.count, issue.examples
        );
    }
}

fn cmd_report(
    input: &InputArgs,
    out: &Path,
    hist: Option<(&str, &str)>,
    bar: Option<(&str, &str)>,
    top_k: usize,
    schema: Option<&Path>,
) -> InspectResult<ExitCode> {
    let table = load_or_exit!(input, None);
    let records = table.records();
    let profile = summarize(&records, top_k);
    let schema = match schema {
        Some(p) => Schema::from_path(p)?,
        None => {
            println!("{NO_SCHEMA}");
            Schema::default()
        }
    };
    let validation = validate(&records, &schema);

    if let Some((column, path)) = hist {
        chart::histogram(&records, column, DEFAULT_BINS)?.write_svg(path)?;
    }
    if let Some((column, path)) = bar {
        chart::bar_counts(&records, column, top_k)?.write_svg(path)?;
    }

    let source = input.path.display().to_string();
    let markdown = render_markdown(&ReportInput {
        source: &source,
        profile: &profile,
        validation: &validation,
        histogram: hist.map(|(column, path)| ChartLink { column, path }),
        bar_chart: bar.map(|(column, path)| ChartLink { column, path }),
    });
    fs::write(out, markdown)?;
    println!("Wrote report to {}", out.display());
    Ok(ExitCode::SUCCESS)
}
