//! Command-line interface for enna
//! This binary inspects, checks and renders scenario templates and edits the tables kept in
//! their cache block.
//!
//! Usage:
//!   enna parse `<path>` [--format `<format>`]                  - Print the directive tree
//!   enna check `<path>`                                        - List syntax errors
//!   enna render `<path>` [--rows `<n,..>`] [--output-dir `<dir>`] - Render scripts
//!   enna cache show|encode|decode `<path>`                     - Inspect the cache codec
//!   enna sync `<path>` [--remove-obsolete]                     - Align table columns
//!   enna table show|set|add-rows `<path>` ...                  - Edit the scenario tables
//!
//! Every subcommand accepts `--config <file>` and `--format text|json|yaml`. Exit status is
//! 0 on success, 1 when the template or the render reported errors and 2 when the command
//! itself failed.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use enna::enna::ast::Node;
use enna::enna::codec::{self, CodecError};
use enna::enna::config::{ConfigError, EnnaConfig, Loader};
use enna::enna::diagnostics::{format_rows, render_rows, ErrorRow};
use enna::enna::io::safe_read;
use enna::enna::rendering::{BatchRenderer, BatchReport, BatchSettings, RowStatus};
use enna::enna::scenario::{Scenario, ScenarioError, Table, TableKind};
use log::{debug, info};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use thiserror::Error;

#[derive(Error, Debug)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Scenario(#[from] ScenarioError),

    #[error("{0}")]
    Codec(#[from] CodecError),

    #[error("CLI_IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("CLI_FORMAT: {0}")]
    Serialize(String),

    #[error("CLI_USAGE: {0}")]
    Usage(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Json,
    Yaml,
}

impl Format {
    fn from_matches(matches: &ArgMatches) -> Self {
        match matches.get_one::<String>("format").map(String::as_str) {
            Some("json") => Format::Json,
            Some("yaml") => Format::Yaml,
            _ => Format::Text,
        }
    }

    /// Serialize `value`, or fall back to `text` for the plain format
    fn emit<T: Serialize>(self, value: &T, text: impl FnOnce() -> String) -> Result<String, CliError> {
        match self {
            Format::Text => Ok(text()),
            Format::Json => serde_json::to_string_pretty(value)
                .map(|s| s + "\n")
                .map_err(|e| CliError::Serialize(e.to_string())),
            Format::Yaml => {
                serde_yaml::to_string(value).map_err(|e| CliError::Serialize(e.to_string()))
            }
        }
    }
}

fn path_arg() -> Arg {
    Arg::new("path")
        .help("Path to the scenario file")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .index(1)
}

fn table_arg(index: usize) -> Arg {
    Arg::new("table")
        .help("Table to use: scripts, vars or vals")
        .required(true)
        .value_parser(["scripts", "vars", "vals"])
        .index(index)
}

fn command() -> Command {
    Command::new("enna")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for checking, rendering and editing enna scenario templates")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file layered over the defaults and ./enna.toml"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .global(true)
                .value_parser(["text", "json", "yaml"])
                .default_value("text")
                .help("Output format"),
        )
        .subcommand(
            Command::new("parse")
                .about("Print the directive tree of a template")
                .arg(path_arg()),
        )
        .subcommand(
            Command::new("check")
                .about("List the syntax errors of a template")
                .arg(path_arg()),
        )
        .subcommand(
            Command::new("render")
                .about("Render one script per vars row")
                .arg(path_arg())
                .arg(
                    Arg::new("rows")
                        .long("rows")
                        .short('r')
                        .value_delimiter(',')
                        .value_parser(value_parser!(usize))
                        .help("1-based rows of the vars table to render (default: all)"),
                )
                .arg(
                    Arg::new("output-dir")
                        .long("output-dir")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory for rendered scripts"),
                )
                .arg(
                    Arg::new("stdout")
                        .long("stdout")
                        .action(ArgAction::SetTrue)
                        .help("Print the rendered scripts instead of writing them"),
                ),
        )
        .subcommand(
            Command::new("cache")
                .about("Inspect the embedded cache")
                .subcommand_required(true)
                .subcommand(
                    Command::new("show")
                        .about("Decode and print the cache payload of a scenario")
                        .arg(path_arg()),
                )
                .subcommand(
                    Command::new("encode")
                        .about("Encode a file into the cache alphabet")
                        .arg(path_arg().help("File to encode")),
                )
                .subcommand(
                    Command::new("decode")
                        .about("Decode cache alphabet text (line breaks are ignored)")
                        .arg(path_arg().help("File to decode")),
                ),
        )
        .subcommand(
            Command::new("sync")
                .about("Add table columns for new vars and vals and save")
                .arg(path_arg())
                .arg(
                    Arg::new("remove-obsolete")
                        .long("remove-obsolete")
                        .action(ArgAction::SetTrue)
                        .help("Also drop columns the template no longer references"),
                ),
        )
        .subcommand(
            Command::new("table")
                .about("Show or edit the scenario tables")
                .subcommand_required(true)
                .subcommand(
                    Command::new("show")
                        .about("Print a table")
                        .arg(path_arg())
                        .arg(table_arg(2)),
                )
                .subcommand(
                    Command::new("set")
                        .about("Set one cell and save")
                        .arg(path_arg())
                        .arg(table_arg(2))
                        .arg(
                            Arg::new("row")
                                .help("1-based row")
                                .required(true)
                                .value_parser(value_parser!(usize))
                                .index(3),
                        )
                        .arg(Arg::new("column").help("Column name").required(true).index(4))
                        .arg(Arg::new("value").help("Cell text").required(true).index(5)),
                )
                .subcommand(
                    Command::new("add-rows")
                        .about("Append vars rows with default script names and save")
                        .arg(path_arg())
                        .arg(
                            Arg::new("count")
                                .help("Number of rows")
                                .value_parser(value_parser!(usize))
                                .default_value("1")
                                .index(2),
                        ),
                ),
        )
}

fn main() -> ExitCode {
    env_logger::init();
    let matches = command().get_matches();

    match run(&matches) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

/// Dispatch a subcommand; `Ok(false)` means it ran but found errors
fn run(matches: &ArgMatches) -> Result<bool, CliError> {
    let output_dir = matches
        .subcommand_matches("render")
        .and_then(|render| render.get_one::<PathBuf>("output-dir"));
    let config = load_config(matches.get_one::<PathBuf>("config"), output_dir)?;

    match matches.subcommand() {
        Some(("parse", sub)) => handle_parse(sub, &config),
        Some(("check", sub)) => handle_check(sub, &config),
        Some(("render", sub)) => handle_render(sub, &config),
        Some(("cache", sub)) => match sub.subcommand() {
            Some(("show", m)) => handle_cache_show(m, &config),
            Some(("encode", m)) => handle_cache_encode(m, &config),
            Some(("decode", m)) => handle_cache_decode(m, &config),
            _ => unreachable!(),
        },
        Some(("sync", sub)) => handle_sync(sub, &config),
        Some(("table", sub)) => match sub.subcommand() {
            Some(("show", m)) => handle_table_show(m, &config),
            Some(("set", m)) => handle_table_set(m, &config),
            Some(("add-rows", m)) => handle_table_add_rows(m, &config),
            _ => unreachable!(),
        },
        _ => unreachable!(),
    }
}

fn load_config(
    extra: Option<&PathBuf>,
    output_dir: Option<&PathBuf>,
) -> Result<EnnaConfig, CliError> {
    let mut loader = Loader::new().with_project_file(".");
    if let Some(path) = extra {
        loader = loader.with_file(path);
    }
    loader = loader.with_env();
    if let Some(dir) = output_dir {
        loader = loader.output_dir(dir)?;
    }
    Ok(loader.build()?)
}

fn path(matches: &ArgMatches) -> &Path {
    matches
        .get_one::<PathBuf>("path")
        .map(PathBuf::as_path)
        .unwrap_or_else(|| Path::new("."))
}

fn table_kind(matches: &ArgMatches) -> Result<TableKind, CliError> {
    let name = matches
        .get_one::<String>("table")
        .ok_or_else(|| CliError::Usage("missing table".to_string()))?;
    Ok(name.parse()?)
}

fn print(output: &str) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Handle the parse command
fn handle_parse(matches: &ArgMatches, config: &EnnaConfig) -> Result<bool, CliError> {
    let scenario = Scenario::load(path(matches), config)?;
    let template = scenario.template();
    let output = Format::from_matches(matches).emit(template.result(), || {
        Node::outline(template.tree(), template.source())
    })?;
    print(&output)?;
    Ok(template.errors().is_empty())
}

/// Handle the check command
fn handle_check(matches: &ArgMatches, config: &EnnaConfig) -> Result<bool, CliError> {
    let scenario = Scenario::load(path(matches), config)?;
    let rows = scenario.error_rows();
    let output = Format::from_matches(matches).emit(&rows, || {
        if rows.is_empty() {
            format!("{}: no syntax errors\n", scenario.path().display())
        } else {
            format_rows(&rows)
        }
    })?;
    print(&output)?;
    Ok(rows.is_empty())
}

#[derive(Serialize)]
struct RenderSummary<'a> {
    #[serde(flatten)]
    report: &'a BatchReport,
    error_rows: Vec<ErrorRow>,
}

/// Handle the render command
fn handle_render(matches: &ArgMatches, config: &EnnaConfig) -> Result<bool, CliError> {
    let scenario = Scenario::load(path(matches), config)?;
    let rows: Option<Vec<usize>> = match matches.get_many::<usize>("rows") {
        Some(rows) => Some(
            rows.map(|&row| {
                row.checked_sub(1)
                    .ok_or_else(|| CliError::Usage("rows are numbered from 1".to_string()))
            })
            .collect::<Result<_, _>>()?,
        ),
        None => None,
    };

    let report = if matches.get_flag("stdout") {
        let job = scenario.batch_job(rows.as_deref())?;
        let renderer = BatchRenderer::new(BatchSettings {
            script_extension: scenario.script_extension().to_string(),
            ..BatchSettings::from_config(config, None)
        });
        let report = renderer
            .run_all(scenario.template(), &job)
            .map_err(ScenarioError::from)?;
        for row in &report.rows {
            if let Some(name) = &row.script_name {
                print(&format!("==> {} <==\n", name))?;
            }
            print(&String::from_utf8_lossy(&row.bytes))?;
        }
        report
    } else {
        scenario.render(rows.as_deref(), &AtomicBool::new(false), &mut |progress| {
            debug!("rendered {}/{}", progress.done, progress.total);
        })?
    };

    info!(
        "{} rendered, {} with errors, {} skipped",
        report.count(RowStatus::Rendered),
        report.count(RowStatus::RenderedWithErrors),
        report.count(RowStatus::Skipped)
    );

    let mut error_rows = match report.abort {
        Some(_) => scenario.error_rows(),
        None => Vec::new(),
    };
    error_rows.extend(render_rows(&report.errors));
    let summary = RenderSummary {
        report: &report,
        error_rows,
    };
    let output = Format::from_matches(matches).emit(&summary, || {
        let mut out = String::new();
        for row in &report.rows {
            let target = row
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .or_else(|| row.script_name.clone())
                .unwrap_or_default();
            out.push_str(&format!("row {:>4}  {:?}  {}\n", row.index + 1, row.status, target));
        }
        out.push_str(&format_rows(&summary.error_rows));
        out
    })?;
    // Scripts already went to stdout, keep the summary off it
    if matches.get_flag("stdout") {
        eprint!("{}", output);
    } else {
        print(&output)?;
    }
    Ok(report.is_success())
}

/// Handle the cache show command
fn handle_cache_show(matches: &ArgMatches, config: &EnnaConfig) -> Result<bool, CliError> {
    let scenario = Scenario::load(path(matches), config)?;
    let payload = scenario.payload();
    let format = match Format::from_matches(matches) {
        Format::Text => Format::Json,
        other => other,
    };
    print(&format.emit(&payload, String::new)?)?;
    Ok(!scenario.has_cache_error())
}

/// Handle the cache encode command
fn handle_cache_encode(matches: &ArgMatches, config: &EnnaConfig) -> Result<bool, CliError> {
    let bytes = safe_read(path(matches), &config.io.retry_policy())?;
    let encoded = codec::encode(&bytes);
    let mut out = codec::wrap(&encoded, config.cache.line_width).join(&b'\n');
    out.push(b'\n');
    print(&String::from_utf8_lossy(&out))?;
    Ok(true)
}

/// Handle the cache decode command
fn handle_cache_decode(matches: &ArgMatches, config: &EnnaConfig) -> Result<bool, CliError> {
    let mut bytes = safe_read(path(matches), &config.io.retry_policy())?;
    bytes.retain(|b| !b.is_ascii_whitespace());
    let decoded = codec::decode(&bytes)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&decoded)?;
    stdout.flush()?;
    Ok(true)
}

/// Handle the sync command
fn handle_sync(matches: &ArgMatches, config: &EnnaConfig) -> Result<bool, CliError> {
    let mut scenario = Scenario::load(path(matches), config)?;
    let mut changed = scenario.sync_names();
    if matches.get_flag("remove-obsolete") {
        changed |= scenario.remove_obsolete();
    }
    if scenario.is_dirty() {
        scenario.save()?;
    }
    print(&format!(
        "{}: {}\n",
        scenario.path().display(),
        if changed { "columns updated" } else { "up to date" }
    ))?;
    Ok(true)
}

/// Fixed-width text view of a table
fn format_table(table: &Table) -> String {
    let mut widths: Vec<usize> = table
        .column_names()
        .iter()
        .map(|name| name.chars().count())
        .collect();
    for row in table.rows() {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let line = |cells: &mut dyn Iterator<Item = &String>, first: String| {
        let mut out = first;
        for (cell, width) in cells.zip(&widths) {
            out.push_str(&format!(" | {:<width$}", cell, width = *width));
        }
        out.trim_end().to_string() + "\n"
    };

    let mut out = line(&mut table.column_names().iter(), "   #".to_string());
    for (i, row) in table.rows().iter().enumerate() {
        out.push_str(&line(&mut row.iter(), format!("{:>4}", i + 1)));
    }
    out
}

/// Handle the table show command
fn handle_table_show(matches: &ArgMatches, config: &EnnaConfig) -> Result<bool, CliError> {
    let scenario = Scenario::load(path(matches), config)?;
    let table = scenario.table(table_kind(matches)?);
    print(&Format::from_matches(matches).emit(table, || format_table(table))?)?;
    Ok(true)
}

/// Handle the table set command
fn handle_table_set(matches: &ArgMatches, config: &EnnaConfig) -> Result<bool, CliError> {
    let kind = table_kind(matches)?;
    let row = matches
        .get_one::<usize>("row")
        .and_then(|row| row.checked_sub(1))
        .ok_or_else(|| CliError::Usage("rows are numbered from 1".to_string()))?;
    let (column, value) = match (
        matches.get_one::<String>("column"),
        matches.get_one::<String>("value"),
    ) {
        (Some(column), Some(value)) => (column, value),
        _ => return Err(CliError::Usage("missing column or value".to_string())),
    };

    let mut scenario = Scenario::load(path(matches), config)?;
    scenario
        .table_mut(kind)
        .set_named(row, column, value.as_str())
        .map_err(ScenarioError::from)?;
    scenario.save()?;
    Ok(true)
}

/// Handle the table add-rows command
fn handle_table_add_rows(matches: &ArgMatches, config: &EnnaConfig) -> Result<bool, CliError> {
    let count = matches.get_one::<usize>("count").copied().unwrap_or(1);
    let mut scenario = Scenario::load(path(matches), config)?;
    scenario.add_rows(count);
    scenario.save()?;
    print(&format!(
        "{}: {} vars rows\n",
        scenario.path().display(),
        scenario.table(TableKind::Vars).row_count()
    ))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn test_rows_are_comma_separated() {
        let matches = command()
            .try_get_matches_from(["enna", "render", "a.inp", "--rows", "1,3"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let rows: Vec<usize> = sub.get_many::<usize>("rows").unwrap().copied().collect();
        assert_eq!(rows, vec![1, 3]);
    }

    #[test]
    fn test_global_format() {
        let matches = command()
            .try_get_matches_from(["enna", "check", "a.inp", "--format", "json"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(Format::from_matches(sub), Format::Json);
    }

    #[test]
    fn test_format_table() {
        let mut table = Table::with_columns(["var_a", "var_bb"]);
        table.append_rows(1, "1");
        assert_eq!(format_table(&table), "   # | var_a | var_bb\n   1 | 1     | 1\n");
    }
}
