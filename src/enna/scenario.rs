//! A scenario file and the tables stored in its cache block
//!
//! A [`Scenario`] owns the parsed template, the three tables (`scripts_table`, `vars_table`
//! and `vals_table`) and the rest of the cache payload. Edits only change memory and mark
//! the scenario dirty; nothing touches the disk until [`Scenario::save`].
//!
//! A file whose cache block is damaged (`MULT_CACHE`, `EOF_OPN_CACHE`) loads with empty
//! tables and refuses to save, so the damaged block is left for the author to repair.

pub mod table;

pub use table::{Table, TableError};

use crate::enna::codec::{CachePayload, CodecError, ModuleEntry};
use crate::enna::config::EnnaConfig;
use crate::enna::diagnostics::{self, ErrorRow};
use crate::enna::io::{safe_read, safe_write};
use crate::enna::parsing::Template;
use crate::enna::rendering::{
    BatchError, BatchJob, BatchRenderer, BatchReport, BatchSettings, Progress, RowSpec,
};
use crate::enna::scanning::default_script_stem;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use thiserror::Error;

pub const SCRIPTS_TABLE: &str = "scripts_table";
pub const VARS_TABLE: &str = "vars_table";
pub const VALS_TABLE: &str = "vals_table";
pub const SCRIPT_NAMES_COLUMN: &str = "Script Names";

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("SCENARIO_IO: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CACHE_UNAVAILABLE: {0} has a damaged cache block; fix it before saving")]
    CacheUnavailable(PathBuf),

    #[error("{0}")]
    Codec(#[from] CodecError),

    #[error("{0}")]
    Table(#[from] TableError),

    #[error("{0}")]
    Batch(#[from] BatchError),

    #[error("SCENARIO_TABLE: unknown table '{0}'")]
    UnknownTable(String),
}

/// The three editable tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Scripts,
    Vars,
    Vals,
}

impl TableKind {
    pub const ALL: [TableKind; 3] = [TableKind::Scripts, TableKind::Vars, TableKind::Vals];

    /// Key of the table in the cache payload
    pub fn key(self) -> &'static str {
        match self {
            TableKind::Scripts => SCRIPTS_TABLE,
            TableKind::Vars => VARS_TABLE,
            TableKind::Vals => VALS_TABLE,
        }
    }
}

impl std::str::FromStr for TableKind {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scripts" | SCRIPTS_TABLE => Ok(TableKind::Scripts),
            "vars" | VARS_TABLE => Ok(TableKind::Vars),
            "vals" | VALS_TABLE => Ok(TableKind::Vals),
            other => Err(ScenarioError::UnknownTable(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scenario {
    path: PathBuf,
    config: EnnaConfig,
    template: Template,
    payload: CachePayload,
    scripts: Table,
    vars: Table,
    vals: Table,
    default_script_name: String,
    dirty: bool,
}

impl Scenario {
    /// Read and parse a scenario file
    pub fn load(path: impl AsRef<Path>, config: &EnnaConfig) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let bytes = read(path, config)?;
        Ok(Self::from_bytes(path, bytes, config))
    }

    /// Build a scenario from bytes already in memory; `path` locates saves and output
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>, config: &EnnaConfig) -> Self {
        let path = path.into();
        let template = Template::parse(strip_carriage_returns(bytes));

        let payload = if template.result().has_cache_error() {
            warn!(
                "{}: cache block is damaged, starting with empty tables",
                path.display()
            );
            CachePayload::default()
        } else {
            CachePayload::load(template.source(), template.cache())
        };

        let table = |kind: TableKind| {
            payload
                .table(kind.key())
                .map(Table::from_data)
                .unwrap_or_default()
        };
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (scripts, vars, vals) = (
            table(TableKind::Scripts),
            table(TableKind::Vars),
            table(TableKind::Vals),
        );

        let mut scenario = Self {
            scripts,
            vars,
            vals,
            default_script_name: default_script_stem(&stem),
            path,
            config: config.clone(),
            template,
            payload,
            dirty: false,
        };

        if !scenario.scripts.has_columns() {
            scenario.scripts = Table::with_columns([SCRIPT_NAMES_COLUMN]);
            scenario
                .scripts
                .append_rows(1, &scenario.default_script_name);
        }
        scenario.sync_names();
        info!(
            "loaded {}: {} syntax errors, {} var columns, {} rows",
            scenario.path.display(),
            scenario.template.errors().len(),
            scenario.vars.column_count(),
            scenario.vars.row_count()
        );
        scenario
    }

    /// Re-read the file after an external edit, keeping the tables in memory
    pub fn reload(&mut self) -> Result<(), ScenarioError> {
        let bytes = read(&self.path, &self.config)?;
        self.template = Template::parse(strip_carriage_returns(bytes));
        self.sync_names();
        debug!("reloaded {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn config(&self) -> &EnnaConfig {
        &self.config
    }

    pub fn table(&self, kind: TableKind) -> &Table {
        match kind {
            TableKind::Scripts => &self.scripts,
            TableKind::Vars => &self.vars,
            TableKind::Vals => &self.vals,
        }
    }

    /// Mutable access to a table; the scenario counts as edited from here on
    pub fn table_mut(&mut self, kind: TableKind) -> &mut Table {
        self.dirty = true;
        match kind {
            TableKind::Scripts => &mut self.scripts,
            TableKind::Vars => &mut self.vars,
            TableKind::Vals => &mut self.vals,
        }
    }

    pub fn modules(&self) -> &[ModuleEntry] {
        &self.payload.modules
    }

    /// Add or replace a module; modules run in insertion order
    pub fn set_module(&mut self, name: impl Into<String>, source: impl Into<String>) {
        let (name, source) = (name.into(), source.into());
        match self.payload.modules.iter_mut().find(|m| m.name == name) {
            Some(module) => module.source = source,
            None => self.payload.modules.push(ModuleEntry { name, source }),
        }
        self.dirty = true;
    }

    pub fn default_script_name(&self) -> &str {
        &self.default_script_name
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn has_syntax_errors(&self) -> bool {
        !self.template.errors().is_empty()
    }

    pub fn has_cache_error(&self) -> bool {
        self.template.result().has_cache_error()
    }

    /// Add a column for every var and val the template references but the tables lack
    ///
    /// New columns are appended in sorted order. Returns whether anything was added.
    pub fn sync_names(&mut self) -> bool {
        let names = self.template.names().clone();
        let mut changed = false;

        let new_vars: Vec<_> = names
            .vars
            .iter()
            .filter(|name| self.vars.column_index(name).is_none())
            .cloned()
            .collect();
        if !new_vars.is_empty() {
            debug!("new var columns: {:?}", new_vars);
            self.vars.push_columns(new_vars);
            changed = true;
        }

        let new_vals: Vec<_> = names
            .vals
            .iter()
            .filter(|name| self.vals.column_index(name).is_none())
            .cloned()
            .collect();
        if !new_vals.is_empty() {
            debug!("new val columns: {:?}", new_vals);
            self.vals.push_columns(new_vals);
            changed = true;
        }
        if self.vals.has_columns() && self.vals.row_count() == 0 {
            self.vals.append_rows(1, "");
        }

        self.dirty |= changed;
        changed
    }

    /// Drop var and val columns the template no longer references
    pub fn remove_obsolete(&mut self) -> bool {
        let names = self.template.names();
        let obsolete = |table: &Table, keep: &std::collections::BTreeSet<String>| -> Vec<usize> {
            table
                .column_names()
                .iter()
                .enumerate()
                .filter(|(_, name)| !keep.contains(*name))
                .map(|(i, _)| i)
                .collect()
        };
        let vars = obsolete(&self.vars, &names.vars);
        let vals = obsolete(&self.vals, &names.vals);
        let changed = !vars.is_empty() || !vals.is_empty();

        self.vars.remove_columns(&vars);
        self.vals.remove_columns(&vals);
        self.dirty |= changed;
        changed
    }

    /// Append `count` rows to the vars table, each with a default script name
    pub fn add_rows(&mut self, count: usize) {
        self.align_script_rows();
        self.vars.append_rows(count, "");
        let name = self.default_script_name.clone();
        self.scripts.append_rows(count, &name);
        self.dirty |= count > 0;
    }

    /// Give every var row a script name row
    fn align_script_rows(&mut self) {
        let missing = self.vars.row_count().saturating_sub(self.scripts.row_count());
        let name = self.default_script_name.clone();
        self.scripts.append_rows(missing, &name);
    }

    /// The cache payload as it would be saved now
    pub fn payload(&self) -> CachePayload {
        let mut payload = self.payload.clone();
        for kind in TableKind::ALL {
            payload
                .table_data
                .insert(kind.key().to_string(), self.table(kind).to_data());
        }
        payload
    }

    /// Write the tables back into the file's cache block
    pub fn save(&mut self) -> Result<(), ScenarioError> {
        if self.has_cache_error() {
            return Err(ScenarioError::CacheUnavailable(self.path.clone()));
        }
        let bytes = self.payload().store(
            self.template.source(),
            self.template.cache(),
            self.config.cache.line_width,
        )?;
        safe_write(&self.path, &bytes, &self.config.io.retry_policy()).map_err(|source| {
            ScenarioError::Io {
                path: self.path.clone(),
                source,
            }
        })?;

        self.template = Template::parse(bytes);
        self.dirty = false;
        info!("saved {}", self.path.display());
        Ok(())
    }

    /// Syntax errors as error table rows
    pub fn error_rows(&self) -> Vec<ErrorRow> {
        diagnostics::syntax_rows(&self.template, &self.config.diagnostics.space_placeholder)
    }

    pub fn output_dir(&self) -> PathBuf {
        let dir = self
            .payload
            .settings
            .output_dir
            .as_deref()
            .unwrap_or(&self.config.render.output_dir);
        match self.path.parent() {
            Some(parent) => parent.join(dir),
            None => PathBuf::from(dir),
        }
    }

    pub fn script_extension(&self) -> &str {
        self.payload
            .settings
            .script_extension
            .as_deref()
            .unwrap_or(&self.config.render.script_extension)
    }

    /// The batch for `rows` (0-based var rows), or for every row when `None`
    ///
    /// Without var columns the scenario renders a single script from the first script name.
    pub fn batch_job(&self, rows: Option<&[usize]>) -> Result<BatchJob, ScenarioError> {
        let vals = self
            .vals
            .row_pairs(0)
            .into_iter()
            .map(|(name, cell)| (name.to_string(), cell.to_string()))
            .collect();
        let script_name = |index: usize| {
            self.scripts
                .cell(index, 0)
                .unwrap_or(&self.default_script_name)
                .to_string()
        };

        let rows = if self.vars.has_columns() {
            let selected: Vec<usize> = match rows {
                Some(rows) => rows.to_vec(),
                None => (0..self.vars.row_count()).collect(),
            };
            selected
                .into_iter()
                .map(|index| -> Result<RowSpec, ScenarioError> {
                    let cells = self.vars.row(index).ok_or(TableError::RowOutOfRange {
                        row: index,
                        rows: self.vars.row_count(),
                    })?;
                    Ok(RowSpec {
                        index,
                        vars: cells.to_vec(),
                        script_name: script_name(index),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?
        } else {
            vec![RowSpec {
                index: 0,
                vars: Vec::new(),
                script_name: script_name(0),
            }]
        };

        Ok(BatchJob {
            modules: self.payload.modules.clone(),
            vals,
            var_names: self.vars.column_names().to_vec(),
            rows,
        })
    }

    /// Render `rows` into the output directory
    pub fn render(
        &self,
        rows: Option<&[usize]>,
        stop: &AtomicBool,
        progress: &mut dyn FnMut(Progress),
    ) -> Result<BatchReport, ScenarioError> {
        let job = self.batch_job(rows)?;
        let mut settings = BatchSettings::from_config(&self.config, Some(self.output_dir()));
        settings.script_extension = self.script_extension().to_string();
        info!(
            "rendering {} rows of {} into {}",
            job.rows.len(),
            self.path.display(),
            self.output_dir().display()
        );
        Ok(BatchRenderer::new(settings).run(&self.template, &job, stop, progress)?)
    }
}

fn read(path: &Path, config: &EnnaConfig) -> Result<Vec<u8>, ScenarioError> {
    safe_read(path, &config.io.retry_policy()).map_err(|source| ScenarioError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn strip_carriage_returns(mut bytes: Vec<u8>) -> Vec<u8> {
    bytes.retain(|&b| b != b'\r');
    bytes
}
