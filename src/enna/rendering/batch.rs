//! Rendering one template once per row
//!
//! A batch runs in three phases:
//!
//! 1. **setup**: modules are executed in order into one shared scope, then every val cell
//!    is bound as `val_<name>`. Any failure here, or a template with syntax errors, aborts
//!    the batch before a single row is rendered.
//! 2. **rows**, in the order given: each row binds its `var_<name>` cells, `script_index`
//!    (`row + 1`) and `script_name` (the row's name template formatted against the row
//!    scope, plus the extension). A failure here skips that row only.
//! 3. **render and write**: the template is rendered against the row scope, empty cache
//!    shells are stripped and the result is written to `output_dir/script_name`.
//!
//! The stop flag is checked before each row. Rows not yet started when it is raised are
//! reported as [`RowStatus::Cancelled`]; files already written stay as they are.

use super::engine::Renderer;
use super::errors::{BatchError, RenderError, RenderErrorKind};
use super::finalize::strip_cache_artifacts;
use crate::enna::codec::ModuleEntry;
use crate::enna::config::EnnaConfig;
use crate::enna::io::{safe_write, RetryPolicy};
use crate::enna::parsing::Template;
use crate::enna::script::{EvalError, Interpreter, Scope, ScriptEvaluator, Value};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// One output file to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSpec {
    /// 0-based row number; `script_index` is `index + 1`
    pub index: usize,
    /// Cells aligned with [`BatchJob::var_names`]
    pub vars: Vec<String>,
    /// Format template of the output name, e.g. `case.{script_index:0>3}`
    pub script_name: String,
}

/// Everything a batch renders from, independent of where it came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchJob {
    pub modules: Vec<ModuleEntry>,
    /// `(name, cell)` pairs bound as `val_<name> = <cell>`
    pub vals: Vec<(String, String)>,
    pub var_names: Vec<String>,
    pub rows: Vec<RowSpec>,
}

/// Where output goes and how cautious writing is
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSettings {
    /// `None` renders in memory only
    pub output_dir: Option<PathBuf>,
    pub script_extension: String,
    pub write_on_node_errors: bool,
    pub retry: RetryPolicy,
}

impl BatchSettings {
    pub fn in_memory() -> Self {
        Self {
            output_dir: None,
            script_extension: String::new(),
            write_on_node_errors: true,
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(config: &EnnaConfig, output_dir: Option<PathBuf>) -> Self {
        Self {
            output_dir,
            script_extension: config.render.script_extension.clone(),
            write_on_node_errors: config.render.write_on_node_errors,
            retry: config.io.retry_policy(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowStatus {
    Rendered,
    /// Rendered, but some nodes failed
    RenderedWithErrors,
    /// Not rendered: a setup or row binding failed
    Skipped,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowOutcome {
    pub index: usize,
    pub status: RowStatus,
    pub script_name: Option<String>,
    pub path: Option<PathBuf>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl RowOutcome {
    fn new(index: usize, status: RowStatus) -> Self {
        Self {
            index,
            status,
            script_name: None,
            path: None,
            bytes: Vec::new(),
        }
    }
}

/// Why a batch rendered nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Abort {
    /// The template has syntax errors
    Syntax,
    /// A module or val failed
    Setup,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub rows: Vec<RowOutcome>,
    pub errors: Vec<RenderError>,
    pub abort: Option<Abort>,
}

impl BatchReport {
    /// Every row rendered without any recorded error
    pub fn is_success(&self) -> bool {
        self.abort.is_none()
            && self.errors.is_empty()
            && self.rows.iter().all(|row| row.status == RowStatus::Rendered)
    }

    pub fn count(&self, status: RowStatus) -> usize {
        self.rows.iter().filter(|row| row.status == status).count()
    }
}

/// Reported once per finished row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

pub struct BatchRenderer<E = Interpreter> {
    renderer: Renderer<E>,
    settings: BatchSettings,
}

impl BatchRenderer<Interpreter> {
    pub fn new(settings: BatchSettings) -> Self {
        Self::with_renderer(Renderer::new(), settings)
    }
}

impl<E: ScriptEvaluator> BatchRenderer<E> {
    pub fn with_renderer(renderer: Renderer<E>, settings: BatchSettings) -> Self {
        Self { renderer, settings }
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Run every row with no stop flag and no progress reporting
    pub fn run_all(&self, template: &Template, job: &BatchJob) -> Result<BatchReport, BatchError> {
        self.run(template, job, &AtomicBool::new(false), &mut |_| {})
    }

    pub fn run(
        &self,
        template: &Template,
        job: &BatchJob,
        stop: &AtomicBool,
        progress: &mut dyn FnMut(Progress),
    ) -> Result<BatchReport, BatchError> {
        let total = job.rows.len();
        info!("rendering batch of {} rows", total);
        let mut report = BatchReport {
            rows: Vec::with_capacity(total),
            errors: Vec::new(),
            abort: None,
        };

        if !template.errors().is_empty() {
            warn!(
                "template has {} syntax errors, rendering nothing",
                template.errors().len()
            );
            return Ok(self.abandon(report, job, Abort::Syntax, progress));
        }

        let shared = self.setup(job, &mut report.errors);
        if report.errors.iter().any(|e| e.kind.is_setup()) {
            warn!("batch setup failed, skipping all {} rows", total);
            return Ok(self.abandon(report, job, Abort::Setup, progress));
        }

        for (position, row) in job.rows.iter().enumerate() {
            if stop.load(Ordering::Relaxed) {
                info!("batch stopped with {} rows left", total - position);
                report.rows.extend(
                    job.rows[position..]
                        .iter()
                        .map(|row| RowOutcome::new(row.index, RowStatus::Cancelled)),
                );
                break;
            }
            let outcome = self.row(template, job, row, &shared, &mut report.errors)?;
            report.rows.push(outcome);
            progress(Progress {
                done: position + 1,
                total,
            });
        }

        info!(
            "batch finished: {} rendered, {} with errors, {} skipped, {} cancelled",
            report.count(RowStatus::Rendered),
            report.count(RowStatus::RenderedWithErrors),
            report.count(RowStatus::Skipped),
            report.count(RowStatus::Cancelled)
        );
        Ok(report)
    }

    fn abandon(
        &self,
        mut report: BatchReport,
        job: &BatchJob,
        abort: Abort,
        progress: &mut dyn FnMut(Progress),
    ) -> BatchReport {
        report.abort = Some(abort);
        report.rows = job
            .rows
            .iter()
            .map(|row| RowOutcome::new(row.index, RowStatus::Skipped))
            .collect();
        progress(Progress {
            done: job.rows.len(),
            total: job.rows.len(),
        });
        report
    }

    /// Modules and vals, evaluated once for the whole batch
    fn setup(&self, job: &BatchJob, errors: &mut Vec<RenderError>) -> Scope {
        let evaluator = self.renderer.evaluator();
        let mut scope = Scope::new();

        for module in &job.modules {
            let mut updated = scope.clone();
            match evaluator.exec_stmt(&module.source, &mut updated) {
                Ok(()) => {
                    debug!("module {} loaded", module.name);
                    scope = updated;
                }
                Err(err) => {
                    errors.push(RenderError::new(RenderErrorKind::Import, &err, &module.name));
                }
            }
        }

        let mut vals = Scope::new();
        for (name, cell) in &job.vals {
            let binding = format!("val_{}", name);
            match evaluator.eval_expr(cell, &scope) {
                Ok(value) => vals.set(binding, value),
                Err(err) => errors.push(RenderError::new(
                    RenderErrorKind::Vals,
                    &err,
                    format!("{} = {}", binding, cell),
                )),
            }
        }
        scope.extend_from(&vals);
        scope
    }

    fn row(
        &self,
        template: &Template,
        job: &BatchJob,
        row: &RowSpec,
        shared: &Scope,
        errors: &mut Vec<RenderError>,
    ) -> Result<RowOutcome, BatchError> {
        let evaluator = self.renderer.evaluator();
        let line = row.index + 1;
        let mut scope = shared.clone();
        let mut ok = true;

        for (column, name) in job.var_names.iter().enumerate() {
            let cell = row.vars.get(column).map(String::as_str).unwrap_or("");
            let binding = format!("var_{}", name);
            match evaluator.eval_expr(cell, shared) {
                Ok(value) => scope.set(binding, value),
                Err(err) => {
                    ok = false;
                    errors.push(
                        RenderError::new(RenderErrorKind::Vars, &err, format!("{} = {}", binding, cell))
                            .at(line, column + 1),
                    );
                }
            }
        }

        scope.set("script_index", Value::Int(line as i64));
        let name_template = format!("{}{}", row.script_name, self.settings.script_extension);
        let script_name = match evaluator
            .format_template(&name_template, &scope)
            .and_then(contained_name)
        {
            Ok(name) => Some(name),
            Err(err) => {
                ok = false;
                errors.push(
                    RenderError::new(
                        RenderErrorKind::Name,
                        &err,
                        format!("script_name = f\"{}\"", name_template),
                    )
                    .at_line(line),
                );
                None
            }
        };

        let Some(script_name) = script_name.filter(|_| ok) else {
            debug!("row {} skipped", line);
            return Ok(RowOutcome::new(row.index, RowStatus::Skipped));
        };
        scope.set("script_name", script_name.as_str());

        let output = self.renderer.render(template, &scope);
        let status = if output.is_clean() {
            RowStatus::Rendered
        } else {
            RowStatus::RenderedWithErrors
        };
        errors.extend(output.errors);
        let bytes = strip_cache_artifacts(&output.bytes).into_owned();

        let mut outcome = RowOutcome::new(row.index, status);
        if status == RowStatus::Rendered || self.settings.write_on_node_errors {
            outcome.path = self.write(&script_name, &bytes)?;
        }
        debug!("row {} rendered {} bytes as {}", line, bytes.len(), script_name);
        outcome.script_name = Some(script_name);
        outcome.bytes = bytes;
        Ok(outcome)
    }

    fn write(&self, script_name: &str, bytes: &[u8]) -> Result<Option<PathBuf>, BatchError> {
        let Some(dir) = &self.settings.output_dir else {
            return Ok(None);
        };
        let path = dir.join(script_name);
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            safe_write(&path, bytes, &self.settings.retry)
        };
        write().map_err(|source| BatchError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(Some(path))
    }
}

/// Accept a formatted script name only if it stays inside the output directory
fn contained_name(name: String) -> Result<String, EvalError> {
    let inside = Path::new(&name)
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if inside && !name.is_empty() {
        Ok(name)
    } else {
        Err(EvalError::Value(format!(
            "script name '{}' must be a relative path inside the output directory",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn row(index: usize, vars: &[&str]) -> RowSpec {
        RowSpec {
            index,
            vars: vars.iter().map(|v| v.to_string()).collect(),
            script_name: "case_{script_index}".to_string(),
        }
    }

    fn job(vals: &[(&str, &str)], rows: Vec<RowSpec>) -> BatchJob {
        BatchJob {
            modules: Vec::new(),
            vals: vals
                .iter()
                .map(|(n, c)| (n.to_string(), c.to_string()))
                .collect(),
            var_names: vec!["x".to_string()],
            rows,
        }
    }

    fn renderer() -> BatchRenderer {
        BatchRenderer::new(BatchSettings::in_memory())
    }

    #[test]
    fn test_rows_render_in_order() {
        let template = Template::parse("$$ val_greeting $$ $$ var_x $$ #$$ script_index $$");
        let job = job(
            &[("greeting", "'hi'")],
            vec![row(0, &["1"]), row(1, &["'two'"])],
        );
        let report = renderer().run_all(&template, &job).unwrap();
        assert!(report.is_success(), "{:?}", report.errors);
        let texts: Vec<_> = report
            .rows
            .iter()
            .map(|r| String::from_utf8_lossy(&r.bytes).into_owned())
            .collect();
        assert_eq!(texts, vec!["hi 1 #1", "hi two #2"]);
        assert_eq!(report.rows[1].script_name.as_deref(), Some("case_2"));
    }

    #[test]
    fn test_failing_val_skips_every_row() {
        let template = Template::parse("$$ var_x $$");
        let job = job(&[("bad", "1 / 0")], vec![row(0, &["1"]), row(1, &["2"])]);
        let report = renderer().run_all(&template, &job).unwrap();
        assert_eq!(report.abort, Some(Abort::Setup));
        assert!(report.rows.iter().all(|r| r.status == RowStatus::Skipped));
        assert!(report.rows.iter().all(|r| r.bytes.is_empty()));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, RenderErrorKind::Vals);
        assert_eq!(report.errors[0].content, "val_bad = 1 / 0");
    }

    #[test]
    fn test_failing_var_skips_only_its_row() {
        let template = Template::parse("$$ var_x $$");
        let job = job(&[], vec![row(0, &["1"]), row(1, &["oops"]), row(2, &["3"])]);
        let report = renderer().run_all(&template, &job).unwrap();
        let statuses: Vec<_> = report.rows.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![RowStatus::Rendered, RowStatus::Skipped, RowStatus::Rendered]
        );
        assert_eq!(report.rows[2].bytes, b"3");
        let error = &report.errors[0];
        assert_eq!(error.kind, RenderErrorKind::Vars);
        assert_eq!((error.line, error.column), (Some(2), Some(1)));
    }

    #[test]
    fn test_modules_run_in_order() {
        let template = Template::parse("$$ area(2) $$");
        let mut job = job(&[], vec![row(0, &["0"])]);
        job.modules = vec![
            ModuleEntry {
                name: "constants".to_string(),
                source: "pi = 3".to_string(),
            },
            ModuleEntry {
                name: "derived".to_string(),
                source: "tau = pi * 2".to_string(),
            },
        ];
        let template_tau = Template::parse("$$ tau $$");
        let report = renderer().run_all(&template_tau, &job).unwrap();
        assert_eq!(report.rows[0].bytes, b"6");
        // unknown functions are node errors, not setup errors
        let report = renderer().run_all(&template, &job).unwrap();
        assert_eq!(report.rows[0].status, RowStatus::RenderedWithErrors);
    }

    #[test]
    fn test_failing_module_is_fatal() {
        let template = Template::parse("text");
        let mut job = job(&[], vec![row(0, &["1"])]);
        job.modules.push(ModuleEntry {
            name: "broken".to_string(),
            source: "x = undefined_name".to_string(),
        });
        let report = renderer().run_all(&template, &job).unwrap();
        assert_eq!(report.abort, Some(Abort::Setup));
        assert_eq!(report.errors[0].kind, RenderErrorKind::Import);
        assert_eq!(report.errors[0].content, "broken");
    }

    #[test]
    fn test_syntax_errors_abort() {
        let template = Template::parse("$IF{ x }$\nno end\n");
        let job = job(&[], vec![row(0, &["1"])]);
        let report = renderer().run_all(&template, &job).unwrap();
        assert_eq!(report.abort, Some(Abort::Syntax));
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_bad_name_template_skips_row() {
        let template = Template::parse("x");
        let mut job = job(&[], vec![row(0, &["1"])]);
        job.rows[0].script_name = "{missing}".to_string();
        let report = renderer().run_all(&template, &job).unwrap();
        assert_eq!(report.rows[0].status, RowStatus::Skipped);
        assert_eq!(report.errors[0].kind, RenderErrorKind::Name);
        assert_eq!(report.errors[0].line, Some(1));
    }

    #[rstest]
    #[case::parent("../case_{script_index}")]
    #[case::nested_parent("runs/../../case_{script_index}")]
    #[case::absolute("/tmp/case_{script_index}")]
    fn test_escaping_script_name_skips_row(#[case] name: &str) {
        let dir = TempDir::new().unwrap();
        let settings = BatchSettings {
            output_dir: Some(dir.path().join("Scripts")),
            script_extension: ".txt".to_string(),
            write_on_node_errors: true,
            retry: RetryPolicy::immediate(),
        };
        let template = Template::parse("x");
        let mut job = job(&[], vec![row(0, &["1"]), row(1, &["2"])]);
        job.rows[0].script_name = name.to_string();
        let report = BatchRenderer::new(settings).run_all(&template, &job).unwrap();

        assert_eq!(report.rows[0].status, RowStatus::Skipped);
        assert_eq!(report.rows[0].path, None);
        assert_eq!(report.rows[1].status, RowStatus::Rendered);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, RenderErrorKind::Name);
        assert_eq!(report.errors[0].code, "ValueError");
        assert!(!dir.path().join("case_1.txt").exists());
    }

    #[test]
    fn test_script_name_may_use_subdirectories() {
        let dir = TempDir::new().unwrap();
        let settings = BatchSettings {
            output_dir: Some(dir.path().to_path_buf()),
            script_extension: ".txt".to_string(),
            write_on_node_errors: true,
            retry: RetryPolicy::immediate(),
        };
        let mut job = job(&[], vec![row(0, &["1"])]);
        job.rows[0].script_name = "./runs/case_{script_index}".to_string();
        let report = BatchRenderer::new(settings)
            .run_all(&Template::parse("x"), &job)
            .unwrap();
        assert!(report.is_success(), "{:?}", report.errors);
        assert_eq!(std::fs::read(dir.path().join("runs").join("case_1.txt")).unwrap(), b"x");
    }

    #[test]
    fn test_stop_flag_cancels_remaining_rows() {
        let template = Template::parse("$$ var_x $$");
        let job = job(&[], vec![row(0, &["1"]), row(1, &["2"]), row(2, &["3"])]);
        let stop = AtomicBool::new(false);
        let mut seen = Vec::new();
        let report = renderer()
            .run(&template, &job, &stop, &mut |p| {
                seen.push(p.done);
                stop.store(true, Ordering::Relaxed);
            })
            .unwrap();
        assert_eq!(seen, vec![1]);
        let statuses: Vec<_> = report.rows.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![RowStatus::Rendered, RowStatus::Cancelled, RowStatus::Cancelled]
        );
    }

    #[test]
    fn test_writes_files() {
        let dir = TempDir::new().unwrap();
        let settings = BatchSettings {
            output_dir: Some(dir.path().join("Scripts")),
            script_extension: ".txt".to_string(),
            write_on_node_errors: false,
            retry: RetryPolicy::immediate(),
        };
        let template = Template::parse("value $$ 10 // var_x $$\n");
        let job = job(&[], vec![row(0, &["2"]), row(1, &["0"])]);
        let report = BatchRenderer::new(settings).run_all(&template, &job).unwrap();

        let written = dir.path().join("Scripts").join("case_1.txt");
        assert_eq!(report.rows[0].path.as_ref(), Some(&written));
        assert_eq!(std::fs::read(&written).unwrap(), b"value 5\n");
        // the second row hit ZeroDivisionError and is not written
        assert_eq!(report.rows[1].status, RowStatus::RenderedWithErrors);
        assert_eq!(report.rows[1].path, None);
        assert!(!dir.path().join("Scripts").join("case_2.txt").exists());
    }
}
