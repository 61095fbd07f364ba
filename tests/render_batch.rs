//! Rendering the curated samples, alone and in batches

use enna::enna::codec::ModuleEntry;
use enna::enna::rendering::{
    Abort, BatchJob, BatchRenderer, BatchSettings, RenderErrorKind, RowSpec, RowStatus,
};
use enna::enna::testing::{render_str, samples};
use enna::{Renderer, Scope, Template, Value};
use rstest::rstest;

fn job(vals: &[(&str, &str)], var_names: &[&str], rows: &[&[&str]]) -> BatchJob {
    BatchJob {
        modules: Vec::new(),
        vals: vals
            .iter()
            .map(|(name, cell)| (name.to_string(), cell.to_string()))
            .collect(),
        var_names: var_names.iter().map(|name| name.to_string()).collect(),
        rows: rows
            .iter()
            .enumerate()
            .map(|(index, cells)| RowSpec {
                index,
                vars: cells.iter().map(|cell| cell.to_string()).collect(),
                script_name: "case_{script_index:0>2}".to_string(),
            })
            .collect(),
    }
}

fn run(source: &str, job: &BatchJob) -> enna::enna::rendering::BatchReport {
    BatchRenderer::new(BatchSettings::in_memory())
        .run_all(&Template::parse(source), job)
        .unwrap()
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[rstest]
#[case::hello("010-hello.inp", &[("name", "'World'")], &[], &[], "Hello World!\n")]
#[case::looping(
    "020-loop.inp",
    &[],
    &["title", "items"],
    &["'Todo'", "['milk', 'eggs']"],
    "# Todo\n1. milk\n2. eggs\n"
)]
#[case::fast("030-branches.inp", &[("steps", "10")], &["mode"], &["'fast'"], "mode = 'fast'\nsteps = 5\n")]
#[case::slow("030-branches.inp", &[("steps", "10")], &["mode"], &["'slow'"], "mode = 'slow'\nsteps = 20\n")]
#[case::other("030-branches.inp", &[("steps", "10")], &["mode"], &["'x'"], "mode = 'x'\nsteps = 10\n")]
#[case::exec("040-exec.inp", &[], &["values"], &["[1, 2, 3, 4]"], "\ntotal = 10\nmean = 2.50\n")]
fn samples_render(
    #[case] sample: &str,
    #[case] vals: &[(&str, &str)],
    #[case] var_names: &[&str],
    #[case] vars: &[&str],
    #[case] expected: &str,
) {
    let report = run(samples::get(sample), &job(vals, var_names, &[vars]));
    assert!(report.is_success(), "{:?}", report.errors);
    assert_eq!(text(&report.rows[0].bytes), expected);
    assert_eq!(report.rows[0].script_name.as_deref(), Some("case_01"));
}

#[test]
fn failing_expression_among_siblings() {
    let output = render_str("a $$ 1 $$ b $$ missing $$ c $$ 2 $$ d", Vec::<(&str, Value)>::new());
    assert_eq!(output.text(), "a 1 b  c 2 d");
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].kind, RenderErrorKind::Expression);
    assert_eq!(output.errors[0].code, "NameError");
}

#[test]
fn failing_nodes_inside_blocks_are_local() {
    let source = "$FOR{ i in range(3) }$\n$$ 10 // (1 - i) $$;\n$END$\nend\n";
    let output = render_str(source, Vec::<(&str, Value)>::new());
    assert_eq!(output.text(), "10;\n;\n-10;\nend\n");
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].code, "ZeroDivisionError");
}

#[test]
fn render_is_deterministic() {
    let template = Template::parse(samples::get("020-loop.inp"));
    let mut scope = Scope::new();
    scope.set("var_title", "T");
    scope.set(
        "var_items",
        Value::List(vec![Value::from("x"), Value::from(2i64), Value::from(2.5)]),
    );

    let renderer = Renderer::new();
    let first = renderer.render(&template, &scope);
    let second = renderer.render(&template, &scope);
    assert_eq!(first.bytes, second.bytes);
    assert_eq!(first.text(), "# T\n1. x\n2. 2\n3. 2.5\n");
}

#[test]
fn failing_val_skips_every_row() {
    let report = run(
        samples::get("030-branches.inp"),
        &job(&[("steps", "1 / 0")], &["mode"], &[&["'fast'"], &["'slow'"]]),
    );
    assert_eq!(report.abort, Some(Abort::Setup));
    assert_eq!(report.count(RowStatus::Skipped), 2);
    assert!(report.rows.iter().all(|row| row.bytes.is_empty()));
    assert!(report
        .errors
        .iter()
        .any(|error| error.kind == RenderErrorKind::Vals));
}

#[test]
fn failing_var_skips_only_its_row() {
    let report = run(
        samples::get("030-branches.inp"),
        &job(
            &[("steps", "4")],
            &["mode"],
            &[&["'fast'"], &["undefined_name"], &["'slow'"]],
        ),
    );
    assert_eq!(report.abort, None);
    let statuses: Vec<_> = report.rows.iter().map(|row| row.status).collect();
    assert_eq!(
        statuses,
        vec![RowStatus::Rendered, RowStatus::Skipped, RowStatus::Rendered]
    );
    assert_eq!(text(&report.rows[0].bytes), "mode = 'fast'\nsteps = 2\n");
    assert_eq!(text(&report.rows[2].bytes), "mode = 'slow'\nsteps = 8\n");
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, RenderErrorKind::Vars);
    assert_eq!(report.errors[0].line, Some(2));
}

#[test]
fn modules_feed_vals_and_vars() {
    let mut job = job(&[("base", "scale * 2")], &["n"], &[&["scale + 1"]]);
    job.modules = vec![ModuleEntry {
        name: "setup".to_string(),
        source: "scale = 3".to_string(),
    }];
    let report = run("$$ val_base $$ $$ var_n $$ $$ scale $$", &job);
    assert!(report.is_success(), "{:?}", report.errors);
    assert_eq!(text(&report.rows[0].bytes), "6 4 3");
}

#[test]
fn syntax_errors_render_nothing() {
    let report = run(
        samples::get("910-else-root.inp"),
        &job(&[], &[], &[&[]]),
    );
    assert_eq!(report.abort, Some(Abort::Syntax));
    assert_eq!(report.count(RowStatus::Skipped), 1);
}
