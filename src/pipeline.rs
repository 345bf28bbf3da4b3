//! Step orchestration.
//!
//! The pipeline owns the document for the whole run. Actions run in order
//! against the same tree; a failed action is logged and skipped without
//! rolling back earlier actions of the step. Artifacts are handed to an
//! [`ArtifactWriter`] as soon as they exist, and write failures are recorded
//! rather than aborting the run.
use crate::actions::{run_action, ActionError};
use crate::artifacts::{self, ArtifactWriter};
use crate::document::Document;
use crate::environment::EnvironmentTable;
use crate::steps::Step;
use regex::Regex;
use serde::Serialize;
use std::error::Error;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Print the full error for failed actions instead of a one-line summary.
    pub verbose: bool,
    /// Write per-step snapshots and CSS reports.
    pub save_steps: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            save_steps: true,
        }
    }
}

/// Everything a run reads besides the source markup and the steps.
pub struct RunContext<'a> {
    pub environment: &'a EnvironmentTable,
    pub options: RunOptions,
    /// Linked stylesheet text consumed by `inlineExternalStyles`.
    pub external_styles: &'a str,
    /// Fragment injected after the opening body tag of the final markup.
    pub disclaimer: &'a str,
    pub writer: &'a mut dyn ArtifactWriter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    Applied { label: String, message: String },
    Failed { label: String, error: String },
}

/// What a step published: the document after its last action and the CSS
/// reports of the last action in the step that produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepArtifact {
    pub html: String,
    pub optimized_styles: Option<String>,
    pub unused_styles: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// 1-based position in the step list.
    pub index: usize,
    pub name: String,
    pub skipped: bool,
    pub actions: Vec<ActionOutcome>,
    pub artifact: Option<StepArtifact>,
}

impl StepReport {
    pub fn failures(&self) -> usize {
        self.actions
            .iter()
            .filter(|outcome| matches!(outcome, ActionOutcome::Failed { .. }))
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub steps: Vec<StepReport>,
    pub final_html: String,
    pub write_failures: Vec<String>,
}

impl RunReport {
    pub fn executed_steps(&self) -> usize {
        self.steps.iter().filter(|step| !step.skipped).count()
    }

    pub fn failed_actions(&self) -> usize {
        self.steps.iter().map(StepReport::failures).sum()
    }
}

/// Run `steps` against `source` and write the run's artifacts.
pub fn run(source: &str, steps: &[Step], ctx: &mut RunContext<'_>) -> RunReport {
    let mut report = RunReport::default();
    let mut document = Document::parse(source);
    write_artifact(ctx, &mut report, artifacts::ORIGINAL_HTML, source);

    for (offset, step) in steps.iter().enumerate() {
        let index = offset + 1;
        if step.is_noop() {
            tracing::debug!(step = index, name = %step.name, "step skipped");
            report.steps.push(StepReport {
                index,
                name: step.name.clone(),
                skipped: true,
                actions: Vec::new(),
                artifact: None,
            });
            continue;
        }
        tracing::info!("Step {index}: {}", step.name);
        let step_report = run_step(index, step, &mut document, ctx);
        if ctx.options.save_steps {
            if let Some(artifact) = &step_report.artifact {
                write_step_artifact(ctx, &mut report, index, artifact);
            }
        }
        report.steps.push(step_report);
    }

    let final_html = insert_disclaimer(&document.serialize(), ctx.disclaimer);
    write_artifact(ctx, &mut report, artifacts::FINAL_HTML, &final_html);
    report.final_html = final_html;
    report
}

fn run_step(
    index: usize,
    step: &Step,
    document: &mut Document,
    ctx: &RunContext<'_>,
) -> StepReport {
    let mut outcomes = Vec::with_capacity(step.actions.len());
    let mut optimized_styles = None;
    let mut unused_styles = None;
    for spec in &step.actions {
        let spec = spec.resolve(ctx.environment);
        let label = spec.label().to_string();
        match run_action(&spec.action, document, ctx.external_styles) {
            Ok(result) => {
                tracing::info!("\t{label}: {}", result.message);
                if result.optimized_styles.is_some() || result.unused_styles.is_some() {
                    optimized_styles = result.optimized_styles;
                    unused_styles = result.unused_styles;
                }
                outcomes.push(ActionOutcome::Applied {
                    label,
                    message: result.message,
                });
            }
            Err(err) => {
                log_failure(&label, &err, ctx.options.verbose);
                outcomes.push(ActionOutcome::Failed {
                    label,
                    error: err.to_string(),
                });
            }
        }
    }
    StepReport {
        index,
        name: step.name.clone(),
        skipped: false,
        actions: outcomes,
        artifact: Some(StepArtifact {
            html: document.serialize(),
            optimized_styles,
            unused_styles,
        }),
    }
}

fn log_failure(label: &str, err: &ActionError, verbose: bool) {
    if verbose {
        let mut detail = format!("{err:?}");
        let mut source = err.source();
        while let Some(cause) = source {
            detail.push_str(&format!("\n\tcaused by: {cause}"));
            source = cause.source();
        }
        tracing::warn!("\t{label}: {detail}");
    } else {
        tracing::warn!("\t{label}: Error: {err}");
    }
}

fn write_step_artifact(
    ctx: &mut RunContext<'_>,
    report: &mut RunReport,
    index: usize,
    artifact: &StepArtifact,
) {
    write_artifact(ctx, report, &artifacts::step_html(index), &artifact.html);
    if let Some(styles) = &artifact.optimized_styles {
        write_artifact(ctx, report, &artifacts::step_optimized_css(index), styles);
    }
    if let Some(styles) = &artifact.unused_styles {
        write_artifact(ctx, report, &artifacts::step_unused_css(index), styles);
    }
}

fn write_artifact(ctx: &mut RunContext<'_>, report: &mut RunReport, rel_path: &str, content: &str) {
    if let Err(err) = ctx.writer.write(rel_path, content) {
        tracing::warn!("failed to write {rel_path}: {err:#}");
        report.write_failures.push(format!("{rel_path}: {err:#}"));
    }
}

fn body_tag_regex() -> &'static Regex {
    static BODY_RE: OnceLock<Regex> = OnceLock::new();
    BODY_RE.get_or_init(|| Regex::new(r"<body[^>]*>").expect("valid body tag regex"))
}

/// Insert `fragment` right after the first opening body tag. Markup without a
/// body tag is returned unchanged.
pub fn insert_disclaimer(html: &str, fragment: &str) -> String {
    match body_tag_regex().find(html) {
        Some(tag) => {
            let mut out = String::with_capacity(html.len() + fragment.len());
            out.push_str(&html[..tag.end()]);
            out.push_str(fragment);
            out.push_str(&html[tag.end()..]);
            out
        }
        None => html.to_string(),
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
