use anyhow::{Context, Result};
use clap::Parser;

mod actions;
mod artifacts;
mod cli;
mod css;
mod document;
mod environment;
mod pipeline;
mod source;
mod steps;
mod styles;
mod templates;

use actions::Action;
use artifacts::{output_name_for, FsArtifactWriter};
use cli::{CheckArgs, Command, CompileArgs, RootArgs, StepsArgs};
use environment::EnvironmentTable;
use pipeline::{RunContext, RunOptions};
use source::SourceLocation;

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(&args.command);

    match args.command {
        Command::Compile(args) => cmd_compile(args),
        Command::Steps(args) => cmd_steps(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn init_tracing(command: &Command) {
    let default_level = match command {
        Command::Compile(args) if args.verbose => "debug",
        _ => "info",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_compile(args: CompileArgs) -> Result<()> {
    let location = SourceLocation::parse(&args.source)?;
    let source = location
        .load()
        .with_context(|| format!("load source {location}"))?;

    let steps = match &args.steps {
        Some(path) => {
            tracing::info!("Use custom steps {}", path.display());
            steps::load_steps(path)?
        }
        None => steps::default_steps()?,
    };

    let mut environment = EnvironmentTable::for_source(&args.source);
    if let Some(host) = &args.custom_host {
        environment = environment.with_custom_host(host);
        tracing::info!(
            "Use custom host {}",
            environment.get("$HOST").unwrap_or(host.as_str())
        );
    }
    if let Some(raw) = &args.env {
        environment
            .apply_overrides(raw)
            .context("parse --env overrides")?;
    }
    for (key, value) in environment.iter() {
        tracing::debug!("{key} = {value}");
    }

    let external_styles = styles::collect_external_styles(&source, &location, &args.styles)?;

    let output_name = args
        .output
        .clone()
        .unwrap_or_else(|| output_name_for(&args.source));
    let mut writer = FsArtifactWriter::new(args.output_root.join(&output_name));
    writer.reset()?;
    tracing::info!("Output Path: {}", writer.root().display());

    let output_dir = writer.root().to_path_buf();
    let report = {
        let mut ctx = RunContext {
            environment: &environment,
            options: RunOptions {
                verbose: args.verbose,
                save_steps: !args.no_save_steps,
            },
            external_styles: &external_styles,
            disclaimer: templates::WATERMARK_HTML,
            writer: &mut writer,
        };
        pipeline::run(&source, &steps, &mut ctx)
    };

    if args.json {
        let text = serde_json::to_string_pretty(&report).context("serialize run report")?;
        println!("{text}");
    } else {
        println!(
            "Ran {} of {} steps ({} failed actions).",
            report.executed_steps(),
            report.steps.len(),
            report.failed_actions()
        );
        println!("Wrote output to {}", output_dir.display());
    }
    for failure in &report.write_failures {
        eprintln!("warning: {failure}");
    }
    Ok(())
}

fn cmd_steps(_args: StepsArgs) -> Result<()> {
    // Parse before printing so a broken template never reaches users.
    steps::default_steps()?;
    print!("{}", templates::DEFAULT_STEPS_JSON);
    Ok(())
}

fn cmd_check(args: CheckArgs) -> Result<()> {
    let steps = steps::load_steps(&args.steps)?;
    let mut total = 0;
    for (offset, step) in steps.iter().enumerate() {
        let state = if step.is_noop() { " (skipped)" } else { "" };
        println!(
            "Step {}: {} [{} actions]{state}",
            offset + 1,
            step.name,
            step.actions.len()
        );
        for spec in &step.actions {
            if let Action::Unsupported { kind } = &spec.action {
                eprintln!("warning: {}: {kind} is not supported", spec.label());
            }
        }
        total += step.actions.len();
    }
    println!(
        "Steps OK: {} steps, {total} actions in {}",
        steps.len(),
        args.steps.display()
    );
    Ok(())
}
