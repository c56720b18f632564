mod config;
mod explain;

use anyhow::Context;
use bincompat_core::adapters::{FsDeclSource, FsWritePort};
use bincompat_core::pipeline::{PlanOutcome, ToolError, run_plan, write_plan_artifacts};
use bincompat_core::settings::PlanSettings;
use bincompat_types::config::ConstructionStyle;
use bincompat_types::plan::ToolInfo;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use config::{ConfigMerger, PlannerOverrides};
use explain::Lookup;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "bincompat",
    version,
    about = "Plans constructor overloads, builders and identity for binary-compatible data shapes."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plan every declared shape and write plan.json, plan.md and report.json.
    Plan(PlanArgs),
    /// Plan without writing artifacts; exit 2 when any shape fails.
    Check(InputArgs),
    /// Print the version table, builder tiers and identity of one shape.
    Explain(ExplainArgs),
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Project root holding bincompat.toml (default: current directory).
    #[arg(long, default_value = ".")]
    root: Utf8PathBuf,

    /// Directory of declaration documents (default: <root>/decls).
    #[arg(long)]
    decls_dir: Option<Utf8PathBuf>,

    /// Suffix dropped from declared names.
    #[arg(long)]
    required_suffix: Option<String>,

    /// Package suffix stripped from output packages (repeatable).
    #[arg(long = "drop-package-suffix")]
    drop_package_suffixes: Vec<String>,

    /// Construction style: callback or overload.
    #[arg(long)]
    style: Option<ConstructionStyle>,
}

#[derive(Debug, Parser)]
struct PlanArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output directory (default: <root>/artifacts/bincompat).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct ExplainArgs {
    /// Output name, declared name or simple name of the shape.
    shape: String,

    #[command(flatten)]
    input: InputArgs,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn real_main() -> Result<(), ToolError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Plan(args) => cmd_plan(args),
        Command::Check(args) => cmd_check(args),
        Command::Explain(args) => cmd_explain(args),
    }
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "bincompat".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    }
}

fn settings_from(input: &InputArgs, out_dir: Option<Utf8PathBuf>) -> anyhow::Result<PlanSettings> {
    let file_config = config::load_or_default(&input.root).context("load bincompat.toml config")?;
    let overrides = PlannerOverrides {
        required_suffix: input.required_suffix.clone(),
        drop_package_suffixes: input.drop_package_suffixes.clone(),
        construction_style: input.style,
    };
    let merged = ConfigMerger::new(file_config).merge(&overrides);

    debug!(
        "merged config: required_suffix={}, drop_package_suffixes={:?}, style={}",
        merged.planner.required_suffix,
        merged.planner.drop_package_suffixes,
        merged.planner.construction_style.as_str()
    );

    let out_dir = out_dir
        .or_else(|| merged.out_dir.map(|d| input.root.join(d)))
        .unwrap_or_else(|| input.root.join("artifacts").join("bincompat"));

    Ok(PlanSettings {
        decls_dir: input
            .decls_dir
            .clone()
            .unwrap_or_else(|| input.root.join("decls")),
        out_dir,
        planner: merged.planner,
    })
}

fn plan_with(settings: &PlanSettings) -> Result<PlanOutcome, ToolError> {
    let source = FsDeclSource::new(settings.decls_dir.clone());
    run_plan(settings, &source, tool_info())
}

fn cmd_plan(args: PlanArgs) -> Result<(), ToolError> {
    let settings = settings_from(&args.input, args.out_dir)?;
    let outcome = plan_with(&settings)?;

    write_plan_artifacts(&outcome, &settings.out_dir, &FsWritePort)
        .with_context(|| format!("write artifacts to {}", settings.out_dir))?;

    let summary = &outcome.plan.summary;
    info!(
        plan_id = %outcome.plan.plan_id,
        units = summary.units,
        failures = summary.failures,
        "plan complete"
    );
    println!(
        "planned {} of {} shapes into {} unit(s), {} failure(s); wrote {}",
        summary.shapes_planned,
        summary.shapes_total,
        summary.units,
        summary.failures,
        settings.out_dir
    );

    outcome.into_result().map(|_| ())
}

fn cmd_check(args: InputArgs) -> Result<(), ToolError> {
    let settings = settings_from(&args, None)?;
    let outcome = plan_with(&settings)?;

    for input in &outcome.plan.inputs {
        if let Some(reason) = &input.error {
            println!("warning: {}: {}", input.path, reason);
        }
    }
    for f in &outcome.plan.failures {
        let field = f.field.as_ref().map(|f| format!(".{f}")).unwrap_or_default();
        println!("{}: {}{}: {}", f.code, f.shape, field, f.message);
    }
    if outcome.defects == 0 {
        println!(
            "ok: {} shape(s) planned into {} unit(s)",
            outcome.plan.summary.shapes_planned, outcome.plan.summary.units
        );
    }

    outcome.into_result().map(|_| ())
}

fn cmd_explain(args: ExplainArgs) -> Result<(), ToolError> {
    let settings = settings_from(&args.input, None)?;
    let outcome = plan_with(&settings)?;

    match explain::lookup_shape(&outcome.plan, &args.shape) {
        Lookup::Planned(shape) => {
            print!("{}", explain::explain_planned(shape));
            Ok(())
        }
        Lookup::Failed(failures) => {
            print!("{}", explain::explain_failed(&args.shape, &failures));
            Err(ToolError::Defects(failures.len() as u64))
        }
        Lookup::Unknown => {
            let known = explain::known_shapes(&outcome.plan).join(", ");
            Err(anyhow::anyhow!(
                "Unknown shape: '{}'\n\nPlanned shapes: {}",
                args.shape,
                if known.is_empty() { "(none)" } else { known.as_str() }
            )
            .into())
        }
    }
}
