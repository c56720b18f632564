//! Core plan pipeline, extracted from the CLI.
//!
//! These entry points are I/O-agnostic: all filesystem operations are
//! performed through the port traits.

use crate::ports::{DeclSource, WritePort};
use crate::settings::PlanSettings;
use anyhow::Context;
use bincompat_domain::{PlanContext, Planner};
use bincompat_render::render_plan_md;
use bincompat_types::plan::{BincompatPlan, ToolInfo};
use bincompat_types::report::{
    BincompatReport, ReportArtifacts, ReportCounts, ReportFinding, ReportLocation, ReportRunInfo,
    ReportSeverity, ReportStatus, ReportToolInfo, ReportVerdict,
};
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Error type for pipeline results. Exit code 2 = planning defects, 1 = tool error.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0} planning defect(s)")]
    Defects(u64),
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolError::Defects(_) => 2,
            ToolError::Internal(_) => 1,
        }
    }
}

/// Outcome of `run_plan`.
#[derive(Debug)]
pub struct PlanOutcome {
    pub plan: BincompatPlan,
    pub report: BincompatReport,
    /// Number of shapes or families that failed to plan.
    pub defects: u64,
}

impl PlanOutcome {
    /// Maps the outcome onto the pipeline result the CLI exits with.
    pub fn into_result(self) -> Result<Self, ToolError> {
        if self.defects > 0 {
            Err(ToolError::Defects(self.defects))
        } else {
            Ok(self)
        }
    }
}

/// Run the plan pipeline. Returns the plan and its report.
///
/// Defects in the declarations are part of a successful outcome; only
/// infrastructure failures are errors here. The caller is responsible for
/// writing artifacts (via `WritePort` or `write_plan_artifacts`).
pub fn run_plan(
    settings: &PlanSettings,
    source: &dyn DeclSource,
    tool: ToolInfo,
) -> Result<PlanOutcome, ToolError> {
    let started_at = Utc::now();
    let decls = source.load_decls()?;

    let ctx = PlanContext {
        decls_dir: settings.decls_dir.clone(),
        config: settings.planner.clone(),
    };
    let plan = Planner::new()
        .plan(&ctx, &decls, tool.clone())
        .context("generate plan")?;

    debug!(
        plan_id = %plan.plan_id,
        units = plan.summary.units,
        failures = plan.summary.failures,
        "plan generated"
    );

    let report = report_from_plan(&plan, tool, started_at);
    let defects = plan.failures.len() as u64;

    Ok(PlanOutcome {
        plan,
        report,
        defects,
    })
}

/// Write all plan artifacts to the output directory.
pub fn write_plan_artifacts(
    outcome: &PlanOutcome,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    let plan_json = serde_json::to_string_pretty(&outcome.plan).context("serialize plan")?;
    writer.write_file(&out_dir.join("plan.json"), plan_json.as_bytes())?;

    let plan_md = render_plan_md(&outcome.plan);
    writer.write_file(&out_dir.join("plan.md"), plan_md.as_bytes())?;

    let report_json = serde_json::to_string_pretty(&outcome.report).context("serialize report")?;
    writer.write_file(&out_dir.join("report.json"), report_json.as_bytes())?;

    info!(out_dir = %out_dir, "wrote plan artifacts");
    Ok(())
}

pub(crate) fn report_from_plan(
    plan: &BincompatPlan,
    tool: ToolInfo,
    started_at: DateTime<Utc>,
) -> BincompatReport {
    let mut findings: Vec<ReportFinding> = Vec::new();

    for input in &plan.inputs {
        let Some(reason) = &input.error else {
            continue;
        };
        findings.push(ReportFinding {
            severity: ReportSeverity::Warn,
            check_id: Some("inputs".to_string()),
            code: "decl_load_failed".to_string(),
            message: format!("Declarations failed to load: {} ({})", input.path, reason),
            location: Some(ReportLocation {
                path: Some(input.path.clone()),
                shape: None,
                field: None,
            }),
            fingerprint: Some(format!("inputs/decl_load_failed/{}", input.path)),
        });
    }
    let warn_count = findings.len() as u64;

    for failure in &plan.failures {
        let field = failure.field.as_deref().unwrap_or("-");
        findings.push(ReportFinding {
            severity: ReportSeverity::Error,
            check_id: Some(failure.family.as_str().to_string()),
            code: failure.code.clone(),
            message: failure.message.clone(),
            location: Some(ReportLocation {
                path: None,
                shape: Some(failure.shape.clone()),
                field: failure.field.clone(),
            }),
            fingerprint: Some(format!("{}/{}/{}", failure.code, failure.shape, field)),
        });
    }
    let error_count = plan.failures.len() as u64;

    let mut reasons = Vec::new();
    if error_count > 0 {
        reasons.push("plan_failures".to_string());
    }
    if warn_count > 0 {
        reasons.push("partial_inputs".to_string());
    }

    let status = if error_count > 0 {
        ReportStatus::Fail
    } else if warn_count > 0 {
        ReportStatus::Warn
    } else {
        ReportStatus::Pass
    };

    BincompatReport {
        schema: bincompat_types::schema::BINCOMPAT_REPORT_V1.to_string(),
        tool: ReportToolInfo {
            name: tool.name,
            version: tool.version.unwrap_or_else(|| "unknown".to_string()),
        },
        run: ReportRunInfo {
            started_at: started_at.to_rfc3339(),
            ended_at: Some(Utc::now().to_rfc3339()),
        },
        verdict: ReportVerdict {
            status,
            counts: ReportCounts {
                info: plan.summary.units,
                warn: warn_count,
                error: error_count,
            },
            reasons,
        },
        findings,
        artifacts: Some(ReportArtifacts {
            plan: Some("plan.json".to_string()),
            summary: Some("plan.md".to_string()),
        }),
        data: Some(serde_json::json!({
            "bincompat": {
                "plan_id": plan.plan_id,
                "shapes_total": plan.summary.shapes_total,
                "shapes_planned": plan.summary.shapes_planned,
                "units": plan.summary.units,
                "overloads": plan.summary.overloads,
                "entry_points": plan.summary.entry_points,
                "construction_style": plan.config.construction_style.as_str(),
            }
        })),
    }
}
