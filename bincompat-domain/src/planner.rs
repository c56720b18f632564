use crate::assembler::assemble;
use crate::fingerprint::plan_id;
use bincompat_decls::LoadedDecls;
use bincompat_types::config::PlannerConfig;
use bincompat_types::decl::ShapeDecl;
use bincompat_types::plan::{BincompatPlan, OutputUnit, PlanFailure, PlanInput, PlanSummary, ToolInfo};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PlanContext {
    pub decls_dir: Utf8PathBuf,
    pub config: PlannerConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Planner;

impl Planner {
    pub fn new() -> Self {
        Self
    }

    pub fn plan(
        &self,
        ctx: &PlanContext,
        decls: &[LoadedDecls],
        tool: ToolInfo,
    ) -> anyhow::Result<BincompatPlan> {
        let mut plan = BincompatPlan::new(tool, ctx.config.clone());
        plan.inputs = decls.iter().map(|d| to_plan_input(d, &ctx.decls_dir)).collect();

        let shapes: Vec<ShapeDecl> = decls
            .iter()
            .filter_map(|d| d.document.as_ref().ok())
            .flat_map(|doc| doc.shapes.iter().cloned())
            .collect();

        debug!(
            documents = decls.len(),
            shapes = shapes.len(),
            "planning declarations"
        );

        let assembly = assemble(&shapes, &ctx.config);
        let failures: Vec<PlanFailure> = assembly.failures.iter().map(|e| e.to_failure()).collect();

        plan.summary = summarize(shapes.len(), &assembly.units, &failures);
        plan.plan_id = deterministic_plan_id(&assembly.units, &failures);
        plan.units = assembly.units;
        plan.failures = failures;
        Ok(plan)
    }
}

fn to_plan_input(d: &LoadedDecls, root: &Utf8Path) -> PlanInput {
    let path = without_cur_dir(&d.path);
    let path = path
        .strip_prefix(without_cur_dir(root))
        .map(|p| p.as_str().replace('\\', "/"))
        .unwrap_or_else(|_| d.path.to_string());
    PlanInput {
        path,
        shapes: d.shape_count() as u64,
        error: d.document.as_ref().err().map(|e| e.to_string()),
    }
}

fn without_cur_dir(path: &Utf8Path) -> Utf8PathBuf {
    path.components()
        .filter(|c| !matches!(c, Utf8Component::CurDir))
        .collect()
}

fn summarize(total: usize, units: &[OutputUnit], failures: &[PlanFailure]) -> PlanSummary {
    let shapes = units
        .iter()
        .flat_map(|u| std::iter::once(&u.shape).chain(u.children.iter()));

    let mut planned = 0u64;
    let mut overloads = 0u64;
    let mut entry_points = 0u64;
    for shape in shapes {
        planned += 1;
        if let Some(c) = &shape.construction {
            overloads += c.overloads.len() as u64;
            entry_points += c.entry_points().count() as u64;
            entry_points += u64::from(c.factory.is_some());
        }
    }
    entry_points += units.iter().map(|u| u.shared_statics.len() as u64).sum::<u64>();

    PlanSummary {
        shapes_total: total as u64,
        shapes_planned: planned,
        units: units.len() as u64,
        overloads,
        entry_points,
        failures: failures.len() as u64,
    }
}

fn deterministic_plan_id(units: &[OutputUnit], failures: &[PlanFailure]) -> String {
    let shape_keys = units
        .iter()
        .flat_map(|u| std::iter::once(&u.shape).chain(u.children.iter()))
        .map(|s| format!("{}:{}", s.qualified_name, s.fingerprint));
    let failure_keys = failures.iter().map(|f| format!("{}:{}", f.shape, f.code));
    let keys: Vec<String> = shape_keys.chain(failure_keys).collect();
    plan_id(keys.iter().map(String::as_str)).to_string()
}
