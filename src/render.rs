//! Plain-text rendering of wizard pages. Pure functions of the state; never fail.

use std::fmt::Write;

use serde_json::Value;

use crate::api::types::{ColumnStats, InputSlot, Scenario, TableSummary};
use crate::config::FormVariant;
use crate::wizard::{Page, ScenarioDraft, SlotSummary, SummaryBoard, WizardState};

const RULE: &str = "----------------------------------------";

/// Error payload as display text: strings verbatim, anything else as JSON.
pub fn error_text(message: &Value) -> String {
    match message {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Stat cell: raw strings unquoted, missing as `-`.
fn cell(value: Option<&Value>) -> String {
    match value {
        None => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

fn fmt_param(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn created_at(scenario: &Scenario) -> String {
    match scenario.created_at_parsed() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => or_dash(scenario.created_at.as_deref()).to_string(),
    }
}

pub fn render(state: &WizardState) -> String {
    if state.loading {
        return "[ loading... ]\n".to_string();
    }
    match &state.page {
        Page::Form => render_form(state),
        // Only reachable under the loading overlay.
        Page::Submitted { .. } => "[ loading... ]\n".to_string(),
        Page::Success {
            scenario_id,
            job_run_id,
            keep_inputs,
        } => render_success(scenario_id, job_run_id, *keep_inputs),
        Page::Error {
            message,
            orphaned_scenario,
        } => render_error(message, orphaned_scenario.as_deref()),
        Page::RunsList { runs } => render_runs(runs),
        Page::ScenarioDetails {
            scenario,
            summaries,
            ..
        } => render_details(scenario, summaries),
    }
}

fn render_form(state: &WizardState) -> String {
    let draft: &ScenarioDraft = &state.draft;
    let mut out = String::new();
    let _ = writeln!(out, "== New scenario ==");
    if state.variant == FormVariant::Annotated {
        let _ = writeln!(out, "Description:  {}", or_dash(Some(draft.description.as_str())));
    }
    let _ = writeln!(
        out,
        "Keep inputs:  {}",
        if draft.keep_inputs { "Yes" } else { "No" }
    );
    let _ = writeln!(out, "{RULE}");
    for slot in InputSlot::ALL {
        let input = draft.slot(slot);
        let _ = write!(
            out,
            "[{}] {:<16} {}",
            slot.index() + 1,
            slot.label(),
            or_dash(Some(input.table.as_str()))
        );
        if state.variant == FormVariant::Annotated && !input.comment.is_empty() {
            let _ = write!(out, "  ({})", input.comment);
        }
        let _ = writeln!(out);
    }
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Time Window:       {}", or_dash(Some(draft.param1.as_str())));
    let _ = writeln!(out, "Forecast Horizon:  {}", or_dash(Some(draft.param2.as_str())));
    let _ = writeln!(out, "{RULE}");
    if state.available_tables.is_empty() {
        let _ = writeln!(out, "Available tables: (none)");
    } else {
        let _ = writeln!(out, "Available tables: {}", state.available_tables.join(", "));
    }
    let _ = writeln!(
        out,
        "Submit: {}",
        if state.can_submit() { "ready" } else { "incomplete" }
    );
    out
}

fn render_success(scenario_id: &str, job_run_id: &str, keep_inputs: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Scenario submitted ==");
    let _ = writeln!(out, "Your scenario has been submitted to be run.");
    if keep_inputs {
        let _ = writeln!(out, "Input tables have been saved with suffix of {scenario_id}.");
    } else {
        let _ = writeln!(out, "Input tables have not been saved.");
    }
    let _ = writeln!(out, "Scenario ID: {scenario_id}");
    let _ = writeln!(out, "Job Run ID:  {job_run_id}");
    out
}

fn render_error(message: &Value, orphaned_scenario: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Submission failed ==");
    let _ = writeln!(out, "{}", error_text(message));
    if let Some(id) = orphaned_scenario {
        let _ = writeln!(out, "Scenario {id} was recorded but has no job run.");
    }
    out
}

fn render_runs(runs: &[Scenario]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== All scenario submissions ==");
    if runs.is_empty() {
        let _ = writeln!(out, "No runs found.");
        return out;
    }
    let _ = writeln!(
        out,
        "{:<38} {:<16} {:<16} {:<16} {:>8} {:>8} {:<19} {}",
        "Scenario ID", "Table 1", "Table 2", "Table 3", "Param 1", "Param 2", "Created At", "Inputs Kept"
    );
    for run in runs {
        let _ = writeln!(
            out,
            "{:<38} {:<16} {:<16} {:<16} {:>8} {:>8} {:<19} {}",
            run.scenario_id,
            or_dash(run.flat_table(InputSlot::Input1)),
            or_dash(run.flat_table(InputSlot::Input2)),
            or_dash(run.flat_table(InputSlot::Input3)),
            fmt_param(run.param1),
            fmt_param(run.param2),
            created_at(run),
            run.inputs_kept.map(|k| k.to_string()).unwrap_or_else(|| "-".into()),
        );
    }
    out
}

fn render_details(scenario: &Scenario, summaries: &SummaryBoard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Scenario details ==");
    let _ = writeln!(out, "ID:           {}", scenario.scenario_id);
    let _ = writeln!(out, "Description:  {}", or_dash(scenario.scenario_description.as_deref()));
    let _ = writeln!(out, "Created At:   {}", created_at(scenario));
    let _ = writeln!(
        out,
        "Keep Inputs:  {}",
        scenario.inputs_kept.map(|k| k.to_string()).unwrap_or_else(|| "-".into())
    );
    if let Some(job) = &scenario.job_run_id {
        let _ = writeln!(out, "Job Run ID:   {job}");
    }
    let _ = writeln!(out, "Time Window:       {}", fmt_param(scenario.param1));
    let _ = writeln!(out, "Forecast Horizon:  {}", fmt_param(scenario.param2));
    let _ = writeln!(out, "{RULE}");
    for slot in InputSlot::ALL {
        let _ = writeln!(
            out,
            "{}  {:<24} {}",
            slot.key(),
            or_dash(scenario.table_for(slot)),
            scenario.comment_for(slot)
        );
    }
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Input table summaries");
    if summaries.loading {
        let _ = writeln!(out, "  loading summaries...");
        return out;
    }
    for slot in InputSlot::ALL {
        let title = scenario.table_for(slot).unwrap_or(slot.key());
        let _ = writeln!(out, "# {title}");
        match summaries.slot(slot) {
            SlotSummary::Loaded(summary) => render_summary(&mut out, summary),
            SlotSummary::Failed(error) => {
                let _ = writeln!(out, "  error: {error}");
            }
            SlotSummary::Unavailable | SlotSummary::Pending => {
                let _ = writeln!(out, "  No summary available.");
            }
        }
    }
    out
}

fn render_summary(out: &mut String, summary: &TableSummary) {
    let rows = summary
        .row_count
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".into());
    let _ = writeln!(out, "  Row count: {rows}");
    if !summary.columns.is_empty() {
        let _ = writeln!(
            out,
            "  {:<20} {:<12} {:>14} {:>14} {:>14} {:>9}",
            "Column", "Type", "Min", "Max", "Avg", "Distinct"
        );
        let empty = ColumnStats::default();
        for col in &summary.columns {
            let stat = summary.stats.get(&col.name).unwrap_or(&empty);
            let _ = writeln!(
                out,
                "  {:<20} {:<12} {:>14} {:>14} {:>14} {:>9}",
                col.name,
                col.data_type,
                cell(stat.min.as_ref()),
                cell(stat.max.as_ref()),
                cell(stat.avg.as_ref()),
                cell(stat.distinct_count.as_ref()),
            );
        }
    }
    if let Some(preview) = summary.preview.as_ref().filter(|p| !p.is_empty()) {
        let _ = writeln!(out, "  Preview:");
        let header: Vec<&str> = preview[0].keys().map(String::as_str).collect();
        let _ = writeln!(out, "  {}", header.join(" | "));
        for row in preview {
            let values: Vec<String> = row.values().map(|v| cell(Some(v))).collect();
            let _ = writeln!(out, "  {}", values.join(" | "));
        }
    }
}
