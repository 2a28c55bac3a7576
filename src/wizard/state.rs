//! Wizard state as a value, transitioned only by [`WizardState::reduce`].

use serde_json::Value;

use crate::api::types::{InputSlot, Scenario, TableSummary};
use crate::config::FormVariant;

use super::draft::{DraftEdit, ScenarioDraft};

const TRIGGER_INTERRUPTED: &str = "Job trigger did not complete";

/// Outcome of one slot's table-summary fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotSummary {
    /// Fetch in flight.
    Pending,
    /// The scenario names no table for this slot; nothing was fetched.
    Unavailable,
    Loaded(TableSummary),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryBoard {
    /// True until every slot has settled.
    pub loading: bool,
    pub slots: [SlotSummary; 3],
}

impl SummaryBoard {
    pub fn pending_for(scenario: &Scenario) -> Self {
        let slots = InputSlot::ALL.map(|slot| match scenario.table_for(slot) {
            Some(_) => SlotSummary::Pending,
            None => SlotSummary::Unavailable,
        });
        let loading = slots.iter().any(|s| *s == SlotSummary::Pending);
        Self { loading, slots }
    }

    pub fn slot(&self, slot: InputSlot) -> &SlotSummary {
        &self.slots[slot.index()]
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Page {
    #[default]
    Form,
    /// Scenario recorded, job trigger still outstanding. Only ever seen under the
    /// loading overlay; clearing the overlay turns a leftover one into an error.
    Submitted { scenario_id: String },
    Success {
        scenario_id: String,
        job_run_id: String,
        /// Whether the submission asked the backend to keep its input tables.
        keep_inputs: bool,
    },
    Error {
        message: Value,
        /// Set when the scenario was recorded but its job could not be triggered.
        orphaned_scenario: Option<String>,
    },
    RunsList { runs: Vec<Scenario> },
    ScenarioDetails {
        view_id: u64,
        scenario: Box<Scenario>,
        summaries: SummaryBoard,
    },
}

impl Page {
    pub fn name(&self) -> &'static str {
        match self {
            Page::Form => "form",
            Page::Submitted { .. } => "submitted",
            Page::Success { .. } => "success",
            Page::Error { .. } => "error",
            Page::RunsList { .. } => "runs",
            Page::ScenarioDetails { .. } => "scenario_details",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    TablesLoaded(Vec<String>),
    Edit(DraftEdit),
    LoadingStarted,
    LoadingFinished,
    Submitted { scenario_id: String },
    JobTriggered { job_run_id: String },
    SubmitFailed { message: Value },
    JobTriggerFailed { message: Value },
    RequestFailed { message: Value },
    ViewedRuns(Vec<Scenario>),
    ViewedDetails { view_id: u64, scenario: Scenario },
    SummariesSettled { view_id: u64, slots: [SlotSummary; 3] },
    Reset,
    Back,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WizardState {
    pub page: Page,
    pub draft: ScenarioDraft,
    pub available_tables: Vec<String>,
    /// Blocking overlay; while set nothing else is shown.
    pub loading: bool,
    pub variant: FormVariant,
    pub default_tables: [String; 3],
}

impl WizardState {
    pub fn new(variant: FormVariant, default_tables: [String; 3]) -> Self {
        Self {
            page: Page::Form,
            draft: ScenarioDraft::initial(variant, &default_tables),
            available_tables: Vec::new(),
            loading: false,
            variant,
            default_tables,
        }
    }

    pub fn can_submit(&self) -> bool {
        self.draft.can_submit(self.variant)
    }

    pub fn error_message(&self) -> Option<&Value> {
        match &self.page {
            Page::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// View id of the details page currently shown, if any.
    pub fn details_view(&self) -> Option<u64> {
        match &self.page {
            Page::ScenarioDetails { view_id, .. } => Some(*view_id),
            _ => None,
        }
    }

    pub fn reduce(mut self, action: Action) -> Self {
        match action {
            Action::TablesLoaded(tables) => self.available_tables = tables,
            Action::Edit(edit) => self.draft.apply(edit),
            Action::LoadingStarted => self.loading = true,
            Action::LoadingFinished => {
                self.loading = false;
                // The job trigger never reported back (operation abandoned or panicked).
                match std::mem::take(&mut self.page) {
                    Page::Submitted { scenario_id } => {
                        tracing::warn!(
                            scenario_id = %scenario_id,
                            "Submission ended before its job was triggered"
                        );
                        self.page = Page::Error {
                            message: Value::String(TRIGGER_INTERRUPTED.into()),
                            orphaned_scenario: Some(scenario_id),
                        };
                    }
                    other => self.page = other,
                }
            }
            Action::Submitted { scenario_id } => self.page = Page::Submitted { scenario_id },
            Action::JobTriggered { job_run_id } => match std::mem::take(&mut self.page) {
                Page::Submitted { scenario_id } => {
                    self.page = Page::Success {
                        scenario_id,
                        job_run_id,
                        keep_inputs: self.draft.keep_inputs,
                    }
                }
                other => {
                    tracing::warn!(page = other.name(), "Job triggered outside a submission");
                    self.page = other;
                }
            },
            Action::SubmitFailed { message } | Action::RequestFailed { message } => {
                self.page = Page::Error {
                    message,
                    orphaned_scenario: None,
                }
            }
            Action::JobTriggerFailed { message } => {
                let orphaned_scenario = match &self.page {
                    Page::Submitted { scenario_id } => Some(scenario_id.clone()),
                    _ => None,
                };
                self.page = Page::Error {
                    message,
                    orphaned_scenario,
                };
            }
            Action::ViewedRuns(runs) => self.page = Page::RunsList { runs },
            Action::ViewedDetails { view_id, scenario } => {
                let summaries = SummaryBoard::pending_for(&scenario);
                self.page = Page::ScenarioDetails {
                    view_id,
                    scenario: Box::new(scenario),
                    summaries,
                };
            }
            Action::SummariesSettled { view_id, slots } => match &mut self.page {
                Page::ScenarioDetails {
                    view_id: current,
                    summaries,
                    ..
                } if *current == view_id => {
                    summaries.slots = slots;
                    summaries.loading = false;
                }
                _ => tracing::debug!(view_id, "Discarding summaries for a closed details view"),
            },
            Action::Reset => {
                self.draft = ScenarioDraft::initial(self.variant, &self.default_tables);
                self.page = Page::Form;
            }
            Action::Back => self.page = Page::Form,
        }
        self
    }
}
