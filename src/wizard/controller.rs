use std::ops::{Deref, DerefMut};

use crate::api::types::InputSlot;
use crate::api::ScenarioClient;
use crate::config::WizardConfig;
use crate::error::AppError;
use crate::validation::require_known_table;

use super::draft::DraftEdit;
use super::state::{Action, WizardState};
use super::summaries::SummaryTask;

const RUNS_FAILED: &str = "Failed to fetch runs";

/// Drives the wizard: runs the backend calls behind each user operation and
/// folds their outcomes into [`WizardState`].
///
/// Operations take `&mut self`, so at most one runs at a time and the state
/// is never touched concurrently. The only background work is the summary
/// fetch of the details view.
pub struct WizardController {
    client: ScenarioClient,
    state: WizardState,
    summary_task: Option<SummaryTask>,
    next_view_id: u64,
}

/// Holds the loading overlay up for as long as it lives.
///
/// Dropping it clears the overlay, including when the operation's future is
/// abandoned mid-request or a call panics.
struct Loading<'a>(&'a mut WizardController);

impl<'a> Loading<'a> {
    fn start(controller: &'a mut WizardController) -> Self {
        controller.dispatch(Action::LoadingStarted);
        Self(controller)
    }
}

impl Deref for Loading<'_> {
    type Target = WizardController;

    fn deref(&self) -> &WizardController {
        self.0
    }
}

impl DerefMut for Loading<'_> {
    fn deref_mut(&mut self) -> &mut WizardController {
        self.0
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.dispatch(Action::LoadingFinished);
    }
}

impl WizardController {
    pub fn new(client: ScenarioClient, config: &WizardConfig) -> Self {
        Self {
            client,
            state: WizardState::new(config.variant, config.default_tables.clone()),
            summary_task: None,
            next_view_id: 1,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    fn dispatch(&mut self, action: Action) {
        let state = std::mem::take(&mut self.state);
        self.state = state.reduce(action);

        // Leaving the details view tears down its summary fetch.
        let current = self.state.details_view();
        if let Some(task) = &self.summary_task {
            if current != Some(task.view_id) {
                task.cancel();
                self.summary_task = None;
            }
        }
    }

    /// Initial load: fetch the available tables.
    pub async fn mount(&mut self) {
        self.reload_tables().await;
    }

    async fn reload_tables(&mut self) {
        let tables = self.client.available_tables().await;
        tracing::debug!(count = tables.len(), "Available tables loaded");
        self.dispatch(Action::TablesLoaded(tables));
    }

    /// Apply a form edit. Table selections must come from the available tables.
    pub fn edit(&mut self, edit: DraftEdit) -> Result<(), AppError> {
        if let DraftEdit::Table(_, table) = &edit {
            require_known_table(table, &self.state.available_tables)?;
        }
        self.dispatch(Action::Edit(edit));
        Ok(())
    }

    /// Submit the draft and trigger its job.
    ///
    /// `Err` only when the draft does not meet the submit precondition; in that
    /// case nothing is sent and the state is unchanged. Backend and transport
    /// failures land on the error page instead.
    pub async fn submit(&mut self) -> Result<(), AppError> {
        self.state.draft.check_submittable(self.state.variant)?;
        let submission = self.state.draft.to_submission();

        let mut this = Loading::start(self);

        match this.client.submit(&submission).await {
            Err(e) => {
                tracing::warn!("Scenario submission failed: {}", e);
                this.dispatch(Action::SubmitFailed {
                    message: e.page_message(),
                });
            }
            Ok(scenario_id) => {
                tracing::info!(scenario_id = %scenario_id, "Scenario recorded");
                this.dispatch(Action::Submitted {
                    scenario_id: scenario_id.clone(),
                });

                match this.client.trigger_job(&scenario_id).await {
                    Ok(job_run_id) => {
                        tracing::info!(
                            scenario_id = %scenario_id,
                            job_run_id = %job_run_id,
                            "Job triggered"
                        );
                        this.dispatch(Action::JobTriggered { job_run_id });
                    }
                    Err(e) => {
                        tracing::warn!(
                            scenario_id = %scenario_id,
                            "Job trigger failed; scenario is left without a job run: {}",
                            e
                        );
                        this.dispatch(Action::JobTriggerFailed {
                            message: e.page_message(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Load the historical runs list.
    pub async fn view_runs(&mut self) {
        let mut this = Loading::start(self);

        match this.client.runs().await {
            Ok(runs) => {
                tracing::info!(count = runs.len(), "Loaded historical runs");
                this.dispatch(Action::ViewedRuns(runs));
            }
            Err(e) => {
                tracing::warn!("Failed to fetch runs: {}", e);
                this.dispatch(Action::RequestFailed {
                    message: RUNS_FAILED.into(),
                });
            }
        }
    }

    /// Open the details of one scenario and start fetching its table summaries.
    pub async fn view_details(&mut self, scenario_id: &str) {
        let mut this = Loading::start(self);

        match this.client.scenario(scenario_id).await {
            Ok(scenario) => {
                let view_id = this.next_view_id;
                this.next_view_id += 1;

                let has_tables = InputSlot::ALL
                    .iter()
                    .any(|slot| scenario.table_for(*slot).is_some());
                let task = has_tables
                    .then(|| SummaryTask::spawn(this.client.clone(), view_id, &scenario));

                tracing::info!(scenario_id, view_id, "Viewing scenario details");
                this.dispatch(Action::ViewedDetails { view_id, scenario });
                this.summary_task = task;
            }
            Err(e) => {
                tracing::warn!(scenario_id, "Failed to load scenario: {}", e);
                this.dispatch(Action::RequestFailed {
                    message: e.page_message(),
                });
            }
        }
    }

    /// Wait for the details view's summaries and apply them. No-op when none are pending.
    ///
    /// Cancel-safe: dropping the future leaves the fetch running and pending.
    pub async fn await_summaries(&mut self) {
        let Some(task) = self.summary_task.as_mut() else {
            return;
        };
        let slots = task.settled().await;
        let view_id = task.view_id;
        self.summary_task = None;
        self.dispatch(Action::SummariesSettled { view_id, slots });
    }

    /// Apply the summaries if they have settled, without waiting.
    pub fn poll_summaries(&mut self) -> bool {
        let Some(task) = self.summary_task.as_mut() else {
            return false;
        };
        let Some(slots) = task.try_settled() else {
            return false;
        };
        let view_id = task.view_id;
        self.summary_task = None;
        self.dispatch(Action::SummariesSettled { view_id, slots });
        true
    }

    pub fn has_pending_summaries(&self) -> bool {
        self.summary_task.is_some()
    }

    /// Start over: fresh draft, back to the form, reload the table list.
    pub async fn new_run(&mut self) {
        tracing::info!(from = self.state.page.name(), "Starting a new run");
        self.dispatch(Action::Reset);
        self.reload_tables().await;
    }

    /// Return to the form, keeping the draft as it was.
    pub fn back(&mut self) {
        self.dispatch(Action::Back);
    }

    /// From the details view: reload and show the runs list.
    pub async fn back_to_runs(&mut self) {
        self.view_runs().await;
    }
}
