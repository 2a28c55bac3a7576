//! Concurrent per-slot table-summary fetch for the scenario details view.
//!
//! The three requests run on one spawned task and are joined; each slot keeps
//! its own outcome. The task is tied to a `CancellationToken` so a closed
//! details view stops waiting for them and never receives their results.

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::api::types::{InputSlot, Scenario};
use crate::api::ScenarioClient;

use super::state::SlotSummary;

/// Handle to an in-flight batch for one details view.
pub struct SummaryTask {
    pub view_id: u64,
    cancel: CancellationToken,
    rx: oneshot::Receiver<[SlotSummary; 3]>,
}

impl SummaryTask {
    /// Start fetching summaries for every slot of `scenario` that names a table.
    pub fn spawn(client: ScenarioClient, view_id: u64, scenario: &Scenario) -> Self {
        let tables = InputSlot::ALL.map(|slot| scenario.table_for(slot).map(str::to_string));
        let cancel = CancellationToken::new();
        let (tx, rx) = oneshot::channel();

        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(view_id, "Summary fetch cancelled");
                }
                slots = fetch_all(&client, tables) => {
                    // Receiver is gone when the view closed between settle and send.
                    let _ = tx.send(slots);
                }
            }
        });

        Self { view_id, cancel, rx }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the batch to settle.
    pub async fn settled(&mut self) -> [SlotSummary; 3] {
        match (&mut self.rx).await {
            Ok(slots) => slots,
            Err(_) => aborted(),
        }
    }

    /// Non-blocking check; `None` while the fetches are still running.
    pub fn try_settled(&mut self) -> Option<[SlotSummary; 3]> {
        match self.rx.try_recv() {
            Ok(slots) => Some(slots),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(aborted()),
        }
    }
}

impl Drop for SummaryTask {
    fn drop(&mut self) {
        // Tearing down the handle tears down the fetch.
        self.cancel.cancel();
    }
}

/// Slots for a batch whose task ended without reporting (cancelled or panicked).
fn aborted() -> [SlotSummary; 3] {
    std::array::from_fn(|_| SlotSummary::Failed("Summary fetch aborted".into()))
}

async fn fetch_slot(client: &ScenarioClient, table: Option<String>) -> SlotSummary {
    let Some(table) = table else {
        return SlotSummary::Unavailable;
    };
    match client.table_summary(&table).await {
        Ok(summary) => SlotSummary::Loaded(summary),
        Err(e) => {
            tracing::warn!(table = %table, "Table summary failed: {}", e);
            SlotSummary::Failed(crate::render::error_text(&e.page_message()))
        }
    }
}

/// Fetch all three slots concurrently; returns once every slot has settled.
pub async fn fetch_all(client: &ScenarioClient, tables: [Option<String>; 3]) -> [SlotSummary; 3] {
    let [t1, t2, t3] = tables;
    let (s1, s2, s3) = tokio::join!(
        fetch_slot(client, t1),
        fetch_slot(client, t2),
        fetch_slot(client, t3),
    );
    [s1, s2, s3]
}
