//! The scenario wizard: draft editing, page state machine, and the controller
//! that runs the backend calls behind each transition.

pub mod controller;
pub mod draft;
pub mod state;
pub mod summaries;

pub use controller::WizardController;
pub use draft::{DraftEdit, ScenarioDraft};
pub use state::{Action, Page, SlotSummary, SummaryBoard, WizardState};
