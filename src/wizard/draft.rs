use std::collections::BTreeMap;

use crate::api::types::{InputDetail, InputSlot, ScenarioSubmission};
use crate::config::FormVariant;
use crate::error::AppError;
use crate::validation::require_non_empty;

/// Table name and free-text comment for one input slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlotInput {
    pub table: String,
    pub comment: String,
}

/// In-progress form input. Never sent as-is; see [`ScenarioDraft::to_submission`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioDraft {
    pub description: String,
    pub slots: [SlotInput; 3],
    /// Raw text; parsed only when submitting.
    pub param1: String,
    pub param2: String,
    pub keep_inputs: bool,
}

impl Default for ScenarioDraft {
    fn default() -> Self {
        Self {
            description: String::new(),
            slots: Default::default(),
            param1: String::new(),
            param2: String::new(),
            keep_inputs: true,
        }
    }
}

/// A single field edit coming from the form.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftEdit {
    Description(String),
    Table(InputSlot, String),
    Comment(InputSlot, String),
    Param1(String),
    Param2(String),
    KeepInputs(bool),
}

impl ScenarioDraft {
    /// The draft a fresh form starts from.
    pub fn initial(variant: FormVariant, default_tables: &[String; 3]) -> Self {
        let mut draft = Self::default();
        if variant == FormVariant::Annotated {
            for (slot, table) in draft.slots.iter_mut().zip(default_tables) {
                slot.table = table.clone();
            }
        }
        draft
    }

    pub fn slot(&self, slot: InputSlot) -> &SlotInput {
        &self.slots[slot.index()]
    }

    pub fn apply(&mut self, edit: DraftEdit) {
        match edit {
            DraftEdit::Description(text) => self.description = text,
            DraftEdit::Table(slot, table) => self.slots[slot.index()].table = table,
            DraftEdit::Comment(slot, text) => self.slots[slot.index()].comment = text,
            DraftEdit::Param1(raw) => self.param1 = raw,
            DraftEdit::Param2(raw) => self.param2 = raw,
            DraftEdit::KeepInputs(keep) => self.keep_inputs = keep,
        }
    }

    /// Submit precondition. Params are deliberately not checked here.
    pub fn check_submittable(&self, variant: FormVariant) -> Result<(), AppError> {
        if variant == FormVariant::Annotated {
            require_non_empty("Description", &self.description)?;
        }
        for slot in InputSlot::ALL {
            require_non_empty(&format!("{} table", slot.label()), &self.slot(slot).table)?;
        }
        Ok(())
    }

    pub fn can_submit(&self, variant: FormVariant) -> bool {
        self.check_submittable(variant).is_ok()
    }

    pub fn to_submission(&self) -> ScenarioSubmission {
        let input_comments: BTreeMap<String, InputDetail> = InputSlot::ALL
            .iter()
            .map(|slot| {
                let input = self.slot(*slot);
                (
                    slot.key().to_string(),
                    InputDetail {
                        table: input.table.clone(),
                        comment: input.comment.clone(),
                    },
                )
            })
            .collect();

        ScenarioSubmission {
            input1: self.slots[0].table.clone(),
            input2: self.slots[1].table.clone(),
            input3: self.slots[2].table.clone(),
            param1: parse_param(&self.param1),
            param2: parse_param(&self.param2),
            description: self.description.clone(),
            keep_inputs: self.keep_inputs,
            input_comments,
        }
    }
}

/// Parse a parameter field as a float; anything unparsable becomes NaN.
pub fn parse_param(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> [String; 3] {
        ["hist".to_string(), "weather".to_string(), "sensor".to_string()]
    }

    #[test]
    fn test_initial_per_variant() {
        let annotated = ScenarioDraft::initial(FormVariant::Annotated, &tables());
        assert_eq!(annotated.slot(InputSlot::Input2).table, "weather");
        assert!(annotated.keep_inputs);

        let minimal = ScenarioDraft::initial(FormVariant::Minimal, &tables());
        assert!(minimal.slots.iter().all(|s| s.table.is_empty()));
    }

    #[test]
    fn test_annotated_requires_description() {
        let mut draft = ScenarioDraft::initial(FormVariant::Annotated, &tables());
        assert!(!draft.can_submit(FormVariant::Annotated));
        assert!(draft.can_submit(FormVariant::Minimal));

        draft.apply(DraftEdit::Description("baseline".into()));
        assert!(draft.can_submit(FormVariant::Annotated));
    }

    #[test]
    fn test_missing_table_blocks_submit() {
        let mut draft = ScenarioDraft::initial(FormVariant::Annotated, &tables());
        draft.apply(DraftEdit::Description("baseline".into()));
        draft.apply(DraftEdit::Table(InputSlot::Input3, String::new()));
        let err = draft.check_submittable(FormVariant::Annotated).unwrap_err();
        assert!(err.to_string().contains("Sensor Data"));
    }

    #[test]
    fn test_params_parse_or_nan() {
        assert_eq!(parse_param("24"), 24.0);
        assert_eq!(parse_param(" 1.5 "), 1.5);
        assert!(parse_param("").is_nan());
        assert!(parse_param("abc").is_nan());
    }

    #[test]
    fn test_submission_carries_comments() {
        let mut draft = ScenarioDraft::initial(FormVariant::Annotated, &tables());
        draft.apply(DraftEdit::Comment(InputSlot::Input1, "2023 only".into()));
        draft.apply(DraftEdit::KeepInputs(false));
        let submission = draft.to_submission();
        assert_eq!(submission.input1, "hist");
        assert_eq!(submission.input_comments["input1"].comment, "2023 only");
        assert_eq!(submission.input_comments["input3"].table, "sensor");
        assert!(!submission.keep_inputs);
    }
}
