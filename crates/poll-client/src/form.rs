//! Create-poll form state.

use crate::error::FormError;
use poll_core::{PollDraft, MAX_OPTIONS, MIN_OPTIONS};

/// Question shown when the form is reset.
pub const DEFAULT_QUESTION: &str = "What’s your favourite cryptocurrency?";

/// Option rows shown when the form is reset.
pub const DEFAULT_OPTIONS: [&str; 2] = ["BTC", "ETH"];

/// Editable question and option rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePollForm {
    /// Question input
    pub question: String,
    rows: Vec<String>,
}

impl Default for CreatePollForm {
    fn default() -> Self {
        Self {
            question: DEFAULT_QUESTION.to_string(),
            rows: DEFAULT_OPTIONS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl CreatePollForm {
    /// Form with the default question and rows.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore the defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Current option rows, blanks included.
    #[must_use]
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Append an empty row and return its index.
    pub fn add_option(&mut self) -> Result<usize, FormError> {
        if self.rows.len() >= MAX_OPTIONS {
            return Err(FormError::TooManyOptions);
        }
        self.rows.push(String::new());
        Ok(self.rows.len() - 1)
    }

    /// Set the text of row `index`.
    pub fn set_option(&mut self, index: usize, text: impl Into<String>) -> Result<(), FormError> {
        let row = self.rows.get_mut(index).ok_or(FormError::NoSuchRow(index))?;
        *row = text.into();
        Ok(())
    }

    /// Remove row `index`, keeping at least two rows.
    pub fn remove_option(&mut self, index: usize) -> Result<String, FormError> {
        if index >= self.rows.len() {
            return Err(FormError::NoSuchRow(index));
        }
        if !self.remove_enabled() {
            return Err(FormError::TooFewOptions);
        }
        Ok(self.rows.remove(index))
    }

    /// Whether remove buttons are active.
    #[must_use]
    pub fn remove_enabled(&self) -> bool {
        self.rows.len() > MIN_OPTIONS
    }

    /// Whether the add button is active.
    #[must_use]
    pub fn add_enabled(&self) -> bool {
        self.rows.len() < MAX_OPTIONS
    }

    /// Validated draft for submission.
    pub fn submission(&self) -> Result<PollDraft, FormError> {
        PollDraft::new(&self.question, &self.rows).map_err(|_| FormError::Incomplete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let form = CreatePollForm::new();
        assert_eq!(form.question, DEFAULT_QUESTION);
        assert_eq!(form.rows(), ["BTC", "ETH"]);
        assert!(!form.remove_enabled());
    }

    #[test]
    fn test_eleventh_row_rejected() {
        let mut form = CreatePollForm::new();
        for _ in 2..MAX_OPTIONS {
            form.add_option().unwrap();
        }
        assert_eq!(form.rows().len(), 10);
        assert!(!form.add_enabled());
        assert_eq!(form.add_option(), Err(FormError::TooManyOptions));
    }

    #[test]
    fn test_ten_filled_rows_submit() {
        let mut form = CreatePollForm::new();
        for i in 2..MAX_OPTIONS {
            let row = form.add_option().unwrap();
            form.set_option(row, format!("coin {i}")).unwrap();
        }
        let draft = form.submission().unwrap();
        assert_eq!(draft.options().len(), 10);
    }

    #[test]
    fn test_remove_keeps_two_rows() {
        let mut form = CreatePollForm::new();
        assert_eq!(form.remove_option(0), Err(FormError::TooFewOptions));
        form.add_option().unwrap();
        assert!(form.remove_enabled());
        assert_eq!(form.remove_option(0).unwrap(), "BTC");
        assert_eq!(form.remove_option(5), Err(FormError::NoSuchRow(5)));
    }

    #[test]
    fn test_blank_rows_do_not_count() {
        let mut form = CreatePollForm::new();
        form.set_option(1, "   ").unwrap();
        form.add_option().unwrap();
        assert_eq!(form.submission(), Err(FormError::Incomplete));

        form.reset();
        form.question = "  ".to_string();
        assert_eq!(form.submission(), Err(FormError::Incomplete));
    }

    #[test]
    fn test_submission_trims() {
        let mut form = CreatePollForm::new();
        form.question = "  Lunch? ".to_string();
        form.set_option(0, " Pizza ").unwrap();
        let row = form.add_option().unwrap();
        form.set_option(row, "").unwrap();
        let draft = form.submission().unwrap();
        assert_eq!(draft.question(), "Lunch?");
        assert_eq!(draft.options(), ["Pizza", "ETH"]);
    }
}
