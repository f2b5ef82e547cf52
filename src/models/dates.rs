//! Processing dates published on the FLAG page.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two fields read from the processing-times table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessingDates {
    /// Self-reported "last updated" date, MM/DD/YYYY text
    pub update_date: String,

    /// Priority date for the analyst review queue, free text
    pub priority_date: String,
}

impl ProcessingDates {
    pub fn new(update_date: impl Into<String>, priority_date: impl Into<String>) -> Self {
        Self {
            update_date: update_date.into(),
            priority_date: priority_date.into(),
        }
    }
}

impl fmt::Display for ProcessingDates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "update_date: \"{}\", priority_date: \"{}\"",
            self.update_date, self.priority_date
        )
    }
}
