//! Change detection between the live page and the latest snapshot.
//!
//! Only the update date decides whether a run counts as changed. The
//! priority date is carried along for reporting but never compared, so a
//! priority-date move under an unchanged update date goes unannounced.

use crate::models::ProcessingDates;

/// Placeholder for baseline fields when no baseline could be read.
pub const UNAVAILABLE: &str = "n/a";

/// Current dates paired with the baseline they are compared against.
#[derive(Debug, Clone, Copy)]
pub struct DateDiff<'a> {
    pub current: &'a ProcessingDates,
    pub previous: Option<&'a ProcessingDates>,
}

impl<'a> DateDiff<'a> {
    pub fn new(current: &'a ProcessingDates, previous: Option<&'a ProcessingDates>) -> Self {
        Self { current, previous }
    }

    /// Check if the run should be announced.
    pub fn has_changed(&self) -> bool {
        has_changed(self.current, self.previous)
    }

    pub fn previous_update_date(&self) -> &'a str {
        self.previous
            .map_or(UNAVAILABLE, |p| p.update_date.as_str())
    }

    pub fn previous_priority_date(&self) -> &'a str {
        self.previous
            .map_or(UNAVAILABLE, |p| p.priority_date.as_str())
    }
}

/// Changed when there is no baseline or the update dates differ.
pub fn has_changed(current: &ProcessingDates, previous: Option<&ProcessingDates>) -> bool {
    match previous {
        None => true,
        Some(previous) => current.update_date != previous.update_date,
    }
}
