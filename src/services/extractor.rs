// src/services/extractor.rs

//! Processing-date extraction.
//!
//! The FLAG page has no stable ids or classes around the figures we need, so
//! extraction walks from two text anchors:
//!
//! - the `<strong>` label inside the table `<caption>`, followed by the next
//!   `<em>` holding "last updated" text with an MM/DD/YYYY date;
//! - the `<td>` label of the analyst review row, followed by the next `<td>`
//!   holding the priority date.
//!
//! If either anchor moves or is renamed, extraction fails instead of guessing.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::models::{ProcessingDates, WatcherConfig};

const DATE_PATTERN: &str = r"[0-9]{1,2}/[0-9]{1,2}/[0-9]{4}";

/// Extracts [`ProcessingDates`] from page markup.
pub struct Extractor {
    caption_label: String,
    review_label: String,
    caption: Selector,
    strong: Selector,
    cell: Selector,
    date_pattern: Regex,
}

impl Extractor {
    /// Create an extractor for the given anchor labels.
    pub fn new(caption_label: impl Into<String>, review_label: impl Into<String>) -> Result<Self> {
        Ok(Self {
            caption_label: caption_label.into(),
            review_label: review_label.into(),
            caption: Self::parse_selector("caption")?,
            strong: Self::parse_selector("strong")?,
            cell: Self::parse_selector("td")?,
            date_pattern: Regex::new(DATE_PATTERN)?,
        })
    }

    pub fn from_config(config: &WatcherConfig) -> Result<Self> {
        Self::new(&config.caption_label, &config.review_label)
    }

    /// Extract both dates, reporting which anchor was missing on failure.
    pub fn extract(&self, markup: &str) -> Result<ProcessingDates> {
        let document = Html::parse_document(markup);

        let update_date = self.update_date(&document)?;
        debug!("Got update_date as \"{}\".", update_date);

        let priority_date = self.priority_date(&document)?;
        debug!("Got priority_date as \"{}\".", priority_date);

        Ok(ProcessingDates {
            update_date,
            priority_date,
        })
    }

    /// Extract dates from optional markup, logging instead of failing.
    ///
    /// Absent markup and unparsable markup both yield `None`, but are logged
    /// differently.
    pub fn extract_optional(&self, markup: Option<&str>) -> Option<ProcessingDates> {
        let Some(markup) = markup else {
            info!("No content to get processing dates from.");
            return None;
        };

        match self.extract(markup) {
            Ok(dates) => Some(dates),
            Err(e) => {
                warn!("An unexpected error occurred while getting processing dates: {e}");
                None
            }
        }
    }

    fn update_date(&self, document: &Html) -> Result<String> {
        let caption = document
            .select(&self.caption)
            .next()
            .ok_or_else(|| AppError::extract("no <caption> element"))?;

        let anchor = caption
            .select(&self.strong)
            .find(|el| text_of(el).trim() == self.caption_label)
            .ok_or_else(|| {
                AppError::extract(format!(
                    "no <strong>{}</strong> in caption",
                    self.caption_label
                ))
            })?;

        let emphasis = find_next(document, anchor, "em").ok_or_else(|| {
            AppError::extract(format!("no <em> after \"{}\"", self.caption_label))
        })?;

        let text = text_of(&emphasis);
        self.date_pattern
            .find(&text)
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| AppError::extract(format!("no date in \"{}\"", text.trim())))
    }

    fn priority_date(&self, document: &Html) -> Result<String> {
        let label = document
            .select(&self.cell)
            .find(|el| text_of(el).trim() == self.review_label)
            .ok_or_else(|| AppError::extract(format!("no <td>{}</td>", self.review_label)))?;

        let cell = find_next(document, label, "td").ok_or_else(|| {
            AppError::extract(format!("no <td> after \"{}\"", self.review_label))
        })?;

        Ok(text_of(&cell))
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

fn text_of(el: &ElementRef<'_>) -> String {
    el.text().collect()
}

/// First element named `name` after `anchor` in document order.
///
/// Descendants of `anchor` count as following it.
fn find_next<'a>(document: &'a Html, anchor: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    document
        .tree
        .root()
        .descendants()
        .skip_while(|node| node.id() != anchor.id())
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == name)
}
