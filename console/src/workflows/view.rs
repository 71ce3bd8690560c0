//! Search, sort and pagination over a workflow collection

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::workflow::WorkflowRecord;

/// Field used for ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Name,
    Date,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(SortField::Name),
            "date" => Ok(SortField::Date),
            _ => Err(format!("Invalid sort field: {}", s)),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortField::Name => f.write_str("name"),
            SortField::Date => f.write_str("date"),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("Invalid sort order: {}", s)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

/// User-controlled listing parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    search_term: String,
    sort_by: SortField,
    sort_order: SortOrder,
    current_page: usize,
    items_per_page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(20)
    }
}

impl ViewState {
    /// Fresh view on page 1; a zero page size is treated as 1
    pub fn new(items_per_page: usize) -> Self {
        Self {
            search_term: String::new(),
            sort_by: SortField::Name,
            sort_order: SortOrder::Asc,
            current_page: 1,
            items_per_page: items_per_page.max(1),
        }
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn sort_by(&self) -> SortField {
        self.sort_by
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    /// Change the search term; returns to page 1
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.current_page = 1;
    }

    /// Change the page size; returns to page 1
    pub fn set_items_per_page(&mut self, items_per_page: usize) {
        self.items_per_page = items_per_page.max(1);
        self.current_page = 1;
    }

    pub fn set_sort_by(&mut self, field: SortField) {
        self.sort_by = field;
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.sort_order = order;
    }

    /// Header-click behaviour: same field flips, new field sorts ascending
    pub fn toggle_sort(&mut self, field: SortField) {
        if self.sort_by == field {
            self.sort_order = self.sort_order.flipped();
        } else {
            self.sort_by = field;
            self.sort_order = SortOrder::Asc;
        }
    }

    /// Jump to a page; values below 1 become 1
    pub fn set_current_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    /// Filter, sort and slice `workflows`
    pub fn apply(&self, workflows: &[WorkflowRecord]) -> WorkflowPage {
        let needle = self.search_term.to_lowercase();
        let mut matched: Vec<&WorkflowRecord> = workflows
            .iter()
            .filter(|wf| {
                needle.is_empty()
                    || wf
                        .name
                        .as_deref()
                        .is_some_and(|name| name.to_lowercase().contains(&needle))
            })
            .collect();

        matched.sort_by(|a, b| {
            let ordering = match self.sort_by {
                SortField::Name => locale_compare(a.sort_name(), b.sort_name()),
                SortField::Date => a.timestamp_millis().cmp(&b.timestamp_millis()),
            };
            match self.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total_items = matched.len();
        let total_pages = total_items.div_ceil(self.items_per_page);
        let start_index = (self.current_page - 1).saturating_mul(self.items_per_page);
        let end_index = start_index.saturating_add(self.items_per_page).min(total_items);
        let items = matched
            .into_iter()
            .skip(start_index)
            .take(self.items_per_page)
            .cloned()
            .collect();

        WorkflowPage {
            items,
            total_items,
            total_pages,
            current_page: self.current_page,
            start_index,
            end_index,
        }
    }
}

/// One page of the derived view
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowPage {
    /// Records on this page
    pub items: Vec<WorkflowRecord>,

    /// Records matching the search, across all pages
    pub total_items: usize,

    pub total_pages: usize,

    /// 1-indexed
    pub current_page: usize,

    /// Index of the first record on this page
    pub start_index: usize,

    /// Exclusive end index, clamped to `total_items`
    pub end_index: usize,
}

/// Collation-style name ordering.
///
/// Base letters decide first, so accents and case are ignored. Ties are broken
/// by accents (unaccented first), then by case (lowercase first).
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(primary_key(b))
        .then_with(|| secondary_key(a).cmp(secondary_key(b)))
        .then_with(|| tertiary_compare(a, b))
}

fn primary_key(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn secondary_key(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd().flat_map(char::to_lowercase)
}

fn tertiary_compare(a: &str, b: &str) -> Ordering {
    a.nfd()
        .zip(b.nfd())
        .find(|(x, y)| x != y)
        .map(|(x, y)| match (x.is_lowercase(), y.is_lowercase()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => x.cmp(&y),
        })
        .unwrap_or_else(|| a.nfd().count().cmp(&b.nfd().count()))
}
