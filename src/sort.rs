// ↕️ Comparator-based Sorter
// Stable ordering by one field; missing deadlines/budgets always go last

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use crate::normalize::parse_budget_display;
use crate::tender::TenderSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Title,
    Organization,
    Deadline,
    Budget,
    Status,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::Title,
        SortField::Organization,
        SortField::Deadline,
        SortField::Budget,
        SortField::Status,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Organization => "organization",
            SortField::Deadline => "deadline",
            SortField::Budget => "budget",
            SortField::Status => "status",
        }
    }

    /// Column header label
    pub fn label(&self) -> &'static str {
        match self {
            SortField::Title => "Title",
            SortField::Organization => "Organization",
            SortField::Deadline => "Deadline",
            SortField::Budget => "Budget",
            SortField::Status => "Status",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|field| field.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown sort field {:?}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn reversed(&self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortOrder::Asc => "↑",
            SortOrder::Desc => "↓",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order {:?}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub field: SortField,
    pub order: SortOrder,
}

impl SortConfig {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        SortConfig { field, order }
    }

    /// Column-header click: same field flips the order, another field starts ascending
    pub fn toggle(&self, field: SortField) -> Self {
        if self.field == field {
            SortConfig::new(field, self.order.reversed())
        } else {
            SortConfig::new(field, SortOrder::Asc)
        }
    }
}

impl Default for SortConfig {
    fn default() -> Self {
        SortConfig::new(SortField::Deadline, SortOrder::Asc)
    }
}

// ============================================================================
// COMPARISON
// ============================================================================

/// Locale-style text comparison: case-insensitive first, then lowercase before uppercase
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

fn budget_key(tender: &TenderSummary) -> Option<f64> {
    tender
        .budget_raw
        .or_else(|| parse_budget_display(&tender.budget_display))
}

/// Present values are ordered by `order`; absent values sort after every present one
fn compare_optional<T, F>(a: Option<T>, b: Option<T>, order: SortOrder, cmp: F) -> Ordering
where
    F: Fn(&T, &T) -> Ordering,
{
    match (a, b) {
        (Some(x), Some(y)) => match order {
            SortOrder::Asc => cmp(&x, &y),
            SortOrder::Desc => cmp(&x, &y).reverse(),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Comparator for one pair under `config`
pub fn compare(a: &TenderSummary, b: &TenderSummary, config: &SortConfig) -> Ordering {
    let directed = |ordering: Ordering| match config.order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    };

    match config.field {
        SortField::Title => directed(compare_text(&a.title, &b.title)),
        SortField::Organization => directed(compare_text(&a.organization, &b.organization)),
        SortField::Status => directed(a.status.as_str().cmp(b.status.as_str())),
        SortField::Deadline => compare_optional(a.deadline_raw, b.deadline_raw, config.order, |x, y| x.cmp(y)),
        SortField::Budget => compare_optional(budget_key(a), budget_key(b), config.order, |x, y| {
            x.total_cmp(y)
        }),
    }
}

/// New collection ordered by `config`; the sort is stable so ties keep input order
pub fn sort_tenders(tenders: &[TenderSummary], config: &SortConfig) -> Vec<TenderSummary> {
    let mut sorted = tenders.to_vec();
    sorted.sort_by(|a, b| compare(a, b, config));
    sorted
}
