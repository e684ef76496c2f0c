// 🔍 Predicate Filter
// Status / organization / free-text title predicates, combined with AND

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::tender::{TenderStatus, TenderSummary};

/// `"all"` or one specific value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T: PartialEq> Selection<T> {
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => wanted == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl Selection<TenderStatus> {
    /// Parse a query-string value; `"all"` and empty mean no constraint
    pub fn parse_status(value: &str) -> Result<Self, crate::error::ValidationError> {
        match value.trim() {
            "" | "all" => Ok(Selection::All),
            other => Ok(Selection::Only(other.parse()?)),
        }
    }

    /// all → draft → active → closed → all
    pub fn cycle(&self) -> Self {
        match self {
            Selection::All => Selection::Only(TenderStatus::Draft),
            Selection::Only(TenderStatus::Draft) => Selection::Only(TenderStatus::Active),
            Selection::Only(TenderStatus::Active) => Selection::Only(TenderStatus::Closed),
            Selection::Only(TenderStatus::Closed) => Selection::All,
        }
    }
}

impl Selection<String> {
    pub fn parse_organization(value: &str) -> Self {
        match value.trim() {
            "" | "all" => Selection::All,
            other => Selection::Only(other.to_string()),
        }
    }
}

/// Current filter choices, passed explicitly by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub status: Selection<TenderStatus>,
    #[serde(default)]
    pub organization: Selection<String>,
    #[serde(default)]
    pub search_text: String,
}

impl FilterSelection {
    pub fn is_empty(&self) -> bool {
        self.status.is_all() && self.organization.is_all() && self.search_text.is_empty()
    }

    /// All active predicates hold for `tender`
    pub fn matches(&self, tender: &TenderSummary) -> bool {
        self.matches_search(tender)
            && self.status.accepts(&tender.status)
            && self.organization.accepts(&tender.organization)
    }

    fn matches_search(&self, tender: &TenderSummary) -> bool {
        if self.search_text.is_empty() {
            return true;
        }
        tender
            .title
            .to_lowercase()
            .contains(&self.search_text.to_lowercase())
    }
}

/// New collection with the rows that pass every predicate, input order kept
pub fn filter_tenders(tenders: &[TenderSummary], selection: &FilterSelection) -> Vec<TenderSummary> {
    tenders
        .iter()
        .filter(|tender| selection.matches(tender))
        .cloned()
        .collect()
}

/// Distinct organization names, sorted, for the organization picker
pub fn organizations(tenders: &[TenderSummary]) -> Vec<String> {
    tenders
        .iter()
        .map(|tender| tender.organization.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tender::TenderSource;

    fn tender(title: &str, organization: &str, status: TenderStatus) -> TenderSummary {
        TenderSummary {
            id: title.to_string(),
            title: title.to_string(),
            organization: organization.to_string(),
            deadline_raw: None,
            deadline_display: "No deadline set".to_string(),
            budget_raw: None,
            budget_display: "N/A".to_string(),
            status,
            source: TenderSource::Local,
            country: None,
        }
    }

    fn sample() -> Vec<TenderSummary> {
        vec![
            tender("IT Infrastructure Upgrade", "Ministry of Technology", TenderStatus::Active),
            tender("Public Transportation System", "Department of Transport", TenderStatus::Draft),
            tender("Healthcare Equipment Supply", "Health Department", TenderStatus::Closed),
            tender("Network Cabling", "Ministry of Technology", TenderStatus::Draft),
        ]
    }

    #[test]
    fn test_empty_selection_keeps_everything() {
        let rows = sample();
        let selection = FilterSelection::default();

        assert!(selection.is_empty());
        assert_eq!(filter_tenders(&rows, &selection), rows);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let rows = sample();
        let selection = FilterSelection {
            search_text: "SYSTEM".to_string(),
            ..Default::default()
        };

        let result = filter_tenders(&rows, &selection);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "Public Transportation System");
    }

    #[test]
    fn test_search_is_not_fuzzy() {
        let rows = sample();
        let selection = FilterSelection {
            search_text: "Netwrk".to_string(),
            ..Default::default()
        };

        assert!(filter_tenders(&rows, &selection).is_empty());
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let rows = sample();
        let selection = FilterSelection {
            status: Selection::Only(TenderStatus::Draft),
            organization: Selection::Only("Ministry of Technology".to_string()),
            search_text: String::new(),
        };

        let result = filter_tenders(&rows, &selection);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "Network Cabling");
    }

    #[test]
    fn test_organization_is_exact_match() {
        let rows = sample();
        let selection = FilterSelection {
            organization: Selection::Only("Ministry".to_string()),
            ..Default::default()
        };

        assert!(filter_tenders(&rows, &selection).is_empty());
    }

    #[test]
    fn test_output_is_subset_satisfying_predicates() {
        let rows = sample();
        let selections = [
            FilterSelection::default(),
            FilterSelection {
                status: Selection::Only(TenderStatus::Active),
                ..Default::default()
            },
            FilterSelection {
                search_text: "e".to_string(),
                status: Selection::Only(TenderStatus::Draft),
                ..Default::default()
            },
            FilterSelection {
                organization: Selection::Only("Health Department".to_string()),
                search_text: "supply".to_string(),
                ..Default::default()
            },
        ];

        for selection in &selections {
            let result = filter_tenders(&rows, selection);
            assert!(result.len() <= rows.len());
            assert!(result.iter().all(|t| selection.matches(t)));
            assert!(result.iter().all(|t| rows.contains(t)));
        }
    }

    #[test]
    fn test_filter_is_idempotent() {
        let rows = sample();
        let selection = FilterSelection {
            status: Selection::Only(TenderStatus::Draft),
            search_text: "n".to_string(),
            ..Default::default()
        };

        let once = filter_tenders(&rows, &selection);
        let twice = filter_tenders(&once, &selection);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        let selection = FilterSelection {
            status: Selection::Only(TenderStatus::Active),
            ..Default::default()
        };
        assert!(filter_tenders(&[], &selection).is_empty());
    }

    #[test]
    fn test_parse_status_selection() {
        assert_eq!(Selection::parse_status("all").unwrap(), Selection::All);
        assert_eq!(Selection::parse_status("").unwrap(), Selection::All);
        assert_eq!(
            Selection::parse_status("closed").unwrap(),
            Selection::Only(TenderStatus::Closed)
        );
        assert!(Selection::parse_status("open").is_err());
    }

    #[test]
    fn test_status_cycle_returns_to_all() {
        let mut selection = Selection::All;
        for _ in 0..4 {
            selection = selection.cycle();
        }
        assert_eq!(selection, Selection::All);
    }

    #[test]
    fn test_organizations_are_distinct_and_sorted() {
        assert_eq!(
            organizations(&sample()),
            vec![
                "Department of Transport".to_string(),
                "Health Department".to_string(),
                "Ministry of Technology".to_string(),
            ]
        );
    }
}
