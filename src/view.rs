// 🧩 View Composer
// filter → sort → (paginate) → counts, recomputed from scratch on every call

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::RangeError;
use crate::filter::{filter_tenders, FilterSelection};
use crate::paginate::{paginate, Page};
use crate::sort::{sort_tenders, SortConfig};
use crate::tender::{TenderSource, TenderStatus, TenderSummary};

pub const TED_NOTICE_URL: &str = "https://ted.europa.eu/udl?uri=TED:NOTICE:";

/// Card grid or table; purely a rendering switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Presentation {
    Grid,
    #[default]
    Table,
}

impl Presentation {
    pub fn toggled(&self) -> Self {
        match self {
            Presentation::Grid => Presentation::Table,
            Presentation::Table => Presentation::Grid,
        }
    }
}

impl FromStr for Presentation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grid" | "cards" => Ok(Presentation::Grid),
            "table" | "list" => Ok(Presentation::Table),
            other => Err(format!("unknown presentation {:?}", other)),
        }
    }
}

/// Everything the list page needs to render, passed in by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub filter: FilterSelection,
    #[serde(default)]
    pub sort: Option<SortConfig>,
    /// `Some((page_number, page_size))` to slice the result
    #[serde(default)]
    pub page: Option<(usize, usize)>,
    #[serde(default)]
    pub presentation: Presentation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub draft: usize,
    pub active: usize,
    pub closed: usize,
}

impl StatusCounts {
    pub fn get(&self, status: TenderStatus) -> usize {
        match status {
            TenderStatus::Draft => self.draft,
            TenderStatus::Active => self.active,
            TenderStatus::Closed => self.closed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListView {
    /// Rows to render (the requested page when paginated)
    pub tenders: Vec<TenderSummary>,
    /// Size of the filtered set, before pagination
    pub total: usize,
    pub active: usize,
    pub by_status: StatusCounts,
    pub presentation: Presentation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
}

impl ListView {
    pub fn is_empty(&self) -> bool {
        self.tenders.is_empty()
    }
}

/// One pass over the filtered set
pub fn tally(tenders: &[TenderSummary]) -> StatusCounts {
    tenders.iter().fold(StatusCounts::default(), |mut counts, tender| {
        match tender.status {
            TenderStatus::Draft => counts.draft += 1,
            TenderStatus::Active => counts.active += 1,
            TenderStatus::Closed => counts.closed += 1,
        }
        counts
    })
}

/// Run the list pipeline over a fetched snapshot
pub fn compose(rows: &[TenderSummary], query: &ListQuery) -> Result<ListView, RangeError> {
    let filtered = filter_tenders(rows, &query.filter);
    let ordered = match &query.sort {
        Some(config) => sort_tenders(&filtered, config),
        None => filtered,
    };
    let counts = tally(&ordered);
    let total = ordered.len();

    let (tenders, page_number, total_pages) = match query.page {
        Some((number, size)) => {
            let Page {
                items,
                page_number,
                total_pages,
                ..
            } = paginate(&ordered, number, size)?;
            (items, Some(page_number), Some(total_pages))
        }
        None => (ordered, None, None),
    };

    Ok(ListView {
        tenders,
        total,
        active: counts.active,
        by_status: counts,
        presentation: query.presentation,
        page_number,
        total_pages,
    })
}

// ============================================================================
// ROW ACTIVATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowTarget {
    /// Internal editor route
    Editor { id: String, path: String },
    /// External notice, opened in a new browsing context
    External { url: String },
}

impl RowTarget {
    /// Editor route for a locally authored tender
    pub fn editor(id: &str) -> Self {
        RowTarget::Editor {
            id: id.to_string(),
            path: format!("/tenders/edit/{}", id),
        }
    }

    pub fn for_tender(tender: &TenderSummary) -> Self {
        match tender.source {
            TenderSource::Local => RowTarget::editor(&tender.id),
            TenderSource::ExternalFeed => RowTarget::External {
                url: format!("{}{}", TED_NOTICE_URL, tender.id),
            },
        }
    }

    pub fn describe(&self) -> &str {
        match self {
            RowTarget::Editor { path, .. } => path,
            RowTarget::External { url } => url,
        }
    }
}
