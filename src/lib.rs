// Tender Desk - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod tender;
pub mod normalize;
pub mod filter;
pub mod sort;
pub mod paginate;
pub mod view;
pub mod ted;
pub mod entities;
pub mod db;
pub mod catalog;
pub mod config;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use error::{RangeError, TenderError, ValidationError};
pub use tender::{
    NewTender, NoticeType, TedTender, TenderRecord, TenderSource, TenderStatus,
    TenderSummary, TenderUpdate,
};
pub use normalize::{normalize_local, normalize_ted, Normalized, RowIssue};
pub use filter::{filter_tenders, FilterSelection, Selection};
pub use sort::{sort_tenders, SortConfig, SortField, SortOrder};
pub use paginate::{paginate, Page, DEFAULT_PAGE_SIZE};
pub use view::{compose, ListQuery, ListView, Presentation, RowTarget, StatusCounts};
pub use ted::{FeedAdapter, FeedBatch, TedV3Feed};
#[cfg(feature = "ted-sync")]
pub use ted::FeedClient;
pub use entities::{AiPrompt, PromptField, PromptSet, Vendor};
pub use db::{
    Event,
    setup_database, insert_tender, update_tender, get_tender, get_all_tenders,
    load_csv, import_tenders, count_tenders,
    upsert_ted_tenders, get_ted_tenders_page, get_all_ted_tenders,
    insert_vendor, get_all_vendors, get_validated_vendors, vendor_names,
    upsert_ai_prompt, get_ai_prompts,
    insert_event, get_events_for_entity,
};
pub use config::{init_tracing, AppConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
