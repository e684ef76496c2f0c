// 🌍 External Feed Adapter - TED (Tenders Electronic Daily)
//
// One trait, one authoritative adapter per API shape. When the registry changes
// its response format, add a new adapter version instead of patching this one.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::TenderError;
use crate::tender::{NoticeType, TedTender};

pub const TED_V3_ENDPOINT: &str = "https://ted.europa.eu/api/v3.0/notices/search-notices";
pub const BATCH_SIZE: usize = 10;

/// Result of decoding one feed response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedBatch {
    pub tenders: Vec<TedTender>,
    /// Human-readable reason for every result that could not be mapped
    pub skipped: Vec<String>,
}

impl FeedBatch {
    /// The registry answered but had nothing for us
    pub fn is_empty(&self) -> bool {
        self.tenders.is_empty()
    }
}

/// FeedAdapter - request shape + response decoding for one API version
pub trait FeedAdapter: Send + Sync {
    /// Adapter version (for provenance in sync events)
    fn version(&self) -> &str;

    /// Query-string parameters for "latest notices"
    fn query_params(&self) -> Vec<(&'static str, String)>;

    /// Decode a response body into rows ready for upsert
    fn parse_response(&self, body: &str, synced_at: DateTime<Utc>) -> Result<FeedBatch, TenderError>;
}

// ============================================================================
// TED SEARCH API v3.0
// ============================================================================

#[derive(Debug, Deserialize)]
struct V3Response {
    #[serde(default)]
    results: Option<Vec<V3Notice>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V3Notice {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    publication_date: Option<String>,
    #[serde(default, rename = "type")]
    notice_type: Option<String>,
    #[serde(default)]
    buyer: Option<V3Buyer>,
    #[serde(default)]
    value: Option<V3Value>,
    #[serde(default)]
    document_url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    cpv_codes: Vec<String>,
    #[serde(default)]
    reference_number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct V3Buyer {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct V3Value {
    #[serde(default)]
    amount: Option<serde_json::Value>,
    #[serde(default)]
    currency: Option<String>,
}

/// Numeric notice id: JSON numbers as-is, strings by their leading digits ("123456-2024" → 123456)
fn notice_id(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => {
            let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn amount(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone)]
pub struct TedV3Feed {
    pub page_size: usize,
}

impl Default for TedV3Feed {
    fn default() -> Self {
        Self::new()
    }
}

impl TedV3Feed {
    pub fn new() -> Self {
        TedV3Feed { page_size: BATCH_SIZE }
    }

    fn map_notice(&self, notice: V3Notice, synced_at: DateTime<Utc>) -> Result<TedTender, String> {
        let id = notice
            .id
            .as_ref()
            .and_then(notice_id)
            .ok_or_else(|| format!("notice without numeric id: {:?}", notice.id))?;

        let publication_date = non_blank(notice.publication_date)
            .ok_or_else(|| format!("notice {} has no publication date", id))?;

        let notice_type = match non_blank(notice.notice_type) {
            Some(raw) => raw
                .parse::<NoticeType>()
                .map_err(|e| format!("notice {}: {}", id, e))?,
            None => NoticeType::default(),
        };

        let (buyer_name, buyer_country) = match notice.buyer {
            Some(buyer) => (non_blank(buyer.name), non_blank(buyer.country)),
            None => (None, None),
        };

        let (value_amount, value_currency) = match notice.value {
            Some(value) => (value.amount.as_ref().and_then(amount), non_blank(value.currency)),
            None => (None, None),
        };

        Ok(TedTender {
            id,
            title: non_blank(notice.title).unwrap_or_else(|| "Untitled Tender".to_string()),
            publication_date,
            notice_type,
            buyer_name: Some(buyer_name.unwrap_or_else(|| "Unknown".to_string())),
            buyer_country: Some(buyer_country.unwrap_or_else(|| "EU".to_string())),
            value_amount,
            value_currency,
            original_url: non_blank(notice.document_url),
            description: non_blank(notice.description),
            cpv_codes: notice.cpv_codes,
            reference_number: non_blank(notice.reference_number),
            sync_status: Some("synced".to_string()),
            last_sync_attempt: Some(synced_at),
        })
    }
}

impl FeedAdapter for TedV3Feed {
    fn version(&self) -> &str {
        "ted-v3.0"
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("pageSize", self.page_size.to_string()),
            ("pageNumber", "1".to_string()),
            ("sortBy", "publicationDate".to_string()),
            ("sortOrder", "desc".to_string()),
            ("fields", "all".to_string()),
        ]
    }

    fn parse_response(&self, body: &str, synced_at: DateTime<Utc>) -> Result<FeedBatch, TenderError> {
        let response: V3Response = serde_json::from_str(body)?;
        let mut batch = FeedBatch::default();

        for notice in response.results.unwrap_or_default() {
            match self.map_notice(notice, synced_at) {
                Ok(tender) => batch.tenders.push(tender),
                Err(reason) => {
                    tracing::warn!(adapter = self.version(), %reason, "feed result skipped");
                    batch.skipped.push(reason);
                }
            }
        }

        Ok(batch)
    }
}

// ============================================================================
// HTTP TRANSPORT
// ============================================================================

#[cfg(feature = "ted-sync")]
pub struct FeedClient {
    endpoint: String,
    http: reqwest::Client,
    adapter: Box<dyn FeedAdapter>,
}

#[cfg(feature = "ted-sync")]
impl FeedClient {
    pub fn new(endpoint: &str, adapter: Box<dyn FeedAdapter>) -> Self {
        FeedClient {
            endpoint: endpoint.to_string(),
            http: reqwest::Client::new(),
            adapter,
        }
    }

    pub fn adapter_version(&self) -> &str {
        self.adapter.version()
    }

    /// Fetch the latest notices and decode them
    pub async fn fetch_latest(&self) -> Result<FeedBatch, TenderError> {
        let params = self.adapter.query_params();
        tracing::info!(endpoint = %self.endpoint, adapter = self.adapter.version(), "querying feed");

        let response = self
            .http
            .get(&self.endpoint)
            .query(&params)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| TenderError::Feed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TenderError::Feed(e.to_string()))?;

        if !status.is_success() {
            return Err(TenderError::Feed(format!(
                "query failed with {}: {}",
                status, body
            )));
        }

        self.adapter.parse_response(&body, Utc::now())
    }
}
