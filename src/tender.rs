// 📄 Tender Model - Persisted rows + the closed summary type the list view works on
//
// Persisted rows carry loose data (nullable dates, free-form status text).
// TenderSummary is the one closed record type: status and source are enums,
// display fields are already formatted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

// ============================================================================
// STATUS & SOURCE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenderStatus {
    Draft,
    Active,
    Closed,
}

impl TenderStatus {
    pub const ALL: [TenderStatus; 3] = [TenderStatus::Draft, TenderStatus::Active, TenderStatus::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            TenderStatus::Draft => "draft",
            TenderStatus::Active => "active",
            TenderStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for TenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(TenderStatus::Draft),
            "active" => Ok(TenderStatus::Active),
            "closed" => Ok(TenderStatus::Closed),
            _ => Err(ValidationError::Status { value: s.to_string() }),
        }
    }
}

/// Where a row came from; decides what activating it does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenderSource {
    Local,
    ExternalFeed,
}

/// TED notice kinds (closed set in the feed schema)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeType {
    ContractNotice,
    ContractAward,
    PriorInformation,
    Modification,
}

impl NoticeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeType::ContractNotice => "contract_notice",
            NoticeType::ContractAward => "contract_award",
            NoticeType::PriorInformation => "prior_information",
            NoticeType::Modification => "modification",
        }
    }
}

impl Default for NoticeType {
    fn default() -> Self {
        NoticeType::ContractNotice
    }
}

impl FromStr for NoticeType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "contract_notice" => Ok(NoticeType::ContractNotice),
            "contract_award" => Ok(NoticeType::ContractAward),
            "prior_information" => Ok(NoticeType::PriorInformation),
            "modification" => Ok(NoticeType::Modification),
            other => Err(ValidationError::NoticeType { value: other.to_string() }),
        }
    }
}

// ============================================================================
// PERSISTED ROWS
// ============================================================================

/// Locally authored tender, as stored in the `tenders` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub objective: Option<String>,
    pub scope_of_work: Option<String>,
    pub eligibility_criteria: Option<String>,
    pub budget: Option<f64>,
    /// ISO-8601 text as persisted; parsed by the normalizer
    pub deadline: Option<String>,
    /// Free text in storage; validated into `TenderStatus` at the fetch boundary
    pub status: String,
    pub organization_id: Option<String>,
    pub reference_number: Option<String>,
    pub category: Option<String>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    /// Visible to every vendor, not only invited ones
    pub is_public: bool,
    pub site_visit_required: bool,
    pub site_visit_date: Option<String>,
    pub site_visit_location: Option<String>,
    pub tender_opening_date: Option<String>,
    pub tender_opening_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenderRecord {
    /// Content hash used to make CSV imports idempotent
    pub fn compute_idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}|{}",
            self.title,
            self.organization_id.as_deref().unwrap_or(""),
            self.deadline.as_deref().unwrap_or(""),
            self.budget.map(|b| b.to_string()).unwrap_or_default()
        ));
        format!("{:x}", hasher.finalize())
    }
}

/// Input for creating a tender
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTender {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub scope_of_work: Option<String>,
    #[serde(default)]
    pub eligibility_criteria: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub status: Option<TenderStatus>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub site_visit_required: bool,
    #[serde(default)]
    pub site_visit_date: Option<String>,
    #[serde(default)]
    pub site_visit_location: Option<String>,
    #[serde(default)]
    pub tender_opening_date: Option<String>,
    #[serde(default)]
    pub tender_opening_type: Option<String>,
}

impl NewTender {
    pub fn new(title: &str) -> Self {
        NewTender {
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::Required { field: "title" });
        }
        validate_email(self.contact_email.as_deref())
    }

    /// Build the row to persist (fresh UUID, timestamps = now)
    pub fn into_record(self) -> TenderRecord {
        let now = Utc::now();
        let mut record = TenderRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: self.title.trim().to_string(),
            description: self.description,
            objective: self.objective,
            scope_of_work: self.scope_of_work,
            eligibility_criteria: self.eligibility_criteria,
            budget: self.budget,
            deadline: self.deadline,
            status: self.status.unwrap_or(TenderStatus::Draft).as_str().to_string(),
            organization_id: self.organization_id,
            reference_number: self.reference_number,
            category: self.category,
            contact_person: self.contact_person,
            contact_email: self
                .contact_email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            is_public: self.is_public,
            site_visit_required: self.site_visit_required,
            site_visit_date: self.site_visit_date,
            site_visit_location: self.site_visit_location,
            tender_opening_date: self.tender_opening_date,
            tender_opening_type: self.tender_opening_type,
            created_at: now,
            updated_at: now,
        };
        record.clear_unused_site_visit();
        record
    }
}

impl TenderRecord {
    /// Site visit details only exist while a visit is required
    fn clear_unused_site_visit(&mut self) {
        if !self.site_visit_required {
            self.site_visit_date = None;
            self.site_visit_location = None;
        }
    }
}

/// Loose `local@domain.tld` shape check; blank means no email
fn validate_email(email: Option<&str>) -> Result<(), ValidationError> {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(());
    };
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() > 1
                && domain.split('.').all(|part| !part.is_empty())
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::Email { value: email.to_string() })
    }
}

/// Partial edit; `None` leaves the field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenderUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub scope_of_work: Option<String>,
    #[serde(default)]
    pub eligibility_criteria: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub status: Option<TenderStatus>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub site_visit_required: Option<bool>,
    #[serde(default)]
    pub site_visit_date: Option<String>,
    #[serde(default)]
    pub site_visit_location: Option<String>,
    #[serde(default)]
    pub tender_opening_date: Option<String>,
    #[serde(default)]
    pub tender_opening_type: Option<String>,
}

fn replace(target: &mut Option<String>, value: &Option<String>) {
    if let Some(value) = value {
        *target = Some(value.clone());
    }
}

impl TenderUpdate {
    /// Validates first, so a rejected edit leaves `record` untouched
    pub fn apply(&self, record: &mut TenderRecord) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(ValidationError::Required { field: "title" });
            }
        }
        validate_email(self.contact_email.as_deref())?;

        if let Some(title) = &self.title {
            record.title = title.trim().to_string();
        }
        replace(&mut record.description, &self.description);
        replace(&mut record.objective, &self.objective);
        replace(&mut record.scope_of_work, &self.scope_of_work);
        replace(&mut record.eligibility_criteria, &self.eligibility_criteria);
        if let Some(budget) = self.budget {
            record.budget = Some(budget);
        }
        replace(&mut record.deadline, &self.deadline);
        if let Some(status) = self.status {
            record.status = status.as_str().to_string();
        }
        replace(&mut record.contact_person, &self.contact_person);
        replace(
            &mut record.contact_email,
            &self.contact_email.as_ref().map(|e| e.trim().to_string()),
        );
        if let Some(is_public) = self.is_public {
            record.is_public = is_public;
        }
        if let Some(required) = self.site_visit_required {
            record.site_visit_required = required;
        }
        replace(&mut record.site_visit_date, &self.site_visit_date);
        replace(&mut record.site_visit_location, &self.site_visit_location);
        replace(&mut record.tender_opening_date, &self.tender_opening_date);
        replace(&mut record.tender_opening_type, &self.tender_opening_type);
        record.clear_unused_site_visit();
        record.updated_at = Utc::now();
        Ok(())
    }
}

/// Notice from the external feed, as stored in the `ted_tenders` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TedTender {
    pub id: i64,
    pub title: String,
    pub publication_date: String,
    pub notice_type: NoticeType,
    pub buyer_name: Option<String>,
    pub buyer_country: Option<String>,
    pub value_amount: Option<f64>,
    pub value_currency: Option<String>,
    pub original_url: Option<String>,
    pub description: Option<String>,
    pub cpv_codes: Vec<String>,
    pub reference_number: Option<String>,
    pub sync_status: Option<String>,
    pub last_sync_attempt: Option<DateTime<Utc>>,
}

// ============================================================================
// SUMMARY (what the list pipeline manipulates)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderSummary {
    pub id: String,
    pub title: String,
    pub organization: String,
    pub deadline_raw: Option<DateTime<Utc>>,
    pub deadline_display: String,
    pub budget_raw: Option<f64>,
    pub budget_display: String,
    pub status: TenderStatus,
    pub source: TenderSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl TenderSummary {
    pub fn is_external(&self) -> bool {
        self.source == TenderSource::ExternalFeed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_closed_set() {
        assert_eq!("draft".parse::<TenderStatus>().unwrap(), TenderStatus::Draft);
        assert_eq!(" Active ".parse::<TenderStatus>().unwrap(), TenderStatus::Active);
        assert_eq!("CLOSED".parse::<TenderStatus>().unwrap(), TenderStatus::Closed);

        let err = "pending".parse::<TenderStatus>().unwrap_err();
        assert_eq!(err, ValidationError::Status { value: "pending".to_string() });
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&TenderStatus::Active).unwrap();
        assert_eq!(json, "\"active\"");

        let source = serde_json::to_string(&TenderSource::ExternalFeed).unwrap();
        assert_eq!(source, "\"external_feed\"");
    }

    #[test]
    fn test_new_tender_requires_title() {
        assert!(NewTender::new("   ").validate().is_err());
        assert!(NewTender::new("Road works").validate().is_ok());
    }

    #[test]
    fn test_new_tender_defaults_to_draft() {
        let record = NewTender::new("  Road works ").into_record();

        assert_eq!(record.title, "Road works");
        assert_eq!(record.status, "draft");
        assert_eq!(record.id.len(), 36);
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn test_update_leaves_unset_fields_alone() {
        let mut record = NewTender {
            budget: Some(1000.0),
            ..NewTender::new("Bridge")
        }
        .into_record();

        let update = TenderUpdate {
            status: Some(TenderStatus::Active),
            description: Some("Steel bridge".to_string()),
            ..Default::default()
        };
        update.apply(&mut record).unwrap();

        assert_eq!(record.title, "Bridge");
        assert_eq!(record.budget, Some(1000.0));
        assert_eq!(record.status, "active");
        assert_eq!(record.description.as_deref(), Some("Steel bridge"));
    }

    #[test]
    fn test_update_rejects_blank_title() {
        let mut record = NewTender::new("Bridge").into_record();
        let update = TenderUpdate {
            title: Some(String::new()),
            ..Default::default()
        };

        assert!(update.apply(&mut record).is_err());
        assert_eq!(record.title, "Bridge");
    }

    #[test]
    fn test_new_tender_carries_form_sections() {
        let record = NewTender {
            objective: Some("Safer crossings".to_string()),
            scope_of_work: Some("Design and build".to_string()),
            eligibility_criteria: Some("ISO 9001".to_string()),
            contact_person: Some("Ana Silva".to_string()),
            contact_email: Some(" ana@lisboa.pt ".to_string()),
            is_public: true,
            site_visit_required: true,
            site_visit_date: Some("2024-06-01T10:00".to_string()),
            site_visit_location: Some("Pier 3".to_string()),
            tender_opening_date: Some("2024-07-01T09:00".to_string()),
            tender_opening_type: Some("public session".to_string()),
            ..NewTender::new("Bridge")
        }
        .into_record();

        assert_eq!(record.objective.as_deref(), Some("Safer crossings"));
        assert_eq!(record.eligibility_criteria.as_deref(), Some("ISO 9001"));
        assert_eq!(record.contact_email.as_deref(), Some("ana@lisboa.pt"));
        assert!(record.is_public);
        assert_eq!(record.site_visit_location.as_deref(), Some("Pier 3"));
        assert_eq!(record.tender_opening_type.as_deref(), Some("public session"));
    }

    #[test]
    fn test_site_visit_details_need_a_required_visit() {
        let record = NewTender {
            site_visit_date: Some("2024-06-01T10:00".to_string()),
            site_visit_location: Some("Pier 3".to_string()),
            ..NewTender::new("Bridge")
        }
        .into_record();
        assert_eq!(record.site_visit_date, None);
        assert_eq!(record.site_visit_location, None);

        let mut record = record;
        TenderUpdate {
            site_visit_required: Some(true),
            site_visit_location: Some("Pier 3".to_string()),
            ..Default::default()
        }
        .apply(&mut record)
        .unwrap();
        assert_eq!(record.site_visit_location.as_deref(), Some("Pier 3"));

        TenderUpdate {
            site_visit_required: Some(false),
            ..Default::default()
        }
        .apply(&mut record)
        .unwrap();
        assert_eq!(record.site_visit_location, None);
    }

    #[test]
    fn test_contact_email_shape() {
        let with_email = |email: &str| NewTender {
            contact_email: Some(email.to_string()),
            ..NewTender::new("Bridge")
        };

        assert!(with_email("ana@lisboa.pt").validate().is_ok());
        assert!(with_email("  ").validate().is_ok());
        for bad in ["ana", "ana@", "@lisboa.pt", "ana@lisboa", "ana@@lisboa.pt", "a na@lisboa.pt"] {
            assert_eq!(
                with_email(bad).validate(),
                Err(ValidationError::Email { value: bad.to_string() }),
                "{}",
                bad
            );
        }

        let mut record = NewTender::new("Bridge").into_record();
        let update = TenderUpdate {
            title: Some("Road".to_string()),
            contact_email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        assert!(update.apply(&mut record).is_err());
        assert_eq!(record.title, "Bridge");
    }

    #[test]
    fn test_idempotency_hash_is_content_based() {
        let a = NewTender::new("Bridge").into_record();
        let b = NewTender::new("Bridge").into_record();

        assert_ne!(a.id, b.id);
        assert_eq!(a.compute_idempotency_hash(), b.compute_idempotency_hash());
        assert_eq!(a.compute_idempotency_hash().len(), 64);
    }

    #[test]
    fn test_notice_type_parse() {
        assert_eq!("contract_award".parse::<NoticeType>().unwrap(), NoticeType::ContractAward);
        assert!("tender".parse::<NoticeType>().is_err());
        assert_eq!(NoticeType::default(), NoticeType::ContractNotice);
    }
}
