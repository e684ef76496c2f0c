// 🗄️ Tender Store - SQLite + WAL
// Tables: tenders, ted_tenders, profiles, ai_prompts, events (audit trail)

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::entities::{AiPrompt, Vendor};
use crate::error::{RangeError, TenderError, ValidationError};
use crate::paginate::total_pages;
use crate::tender::{NewTender, NoticeType, TedTender, TenderRecord, TenderStatus, TenderUpdate};

/// Event for audit trail (every store mutation is recorded)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS tenders (
            id TEXT PRIMARY KEY,
            idempotency_hash TEXT UNIQUE NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            objective TEXT,
            scope_of_work TEXT,
            eligibility_criteria TEXT,
            budget REAL,
            deadline TEXT,
            status TEXT NOT NULL DEFAULT 'draft',
            organization_id TEXT,
            reference_number TEXT,
            category TEXT,
            contact_person TEXT,
            contact_email TEXT,
            is_public INTEGER NOT NULL DEFAULT 0,
            site_visit_required INTEGER NOT NULL DEFAULT 0,
            site_visit_date TEXT,
            site_visit_location TEXT,
            tender_opening_date TEXT,
            tender_opening_type TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS ted_tenders (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            publication_date TEXT NOT NULL,
            type TEXT NOT NULL,
            buyer_name TEXT,
            buyer_country TEXT,
            value_amount REAL,
            value_currency TEXT,
            original_url TEXT,
            description TEXT,
            cpv_codes TEXT,
            reference_number TEXT,
            sync_status TEXT,
            last_sync_attempt TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            organization_name TEXT NOT NULL,
            is_validated INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS ai_prompts (
            id TEXT PRIMARY KEY,
            field_name TEXT UNIQUE NOT NULL,
            prompt_text TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tenders_created ON tenders(created_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_ted_publication ON ted_tenders(publication_date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

/// Fixed-width RFC 3339 so text ordering matches time ordering
fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

// ============================================================================
// TENDERS
// ============================================================================

const TENDER_COLUMNS: &str = "id, title, description, objective, scope_of_work, eligibility_criteria,
    budget, deadline, status, organization_id, reference_number, category,
    contact_person, contact_email, is_public, site_visit_required, site_visit_date,
    site_visit_location, tender_opening_date, tender_opening_type, created_at, updated_at";

fn tender_from_row(row: &Row) -> rusqlite::Result<TenderRecord> {
    let created_at: Option<String> = row.get(20)?;
    let updated_at: Option<String> = row.get(21)?;
    let created_at = parse_timestamp(created_at).unwrap_or_default();

    Ok(TenderRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        objective: row.get(3)?,
        scope_of_work: row.get(4)?,
        eligibility_criteria: row.get(5)?,
        budget: row.get(6)?,
        deadline: row.get(7)?,
        status: row.get(8)?,
        organization_id: row.get(9)?,
        reference_number: row.get(10)?,
        category: row.get(11)?,
        contact_person: row.get(12)?,
        contact_email: row.get(13)?,
        is_public: row.get(14)?,
        site_visit_required: row.get(15)?,
        site_visit_date: row.get(16)?,
        site_visit_location: row.get(17)?,
        tender_opening_date: row.get(18)?,
        tender_opening_type: row.get(19)?,
        created_at,
        updated_at: parse_timestamp(updated_at).unwrap_or(created_at),
    })
}

/// Insert one row; returns false when an identical tender already exists
fn insert_tender_row(conn: &Connection, record: &TenderRecord) -> Result<bool> {
    let result = conn.execute(
        "INSERT INTO tenders (
            id, idempotency_hash, title, description, objective, scope_of_work,
            eligibility_criteria, budget, deadline, status, organization_id,
            reference_number, category, contact_person, contact_email, is_public,
            site_visit_required, site_visit_date, site_visit_location,
            tender_opening_date, tender_opening_type, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                  ?17, ?18, ?19, ?20, ?21, ?22, ?23)",
        params![
            record.id,
            record.compute_idempotency_hash(),
            record.title,
            record.description,
            record.objective,
            record.scope_of_work,
            record.eligibility_criteria,
            record.budget,
            record.deadline,
            record.status,
            record.organization_id,
            record.reference_number,
            record.category,
            record.contact_person,
            record.contact_email,
            record.is_public,
            record.site_visit_required,
            record.site_visit_date,
            record.site_visit_location,
            record.tender_opening_date,
            record.tender_opening_type,
            timestamp(&record.created_at),
            timestamp(&record.updated_at),
        ],
    );

    match result {
        Ok(_) => Ok(true),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Create a tender from form input
pub fn insert_tender(conn: &Connection, input: NewTender, actor: &str) -> Result<TenderRecord> {
    input.validate().map_err(TenderError::from)?;
    let record = input.into_record();

    if !insert_tender_row(conn, &record)? {
        return Err(TenderError::from(ValidationError::Duplicate { title: record.title }).into());
    }

    insert_event(
        conn,
        &Event::new(
            "tender_created",
            "tender",
            &record.id,
            serde_json::json!({ "title": record.title, "status": record.status }),
            actor,
        ),
    )?;
    tracing::info!(tender_id = %record.id, "tender created");

    Ok(record)
}

pub fn get_tender(conn: &Connection, id: &str) -> Result<Option<TenderRecord>> {
    let sql = format!("SELECT {} FROM tenders WHERE id = ?1", TENDER_COLUMNS);
    let record = conn
        .query_row(&sql, params![id], tender_from_row)
        .optional()?;
    Ok(record)
}

/// All local tenders, newest first
pub fn get_all_tenders(conn: &Connection) -> Result<Vec<TenderRecord>> {
    let sql = format!(
        "SELECT {} FROM tenders ORDER BY created_at DESC, rowid DESC",
        TENDER_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;

    let tenders = stmt
        .query_map([], tender_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tenders)
}

/// Apply an edit; errors with `TenderError::NotFound` for unknown ids
pub fn update_tender(conn: &Connection, id: &str, update: &TenderUpdate, actor: &str) -> Result<TenderRecord> {
    let mut record = get_tender(conn, id)?.ok_or_else(|| TenderError::NotFound(id.to_string()))?;
    update.apply(&mut record).map_err(TenderError::from)?;

    let result = conn.execute(
        "UPDATE tenders
         SET idempotency_hash = ?1, title = ?2, description = ?3, objective = ?4,
             scope_of_work = ?5, eligibility_criteria = ?6, budget = ?7, deadline = ?8,
             status = ?9, contact_person = ?10, contact_email = ?11, is_public = ?12,
             site_visit_required = ?13, site_visit_date = ?14, site_visit_location = ?15,
             tender_opening_date = ?16, tender_opening_type = ?17, updated_at = ?18
         WHERE id = ?19",
        params![
            record.compute_idempotency_hash(),
            record.title,
            record.description,
            record.objective,
            record.scope_of_work,
            record.eligibility_criteria,
            record.budget,
            record.deadline,
            record.status,
            record.contact_person,
            record.contact_email,
            record.is_public,
            record.site_visit_required,
            record.site_visit_date,
            record.site_visit_location,
            record.tender_opening_date,
            record.tender_opening_type,
            timestamp(&record.updated_at),
            record.id,
        ],
    );

    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(TenderError::from(ValidationError::Duplicate { title: record.title }).into());
        }
        Err(e) => return Err(e.into()),
    }

    insert_event(
        conn,
        &Event::new(
            "tender_updated",
            "tender",
            &record.id,
            serde_json::to_value(update)?,
            actor,
        ),
    )?;

    Ok(record)
}

/// CSV import row (header names match the export of the hosted tables)
#[derive(Debug, Deserialize)]
pub struct TenderCsvRow {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub scope_of_work: Option<String>,
    #[serde(default)]
    pub eligibility_criteria: Option<String>,
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

pub fn load_csv(csv_path: &Path) -> Result<Vec<TenderRecord>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open CSV file")?;
    let mut records = Vec::new();

    for (index, result) in rdr.deserialize().enumerate() {
        let row: TenderCsvRow = result.context("Failed to deserialize tender")?;
        let status = match row.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                raw.parse::<TenderStatus>()
                    .with_context(|| format!("CSV line {}", index + 2))?,
            ),
            None => None,
        };

        let input = NewTender {
            title: row.title,
            description: row.description,
            budget: row.budget,
            deadline: row.deadline.filter(|s| !s.trim().is_empty()),
            status,
            organization_id: row.organization_id.filter(|s| !s.trim().is_empty()),
            reference_number: row.reference_number,
            category: row.category,
            objective: row.objective,
            scope_of_work: row.scope_of_work,
            eligibility_criteria: row.eligibility_criteria,
            contact_person: row.contact_person,
            contact_email: row.contact_email,
            is_public: row.is_public.unwrap_or(false),
            site_visit_required: row.site_visit_required.unwrap_or(false),
            site_visit_date: row.site_visit_date,
            site_visit_location: row.site_visit_location,
            tender_opening_date: row.tender_opening_date,
            tender_opening_type: row.tender_opening_type,
        };
        input
            .validate()
            .with_context(|| format!("CSV line {}", index + 2))?;

        records.push(input.into_record());
    }

    Ok(records)
}

/// Bulk insert; rows with identical content are skipped. Returns rows inserted.
pub fn import_tenders(conn: &Connection, records: &[TenderRecord]) -> Result<usize> {
    let mut inserted = 0;
    let mut duplicates = 0;

    for record in records {
        if insert_tender_row(conn, record)? {
            inserted += 1;
            let event = Event::new(
                "tender_created",
                "tender",
                &record.id,
                serde_json::json!({ "title": record.title }),
                "csv_importer",
            );
            if let Err(err) = insert_event(conn, &event) {
                tracing::warn!(tender_id = %record.id, error = %err, "audit event not recorded");
            }
        } else {
            duplicates += 1;
        }
    }

    tracing::info!(inserted, duplicates, "tender import finished");
    Ok(inserted)
}

pub fn count_tenders(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM tenders", [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// EXTERNAL FEED (TED)
// ============================================================================

const TED_COLUMNS: &str = "id, title, publication_date, type, buyer_name, buyer_country,
    value_amount, value_currency, original_url, description, cpv_codes,
    reference_number, sync_status, last_sync_attempt";

fn ted_from_row(row: &Row) -> rusqlite::Result<TedTender> {
    let notice_type: String = row.get(3)?;
    let cpv_json: Option<String> = row.get(10)?;
    let last_sync: Option<String> = row.get(13)?;

    Ok(TedTender {
        id: row.get(0)?,
        title: row.get(1)?,
        publication_date: row.get(2)?,
        notice_type: notice_type.parse::<NoticeType>().unwrap_or_default(),
        buyer_name: row.get(4)?,
        buyer_country: row.get(5)?,
        value_amount: row.get(6)?,
        value_currency: row.get(7)?,
        original_url: row.get(8)?,
        description: row.get(9)?,
        cpv_codes: cpv_json
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default(),
        reference_number: row.get(11)?,
        sync_status: row.get(12)?,
        last_sync_attempt: parse_timestamp(last_sync),
    })
}

/// Insert or replace by notice id
pub fn upsert_ted_tenders(conn: &Connection, tenders: &[TedTender], actor: &str) -> Result<usize> {
    let mut written = 0;

    for tender in tenders {
        conn.execute(
            "INSERT INTO ted_tenders (
                id, title, publication_date, type, buyer_name, buyer_country,
                value_amount, value_currency, original_url, description, cpv_codes,
                reference_number, sync_status, last_sync_attempt
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                publication_date = excluded.publication_date,
                type = excluded.type,
                buyer_name = excluded.buyer_name,
                buyer_country = excluded.buyer_country,
                value_amount = excluded.value_amount,
                value_currency = excluded.value_currency,
                original_url = excluded.original_url,
                description = excluded.description,
                cpv_codes = excluded.cpv_codes,
                reference_number = excluded.reference_number,
                sync_status = excluded.sync_status,
                last_sync_attempt = excluded.last_sync_attempt",
            params![
                tender.id,
                tender.title,
                tender.publication_date,
                tender.notice_type.as_str(),
                tender.buyer_name,
                tender.buyer_country,
                tender.value_amount,
                tender.value_currency,
                tender.original_url,
                tender.description,
                serde_json::to_string(&tender.cpv_codes)?,
                tender.reference_number,
                tender.sync_status,
                tender.last_sync_attempt.map(|dt| timestamp(&dt)),
            ],
        )?;
        written += 1;
    }

    insert_event(
        conn,
        &Event::new(
            "ted_synced",
            "ted_tender",
            "batch",
            serde_json::json!({ "count": written }),
            actor,
        ),
    )?;

    Ok(written)
}

pub fn count_ted_tenders(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM ted_tenders", [], |row| row.get(0))?;
    Ok(count as usize)
}

/// One page of feed notices, newest publication first, plus the exact total
///
/// Pages whose offset does not fit the store fail with `TenderError::Range`.
pub fn get_ted_tenders_page(conn: &Connection, page_number: usize, page_size: usize) -> Result<(Vec<TedTender>, usize)> {
    let total = count_ted_tenders(conn)?;
    let offset = page_number
        .saturating_sub(1)
        .checked_mul(page_size)
        .and_then(|offset| i64::try_from(offset).ok())
        .ok_or(TenderError::Range(RangeError::PageOutOfRange {
            requested: page_number,
            total_pages: total_pages(total, page_size),
        }))?;
    let limit = i64::try_from(page_size).unwrap_or(i64::MAX);

    let sql = format!(
        "SELECT {} FROM ted_tenders ORDER BY publication_date DESC, id DESC LIMIT ?1 OFFSET ?2",
        TED_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let tenders = stmt
        .query_map(params![limit, offset], ted_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((tenders, total))
}

pub fn get_all_ted_tenders(conn: &Connection) -> Result<Vec<TedTender>> {
    let sql = format!(
        "SELECT {} FROM ted_tenders ORDER BY publication_date DESC, id DESC",
        TED_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let tenders = stmt
        .query_map([], ted_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tenders)
}

// ============================================================================
// VENDORS
// ============================================================================

pub fn insert_vendor(conn: &Connection, vendor: &Vendor) -> Result<()> {
    conn.execute(
        "INSERT INTO profiles (id, organization_name, is_validated, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            vendor.id,
            vendor.organization_name,
            vendor.is_validated,
            timestamp(&vendor.created_at),
        ],
    )?;
    Ok(())
}

fn vendor_from_row(row: &Row) -> rusqlite::Result<Vendor> {
    let created_at: Option<String> = row.get(3)?;
    Ok(Vendor {
        id: row.get(0)?,
        organization_name: row.get(1)?,
        is_validated: row.get(2)?,
        created_at: parse_timestamp(created_at).unwrap_or_default(),
    })
}

pub fn get_all_vendors(conn: &Connection) -> Result<Vec<Vendor>> {
    let mut stmt = conn.prepare(
        "SELECT id, organization_name, is_validated, created_at
         FROM profiles
         ORDER BY created_at DESC",
    )?;
    let vendors = stmt
        .query_map([], vendor_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(vendors)
}

pub fn get_validated_vendors(conn: &Connection) -> Result<Vec<Vendor>> {
    let mut stmt = conn.prepare(
        "SELECT id, organization_name, is_validated, created_at
         FROM profiles
         WHERE is_validated = 1
         ORDER BY created_at DESC",
    )?;
    let vendors = stmt
        .query_map([], vendor_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(vendors)
}

/// organization id → display name, for resolving tender organizations
pub fn vendor_names(conn: &Connection) -> Result<HashMap<String, String>> {
    Ok(crate::entities::organization_names(&get_all_vendors(conn)?))
}

// ============================================================================
// AI PROMPTS
// ============================================================================

pub fn upsert_ai_prompt(conn: &Connection, prompt: &AiPrompt, actor: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO ai_prompts (id, field_name, prompt_text, description, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(field_name) DO UPDATE SET
             prompt_text = excluded.prompt_text,
             updated_at = excluded.updated_at",
        params![
            prompt.id,
            prompt.field_name,
            prompt.prompt_text,
            prompt.description,
            timestamp(&prompt.updated_at),
        ],
    )?;

    insert_event(
        conn,
        &Event::new(
            "prompt_updated",
            "ai_prompt",
            &prompt.field_name,
            serde_json::json!({ "length": prompt.prompt_text.len() }),
            actor,
        ),
    )?;
    Ok(())
}

/// Prompts for the given field names (all prompts when `fields` is empty)
pub fn get_ai_prompts(conn: &Connection, fields: &[&str]) -> Result<Vec<AiPrompt>> {
    let mut stmt = conn.prepare(
        "SELECT id, field_name, prompt_text, description, updated_at
         FROM ai_prompts
         ORDER BY field_name",
    )?;

    let prompts = stmt
        .query_map([], |row| {
            let updated_at: Option<String> = row.get(4)?;
            Ok(AiPrompt {
                id: row.get(0)?,
                field_name: row.get(1)?,
                prompt_text: row.get(2)?,
                description: row.get(3)?,
                updated_at: parse_timestamp(updated_at).unwrap_or_default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(prompts
        .into_iter()
        .filter(|p| fields.is_empty() || fields.contains(&p.field_name.as_str()))
        .collect())
}

// ============================================================================
// EVENTS
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            timestamp(&event.timestamp),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: parse_timestamp(Some(timestamp_str)).unwrap_or_default(),
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).unwrap_or(serde_json::Value::Null),
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}
