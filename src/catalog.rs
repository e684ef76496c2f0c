// 📚 Catalog - fetch from the store and normalize at the boundary
//
// Every surface (CLI, TUI, HTTP) goes through here, so the list pipeline
// only ever sees closed TenderSummary values.

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

use crate::db;
use crate::error::{RangeError, TenderError};
use crate::normalize::{normalize_local_batch, normalize_ted_batch, RowIssue};
use crate::paginate::{total_pages, Page};
use crate::tender::TenderSummary;
use crate::ted::{FeedAdapter, FeedBatch};

/// Normalized snapshot of the local tenders, newest first
pub fn local_snapshot(conn: &Connection) -> Result<(Vec<TenderSummary>, Vec<RowIssue>)> {
    let records = db::get_all_tenders(conn)?;
    let organizations = db::vendor_names(conn)?;
    Ok(normalize_local_batch(&records, &organizations))
}

/// One page of the external feed, counted exactly by the store
///
/// Out-of-range pages fail with `TenderError::Range`; page 1 of an empty feed is empty.
pub fn ted_page(conn: &Connection, page_number: usize, page_size: usize) -> Result<Page<TenderSummary>> {
    if page_size == 0 {
        return Err(TenderError::Range(RangeError::ZeroPageSize).into());
    }

    let pages = total_pages(db::count_ted_tenders(conn)?, page_size);
    if page_number == 0 || page_number > pages {
        return Err(TenderError::Range(RangeError::PageOutOfRange {
            requested: page_number,
            total_pages: pages,
        })
        .into());
    }

    let (rows, total) = db::get_ted_tenders_page(conn, page_number, page_size)?;

    let (items, _issues) = normalize_ted_batch(&rows);
    Ok(Page {
        items,
        page_number,
        page_size,
        total_items: total,
        total_pages: pages,
    })
}

/// Decode a saved feed response and upsert it
pub fn import_feed_json(conn: &Connection, adapter: &dyn FeedAdapter, body: &str) -> Result<FeedBatch> {
    let batch = adapter.parse_response(body, Utc::now())?;
    if !batch.is_empty() {
        db::upsert_ted_tenders(conn, &batch.tenders, adapter.version())?;
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Vendor;
    use crate::tender::{NewTender, TenderSource, TenderStatus};
    use crate::ted::TedV3Feed;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::setup_database(&conn).unwrap();
        conn
    }

    fn feed_body(count: usize) -> String {
        let results: Vec<String> = (1..=count)
            .map(|i| {
                format!(
                    r#"{{"id": {}, "title": "Notice {}", "publicationDate": "2024-03-{:02}"}}"#,
                    i, i, i
                )
            })
            .collect();
        format!(r#"{{"results": [{}]}}"#, results.join(","))
    }

    #[test]
    fn test_local_snapshot_resolves_organizations() {
        let conn = memory_db();
        let vendor = Vendor::new("Acme Works").validated();
        db::insert_vendor(&conn, &vendor).unwrap();

        db::insert_tender(
            &conn,
            NewTender {
                organization_id: Some(vendor.id.clone()),
                status: Some(TenderStatus::Active),
                ..NewTender::new("Roads")
            },
            "test",
        )
        .unwrap();
        db::insert_tender(&conn, NewTender::new("Rails"), "test").unwrap();

        let (rows, issues) = local_snapshot(&conn).unwrap();

        assert!(issues.is_empty());
        assert_eq!(rows.len(), 2);
        let roads = rows.iter().find(|r| r.title == "Roads").unwrap();
        assert_eq!(roads.organization, "Acme Works");
        assert_eq!(roads.source, TenderSource::Local);
        let rails = rows.iter().find(|r| r.title == "Rails").unwrap();
        assert_eq!(rails.organization, "Unknown");
        assert_eq!(rails.deadline_display, "No deadline set");
    }

    #[test]
    fn test_local_snapshot_drops_unknown_status() {
        let conn = memory_db();
        let created = db::insert_tender(&conn, NewTender::new("Odd"), "test").unwrap();
        conn.execute(
            "UPDATE tenders SET status = 'pending' WHERE id = ?1",
            rusqlite::params![created.id],
        )
        .unwrap();

        let (rows, issues) = local_snapshot(&conn).unwrap();

        assert!(rows.is_empty());
        assert_eq!(issues.len(), 1);
        assert!(issues[0].rejected);
    }

    #[test]
    fn test_ted_pages() {
        let conn = memory_db();
        let batch = import_feed_json(&conn, &TedV3Feed::new(), &feed_body(25)).unwrap();
        assert_eq!(batch.tenders.len(), 25);

        let page = ted_page(&conn, 3, 10).unwrap();
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.total_items, 25);
        assert_eq!(page.total_pages, 3);
        assert!(page.items.iter().all(|t| t.is_external()));
        assert!(page.items.iter().all(|t| t.status == TenderStatus::Active));

        let err = ted_page(&conn, 4, 10).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TenderError>(),
            Some(TenderError::Range(RangeError::PageOutOfRange { requested: 4, total_pages: 3 }))
        ));
    }

    #[test]
    fn test_empty_feed() {
        let conn = memory_db();
        let batch = import_feed_json(&conn, &TedV3Feed::new(), r#"{"results": []}"#).unwrap();
        assert!(batch.is_empty());

        let page = ted_page(&conn, 1, 10).unwrap();
        assert!(page.items.is_empty());
        assert!(ted_page(&conn, 2, 10).is_err());
        assert!(ted_page(&conn, 0, 10).is_err());
    }

    #[test]
    fn test_huge_page_number_is_out_of_range() {
        let conn = memory_db();
        import_feed_json(&conn, &TedV3Feed::new(), &feed_body(3)).unwrap();

        for size in [10, usize::MAX] {
            let err = ted_page(&conn, usize::MAX, size).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<TenderError>(),
                Some(TenderError::Range(RangeError::PageOutOfRange { requested: usize::MAX, total_pages: 1 }))
            ));
        }

        // The store is still usable afterwards
        assert_eq!(ted_page(&conn, 1, 10).unwrap().items.len(), 3);
    }
}
