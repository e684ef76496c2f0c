// End-to-end: store → normalize → filter → sort → paginate → view

use rusqlite::Connection;
use std::io::Write;

use tender_desk::catalog;
use tender_desk::filter::{filter_tenders, FilterSelection, Selection};
use tender_desk::normalize::{format_usd, parse_budget_display};
use tender_desk::{
    compose, import_tenders, insert_tender, insert_vendor, load_csv, paginate, setup_database,
    sort_tenders, ListQuery, NewTender, RangeError, SortConfig, SortField, SortOrder, TedV3Feed,
    TenderStatus, TenderSummary, Vendor,
};

fn memory_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    setup_database(&conn).unwrap();
    conn
}

fn titles(rows: &[TenderSummary]) -> Vec<&str> {
    rows.iter().map(|t| t.title.as_str()).collect()
}

fn seed_local(conn: &Connection) {
    let city = Vendor::new("City of Lisbon").validated();
    let port = Vendor::new("Port Authority").validated();
    insert_vendor(conn, &city).unwrap();
    insert_vendor(conn, &port).unwrap();

    let rows = [
        ("Harbour dredging", &port, "active", Some(900_000.0), Some("2024-09-01")),
        ("bus shelters", &city, "draft", Some(45_000.0), None),
        ("Street lighting", &city, "active", None, Some("2024-05-20")),
        ("Berth repairs", &port, "closed", Some(120_000.0), Some("2023-12-31")),
        ("Bike lanes", &city, "active", Some(45_000.0), Some("not a date")),
    ];

    for (title, vendor, status, budget, deadline) in rows {
        insert_tender(
            conn,
            NewTender {
                organization_id: Some(vendor.id.clone()),
                status: Some(status.parse().unwrap()),
                budget,
                deadline: deadline.map(str::to_string),
                ..NewTender::new(title)
            },
            "test",
        )
        .unwrap();
    }
}

#[test]
fn local_list_filters_and_counts() {
    let conn = memory_db();
    seed_local(&conn);

    let (rows, issues) = catalog::local_snapshot(&conn).unwrap();
    assert_eq!(rows.len(), 5);
    // The bad deadline is patched, not dropped
    assert_eq!(issues.len(), 1);
    assert!(!issues[0].rejected);

    let view = compose(
        &rows,
        &ListQuery {
            filter: FilterSelection {
                organization: Selection::Only("City of Lisbon".to_string()),
                ..Default::default()
            },
            sort: Some(SortConfig::new(SortField::Title, SortOrder::Asc)),
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(titles(&view.tenders), vec!["Bike lanes", "bus shelters", "Street lighting"]);
    assert_eq!(view.total, 3);
    assert_eq!(view.active, 2);

    let bike = &view.tenders[0];
    assert_eq!(bike.deadline_display, "No deadline set");
    assert_eq!(bike.budget_display, "$45,000.00");
    let lighting = &view.tenders[2];
    assert_eq!(lighting.budget_display, "N/A");
    assert_eq!(lighting.deadline_display, "5/20/2024");
}

#[test]
fn missing_values_sort_last_both_ways() {
    let conn = memory_db();
    seed_local(&conn);
    let (rows, _) = catalog::local_snapshot(&conn).unwrap();

    for order in [SortOrder::Asc, SortOrder::Desc] {
        let by_deadline = sort_tenders(&rows, &SortConfig::new(SortField::Deadline, order));
        let tail: Vec<_> = by_deadline[3..].iter().map(|t| t.deadline_raw).collect();
        assert_eq!(tail, vec![None, None], "deadline {:?}", order);

        let by_budget = sort_tenders(&rows, &SortConfig::new(SortField::Budget, order));
        assert_eq!(by_budget[4].title, "Street lighting", "budget {:?}", order);
    }

    let desc = sort_tenders(&rows, &SortConfig::new(SortField::Deadline, SortOrder::Desc));
    assert_eq!(titles(&desc[..3]), vec!["Harbour dredging", "Street lighting", "Berth repairs"]);
}

#[test]
fn filtering_is_a_subset_and_idempotent() {
    let conn = memory_db();
    seed_local(&conn);
    let (rows, _) = catalog::local_snapshot(&conn).unwrap();

    let selection = FilterSelection {
        status: Selection::Only(TenderStatus::Active),
        search_text: "b".to_string(),
        ..Default::default()
    };

    let once = filter_tenders(&rows, &selection);
    let twice = filter_tenders(&once, &selection);

    assert_eq!(titles(&once), titles(&twice));
    assert!(once.iter().all(|t| rows.contains(t)));
    assert!(once.iter().all(|t| t.status == TenderStatus::Active));
    // Snapshot order is newest first
    assert_eq!(titles(&once), vec!["Bike lanes", "Harbour dredging"]);
}

#[test]
fn budget_display_round_trips() {
    for amount in [0.0, 5.0, 45_000.0, 1_234_567.8, 999.99] {
        assert_eq!(parse_budget_display(&format_usd(amount)), Some(amount));
    }
}

#[test]
fn csv_import_then_list() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "title,budget,deadline,status").unwrap();
    writeln!(file, "B,100,,draft").unwrap();
    writeln!(file, "A,50,,active").unwrap();
    file.flush().unwrap();

    let conn = memory_db();
    let records = load_csv(file.path()).unwrap();
    assert_eq!(import_tenders(&conn, &records).unwrap(), 2);
    // Second run is a no-op
    let again = load_csv(file.path()).unwrap();
    assert_eq!(import_tenders(&conn, &again).unwrap(), 0);

    let (rows, _) = catalog::local_snapshot(&conn).unwrap();

    let active = compose(
        &rows,
        &ListQuery {
            filter: FilterSelection {
                status: Selection::Only(TenderStatus::Active),
                ..Default::default()
            },
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(titles(&active.tenders), vec!["A"]);

    let by_title = sort_tenders(&rows, &SortConfig::new(SortField::Title, SortOrder::Asc));
    assert_eq!(titles(&by_title), vec!["A", "B"]);

    let by_budget = sort_tenders(&rows, &SortConfig::new(SortField::Budget, SortOrder::Desc));
    assert_eq!(titles(&by_budget), vec!["B", "A"]);
}

#[test]
fn empty_store_produces_empty_views() {
    let conn = memory_db();
    let (rows, issues) = catalog::local_snapshot(&conn).unwrap();
    assert!(rows.is_empty());
    assert!(issues.is_empty());

    let view = compose(
        &rows,
        &ListQuery {
            sort: Some(SortConfig::default()),
            ..Default::default()
        },
    )
    .unwrap();
    assert!(view.is_empty());
    assert_eq!(view.active, 0);

    assert!(paginate(&rows, 1, 10).unwrap().items.is_empty());
    assert!(catalog::ted_page(&conn, 1, 10).unwrap().items.is_empty());
}

#[test]
fn external_feed_pages() {
    let conn = memory_db();
    let results: Vec<String> = (1..=25)
        .map(|i| {
            format!(
                r#"{{"id": "{}-2024", "title": "Notice {:02}", "publicationDate": "2024-04-{:02}",
                    "buyer": {{"name": "Buyer {}", "country": "DE"}},
                    "value": {{"amount": {}, "currency": "EUR"}}}}"#,
                100 + i,
                i,
                i,
                i % 3,
                i * 1000
            )
        })
        .collect();
    let body = format!(r#"{{"results": [{}]}}"#, results.join(","));
    let batch = catalog::import_feed_json(&conn, &TedV3Feed::new(), &body).unwrap();
    assert_eq!(batch.tenders.len(), 25);

    let page = catalog::ted_page(&conn, 3, 10).unwrap();
    assert_eq!(page.items.len(), 5);
    // Newest publication first
    assert_eq!(page.items[0].title, "Notice 05");
    assert_eq!(page.items[4].title, "Notice 01");
    assert_eq!(page.items[4].budget_display, "1,000.00 EUR");
    assert_eq!(page.items[4].country.as_deref(), Some("DE"));

    let err = catalog::ted_page(&conn, 4, 10).unwrap_err();
    assert_eq!(
        err.downcast_ref::<tender_desk::TenderError>().map(ToString::to_string),
        Some(RangeError::PageOutOfRange { requested: 4, total_pages: 3 }.to_string())
    );
}
