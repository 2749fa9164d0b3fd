mod common;

use common::{date, record, undated};
use harvester_core::{
    filter_records, parse_date, Bound, DateSpan, DateWindow, DensityEstimate, PageSpan, Rejection,
    WindowError, DATE_FORMATS,
};
use pretty_assertions::assert_eq;

#[test]
fn parses_every_documented_format() {
    assert_eq!(parse_date("2025-02-17"), Some(date("2025-02-17")));
    assert_eq!(parse_date("17 February 2025"), Some(date("2025-02-17")));
    assert_eq!(parse_date("February 17, 2025"), Some(date("2025-02-17")));
    assert_eq!(parse_date("February 7, 2025"), Some(date("2025-02-07")));
}

#[test]
fn formats_are_tried_in_documented_order() {
    let names: Vec<_> = DATE_FORMATS.iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["iso", "day-month-year", "month-day-year"]);
}

#[test]
fn parse_date_trims_and_returns_none_on_garbage() {
    assert_eq!(parse_date("  2024-01-31\n"), Some(date("2024-01-31")));
    assert_eq!(parse_date(""), None);
    assert_eq!(parse_date("   "), None);
    assert_eq!(parse_date("yesterday"), None);
    assert_eq!(parse_date("2024-02-30"), None);
    assert_eq!(parse_date("31/01/2024"), None);
}

#[test]
fn window_accepts_mixed_formats() {
    let window = DateWindow::parse("1 March 2024", "2024-03-31").unwrap();
    assert_eq!(window.start(), date("2024-03-01"));
    assert_eq!(window.end(), date("2024-03-31"));
    assert_eq!(window.span_days(), 30);
}

#[test]
fn window_rejects_unparsable_bounds() {
    let err = DateWindow::parse("2024-01-01", "soon").unwrap_err();
    assert_eq!(
        err,
        WindowError::Unparsable {
            bound: Bound::End,
            text: "soon".to_string()
        }
    );

    let err = DateWindow::parse("", "2024-01-01").unwrap_err();
    assert!(matches!(
        err,
        WindowError::Unparsable {
            bound: Bound::Start,
            ..
        }
    ));
}

#[test]
fn window_rejects_inverted_bounds_but_allows_single_day() {
    let err = DateWindow::parse("2024-05-02", "2024-05-01").unwrap_err();
    assert_eq!(
        err,
        WindowError::Inverted {
            start: date("2024-05-02"),
            end: date("2024-05-01")
        }
    );

    let single = DateWindow::parse("2024-05-01", "2024-05-01").unwrap();
    assert!(single.contains(date("2024-05-01")));
    assert_eq!(single.span_days(), 0);
}

#[test]
fn filter_keeps_inclusive_bounds_and_drops_undated() {
    let window = DateWindow::parse("2024-01-02", "2024-01-04").unwrap();
    let page = vec![
        record("2024-01-05"),
        record("2024-01-04"),
        undated("no date"),
        record("2024-01-03"),
        record("2024-01-02"),
        record("2024-01-01"),
    ];

    let kept = filter_records(&page, &window);
    let dates: Vec<_> = kept.iter().filter_map(|r| r.date).collect();
    assert_eq!(
        dates,
        vec![date("2024-01-04"), date("2024-01-03"), date("2024-01-02")]
    );
}

#[test]
fn filter_is_idempotent() {
    let window = DateWindow::parse("2024-01-02", "2024-01-04").unwrap();
    let page = vec![
        record("2024-01-05"),
        record("2024-01-03"),
        undated("x"),
        record("2024-01-02"),
    ];

    let once = filter_records(&page, &window);
    let twice = filter_records(&once, &window);
    assert_eq!(once, twice);
}

#[test]
fn page_span_classifies_pages() {
    assert_eq!(PageSpan::of(&[]), PageSpan::Exhausted);
    assert_eq!(PageSpan::of(&[undated("a"), undated("b")]), PageSpan::Undated);
    assert_eq!(
        PageSpan::of(&[record("2024-01-03"), undated("a"), record("2024-01-09")]),
        PageSpan::Dated(DateSpan {
            oldest: date("2024-01-03"),
            newest: date("2024-01-09"),
        })
    );
}

#[test]
fn span_overlap_treats_ties_as_overlap() {
    let span = DateSpan {
        oldest: date("2024-01-10"),
        newest: date("2024-01-20"),
    };
    let touching_end = DateWindow::parse("2024-01-01", "2024-01-10").unwrap();
    let touching_start = DateWindow::parse("2024-01-20", "2024-01-30").unwrap();
    let older = DateWindow::parse("2024-01-01", "2024-01-09").unwrap();
    let newer = DateWindow::parse("2024-01-21", "2024-01-30").unwrap();

    assert!(span.overlaps(&touching_end));
    assert!(span.overlaps(&touching_start));
    assert!(span.is_newer_than(&older));
    assert!(span.is_older_than(&newer));
    assert!(!span.overlaps(&older));
    assert!(!span.overlaps(&newer));
}

#[test]
fn density_uses_first_page_span() {
    let page = vec![record("2025-01-10"), record("2025-01-06"), record("2025-01-01")];
    let estimate = DensityEstimate::from_first_page(&page).unwrap();
    assert_eq!(estimate.days_per_page, 9);
    assert_eq!(estimate.newest, date("2025-01-10"));
    assert_eq!(estimate.oldest_on_first_page, date("2025-01-01"));
}

#[test]
fn density_falls_back_when_dates_coincide() {
    let page = vec![record("2025-01-10"), record("2025-01-10")];
    let estimate = DensityEstimate::from_first_page(&page).unwrap();
    assert_eq!(estimate.days_per_page, 1);
}

#[test]
fn density_gives_no_estimate_without_dates() {
    assert_eq!(DensityEstimate::from_first_page(&[undated("a")]), None);
    assert_eq!(DensityEstimate::from_first_page(&[]), None);
}

#[test]
fn density_rejects_impossible_windows() {
    let page = vec![record("2024-06-30"), record("2024-01-01")];
    let estimate = DensityEstimate::from_first_page(&page).unwrap();

    let older = DateWindow::parse("2018-01-01", "2019-01-01").unwrap();
    let newer = DateWindow::parse("2024-07-01", "2024-07-31").unwrap();
    let inside = DateWindow::parse("2024-03-01", "2024-03-31").unwrap();

    assert_eq!(
        estimate.rejection(&older),
        Some(Rejection::EndsBeforeFirstPage)
    );
    assert_eq!(
        estimate.rejection(&newer),
        Some(Rejection::StartsAfterNewest)
    );
    assert_eq!(estimate.rejection(&inside), None);
}
