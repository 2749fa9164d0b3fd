use chrono::NaiveDate;
use harvester_core::ListingId;
use harvester_engine::{
    decode_page, Extractor, FailureKind, FieldSelector, ListingSource, RecordSelectors,
    SelectorExtractor,
};
use pretty_assertions::assert_eq;
use serde_json::json;

const PAGE: &str = r#"
<html><body>
  <ul class="reviews">
    <li class="review">
      <span class="date"> March 9,
        2024 </span>
      <h3 class="title">Great tool</h3>
      <a class="author" href="/users/ann">Ann</a>
    </li>
    <li class="review">
      <span class="date">1 March 2024</span>
      <a class="author" href="/users/bo">Bo</a>
    </li>
    <li class="review">
      <span class="date">yesterday</span>
      <h3 class="title">Meh</h3>
    </li>
  </ul>
</body></html>
"#;

fn selectors() -> RecordSelectors {
    RecordSelectors {
        item: "li.review".to_string(),
        date: ".date".to_string(),
        date_attribute: None,
        fields: vec![
            FieldSelector {
                name: "title".to_string(),
                selector: ".title".to_string(),
                attribute: None,
            },
            FieldSelector {
                name: "author".to_string(),
                selector: "a.author".to_string(),
                attribute: Some("href".to_string()),
            },
        ],
    }
}

fn day(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

#[test]
fn extracts_one_record_per_item_in_page_order() {
    let extractor = SelectorExtractor::new(&selectors()).unwrap();

    let records = extractor.extract(PAGE);

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].date, day(2024, 3, 9));
    assert_eq!(
        records[0].payload,
        json!({ "date": "March 9, 2024", "title": "Great tool", "author": "/users/ann" })
    );
    assert_eq!(records[1].date, day(2024, 3, 1));
    assert_eq!(
        records[1].payload,
        json!({ "date": "1 March 2024", "title": null, "author": "/users/bo" })
    );
}

#[test]
fn unparseable_date_leaves_record_undated() {
    let extractor = SelectorExtractor::new(&selectors()).unwrap();

    let records = extractor.extract(PAGE);

    assert_eq!(records[2].date, None);
    assert_eq!(records[2].payload["date"], json!("yesterday"));
}

#[test]
fn date_can_come_from_an_attribute() {
    let html = r#"
      <div class="item"><time datetime="2023-11-05">two weeks ago</time></div>
      <div class="item"><time>no attribute</time></div>
    "#;
    let selectors = RecordSelectors {
        item: "div.item".to_string(),
        date: "time".to_string(),
        date_attribute: Some("datetime".to_string()),
        fields: Vec::new(),
    };

    let records = SelectorExtractor::new(&selectors).unwrap().extract(html);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].date, day(2023, 11, 5));
    assert_eq!(records[1].date, None);
    assert_eq!(records[1].payload, json!({ "date": null }));
}

#[test]
fn page_without_items_yields_no_records() {
    let extractor = SelectorExtractor::new(&selectors()).unwrap();
    assert!(extractor.extract("<html><body><p>No reviews yet</p></body></html>").is_empty());
}

#[test]
fn invalid_selector_is_reported() {
    let mut bad = selectors();
    bad.fields[0].selector = "h3[".to_string();

    let err = SelectorExtractor::new(&bad).err().unwrap();
    assert_eq!(err.selector, "h3[");
}

#[test]
fn page_url_fills_placeholders() {
    let source = ListingSource {
        url_template: "https://reviews.example.com/p/{listing}/reviews?page={page}".to_string(),
        selectors: selectors(),
    };

    let url = source.page_url(&ListingId::new("acme-widgets"), 12).unwrap();
    assert_eq!(
        url.as_str(),
        "https://reviews.example.com/p/acme-widgets/reviews?page=12"
    );

    let no_page = ListingSource {
        url_template: "https://reviews.example.com/p/{listing}".to_string(),
        selectors: selectors(),
    };
    let err = no_page.page_url(&ListingId::new("acme"), 1).unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}

#[test]
fn decode_respects_charset_header() {
    let bytes = b"<p>caf\xe9</p>";
    let page = decode_page(bytes, Some("text/html; charset=ISO-8859-1")).unwrap();
    assert_eq!(page.html, "<p>café</p>");
    assert_eq!(page.encoding_label, "windows-1252");
}

#[test]
fn decode_uses_meta_charset_without_header() {
    let bytes = b"<html><head><meta charset=\"windows-1252\"></head><p>\xe9t\xe9</p>";
    let page = decode_page(bytes, Some("text/html")).unwrap();
    assert!(page.html.contains("été"));
}

#[test]
fn decode_handles_utf8_bom() {
    let page = decode_page(b"\xef\xbb\xbf<p>ok</p>", None).unwrap();
    assert_eq!(page.html, "<p>ok</p>");
    assert_eq!(page.encoding_label, "UTF-8");
}
