use harvester_core::Record;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// CSS selectors describing where records live on a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSelectors {
    /// Matches one element per record.
    pub item: String,
    /// Relative to the item; the element holding the record date.
    pub date: String,
    /// Read the date from this attribute instead of the element text.
    #[serde(default)]
    pub date_attribute: Option<String>,
    /// Extra payload fields, also relative to the item.
    #[serde(default)]
    pub fields: Vec<FieldSelector>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelector {
    pub name: String,
    pub selector: String,
    #[serde(default)]
    pub attribute: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid selector `{selector}`: {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

/// Turns a decoded page into records.
pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str) -> Vec<Record>;
}

struct Field {
    name: String,
    selector: Selector,
    attribute: Option<String>,
}

/// Extractor driven by [`RecordSelectors`].
///
/// Every record payload is a JSON object with the raw `date` text plus one entry per
/// configured field (`null` when the field is absent on that item).
pub struct SelectorExtractor {
    item: Selector,
    date: Selector,
    date_attribute: Option<String>,
    fields: Vec<Field>,
}

impl SelectorExtractor {
    pub fn new(selectors: &RecordSelectors) -> Result<Self, SelectorError> {
        let fields = selectors
            .fields
            .iter()
            .map(|field| {
                Ok(Field {
                    name: field.name.clone(),
                    selector: compile(&field.selector)?,
                    attribute: field.attribute.clone(),
                })
            })
            .collect::<Result<Vec<_>, SelectorError>>()?;

        Ok(Self {
            item: compile(&selectors.item)?,
            date: compile(&selectors.date)?,
            date_attribute: selectors.date_attribute.clone(),
            fields,
        })
    }
}

impl Extractor for SelectorExtractor {
    fn extract(&self, html: &str) -> Vec<Record> {
        let doc = Html::parse_document(html);
        doc.select(&self.item)
            .map(|item| {
                let date_text = read(item, &self.date, self.date_attribute.as_deref());

                let mut payload = Map::new();
                payload.insert(
                    "date".to_string(),
                    date_text.clone().map_or(Value::Null, Value::String),
                );
                for field in &self.fields {
                    let value = read(item, &field.selector, field.attribute.as_deref());
                    payload.insert(field.name.clone(), value.map_or(Value::Null, Value::String));
                }

                Record::with_date_text(date_text.as_deref(), Value::Object(payload))
            })
            .collect()
    }
}

fn compile(selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|err| SelectorError {
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

fn read(item: ElementRef<'_>, selector: &Selector, attribute: Option<&str>) -> Option<String> {
    let node = item.select(selector).next()?;
    let text = match attribute {
        Some(name) => node.value().attr(name)?.to_string(),
        None => node.text().collect::<Vec<_>>().join(" "),
    };
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}
