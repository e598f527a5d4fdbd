pub mod cell;
pub mod fixes;
pub mod table;

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::FundError;

/// Table sections that carry nothing worth keeping.
const IGNORE_TABLES: &[&str] = &[
    "Performance",
    "Morningstar Sustainability Rating",
    "Current Investment Style",
];

/// Table sections whose second row holds column headings.
const HAS_COLUMN_HEADINGS: &[&str] = &[
    "Financial Year Returns",
    "Trailing Year Returns",
    "Risk Analysis",
];

/// Star-rating images rendered as digits before parsing, so ratings land in
/// cells as plain numbers.
const STAR_IMAGES: &[(&str, &str)] = &[
    (r#"<img src="/Content/images/5starscropped.gif" alt="5" />"#, "5"),
    (r#"<img src="/Content/images/4starscropped.gif" alt="4" />"#, "4"),
    (r#"<img src="/Content/images/3starscropped.gif" alt="3" />"#, "3"),
    (r#"<img src="/Content/images/2starscropped.gif" alt="2" />"#, "2"),
    (r#"<img src="/Content/images/1starscropped.gif" alt="1" />"#, "1"),
];

// The report page flags an unknown fund with a class=red error element.
static MISSING_FUND_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".red").unwrap());
static FUND_NAME_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".YMWCoyFull").unwrap());
static TABLE_SECTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".YMWTableSmall").unwrap());

/// Assemble one fund document from a report page.
///
/// Extracts every recognized table section into a flat object stored under
/// the table's name, next to the fixed identity fields.
pub fn assemble_document(
    html: &str,
    symbol: &str,
    url: &str,
) -> Result<Map<String, Value>, FundError> {
    let markup = substitute_markup(html);
    let doc = Html::parse_document(&markup);

    if doc.select(&MISSING_FUND_SEL).next().is_some() {
        return Err(FundError::NotFound {
            code: symbol.to_string(),
        });
    }

    let name: String = doc
        .select(&FUND_NAME_SEL)
        .next()
        .map(|e| e.text().collect())
        .unwrap_or_default();

    let mut fund = Map::new();
    fund.insert("_id".to_string(), Value::String(symbol.to_string()));
    fund.insert("Symbol".to_string(), Value::String(symbol.to_string()));
    fund.insert("URL".to_string(), Value::String(url.to_string()));
    fund.insert("Name".to_string(), Value::String(name));

    for section in doc.select(&TABLE_SECTION_SEL) {
        let table_name = table::table_name(section);
        if IGNORE_TABLES.contains(&table_name.as_str()) {
            debug!(table = %table_name, "ignored");
            continue;
        }
        debug!(table = %table_name, "processing");

        let headings = HAS_COLUMN_HEADINGS
            .contains(&table_name.as_str())
            .then(|| table::column_headings(section));
        let records = table::extract_table(section, headings.as_deref());
        let fixed = fixes::apply(&table_name, records);
        fund.insert(table_name, Value::Object(fixes::flatten(fixed)));
    }

    Ok(fund)
}

/// Literal pre-parse substitutions: star-rating images become their digit,
/// line breaks become a single space.
fn substitute_markup(html: &str) -> String {
    let mut out = html.to_string();
    for (img, digit) in STAR_IMAGES {
        out = out.replace(img, digit);
    }
    out.replace("<br />", " ")
}
