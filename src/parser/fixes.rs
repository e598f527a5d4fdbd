//! Per-table correction rules.
//!
//! Some report tables come out of the generic row extraction in the wrong
//! shape: labels glued to values in one cell, spacer rows, rank fractions
//! packed into a single string. Each rule here repairs one named table; every
//! other table passes through untouched.

use serde_json::{Map, Value};

use super::cell::{self, CellValue};
use super::table::Record;

/// Separator between a Quick Stats label and its value, as rendered by the
/// report markup (newline plus indentation inside one cell).
const QUICK_STATS_SEP: &str = "\n                        ";

/// Length of the "as at" label prefix on date rows.
const AS_AT_PREFIX_LEN: usize = 5;

/// Length of the repeated asset-class prefix ("Equity ") on both halves of
/// the investment style cell.
const STYLE_PREFIX_LEN: usize = 7;

/// Dispatch on the table name; unlisted names are returned unchanged.
pub fn apply(name: &str, records: Vec<Record>) -> Vec<Record> {
    match name {
        "Current Investment Style" => fix_investment_style(records),
        "Quick Stats" => fix_quick_stats(records),
        "Asset Allocation" => fix_asset_allocation(records),
        "Fees & Expenses" => fix_fees_and_expenses(records),
        "Trailing Year Returns" => fix_trailing_year_returns(records),
        _ => records,
    }
}

/// Merge an ordered sequence of records into one flat object; later
/// duplicate keys overwrite earlier ones.
pub fn flatten(records: Vec<Record>) -> Map<String, Value> {
    let mut out = Map::new();
    for record in records {
        for (key, value) in record {
            out.insert(key, value.into());
        }
    }
    out
}

/// "as at 30 Jun 2024" row -> {"As at": "30 Jun 2024"}.
fn as_at_record(record: &Record) -> Record {
    let key = record
        .first()
        .map(|(k, _)| k.trim())
        .unwrap_or_default();
    let value = skip_chars(key, AS_AT_PREFIX_LEN).trim().to_string();
    vec![("As at".to_string(), CellValue::Text(value))]
}

/// Row 0 is the date, row 1 a style-box spacer, row 2 holds both the market
/// cap and the investment style in one double-space-separated cell. Rows
/// past the third carry no data.
fn fix_investment_style(records: Vec<Record>) -> Vec<Record> {
    let mut result = Vec::new();
    for (i, record) in records.iter().enumerate() {
        match i {
            0 => result.push(as_at_record(record)),
            1 => {}
            2 => {
                let key = record
                    .first()
                    .map(|(k, _)| k.replace('\u{a0}', " "))
                    .unwrap_or_default();
                let mut parts = key.split("  ");
                let market_cap = parts.next().unwrap_or_default();
                let style = parts.next().unwrap_or_default();
                result.push(vec![(
                    "Market Cap".to_string(),
                    CellValue::Text(skip_chars(market_cap, STYLE_PREFIX_LEN).to_string()),
                )]);
                result.push(vec![(
                    "Investment Style".to_string(),
                    CellValue::Text(skip_chars(style, STYLE_PREFIX_LEN).to_string()),
                )]);
            }
            _ => {}
        }
    }
    result
}

/// Every row after the date packs "<label>\n <value>" into its key.
fn fix_quick_stats(records: Vec<Record>) -> Vec<Record> {
    let mut result = Vec::new();
    for (i, record) in records.iter().enumerate() {
        if i == 0 {
            result.push(as_at_record(record));
            continue;
        }
        let key = record
            .first()
            .map(|(k, _)| k.as_str())
            .unwrap_or_default();
        let mut parts = key.split(QUICK_STATS_SEP);
        let label = parts.next().unwrap_or_default().to_string();
        let value = parts
            .next()
            .map(|v| CellValue::Text(v.to_string()))
            .unwrap_or(CellValue::Null);
        result.push(vec![(label, value)]);
    }
    result
}

fn fix_asset_allocation(records: Vec<Record>) -> Vec<Record> {
    let mut result = Vec::new();
    for (i, record) in records.into_iter().enumerate() {
        if i == 0 {
            result.push(as_at_record(&record));
        } else {
            result.push(record);
        }
    }
    result
}

/// Drop the "One-Time" / "Annual" group header rows.
fn fix_fees_and_expenses(records: Vec<Record>) -> Vec<Record> {
    records
        .into_iter()
        .filter(|record| {
            let key = record
                .first()
                .map(|(k, _)| k.trim())
                .unwrap_or_default();
            key != "One-Time" && key != "Annual"
        })
        .collect()
}

/// Rank entries render as "position / total" in the fourth column. Split
/// them into two numeric fields alongside the original entry.
fn fix_trailing_year_returns(records: Vec<Record>) -> Vec<Record> {
    records
        .into_iter()
        .map(|mut record| {
            let rank = record.get(3).and_then(|(key, value)| {
                if value.is_null() {
                    return None;
                }
                let key = key.trim();
                if !key.contains("Rank") {
                    return None;
                }
                Some((key.to_string(), value.key_string()))
            });

            if let Some((key, raw)) = rank {
                let mut parts = raw.trim().split(" / ");
                let position = rank_number(parts.next());
                let total = rank_number(parts.next());
                record.push((format!("{} Position", key), position));
                record.push((format!("{} Total", key), total));
            }

            record
        })
        .collect()
}

fn rank_number(part: Option<&str>) -> CellValue {
    part.and_then(cell::parse_number)
        .map(CellValue::Number)
        .unwrap_or(CellValue::Null)
}

/// Character-based prefix strip; short inputs collapse to "".
fn skip_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[idx..],
        None => "",
    }
}
