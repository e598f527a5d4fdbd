use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::cell::{self, CellValue};

static TR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static TD_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// One extracted row: an ordered key/value list. Order is significant, the
/// Trailing Year Returns fixer inspects entries by position.
pub type Record = Vec<(String, CellValue)>;

/// The table name lives in the first cell of the first row.
pub fn table_name(table: ElementRef) -> String {
    table
        .select(&TR_SEL)
        .next()
        .and_then(|row| row.select(&TD_SEL).next())
        .map(|td| cell::normalize(&element_text(td)).key_string())
        .unwrap_or_default()
}

/// Column headings live in the second row, first column excluded. Only
/// called for tables known to carry headings.
pub fn column_headings(table: ElementRef) -> Vec<String> {
    table
        .select(&TR_SEL)
        .nth(1)
        .map(|row| {
            row_cells(row)
                .skip(1)
                .map(|c| cell::normalize(&element_text(c)).key_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Walk a table section into one record per row.
///
/// Skips the title row (and the heading row when headings apply), drops rows
/// whose `td` cells are all empty, and assigns cells left to right into the
/// next unfilled column slot so a spanning cell never overwrites a neighbor.
pub fn extract_table(table: ElementRef, headings: Option<&[String]>) -> Vec<Record> {
    let offset = if headings.is_some() { 2 } else { 1 };
    let mut records = Vec::new();

    for row in table.select(&TR_SEL).skip(offset) {
        if is_empty_row(row) {
            continue;
        }

        let mut slots: Vec<Option<CellValue>> = Vec::new();
        assign_cells(
            &mut slots,
            row_cells(row).map(|c| cell::normalize(&element_text(c))),
        );
        let values: Vec<CellValue> = slots
            .into_iter()
            .map(|slot| slot.unwrap_or(CellValue::Null))
            .collect();

        records.push(row_record(&values, headings));
    }

    records
}

/// Place each cell value into the next unfilled slot, skipping slots already
/// occupied (e.g. by a merged cell spanning from a previous column).
pub(crate) fn assign_cells(
    slots: &mut Vec<Option<CellValue>>,
    values: impl IntoIterator<Item = CellValue>,
) {
    let mut cursor = 0;
    for value in values {
        while cursor < slots.len() && slots[cursor].is_some() {
            cursor += 1;
        }
        if cursor < slots.len() {
            slots[cursor] = Some(value);
        } else {
            slots.push(Some(value));
        }
        cursor += 1;
    }
}

/// Key composition per row: without headings `{row[0]: row[1]}`; with
/// headings, one entry per data cell keyed "<row key> <heading>".
fn row_record(values: &[CellValue], headings: Option<&[String]>) -> Record {
    let key = values
        .first()
        .map(CellValue::key_string)
        .unwrap_or_default();

    match headings {
        None => vec![(key, values.get(1).cloned().unwrap_or(CellValue::Null))],
        Some(headings) => headings
            .iter()
            .zip(values.iter().skip(1))
            .map(|(heading, value)| (format!("{} {}", key, heading), value.clone()))
            .collect(),
    }
}

fn is_empty_row(row: ElementRef) -> bool {
    row.select(&TD_SEL)
        .all(|td| cell::cleaned_text(&element_text(td)).is_empty())
}

fn row_cells(row: ElementRef) -> impl Iterator<Item = ElementRef<'_>> {
    row.children().filter_map(ElementRef::wrap).filter(|e| {
        let name = e.value().name();
        name == "td" || name == "th"
    })
}

fn element_text(element: ElementRef) -> String {
    element.text().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn parse(table_html: &str) -> Html {
        Html::parse_document(&format!("<html><body>{}</body></html>", table_html))
    }

    fn first_table(doc: &Html) -> ElementRef<'_> {
        let sel = Selector::parse("table").unwrap();
        doc.select(&sel).next().unwrap()
    }

    #[test]
    fn name_from_first_cell() {
        let doc = parse(
            "<table><tr><td>Asset Allocation</td></tr><tr><td>Equity</td><td>60</td></tr></table>",
        );
        assert_eq!(table_name(first_table(&doc)), "Asset Allocation");
    }

    #[test]
    fn name_missing_cell_is_empty() {
        let doc = parse("<table></table>");
        assert_eq!(table_name(first_table(&doc)), "");
    }

    #[test]
    fn headings_skip_first_column() {
        let doc = parse(
            "<table>\
             <tr><td>Financial Year Returns</td></tr>\
             <tr><td></td><td>2022</td><td>2023</td></tr>\
             </table>",
        );
        assert_eq!(column_headings(first_table(&doc)), vec!["2022", "2023"]);
    }

    #[test]
    fn non_heading_composition() {
        let doc = parse(
            "<table>\
             <tr><td>Quick Facts</td></tr>\
             <tr><td>Category</td><td>Equity</td></tr>\
             </table>",
        );
        let records = extract_table(first_table(&doc), None);
        assert_eq!(
            records,
            vec![vec![(
                "Category".to_string(),
                CellValue::Text("Equity".into())
            )]]
        );
    }

    #[test]
    fn heading_aware_composition() {
        let doc = parse(
            "<table>\
             <tr><td>Risk Analysis</td></tr>\
             <tr><td></td><td>A</td><td>B</td></tr>\
             <tr><td>Fund X</td><td>1</td><td>2</td></tr>\
             </table>",
        );
        let headings = column_headings(first_table(&doc));
        let records = extract_table(first_table(&doc), Some(&headings));
        assert_eq!(
            records,
            vec![vec![
                ("Fund X A".to_string(), CellValue::Number(1.0)),
                ("Fund X B".to_string(), CellValue::Number(2.0)),
            ]]
        );
    }

    #[test]
    fn fully_empty_row_dropped() {
        let doc = parse(
            "<table>\
             <tr><td>Quick Facts</td></tr>\
             <tr><td> </td><td></td></tr>\
             <tr><td>Category</td><td>Equity</td></tr>\
             </table>",
        );
        let records = extract_table(first_table(&doc), None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0][0].0, "Category");
    }

    #[test]
    fn extra_cells_beyond_headings_dropped() {
        let doc = parse(
            "<table>\
             <tr><td>Risk Analysis</td></tr>\
             <tr><td></td><td>A</td></tr>\
             <tr><td>Fund X</td><td>1</td><td>2</td></tr>\
             </table>",
        );
        let headings = column_headings(first_table(&doc));
        let records = extract_table(first_table(&doc), Some(&headings));
        assert_eq!(
            records,
            vec![vec![("Fund X A".to_string(), CellValue::Number(1.0))]]
        );
    }

    #[test]
    fn occupied_slot_advances_cursor() {
        let mut slots = vec![None, Some(CellValue::Number(9.0)), None];
        assign_cells(
            &mut slots,
            vec![
                CellValue::Text("a".into()),
                CellValue::Text("b".into()),
                CellValue::Text("c".into()),
            ],
        );
        assert_eq!(
            slots,
            vec![
                Some(CellValue::Text("a".into())),
                Some(CellValue::Number(9.0)),
                Some(CellValue::Text("b".into())),
                Some(CellValue::Text("c".into())),
            ]
        );
    }

    #[test]
    fn single_cell_row_maps_to_null() {
        let doc = parse(
            "<table>\
             <tr><td>Quick Stats</td></tr>\
             <tr><td>Exit Price</td></tr>\
             </table>",
        );
        let records = extract_table(first_table(&doc), None);
        assert_eq!(
            records,
            vec![vec![("Exit Price".to_string(), CellValue::Null)]]
        );
    }
}
