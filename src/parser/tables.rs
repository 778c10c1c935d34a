use super::candidate::{preview, Candidate, Category, Confidence, Provenance, SourceKind};
use crate::source::Table;

// Header substrings that identify a column's semantic field, checked
// case-insensitively in this order.
const NAME_HINTS: &[&str] = &["名称", "name", "desc"];
const CODE_HINTS: &[&str] = &["代号", "代码", "code", "编号"];
const PART_HINTS: &[&str] = &["零件号", "part", "型号"];
const TYPE_HINTS: &[&str] = &["类型", "type", "类别"];
const SPEC_HINTS: &[&str] = &["规格", "spec", "参数"];
const QTY_HINTS: &[&str] = &["数量", "qty", "quantity"];
const NOTE_HINTS: &[&str] = &["备注", "note", "comment"];

#[derive(Default)]
struct RowFields {
    name: Option<String>,
    code: Option<String>,
    part_number: Option<String>,
    kind: Option<String>,
    spec: Option<String>,
    quantity: Option<String>,
    description: Option<String>,
}

/// Table-row matcher. The first row is the header; each following row is
/// mapped to semantic fields by header substring hints and yields a
/// candidate only when it resolves a name or code. Empty grids and ragged
/// rows degrade to fewer fields, never to an error.
pub fn extract(table: &Table, page: u32) -> Vec<Candidate> {
    let Some(header) = table.first() else {
        return Vec::new();
    };
    if header.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    for (offset, row) in table.iter().skip(1).enumerate() {
        let row_number = offset as u32 + 1;
        let fields = map_row(header, row);

        if fields.name.is_none() && fields.code.is_none() {
            continue;
        }

        let code = fields
            .code
            .or(fields.part_number)
            .unwrap_or_else(|| format!("TABLE_{page}_{row_number}"));
        let name = fields.name.unwrap_or_else(|| code.clone());
        let category = fields.kind.map(|k| Category::from_text(&k)).unwrap_or(Category::Other);

        let row_text: Vec<String> =
            row.iter().flatten().filter(|c| !c.is_empty()).cloned().collect();
        let row_text = row_text.join(" | ");

        out.push(Candidate {
            matched_value: name.clone(),
            name,
            category,
            code,
            raw_text: preview(&row_text),
            provenance: Provenance::row(page, row_number),
            confidence: Confidence::for_line(&row_text),
            source: SourceKind::Table,
            known: false,
            pin: None,
            pin_range: None,
            specification: fields.spec,
            quantity: fields.quantity,
            description: fields.description,
        });
    }

    out
}

/// Cells beyond the header width are ignored; missing or empty cells leave
/// their field unset.
fn map_row(header: &[Option<String>], row: &[Option<String>]) -> RowFields {
    let mut fields = RowFields::default();

    for (col, cell) in row.iter().enumerate().take(header.len()) {
        let Some(value) = cell.as_deref().map(str::trim).filter(|v| !v.is_empty()) else {
            continue;
        };
        let Some(column) = header[col].as_deref() else {
            continue;
        };
        let column = column.to_lowercase();

        let slot = if NAME_HINTS.iter().any(|h| column.contains(h)) {
            &mut fields.name
        } else if CODE_HINTS.iter().any(|h| column.contains(h)) {
            &mut fields.code
        } else if PART_HINTS.iter().any(|h| column.contains(h)) {
            &mut fields.part_number
        } else if TYPE_HINTS.iter().any(|h| column.contains(h)) {
            &mut fields.kind
        } else if SPEC_HINTS.iter().any(|h| column.contains(h)) {
            &mut fields.spec
        } else if QTY_HINTS.iter().any(|h| column.contains(h)) {
            &mut fields.quantity
        } else if NOTE_HINTS.iter().any(|h| column.contains(h)) {
            &mut fields.description
        } else {
            continue;
        };
        slot.get_or_insert_with(|| value.to_string());
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some((*v).to_string())).collect()
    }

    #[test]
    fn named_row_yields_candidate() {
        let table = vec![cells(&["名称", "零件号"]), cells(&["尿素泵", "S100001"])];
        let out = extract(&table, 4);
        assert_eq!(out.len(), 1);
        let c = &out[0];
        assert_eq!(c.name, "尿素泵");
        assert!(c.code.contains("S100001"));
        assert_eq!(c.source, SourceKind::Table);
        assert_eq!(c.provenance.page, 4);
        assert_eq!(c.provenance.row, Some(1));
    }

    #[test]
    fn empty_grid_yields_nothing() {
        let table: Table = vec![vec![]];
        assert!(extract(&table, 1).is_empty());
        let table: Table = vec![];
        assert!(extract(&table, 1).is_empty());
    }

    #[test]
    fn row_without_name_or_code_skipped() {
        let table = vec![cells(&["规格", "数量"]), cells(&["12V", "3"])];
        assert!(extract(&table, 1).is_empty());
    }

    #[test]
    fn ragged_row_cells_beyond_header_ignored() {
        let table = vec![
            cells(&["名称", "数量"]),
            cells(&["主继电器", "2", "多余", "单元格"]),
        ];
        let out = extract(&table, 1);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "主继电器");
        assert_eq!(out[0].quantity.as_deref(), Some("2"));
    }

    #[test]
    fn null_cells_tolerated() {
        let table = vec![
            cells(&["名称", "代号", "备注"]),
            vec![Some("起动机继电器".to_string()), None, Some("".to_string())],
        ];
        let out = extract(&table, 1);
        assert_eq!(out.len(), 1);
        // No code cell: synthetic code from page/row
        assert_eq!(out[0].code, "TABLE_1_1");
        assert!(out[0].description.is_none());
    }

    #[test]
    fn type_cell_maps_into_category() {
        let table = vec![
            cells(&["名称", "类型"]),
            cells(&["水温传感器", "传感器"]),
            cells(&["未知件", "特殊"]),
        ];
        let out = extract(&table, 1);
        assert_eq!(out[0].category, Category::Sensor);
        assert_eq!(out[1].category, Category::Other);
    }

    #[test]
    fn english_headers_match_case_insensitively() {
        let table = vec![cells(&["Name", "Part No."]), cells(&["fuel pump", "FP10023"])];
        let out = extract(&table, 2);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "fuel pump");
        assert_eq!(out[0].code, "FP10023");
    }
}
