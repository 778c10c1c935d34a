pub mod candidate;
pub mod codes;
pub mod keywords;
pub mod patterns;
pub mod tables;

use candidate::{Candidate, Provenance, SourceKind};
use patterns::PatternLibrary;

use crate::source::PageContent;

/// Extract all raw candidates from one page: text lines in order, then
/// table grids. Pure; dedup happens later in a single sequential reducer.
pub fn extract_page(page: &PageContent, lib: &PatternLibrary) -> Vec<Candidate> {
    let mut out = Vec::new();

    for (idx, raw) in page.text.lines().enumerate() {
        let prov = Provenance::line(page.page_number, idx as u32 + 1);
        out.extend(extract_line(raw.trim(), prov, SourceKind::Text, lib));
    }

    for table in &page.tables {
        out.extend(tables::extract(table, page.page_number));
    }

    out
}

/// Matchers over one source line, in fixed policy order: known entities,
/// connector codes, part numbers, dimensional specs, then the keyword
/// dictionary. Lines too short to carry a component are skipped.
pub fn extract_line(
    line: &str,
    prov: Provenance,
    source: SourceKind,
    lib: &PatternLibrary,
) -> Vec<Candidate> {
    if line.chars().count() < 2 {
        return Vec::new();
    }

    let mut out = Vec::new();
    codes::known_entities(line, prov, source, lib, &mut out);
    codes::connectors(line, prov, source, lib, &mut out);
    codes::part_numbers(line, prov, source, lib, &mut out);
    codes::dimensions(line, prov, source, lib, &mut out);
    out.extend(keywords::extract(line, prov, source, lib));
    out
}

/// Recognized text of one page image: the same line matchers, with
/// image-tagged provenance.
pub fn extract_ocr_text(
    text: &str,
    page: u32,
    image: u32,
    lib: &PatternLibrary,
) -> Vec<Candidate> {
    text.lines()
        .enumerate()
        .flat_map(|(idx, raw)| {
            let prov = Provenance::ocr(page, image, idx as u32 + 1);
            extract_line(raw.trim(), prov, SourceKind::Ocr, lib)
        })
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use candidate::Category;
    use crate::source::{DocumentSource, DumpSource};

    fn lib() -> PatternLibrary {
        PatternLibrary::new()
    }

    #[test]
    fn ecu_connector_line_scenario() {
        let out = extract_line(
            "发动机控制单元ECU连接器C2P1",
            Provenance::line(3, 5),
            SourceKind::Text,
            &lib(),
        );

        let conn = out
            .iter()
            .find(|c| c.category == Category::Connector && c.code == "C2" && c.pin.is_some())
            .expect("connector candidate with pin");
        assert_eq!(conn.pin.as_deref(), Some("1"));

        assert!(out
            .iter()
            .any(|c| c.category == Category::Module && c.matched_value == "ECU"));
        assert!(out
            .iter()
            .any(|c| c.category == Category::Connector && c.matched_value == "连接器"));

        assert!(out.iter().all(|c| c.provenance.page == 3));
        assert!(out.iter().all(|c| c.provenance.line == Some(5)));
    }

    #[test]
    fn known_entity_short_circuit() {
        let out = extract_line(
            "装配FA10发动机总成示意",
            Provenance::line(1, 1),
            SourceKind::Text,
            &lib(),
        );
        let known = out.iter().find(|c| c.known).expect("known candidate");
        assert_eq!(known.name, "锡柴自主FA10发动机");
        assert_eq!(known.category, Category::System);
        assert_eq!(known.description.as_deref(), Some("国六排放标准"));
        // The part-number matcher must not re-infer the catalogued code
        assert!(!out.iter().any(|c| c.code == "FA10" && !c.known));
    }

    #[test]
    fn category_closure() {
        let lib = lib();
        let lines = [
            "发动机控制单元ECU连接器C2P1",
            "CA1251P62K1L7T3E5_S100001_07",
            "尿素泵连接器安装在尾气排放管附近",
            "C2P1 → C2P2 → C2P5",
            "规格 330.8±0.5 控制面板",
        ];
        for line in lines {
            for c in extract_line(line, Provenance::line(1, 1), SourceKind::Text, &lib) {
                assert!(Category::ALL.contains(&c.category), "{:?}", c);
            }
        }
    }

    #[test]
    fn blank_and_tiny_lines_yield_nothing() {
        let lib = lib();
        assert!(extract_line("", Provenance::line(1, 1), SourceKind::Text, &lib).is_empty());
        assert!(extract_line("泵", Provenance::line(1, 1), SourceKind::Text, &lib).is_empty());
    }

    #[test]
    fn empty_table_page_has_no_candidates_and_no_panic() {
        let page = PageContent {
            page_number: 1,
            text: String::new(),
            tables: vec![vec![]],
        };
        assert!(extract_page(&page, &lib()).is_empty());
    }

    #[test]
    fn ocr_lines_carry_image_index() {
        let out = extract_ocr_text("尿素泵支架\n液晶显示屏", 6, 2, &lib());
        assert!(!out.is_empty());
        assert!(out
            .iter()
            .all(|c| c.provenance.image == Some(2) && c.provenance.page == 6));
        let lines: Vec<Option<u32>> = out.iter().map(|c| c.provenance.line).collect();
        assert!(lines.contains(&Some(1)));
        assert!(lines.contains(&Some(2)));
    }

    #[test]
    fn fixture_pages_extract() {
        let src =
            DumpSource::open(std::path::Path::new("tests/fixtures/j6l_pages.json")).unwrap();
        let lib = lib();
        let mut all = Vec::new();
        for n in 1..=src.page_count() as u32 {
            all.extend(extract_page(&src.page(n).unwrap(), &lib));
        }
        // Known harness code on page 1
        assert!(all.iter().any(|c| c.known && c.name == "新款J6L整车主线束"));
        // Table component on page 2
        assert!(all
            .iter()
            .any(|c| c.source == SourceKind::Table && c.name == "尿素泵"));
        // Connector sequence on page 3
        assert!(all.iter().any(|c| c.pin_range.is_some()));
    }
}
