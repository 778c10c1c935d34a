use super::candidate::{preview, preview_n, Candidate, Confidence, Provenance, SourceKind};
use super::patterns::PatternLibrary;

const FALLBACK_DESCRIPTION: &str = "汽车电气系统组件";
const CONTEXT_CHARS: usize = 50;

/// Keyword-dictionary matcher. Categories are scanned in priority order;
/// within a category the first alias found on the line wins and scanning
/// stops for that category, so a line yields at most one candidate per
/// category but may hit several distinct categories.
pub fn extract(
    line: &str,
    prov: Provenance,
    source: SourceKind,
    lib: &PatternLibrary,
) -> Vec<Candidate> {
    let mut out = Vec::new();

    for (category, aliases) in lib.categories() {
        for alias in *aliases {
            if !line.contains(alias) {
                continue;
            }
            out.push(Candidate {
                name: context_name(line, alias),
                category: *category,
                code: format!("KW_{}_{}_{}", alias, prov.page, prov.line.unwrap_or(0)),
                matched_value: (*alias).to_string(),
                raw_text: preview(line),
                provenance: prov,
                confidence: Confidence::for_line(line),
                source,
                known: false,
                pin: None,
                pin_range: None,
                specification: None,
                quantity: None,
                description: Some(
                    lib.keyword_description(alias).unwrap_or(FALLBACK_DESCRIPTION).to_string(),
                ),
            });
            break;
        }
    }

    out
}

/// Best-effort component name: a ±2-word window around the alias when the
/// line has whitespace-separated words, otherwise a bounded line prefix
/// (CJK drawing text usually has no word breaks).
fn context_name(line: &str, alias: &str) -> String {
    let words: Vec<&str> = line.split_whitespace().collect();
    if let Some(i) = words.iter().position(|w| w.contains(alias)) {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(words.len());
        return preview_n(&words[start..end].join(" "), CONTEXT_CHARS);
    }
    preview_n(line, CONTEXT_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::candidate::Category;

    fn run(line: &str) -> Vec<Candidate> {
        extract(line, Provenance::line(2, 7), SourceKind::Text, &PatternLibrary::new())
    }

    #[test]
    fn one_candidate_per_category() {
        // Two Harness aliases on one line: only the first one fires
        let out = run("整车线束与电缆布置");
        let harness: Vec<_> = out.iter().filter(|c| c.category == Category::Harness).collect();
        assert_eq!(harness.len(), 1);
        assert_eq!(harness[0].matched_value, "线束");
    }

    #[test]
    fn multiple_categories_from_one_line() {
        let out = run("尿素泵连接器安装在尾气排放管附近");
        let cats: Vec<Category> = out.iter().map(|c| c.category).collect();
        assert!(cats.contains(&Category::Connector));
        assert!(cats.contains(&Category::Pump));
        assert!(cats.contains(&Category::System));
    }

    #[test]
    fn provenance_threaded_through() {
        let out = run("温度传感器");
        assert!(!out.is_empty());
        assert!(out.iter().all(|c| c.provenance.page == 2 && c.provenance.line == Some(7)));
    }

    #[test]
    fn descriptions_attached() {
        let out = run("ECU模块");
        let module = out.iter().find(|c| c.category == Category::Module).unwrap();
        // "模块" is the first Module alias on this line
        assert_eq!(module.matched_value, "模块");
        assert_eq!(module.description.as_deref(), Some(FALLBACK_DESCRIPTION));
    }

    #[test]
    fn context_window_for_spaced_text() {
        let name = context_name("左侧 前部 连接器 安装 支架 图示", "连接器");
        assert_eq!(name, "左侧 前部 连接器 安装 支架");
    }

    #[test]
    fn context_falls_back_to_prefix() {
        let long = format!("{}连接器", "说".repeat(80));
        let name = context_name(&long, "连接器");
        assert_eq!(name.chars().count(), CONTEXT_CHARS);
    }
}
