use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::candidate::{preview, preview_n, Candidate, Category, Confidence, Provenance, SourceKind};
use super::patterns::{PatternLibrary, FAMILY_CONNECTOR, FAMILY_DATE, FAMILY_DIMENSION, FAMILY_PART_NUMBER};

/// Part-number matches shorter than this are noise.
const MIN_PART_CHARS: usize = 6;

static SEQ_PIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z][0-9]+P[0-9]+").unwrap());

const ARROW_TOKENS: &[&str] = &["→", "->"];

fn base(
    name: String,
    category: Category,
    code: String,
    matched: String,
    line: &str,
    prov: Provenance,
    source: SourceKind,
) -> Candidate {
    Candidate {
        name,
        category,
        code,
        matched_value: matched,
        raw_text: preview(line),
        provenance: prov,
        confidence: Confidence::for_line(line),
        source,
        known: false,
        pin: None,
        pin_range: None,
        specification: None,
        quantity: None,
        description: None,
    }
}

/// Known-entity short-circuit: any catalogued code appearing in the line
/// emits a pre-authored, high-confidence candidate. Other matchers still run
/// on the rest of the line but skip the exact catalogued code.
pub fn known_entities(
    line: &str,
    prov: Provenance,
    source: SourceKind,
    lib: &PatternLibrary,
    out: &mut Vec<Candidate>,
) {
    for entity in lib.known_entities() {
        if line.contains(entity.code) {
            let mut c = base(
                entity.name.to_string(),
                entity.category,
                entity.code.to_string(),
                entity.code.to_string(),
                line,
                prov,
                source,
            );
            c.confidence = Confidence::High;
            c.known = true;
            c.description = Some(entity.description.to_string());
            out.push(c);
        }
    }
}

/// Connector codes: C2P1 / C2-1 / J100 / X1 / S1 families plus directional
/// pin sequences. A sequence line collapses its pin run into one aggregate
/// candidate instead of one per pin.
pub fn connectors(
    line: &str,
    prov: Provenance,
    source: SourceKind,
    lib: &PatternLibrary,
    out: &mut Vec<Candidate>,
) {
    let Some(family) = lib.family(FAMILY_CONNECTOR) else {
        return;
    };

    let sequence = sequence_candidate(line, prov, source);
    let suppress_pin_codes = sequence.is_some();
    if let Some(c) = sequence {
        out.push(c);
    }

    let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
    for (idx, re) in family.patterns.iter().enumerate() {
        // The pin run already produced the aggregate for pattern 0 matches.
        if suppress_pin_codes && idx == 0 {
            continue;
        }
        for caps in re.captures_iter(line) {
            let code = caps[1].to_string();
            let pin = caps.get(2).map(|m| m.as_str().to_string());
            if lib.known(&caps[0]).is_some() {
                continue; // whole match is catalogued, already emitted
            }
            if !seen.insert((code.clone(), pin.clone())) {
                continue;
            }
            let mut c = base(
                format!("{code}连接器"),
                Category::Connector,
                code.clone(),
                caps[0].to_string(),
                line,
                prov,
                source,
            );
            c.pin = pin;
            c.description = Some(connector_function(&code, line).to_string());
            out.push(c);
        }
    }
}

/// One aggregate candidate for a directional run of pin codes
/// (e.g. "C2P1 → C2P2 → C2P5"); needs the arrow token and at least two pins.
fn sequence_candidate(line: &str, prov: Provenance, source: SourceKind) -> Option<Candidate> {
    if !ARROW_TOKENS.iter().any(|t| line.contains(t)) {
        return None;
    }
    let pins: Vec<&str> = SEQ_PIN_RE.find_iter(line).map(|m| m.as_str()).collect();
    if pins.len() < 2 {
        return None;
    }

    let split = pins[0].rfind('P').unwrap_or(0);
    let connector = &pins[0][..split];
    let numbers: Vec<u32> = pins
        .iter()
        .filter_map(|p| p.rsplit('P').next().and_then(|n| n.parse().ok()))
        .collect();
    let min = numbers.iter().min().copied()?;
    let max = numbers.iter().max().copied()?;

    let mut c = base(
        format!("{connector}连接器序列"),
        Category::Connector,
        connector.to_string(),
        pins.join(" → "),
        line,
        prov,
        source,
    );
    c.pin_range = Some(format!("{min}-{max}"));
    c.description = Some(format!("{}个针脚的连接序列", pins.len()));
    Some(c)
}

/// Context heuristic for a connector's role, from its code prefix and the
/// words around it.
fn connector_function(code: &str, context: &str) -> &'static str {
    let lower = context.to_lowercase();
    if code.starts_with('C') {
        if context.contains("发动机") || lower.contains("engine") {
            return "发动机相关连接";
        }
        if context.contains("ECU") || context.contains("电脑") {
            return "控制单元连接";
        }
        if context.contains("传感器") || lower.contains("sensor") {
            return "传感器连接";
        }
        if context.contains("电源") || lower.contains("power") {
            return "电源连接";
        }
    }
    match code.chars().next() {
        Some('J') => "跳线连接器",
        Some('X') => "特殊功能连接器",
        Some('S') => "传感器连接器",
        _ => "通用连接器",
    }
}

/// Part numbers: CA series, long numeric codes, mixed alphanumerics.
/// Catalogued codes were already emitted; bare dates are not parts.
pub fn part_numbers(
    line: &str,
    prov: Provenance,
    source: SourceKind,
    lib: &PatternLibrary,
    out: &mut Vec<Candidate>,
) {
    let Some(family) = lib.family(FAMILY_PART_NUMBER) else {
        return;
    };
    let dates = lib.family(FAMILY_DATE);

    let mut seen: HashSet<String> = HashSet::new();
    for re in &family.patterns {
        for caps in re.captures_iter(line) {
            let part = caps[1].to_string();
            if part.chars().count() < MIN_PART_CHARS {
                continue;
            }
            if lib.known(&part).is_some() {
                continue;
            }
            if dates.is_some_and(|d| d.matches_fully(&part)) {
                continue;
            }
            if !seen.insert(part.clone()) {
                continue;
            }

            let (name, category, description) = infer_part(&part);
            let mut c = base(name, category, part.clone(), part, line, prov, source);
            c.description = Some(description.to_string());
            out.push(c);
        }
    }
}

/// Pre-authored inference for the drawing set's part-number series.
fn infer_part(part: &str) -> (String, Category, &'static str) {
    if part.starts_with("CA") {
        return if part.contains("CA1251") {
            ("一汽解放J6L整车主线束".to_string(), Category::Harness, "新款J6L车型整车电气线束总成")
        } else if part.contains("CA1234") {
            ("发动机控制线束".to_string(), Category::Harness, "发动机相关传感器和执行器线束")
        } else if part.contains("CA1181") {
            ("驾驶室电气线束".to_string(), Category::Harness, "驾驶室内开关、仪表、控制面板线束")
        } else {
            (format!("零件_{}", preview_n(part, 12)), Category::Harness, "汽车电气线束组件")
        };
    }
    if part.contains("S100001") {
        return (
            "FA10气驱罐尿素系统线束".to_string(),
            Category::Harness,
            "锡柴自主FA10发动机气驱尿素罐专用线束",
        );
    }
    if part.contains("Z00231") {
        return ("整车线束图纸文件".to_string(), Category::Other, "线束设计图纸文档");
    }
    if part.contains("Q00070") {
        return ("国六排放系统线束".to_string(), Category::Harness, "国六排放后处理系统专用线束");
    }
    (format!("零件_{}", preview_n(part, 12)), Category::Other, "汽车电气线束组件")
}

/// Dimensional specs: A×B, tolerances, diameters, lengths, temperatures.
pub fn dimensions(
    line: &str,
    prov: Provenance,
    source: SourceKind,
    lib: &PatternLibrary,
    out: &mut Vec<Candidate>,
) {
    let Some(family) = lib.family(FAMILY_DIMENSION) else {
        return;
    };

    let mut seen: HashSet<String> = HashSet::new();
    for re in &family.patterns {
        for m in re.find_iter(line) {
            let spec = m.as_str().trim().to_string();
            if !seen.insert(spec.clone()) {
                continue;
            }
            let mut c = base(
                format!("规格 {spec}"),
                Category::Other,
                spec.clone(),
                spec.clone(),
                line,
                prov,
                source,
            );
            c.confidence = Confidence::High;
            c.specification = Some(spec);
            out.push(c);
        }
    }
}
