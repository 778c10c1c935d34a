use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::classify::{self, VehicleSystem};
use crate::parser::candidate::{Candidate, Category, Confidence};

/// Samples shown per group in the console report before truncating.
const SAMPLE_LIMIT: usize = 5;

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub export_time: String,
    pub total_components: usize,
    pub systems_analyzed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemBucket {
    pub components: Vec<Candidate>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportSummary {
    pub connector_count: usize,
    pub harness_count: usize,
    pub sensor_count: usize,
    pub key_systems: Vec<String>,
}

/// The JSON export contract. Grouping maps are BTreeMaps and the candidate
/// set is pre-sorted, so serialization is deterministic for a given input.
#[derive(Debug, Serialize, Deserialize)]
pub struct Export {
    pub metadata: ExportMetadata,
    pub components_by_category: BTreeMap<String, Vec<Candidate>>,
    pub systems_architecture: BTreeMap<String, SystemBucket>,
    pub summary: ExportSummary,
}

impl Export {
    pub fn category_counts(&self) -> BTreeMap<&str, usize> {
        self.components_by_category
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect()
    }

    pub fn system_counts(&self) -> BTreeMap<&str, usize> {
        self.systems_architecture
            .iter()
            .map(|(k, v)| (k.as_str(), v.count))
            .collect()
    }
}

/// Build the export structure from the merged candidate set: group by
/// category, classify into systems, tally.
pub fn build_export(components: &[Candidate]) -> Export {
    let mut by_category: BTreeMap<String, Vec<Candidate>> = Category::ALL
        .into_iter()
        .map(|c| (c.as_str().to_string(), Vec::new()))
        .collect();
    for c in components {
        by_category
            .entry(c.category.as_str().to_string())
            .or_default()
            .push(c.clone());
    }

    let mut systems: BTreeMap<String, SystemBucket> = VehicleSystem::ALL
        .into_iter()
        .map(|s| (s.as_str().to_string(), SystemBucket { components: Vec::new(), count: 0 }))
        .collect();
    for c in components {
        if let Some(system) = classify::classify(c) {
            let bucket = systems
                .entry(system.as_str().to_string())
                .or_insert_with(|| SystemBucket { components: Vec::new(), count: 0 });
            bucket.components.push(c.clone());
        }
    }
    for bucket in systems.values_mut() {
        bucket.count = bucket.components.len();
    }

    let count_of = |cat: Category| by_category.get(cat.as_str()).map_or(0, Vec::len);
    let key_systems = VehicleSystem::ALL
        .into_iter()
        .filter(|s| systems.get(s.as_str()).is_some_and(|b| b.count > 0))
        .map(|s| s.label().to_string())
        .collect();

    Export {
        metadata: ExportMetadata {
            export_time: Local::now().to_rfc3339(),
            total_components: components.len(),
            systems_analyzed: VehicleSystem::ALL.len(),
        },
        summary: ExportSummary {
            connector_count: count_of(Category::Connector),
            harness_count: count_of(Category::Harness),
            sensor_count: count_of(Category::Sensor),
            key_systems,
        },
        components_by_category: by_category,
        systems_architecture: systems,
    }
}

pub fn write_json(path: &Path, export: &Export) -> Result<()> {
    let data = serde_json::to_string_pretty(export)?;
    fs::write(path, data).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn read_json(path: &Path) -> Result<Export> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(serde_json::from_str(&data)?)
}

/// One row per deduplicated component.
pub fn write_csv(path: &Path, components: &[Candidate]) -> Result<()> {
    let mut out = String::from("name,category,code,page,line,description,spec,quantity,source\n");
    for c in components {
        let locus = c.provenance.line.or(c.provenance.row).map(|n| n.to_string());
        let row = [
            c.name.as_str(),
            c.category.label(),
            c.code.as_str(),
            &c.provenance.page.to_string(),
            locus.as_deref().unwrap_or(""),
            c.description.as_deref().unwrap_or(""),
            c.specification.as_deref().unwrap_or(""),
            c.quantity.as_deref().unwrap_or(""),
            c.source.as_str(),
        ]
        .map(csv_field)
        .join(",");
        out.push_str(&row);
        out.push('\n');
    }
    fs::write(path, out).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Console analysis report: category tallies, confidence distribution,
/// system architecture, bounded sample lists.
pub fn render(components: &[Candidate]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "元器件解析报告");
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out, "元器件总数: {}", components.len());

    let _ = writeln!(out, "\n元器件分类:");
    for category in Category::ALL {
        let members: Vec<&Candidate> =
            components.iter().filter(|c| c.category == category).collect();
        if members.is_empty() {
            continue;
        }
        let _ = writeln!(out, "  {}: {}个", category.label(), members.len());
        for c in members.iter().take(SAMPLE_LIMIT) {
            let _ = writeln!(out, "    • {} (编码: {}, 第{}页)", c.name, c.code, c.provenance.page);
        }
        if members.len() > SAMPLE_LIMIT {
            let _ = writeln!(out, "    ... 还有 {} 个", members.len() - SAMPLE_LIMIT);
        }
    }

    let _ = writeln!(out, "\n置信度分布:");
    for confidence in [Confidence::High, Confidence::Medium, Confidence::Low] {
        let n = components.iter().filter(|c| c.confidence == confidence).count();
        if n > 0 {
            let _ = writeln!(out, "  {}: {}个", confidence.label(), n);
        }
    }

    let _ = writeln!(out, "\n系统架构:");
    for system in VehicleSystem::ALL {
        let members: Vec<&Candidate> = components
            .iter()
            .filter(|c| classify::classify(c) == Some(system))
            .collect();
        if members.is_empty() {
            continue;
        }
        let _ = writeln!(out, "  {}: {}个元器件", system.label(), members.len());
    }

    // Connector series grouped by code prefix letter
    let connectors: Vec<&Candidate> =
        components.iter().filter(|c| c.category == Category::Connector).collect();
    if !connectors.is_empty() {
        let mut series: BTreeMap<char, usize> = BTreeMap::new();
        for c in &connectors {
            if let Some(prefix) = c.code.chars().next().filter(char::is_ascii_uppercase) {
                *series.entry(prefix).or_default() += 1;
            }
        }
        if !series.is_empty() {
            let _ = writeln!(out, "\n连接器系列:");
            for (prefix, n) in series {
                let _ = writeln!(out, "  {}系列: {}个", prefix, n);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::candidate::{Provenance, SourceKind};

    fn candidate(name: &str, category: Category, code: &str, page: u32) -> Candidate {
        Candidate {
            name: name.to_string(),
            category,
            code: code.to_string(),
            matched_value: code.to_string(),
            raw_text: String::new(),
            provenance: Provenance::line(page, 1),
            confidence: Confidence::High,
            source: SourceKind::Text,
            known: false,
            pin: None,
            pin_range: None,
            specification: None,
            quantity: None,
            description: None,
        }
    }

    fn sample() -> Vec<Candidate> {
        vec![
            candidate("C2连接器", Category::Connector, "C2", 1),
            candidate("J100连接器", Category::Connector, "J100", 2),
            candidate("一汽解放J6L整车主线束", Category::Harness, "CA1251P62", 1),
            candidate("水温传感器", Category::Sensor, "KW_传感器_3_1", 3),
            candidate("规格 330.8±0.5", Category::Other, "330.8±0.5", 3),
        ]
    }

    #[test]
    fn export_counts() {
        let export = build_export(&sample());
        assert_eq!(export.metadata.total_components, 5);
        assert_eq!(export.summary.connector_count, 2);
        assert_eq!(export.summary.harness_count, 1);
        assert_eq!(export.summary.sensor_count, 1);
        // Both connectors and the harness classify as electrical
        assert_eq!(export.systems_architecture["electrical"].count, 3);
        // Unclassified spec candidate appears in category tallies only
        assert_eq!(export.category_counts()["other"], 1);
        let assigned: usize = export.system_counts().values().sum();
        assert_eq!(assigned, 3);
    }

    #[test]
    fn all_categories_and_systems_present_as_keys() {
        let export = build_export(&[]);
        assert_eq!(export.components_by_category.len(), Category::ALL.len());
        assert_eq!(export.systems_architecture.len(), VehicleSystem::ALL.len());
        assert!(export.summary.key_systems.is_empty());
    }

    #[test]
    fn json_round_trip_preserves_counts() {
        let export = build_export(&sample());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        write_json(&path, &export).unwrap();
        let reloaded = read_json(&path).unwrap();

        assert_eq!(reloaded.metadata.total_components, export.metadata.total_components);
        assert_eq!(reloaded.category_counts(), export.category_counts());
        assert_eq!(reloaded.system_counts(), export.system_counts());
    }

    #[test]
    fn grouping_is_deterministic() {
        let a = build_export(&sample());
        let b = build_export(&sample());
        assert_eq!(
            serde_json::to_string(&a.components_by_category).unwrap(),
            serde_json::to_string(&b.components_by_category).unwrap()
        );
        assert_eq!(
            serde_json::to_string(&a.systems_architecture).unwrap(),
            serde_json::to_string(&b.systems_architecture).unwrap()
        );
    }

    #[test]
    fn csv_escapes_fields() {
        let mut c = candidate("带,逗号", Category::Other, "X1", 1);
        c.description = Some("he said \"ok\"".to_string());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&path, &[c]).unwrap();
        let data = fs::read_to_string(&path).unwrap();
        assert!(data.contains("\"带,逗号\""));
        assert!(data.contains("\"he said \"\"ok\"\"\""));
        assert!(data.starts_with("name,category,code,page,line"));
    }

    #[test]
    fn report_truncates_samples() {
        let many: Vec<Candidate> = (0..8)
            .map(|i| candidate(&format!("连接器{i}"), Category::Connector, &format!("C{i}"), 1))
            .collect();
        let text = render(&many);
        assert!(text.contains("连接器: 8个"));
        assert!(text.contains("... 还有 3 个"));
    }
}
