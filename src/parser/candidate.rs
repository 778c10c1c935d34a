use serde::{Deserialize, Serialize};

/// Longest slice of the source line kept as context on a candidate.
pub const PREVIEW_CHARS: usize = 100;

/// Fine-grained component kind. Every candidate carries exactly one of
/// these; anything the matchers cannot place lands in `Other`, never
/// outside the enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Connector,
    Harness,
    Sensor,
    Switch,
    Relay,
    Fuse,
    Module,
    Motor,
    Pump,
    Valve,
    Light,
    Gauge,
    System,
    Other,
}

impl Category {
    pub const ALL: [Category; 14] = [
        Category::Connector,
        Category::Harness,
        Category::Sensor,
        Category::Switch,
        Category::Relay,
        Category::Fuse,
        Category::Module,
        Category::Motor,
        Category::Pump,
        Category::Valve,
        Category::Light,
        Category::Gauge,
        Category::System,
        Category::Other,
    ];

    /// Stable export key, also the grouping key in the JSON structure.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Connector => "connector",
            Category::Harness => "harness",
            Category::Sensor => "sensor",
            Category::Switch => "switch",
            Category::Relay => "relay",
            Category::Fuse => "fuse",
            Category::Module => "module",
            Category::Motor => "motor",
            Category::Pump => "pump",
            Category::Valve => "valve",
            Category::Light => "light",
            Category::Gauge => "gauge",
            Category::System => "system",
            Category::Other => "other",
        }
    }

    /// Display name used in the console report and the CSV export.
    pub fn label(self) -> &'static str {
        match self {
            Category::Connector => "连接器",
            Category::Harness => "线束",
            Category::Sensor => "传感器",
            Category::Switch => "开关",
            Category::Relay => "继电器",
            Category::Fuse => "保险丝",
            Category::Module => "模块",
            Category::Motor => "电机",
            Category::Pump => "泵",
            Category::Valve => "阀",
            Category::Light => "灯具",
            Category::Gauge => "仪表",
            Category::System => "系统",
            Category::Other => "其他",
        }
    }

    /// Map a free-form type cell (from a table) onto the enumeration.
    /// Unknown text falls back to `Other`.
    pub fn from_text(text: &str) -> Category {
        let t = text.trim();
        Category::ALL
            .into_iter()
            .find(|c| t == c.as_str() || t.contains(c.label()))
            .unwrap_or(Category::Other)
    }
}

/// Advisory recognition quality. Never used to drop a candidate, only to
/// rank it in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

const SHORT_LINE_CHARS: usize = 30;
const MEDIUM_LINE_CHARS: usize = 100;

impl Confidence {
    /// Shorter lines leave less room for the match to be coincidental.
    pub fn for_line(line: &str) -> Confidence {
        let len = line.chars().count();
        if len < SHORT_LINE_CHARS {
            Confidence::High
        } else if len < MEDIUM_LINE_CHARS {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Confidence::High => "高",
            Confidence::Medium => "中",
            Confidence::Low => "低",
        }
    }
}

/// Where the candidate came from: text line, table row, or OCR'd image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Text,
    Table,
    Ocr,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Text => "text",
            SourceKind::Table => "table",
            SourceKind::Ocr => "ocr",
        }
    }
}

/// Page/line/row/image coordinates of a match. Carried on every candidate
/// and never dropped downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<u32>,
}

impl Provenance {
    pub fn line(page: u32, line: u32) -> Provenance {
        Provenance { page, line: Some(line), row: None, image: None }
    }

    pub fn row(page: u32, row: u32) -> Provenance {
        Provenance { page, line: None, row: Some(row), image: None }
    }

    pub fn ocr(page: u32, image: u32, line: u32) -> Provenance {
        Provenance { page, line: Some(line), row: None, image: Some(image) }
    }

    /// Total order used for merge tie-breaks and report sorting.
    pub fn sort_key(&self) -> (u32, u32, u32, u32) {
        (
            self.page,
            self.image.unwrap_or(0),
            self.line.unwrap_or(0),
            self.row.unwrap_or(0),
        )
    }
}

/// A provisional extracted entity. Created by one matcher, possibly merged
/// with duplicates, then classified and aggregated; terminal afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub category: Category,
    pub code: String,
    /// Exact substring the matcher fired on.
    pub matched_value: String,
    /// Bounded preview of the source line / row.
    pub raw_text: String,
    pub provenance: Provenance,
    pub confidence: Confidence,
    pub source: SourceKind,
    /// True when the candidate was short-circuited from the known-entity table.
    #[serde(default)]
    pub known: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Candidate {
    /// Deduplication key: (normalized name, code).
    pub fn dedup_key(&self) -> (String, String) {
        (self.name.trim().to_lowercase(), self.code.clone())
    }

    /// How many optional fields are populated; richer candidates win merges.
    pub fn detail_score(&self) -> usize {
        [
            self.pin.is_some(),
            self.pin_range.is_some(),
            self.specification.is_some(),
            self.quantity.is_some(),
            self.description.is_some(),
            self.known,
        ]
        .iter()
        .filter(|b| **b)
        .count()
    }
}

/// Char-safe truncation for raw-text previews.
pub fn preview(text: &str) -> String {
    preview_n(text, PREVIEW_CHARS)
}

pub fn preview_n(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}
