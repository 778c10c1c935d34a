use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::candidate::Category;

/// A pre-authored entity record keyed by exact code. Finding the code in a
/// line bypasses inference for that substring.
#[derive(Debug, Clone, Copy)]
pub struct KnownEntity {
    pub code: &'static str,
    pub name: &'static str,
    pub category: Category,
    pub description: &'static str,
}

/// Manually catalogued components of the J6L harness drawing set.
const KNOWN_ENTITIES: &[KnownEntity] = &[
    KnownEntity {
        code: "AdBlue",
        name: "AdBlue尿素喷射系统",
        category: Category::System,
        description: "柴油机尾气处理液喷射系统，用于减少氮氧化物排放",
    },
    KnownEntity {
        code: "C2",
        name: "发动机ECU主连接器",
        category: Category::Connector,
        description: "发动机控制单元连接，100针",
    },
    KnownEntity {
        code: "CA1251P62K1L7T3E5_S100001_07",
        name: "新款J6L整车主线束",
        category: Category::Harness,
        description: "适用于各种选装配置",
    },
    KnownEntity {
        code: "FA10",
        name: "锡柴自主FA10发动机",
        category: Category::System,
        description: "国六排放标准",
    },
];

/// Component keyword dictionary in author priority order. The first alias
/// that hits a line wins for its category; later categories still get their
/// own scan of the same line.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Connector, &["连接器", "接插件", "插接件", "插座", "插头", "端子", "PIN"]),
    (Category::Harness, &["线束", "线缆", "电线", "导线", "电缆"]),
    (
        Category::Sensor,
        &["传感器", "温度传感器", "压力传感器", "位置传感器", "速度传感器", "探头", "感应器", "探测器"],
    ),
    (Category::Switch, &["开关", "按钮", "旋钮", "按键", "拨杆"]),
    (Category::Relay, &["继电器", "电磁继电器", "固态继电器"]),
    (Category::Fuse, &["保险丝", "熔断器", "保险", "断路器"]),
    (Category::Module, &["模块", "控制模块", "ECU", "电脑板", "控制器"]),
    (Category::Motor, &["电机", "马达", "电动机", "电动马达"]),
    (Category::Pump, &["泵", "油泵", "水泵", "燃油泵", "尿素泵"]),
    (Category::Valve, &["阀", "电磁阀", "阀门", "气动阀", "液压阀"]),
    (Category::Light, &["灯", "灯泡", "LED灯", "指示灯", "照明灯"]),
    (Category::Gauge, &["仪表", "仪表盘", "显示屏", "显示器", "仪表板"]),
    (
        Category::System,
        &[
            "发动机", "引擎", "柴油机", "汽油机", "排放", "尾气", "DPF", "SCR", "尿素", "AdBlue",
            "电气", "电路", "电源", "蓄电池", "制动", "刹车", "ABS", "转向", "空调", "暖风", "气囊",
        ],
    ),
];

/// Fixed descriptions attached to prominent keywords.
const KEYWORD_DESCRIPTIONS: &[(&str, &str)] = &[
    ("AdBlue", "柴油机尾气处理液系统，用于减少氮氧化物排放"),
    ("尿素", "选择性催化还原系统(SCR)的还原剂"),
    ("FA10", "锡柴自主10升发动机，国六排放标准"),
    ("ECU", "电子控制单元，车辆控制核心"),
    ("传感器", "用于检测各种物理量的装置"),
    ("线束", "车辆电气系统的导线束总成"),
    ("连接器", "电气连接装置，用于连接不同线束或部件"),
];

/// A named, ordered group of regex patterns. Order is author priority and
/// decides tie-breaks.
pub struct RegexFamily {
    pub name: &'static str,
    pub patterns: Vec<Regex>,
}

impl RegexFamily {
    fn new(name: &'static str, sources: &[&str]) -> RegexFamily {
        let patterns = sources
            .iter()
            .map(|s| Regex::new(s).unwrap_or_else(|e| panic!("bad {name} pattern {s:?}: {e}")))
            .collect();
        RegexFamily { name, patterns }
    }

    /// True when `text` as a whole is a match for any pattern in the family.
    pub fn matches_fully(&self, text: &str) -> bool {
        self.patterns
            .iter()
            .any(|re| re.find(text).is_some_and(|m| m.start() == 0 && m.end() == text.len()))
    }
}

pub const FAMILY_CONNECTOR: &str = "connector";
pub const FAMILY_PART_NUMBER: &str = "part_number";
pub const FAMILY_DIMENSION: &str = "dimension";
pub const FAMILY_DATE: &str = "date";

/// Immutable pattern configuration: keyword dictionary, regex families and
/// the known-entity table. Shared read-only across the whole run.
pub struct PatternLibrary {
    families: Vec<RegexFamily>,
    known_by_code: HashMap<&'static str, &'static KnownEntity>,
}

static LIBRARY: LazyLock<PatternLibrary> = LazyLock::new(PatternLibrary::new);

impl PatternLibrary {
    pub fn new() -> PatternLibrary {
        let families = vec![
            RegexFamily::new(
                FAMILY_CONNECTOR,
                &[
                    r"([A-Z][0-9]+)P([0-9]+)", // C2P1
                    r"([A-Z][0-9]+)-([0-9]+)", // C2-1
                    r"(J[0-9]+)",
                    r"(X[0-9]+)",
                    r"(S[0-9]+)",
                ],
            ),
            RegexFamily::new(
                FAMILY_PART_NUMBER,
                &[
                    r"(CA\d+[A-Z0-9_\-]+)",   // CA1251P62K1L7T3E5_S100001_07
                    r"([0-9]{8,}[A-Z]*)",     // long numeric codes
                    r"([A-Z]{2,}\d+[A-Z0-9]+)", // mixed alphanumeric codes
                ],
            ),
            RegexFamily::new(
                FAMILY_DIMENSION,
                &[
                    r"(\d+\.?\d*)\s*[×xX*]\s*(\d+\.?\d*)", // 100×50
                    r"(\d+\.?\d*)\s*±\s*(\d+\.?\d*)",      // 330.8±0.5
                    r"[ΦϕØ]\s*(\d+\.?\d*)",                // Φ10
                    r"(\d+\.?\d*)\s*[Mm][Mm]",
                    r"(\d+\.?\d*)\s*[Cc][Mm]",
                    r"(\d+\.?\d*)\s*°[Cc]",
                ],
            ),
            RegexFamily::new(
                FAMILY_DATE,
                &[
                    r"(\d{4}[-/]\d{1,2}[-/]\d{1,2})",
                    r"(\d{8})",
                    r"(\d{4}年\d{1,2}月\d{1,2}日)",
                ],
            ),
        ];

        let known_by_code = KNOWN_ENTITIES.iter().map(|k| (k.code, k)).collect();

        PatternLibrary { families, known_by_code }
    }

    /// Process-wide instance; patterns compile once.
    pub fn global() -> &'static PatternLibrary {
        &LIBRARY
    }

    /// Exact-code lookup into the known-entity table.
    pub fn known(&self, code: &str) -> Option<&KnownEntity> {
        self.known_by_code.get(code).copied()
    }

    /// Known entities in author order, for substring scans over a line.
    pub fn known_entities(&self) -> &'static [KnownEntity] {
        KNOWN_ENTITIES
    }

    /// (category, aliases) pairs in priority order.
    pub fn categories(&self) -> &'static [(Category, &'static [&'static str])] {
        CATEGORY_KEYWORDS
    }

    pub fn family(&self, name: &str) -> Option<&RegexFamily> {
        self.families.iter().find(|f| f.name == name)
    }

    pub fn families(&self) -> &[RegexFamily] {
        &self.families
    }

    /// Description for a matched keyword; either side may be a substring of
    /// the other (e.g. alias 尿素泵 vs key 尿素).
    pub fn keyword_description(&self, keyword: &str) -> Option<&'static str> {
        KEYWORD_DESCRIPTIONS
            .iter()
            .find(|(key, _)| keyword.contains(key) || key.contains(keyword))
            .map(|(_, desc)| *desc)
    }
}

impl Default for PatternLibrary {
    fn default() -> Self {
        PatternLibrary::new()
    }
}
