use serde::{Deserialize, Serialize};

use crate::parser::candidate::Candidate;

/// Top-level vehicle subsystem buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleSystem {
    Powertrain,
    EmissionsControl,
    Electrical,
    Chassis,
    Body,
}

impl VehicleSystem {
    pub const ALL: [VehicleSystem; 5] = [
        VehicleSystem::Powertrain,
        VehicleSystem::EmissionsControl,
        VehicleSystem::Electrical,
        VehicleSystem::Chassis,
        VehicleSystem::Body,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleSystem::Powertrain => "powertrain",
            VehicleSystem::EmissionsControl => "emissions_control",
            VehicleSystem::Electrical => "electrical",
            VehicleSystem::Chassis => "chassis",
            VehicleSystem::Body => "body",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VehicleSystem::Powertrain => "动力总成系统",
            VehicleSystem::EmissionsControl => "排放控制系统",
            VehicleSystem::Electrical => "电气系统",
            VehicleSystem::Chassis => "底盘系统",
            VehicleSystem::Body => "车身系统",
        }
    }
}

/// Trigger keywords per system, evaluated in this order; classification is
/// first-match, not best-fit, matching the extractor's tie-break policy.
const RULES: &[(VehicleSystem, &[&str])] = &[
    (VehicleSystem::Powertrain, &["发动机", "引擎", "fa10", "锡柴", "燃油"]),
    (VehicleSystem::EmissionsControl, &["尿素", "adblue", "排放", "尾气", "scr", "国六"]),
    (VehicleSystem::Electrical, &["线束", "连接器", "电缆", "电源", "蓄电池"]),
    (VehicleSystem::Chassis, &["制动", "刹车", "转向", "悬挂", "底盘"]),
    (VehicleSystem::Body, &["空调", "暖风", "安全", "气囊", "舒适"]),
];

/// Map a candidate onto at most one system by case-insensitive substring
/// tests over its name and description. No rule hit means unassigned.
pub fn classify(candidate: &Candidate) -> Option<VehicleSystem> {
    let name = candidate.name.to_lowercase();
    let description = candidate.description.as_deref().unwrap_or("").to_lowercase();

    RULES
        .iter()
        .find(|(_, triggers)| {
            triggers.iter().any(|t| name.contains(t) || description.contains(t))
        })
        .map(|(system, _)| *system)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::candidate::{Category, Confidence, Provenance, SourceKind};

    fn candidate(name: &str, description: Option<&str>) -> Candidate {
        Candidate {
            name: name.to_string(),
            category: Category::Other,
            code: "T1".to_string(),
            matched_value: String::new(),
            raw_text: String::new(),
            provenance: Provenance::line(1, 1),
            confidence: Confidence::Medium,
            source: SourceKind::Text,
            known: false,
            pin: None,
            pin_range: None,
            specification: None,
            quantity: None,
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        // 发动机 (powertrain) and 线束 (electrical) both present; powertrain
        // is evaluated first
        let c = candidate("发动机控制线束", None);
        assert_eq!(classify(&c), Some(VehicleSystem::Powertrain));
    }

    #[test]
    fn case_insensitive_triggers() {
        let c = candidate("FA10 engine assembly", None);
        assert_eq!(classify(&c), Some(VehicleSystem::Powertrain));
        let c = candidate("AdBlue喷射单元", None);
        assert_eq!(classify(&c), Some(VehicleSystem::EmissionsControl));
    }

    #[test]
    fn description_also_consulted() {
        let c = candidate("S100001组件", Some("国六排放后处理系统专用线束"));
        assert_eq!(classify(&c), Some(VehicleSystem::EmissionsControl));
    }

    #[test]
    fn unmatched_candidate_stays_unassigned() {
        let c = candidate("规格 330.8±0.5", None);
        assert_eq!(classify(&c), None);
    }
}
