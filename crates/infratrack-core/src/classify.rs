//! Free-text label classification into point kinds and network types.
//!
//! Labels are matched case-insensitively by substring against ordered rule
//! tables. The first matching rule wins, so table order is significant.

use crate::models::{NetworkContext, NetworkType, PointKind};

/// Keywords that resolve a label to a single kind
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub kind: PointKind,
    pub keywords: &'static [&'static str],
}

impl KeywordRule {
    fn matches(&self, label: &str) -> bool {
        self.keywords.iter().any(|k| label.contains(k))
    }
}

/// Sewage kinds, highest priority first
pub const SEWAGE_RULES: &[KeywordRule] = &[
    KeywordRule {
        kind: PointKind::InspectionChamber,
        keywords: &["INSPECTION", "CHAMBER", "تفتيش"],
    },
    KeywordRule {
        kind: PointKind::OilTrap,
        keywords: &["TRAP", "OIL", "مصيدة", "زيوت"],
    },
    KeywordRule {
        kind: PointKind::SewageHouseConnection,
        keywords: &["SEWAGE HOUSE", "SEWAGE CONN", "صرف", "منزلية صرف"],
    },
    KeywordRule {
        kind: PointKind::Manhole,
        keywords: &["MANHOLE", "MAN", "منهل", "بالوعة"],
    },
];

/// Water kinds, highest priority first
pub const WATER_RULES: &[KeywordRule] = &[
    KeywordRule {
        kind: PointKind::Elbow,
        keywords: &["ELBOW", "BEND", "كوع"],
    },
    KeywordRule {
        kind: PointKind::Tee,
        keywords: &["TEE", "مشترك", "T-PIECE"],
    },
    KeywordRule {
        kind: PointKind::Saddle,
        keywords: &["SADDLE", "CLAMP", "STRAP", "سرج"],
    },
    KeywordRule {
        kind: PointKind::Reducer,
        keywords: &["REDUCER", "MASLOOB", "مسلوب"],
    },
    KeywordRule {
        kind: PointKind::AirValve,
        keywords: &["AIR", "هواء"],
    },
    KeywordRule {
        kind: PointKind::WashValve,
        keywords: &["WASH", "غسيل"],
    },
    KeywordRule {
        kind: PointKind::FireHydrant,
        keywords: &["FIRE", "HYDRANT", "حريق"],
    },
    KeywordRule {
        kind: PointKind::WaterHouseConnection,
        keywords: &[
            "WATER HOUSE",
            "WATER CONN",
            "HOUSE",
            "CONN",
            "H.C",
            "HC",
            "مياه",
            "منزلية",
            "منزليه",
            "وصلة",
            "وصله",
        ],
    },
    KeywordRule {
        kind: PointKind::Valve,
        keywords: &["VALVE", "VLV", "محبس"],
    },
];

/// Generic connection terms filed as sewage connections in a sewage project
pub const SEWAGE_CONNECTION_FALLBACK: KeywordRule = KeywordRule {
    kind: PointKind::SewageHouseConnection,
    keywords: &["HOUSE", "CONN", "HC", "H.C"],
};

/// Last resort in a mixed project
pub const MANHOLE_ABBREVIATIONS: KeywordRule = KeywordRule {
    kind: PointKind::Manhole,
    keywords: &["MH", "M.H"],
};

/// Segment labels that mark a sewer line in a mixed project
pub const SEWAGE_LINE_KEYWORDS: &[&str] = &["SEWAGE", "DRAIN", "GRAVITY", "SANITARY", "صرف"];

fn first_match(rules: &[KeywordRule], label: &str) -> Option<PointKind> {
    rules.iter().find(|r| r.matches(label)).map(|r| r.kind)
}

/// Classify a point label.
///
/// A strict context never yields a kind from the other network: in a sewage
/// project an unrecognized or water-only label ("Valve") becomes a manhole,
/// in a water project it becomes a valve.
pub fn classify_point(label: &str, context: NetworkContext) -> PointKind {
    let label = label.to_uppercase();

    match context {
        NetworkContext::Sewage => first_match(SEWAGE_RULES, &label)
            .or_else(|| SEWAGE_CONNECTION_FALLBACK.matches(&label).then_some(SEWAGE_CONNECTION_FALLBACK.kind))
            .unwrap_or(PointKind::Manhole),
        NetworkContext::Water => first_match(WATER_RULES, &label).unwrap_or(PointKind::Valve),
        NetworkContext::Mixed => first_match(SEWAGE_RULES, &label)
            .or_else(|| first_match(WATER_RULES, &label))
            .or_else(|| MANHOLE_ABBREVIATIONS.matches(&label).then_some(MANHOLE_ABBREVIATIONS.kind))
            .unwrap_or(PointKind::Valve),
    }
}

/// Network type of a line. Strict contexts force it; a mixed project looks
/// for sewer keywords in the label and otherwise assumes water.
pub fn classify_segment_network(label: &str, context: NetworkContext) -> NetworkType {
    if let Some(forced) = context.strict_type() {
        return forced;
    }
    let label = label.to_uppercase();
    if SEWAGE_LINE_KEYWORDS.iter().any(|k| label.contains(k)) {
        NetworkType::Sewage
    } else {
        NetworkType::Water
    }
}
