//! Risk label severity.
//!
//! The backend labels each forecast day with a free-form risk string. The
//! alert trigger only asks whether a label classifies as Safe; the ordering
//! and colour lookup here exist for display and for worded alert titles.

/// Risk labels. The known levels run from `Safe` to `RedAlert` in
/// ascending order of severity; `Unrecognized` is outside that scale and
/// sorts after all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskSeverity {
    Safe,
    Watch,
    Warning,
    RedAlert,
    /// A label the backend introduced that this build does not know.
    Unrecognized,
}

impl RiskSeverity {
    /// Case-insensitive classification of a backend risk label.
    pub fn classify(label: &str) -> RiskSeverity {
        match label.trim().to_ascii_lowercase().as_str() {
            "safe" => RiskSeverity::Safe,
            "watch" => RiskSeverity::Watch,
            "warning" => RiskSeverity::Warning,
            "red alert" | "danger" => RiskSeverity::RedAlert,
            _ => RiskSeverity::Unrecognized,
        }
    }

    /// Title prefix used when raising an alert at this severity.
    pub fn headline(&self) -> &'static str {
        match self {
            RiskSeverity::Safe => "Station safe",
            RiskSeverity::Watch => "Flood watch nearby",
            RiskSeverity::Warning => "Flood warning nearby",
            RiskSeverity::RedAlert => "Flood danger nearby",
            RiskSeverity::Unrecognized => "Flood risk nearby",
        }
    }
}

/// Map marker colour for a station's current risk (`None` = unknown).
pub fn marker_color(risk_level: Option<&str>) -> &'static str {
    match risk_level.map(RiskSeverity::classify) {
        Some(RiskSeverity::Safe) => "#4caf50",
        Some(RiskSeverity::Watch) => "#ffc107",
        Some(RiskSeverity::Warning) => "#ff9800",
        Some(RiskSeverity::RedAlert) => "#f44336",
        Some(RiskSeverity::Unrecognized) | None => "#bdbdbd",
    }
}
