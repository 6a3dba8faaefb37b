//! AQI categories, display colours and the concentration calculator.
//!
//! The calculator turns raw pollutant concentrations into an AQI using
//! piecewise-linear breakpoint tables; the overall index is the worst
//! (highest) pollutant sub-index.

use crate::models::{Pollutant, PollutantSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Health category of an AQI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    /// All categories from best to worst.
    pub const ALL: [AqiCategory; 6] = [
        AqiCategory::Good,
        AqiCategory::Moderate,
        AqiCategory::UnhealthyForSensitive,
        AqiCategory::Unhealthy,
        AqiCategory::VeryUnhealthy,
        AqiCategory::Hazardous,
    ];

    /// Classifies an AQI value. Upper thresholds are inclusive.
    pub fn from_aqi(aqi: i32) -> Self {
        Self::ALL[crate::analysis::bucket_index(aqi)]
    }

    /// Position of the category in [`AqiCategory::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Chart colour for the category.
    pub fn color(&self) -> &'static str {
        match self {
            AqiCategory::Good => "#00ff88",
            AqiCategory::Moderate => "#ffff00",
            AqiCategory::UnhealthyForSensitive => "#ff8800",
            AqiCategory::Unhealthy => "#ff0000",
            AqiCategory::VeryUnhealthy => "#8800ff",
            AqiCategory::Hazardous => "#880000",
        }
    }

    /// Returns an emoji representation of the category.
    pub fn emoji(&self) -> &'static str {
        match self {
            AqiCategory::Good => "🟢",
            AqiCategory::Moderate => "🟡",
            AqiCategory::UnhealthyForSensitive => "🟠",
            AqiCategory::Unhealthy => "🔴",
            AqiCategory::VeryUnhealthy => "🟣",
            AqiCategory::Hazardous => "🟤",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AqiCategory::Good => write!(f, "Good"),
            AqiCategory::Moderate => write!(f, "Moderate"),
            AqiCategory::UnhealthyForSensitive => write!(f, "Unhealthy for Sensitive Groups"),
            AqiCategory::Unhealthy => write!(f, "Unhealthy"),
            AqiCategory::VeryUnhealthy => write!(f, "Very Unhealthy"),
            AqiCategory::Hazardous => write!(f, "Hazardous"),
        }
    }
}

/// Index value used when a concentration is above the last breakpoint.
const AQI_CEILING: i32 = 500;

/// (concentration low, concentration high, index low, index high)
type Breakpoint = (f64, f64, f64, f64);

const PM25_BREAKPOINTS: &[Breakpoint] = &[
    (0.0, 12.0, 0.0, 50.0),
    (12.0, 35.5, 50.0, 100.0),
    (35.5, 55.4, 100.0, 150.0),
    (55.4, 150.4, 150.0, 200.0),
    (150.4, 250.4, 200.0, 300.0),
    (250.4, 350.4, 300.0, 400.0),
];

const PM10_BREAKPOINTS: &[Breakpoint] = &[
    (0.0, 54.0, 0.0, 50.0),
    (54.0, 154.0, 50.0, 100.0),
    (154.0, 254.0, 100.0, 150.0),
    (254.0, 354.0, 150.0, 200.0),
    (354.0, 424.0, 200.0, 300.0),
    (424.0, 504.0, 300.0, 400.0),
];

const NO2_BREAKPOINTS: &[Breakpoint] = &[
    (0.0, 53.0, 0.0, 50.0),
    (53.0, 100.0, 50.0, 100.0),
    (100.0, 360.0, 100.0, 150.0),
    (360.0, 649.0, 150.0, 200.0),
    (649.0, 1249.0, 200.0, 300.0),
];

const SO2_BREAKPOINTS: &[Breakpoint] = &[
    (0.0, 35.0, 0.0, 50.0),
    (35.0, 75.0, 50.0, 100.0),
    (75.0, 185.0, 100.0, 150.0),
    (185.0, 304.0, 150.0, 200.0),
    (304.0, 604.0, 200.0, 300.0),
];

const CO_BREAKPOINTS: &[Breakpoint] = &[
    (0.0, 4.4, 0.0, 50.0),
    (4.4, 9.4, 50.0, 100.0),
    (9.4, 12.4, 100.0, 150.0),
    (12.4, 15.4, 150.0, 200.0),
    (15.4, 30.4, 200.0, 300.0),
];

const O3_BREAKPOINTS: &[Breakpoint] = &[
    (0.0, 54.0, 0.0, 50.0),
    (54.0, 70.0, 50.0, 100.0),
    (70.0, 85.0, 100.0, 150.0),
    (85.0, 105.0, 150.0, 200.0),
    (105.0, 200.0, 200.0, 300.0),
];

/// Conversion from reported units into the breakpoint table's units,
/// plus the table itself.
fn breakpoints(pollutant: Pollutant) -> (f64, &'static [Breakpoint]) {
    match pollutant {
        Pollutant::Pm25 => (1.0, PM25_BREAKPOINTS),
        Pollutant::Pm10 => (1.0, PM10_BREAKPOINTS),
        // µg/m³ -> ppb
        Pollutant::No2 => (0.53, NO2_BREAKPOINTS),
        Pollutant::So2 => (0.38, SO2_BREAKPOINTS),
        Pollutant::O3 => (0.51, O3_BREAKPOINTS),
        // mg/m³ -> ppm
        Pollutant::Co => (0.87, CO_BREAKPOINTS),
    }
}

/// Rounds half up, matching how the API computes indices.
fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

/// Sub-index for a single pollutant. Missing concentrations count as 0.
pub fn sub_index(pollutant: Pollutant, concentration: Option<f64>) -> i32 {
    let Some(raw) = concentration else {
        return 0;
    };

    let (factor, table) = breakpoints(pollutant);
    let c = raw * factor;

    table
        .iter()
        .find(|(_, c_hi, _, _)| c <= *c_hi)
        .map(|(c_lo, c_hi, i_lo, i_hi)| {
            round_half_up(i_lo + (c - c_lo) * (i_hi - i_lo) / (c_hi - c_lo))
        })
        .unwrap_or(AQI_CEILING)
}

/// Overall AQI: the highest sub-index across all pollutants.
pub fn calculate_aqi(pollutants: &PollutantSnapshot) -> i32 {
    Pollutant::ALL
        .iter()
        .map(|p| sub_index(*p, pollutants.get(*p)))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_boundaries() {
        assert_eq!(AqiCategory::from_aqi(0), AqiCategory::Good);
        assert_eq!(AqiCategory::from_aqi(50), AqiCategory::Good);
        assert_eq!(AqiCategory::from_aqi(51), AqiCategory::Moderate);
        assert_eq!(AqiCategory::from_aqi(100), AqiCategory::Moderate);
        assert_eq!(AqiCategory::from_aqi(101), AqiCategory::UnhealthyForSensitive);
        assert_eq!(AqiCategory::from_aqi(150), AqiCategory::UnhealthyForSensitive);
        assert_eq!(AqiCategory::from_aqi(200), AqiCategory::Unhealthy);
        assert_eq!(AqiCategory::from_aqi(300), AqiCategory::VeryUnhealthy);
        assert_eq!(AqiCategory::from_aqi(301), AqiCategory::Hazardous);
        assert_eq!(AqiCategory::from_aqi(999), AqiCategory::Hazardous);
    }

    #[test]
    fn test_category_index_matches_order() {
        for (i, category) in AqiCategory::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
        assert_eq!(AqiCategory::Hazardous.color(), "#880000");
    }

    #[test]
    fn test_pm25_breakpoints() {
        assert_eq!(sub_index(Pollutant::Pm25, Some(12.0)), 50);
        assert_eq!(sub_index(Pollutant::Pm25, Some(35.5)), 100);
        assert_eq!(sub_index(Pollutant::Pm25, Some(6.0)), 25);
        assert_eq!(sub_index(Pollutant::Pm25, Some(400.0)), 500);
        assert_eq!(sub_index(Pollutant::Pm25, None), 0);
    }

    #[test]
    fn test_unit_conversion() {
        // 100 µg/m³ NO2 is 53 ppb, the top of the first band
        assert_eq!(sub_index(Pollutant::No2, Some(100.0)), 50);
        assert_eq!(sub_index(Pollutant::Co, Some(100.0)), 500);
    }

    #[test]
    fn test_calculate_aqi_takes_worst_pollutant() {
        let snapshot = PollutantSnapshot {
            pm25: Some(12.0),
            pm10: Some(154.0),
            ..Default::default()
        };
        assert_eq!(calculate_aqi(&snapshot), 100);
        assert_eq!(calculate_aqi(&PollutantSnapshot::default()), 0);
    }
}
