use serde::{Deserialize, Serialize};

use crate::format::pace_from_speed;
use crate::thresholds::zones as cfg;

const ZONE_NAMES: [&str; 6] = [
    "Z1 Recovery",
    "Z2 Aerobic",
    "Z3 Tempo",
    "Z4 Threshold",
    "Z5 VO2max",
    "Z6 Anaerobic",
];

/// Heart rate band in beats per minute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HrZone {
    pub zone: String,
    pub hr_low: u16,
    pub hr_high: u16,
}

/// Pace band; `pace_low` is the slow end, `pace_high` the fast end
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaceZone {
    pub zone: String,
    pub pace_low: String,
    pub pace_high: String,
}

/// How many of the zone inputs were available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    Full,
    Partial,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingZones {
    pub hr_zones: Vec<HrZone>,
    pub pace_zones: Vec<PaceZone>,
    pub data_quality: DataQuality,
}

/// Zone calculation utilities
pub struct ZoneCalculator;

impl ZoneCalculator {
    /// Heart rate zones by the Karvonen method
    ///
    /// Each bound is `resting + HRR * pct` with HRR = max - resting:
    /// - Z1: 50-60% HRR
    /// - Z2: 60-70% HRR
    /// - Z3: 70-80% HRR
    /// - Z4: 80-90% HRR
    /// - Z5: 90-100% HRR
    ///
    /// Empty when max HR does not exceed resting HR.
    pub fn hr_zones(resting_hr: u16, max_hr: u16) -> Vec<HrZone> {
        if max_hr <= resting_hr {
            return Vec::new();
        }
        let reserve = (max_hr - resting_hr) as f64;
        let bound = |pct: f64| (resting_hr as f64 + reserve * pct).round() as u16;

        cfg::HRR_BANDS
            .iter()
            .zip(ZONE_NAMES)
            .map(|(&(low, high), name)| HrZone {
                zone: name.to_string(),
                hr_low: bound(low),
                hr_high: bound(high),
            })
            .collect()
    }

    /// Pace zones as multiples of critical speed, from 70% up to 125% of CS.
    ///
    /// Empty for a non-positive critical speed.
    pub fn pace_zones(critical_speed: f64) -> Vec<PaceZone> {
        if critical_speed <= 0.0 {
            return Vec::new();
        }

        cfg::CS_BANDS
            .iter()
            .zip(ZONE_NAMES)
            .filter_map(|(&(slow, fast), name)| {
                Some(PaceZone {
                    zone: name.to_string(),
                    pace_low: pace_from_speed(critical_speed * slow)?,
                    pace_high: pace_from_speed(critical_speed * fast)?,
                })
            })
            .collect()
    }

    /// Both zone sets from whatever inputs are available
    pub fn training_zones(
        resting_hr: Option<u16>,
        max_hr: Option<u16>,
        critical_speed: Option<f64>,
    ) -> TrainingZones {
        let hr_zones = match (resting_hr, max_hr) {
            (Some(resting), Some(max)) => Self::hr_zones(resting, max),
            _ => Vec::new(),
        };
        let pace_zones = critical_speed.map(Self::pace_zones).unwrap_or_default();

        let data_quality = match (hr_zones.is_empty(), pace_zones.is_empty()) {
            (false, false) => DataQuality::Full,
            (true, true) => DataQuality::None,
            _ => DataQuality::Partial,
        };

        TrainingZones {
            hr_zones,
            pace_zones,
            data_quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_karvonen_zones() {
        let zones = ZoneCalculator::hr_zones(50, 190);
        assert_eq!(zones.len(), 5);
        assert_eq!(zones[0], HrZone { zone: "Z1 Recovery".to_string(), hr_low: 120, hr_high: 134 });
        assert_eq!(zones[2].hr_low, 148);
        assert_eq!(zones[4].zone, "Z5 VO2max");
        assert_eq!(zones[4].hr_high, 190);
        assert!(zones.windows(2).all(|w| w[0].hr_high == w[1].hr_low));
    }

    #[test]
    fn test_invalid_heart_rates() {
        assert!(ZoneCalculator::hr_zones(60, 60).is_empty());
        assert!(ZoneCalculator::hr_zones(180, 60).is_empty());
    }

    #[test]
    fn test_pace_zones() {
        let zones = ZoneCalculator::pace_zones(4.0);
        assert_eq!(zones.len(), 6);
        // 0.70 x 4.0 = 2.8 m/s -> 357 s/km; 0.80 x 4.0 = 3.2 m/s -> 312.5 s/km
        assert_eq!(zones[0].pace_low, "5:57/km");
        assert_eq!(zones[0].pace_high, "5:12/km");
        assert_eq!(zones[5].zone, "Z6 Anaerobic");
        assert_eq!(zones[5].pace_high, "3:20/km");

        assert!(ZoneCalculator::pace_zones(0.0).is_empty());
    }

    #[test]
    fn test_data_quality() {
        let full = ZoneCalculator::training_zones(Some(50), Some(190), Some(4.0));
        assert_eq!(full.data_quality, DataQuality::Full);

        let partial = ZoneCalculator::training_zones(None, Some(190), Some(4.0));
        assert_eq!(partial.data_quality, DataQuality::Partial);
        assert!(partial.hr_zones.is_empty());

        let none = ZoneCalculator::training_zones(None, None, None);
        assert_eq!(none.data_quality, DataQuality::None);
        assert_eq!(serde_json::to_value(&none).unwrap()["data_quality"], "none");
    }
}
