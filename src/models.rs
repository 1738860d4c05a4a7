use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single day's stored training snapshot.
///
/// Every measurement is optional: a snapshot is a sparse record of whatever the
/// upstream services reported that day. Sequences of snapshots are passed to the
/// analytics newest-first unless a function says otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// When the snapshot was taken, as ISO-8601 text (date or date-time)
    pub recorded_at: String,

    // Training load
    /// Chronic Training Load (fitness)
    pub ctl: Option<f64>,
    /// Acute Training Load (fatigue)
    pub atl: Option<f64>,
    /// Training Stress Balance (form)
    pub tsb: Option<f64>,
    /// Weekly CTL change
    pub ramp_rate: Option<f64>,
    /// ATL:CTL ratio
    pub ac_ratio: Option<f64>,
    /// Days since the last activity
    pub rest_days: Option<u32>,
    /// Mean / standard deviation of the last 7 daily loads
    pub monotony: Option<f64>,
    pub training_strain: Option<f64>,

    // Health
    pub resting_hr: Option<u16>,
    /// Max heart rate of the latest activity
    pub max_hr: Option<u16>,
    /// Overnight HRV (rMSSD, ms)
    pub hrv: Option<f64>,
    pub sleep_secs: Option<u32>,
    /// Device sleep score (0-100)
    pub sleep_score: Option<f64>,
    /// 1 = good, 2 = ok, 3 = bad
    pub sleep_quality: Option<u8>,
    pub vo2max: Option<f64>,

    // Subjective wellness, 1-5 scales
    pub fatigue: Option<u8>,
    pub soreness: Option<u8>,
    pub mood: Option<u8>,
    pub motivation: Option<u8>,

    // Heart-rate zone time of the latest activity, seconds
    pub hr_zone_z1_secs: Option<u32>,
    pub hr_zone_z2_secs: Option<u32>,
    pub hr_zone_z3_secs: Option<u32>,
    pub hr_zone_z4_secs: Option<u32>,
    pub hr_zone_z5_secs: Option<u32>,

    // Critical speed model
    /// Critical speed in m/s
    pub critical_speed: Option<f64>,
    /// D' (anaerobic distance capacity) in meters
    pub d_prime: Option<f64>,

    // Volume
    /// Average pace as reported upstream, e.g. "5:12"
    pub avg_pace: Option<String>,
    /// Kilometers this week
    pub week_0_km: Option<f64>,
    pub week_1_km: Option<f64>,
    pub week_2_km: Option<f64>,
    pub week_3_km: Option<f64>,
    pub week_4_km: Option<f64>,

    // Weather of the latest activity
    pub weather_temp: Option<f64>,
}

impl Snapshot {
    /// Create an empty snapshot for the given timestamp text
    pub fn new(recorded_at: impl Into<String>) -> Self {
        Snapshot {
            recorded_at: recorded_at.into(),
            ..Snapshot::default()
        }
    }

    /// Weekly volumes from this week (index 0) back to four weeks ago (index 4)
    pub fn weekly_volumes(&self) -> [Option<f64>; 5] {
        [
            self.week_0_km,
            self.week_1_km,
            self.week_2_km,
            self.week_3_km,
            self.week_4_km,
        ]
    }

    /// Seconds in HR zones 1-5 of the latest activity
    pub fn hr_zone_secs(&self) -> [Option<u32>; 5] {
        [
            self.hr_zone_z1_secs,
            self.hr_zone_z2_secs,
            self.hr_zone_z3_secs,
            self.hr_zone_z4_secs,
            self.hr_zone_z5_secs,
        ]
    }

    /// Calendar date of the snapshot, if `recorded_at` parses
    pub fn recorded_date(&self) -> Option<NaiveDate> {
        parse_recorded_at(&self.recorded_at)
    }
}

/// Parse ISO-8601 snapshot timestamps into a calendar date.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.f]` and the space-separated
/// variant SQLite produces.
pub fn parse_recorded_at(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Period a distance goal is measured over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    WeeklyKm,
    MonthlyKm,
    YearlyKm,
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            GoalType::WeeklyKm => "weekly_km",
            GoalType::MonthlyKm => "monthly_km",
            GoalType::YearlyKm => "yearly_km",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for GoalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "weekly_km" | "weekly" => Ok(GoalType::WeeklyKm),
            "monthly_km" | "monthly" => Ok(GoalType::MonthlyKm),
            "yearly_km" | "yearly" => Ok(GoalType::YearlyKm),
            _ => Err(format!("Unknown goal type: {}", s)),
        }
    }
}

/// A distance target stored alongside the snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub created_at: String,
    pub goal_type: GoalType,
    pub target_value: f64,
    pub period_start: Option<NaiveDate>,
    pub is_active: bool,
}
