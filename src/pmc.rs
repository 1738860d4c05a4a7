//! Fitness/fatigue projections over the Banister model
//!
//! CTL (fitness, 42-day constant), ATL (fatigue, 7-day constant) and
//! TSB = CTL - ATL (form) are read from stored snapshots; this module projects
//! them forward, models detraining, summarises the latest week and maps the
//! values onto dashboard status labels.
//!
//! All values are kept at full precision; JSON output is rounded to one
//! decimal place.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Snapshot;
use crate::stats::{mean, round1, serialize_opt_round1, serialize_round1};
use crate::thresholds::{status as status_cfg, training_load, tsb as tsb_cfg};

/// Form zone of a projected day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionZone {
    Optimal,
    Grey,
    Overreach,
}

impl ProjectionZone {
    pub fn from_tsb(tsb: f64) -> Self {
        if tsb > tsb_cfg::OPTIMAL_ABOVE {
            ProjectionZone::Optimal
        } else if tsb > tsb_cfg::GREY_ABOVE {
            ProjectionZone::Grey
        } else {
            ProjectionZone::Overreach
        }
    }
}

/// One projected day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    /// Days from today, starting at 1
    pub day: u32,
    #[serde(serialize_with = "serialize_round1")]
    pub ctl: f64,
    #[serde(serialize_with = "serialize_round1")]
    pub atl: f64,
    /// Always `ctl - atl`
    #[serde(serialize_with = "serialize_round1")]
    pub tsb: f64,
    pub zone: ProjectionZone,
}

/// Forward projection of training load
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionReport {
    pub projections: Vec<Projection>,
    /// First projected day with positive TSB; `None` when TSB is already
    /// positive today or stays non-positive over the horizon
    pub days_to_positive_tsb: Option<u32>,
}

/// Project CTL/ATL/TSB `days` days ahead assuming no further training.
///
/// Fitness follows the current ramp rate linearly (`ramp_rate` per 7 days)
/// while fatigue decays by 10% per day.
pub fn project_forward(ctl: f64, atl: f64, ramp_rate: Option<f64>, days: u32) -> ProjectionReport {
    let ramp = ramp_rate.unwrap_or(0.0);
    let already_positive = ctl - atl > 0.0;

    let mut days_to_positive = None;
    let projections = (1..=days)
        .map(|day| {
            let d = day as f64;
            let proj_ctl = ctl + ramp * (d / 7.0);
            let proj_atl = atl * training_load::PROJECTION_ATL_DAILY_DECAY.powi(day as i32);
            let proj_tsb = proj_ctl - proj_atl;

            if days_to_positive.is_none() && !already_positive && proj_tsb > 0.0 {
                days_to_positive = Some(day);
            }

            Projection {
                day,
                ctl: proj_ctl,
                atl: proj_atl,
                tsb: proj_tsb,
                zone: ProjectionZone::from_tsb(proj_tsb),
            }
        })
        .collect();

    ProjectionReport {
        projections,
        days_to_positive_tsb: days_to_positive,
    }
}

/// Weekly sample of the detraining curve
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetrainingPoint {
    pub week: u32,
    #[serde(serialize_with = "serialize_round1")]
    pub ctl: f64,
    #[serde(serialize_with = "serialize_round1")]
    pub atl: f64,
    #[serde(serialize_with = "serialize_round1")]
    pub tsb: f64,
    /// Share of today's CTL lost by this week, percent
    #[serde(serialize_with = "serialize_round1")]
    pub ctl_pct_lost: f64,
}

/// CTL/ATL/TSB decay if training stops today, sampled at week 0..=`weeks`
pub fn project_detraining(ctl: f64, atl: f64, weeks: u32) -> Vec<DetrainingPoint> {
    let ctl_daily = 1.0 - 1.0 / training_load::CTL_TIME_CONSTANT_DAYS;
    let atl_daily = 1.0 - 1.0 / training_load::ATL_TIME_CONSTANT_DAYS;

    (0..=weeks)
        .map(|week| {
            let days = (week * 7) as i32;
            let ctl_decay = ctl_daily.powi(days);
            let proj_ctl = ctl * ctl_decay;
            let proj_atl = atl * atl_daily.powi(days);
            DetrainingPoint {
                week,
                ctl: proj_ctl,
                atl: proj_atl,
                tsb: proj_ctl - proj_atl,
                ctl_pct_lost: (1.0 - ctl_decay) * 100.0,
            }
        })
        .collect()
}

/// Direction of form across the latest week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TsbTrend {
    Improving,
    Declining,
    Stable,
    Unknown,
}

impl fmt::Display for TsbTrend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            TsbTrend::Improving => "improving",
            TsbTrend::Declining => "declining",
            TsbTrend::Stable => "stable",
            TsbTrend::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Latest 7 days compared to the 7 before
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySummary {
    #[serde(serialize_with = "serialize_opt_round1")]
    pub ctl_change: Option<f64>,
    #[serde(serialize_with = "serialize_opt_round1")]
    pub total_km: Option<f64>,
    #[serde(serialize_with = "serialize_opt_round1")]
    pub avg_hrv: Option<f64>,
    pub rest_days: Option<u32>,
    pub tsb_trend: TsbTrend,
    pub message: String,
}

/// Summarise the newest week of `rows` (newest-first, ideally 14 rows).
///
/// CTL change is measured against the previous week's latest CTL when a full
/// previous week is present, otherwise first-vs-last within the current week.
pub fn summarize_week(rows: &[Snapshot]) -> WeeklySummary {
    if rows.is_empty() {
        return WeeklySummary {
            ctl_change: None,
            total_km: None,
            avg_hrv: None,
            rest_days: None,
            tsb_trend: TsbTrend::Unknown,
            message: "No data available".to_string(),
        };
    }

    let recent = &rows[..rows.len().min(7)];
    let previous = if rows.len() >= 14 { &rows[7..14] } else { &[][..] };

    let ctls: Vec<f64> = recent.iter().filter_map(|r| r.ctl).collect();
    let ctl_change = match (ctls.first(), ctls.last()) {
        (Some(latest), _) if !previous.is_empty() => previous
            .iter()
            .find_map(|r| r.ctl)
            .map(|prev| round1(latest - prev)),
        (Some(latest), Some(oldest)) if ctls.len() >= 2 => Some(round1(latest - oldest)),
        _ => None,
    };

    let total_km = recent.iter().find_map(|r| r.week_0_km).map(round1);
    let hrvs: Vec<f64> = recent.iter().filter_map(|r| r.hrv).collect();
    let avg_hrv = mean(&hrvs).map(round1);
    let rest_days = recent.iter().find_map(|r| r.rest_days);

    let tsbs: Vec<f64> = recent.iter().filter_map(|r| r.tsb).collect();
    let tsb_trend = if tsbs.len() >= 3 {
        let newer = tsbs[..3].iter().sum::<f64>() / 3.0;
        let older = tsbs[tsbs.len() - 3..].iter().sum::<f64>() / 3.0;
        if newer > older + tsb_cfg::SUMMARY_TREND_BAND {
            TsbTrend::Improving
        } else if newer < older - tsb_cfg::SUMMARY_TREND_BAND {
            TsbTrend::Declining
        } else {
            TsbTrend::Stable
        }
    } else {
        TsbTrend::Stable
    };

    let mut parts = Vec::new();
    if let Some(change) = ctl_change {
        let sign = if change >= 0.0 { "+" } else { "" };
        parts.push(format!("{}{:.1} CTL", sign, change + 0.0));
    }
    if let Some(km) = total_km {
        parts.push(format!("{:.1} km", km));
    }
    if let Some(hrv) = avg_hrv {
        parts.push(format!("HRV {:.1}", hrv));
    }
    if let Some(rest) = rest_days {
        let plural = if rest == 1 { "" } else { "s" };
        parts.push(format!("{} rest day{}", rest, plural));
    }
    let message = if parts.is_empty() {
        "Keep logging data".to_string()
    } else {
        parts.join(" · ")
    };

    WeeklySummary {
        ctl_change,
        total_km,
        avg_hrv,
        rest_days,
        tsb_trend,
        message,
    }
}

/// Traffic-light status of a dashboard metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Good,
    Ok,
    Bad,
    Neutral,
}

/// Fitness status from the weekly ramp rate
pub fn ctl_status(ramp_rate: Option<f64>) -> Status {
    match ramp_rate {
        None => Status::Neutral,
        Some(r) if r > status_cfg::CTL_GOOD_RAMP => Status::Good,
        Some(r) if r >= 0.0 => Status::Ok,
        Some(_) => Status::Bad,
    }
}

/// Fatigue status from ATL relative to CTL
pub fn atl_status(atl: Option<f64>, ctl: Option<f64>) -> Status {
    match (atl, ctl) {
        (Some(atl), Some(ctl)) if atl != 0.0 && ctl != 0.0 => {
            let ratio = atl / ctl;
            if ratio < status_cfg::ATL_GOOD_RATIO {
                Status::Good
            } else if ratio <= status_cfg::ATL_OK_RATIO {
                Status::Ok
            } else {
                Status::Bad
            }
        }
        _ => Status::Neutral,
    }
}

/// Form status; same band edges as projected zones
pub fn tsb_status(tsb: Option<f64>) -> Status {
    match tsb.map(ProjectionZone::from_tsb) {
        None => Status::Neutral,
        Some(ProjectionZone::Optimal) => Status::Good,
        Some(ProjectionZone::Grey) => Status::Ok,
        Some(ProjectionZone::Overreach) => Status::Bad,
    }
}

/// Acute:chronic workload status; both spikes and detraining are bad
pub fn ac_status(ac_ratio: Option<f64>) -> Status {
    match ac_ratio {
        None => Status::Neutral,
        Some(r) if r < status_cfg::AC_LOW || r > status_cfg::AC_OK_MAX => Status::Bad,
        Some(r) if r <= status_cfg::AC_GOOD_MAX => Status::Good,
        Some(_) => Status::Ok,
    }
}

/// Status from the device sleep quality (1 good, 2 ok, 3 bad)
pub fn sleep_status(quality: Option<u8>) -> Status {
    match quality {
        Some(1) => Status::Good,
        Some(2) => Status::Ok,
        Some(3) => Status::Bad,
        _ => Status::Neutral,
    }
}

/// Training Stress Balance interpretation ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TsbZone {
    Transition,      // above +25
    Fresh,           // +5 to +25
    GreyZone,        // -10 to +5
    Overreaching,    // -30 to -10
    VeryOverreached, // below -30
}

impl TsbZone {
    pub fn from_tsb(tsb: f64) -> Self {
        if tsb > tsb_cfg::TRANSITION_ABOVE {
            TsbZone::Transition
        } else if tsb > tsb_cfg::FRESH_ABOVE {
            TsbZone::Fresh
        } else if tsb > tsb_cfg::GREY_ZONE_ABOVE {
            TsbZone::GreyZone
        } else if tsb > tsb_cfg::OVERREACHING_ABOVE {
            TsbZone::Overreaching
        } else {
            TsbZone::VeryOverreached
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TsbZone::Transition => "Transition",
            TsbZone::Fresh => "Fresh",
            TsbZone::GreyZone => "Grey Zone",
            TsbZone::Overreaching => "Overreaching",
            TsbZone::VeryOverreached => "Very Overreached",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TsbZone::Transition => "Very fresh, fitness is starting to fade",
            TsbZone::Fresh => "Fresh and ready for hard sessions or racing",
            TsbZone::GreyZone => "Normal training load",
            TsbZone::Overreaching => "Productive overload, monitor recovery",
            TsbZone::VeryOverreached => "Deep fatigue, rest needed",
        }
    }
}

impl fmt::Display for TsbZone {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
