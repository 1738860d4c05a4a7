//! Service layer over a [`SnapshotSource`]
//!
//! Each method pulls the window of snapshots its analytic needs and hands the
//! rows to the pure functions in the analytic modules. Storage failures are
//! returned as errors; missing or sparse data never is.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::config::AthleteSettings;
use crate::consistency::{
    calculate_overload, consistency_from_snapshots, goal_adherence, AdherenceReport,
    ConsistencyResult, OverloadReport,
};
use crate::error::Result;
use crate::insights::{find_correlations, hr_drift, sleep_insights};
use crate::insights::{CorrelationReport, HrDriftReport, SleepInsightsReport};
use crate::models::Snapshot;
use crate::pmc::{
    project_detraining, project_forward, summarize_week, DetrainingPoint, Projection,
    WeeklySummary,
};
use crate::race::{race_predictor, RacePredictorReport};
use crate::recovery::{readiness_score, recommend, ReadinessScore, Recommendation};
use crate::risk::{calculate_injury_risk, InjuryRisk};
use crate::source::SnapshotSource;
use crate::stats::serialize_opt_round1;
use crate::suggestion::{suggest_workout, WorkoutSuggestion};
use crate::taper::{compute_taper_schedule, TaperModel, TaperPlan};
use crate::thresholds::{consistency as consistency_cfg, injury, insights as insights_cfg};
use crate::thresholds::{hr_drift as drift_cfg, readiness as readiness_cfg, sleep as sleep_cfg};
use crate::thresholds::training_load;
use crate::zones::{TrainingZones, ZoneCalculator};

const SUMMARY_WINDOW: usize = 14;
const ADHERENCE_WINDOW: usize = 60;

/// Today's load as stored on the latest snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadState {
    pub ctl: f64,
    pub atl: f64,
    pub tsb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionsView {
    pub current: Option<LoadState>,
    pub projections: Vec<Projection>,
    pub days_to_positive_tsb: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetrainingView {
    pub points: Vec<DetrainingPoint>,
    #[serde(serialize_with = "serialize_opt_round1")]
    pub current_ctl: Option<f64>,
    #[serde(serialize_with = "serialize_opt_round1")]
    pub current_atl: Option<f64>,
    pub message: String,
}

/// Every analysis the dashboard can run by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Analysis {
    Consistency,
    Projections,
    InjuryRisk,
    Correlations,
    Race,
    Summary,
    Adherence,
    Readiness,
    Suggestion,
    Overload,
    Zones,
    HrDrift,
    Sleep,
    Detraining,
    Recommendation,
}

impl Analysis {
    pub const ALL: [Analysis; 15] = [
        Analysis::Consistency,
        Analysis::Projections,
        Analysis::InjuryRisk,
        Analysis::Correlations,
        Analysis::Race,
        Analysis::Summary,
        Analysis::Adherence,
        Analysis::Readiness,
        Analysis::Suggestion,
        Analysis::Overload,
        Analysis::Zones,
        Analysis::HrDrift,
        Analysis::Sleep,
        Analysis::Detraining,
        Analysis::Recommendation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Analysis::Consistency => "consistency",
            Analysis::Projections => "projections",
            Analysis::InjuryRisk => "injury-risk",
            Analysis::Correlations => "correlations",
            Analysis::Race => "race",
            Analysis::Summary => "summary",
            Analysis::Adherence => "adherence",
            Analysis::Readiness => "readiness",
            Analysis::Suggestion => "suggestion",
            Analysis::Overload => "overload",
            Analysis::Zones => "zones",
            Analysis::HrDrift => "hr-drift",
            Analysis::Sleep => "sleep",
            Analysis::Detraining => "detraining",
            Analysis::Recommendation => "recommendation",
        }
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Analysis {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Analysis::ALL
            .into_iter()
            .find(|a| a.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Analysis::ALL.iter().map(|a| a.name()).collect();
                format!("Unknown analysis '{}', expected one of: {}", s, names.join(", "))
            })
    }
}

/// Analytics over the snapshots in `S`
pub struct Dashboard<S> {
    source: S,
    athlete: AthleteSettings,
}

impl<S: SnapshotSource> Dashboard<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            athlete: AthleteSettings::default(),
        }
    }

    /// Pin heart rate values instead of reading them from the latest snapshot
    pub fn with_athlete(mut self, athlete: AthleteSettings) -> Self {
        self.athlete = athlete;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    fn rows(&self, window: usize) -> Result<Vec<Snapshot>> {
        let rows = self.source.fetch_recent(window)?;
        tracing::trace!(window, fetched = rows.len(), "Fetched snapshot window");
        Ok(rows)
    }

    fn latest(&self) -> Result<Option<Snapshot>> {
        self.source.fetch_latest()
    }

    pub fn latest_snapshot(&self) -> Result<Option<Snapshot>> {
        self.latest()
    }

    pub fn consistency(&self) -> Result<ConsistencyResult> {
        Ok(consistency_from_snapshots(&self.rows(consistency_cfg::WINDOW_DAYS)?))
    }

    pub fn projections(&self) -> Result<ProjectionsView> {
        let latest = self.latest()?;
        let state = latest.as_ref().and_then(|s| Some((s.ctl?, s.atl?, s.ramp_rate)));

        let Some((ctl, atl, ramp_rate)) = state else {
            return Ok(ProjectionsView {
                current: None,
                projections: Vec::new(),
                days_to_positive_tsb: None,
                message: Some("Need CTL and ATL data for projections".to_string()),
            });
        };

        let report = project_forward(ctl, atl, ramp_rate, training_load::PROJECTION_DAYS);
        Ok(ProjectionsView {
            current: Some(LoadState {
                ctl,
                atl,
                tsb: ctl - atl,
            }),
            projections: report.projections,
            days_to_positive_tsb: report.days_to_positive_tsb,
            message: None,
        })
    }

    pub fn injury_risk(&self) -> Result<InjuryRisk> {
        Ok(calculate_injury_risk(&self.rows(injury::WINDOW_DAYS)?))
    }

    pub fn correlations(&self) -> Result<CorrelationReport> {
        Ok(find_correlations(&self.rows(insights_cfg::WINDOW_DAYS)?))
    }

    pub fn race_predictions(&self) -> Result<RacePredictorReport> {
        Ok(race_predictor(self.latest()?.as_ref()))
    }

    pub fn weekly_summary(&self) -> Result<WeeklySummary> {
        Ok(summarize_week(&self.rows(SUMMARY_WINDOW)?))
    }

    pub fn goal_adherence(&self, target_km: f64) -> Result<AdherenceReport> {
        Ok(goal_adherence(target_km, &self.rows(ADHERENCE_WINDOW)?))
    }

    pub fn readiness(&self) -> Result<ReadinessScore> {
        Ok(readiness_score(&self.rows(readiness_cfg::WINDOW_DAYS)?))
    }

    /// Workout for `today`, using the weekday to place long runs
    pub fn workout_suggestion(&self, today: NaiveDate) -> Result<WorkoutSuggestion> {
        let latest = self.latest()?.unwrap_or_default();
        Ok(suggest_workout(
            latest.tsb,
            latest.sleep_score,
            today.weekday(),
            &latest.weekly_volumes(),
        ))
    }

    pub fn overload(&self) -> Result<OverloadReport> {
        let latest = self.latest()?.unwrap_or_default();
        Ok(calculate_overload(&latest.weekly_volumes()))
    }

    /// Zones from the latest snapshot, with athlete settings taking precedence
    pub fn training_zones(&self) -> Result<TrainingZones> {
        let latest = self.latest()?.unwrap_or_default();
        Ok(ZoneCalculator::training_zones(
            self.athlete.resting_hr.or(latest.resting_hr),
            self.athlete.max_hr.or(latest.max_hr),
            latest.critical_speed,
        ))
    }

    pub fn hr_drift(&self) -> Result<HrDriftReport> {
        Ok(hr_drift(&self.rows(drift_cfg::WINDOW_DAYS)?))
    }

    pub fn sleep_insights(&self) -> Result<SleepInsightsReport> {
        Ok(sleep_insights(&self.rows(sleep_cfg::WINDOW_DAYS)?))
    }

    pub fn detraining(&self) -> Result<DetrainingView> {
        let latest = self.latest()?;
        let state = latest.as_ref().and_then(|s| Some((s.ctl?, s.atl?)));

        Ok(match state {
            Some((ctl, atl)) => DetrainingView {
                points: project_detraining(ctl, atl, training_load::DETRAINING_WEEKS),
                current_ctl: Some(ctl),
                current_atl: Some(atl),
                message: format!(
                    "If you stop training, fitness (CTL) drops from {:.1} over {} weeks",
                    ctl,
                    training_load::DETRAINING_WEEKS
                ),
            },
            None => DetrainingView {
                points: Vec::new(),
                current_ctl: None,
                current_atl: None,
                message: "Need CTL and ATL data for detraining projection".to_string(),
            },
        })
    }

    pub fn taper(&self, race_date: &str, today: NaiveDate, model: TaperModel) -> Result<TaperPlan> {
        let ctl = self.latest()?.and_then(|s| s.ctl);
        Ok(compute_taper_schedule(race_date, today, ctl, model))
    }

    pub fn recommendation(&self) -> Result<Recommendation> {
        Ok(match self.latest()? {
            Some(s) => recommend(s.tsb, s.hrv, s.sleep_score, s.fatigue),
            None => Recommendation::no_data(),
        })
    }

    /// Run an analysis by name and return its JSON form.
    ///
    /// Adherence uses the athlete's weekly target and reports that no goal
    /// is set when there is none.
    pub fn run(&self, analysis: Analysis, today: NaiveDate) -> Result<serde_json::Value> {
        let value = match analysis {
            Analysis::Consistency => serde_json::to_value(self.consistency()?)?,
            Analysis::Projections => serde_json::to_value(self.projections()?)?,
            Analysis::InjuryRisk => serde_json::to_value(self.injury_risk()?)?,
            Analysis::Correlations => serde_json::to_value(self.correlations()?)?,
            Analysis::Race => serde_json::to_value(self.race_predictions()?)?,
            Analysis::Summary => serde_json::to_value(self.weekly_summary()?)?,
            Analysis::Adherence => {
                let target = self.athlete.weekly_km_target.unwrap_or(0.0);
                serde_json::to_value(self.goal_adherence(target)?)?
            }
            Analysis::Readiness => serde_json::to_value(self.readiness()?)?,
            Analysis::Suggestion => serde_json::to_value(self.workout_suggestion(today)?)?,
            Analysis::Overload => serde_json::to_value(self.overload()?)?,
            Analysis::Zones => serde_json::to_value(self.training_zones()?)?,
            Analysis::HrDrift => serde_json::to_value(self.hr_drift()?)?,
            Analysis::Sleep => serde_json::to_value(self.sleep_insights()?)?,
            Analysis::Detraining => serde_json::to_value(self.detraining()?)?,
            Analysis::Recommendation => serde_json::to_value(self.recommendation()?)?,
        };
        tracing::debug!(%analysis, "Ran analysis");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DatabaseError, RunStatusError};
    use crate::source::MemorySource;

    struct FailingSource;

    impl SnapshotSource for FailingSource {
        fn fetch_recent(&self, _limit: usize) -> Result<Vec<Snapshot>> {
            Err(RunStatusError::Database(DatabaseError::ConnectionFailed {
                reason: "disk gone".to_string(),
            }))
        }
    }

    fn latest_only(snapshot: Snapshot) -> Dashboard<MemorySource> {
        Dashboard::new(MemorySource::new(vec![snapshot]))
    }

    #[test]
    fn test_analysis_names_round_trip() {
        for analysis in Analysis::ALL {
            assert_eq!(analysis.name().parse::<Analysis>(), Ok(analysis));
        }
        assert_eq!("hr_drift".parse::<Analysis>(), Ok(Analysis::HrDrift));
        assert!("vo2".parse::<Analysis>().unwrap_err().contains("injury-risk"));
    }

    #[test]
    fn test_empty_source_degrades() {
        let dashboard = Dashboard::new(MemorySource::default());
        let today = NaiveDate::from_ymd_opt(2024, 9, 23).unwrap();

        let projections = dashboard.projections().unwrap();
        assert!(projections.projections.is_empty());
        assert!(projections.message.is_some());

        assert_eq!(
            dashboard.recommendation().unwrap().recommendation,
            "No data available"
        );
        assert_eq!(dashboard.consistency().unwrap().score, None);
        assert!(dashboard.detraining().unwrap().points.is_empty());

        for analysis in Analysis::ALL {
            assert!(dashboard.run(analysis, today).is_ok(), "{} failed", analysis);
        }
    }

    #[test]
    fn test_storage_errors_propagate() {
        let dashboard = Dashboard::new(FailingSource);
        assert!(matches!(
            dashboard.readiness(),
            Err(RunStatusError::Database(_))
        ));
        assert!(dashboard.recommendation().is_err());
    }

    #[test]
    fn test_projections_from_latest() {
        let dashboard = latest_only(Snapshot {
            ctl: Some(50.0),
            atl: Some(60.0),
            ramp_rate: Some(3.5),
            ..Snapshot::new("2024-09-23T07:00:00")
        });

        let view = dashboard.projections().unwrap();
        let current = view.current.unwrap();
        assert_eq!(current.tsb, -10.0);
        assert_eq!(view.projections.len(), 7);
        assert_eq!(view.days_to_positive_tsb, Some(2));
        assert!(view.message.is_none());
    }

    #[test]
    fn test_adherence_needs_a_weekly_target() {
        let today = NaiveDate::from_ymd_opt(2024, 9, 23).unwrap();
        let rows: Vec<Snapshot> = (0..20)
            .map(|i| Snapshot {
                week_0_km: Some(3.0),
                ..Snapshot::new((today - chrono::Duration::days(i)).format("%Y-%m-%d").to_string())
            })
            .collect();

        let unset = Dashboard::new(MemorySource::new(rows.clone()));
        let value = unset.run(Analysis::Adherence, today).unwrap();
        assert_eq!(value["message"], "No weekly goal set");
        assert!(value["overall_pct"].is_null());
        assert_eq!(value["weeks"].as_array().map(Vec::len), Some(0));

        let set = Dashboard::new(MemorySource::new(rows)).with_athlete(AthleteSettings {
            weekly_km_target: Some(30.0),
            ..AthleteSettings::default()
        });
        let value = set.run(Analysis::Adherence, today).unwrap();
        assert_eq!(value["message"], "Hit goal 0/4 weeks (0%)");
    }

    #[test]
    fn test_zones_prefer_athlete_settings() {
        let dashboard = latest_only(Snapshot {
            resting_hr: Some(60),
            max_hr: Some(180),
            critical_speed: Some(4.0),
            ..Snapshot::new("2024-09-23")
        })
        .with_athlete(AthleteSettings {
            resting_hr: Some(50),
            max_hr: Some(190),
            weekly_km_target: None,
        });

        let zones = dashboard.training_zones().unwrap();
        assert_eq!(zones.hr_zones[0].hr_low, 120);
        assert_eq!(zones.pace_zones.len(), 6);
    }

    #[test]
    fn test_suggestion_uses_today() {
        let dashboard = latest_only(Snapshot {
            tsb: Some(2.0),
            ..Snapshot::new("2024-09-23")
        });
        let saturday = NaiveDate::from_ymd_opt(2024, 9, 28).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2024, 9, 24).unwrap();

        let weekend = dashboard.workout_suggestion(saturday).unwrap();
        assert_eq!(weekend.title, "Long Run");
        let midweek = dashboard.workout_suggestion(tuesday).unwrap();
        assert_eq!(midweek.title, "Tempo Run");
    }

    #[test]
    fn test_taper_uses_latest_ctl() {
        let dashboard = latest_only(Snapshot {
            ctl: Some(60.0),
            ..Snapshot::new("2024-09-23")
        });
        let today = NaiveDate::from_ymd_opt(2024, 9, 23).unwrap();

        let plan = dashboard
            .taper("2024-10-20", today, TaperModel::Linear)
            .unwrap();
        assert_eq!(plan.current_ctl, Some(60.0));
        assert_eq!(plan.taper_weeks, 3);
        assert!(plan.error.is_none());
    }
}
