use proptest::prelude::*;
use runstatus::consistency::{calculate_consistency_score, calculate_overload, training_monotony};
use runstatus::pmc::{project_detraining, project_forward};
use runstatus::recovery::readiness_score;
use runstatus::risk::calculate_injury_risk;
use runstatus::race::predict_race_time;
use runstatus::Snapshot;

fn snapshot_strategy() -> impl Strategy<Value = Snapshot> {
    (
        prop::option::of(-60.0f64..40.0),
        prop::option::of(20.0f64..120.0),
        prop::option::of(0.0f64..100.0),
        prop::option::of(1u8..=5),
        prop::option::of(1u8..=5),
        prop::option::of(-10.0f64..15.0),
        prop::option::of(0.5f64..2.2),
        prop::option::of(0u32..4),
    )
        .prop_map(
            |(tsb, hrv, sleep_score, fatigue, soreness, ramp_rate, ac_ratio, rest_days)| Snapshot {
                tsb,
                hrv,
                sleep_score,
                fatigue,
                soreness,
                ramp_rate,
                ac_ratio,
                rest_days,
                ..Snapshot::new("2024-09-23")
            },
        )
}

proptest! {
    #[test]
    fn projection_has_one_point_per_day(
        ctl in 0.0f64..150.0,
        atl in 0.0f64..200.0,
        ramp in prop::option::of(-10.0f64..10.0),
        days in 0u32..30,
    ) {
        let report = project_forward(ctl, atl, ramp, days);
        prop_assert_eq!(report.projections.len(), days as usize);
        for (i, p) in report.projections.iter().enumerate() {
            prop_assert_eq!(p.day, i as u32 + 1);
            prop_assert!((p.tsb - (p.ctl - p.atl)).abs() < 1e-9);
        }
    }

    #[test]
    fn steeper_ramp_lifts_every_projected_day(
        ctl in 0.0f64..150.0,
        atl in 0.0f64..200.0,
        r1 in -10.0f64..10.0,
        step in 0.01f64..10.0,
    ) {
        let r2 = r1 + step;
        let slow = project_forward(ctl, atl, Some(r1), 7);
        let fast = project_forward(ctl, atl, Some(r2), 7);
        prop_assert_eq!(slow.projections.len(), fast.projections.len());
        for (a, b) in slow.projections.iter().zip(&fast.projections) {
            prop_assert!(b.ctl > a.ctl);
            prop_assert_eq!(b.atl, a.atl);
        }
    }

    #[test]
    fn projected_fatigue_only_falls(ctl in 0.0f64..150.0, atl in 0.0f64..200.0) {
        let report = project_forward(ctl, atl, None, 14);
        for pair in report.projections.windows(2) {
            prop_assert!(pair[1].atl <= pair[0].atl);
            prop_assert!(pair[1].tsb >= pair[0].tsb);
        }
    }

    #[test]
    fn detraining_loses_fitness_monotonically(ctl in 1.0f64..150.0, atl in 0.0f64..200.0) {
        let points = project_detraining(ctl, atl, 6);
        prop_assert_eq!(points.len(), 7);
        prop_assert_eq!(points[0].ctl_pct_lost, 0.0);
        for pair in points.windows(2) {
            prop_assert!(pair[1].ctl < pair[0].ctl);
            prop_assert!(pair[1].ctl_pct_lost > pair[0].ctl_pct_lost);
        }
    }

    #[test]
    fn consistency_scores_stay_in_range(
        volumes in prop::collection::vec(0.0f64..150.0, 0..30),
        rest_days in prop::collection::vec(0u32..7, 0..30),
        monotony in prop::collection::vec(0.0f64..5.0, 0..30),
    ) {
        let result = calculate_consistency_score(&volumes, &rest_days, &monotony);
        if let Some(score) = result.score {
            prop_assert!(score <= 100);
        }
    }

    #[test]
    fn readiness_stays_in_range(rows in prop::collection::vec(snapshot_strategy(), 0..8)) {
        let result = readiness_score(&rows);
        prop_assert!(result.score <= 100);
        let c = result.components;
        for value in [c.tsb, c.hrv_trend, c.sleep, c.fatigue, c.soreness] {
            prop_assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn injury_risk_is_idempotent(rows in prop::collection::vec(snapshot_strategy(), 0..15)) {
        let first = serde_json::to_string(&calculate_injury_risk(&rows)).unwrap();
        let second = serde_json::to_string(&calculate_injury_risk(&rows)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn overload_never_compares_against_empty_week(
        volumes in prop::array::uniform5(prop::option::of(prop_oneof![Just(0.0f64), 1.0f64..80.0])),
    ) {
        let report = calculate_overload(&volumes);
        for week in &report.weeks {
            prop_assert!(week.previous_km > 0.0);
            prop_assert!(week.change_pct.is_finite());
        }
        prop_assert_eq!(report.safe, report.weeks.iter().all(|w| !w.flagged));
    }

    #[test]
    fn longer_races_take_longer(cs in 2.0f64..6.5, d_prime in prop::option::of(50.0f64..400.0)) {
        let distances = [800.0, 1609.34, 5000.0, 10000.0, 21097.5, 42195.0];
        let times: Vec<f64> = distances
            .iter()
            .filter_map(|&m| predict_race_time(m, cs, d_prime))
            .collect();
        prop_assert_eq!(times.len(), distances.len());
        for pair in times.windows(2) {
            prop_assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn monotony_needs_variation(loads in prop::collection::vec(0.0f64..300.0, 0..14)) {
        if let Some(m) = training_monotony(&loads) {
            prop_assert!(loads.len() >= 2);
            prop_assert!(m.monotony.is_finite());
        }
    }
}
