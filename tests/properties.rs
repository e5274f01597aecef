use std::rc::Rc;
use std::time::Duration;

use proptest::prelude::*;

use pacer::clock::ManualClock;
use pacer::report::Report;
use pacer::runtime::FrameScheduler;
use pacer::schedule::ScheduleEngine;
use pacer::section::Section;
use pacer::tracker::ElapsedTracker;

fn sections_strategy() -> impl Strategy<Value = Vec<Section>> {
    prop::collection::vec((0u32..30, 0u32..60), 1..8).prop_map(|durations| {
        durations
            .into_iter()
            .enumerate()
            .map(|(i, (m, s))| Section::new(format!("S{i}"), "", m as f64, s as f64))
            .collect()
    })
}

fn engine(sections: Vec<Section>, clock: &ManualClock) -> ScheduleEngine<ManualClock> {
    ScheduleEngine::start(sections, clock.clone(), Rc::new(FrameScheduler::new())).unwrap()
}

proptest! {
    #[test]
    fn elapsed_is_sum_of_run_intervals(
        intervals in prop::collection::vec((0u64..5_000, 0u64..5_000, 0usize..4), 0..20)
    ) {
        let clock = ManualClock::new();
        let mut tracker = ElapsedTracker::new(clock.clone(), Rc::new(FrameScheduler::new()));
        let mut expected = Duration::ZERO;

        for (run_ms, gap_ms, refreshes) in intervals {
            tracker.play();
            // observers may read at any cadence without disturbing the total
            for _ in 0..refreshes {
                clock.advance_ms(run_ms / (refreshes as u64 + 1));
                let _ = tracker.elapsed();
            }
            clock.advance_ms(run_ms - (run_ms / (refreshes as u64 + 1)) * refreshes as u64);
            tracker.pause();
            expected += Duration::from_millis(run_ms);

            clock.advance_ms(gap_ms);
            prop_assert_eq!(tracker.elapsed(), expected);
        }
    }

    #[test]
    fn reset_sets_exact_baseline(baseline_ms in 0u32..10_000_000, running in any::<bool>()) {
        let clock = ManualClock::new();
        let mut tracker = ElapsedTracker::new(clock.clone(), Rc::new(FrameScheduler::new()));
        if running {
            tracker.play();
            clock.advance_secs(7);
        }
        tracker.reset_ms(baseline_ms as f64);
        prop_assert!(!tracker.is_running());
        prop_assert!((tracker.elapsed_seconds() - baseline_ms as f64 / 1000.0).abs() < 1e-6);
    }

    #[test]
    fn report_totals_match_sums(
        sections in sections_strategy(),
        raw_history in prop::collection::vec(prop::option::of(0u32..3_600), 0..10)
    ) {
        let history: Vec<Option<f64>> = raw_history.into_iter().map(|h| h.map(f64::from)).collect();
        let report = Report::build(&sections, &history);

        let planned: f64 = sections.iter().map(Section::planned_secs).sum();
        let actual: f64 = (0..sections.len())
            .map(|i| history.get(i).copied().flatten().unwrap_or(0.0))
            .sum();

        prop_assert_eq!(report.rows.len(), sections.len());
        prop_assert_eq!(report.totals.planned_sec, planned);
        prop_assert_eq!(report.totals.actual_sec, actual);
        let last = report.rows.last().unwrap();
        prop_assert!((last.cumulative_deviation_sec - (actual - planned)).abs() < 1e-9);
    }

    #[test]
    fn navigation_never_touches_presentation_clock(
        sections in sections_strategy(),
        moves in prop::collection::vec((1u64..300, 0usize..8), 1..15)
    ) {
        let clock = ManualClock::new();
        let mut engine = engine(sections, &clock);
        engine.toggle_play_pause();
        let mut total = 0.0;
        let mut in_section = 0.0;

        for (secs, target) in moves {
            clock.advance_secs(secs);
            total += secs as f64;
            in_section += secs as f64;
            let from = engine.current_index();
            let before = engine.global_elapsed();

            engine.go_to_section(target, true);

            prop_assert_eq!(engine.global_elapsed(), before);
            if target != from && target < engine.sections().len() {
                prop_assert_eq!(engine.history()[from], Some(in_section));
                prop_assert_eq!(engine.section_elapsed(), 0.0);
                in_section = 0.0;
            }
            engine.run_deferred();
            prop_assert!(engine.is_running());
        }

        prop_assert_eq!(engine.global_elapsed(), total);
    }

    #[test]
    fn on_schedule_run_has_zero_deviation(sections in sections_strategy()) {
        let clock = ManualClock::new();
        let count = sections.len();
        let planned: Vec<u64> = sections.iter().map(|s| s.planned_secs() as u64).collect();
        let mut engine = engine(sections, &clock);
        engine.toggle_play_pause();

        for (i, secs) in planned.into_iter().enumerate() {
            clock.advance_secs(secs);
            prop_assert_eq!(engine.schedule_deviation(), 0);
            if i + 1 < count {
                engine.go_next();
                engine.run_deferred();
            }
        }
    }
}
