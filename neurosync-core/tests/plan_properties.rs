use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, TimeZone, Utc};
use neurosync_core::{
    plan_order, Candidate, MoodModel, MoodSensitivity, MoodSignal, MoodState, Plan,
    PriorityScheduler, Priority, TimeBudget, TimeSlot, UnscheduledReason,
};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}

type Parts = (i32, Option<i64>, u8, u8, u32, u16);

fn arb_parts() -> impl Strategy<Value = Parts> {
    (
        5i32..=120,
        proptest::option::of(-120i64..=2880),
        0u8..4,
        0u8..3,
        0u32..15,
        any::<u16>(),
    )
}

/// Candidates whose dependency bits point only at earlier items (a DAG).
fn build_candidates(parts: &[Parts], with_deps: bool) -> Vec<Candidate> {
    parts
        .iter()
        .enumerate()
        .map(|(i, &(dur, deadline_min, prio, sens, cycles, dep_bits))| {
            let mut c = Candidate::task(format!("c{i}"), format!("Candidate {i}"))
                .with_duration(dur)
                .with_pending_cycles(cycles)
                .with_priority(match prio {
                    0 => Priority::Low,
                    1 => Priority::Medium,
                    2 => Priority::High,
                    _ => Priority::Urgent,
                })
                .with_sensitivity(match sens {
                    0 => MoodSensitivity::Light,
                    1 => MoodSensitivity::Heavy,
                    _ => MoodSensitivity::Neutral,
                });
            if let Some(m) = deadline_min {
                c = c.with_deadline(now() + Duration::minutes(m));
            }
            if with_deps {
                for j in 0..i.min(16) {
                    if dep_bits & (1 << j) != 0 {
                        c = c.with_dependency(format!("c{j}"));
                    }
                }
            }
            c
        })
        .collect()
}

fn mood() -> MoodState {
    MoodState {
        value: 0.4,
        confidence: 0.5,
        signals: 2,
    }
}

fn assert_accounted_once(plan: &Plan, candidates: &[Candidate]) {
    let mut seen = HashSet::new();
    for id in plan.order() {
        assert!(seen.insert(id.to_string()), "{id} scheduled twice");
    }
    for u in plan.unscheduled() {
        assert!(seen.insert(u.id.clone()), "{} both scheduled and unscheduled", u.id);
    }
    assert_eq!(seen.len(), candidates.len());
}

fn assert_fits_budget(plan: &Plan, budget: &TimeBudget) {
    assert!(plan.scheduled_minutes() <= budget.total_minutes());
    let mut per_slot: HashMap<usize, i32> = HashMap::new();
    for e in plan.entries() {
        *per_slot.entry(e.slot_index).or_default() += e.minutes();
        let slot = budget.slots()[e.slot_index];
        assert!(e.start >= slot.start && e.end <= slot.end());
    }
    for (idx, used) in per_slot {
        assert!(used <= budget.slots()[idx].minutes);
    }
}

fn assert_no_overlap(plan: &Plan) {
    for pair in plan.timeline().windows(2) {
        assert!(pair[0].end <= pair[1].start, "{} overlaps {}", pair[0].id(), pair[1].id());
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        failure_persistence: None,
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn independent_candidates_come_out_in_score_order(
        parts in prop::collection::vec(arb_parts(), 0..14),
    ) {
        let candidates = build_candidates(&parts, false);
        let total: i32 = candidates.iter().map(|c| c.estimated_duration).sum();
        let budget = TimeBudget::single(now(), total.max(1)).unwrap();
        let scheduler = PriorityScheduler::default();

        let plan = scheduler.build(&candidates, &budget, &mood(), now()).unwrap();

        let mut expected: Vec<_> = candidates
            .iter()
            .map(|c| scheduler.engine().score(c, &mood(), now()))
            .collect();
        expected.sort_by(plan_order);
        let expected_ids: Vec<&str> = expected.iter().map(|s| s.candidate.id.as_str()).collect();
        prop_assert_eq!(plan.order(), expected_ids);
    }

    #[test]
    fn tight_budget_keeps_score_order_and_capacity(
        parts in prop::collection::vec(arb_parts(), 1..14),
        slot_a in 10i32..120,
        slot_b in 10i32..120,
    ) {
        let candidates = build_candidates(&parts, false);
        let budget = TimeBudget::new(vec![
            TimeSlot::new(now(), slot_a),
            TimeSlot::new(now() + Duration::hours(4), slot_b),
        ]).unwrap();

        let plan = PriorityScheduler::default()
            .build(&candidates, &budget, &mood(), now())
            .unwrap();

        for pair in plan.entries().windows(2) {
            let ord = plan_order(&pair[0].scored, &pair[1].scored);
            prop_assert_ne!(ord, std::cmp::Ordering::Greater);
        }
        assert_fits_budget(&plan, &budget);
        assert_no_overlap(&plan);
        assert_accounted_once(&plan, &candidates);
    }

    #[test]
    fn dependencies_always_precede_dependents(
        parts in prop::collection::vec(arb_parts(), 1..14),
        slot_a in 15i32..240,
        gap in 0i64..180,
        slot_b in 15i32..240,
    ) {
        let candidates = build_candidates(&parts, true);
        let budget = TimeBudget::new(vec![
            TimeSlot::new(now(), slot_a),
            TimeSlot::new(now() + Duration::minutes(slot_a as i64 + gap), slot_b),
        ]).unwrap();

        let plan = PriorityScheduler::default()
            .build(&candidates, &budget, &mood(), now())
            .unwrap();

        let position: HashMap<&str, usize> =
            plan.order().into_iter().enumerate().map(|(i, id)| (id, i)).collect();
        for e in plan.entries() {
            for dep in &e.scored.candidate.dependencies {
                let dep_pos = position.get(dep.as_str());
                prop_assert!(dep_pos.is_some(), "{} scheduled without dependency {}", e.id(), dep);
                prop_assert!(dep_pos.copied() < position.get(e.id()).copied());
                let dep_entry = plan.entry(dep).unwrap();
                prop_assert!(dep_entry.end <= e.start, "{} starts before {} ends", e.id(), dep);
            }
        }
        assert_fits_budget(&plan, &budget);
        assert_no_overlap(&plan);
        assert_accounted_once(&plan, &candidates);
    }

    #[test]
    fn cycles_are_excluded_and_the_rest_schedules(
        parts in prop::collection::vec(arb_parts(), 0..10),
    ) {
        let mut candidates = build_candidates(&parts, true);
        for (id, dep) in [("loop-a", "loop-b"), ("loop-b", "loop-a")] {
            candidates.push(Candidate::task(id, "Loop item").with_duration(5).with_dependency(dep));
        }
        let total: i32 = candidates.iter().map(|c| c.estimated_duration).sum();
        let budget = TimeBudget::single(now(), total).unwrap();

        let plan = PriorityScheduler::default()
            .build(&candidates, &budget, &mood(), now())
            .unwrap();

        for id in ["loop-a", "loop-b"] {
            prop_assert!(plan.entry(id).is_none());
            let is_cycle = matches!(
                plan.unscheduled_reason(id),
                Some(UnscheduledReason::DependencyCycle { .. })
            );
            prop_assert!(is_cycle);
        }
        // Generated items only depend on each other, so all of them fit.
        prop_assert_eq!(plan.entries().len(), candidates.len() - 2);
    }

    #[test]
    fn repeated_signal_converges_and_confidence_stays_capped(
        value in -1.0f64..=1.0,
        start in -1.0f64..=1.0,
    ) {
        let mut m = MoodModel::default();
        m.update(MoodSignal::new(start, now())).unwrap();
        for _ in 0..60 {
            m.update(MoodSignal::new(value, now())).unwrap();
            prop_assert!(m.current().confidence <= m.config().confidence_cap);
            prop_assert!(m.current().confidence >= 0.0);
        }
        prop_assert!((m.current().value - value).abs() < 1e-6);
    }
}
