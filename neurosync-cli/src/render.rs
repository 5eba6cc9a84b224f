use std::fmt::Write;

use chrono_tz::Tz;
use neurosync_core::{AnnotationKind, Plan, UnscheduledReason};

fn kind_label(kind: AnnotationKind) -> &'static str {
    match kind {
        AnnotationKind::Breakdown => "breakdown",
        AnnotationKind::LearningPath => "learning path",
        AnnotationKind::MoodInsight => "mood",
    }
}

fn reason_label(reason: &UnscheduledReason) -> String {
    match reason {
        UnscheduledReason::DependencyCycle { cycle } => {
            format!("dependency cycle ({})", cycle.join(" -> "))
        }
        UnscheduledReason::BlockedByDependency { waiting_on } => {
            format!("waiting on {}", waiting_on.join(", "))
        }
        UnscheduledReason::ExceedsBudget => "longer than any free slot".to_string(),
        UnscheduledReason::InsufficientCapacity => "not enough time left today".to_string(),
    }
}

pub fn render_text(plan: &Plan, tz: Tz) -> String {
    let mut out = String::new();
    let day = plan.generated_at().with_timezone(&tz).date_naive();

    let _ = writeln!(out, "# Plan for {day} ({tz})\n");
    let mood = plan.mood();
    if mood.is_empty() {
        let _ = writeln!(out, "Mood: no signals yet");
    } else {
        let _ = writeln!(
            out,
            "Mood: {:+.2} (confidence {:.2}, {} signal{})",
            mood.value,
            mood.confidence,
            mood.signals,
            if mood.signals == 1 { "" } else { "s" }
        );
    }
    let _ = writeln!(
        out,
        "Time: {} of {} min scheduled\n",
        plan.scheduled_minutes(),
        plan.capacity_minutes()
    );

    if plan.entries().is_empty() {
        let _ = writeln!(out, "Nothing scheduled.");
    }
    for (i, e) in plan.timeline().into_iter().enumerate() {
        let c = &e.scored.candidate;
        let _ = writeln!(
            out,
            "{}. {}-{}  {}  [{}, {}m, score {:.2}]",
            i + 1,
            e.start.with_timezone(&tz).format("%H:%M"),
            e.end.with_timezone(&tz).format("%H:%M"),
            c.title,
            format!("{:?}", c.kind).to_lowercase(),
            c.estimated_duration,
            e.scored.score
        );
        for a in &e.annotations {
            let _ = writeln!(out, "   {} ({}):", kind_label(a.kind), a.provider);
            if a.steps.is_empty() {
                let _ = writeln!(out, "     {}", a.text);
            }
            for s in &a.steps {
                let _ = writeln!(out, "     - {s}");
            }
        }
    }

    if !plan.unscheduled().is_empty() {
        let _ = writeln!(out, "\nNot scheduled:");
        for u in plan.unscheduled() {
            let _ = writeln!(out, "- {}: {}", u.id, reason_label(&u.reason));
        }
    }

    if !plan.notes().is_empty() {
        let _ = writeln!(out, "\nNotes:");
        for n in plan.notes() {
            let _ = writeln!(out, "- [{}] {}", kind_label(n.kind), n.text);
        }
    }

    out
}

pub fn render_json(plan: &Plan) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(plan)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use neurosync_core::{Candidate, MoodModel, Priority, PriorityScheduler, TimeBudget, TimeSlot};

    #[test]
    fn test_text_lists_order_and_reasons() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap();
        let candidates = vec![
            Candidate::task("A", "Write lab report")
                .with_duration(30)
                .with_deadline(now + Duration::hours(1)),
            Candidate::task("B", "Submit lab report").with_duration(60).with_dependency("A"),
            Candidate::habit("C", "Stretching").with_duration(20),
        ];
        let budget = TimeBudget::single(now, 90).unwrap();
        let plan = PriorityScheduler::default()
            .build(&candidates, &budget, &MoodModel::default().current(), now)
            .unwrap();

        let text = render_text(&plan, chrono_tz::Africa::Nairobi);

        assert!(text.contains("# Plan for 2026-03-02 (Africa/Nairobi)"));
        assert!(text.contains("1. 09:00-09:30  Write lab report"));
        assert!(text.contains("2. 09:30-09:50  Stretching"));
        assert!(text.contains("- B: not enough time left today"));
        assert!(text.contains("Time: 50 of 90 min scheduled"));
        assert!(text.contains("Mood: no signals yet"));
    }

    #[test]
    fn test_text_lists_entries_by_start_time() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap();
        let budget = TimeBudget::new(vec![
            TimeSlot::new(now, 30),
            TimeSlot::new(now + Duration::hours(3), 45),
        ])
        .unwrap();
        let candidates = vec![
            Candidate::task("a", "Long focus").with_duration(45).with_priority(Priority::Urgent),
            Candidate::task("b", "Short focus").with_duration(30),
        ];
        let plan = PriorityScheduler::default()
            .build(&candidates, &budget, &MoodModel::default().current(), now)
            .unwrap();
        assert_eq!(plan.order(), vec!["a", "b"]);

        let text = render_text(&plan, chrono_tz::Africa::Nairobi);

        assert!(text.contains("1. 09:00-09:30  Short focus"));
        assert!(text.contains("2. 12:00-12:45  Long focus"));
    }
}
