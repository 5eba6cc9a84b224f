use neurosync_core::{Candidate, CandidateKind, MoodState, Plan};

pub fn system_prompt() -> String {
    "You are NeuroSync, a calm planning companion for someone managing tasks, habits and goals.\n\
The user is capable; treat them with respect and keep answers short.\n\
Never use pathologizing language.\n\
When asked for steps, reply with a numbered list only: one concrete action per line, no preamble."
        .to_string()
}

fn describe(c: &Candidate) -> String {
    let mut s = format!("\"{}\" ({} minutes)", c.title, c.estimated_duration);
    if let Some(d) = c.description.as_deref().filter(|d| !d.trim().is_empty()) {
        s.push_str(&format!("\nDetails: {}", d.trim()));
    }
    s
}

pub fn breakdown(c: &Candidate, max_steps: usize) -> String {
    let what = match c.kind {
        CandidateKind::Habit => "habit session",
        _ => "task",
    };
    format!(
        "Break this {what} into at most {max_steps} small steps that fit its time box:\n{}",
        describe(c)
    )
}

pub fn learning_path(c: &Candidate, max_steps: usize) -> String {
    format!(
        "Suggest a learning path of at most {max_steps} steps toward this goal. \
Start with something doable today:\n{}",
        describe(c)
    )
}

/// Plan-level note. Mood is reported on the -1 (energetic) .. +1 (calm) scale.
pub fn mood_insight(mood: &MoodState, plan: &Plan) -> String {
    let feel = if mood.value <= -0.3 {
        "energetic"
    } else if mood.value >= 0.3 {
        "calm, lower energy"
    } else {
        "steady"
    };
    let titles: Vec<&str> = plan
        .entries()
        .iter()
        .map(|e| e.scored.candidate.title.as_str())
        .collect();
    format!(
        "Today's mood reads as {feel} (score {:.2}, confidence {:.2}).\n\
Planned in order: {}.\n\
In two sentences, suggest how to pace this plan for that mood.",
        mood.value,
        mood.confidence,
        if titles.is_empty() { "nothing yet".to_string() } else { titles.join(", ") }
    )
}
