//! Rendering for status, report, and summary output.
//!
//! Everything here is presentation only. Glyphs, not colors, carry status so
//! the output stays readable in plain-text transcripts; ANSI styling is
//! layered on top for terminals.

use chrono::{DateTime, Utc};

use crate::state::{LoopState, NextTask, Outcome, ReportEffect, TaskStatus, truncate_chars};

/// Detail excerpts shown in reports are clipped to this many chars,
/// independent of the 2000-char storage cap.
pub const DETAIL_DISPLAY_CAP: usize = 200;

/// Width of the progress bar in cells.
pub const BAR_WIDTH: usize = 20;

// ANSI color codes
pub struct Colors;

impl Colors {
    pub const RESET: &'static str = "\x1b[0m";
    pub const BOLD: &'static str = "\x1b[1m";
    pub const DIM: &'static str = "\x1b[2m";
    pub const CYAN: &'static str = "\x1b[36m";
    pub const GREEN: &'static str = "\x1b[32m";
    pub const RED: &'static str = "\x1b[31m";
}

pub fn h1(s: &str) -> String {
    format!("{}{}● {}{}", Colors::BOLD, Colors::CYAN, s, Colors::RESET)
}

pub fn h2(s: &str) -> String {
    format!("{}{}▸ {}{}", Colors::BOLD, Colors::GREEN, s, Colors::RESET)
}

pub fn hint(s: &str) -> String {
    format!("{}→ {}{}", Colors::DIM, s, Colors::RESET)
}

/// One fixed glyph per status, distinguishable without color.
pub const fn status_glyph(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "○",
        TaskStatus::InProgress => "▶",
        TaskStatus::Passed => "✓",
        TaskStatus::Failed => "✗",
        TaskStatus::Skipped => "⊘",
    }
}

pub const fn status_word(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::InProgress => "in progress",
        TaskStatus::Passed => "passed",
        TaskStatus::Failed => "failed",
        TaskStatus::Skipped => "skipped",
    }
}

/// Format a wall-clock span: `< 1s`, `42s`, `3m 12s`, `5m`.
pub fn format_duration(total_secs: i64) -> String {
    if total_secs < 1 {
        return "< 1s".to_string();
    }
    if total_secs < 60 {
        return format!("{total_secs}s");
    }
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    if secs == 0 {
        format!("{mins}m")
    } else {
        format!("{mins}m {secs}s")
    }
}

/// Fixed-width bar, filled cells = round(done/total * width).
pub fn progress_bar(done: usize, total: usize) -> String {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = if total == 0 {
        0
    } else {
        ((done as f64 / total as f64) * BAR_WIDTH as f64).round() as usize
    };
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        ((done as f64 / total as f64) * 100.0).round() as u32
    }
}

fn command_line(name: &str, command: Option<&str>) -> String {
    command.map_or_else(
        || format!("   {}{name}: none detected{}", Colors::DIM, Colors::RESET),
        |cmd| format!("   {name}: {cmd}"),
    )
}

/// Output for `taskloop init`: detection results, task count, first task.
pub fn render_init(state: &LoopState) -> String {
    let mut out = Vec::new();
    out.push(h1(&format!("Loop initialized: {}", state.plan_source)));
    out.push(String::new());
    out.push(h2("Commands"));
    out.push(command_line("build", state.build_command.as_deref()));
    out.push(command_line("test", state.test_command.as_deref()));
    out.push(command_line("lint", state.lint_command.as_deref()));
    out.push(String::new());
    let plural = if state.tasks.len() == 1 { "task" } else { "tasks" };
    out.push(h2(&format!(
        "{} {plural}, max {} attempt(s) each",
        state.tasks.len(),
        state.max_retries
    )));
    if let Some(first) = state.tasks.first() {
        out.push(format!("   first: {}", first.description));
    }
    out.push(String::new());
    out.push(hint("Run `taskloop status` to activate the first task"));
    out.join("\n")
}

/// Output for `taskloop status`: progress bar plus the full task list.
pub fn render_status(state: &LoopState) -> String {
    let done = state.done_count();
    let total = state.tasks.len();

    let mut out = Vec::new();
    out.push(h1(&format!("Loop: {}", state.plan_source)));
    out.push(format!(
        "   {} {done}/{total} ({}%)",
        progress_bar(done, total),
        percent(done, total)
    ));
    out.push(String::new());

    for task in &state.tasks {
        let glyph = status_glyph(task.status);
        let mut line = format!("   {glyph} {}. {}", task.index + 1, task.description);
        if !task.iterations.is_empty() {
            line.push_str(&format!(" ({} attempt(s))", task.iterations.len()));
        }
        out.push(line);
        if task.status == TaskStatus::InProgress {
            for criterion in &task.acceptance_criteria {
                out.push(format!("      {}- {criterion}{}", Colors::DIM, Colors::RESET));
            }
        }
    }
    out.push(String::new());

    if state.is_complete() {
        out.push(hint("Loop complete. Run `taskloop summary` for the full report"));
    } else if let Some(idx) = state.active_task() {
        out.push(hint(&format!(
            "Active: {}. Report with `taskloop report <pass|fail|skip>`",
            state.tasks[idx].description
        )));
    }
    out.join("\n")
}

fn retries_phrase(retries_left: u32) -> String {
    if retries_left == 1 {
        "1 retry remaining".to_string()
    } else {
        format!("{retries_left} retries remaining")
    }
}

/// Output for `taskloop report`: what was recorded and what comes next.
pub fn render_report(state: &LoopState, effect: &ReportEffect) -> String {
    let task = &state.tasks[effect.task_index];
    let mut out = Vec::new();

    let headline = match effect.outcome {
        Outcome::Pass => format!(
            "{}{}✓ Task {} passed{} (attempt {})",
            Colors::BOLD,
            Colors::GREEN,
            effect.task_index + 1,
            Colors::RESET,
            effect.attempt
        ),
        Outcome::Fail => format!(
            "{}{}✗ Task {} failed{} (attempt {})",
            Colors::BOLD,
            Colors::RED,
            effect.task_index + 1,
            Colors::RESET,
            effect.attempt
        ),
        Outcome::Skip => format!(
            "{}⊘ Task {} skipped{} (attempt {})",
            Colors::BOLD,
            effect.task_index + 1,
            Colors::RESET,
            effect.attempt
        ),
    };
    out.push(headline);
    out.push(format!("   {}", task.description));

    if let Some(detail) = task.last_iteration().map(|i| i.detail.as_str()) {
        if !detail.is_empty() {
            out.push(format!(
                "   {}{}{}",
                Colors::DIM,
                truncate_chars(detail, DETAIL_DISPLAY_CAP),
                Colors::RESET
            ));
        }
    }

    match &effect.next {
        NextTask::Retry => {
            let retries_left = effect.retries_left.unwrap_or(0);
            out.push(String::new());
            out.push(hint(&format!(
                "Try again: {} for this task",
                retries_phrase(retries_left)
            )));
        }
        NextTask::Promoted(idx) => {
            if effect.new_status == TaskStatus::Failed {
                out.push(hint("Retry budget exhausted; task needs human attention"));
            }
            out.push(String::new());
            out.push(h2(&format!(
                "Next: {}. {}",
                idx + 1,
                state.tasks[*idx].description
            )));
        }
        NextTask::Complete => {
            if effect.new_status == TaskStatus::Failed {
                out.push(hint("Retry budget exhausted; task needs human attention"));
            }
            out.push(String::new());
            out.push(h1("Loop complete"));
            out.push(hint("Run `taskloop summary` for the full report"));
        }
    }
    out.join("\n")
}

/// Output for `taskloop summary`: the tabular wrap-up report.
pub fn render_summary(state: &LoopState, now: DateTime<Utc>) -> String {
    let total = state.tasks.len();
    let passed = count_status(state, TaskStatus::Passed);
    let failed = count_status(state, TaskStatus::Failed);
    let skipped = count_status(state, TaskStatus::Skipped);

    let criteria_total: usize = state.tasks.iter().map(|t| t.acceptance_criteria.len()).sum();
    let criteria_satisfied: usize = state
        .tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Passed)
        .map(|t| t.acceptance_criteria.len())
        .sum();

    let end = state.completed_at.unwrap_or(now);
    let elapsed = format_duration((end - state.started_at).num_seconds());

    let mut out = Vec::new();
    out.push(h1(&format!("Summary: {}", state.plan_source)));
    out.push(String::new());

    for task in &state.tasks {
        out.push(format!(
            "   {} {}. [{}] {} ({} attempt(s))",
            status_glyph(task.status),
            task.index + 1,
            status_word(task.status),
            task.description,
            task.iterations.len()
        ));
    }
    out.push(String::new());

    out.push(h2("Totals"));
    out.push(format!(
        "   passed: {passed}  failed: {failed}  skipped: {skipped}  total: {total}"
    ));
    if criteria_total > 0 {
        out.push(format!(
            "   acceptance criteria satisfied: {criteria_satisfied}/{criteria_total}"
        ));
    }
    out.push(format!("   elapsed: {elapsed}"));

    let failures: Vec<&crate::state::Task> = state
        .tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Failed)
        .collect();
    if !failures.is_empty() {
        out.push(String::new());
        out.push(h2("Failures"));
        for task in failures {
            out.push(format!("   {}. {}", task.index + 1, task.description));
            if let Some(iter) = task.last_iteration() {
                out.push(format!(
                    "      {}{}{}",
                    Colors::DIM,
                    truncate_chars(&iter.detail, DETAIL_DISPLAY_CAP),
                    Colors::RESET
                ));
            }
        }
    }
    out.join("\n")
}

fn count_status(state: &LoopState, status: TaskStatus) -> usize {
    state.tasks.iter().filter(|t| t.status == status).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::ParsedTask;
    use crate::state::CommandSet;

    fn sample_state(descriptions: &[&str]) -> LoopState {
        let parsed = descriptions
            .iter()
            .map(|d| ParsedTask {
                description: (*d).to_string(),
                acceptance_criteria: vec!["it works".to_string()],
            })
            .collect();
        LoopState::new("plan.md", parsed, CommandSet::default(), 3, Utc::now())
    }

    #[test]
    fn duration_formats() {
        assert_eq!(format_duration(0), "< 1s");
        assert_eq!(format_duration(1), "1s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(60), "1m");
        assert_eq!(format_duration(61), "1m 1s");
        assert_eq!(format_duration(192), "3m 12s");
        assert_eq!(format_duration(300), "5m");
    }

    #[test]
    fn progress_bar_fill_is_rounded() {
        assert_eq!(progress_bar(0, 3), format!("[{}]", "░".repeat(20)));
        assert_eq!(progress_bar(3, 3), format!("[{}]", "█".repeat(20)));
        // 1/3 of 20 = 6.67 rounds to 7
        assert_eq!(progress_bar(1, 3), format!("[{}{}]", "█".repeat(7), "░".repeat(13)));
    }

    #[test]
    fn empty_task_list_renders_empty_bar() {
        assert_eq!(progress_bar(0, 0), format!("[{}]", "░".repeat(20)));
    }

    #[test]
    fn glyphs_are_distinct_per_status() {
        let glyphs = [
            status_glyph(TaskStatus::Pending),
            status_glyph(TaskStatus::InProgress),
            status_glyph(TaskStatus::Passed),
            status_glyph(TaskStatus::Failed),
            status_glyph(TaskStatus::Skipped),
        ];
        for (i, a) in glyphs.iter().enumerate() {
            for b in glyphs.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn retries_phrase_pluralizes() {
        assert_eq!(retries_phrase(1), "1 retry remaining");
        assert_eq!(retries_phrase(2), "2 retries remaining");
        assert_eq!(retries_phrase(0), "0 retries remaining");
    }

    #[test]
    fn init_render_names_count_and_first_task() {
        let state = sample_state(&["build it", "test it"]);
        let rendered = render_init(&state);
        assert!(rendered.contains("plan.md"));
        assert!(rendered.contains("2 tasks"));
        assert!(rendered.contains("first: build it"));
    }

    #[test]
    fn status_render_shows_progress_and_active_task() {
        let mut state = sample_state(&["build it", "test it"]);
        state.promote_next(Utc::now());
        let rendered = render_status(&state);
        assert!(rendered.contains("0/2"));
        assert!(rendered.contains("▶ 1. build it"));
        assert!(rendered.contains("○ 2. test it"));
        assert!(rendered.contains("it works"), "active task criteria listed");
    }

    #[test]
    fn report_render_shows_retry_budget() {
        let mut state = sample_state(&["only task"]);
        state.promote_next(Utc::now());
        let effect = state.record(Outcome::Fail, "boom", Utc::now()).unwrap();
        let rendered = render_report(&state, &effect);
        assert!(rendered.contains("failed"));
        assert!(rendered.contains("(attempt 1)"));
        assert!(rendered.contains("2 retries remaining"));
    }

    #[test]
    fn report_render_announces_completion() {
        let mut state = sample_state(&["only task"]);
        state.promote_next(Utc::now());
        let effect = state.record(Outcome::Pass, "done", Utc::now()).unwrap();
        let rendered = render_report(&state, &effect);
        assert!(rendered.contains("Loop complete"));
    }

    #[test]
    fn summary_render_caps_failure_excerpts() {
        let mut state = sample_state(&["only task"]);
        state.max_retries = 1;
        state.promote_next(Utc::now());
        let long = "y".repeat(3000);
        state.record(Outcome::Fail, &long, Utc::now()).unwrap();
        let rendered = render_summary(&state, Utc::now());
        assert!(rendered.contains(&"y".repeat(DETAIL_DISPLAY_CAP)));
        assert!(!rendered.contains(&"y".repeat(DETAIL_DISPLAY_CAP + 1)));
    }

    #[test]
    fn summary_counts_criteria_only_for_passed_tasks() {
        let mut state = sample_state(&["a", "b"]);
        state.promote_next(Utc::now());
        state.record(Outcome::Pass, "ok", Utc::now()).unwrap();
        state.record(Outcome::Skip, "later", Utc::now()).unwrap();
        let rendered = render_summary(&state, Utc::now());
        assert!(rendered.contains("acceptance criteria satisfied: 1/2"));
        assert!(rendered.contains("passed: 1  failed: 0  skipped: 1  total: 2"));
    }
}
