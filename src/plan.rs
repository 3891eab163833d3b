//! Plan document parsing.
//!
//! A plan is plain markdown. Each checklist item (`- [ ] ...` or `* [x] ...`)
//! becomes one task; contiguous further-indented plain bullets beneath it are
//! that task's acceptance criteria. Headings, prose, and code fences are
//! ignored.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// One task extracted from a plan, before any tracking state attaches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTask {
    pub description: String,
    pub acceptance_criteria: Vec<String>,
}

fn re_checklist() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^(\s*)[-*]\s+\[[ xX]\]\s+(.+)$").unwrap())
}

fn re_bullet() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^(\s*)[-*]\s+(.+)$").unwrap())
}

/// Parse plan text into an ordered task list.
///
/// Returns tasks in document order. An empty result is the caller's problem
/// (`initialize` treats it as a fatal precondition failure).
pub fn parse_plan(text: &str) -> Vec<ParsedTask> {
    let mut tasks: Vec<ParsedTask> = Vec::new();
    // Indent width of the checklist item criteria currently attach to.
    let mut open_indent: Option<usize> = None;
    let mut in_fence = false;

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        if let Some(caps) = re_checklist().captures(line) {
            open_indent = Some(caps[1].len());
            tasks.push(ParsedTask {
                description: caps[2].trim().to_string(),
                acceptance_criteria: Vec::new(),
            });
            continue;
        }

        if let (Some(indent), Some(caps)) = (open_indent, re_bullet().captures(line)) {
            if caps[1].len() > indent {
                if let Some(task) = tasks.last_mut() {
                    task.acceptance_criteria.push(caps[2].trim().to_string());
                }
                continue;
            }
        }

        // Prose or a same-level plain bullet ends the criteria block.
        open_indent = None;
    }

    tasks
}
