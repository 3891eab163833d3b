use std::process::ExitCode;

/// Expected, user-facing loop conditions that map to specific exit codes.
///
/// These are not system failures: each renders as a short message telling
/// the caller what to do next. Storage I/O failures stay plain `anyhow`
/// errors and exit with code 1.
#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    #[error("no active loop. Run `taskloop init <plan>` to start one")]
    NoActiveLoop,

    #[error("plan {plan:?} contains no tasks. Add checklist items (`- [ ] ...`) and re-run init")]
    EmptyTaskList { plan: String },

    #[error("invalid plan source {plan_source:?}: must name a file inside the plans directory")]
    InvalidSource { plan_source: String },

    #[error("no active task. Run `taskloop status` to activate the next pending task")]
    NoActiveTask,
}

impl LoopError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::NoActiveLoop => ExitCode::from(2),
            Self::EmptyTaskList { .. } => ExitCode::from(3),
            Self::InvalidSource { .. } => ExitCode::from(4),
            Self::NoActiveTask => ExitCode::from(5),
        }
    }
}
