use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use tracing::info;

use crate::error::LoopError;
use crate::render;
use crate::state::Outcome;
use crate::store::{self, Paths};

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Outcome of this attempt at the active task
    #[arg(value_enum)]
    pub outcome: Outcome,
    /// Free-text detail (test output, error, or skip reason)
    #[arg(long, default_value_t = String::new())]
    pub detail: String,
    /// Project root directory
    #[arg(long)]
    pub project_root: Option<PathBuf>,
}

impl ReportArgs {
    /// Record an outcome for the active task and advance the loop.
    pub fn execute(&self) -> anyhow::Result<()> {
        let root = super::resolve_project_root(self.project_root.as_deref())?;
        let paths = Paths::new(&root);

        let mut state = store::load(&paths.state_file())?.ok_or(LoopError::NoActiveLoop)?;

        let effect = state.record(self.outcome, &self.detail, Utc::now())?;
        store::save(&paths.state_file(), &state)?;
        info!(
            task = effect.task_index,
            outcome = ?effect.outcome,
            attempt = effect.attempt,
            "outcome recorded"
        );

        println!("{}", render::render_report(&state, &effect));
        Ok(())
    }
}
