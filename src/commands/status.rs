use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use tracing::info;

use crate::error::LoopError;
use crate::render;
use crate::store::{self, Paths};

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Project root directory
    #[arg(long)]
    pub project_root: Option<PathBuf>,
}

impl StatusArgs {
    /// Show loop progress, lazily activating the next pending task.
    ///
    /// Promotion only writes when it actually changed something, so calling
    /// status twice in a row with an active task is a pure read.
    pub fn execute(&self) -> anyhow::Result<()> {
        let root = super::resolve_project_root(self.project_root.as_deref())?;
        let paths = Paths::new(&root);

        let mut state = store::load(&paths.state_file())?.ok_or(LoopError::NoActiveLoop)?;

        if let Some(promoted) = state.promote_next(Utc::now()) {
            store::save(&paths.state_file(), &state)?;
            info!(task = promoted, "promoted task to in-progress");
        }

        println!("{}", render::render_status(&state));
        Ok(())
    }
}
