use std::path::PathBuf;

use chrono::Utc;
use clap::Args;

use crate::error::LoopError;
use crate::render;
use crate::store::{self, Paths};

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// Project root directory
    #[arg(long)]
    pub project_root: Option<PathBuf>,
}

impl SummaryArgs {
    /// Print the tabular wrap-up report. Never writes state.
    pub fn execute(&self) -> anyhow::Result<()> {
        let root = super::resolve_project_root(self.project_root.as_deref())?;
        let paths = Paths::new(&root);

        let state = store::load(&paths.state_file())?.ok_or(LoopError::NoActiveLoop)?;

        println!("{}", render::render_summary(&state, Utc::now()));
        Ok(())
    }
}
