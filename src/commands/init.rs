use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::Args;
use tracing::info;

use crate::config::{Config, resolve_commands};
use crate::error::LoopError;
use crate::plan;
use crate::render;
use crate::state::{CommandSet, DEFAULT_MAX_RETRIES, LoopState};
use crate::store::{self, Paths};

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Plan file name, resolved inside `.taskloop/plans/`
    pub plan: String,
    /// Build command override (otherwise config or detection)
    #[arg(long)]
    pub build_command: Option<String>,
    /// Test command override (otherwise config or detection)
    #[arg(long)]
    pub test_command: Option<String>,
    /// Lint command override (otherwise config or detection)
    #[arg(long)]
    pub lint_command: Option<String>,
    /// Per-task retry budget
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_retries: Option<u32>,
    /// Project root directory
    #[arg(long)]
    pub project_root: Option<PathBuf>,
}

impl InitArgs {
    /// Start a fresh loop from a plan, overwriting any prior loop state.
    pub fn execute(&self) -> anyhow::Result<()> {
        let root = super::resolve_project_root(self.project_root.as_deref())?;
        let paths = Paths::new(&root);

        let plan_path = paths.resolve_plan(&self.plan)?;
        let text = fs::read_to_string(&plan_path)
            .with_context(|| format!("read plan {}", plan_path.display()))?;

        let parsed = plan::parse_plan(&text);
        if parsed.is_empty() {
            return Err(LoopError::EmptyTaskList {
                plan: self.plan.clone(),
            }
            .into());
        }

        let config = Config::load(&root)?;
        let flags = CommandSet {
            build: self.build_command.clone(),
            test: self.test_command.clone(),
            lint: self.lint_command.clone(),
        };
        let commands = resolve_commands(&flags, &config, &root);
        let max_retries = self
            .max_retries
            .or_else(|| config.max_retries.filter(|r| *r >= 1))
            .unwrap_or(DEFAULT_MAX_RETRIES);

        let state = LoopState::new(&self.plan, parsed, commands, max_retries, Utc::now());
        store::save(&paths.state_file(), &state)?;
        info!(plan = %self.plan, tasks = state.tasks.len(), max_retries, "loop initialized");

        println!("{}", render::render_init(&state));
        Ok(())
    }
}
