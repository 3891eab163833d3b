//! Project config (`.taskloop.toml`) and build/test/lint command detection.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use crate::state::CommandSet;

/// Config file name, at the project root.
pub const CONFIG_TOML: &str = ".taskloop.toml";

/// Optional project-level overrides. Everything defaults; a missing file is
/// the same as an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub commands: CommandsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandsConfig {
    #[serde(default)]
    pub build: Option<String>,
    #[serde(default)]
    pub test: Option<String>,
    #[serde(default)]
    pub lint: Option<String>,
}

impl Config {
    /// Load config from the project root, defaulting when absent.
    pub fn load(project_root: &Path) -> anyhow::Result<Self> {
        let path = project_root.join(CONFIG_TOML);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents =
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        Self::parse_toml(&contents).with_context(|| format!("parse {}", path.display()))
    }

    pub fn parse_toml(contents: &str) -> anyhow::Result<Self> {
        toml::from_str(contents).context("invalid .taskloop.toml")
    }
}

/// Detect build/test/lint commands from project marker files. First match
/// wins; the commands are recorded as opaque strings and never executed by
/// the tracker.
pub fn detect_commands(project_root: &Path) -> CommandSet {
    const MARKERS: &[(&str, Option<&str>, Option<&str>, Option<&str>)] = &[
        ("Cargo.toml", Some("cargo build"), Some("cargo test"), Some("cargo clippy")),
        ("package.json", Some("npm run build"), Some("npm test"), Some("npm run lint")),
        ("go.mod", Some("go build ./..."), Some("go test ./..."), Some("go vet ./...")),
        ("pyproject.toml", None, Some("pytest"), Some("ruff check .")),
        ("Makefile", Some("make"), Some("make test"), Some("make lint")),
    ];

    for (marker, build, test, lint) in MARKERS {
        if project_root.join(marker).exists() {
            debug!(marker, "detected project commands");
            return CommandSet {
                build: build.map(str::to_string),
                test: test.map(str::to_string),
                lint: lint.map(str::to_string),
            };
        }
    }
    CommandSet::default()
}

/// Merge command sources per field: CLI flags beat config, config beats
/// filesystem detection.
pub fn resolve_commands(flags: &CommandSet, config: &Config, project_root: &Path) -> CommandSet {
    let detected = detect_commands(project_root);
    let pick = |flag: &Option<String>, cfg: &Option<String>, det: Option<String>| {
        flag.clone().or_else(|| cfg.clone()).or(det)
    };
    CommandSet {
        build: pick(&flags.build, &config.commands.build, detected.build),
        test: pick(&flags.test, &config.commands.test, detected.test),
        lint: pick(&flags.lint, &config.commands.lint, detected.lint),
    }
}
