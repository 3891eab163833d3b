use schemars::schema_for;

use crate::state::LoopState;

/// Print the JSON Schema for the persisted loop state document to stdout.
pub fn run_schema() -> anyhow::Result<()> {
    let schema = schema_for!(LoopState);
    let json = serde_json::to_string_pretty(&schema)?;
    println!("{json}");
    Ok(())
}
