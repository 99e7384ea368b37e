//! Launch the user's editor on a temporary markdown buffer and return
//! what they wrote. Used by the interactive create flow.

use std::env;
use std::fs;
use std::process::Command;

use anyhow::{bail, Context, Result};

pub fn edit_markdown(initial: &str) -> Result<String> {
    let editor = env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| "vi".to_string());

    let file = tempfile::Builder::new()
        .prefix("ghagent-task-")
        .suffix(".md")
        .tempfile()
        .context("failed to create editor buffer")?;
    fs::write(file.path(), initial).context("failed to seed editor buffer")?;

    // $EDITOR may carry arguments ("code --wait"), so split on
    // whitespace and treat the first token as the program.
    let mut parts = editor.split_whitespace();
    let program = parts
        .next()
        .context("EDITOR environment variable is empty")?;

    let status = Command::new(program)
        .args(parts)
        .arg(file.path())
        .status()
        .with_context(|| format!("failed to launch editor {editor:?}"))?;

    if !status.success() {
        bail!("editor exited with {status}");
    }

    fs::read_to_string(file.path()).context("failed to read editor buffer")
}
