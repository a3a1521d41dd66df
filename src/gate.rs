//! Confirmation gate.
//!
//! Shows the resolved run and the ordered script list, then waits for the
//! operator's go-ahead. Nothing touches the database or the filesystem
//! before this returns true.

use crate::config::RunConfig;
use crate::discovery::ScriptFile;
use crate::error::Result;
use crate::operator::Operator;

/// Question asked after the summary.
pub const CONFIRM_PROMPT: &str = "Run these scripts? [y/N] ";

/// Renders the run summary shown before the confirmation prompt.
pub fn render_summary(config: &RunConfig, files: &[ScriptFile]) -> String {
    let mut out = String::new();

    out.push_str(&format!("Server:       {}\n", config.target.server_display()));
    out.push_str(&format!("Port:         {}\n", config.target.port));
    out.push_str(&format!("Database:     {}\n", config.target.database));
    out.push_str(&format!("Output:       {}\n", config.format));
    out.push_str(&format!("Auth:         {}\n", config.auth.describe()));
    out.push_str(&format!("On error:     {}\n", config.on_error));
    out.push_str(&format!("Scripts from: {}\n", config.script_dir.display()));
    out.push('\n');

    if files.is_empty() {
        out.push_str("(no script files found)");
    } else {
        let width = files.len().to_string().len();
        let lines: Vec<String> = files
            .iter()
            .enumerate()
            .map(|(i, f)| format!("{:>width$}. {}", i + 1, f.file_name()))
            .collect();
        out.push_str(&lines.join("\n"));
    }

    out
}

/// Shows the summary and asks for confirmation.
///
/// Returns false for anything but an explicit affirmative answer.
pub fn confirm_run(
    operator: &mut dyn Operator,
    config: &RunConfig,
    files: &[ScriptFile],
) -> Result<bool> {
    operator.show(&render_summary(config, files));
    operator.confirm(CONFIRM_PROMPT)
}
