//! Agent session log rendering.
//!
//! Session logs arrive as server-sent-event records: one `data: ` line
//! per chat-completion chunk, blank lines between records. The server
//! re-sends the full history on every fetch, so the follow loop renders
//! only the unseen suffix. Tool-call traces are reshaped into readable
//! headers and code blocks; records of any other type are skipped.

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use colored::Colorize;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{AgentTaskError, AgentTaskResult};

/// How long the follow loop waits between fetches.
pub const DEFAULT_LOG_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Root of the build agent's working copy. Paths beneath it are shown
/// repo-relative.
const AGENT_WORK_ROOT: &str = "/home/runner/work/";

#[derive(Debug, Clone, Copy)]
pub struct LogRenderer {
    styled: bool,
}

impl LogRenderer {
    pub fn new(styled: bool) -> Self {
        Self { styled }
    }

    /// Render a full log payload. Returns true once a choice with
    /// `finish_reason == "stop"` has been processed.
    pub fn render(&self, logs: &[u8], out: &mut dyn Write) -> AgentTaskResult<bool> {
        let text = String::from_utf8_lossy(logs);

        for line in text.split('\n').filter(|line| !line.is_empty()) {
            let Some(raw) = line.strip_prefix("data: ") else {
                return Err(AgentTaskError::LogFormat);
            };

            // The only record type rendered is a chat completion chunk,
            // recognized by a successful parse AND the object field
            // matching. Anything else is skipped, never an error.
            let entry: ChatCompletionChunk = match serde_json::from_str(raw) {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            if entry.object != "chat.completion.chunk" {
                continue;
            }

            if self.render_entry(&entry, out)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Repeatedly fetch and render until the stream signals completion
    /// or the fetcher fails. Pacing between fetches belongs to the
    /// fetcher, which lets callers sleep after the first call only.
    pub async fn follow<F, Fut>(&self, mut fetcher: F, out: &mut dyn Write) -> AgentTaskResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AgentTaskResult<Vec<u8>>>,
    {
        let mut last = String::new();
        loop {
            let raw = fetcher().await?;
            let logs = String::from_utf8_lossy(&raw).into_owned();
            if logs == last {
                continue;
            }

            let diff = logs.get(last.len()..).unwrap_or("").trim().to_string();
            if self.render(diff.as_bytes(), out)? {
                return Ok(());
            }

            last = logs;
        }
    }

    fn render_entry(&self, entry: &ChatCompletionChunk, out: &mut dyn Write) -> AgentTaskResult<bool> {
        let mut stop = false;

        for choice in &entry.choices {
            if choice.finish_reason.as_deref() == Some("stop") {
                stop = true;
            }

            let content = choice.delta.content.as_deref().unwrap_or("");

            if choice.delta.tool_calls.is_empty() {
                if !content.is_empty() && choice.delta.role.as_deref() == Some("assistant") {
                    self.write_markdown(content, out)?;
                }
                continue;
            }

            // Live tool-call progress arrives as content-less chunks;
            // only the finished call (non-empty content) is rendered so
            // nothing is printed twice.
            if content.is_empty() {
                continue;
            }

            if let Some(reasoning) = choice.delta.reasoning_text.as_deref() {
                if !reasoning.is_empty() {
                    self.write_markdown(reasoning, out)?;
                }
            }

            for tool_call in &choice.delta.tool_calls {
                let name = tool_call.function.name.as_str();
                if name.is_empty() {
                    continue;
                }
                self.render_tool_call(name, &tool_call.function.arguments, content, out)?;
            }
        }

        Ok(stop)
    }

    fn render_tool_call(
        &self,
        name: &str,
        arguments: &str,
        content: &str,
        out: &mut dyn Write,
    ) -> AgentTaskResult<()> {
        match name {
            "run_setup" => {
                if let Some(args) = parse_args::<RunSetupArgs>(arguments) {
                    self.write_header(out, &format!("Start {} MCP server", args.name), "")?;
                }
            }
            "view" => {
                let args: ViewArgs = require_args(name, arguments)?;
                writeln!(out, "View {}", self.bold(&relative_path(&args.path)))?;
                self.write_file_content("output.diff", content, out)?;
            }
            "bash" => {
                if let Some(args) = parse_args::<BashArgs>(arguments) {
                    if args.description.is_empty() {
                        self.write_header(out, "Run Bash command", "")?;
                    } else {
                        self.write_header(out, "Bash", &args.description)?;
                    }

                    let body = if args.command.is_empty() {
                        content.to_string()
                    } else {
                        format!("{}\n{}", args.command, content)
                    };
                    self.write_file_content("commands.sh", &body, out)?;
                }
            }
            "think" => {
                let args: ThinkArgs = require_args(name, arguments)?;
                // The delta content repeats the thought; render only
                // the argument form.
                self.write_header(out, "Thought", "")?;
                self.write_markdown(&args.thought, out)?;
            }
            "report_progress" => {
                let args: ReportProgressArgs = require_args(name, arguments)?;
                self.write_header(out, "Progress update", &args.commit_message)?;
                if !args.pr_description.is_empty() {
                    self.write_markdown(&args.pr_description, out)?;
                }
                if !content.is_empty() {
                    self.write_json_content(content, out)?;
                }
            }
            "create" => {
                let args: CreateArgs = require_args(name, arguments)?;
                self.write_header(out, "Create", &relative_path(&args.path))?;
                self.write_file_content(&args.path, &args.file_text, out)?;
            }
            "str_replace" => {
                let args: StrReplaceArgs = require_args(name, arguments)?;
                self.write_header(out, "Edit", &relative_path(&args.path))?;
                self.write_file_content("output.diff", content, out)?;
            }
            other => {
                // Content size is unknown for foreign tools, so it is
                // only shown when it parses as JSON.
                self.write_header(out, &generic_tool_title(other), "")?;
                self.write_json_content(content, out)?;
            }
        }

        Ok(())
    }

    fn write_header(&self, out: &mut dyn Write, descriptor: &str, title: &str) -> AgentTaskResult<()> {
        if title.is_empty() {
            writeln!(out, "{descriptor}")?;
        } else {
            writeln!(out, "{}: {}", descriptor, self.bold(title))?;
        }
        Ok(())
    }

    fn write_markdown(&self, md: &str, out: &mut dyn Write) -> AgentTaskResult<()> {
        writeln!(out)?;
        writeln!(out, "{}", md.trim())?;
        writeln!(out)?;
        Ok(())
    }

    /// Render file content as a fenced code block whose language comes
    /// from the path extension. Markdown files render as markdown.
    fn write_file_content(&self, path: &str, content: &str, out: &mut dyn Write) -> AgentTaskResult<()> {
        let lang = path.rsplit('.').next().unwrap_or("");
        let content = content.trim();

        if lang == "md" {
            writeln!(out, "{content}")?;
            return Ok(());
        }

        writeln!(out, "```{lang}")?;
        writeln!(out, "{content}")?;
        writeln!(out, "```")?;
        writeln!(out)?;
        Ok(())
    }

    fn write_json_content(&self, content: &str, out: &mut dyn Write) -> AgentTaskResult<()> {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(content) {
            let pretty =
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| content.to_string());
            self.write_file_content("output.json", &pretty, out)?;
        }
        Ok(())
    }

    fn bold(&self, s: &str) -> String {
        if self.styled {
            s.bold().to_string()
        } else {
            s.to_string()
        }
    }
}

fn generic_tool_title(name: &str) -> String {
    match name {
        "codeql_checker" => "Run CodeQL analysis".to_string(),
        "github-mcp-server-list_issues" => "List issues on GitHub".to_string(),
        "github-mcp-server-list_pull_requests" => "List pull requests on GitHub".to_string(),
        other => format!("Call to {other}"),
    }
}

/// Rewrite an absolute path under the agent's working copy to a
/// repo-relative one. The first three segments are the agent root, the
/// repo owner, and the repo name; with nothing left beyond them the
/// friendly name "repository" is used.
fn relative_path(abs_path: &str) -> String {
    let rel = abs_path.strip_prefix(AGENT_WORK_ROOT).unwrap_or(abs_path);
    let parts: Vec<&str> = rel.split('/').collect();
    if parts.len() > 2 {
        parts[2..].join("/")
    } else {
        "repository".to_string()
    }
}

fn parse_args<T: DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_str(raw).ok()
}

fn require_args<T: DeserializeOwned>(tool: &str, raw: &str) -> AgentTaskResult<T> {
    serde_json::from_str(raw).map_err(|e| AgentTaskError::Decode {
        context: format!("'{tool}' tool call arguments"),
        message: e.to_string(),
    })
}

#[derive(Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    object: String,
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Default)]
struct Choice {
    #[serde(default)]
    delta: Delta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct Delta {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_text: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Deserialize)]
struct ToolCall {
    #[serde(default)]
    function: ToolFunction,
}

#[derive(Deserialize, Default)]
struct ToolFunction {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize)]
struct RunSetupArgs {
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct ViewArgs {
    #[serde(default)]
    path: String,
}

#[derive(Deserialize)]
struct BashArgs {
    #[serde(default)]
    command: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct ThinkArgs {
    #[serde(default)]
    thought: String,
}

#[derive(Deserialize)]
struct ReportProgressArgs {
    #[serde(default, rename = "commitMessage")]
    commit_message: String,
    #[serde(default, rename = "prDescription")]
    pr_description: String,
}

#[derive(Deserialize)]
struct CreateArgs {
    #[serde(default)]
    path: String,
    #[serde(default)]
    file_text: String,
}

#[derive(Deserialize)]
struct StrReplaceArgs {
    #[serde(default)]
    path: String,
}
