//! Pulls the agent prompt out of an issue body.
//!
//! Investigation requests arrive as free-text issues containing a fenced
//! YAML block:
//!
//! ````text
//! ```yaml
//! agent_prompt:
//!   target: claude-agent-mcp-skills
//!   depth: 3
//!   intent: Extract the skills patterns
//!   clues: see the plugin marketplace
//!   tools: [search, read]
//! ```
//! ````
//!
//! Only `target` matters to this crate (it is the context lookup key); the
//! other values are passed through to whatever runs the agent.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value;

static YAML_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```yaml\r?\n(.*?)\r?\n```").expect("valid regex"));

/// Errors from issue intake.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("invalid YAML in issue body: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} is not a mapping")]
    NotAMapping(&'static str),
}

/// Values requested by an issue. Absent values are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueVars {
    pub target: String,
    pub depth: String,
    pub intent: String,
    pub clues: String,
    pub tools: Vec<String>,
}

impl IssueVars {
    /// Extract from an issue body. A body with no ```yaml block yields
    /// all-empty values.
    pub fn from_issue_body(body: &str) -> Result<Self, IntakeError> {
        let Some(block) = YAML_BLOCK.captures(body).and_then(|c| c.get(1)) else {
            tracing::debug!("No YAML block in issue body");
            return Ok(Self::default());
        };

        let doc: Value = serde_yaml::from_str(block.as_str())?;
        let prompt = match &doc {
            Value::Mapping(map) => map.get("agent_prompt"),
            Value::Null => None,
            _ => return Err(IntakeError::NotAMapping("YAML block")),
        };
        let prompt = match prompt {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Mapping(map)) => map,
            Some(_) => return Err(IntakeError::NotAMapping("agent_prompt")),
        };

        let field = |key: &str| prompt.get(key).map(scalar).unwrap_or_default();
        let tools = match prompt.get("tools") {
            Some(Value::Sequence(items)) => items.iter().map(scalar).collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![scalar(other)],
        };

        Ok(Self {
            target: field("target"),
            depth: field("depth"),
            intent: field("intent"),
            clues: field("clues"),
            tools,
        })
    }

    /// Tools as a comma-separated list.
    pub fn tools_joined(&self) -> String {
        self.tools.join(", ")
    }

    /// Render as `AGENT_*` shell assignments, one per line.
    ///
    /// Values are single-quoted so issue text cannot expand or inject.
    pub fn to_shell_env(&self) -> String {
        let tools = self.tools_joined();
        let mut out = String::new();
        for (name, value) in [
            ("AGENT_TARGET", self.target.as_str()),
            ("AGENT_DEPTH", self.depth.as_str()),
            ("AGENT_TOOLS", tools.as_str()),
            ("AGENT_INTENT", self.intent.as_str()),
            ("AGENT_CLUES", self.clues.as_str()),
        ] {
            let _ = writeln!(out, "{name}={}", shell_quote(value));
        }
        out
    }
}

/// Scalars as plain text; anything structured as compact YAML.
fn scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
