//! Code-intelligence contract.
//!
//! Providers are black boxes keyed on `(path, byte offset, buffer text)`.
//! Every method has a "not supported" default so a provider implements only
//! what its tooling can answer. [`ExternalTools`] covers formatting and
//! linting by running the commands configured under `[tools]`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use core_config::ToolsConfig;
use core_state::{Severity, View};
use core_text::Location;
use regex::Regex;
use tracing::{debug, warn};

/// Snapshot of a view taken when a request is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntelRequest {
    pub path: Option<PathBuf>,
    pub loc: Location,
    /// Byte offset of `loc` in `text`.
    pub offset: usize,
    pub text: String,
}

impl IntelRequest {
    pub fn from_view(view: &View) -> Self {
        Self {
            path: view.buffer.path().map(Path::to_path_buf),
            loc: view.cursor.loc,
            offset: view.cursor.loc.to_byte_offset(&view.buffer),
            text: view.buffer.text(),
        }
    }
}

/// A syntactic region around the request position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enclosing {
    /// Node kind, e.g. `identifier`, `basic literal`, `function call`.
    pub description: String,
    pub start: Location,
    pub end: Location,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct What {
    /// Regions containing the position, innermost first.
    pub enclosing: Vec<Enclosing>,
    /// Start of every other occurrence of the identifier at the position.
    pub same_ids: Vec<Location>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Description {
    /// `value`, `type`, ...
    pub detail: String,
    pub desc: String,
    pub type_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Referrers,
    Implements,
    PointsTo,
    Callers,
    Callstack,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntelLocation {
    /// `None` means the requesting buffer.
    pub path: Option<PathBuf>,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntelEntry {
    pub description: String,
    pub position: Option<IntelLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateKind {
    Func { params: Vec<String> },
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub kind: CandidateKind,
}

impl Candidate {
    /// Text inserted on acceptance: functions become a template with one
    /// field per parameter.
    pub fn insertion(&self) -> String {
        match &self.kind {
            CandidateKind::Func { params } => {
                let fields: Vec<String> = params
                    .iter()
                    .enumerate()
                    .map(|(i, p)| format!("${i}_{p}$"))
                    .collect();
                format!("{}({})", self.name, fields.join(", "))
            }
            CandidateKind::Value => self.name.clone(),
        }
    }
}

/// A diagnostic on a 0-based line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntelError {
    #[error("{0} is not supported")]
    Unsupported(&'static str),
    #[error("{tool}: {message}")]
    Tool { tool: String, message: String },
    #[error("{0}")]
    Failed(String),
}

pub trait CodeIntel: Send + Sync {
    /// Whether [`CodeIntel::what`] can answer. Highlight refreshes run after
    /// every action and are skipped entirely when this is false.
    fn supports_what(&self) -> bool {
        false
    }

    fn what(&self, _req: &IntelRequest) -> Result<What, IntelError> {
        Err(IntelError::Unsupported("what"))
    }

    fn describe(&self, _req: &IntelRequest) -> Result<Description, IntelError> {
        Err(IntelError::Unsupported("describe"))
    }

    fn query(&self, _kind: QueryKind, _req: &IntelRequest) -> Result<Vec<IntelEntry>, IntelError> {
        Err(IntelError::Unsupported("query"))
    }

    fn definition(&self, _req: &IntelRequest) -> Result<IntelLocation, IntelError> {
        Err(IntelError::Unsupported("definition"))
    }

    /// Rename the identifier at the request position; returns the new text
    /// of the requesting buffer.
    fn rename(&self, _req: &IntelRequest, _to: &str) -> Result<String, IntelError> {
        Err(IntelError::Unsupported("rename"))
    }

    fn complete(&self, _req: &IntelRequest) -> Result<Vec<Candidate>, IntelError> {
        Err(IntelError::Unsupported("complete"))
    }

    /// A template to expand at the request position.
    fn template(&self, _req: &IntelRequest) -> Result<String, IntelError> {
        Err(IntelError::Unsupported("template"))
    }

    fn format(&self, _path: Option<&Path>, _text: &str) -> Result<String, IntelError> {
        Err(IntelError::Unsupported("format"))
    }

    fn lint(&self, _path: Option<&Path>, _text: &str) -> Result<Vec<Diagnostic>, IntelError> {
        Err(IntelError::Unsupported("lint"))
    }
}

/// Provider used when nothing is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIntel;

impl CodeIntel for NoIntel {}

/// Formatter and linter run as subprocesses. `{file}` in an argument is
/// replaced with the buffer's path; without it the text goes to stdin.
#[derive(Debug, Clone, Default)]
pub struct ExternalTools {
    format: Vec<String>,
    lint: Vec<String>,
}

impl ExternalTools {
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            format: tools.format.clone(),
            lint: tools.lint.clone(),
        }
    }

    fn run(
        &self,
        what: &'static str,
        argv: &[String],
        path: Option<&Path>,
        text: &str,
    ) -> Result<std::process::Output, IntelError> {
        let (program, args) = argv.split_first().ok_or(IntelError::Unsupported(what))?;
        let mut uses_file = false;
        let mut resolved = Vec::with_capacity(args.len());
        for arg in args {
            if arg.contains("{file}") {
                let path = path.ok_or_else(|| IntelError::Failed(format!("{what} needs a file name")))?;
                uses_file = true;
                resolved.push(arg.replace("{file}", &path.to_string_lossy()));
            } else {
                resolved.push(arg.clone());
            }
        }
        debug!(target: "actions.intel", tool = %program, ?resolved, "tool_spawn");
        let tool_err = |message: String| IntelError::Tool {
            tool: program.clone(),
            message,
        };
        let mut child = Command::new(program)
            .args(&resolved)
            .stdin(if uses_file { Stdio::null() } else { Stdio::piped() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| tool_err(e.to_string()))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| tool_err(e.to_string()))?;
        }
        child.wait_with_output().map_err(|e| tool_err(e.to_string()))
    }
}

impl CodeIntel for ExternalTools {
    fn format(&self, path: Option<&Path>, text: &str) -> Result<String, IntelError> {
        let out = self.run("format", &self.format, path, text)?;
        if !out.status.success() {
            let message = String::from_utf8_lossy(&out.stderr).trim().to_string();
            return Err(IntelError::Tool {
                tool: self.format.first().cloned().unwrap_or_default(),
                message,
            });
        }
        String::from_utf8(out.stdout).map_err(|e| IntelError::Failed(e.to_string()))
    }

    fn lint(&self, path: Option<&Path>, text: &str) -> Result<Vec<Diagnostic>, IntelError> {
        let out = self.run("lint", &self.lint, path, text)?;
        let mut combined = String::from_utf8_lossy(&out.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&out.stderr));
        let diagnostics = parse_diagnostics(&combined, Severity::Warning);
        if !out.status.success() && diagnostics.is_empty() {
            warn!(target: "actions.intel", status = ?out.status, "lint_failed_without_diagnostics");
        }
        Ok(diagnostics)
    }
}

static DIAGNOSTIC_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?:[A-Za-z]:)?[^:]*:(\d+):(?:(\d+):)?\s*(.+)$").ok());

/// Parse `file:line[:col]: message` lines (1-based) into diagnostics on
/// 0-based lines. Other lines are ignored.
pub fn parse_diagnostics(output: &str, severity: Severity) -> Vec<Diagnostic> {
    let Some(re) = DIAGNOSTIC_LINE.as_ref() else {
        return Vec::new();
    };
    output
        .lines()
        .filter_map(|line| {
            let caps = re.captures(line.trim_end())?;
            let line_no: usize = caps.get(1)?.as_str().parse().ok()?;
            let column = caps
                .get(2)
                .and_then(|c| c.as_str().parse::<usize>().ok())
                .unwrap_or(1);
            Some(Diagnostic {
                line: line_no.saturating_sub(1),
                column: column.saturating_sub(1),
                message: caps.get(3)?.as_str().trim().to_string(),
                severity,
            })
        })
        .collect()
}

/// Built-in JSON pretty printer (tab indented, key order kept).
pub fn format_json(text: &str) -> Result<String, IntelError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| IntelError::Failed(e.to_string()))?;
    let mut out = Vec::new();
    let fmt = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, fmt);
    serde::Serialize::serialize(&value, &mut ser).map_err(|e| IntelError::Failed(e.to_string()))?;
    String::from_utf8(out).map_err(|e| IntelError::Failed(e.to_string()))
}
