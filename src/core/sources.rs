// src/core/sources.rs

//! # List Sources
//!
//! The boundary between the templating engine and the outside world. The engine
//! never touches the clipboard, the filesystem or the network directly: it asks a
//! [`ListSources`] implementation for raw lines. `system::sources::SystemSources`
//! is the real one; [`MemorySources`] serves tests and embedders.

use crate::core::error::SourceError;
use crate::core::specifier_parser::parse_range;
use crate::models::{ListSourceSpecifier, SourceKind};
use std::collections::HashMap;
use std::io;

/// Which entry point of an external script hook is being invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFunction {
    /// Produce a list from scratch.
    Get,
    /// Transform the list given on stdin.
    Modify,
}

impl ScriptFunction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Modify => "modify",
        }
    }
}

/// The collaborator that produces raw lines for each source kind.
pub trait ListSources {
    fn clipboard_lines(&mut self) -> Result<Vec<String>, SourceError>;

    fn file_lines(&mut self, path: &str) -> Result<Vec<String>, SourceError>;

    /// Runs a nested launcher command line, optionally feeding `stdin_lines` to it.
    fn subprocess_lines(
        &mut self,
        command: &str,
        stdin_lines: Option<&[String]>,
    ) -> Result<Vec<String>, SourceError>;

    fn url_lines(&mut self, url: &str) -> Result<Vec<String>, SourceError>;

    /// Reads piped stdin until EOF. Repeated calls return the same lines.
    fn stdin_lines(&mut self) -> Result<Vec<String>, SourceError>;

    fn script_lines(
        &mut self,
        path: &str,
        function: ScriptFunction,
        context: &ListSourceSpecifier,
        argument: Option<&str>,
        input: Option<&[String]>,
    ) -> Result<Vec<String>, SourceError>;
}

/// Loads the raw list of a non-duplicate specifier.
///
/// Duplicate kinds have no list of their own and yield an empty list here; the
/// planner copies their referent's list instead.
pub fn load_raw_list(
    specifier: &ListSourceSpecifier,
    sources: &mut dyn ListSources,
) -> Result<Vec<String>, SourceError> {
    let argument = specifier.source_argument.as_deref().unwrap_or_default();

    match specifier.kind {
        SourceKind::Clipboard => sources.clipboard_lines(),
        SourceKind::File => sources.file_lines(argument),
        SourceKind::ProcessOutput => sources.subprocess_lines(argument, None),
        SourceKind::Url => sources.url_lines(argument),
        SourceKind::InlineCsv => Ok(argument.split(',').map(str::to_string).collect()),
        SourceKind::Stdin => sources.stdin_lines(),
        SourceKind::ExternalScript => {
            let (path, script_argument) = match argument.split_once(',') {
                Some((path, rest)) => (path, Some(rest)),
                None => (argument, None),
            };
            sources.script_lines(path, ScriptFunction::Get, specifier, script_argument, None)
        }
        // Range arguments are validated when the specifier is parsed.
        SourceKind::Range => Ok(parse_range(argument)
            .map(|(start, stop, step)| range_values(start, stop, step))
            .unwrap_or_default()),
        SourceKind::DuplicateOf(_) | SourceKind::DuplicateWithModifiersOf(_) => Ok(Vec::new()),
    }
}

/// Enumerates `start..stop` by `step`, end exclusive, as strings.
pub fn range_values(start: i64, stop: i64, step: i64) -> Vec<String> {
    let mut values = Vec::new();
    if step == 0 {
        return values;
    }
    let mut current = start;
    while (step > 0 && current < stop) || (step < 0 && current > stop) {
        values.push(current.to_string());
        match current.checked_add(step) {
            Some(next) => current = next,
            None => break,
        }
    }
    values
}

// --- IN-MEMORY SOURCES ---

/// A [`ListSources`] backed by fixed, in-memory data.
#[derive(Debug, Clone, Default)]
pub struct MemorySources {
    clipboard: Vec<String>,
    stdin: Vec<String>,
    files: HashMap<String, Vec<String>>,
    urls: HashMap<String, Vec<String>>,
    commands: HashMap<String, Vec<String>>,
    scripts: HashMap<String, Vec<String>>,
}

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

impl MemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clipboard(mut self, lines: &[&str]) -> Self {
        self.clipboard = owned(lines);
        self
    }

    pub fn with_stdin(mut self, lines: &[&str]) -> Self {
        self.stdin = owned(lines);
        self
    }

    pub fn with_file(mut self, path: &str, lines: &[&str]) -> Self {
        self.files.insert(path.to_string(), owned(lines));
        self
    }

    pub fn with_url(mut self, url: &str, lines: &[&str]) -> Self {
        self.urls.insert(url.to_string(), owned(lines));
        self
    }

    /// Registers the output of a nested command line.
    pub fn with_command(mut self, command: &str, lines: &[&str]) -> Self {
        self.commands.insert(command.to_string(), owned(lines));
        self
    }

    /// Registers the output of a script hook, whatever function is invoked.
    pub fn with_script(mut self, path: &str, lines: &[&str]) -> Self {
        self.scripts.insert(path.to_string(), owned(lines));
        self
    }
}

impl ListSources for MemorySources {
    fn clipboard_lines(&mut self) -> Result<Vec<String>, SourceError> {
        Ok(self.clipboard.clone())
    }

    fn file_lines(&mut self, path: &str) -> Result<Vec<String>, SourceError> {
        self.files.get(path).cloned().ok_or_else(|| SourceError::File {
            path: path.to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        })
    }

    fn subprocess_lines(
        &mut self,
        command: &str,
        _stdin_lines: Option<&[String]>,
    ) -> Result<Vec<String>, SourceError> {
        self.commands
            .get(command)
            .cloned()
            .ok_or_else(|| SourceError::Subprocess {
                command: command.to_string(),
                message: "no such command".to_string(),
            })
    }

    fn url_lines(&mut self, url: &str) -> Result<Vec<String>, SourceError> {
        self.urls.get(url).cloned().ok_or_else(|| SourceError::Network {
            url: url.to_string(),
            message: "unreachable".to_string(),
        })
    }

    fn stdin_lines(&mut self) -> Result<Vec<String>, SourceError> {
        Ok(self.stdin.clone())
    }

    fn script_lines(
        &mut self,
        path: &str,
        _function: ScriptFunction,
        _context: &ListSourceSpecifier,
        _argument: Option<&str>,
        _input: Option<&[String]>,
    ) -> Result<Vec<String>, SourceError> {
        self.scripts
            .get(path)
            .cloned()
            .ok_or_else(|| SourceError::Script {
                path: path.to_string(),
                message: "script not found".to_string(),
            })
    }
}
