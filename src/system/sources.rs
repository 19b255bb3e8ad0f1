// src/system/sources.rs

//! The [`ListSources`] implementation backed by the real operating system:
//! files, the clipboard, piped stdin, HTTP, nested launcher runs and script hooks.

use crate::constants::{NESTED_QUIET_FLAG, SCRIPT_CONTEXT_ENV};
use crate::core::error::SourceError;
use crate::core::paths;
use crate::core::sources::{ListSources, ScriptFunction};
use crate::models::ListSourceSpecifier;
use crate::system::clipboard::read_clipboard_lines;
use crate::system::executor::{capture_output_lines, capture_output_lines_with_env};
use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct SystemSources {
    stdin_cache: Option<Vec<String>>,
    scripts_dir: Option<PathBuf>,
}

impl SystemSources {
    pub fn new() -> Self {
        Self {
            stdin_cache: None,
            scripts_dir: paths::get_scripts_dir().ok(),
        }
    }

    /// Overrides the directory searched for relative script paths.
    pub fn with_scripts_dir(mut self, dir: PathBuf) -> Self {
        self.scripts_dir = Some(dir);
        self
    }

    /// Reads non-empty lines from `open()` on the first call; later calls reuse them.
    fn read_once<R: BufRead>(
        &mut self,
        open: impl FnOnce() -> R,
    ) -> Result<Vec<String>, SourceError> {
        if let Some(lines) = &self.stdin_cache {
            return Ok(lines.clone());
        }
        let mut lines = Vec::new();
        for line in open().lines() {
            let line = line.map_err(SourceError::Stdin)?;
            if !line.is_empty() {
                lines.push(line);
            }
        }
        log::debug!("Read {} line(s) from stdin.", lines.len());
        self.stdin_cache = Some(lines.clone());
        Ok(lines)
    }

    fn resolve_script(&self, path: &str) -> Result<PathBuf, SourceError> {
        let expanded = paths::expand_user_path(path).map_err(|e| SourceError::Script {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        if expanded.is_relative() {
            if let Some(candidate) = self.scripts_dir.as_ref().map(|dir| dir.join(&expanded)) {
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
        }
        Ok(expanded)
    }
}

impl ListSources for SystemSources {
    fn clipboard_lines(&mut self) -> Result<Vec<String>, SourceError> {
        read_clipboard_lines()
    }

    fn file_lines(&mut self, path: &str) -> Result<Vec<String>, SourceError> {
        let file_error = |source: io::Error| SourceError::File {
            path: path.to_string(),
            source,
        };
        let expanded =
            paths::expand_user_path(path).map_err(|e| file_error(io::Error::other(e.to_string())))?;
        let content = fs::read_to_string(dunce::simplified(&expanded)).map_err(file_error)?;
        Ok(content.lines().map(str::to_string).collect())
    }

    fn subprocess_lines(
        &mut self,
        command: &str,
        stdin_lines: Option<&[String]>,
    ) -> Result<Vec<String>, SourceError> {
        let failed = |message: String| SourceError::Subprocess {
            command: command.to_string(),
            message,
        };
        let words =
            shlex::split(command).ok_or_else(|| failed("unbalanced quotes".to_string()))?;
        let executable = std::env::current_exe().map_err(|e| failed(e.to_string()))?;

        let mut args = Vec::with_capacity(words.len() + 1);
        args.push(NESTED_QUIET_FLAG.to_string());
        args.extend(words);

        log::debug!("Capturing nested run: {:?}", args);
        capture_output_lines(executable.as_os_str(), &args, stdin_lines)
            .map_err(|e| failed(e.to_string()))
    }

    fn url_lines(&mut self, url: &str) -> Result<Vec<String>, SourceError> {
        log::debug!("Fetching list from '{}'.", url);
        let body = reqwest::blocking::get(url)
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(reqwest::blocking::Response::text)
            .map_err(|e| SourceError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(body.lines().map(str::to_string).collect())
    }

    fn stdin_lines(&mut self) -> Result<Vec<String>, SourceError> {
        self.read_once(|| io::stdin().lock())
    }

    fn script_lines(
        &mut self,
        path: &str,
        function: ScriptFunction,
        context: &ListSourceSpecifier,
        argument: Option<&str>,
        input: Option<&[String]>,
    ) -> Result<Vec<String>, SourceError> {
        let script = self.resolve_script(path)?;

        let mut args = vec![function.as_str().to_string()];
        if let Some(argument) = argument {
            args.push(argument.to_string());
        }
        let no_input: &[String] = &[];
        let envs = [(SCRIPT_CONTEXT_ENV, context.original_token.as_str())];

        log::debug!("Running script hook '{}' {:?}", script.display(), args);
        capture_output_lines_with_env(
            script.as_os_str(),
            &args,
            &envs,
            Some(input.unwrap_or(no_input)),
        )
        .map_err(|e| SourceError::Script {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}
