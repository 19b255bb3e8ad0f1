// src/system/clipboard.rs

use crate::core::error::SourceError;
use crate::system::executor::capture_output_lines;
use std::ffi::OsStr;

/// The clipboard commands tried in order on this platform.
#[cfg(target_os = "macos")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("pbpaste", &[])];

#[cfg(target_os = "windows")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] =
    &[("powershell", &["-NoProfile", "-Command", "Get-Clipboard"])];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("wl-paste", &["--no-newline"]),
    ("xclip", &["-selection", "clipboard", "-o"]),
    ("xsel", &["--clipboard", "--output"]),
];

/// Reads the clipboard text as non-empty lines.
pub fn read_clipboard_lines() -> Result<Vec<String>, SourceError> {
    let mut failures = Vec::new();
    let no_input: &[String] = &[];

    for (program, args) in CLIPBOARD_COMMANDS {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        match capture_output_lines(OsStr::new(program), &args, Some(no_input)) {
            Ok(lines) => {
                log::debug!("Read {} clipboard line(s) with '{}'.", lines.len(), program);
                return Ok(lines.into_iter().filter(|line| !line.is_empty()).collect());
            }
            Err(e) if e.is_not_found() => {
                log::trace!("Clipboard tool '{}' is not installed.", program);
            }
            Err(e) => failures.push(e.to_string()),
        }
    }

    if failures.is_empty() {
        let tried: Vec<&str> = CLIPBOARD_COMMANDS.iter().map(|(program, _)| *program).collect();
        Err(SourceError::Clipboard(format!(
            "no clipboard tool found (tried {})",
            tried.join(", ")
        )))
    } else {
        Err(SourceError::Clipboard(failures.join("; ")))
    }
}
