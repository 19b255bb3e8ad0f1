// src/core/launch_options.rs

//! # Launch Options
//!
//! Parses the launcher's own command line: `/flag` (or `--flag`) tokens and
//! specifier tokens, then the target program, then the command template.
//!
//! ```text
//! argfan [/flags] [/specifiers] <target> [template arguments...]
//! ```

use crate::constants::MAX_QUIET_LEVEL;
use crate::core::config_loader::LauncherConfig;
use crate::core::error::SpecifierError;
use crate::core::paths::{self, PathError};
use crate::core::plan_executor::ExecutionSettings;
use crate::core::specifier_parser::parse_specifier;
use crate::models::{AlignmentOptions, ListSourceSpecifier, RolloverFill, TemplateOptions};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;

lazy_static! {
    static ref QUIET_RE: Regex = Regex::new(r"(?i)^(q+)uiet$").unwrap();
    static ref VALUED_FLAG_RE: Regex =
        Regex::new(r"(?i)^(cd|limit|repeat|config)(?:-(.*))?$").unwrap();
    static ref ROLLOVER_RE: Regex = Regex::new(r"(?i)^rollover([+-]?)$").unwrap();
}

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Unknown launcher flag '{0}'.")]
    UnknownFlag(String),
    #[error("Flag '{flag}' expects {expected}, got '{value}'.")]
    InvalidValue {
        flag: String,
        value: String,
        expected: &'static str,
    },
    #[error("No target command given. Run with /help for usage.")]
    MissingTarget,
    #[error(transparent)]
    Specifier(#[from] SpecifierError),
    #[error(transparent)]
    Path(#[from] PathError),
}

/// Where runs are started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkingDirectory {
    /// `/cd`: the directory that contains the target.
    TargetParent,
    /// `/cd-PATH`.
    Path(String),
}

/// Everything the launcher was asked to do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchOptions {
    pub specifiers: Vec<ListSourceSpecifier>,
    pub alignment: AlignmentOptions,
    pub inline_markers: bool,
    pub quiet: u8,
    pub assume_yes: bool,
    pub echo: bool,
    pub dry_run: bool,
    pub shell: bool,
    pub raw_command_line: bool,
    pub parallel: bool,
    pub limit: Option<usize>,
    pub working_directory: Option<WorkingDirectory>,
    pub config_path: Option<String>,
    pub show_help: bool,
    pub target: Option<String>,
    /// The command template: every token after the target.
    pub template: Vec<String>,
}

/// Strips the `/` or `--` flag prefix.
fn flag_body(token: &str) -> Option<&str> {
    token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('/'))
        .filter(|body| !body.is_empty())
}

fn parse_count(flag: &str, value: Option<&str>) -> Result<usize, LaunchError> {
    let invalid = || LaunchError::InvalidValue {
        flag: flag.to_string(),
        value: value.unwrap_or_default().to_string(),
        expected: "a positive integer",
    };
    value
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .ok_or_else(invalid)
}

/// Returns the `/config-PATH` value among the launcher flags, if any.
pub fn find_config_path(args: &[String]) -> Option<String> {
    for token in args {
        let Some(body) = flag_body(token) else {
            break;
        };
        if let Some(captures) = VALUED_FLAG_RE.captures(body) {
            let name = captures.get(1).map(|m| m.as_str().to_ascii_lowercase());
            if name.as_deref() == Some("config") {
                return captures.get(2).map(|m| m.as_str().to_string());
            }
        }
    }
    None
}

/// The level of a `/quiet`, `/qquiet`... flag body, capped at the maximum.
fn quiet_level(body: &str) -> Option<u8> {
    let captures = QUIET_RE.captures(body)?;
    let count = captures.get(1).map_or(0, |m| m.as_str().len());
    Some(
        u8::try_from(count)
            .unwrap_or(MAX_QUIET_LEVEL)
            .min(MAX_QUIET_LEVEL),
    )
}

/// Returns the quiet level requested among the launcher flags, before full parsing.
pub fn find_quiet_level(args: &[String]) -> u8 {
    let mut level = 0;
    for token in args {
        let Some(body) = flag_body(token) else {
            break;
        };
        if let Some(found) = quiet_level(body) {
            level = found;
        }
    }
    level
}

impl LaunchOptions {
    /// Parses the full launcher argument vector.
    pub fn parse(args: &[String]) -> Result<Self, LaunchError> {
        let mut options = Self {
            inline_markers: true,
            ..Default::default()
        };

        let mut tokens = args.iter();
        for token in tokens.by_ref() {
            let Some(body) = flag_body(token) else {
                options.target = Some(token.clone());
                break;
            };
            if options.apply_flag(token, body)? {
                continue;
            }
            if let Some(specifier) = parse_specifier(body)? {
                options.specifiers.push(specifier);
                continue;
            }
            if token.starts_with("--") {
                return Err(LaunchError::UnknownFlag(token.clone()));
            }
            // An absolute path such as `/usr/bin/env` is the target.
            options.target = Some(token.clone());
            break;
        }
        options.template = tokens.cloned().collect();

        if options.limit.is_some() && !options.parallel {
            log::warn!("/limit has no effect without /parallel.");
        }
        log::debug!("Launch options: {:?}", options);
        Ok(options)
    }

    /// Parses `config.default_arguments` followed by `args`, then applies the
    /// remaining config defaults.
    pub fn parse_with_config(args: &[String], config: &LauncherConfig) -> Result<Self, LaunchError> {
        let mut combined = config.default_arguments.clone();
        combined.extend(args.iter().cloned());
        let mut options = Self::parse(&combined)?;

        options.quiet = options.quiet.max(config.always_quiet.min(MAX_QUIET_LEVEL));
        options.assume_yes |= config.always_yes || options.quiet > 0;
        options.shell |= config.always_shell;
        Ok(options)
    }

    /// Applies one launcher flag. Returns false if `body` is not a flag name.
    fn apply_flag(&mut self, token: &str, body: &str) -> Result<bool, LaunchError> {
        if let Some(level) = quiet_level(body) {
            self.quiet = level;
            self.assume_yes = true;
            return Ok(true);
        }

        if let Some(captures) = ROLLOVER_RE.captures(body) {
            self.alignment.rollover = Some(match captures.get(1).map(|m| m.as_str()) {
                Some("-") => RolloverFill::Blank,
                _ => RolloverFill::Repeat,
            });
            return Ok(true);
        }

        if let Some(captures) = VALUED_FLAG_RE.captures(body) {
            let name = captures
                .get(1)
                .map(|m| m.as_str().to_ascii_lowercase())
                .unwrap_or_default();
            let value = captures.get(2).map(|m| m.as_str());
            match name.as_str() {
                "cd" => {
                    self.working_directory = Some(match value {
                        Some(path) if !path.is_empty() => WorkingDirectory::Path(path.to_string()),
                        _ => WorkingDirectory::TargetParent,
                    });
                }
                "limit" => self.limit = Some(parse_count(token, value)?),
                "repeat" => self.alignment.repeat = Some(parse_count(token, value)?),
                _ => match value {
                    Some(path) if !path.is_empty() => self.config_path = Some(path.to_string()),
                    _ => {
                        return Err(LaunchError::InvalidValue {
                            flag: token.to_string(),
                            value: String::new(),
                            expected: "a file path",
                        });
                    }
                },
            }
            return Ok(true);
        }

        match body.to_ascii_lowercase().as_str() {
            "yes" | "y" => self.assume_yes = true,
            "echo" => self.echo = true,
            "dry" => self.dry_run = true,
            "list" => {
                self.echo = true;
                self.dry_run = true;
            }
            "shell" => self.shell = true,
            "unsafe" => self.raw_command_line = true,
            "parallel" => self.parallel = true,
            "noinline" => self.inline_markers = false,
            "crossjoin" => self.alignment.cross_join = true,
            "help" | "h" | "?" => self.show_help = true,
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub fn template_options(&self) -> TemplateOptions {
        TemplateOptions {
            alignment: self.alignment,
            inline_markers: self.inline_markers,
        }
    }

    /// Resolves the working directory against the target.
    pub fn resolved_working_directory(&self) -> Result<Option<PathBuf>, LaunchError> {
        match &self.working_directory {
            None => Ok(None),
            Some(WorkingDirectory::Path(path)) => Ok(Some(paths::expand_user_path(path)?)),
            Some(WorkingDirectory::TargetParent) => {
                let parent = self
                    .target
                    .as_deref()
                    .and_then(|target| Path::new(target).parent())
                    .filter(|parent| !parent.as_os_str().is_empty())
                    .map(Path::to_path_buf);
                if parent.is_none() {
                    log::debug!("/cd: target has no parent directory; staying in place.");
                }
                Ok(parent)
            }
        }
    }

    pub fn execution_settings(&self) -> Result<ExecutionSettings, LaunchError> {
        Ok(ExecutionSettings {
            echo: self.echo,
            dry_run: self.dry_run,
            raw_command_line: self.raw_command_line,
            shell: self.shell,
            working_directory: self.resolved_working_directory()?,
            parallel: self.parallel,
            limit: self.limit,
            quiet: self.quiet,
            assume_yes: self.assume_yes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_flags_specifiers_target_and_template() {
        let options = LaunchOptions::parse(&args(&[
            "/echo",
            "--iapply-a,b",
            "/crossjoin",
            "echo",
            "/not-a-flag",
            "%%%%",
        ]))
        .unwrap();
        assert!(options.echo);
        assert!(options.alignment.cross_join);
        assert_eq!(options.specifiers.len(), 1);
        assert_eq!(options.target.as_deref(), Some("echo"));
        assert_eq!(options.template, args(&["/not-a-flag", "%%%%"]));
    }

    #[test]
    fn test_quiet_levels_imply_yes() {
        let options = LaunchOptions::parse(&args(&["/qquiet", "ls"])).unwrap();
        assert_eq!(options.quiet, 2);
        assert!(options.assume_yes);
        let options = LaunchOptions::parse(&args(&["/qqqqqquiet", "ls"])).unwrap();
        assert_eq!(options.quiet, MAX_QUIET_LEVEL);
    }

    #[test]
    fn test_valued_flags() {
        let options = LaunchOptions::parse(&args(&[
            "/cd-/tmp",
            "/limit-4",
            "/repeat-3",
            "/rollover-",
            "/config-my.toml",
            "/3",
            "ls",
        ]))
        .unwrap();
        assert_eq!(
            options.working_directory,
            Some(WorkingDirectory::Path("/tmp".to_string()))
        );
        assert_eq!(options.limit, Some(4));
        assert_eq!(options.alignment.repeat, Some(3));
        assert_eq!(options.alignment.rollover, Some(RolloverFill::Blank));
        assert_eq!(options.config_path.as_deref(), Some("my.toml"));
        assert_eq!(options.specifiers[0].kind, SourceKind::DuplicateOf(3));
    }

    #[test]
    fn test_invalid_counts_and_unknown_flags() {
        assert!(matches!(
            LaunchOptions::parse(&args(&["/repeat-0", "ls"])),
            Err(LaunchError::InvalidValue { .. })
        ));
        assert!(matches!(
            LaunchOptions::parse(&args(&["/limit-x", "ls"])),
            Err(LaunchError::InvalidValue { .. })
        ));
        assert!(matches!(
            LaunchOptions::parse(&args(&["--bogus", "ls"])),
            Err(LaunchError::UnknownFlag(_))
        ));
    }

    #[test]
    fn test_absolute_path_is_the_target() {
        let options = LaunchOptions::parse(&args(&["/usr/bin/env", "x"])).unwrap();
        assert_eq!(options.target.as_deref(), Some("/usr/bin/env"));
        assert_eq!(options.template, args(&["x"]));
    }

    #[test]
    fn test_malformed_specifier_is_an_error() {
        assert!(matches!(
            LaunchOptions::parse(&args(&["/iapply+[zz]-a", "ls"])),
            Err(LaunchError::Specifier(_))
        ));
    }

    #[test]
    fn test_config_defaults_are_applied() {
        let config = LauncherConfig {
            always_yes: false,
            always_quiet: 1,
            always_shell: true,
            default_arguments: args(&["/echo"]),
        };
        let options = LaunchOptions::parse_with_config(&args(&["ls"]), &config).unwrap();
        assert!(options.echo);
        assert!(options.shell);
        assert_eq!(options.quiet, 1);
        assert!(options.assume_yes);
    }

    #[test]
    fn test_find_config_path_stops_at_target() {
        assert_eq!(
            find_config_path(&args(&["/echo", "/config-a.toml", "ls"])).as_deref(),
            Some("a.toml")
        );
        assert_eq!(find_config_path(&args(&["ls", "/config-a.toml"])), None);
    }

    #[test]
    fn test_find_quiet_level_before_parsing() {
        assert_eq!(find_quiet_level(&args(&["/echo", "/qquiet", "ls"])), 2);
        assert_eq!(find_quiet_level(&args(&["/qqqqquiet", "ls"])), MAX_QUIET_LEVEL);
        assert_eq!(find_quiet_level(&args(&["ls", "/quiet"])), 0);
    }

    #[test]
    fn test_cd_without_path_uses_target_parent() {
        let options = LaunchOptions::parse(&args(&["/cd", "tools/run.sh"])).unwrap();
        assert_eq!(
            options.resolved_working_directory().unwrap(),
            Some(PathBuf::from("tools"))
        );
        let options = LaunchOptions::parse(&args(&["/cd", "ls"])).unwrap();
        assert_eq!(options.resolved_working_directory().unwrap(), None);
    }

    #[test]
    fn test_list_is_echo_plus_dry() {
        let options = LaunchOptions::parse(&args(&["/list", "/noinline", "ls"])).unwrap();
        assert!(options.echo && options.dry_run);
        assert!(!options.template_options().inline_markers);
    }
}
