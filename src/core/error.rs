// src/core/error.rs

use thiserror::Error;

/// Malformed specifier or modifier syntax. Always fatal, raised before any list is loaded.
#[derive(Error, Debug)]
pub enum SpecifierError {
    #[error("Unknown modifier '+[{0}]'.")]
    UnknownModifier(String),
    #[error("Unexpected text in specifier '{token}' at position {position}.")]
    Malformed { token: String, position: usize },
    #[error("Unclosed modifier bracket in specifier '{0}'.")]
    UnclosedModifier(String),
    #[error("Specifier '{0}' requires a source argument (e.g. '-value').")]
    MissingArgument(String),
    #[error("Invalid regular expression '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Invalid wildcard pattern '{pattern}': {source}")]
    InvalidWildcard {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("Invalid slice expression '{0}'.")]
    InvalidSlice(String),
    #[error("Invalid range '{0}'; expected 1 to 3 comma-separated integers with a non-zero step.")]
    InvalidRange(String),
    #[error("Invalid duplicate reference '{0}'; expected an integer index.")]
    InvalidDuplicateIndex(String),
    #[error("Invalid number '{0}' in modifier.")]
    InvalidNumber(String),
    #[error("'transpose' must be the last modifier of specifier '{0}'.")]
    TransposeNotLast(String),
}

/// A failure reported by a list-source collaborator.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Could not read file '{path}': {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not read the clipboard: {0}")]
    Clipboard(String),
    #[error("Command '{command}' failed: {message}")]
    Subprocess { command: String, message: String },
    #[error("Request to '{url}' failed: {message}")]
    Network { url: String, message: String },
    #[error("Could not read standard input: {0}")]
    Stdin(#[source] std::io::Error),
    #[error("Script '{path}' failed: {message}")]
    Script { path: String, message: String },
}

impl SourceError {
    /// Subprocess and network failures degrade to an empty list instead of aborting.
    pub fn degrades_to_empty(&self) -> bool {
        matches!(self, Self::Subprocess { .. } | Self::Network { .. })
    }
}

/// A failure raised while a modifier transforms a list.
#[derive(Error, Debug)]
pub enum ModifierError {
    #[error("Cannot convert '{value}' to {target}.")]
    Conversion { value: String, target: &'static str },
    #[error("Format '{format}' failed: {source}")]
    Format {
        format: String,
        #[source]
        source: crate::core::printf::FormatError,
    },
    #[error("Cannot shell-escape '{0}'.")]
    Escape(String),
    #[error("Invalid wildcard pattern '{pattern}': {source}")]
    Wildcard {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Any fatal condition of the templating pass. No run is produced when one is raised.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Parse error: {0}")]
    Parse(#[from] SpecifierError),
    #[error("Conflicting options: {0}")]
    ConflictingPolicy(String),
    #[error("Marker index {index} is out of range ({count} list(s) available).")]
    IndexOutOfRange { index: isize, count: usize },
    #[error("Marker in argument '{0}' has no list to bind to.")]
    NoListForMarker(String),
    #[error("List #{index} references list {reference}, which does not exist.")]
    InvalidReference { index: usize, reference: isize },
    #[error("List #{0} is part of a duplicate reference cycle.")]
    ReferenceCycle(usize),
    #[error("List #{index} ('{token}') resolved to no elements.")]
    EmptySource { index: usize, token: String },
    #[error("List #{index} could not be loaded: {source}")]
    Source {
        index: usize,
        #[source]
        source: SourceError,
    },
    #[error("Modifier failed on list #{index}: {source}")]
    Modifier {
        index: usize,
        #[source]
        source: ModifierError,
    },
    #[error("Cannot shell-join the arguments of list #{0}.")]
    Quote(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_subprocess_and_network_failures_degrade() {
        let subprocess = SourceError::Subprocess {
            command: "ls".to_string(),
            message: "exit 1".to_string(),
        };
        let network = SourceError::Network {
            url: "http://localhost".to_string(),
            message: "refused".to_string(),
        };
        let script = SourceError::Script {
            path: "hook".to_string(),
            message: "missing".to_string(),
        };
        assert!(subprocess.degrades_to_empty());
        assert!(network.degrades_to_empty());
        assert!(!script.degrades_to_empty());
        assert!(!SourceError::Clipboard("no tool".to_string()).degrades_to_empty());
    }

    #[test]
    fn test_template_error_wraps_parse_error() {
        let err: TemplateError = SpecifierError::UnknownModifier("zz".to_string()).into();
        assert_eq!(err.to_string(), "Parse error: Unknown modifier '+[zz]'.");
    }

    #[test]
    fn test_modifier_error_keeps_source_chain() {
        let err = TemplateError::Modifier {
            index: 2,
            source: ModifierError::Conversion {
                value: "abc".to_string(),
                target: "an integer",
            },
        };
        let anyhow_err: anyhow::Error = err.into();
        let chain: Vec<String> = anyhow_err.chain().map(|e| e.to_string()).collect();
        assert_eq!(chain[0], "Modifier failed on list #2: Cannot convert 'abc' to an integer.");
        assert_eq!(chain[1], "Cannot convert 'abc' to an integer.");
    }
}
