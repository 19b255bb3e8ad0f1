// src/core/commons.rs

use std::borrow::Cow;

/// Characters that `cmd.exe` interprets unless prefixed with a caret.
const CMD_META_CHARS: &[char] = &['(', ')', '%', '!', '^', '"', '<', '>', '&', '|'];

/// Quotes `value` so the platform shell reads it back as a single word.
///
/// Returns `None` when the value cannot be quoted (it contains a NUL byte).
pub fn escape_for_shell(value: &str) -> Option<String> {
    if cfg!(windows) {
        Some(escape_for_cmd(value))
    } else {
        shlex::try_quote(value).ok().map(Cow::into_owned)
    }
}

/// Joins several arguments into one shell-safe string.
pub fn join_for_shell(values: &[String]) -> Option<String> {
    if cfg!(windows) {
        Some(
            values
                .iter()
                .map(|v| escape_for_cmd(v))
                .collect::<Vec<_>>()
                .join(" "),
        )
    } else {
        shlex::try_join(values.iter().map(String::as_str)).ok()
    }
}

/// `cmd.exe` quoting: wrap in double quotes when needed, then caret-escape metacharacters.
pub fn escape_for_cmd(value: &str) -> String {
    let quoted = if value.is_empty() || value.chars().any(|c| c == '"' || c.is_whitespace()) {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    };

    let mut escaped = String::with_capacity(quoted.len() + 4);
    for c in quoted.chars() {
        if CMD_META_CHARS.contains(&c) {
            escaped.push('^');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_for_cmd_quotes_and_carets() {
        assert_eq!(escape_for_cmd("plain"), "plain");
        assert_eq!(escape_for_cmd("a b"), "^\"a b^\"");
        assert_eq!(escape_for_cmd("x&y"), "x^&y");
        assert_eq!(escape_for_cmd(""), "^\"^\"");
    }

    #[cfg(not(windows))]
    #[test]
    fn test_posix_quoting_uses_shlex() {
        assert_eq!(escape_for_shell("plain").unwrap(), "plain");
        assert_eq!(escape_for_shell("a b").unwrap(), "'a b'");
        assert!(escape_for_shell("nul\0byte").is_none());
        assert_eq!(
            join_for_shell(&["a".to_string(), "b c".to_string()]).unwrap(),
            "a 'b c'"
        );
    }
}
