// src/constants.rs

/// The name of the per-user configuration directory (inside the system config dir).
pub const CONFIG_DIR_NAME: &str = "argfan";

/// The name of the launcher configuration file (inside the config directory).
pub const CONFIG_FILENAME: &str = "argfan.toml";

/// The directory, inside the config directory, searched for relative script-hook paths.
pub const SCRIPTS_DIR_NAME: &str = "scripts";

/// Plans with more runs than this ask for confirmation unless `/yes` is set.
pub const CONFIRMATION_THRESHOLD: usize = 50;

/// The highest quiet level accepted by `/qqquiet`.
pub const MAX_QUIET_LEVEL: u8 = 3;

/// The flag prepended when the launcher re-invokes itself to capture a list.
pub const NESTED_QUIET_FLAG: &str = "/qqquiet";

/// The character that suppresses a marker when it directly precedes it.
pub const MARKER_ESCAPE: char = '\\';

/// The primary marker delimiter.
pub const PERCENT_DELIMITER: &str = "%%";

/// The alternate marker delimiter, for shells that expand `%`.
pub const DOLLAR_DELIMITER: &str = "$$";

/// Environment variable through which a script hook receives the specifier it serves.
pub const SCRIPT_CONTEXT_ENV: &str = "ARGFAN_SPECIFIER";
