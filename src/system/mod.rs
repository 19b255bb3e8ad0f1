//! # System Interaction Layer
//!
//! The boundary between the templating engine and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: spawns processes, either to run a finished command line with
//!   inherited stdio or to capture a child's output as a list.
//! - **`clipboard`**: reads clipboard text through the platform's clipboard tool.
//! - **`sources`**: `SystemSources`, the real `ListSources` used by the binary.

pub mod clipboard;
pub mod executor;
pub mod sources;
