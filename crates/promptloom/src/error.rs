//! Hard errors and non-fatal configuration warnings.
//!
//! User-authored layouts and presets are handled best-effort: problems are
//! reported as [`Warning`]s and parsing continues. [`Error`] is reserved for
//! failures the engine cannot degrade around (unreadable files, strict-mode
//! duplicates, handlers called with ids that do not exist).

use std::path::PathBuf;

use crate::ui::NodeId;

/// Failures that abort the current operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A layout, presets or config file could not be read or written.
    #[error("failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document (engine config or host config) failed to parse.
    #[error("invalid JSON in '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The host config file is valid JSON but not an object.
    #[error("'{}' does not contain a JSON object", path.display())]
    NotAnObject { path: PathBuf },

    /// Strict mode rejects a second fragment with the same name.
    #[error("line {line}: duplicate fragment name '{name}'")]
    DuplicateFragment { name: String, line: usize },

    /// A handler was given a node id that is not in the tree, or a node of
    /// the wrong variant.
    #[error("node {0} does not exist or does not support this action")]
    UnknownNode(NodeId),

    /// No preset with this name was loaded.
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    /// No fragment with this name is registered.
    #[error("unknown fragment '{0}'")]
    UnknownFragment(String),
}

/// Non-fatal configuration problems. Logged under the `promptloom` target
/// and collected on the [`Context`](crate::context::Context).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Warning {
    #[error("line {line}: duplicate fragment name '{name}', later definition wins")]
    DuplicateFragment { name: String, line: usize },

    #[error("duplicate mapping for '{target}' in preset '{preset}', later mapping wins")]
    DuplicatePresetMapping { preset: String, target: String },

    #[error("line {line}: unknown directive '{kind}'")]
    UnknownType { kind: String, line: usize },

    #[error("line {line}: CHOICES needs a known --type (got '{value}')")]
    InvalidChoicesType { value: String, line: usize },

    #[error("line {line}: malformed directive: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("line {line}: END without an open block")]
    UnbalancedEnd { line: usize },

    #[error("{count} block(s) still open at end of input")]
    UnterminatedBlock { count: usize },

    #[error("line {line}: {kind} is not allowed here")]
    Misplaced { kind: String, line: usize },

    #[error("invalid value '{value}' for --{key} on '{fragment}'")]
    InvalidArgument {
        fragment: String,
        key: String,
        value: String,
    },

    #[error("preset '{preset}' targets unknown fragment '{target}'")]
    UnknownPresetTarget { preset: String, target: String },

    #[error("'{choice}' is not a choice of dropdown '{dropdown}'")]
    UnknownChoice { dropdown: String, choice: String },

    #[error("edit-link '{fragment}' references '{target}', which is not an edit fragment")]
    DanglingLink { fragment: String, target: String },
}
