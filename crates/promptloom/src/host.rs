//! Host-side glue: splicing composed prompts into the generator's own
//! prompts, and the clear-config utility.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::fragment::PromptPair;
use crate::fragment::text::join;
use crate::{Error, LOG_TARGET, Result};

/// Separator token reserved for the host's prompt chunking.
pub const BREAK: &str = "BREAK";

/// The host's prompts, mutated in place by [`splice`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPrompt {
    pub prompt: String,
    pub negative_prompt: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpliceOptions {
    /// Put the composed text before the host's text.
    pub prepend: bool,
    /// Insert `, BREAK` between the two parts.
    pub use_break: bool,
}

/// Join the composed pair onto the host prompts, positive and negative alike.
pub fn splice(host: &mut HostPrompt, composed: &PromptPair, options: SpliceOptions) {
    host.prompt = splice_one(&host.prompt, &composed.positive, options);
    host.negative_prompt = splice_one(&host.negative_prompt, &composed.negative, options);
}

fn splice_one(host: &str, composed: &str, options: SpliceOptions) -> String {
    let (first, second) = if options.prepend {
        (composed, host)
    } else {
        (host, composed)
    };
    let first = if options.use_break && !first.is_empty() {
        format!("{first}, {BREAK}")
    } else {
        first.to_string()
    };
    join(&first, second, false)
}

/// Remove every top-level key containing `tag` from a JSON object file and
/// write it back. Returns the number of keys removed; the file is left
/// untouched when nothing matches.
pub fn clear_config(path: impl AsRef<Path>, tag: &str) -> Result<usize> {
    let path = path.as_ref();
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let content = fs::read_to_string(path).map_err(io_err)?;
    let mut value: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
    let Some(object) = value.as_object_mut() else {
        return Err(Error::NotAnObject {
            path: path.to_path_buf(),
        });
    };

    let before = object.len();
    object.retain(|key, _| !key.contains(tag));
    let removed = before - object.len();
    if removed > 0 {
        let out = serde_json::to_string_pretty(&value).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, out).map_err(io_err)?;
    }
    info!(target: LOG_TARGET, path = %path.display(), removed, "cleared config keys");
    Ok(removed)
}
