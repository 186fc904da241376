//! Line-oriented layout and presets DSL.
//!
//! Both languages share one tokenizer. Every non-empty line that is not a
//! `#` comment has the shape
//!
//! ```text
//! TYPE [NAME] (--key value)*
//! ```
//!
//! NAME is everything between TYPE and the first argument. A `--` opens an
//! argument only at the start of the remainder or after whitespace, so names
//! and values may contain dashes. A line holding only `.` ends parsing.
//!
//! [`layout::LayoutParser`] and [`presets::PresetParser`] are stack machines
//! over the resulting [`Directive`]s. Both prefer warnings to errors: a
//! malformed line is skipped and parsing continues.

pub mod layout;
pub mod presets;

use std::fs;
use std::path::Path;

use crate::Error;
use crate::error::Warning;
use crate::fragment::ArgBag;
use crate::fragment::values::parse_flag;

/// Argument that tags a block or line as skipped.
pub const SKIP_KEY: &str = "x";

/// One tokenized line.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Directive(Directive),
    /// `.` on its own line.
    Terminator,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Upper-cased TYPE.
    pub kind: String,
    pub name: String,
    pub args: ArgBag,
    /// 1-based source line.
    pub line: usize,
}

impl Directive {
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str)
    }

    /// Boolean argument; absent or unparsable counts as unset.
    pub fn flag(&self, key: &str) -> bool {
        self.arg(key).and_then(parse_flag).unwrap_or(false)
    }

    /// Tagged `--x 1`.
    pub fn is_tagged_skip(&self) -> bool {
        self.flag(SKIP_KEY)
    }
}

/// Tokenize one source line. Blank lines and comments yield `None`.
pub fn tokenize(raw: &str, line: usize) -> Result<Option<Line>, Warning> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    if trimmed == "." {
        return Ok(Some(Line::Terminator));
    }
    if trimmed.starts_with("--") {
        return Err(malformed(line, "missing directive type"));
    }

    let (kind, rest) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));
    let rest = rest.trim_start();

    let starts: Vec<usize> = rest
        .match_indices("--")
        .map(|(i, _)| i)
        .filter(|&i| i == 0 || rest.split_at(i).0.ends_with(char::is_whitespace))
        .collect();

    let name_end = starts.first().copied().unwrap_or(rest.len());
    let name = rest.split_at(name_end).0.trim();

    let mut args = ArgBag::new();
    for (n, &start) in starts.iter().enumerate() {
        let end = starts.get(n + 1).copied().unwrap_or(rest.len());
        let segment = rest.split_at(end).0.split_at(start).1;
        let body = segment.strip_prefix("--").unwrap_or(segment);
        let (key, value) = body
            .split_once(char::is_whitespace)
            .unwrap_or((body, ""));
        let key = key.trim();
        if key.is_empty() {
            return Err(malformed(line, "argument without a name"));
        }
        args.insert(key.to_string(), unquote(value.trim()).to_string());
    }

    Ok(Some(Line::Directive(Directive {
        kind: kind.to_ascii_uppercase(),
        name: unquote(name).to_string(),
        args,
        line,
    })))
}

fn malformed(line: usize, reason: &str) -> Warning {
    Warning::MalformedLine {
        line,
        reason: reason.to_string(),
    }
}

/// Strip one layer of matching quotes.
fn unquote(s: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(q).and_then(|t| t.strip_suffix(q)) {
            return inner;
        }
    }
    s
}

/// Parse a `--v` value list: `name[::key val|key val], name2, ...`.
pub fn parse_value_list(value: &str) -> Vec<(String, ArgBag)> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (name, params) = item.split_once("::").unwrap_or((item, ""));
            let args = params
                .split('|')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| {
                    let (k, v) = p.split_once(char::is_whitespace).unwrap_or((p, ""));
                    (k.to_string(), unquote(v.trim()).to_string())
                })
                .collect();
            (name.trim().to_string(), args)
        })
        .collect()
}

/// Read a whole DSL file. The handle is closed before returning.
pub(crate) fn read_source(path: &Path) -> crate::Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}
