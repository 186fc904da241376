//! Presets DSL parser.
//!
//! ```text
//! PRESET Short hair --is_additive 0
//!   SET hair --pp short hair --sp 1
//! END
//! ```

use std::path::Path;

use tracing::debug;

use super::{Directive, Line, SKIP_KEY, read_source, tokenize};
use crate::LOG_TARGET;
use crate::context::Context;
use crate::error::Warning;
use crate::ui::Preset;

pub struct PresetParser<'a> {
    ctx: &'a mut Context,
    open: Option<Preset>,
    /// Inside a PRESET tagged `--x 1`.
    skipping: bool,
    presets: Vec<Preset>,
}

impl<'a> PresetParser<'a> {
    pub fn new(ctx: &'a mut Context) -> Self {
        Self {
            ctx,
            open: None,
            skipping: false,
            presets: Vec::new(),
        }
    }

    pub fn parse_file(self, path: impl AsRef<Path>) -> crate::Result<Vec<Preset>> {
        let source = read_source(path.as_ref())?;
        Ok(self.parse_str(&source))
    }

    pub fn parse_str(mut self, source: &str) -> Vec<Preset> {
        for (i, raw) in source.lines().enumerate() {
            match tokenize(raw, i + 1) {
                Ok(None) => {}
                Ok(Some(Line::Terminator)) => break,
                Ok(Some(Line::Directive(d))) => self.directive(d),
                Err(w) => self.ctx.warn(w),
            }
        }
        if self.skipping || self.open.is_some() {
            self.ctx.warn(Warning::UnterminatedBlock { count: 1 });
        }
        if let Some(preset) = self.open.take() {
            self.presets.push(preset);
        }
        debug!(target: LOG_TARGET, "presets parsed: {}", self.presets.len());
        self.presets
    }

    fn directive(&mut self, d: Directive) {
        let tagged = self.ctx.config.skip_tagged_blocks && d.is_tagged_skip();
        match d.kind.as_str() {
            "END" => {
                if self.skipping {
                    self.skipping = false;
                } else if let Some(preset) = self.open.take() {
                    self.presets.push(preset);
                } else {
                    self.ctx.warn(Warning::UnbalancedEnd { line: d.line });
                }
            }
            _ if self.skipping => {}
            "PRESET" => {
                if self.open.is_some() {
                    self.misplaced(&d);
                } else if tagged {
                    self.skipping = true;
                } else {
                    self.open = Some(Preset::new(d.name.clone(), d.flag("is_additive")));
                }
            }
            "SET" => {
                if tagged {
                    return;
                }
                let Some(preset) = self.open.as_mut() else {
                    self.misplaced(&d);
                    return;
                };
                let mut args = d.args;
                args.remove(SKIP_KEY);
                if let Some(w) = preset.add_mapping(d.name, args) {
                    self.ctx.warn(w);
                }
            }
            _ => self.ctx.warn(Warning::UnknownType {
                kind: d.kind.clone(),
                line: d.line,
            }),
        }
    }

    fn misplaced(&mut self, d: &Directive) {
        self.ctx.warn(Warning::Misplaced {
            kind: d.kind.clone(),
            line: d.line,
        });
    }
}
