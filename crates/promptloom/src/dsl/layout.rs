//! Layout DSL parser.
//!
//! Builds the UI tree and registers fragments in a single pass. Open blocks
//! are tracked on a frame stack:
//!
//! ```text
//! TAB Character                     # container: children until END
//!   SINGLE hair --pp long hair      # standalone fragment -> editor node
//!   SELECT Eyes --postfix eyes      # dropdown: choices until END
//!     CHOICES --type COLOR
//!     SINGLE glowing --pp glowing
//!     SET glowing                   # per-choice preset block
//!       SET hair --pp white hair    # mapping fired when `glowing` is picked
//!     END
//!   END
//! END
//! ```
//!
//! A per-choice `SET` block must follow the declaration of its choice, and
//! its opening line takes no arguments; the mappings go on the nested `SET`
//! lines.
//!
//! Blocks tagged `--x 1` are skipped when the config says so. Their contents
//! are still walked to keep `END`s balanced.

use std::path::Path;

use tracing::{debug, trace};

use super::{Directive, Line, parse_value_list, read_source, tokenize};
use crate::LOG_TARGET;
use crate::context::Context;
use crate::error::Warning;
use crate::fragment::{Fragment, FragmentKind};
use crate::ui::{ChoiceSet, Container, ContainerKind, Dropdown, NodeId, PromptEditor, UiNode};

#[derive(Debug, Clone)]
enum Frame {
    Container(NodeId),
    Select(NodeId),
    ChoicePreset { select: NodeId, choice: String },
}

/// Block kinds opened while skipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skipped {
    Block,
    Select,
    ChoicePreset,
}

pub struct LayoutParser<'a> {
    ctx: &'a mut Context,
    stack: Vec<Frame>,
    skipped: Vec<Skipped>,
}

impl<'a> LayoutParser<'a> {
    pub fn new(ctx: &'a mut Context) -> Self {
        Self {
            ctx,
            stack: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn parse_file(self, path: impl AsRef<Path>) -> crate::Result<()> {
        let source = read_source(path.as_ref())?;
        self.parse_str(&source)
    }

    /// Parse layout source. Only strict-mode duplicate fragments fail; every
    /// other problem is reported as a warning on the context.
    pub fn parse_str(mut self, source: &str) -> crate::Result<()> {
        for (i, raw) in source.lines().enumerate() {
            match tokenize(raw, i + 1) {
                Ok(None) => {}
                Ok(Some(Line::Terminator)) => break,
                Ok(Some(Line::Directive(d))) => self.directive(d)?,
                Err(w) => self.ctx.warn(w),
            }
        }

        let open = self.stack.len() + self.skipped.len();
        if open > 0 {
            self.ctx.warn(Warning::UnterminatedBlock { count: open });
        }
        debug!(
            target: LOG_TARGET,
            "layout parsed: {} nodes, {} fragments",
            self.ctx.tree.len(),
            self.ctx.fragments.len()
        );
        Ok(())
    }

    fn directive(&mut self, d: Directive) -> crate::Result<()> {
        trace!(target: LOG_TARGET, line = d.line, kind = %d.kind, name = %d.name, "directive");
        if !self.skipped.is_empty() {
            self.skip(&d);
            return Ok(());
        }
        let skip_tagged = self.ctx.config.skip_tagged_blocks && d.is_tagged_skip();

        if let Some(kind) = ContainerKind::from_directive(&d.kind) {
            if skip_tagged || !self.at_container_level(&d) {
                self.skipped.push(Skipped::Block);
            } else {
                self.open_container(kind, &d);
            }
            return Ok(());
        }

        match d.kind.as_str() {
            "SELECT" => {
                if skip_tagged || !self.at_container_level(&d) {
                    self.skipped.push(Skipped::Select);
                } else {
                    self.open_select(&d);
                }
            }
            "SET" => self.set(&d, skip_tagged),
            "END" => {
                if self.stack.pop().is_none() {
                    self.ctx.warn(Warning::UnbalancedEnd { line: d.line });
                }
            }
            _ if skip_tagged => {}
            "CHOICES" => self.choices(&d)?,
            "SEPARATOR" => {
                if self.at_container_level(&d) {
                    let id = self.ctx.tree.push(UiNode::Separator);
                    self.attach(id);
                }
            }
            kind => match FragmentKind::from_directive(kind) {
                Some(fragment_kind) => self.fragment(fragment_kind, &d)?,
                None => self.ctx.warn(Warning::UnknownType {
                    kind: d.kind.clone(),
                    line: d.line,
                }),
            },
        }
        Ok(())
    }

    /// Walk a line inside a skipped block, tracking its nesting only.
    fn skip(&mut self, d: &Directive) {
        let top = self.skipped.last().copied();
        match d.kind.as_str() {
            "END" => {
                self.skipped.pop();
            }
            "SELECT" => self.skipped.push(Skipped::Select),
            "SET" if top == Some(Skipped::Select) => self.skipped.push(Skipped::ChoicePreset),
            kind if ContainerKind::from_directive(kind).is_some() => {
                self.skipped.push(Skipped::Block);
            }
            _ => {}
        }
    }

    /// True at the root or directly inside a container; warns otherwise.
    fn at_container_level(&mut self, d: &Directive) -> bool {
        match self.stack.last() {
            None | Some(Frame::Container(_)) => true,
            _ => {
                self.misplaced(d);
                false
            }
        }
    }

    fn misplaced(&mut self, d: &Directive) {
        self.ctx.warn(Warning::Misplaced {
            kind: d.kind.clone(),
            line: d.line,
        });
    }

    fn attach(&mut self, id: NodeId) {
        let parent = match self.stack.last() {
            Some(Frame::Container(parent)) => Some(*parent),
            _ => None,
        };
        match parent.and_then(|p| self.ctx.tree.get_mut(p)) {
            Some(UiNode::Container(c)) => c.children.push(id),
            _ => self.ctx.tree.add_root(id),
        }
    }

    fn open_container(&mut self, kind: ContainerKind, d: &Directive) {
        let mut container = Container::new(kind, d.name.clone());
        container.reset_button = d.flag("build_button_reset");
        container.random_button = d.flag("build_button_random");
        container.open = d.flag("open");
        if let Some(raw) = d.arg("scale") {
            match raw.trim().parse::<u32>() {
                Ok(scale) => container.scale = Some(scale),
                Err(_) => self.ctx.warn(Warning::InvalidArgument {
                    fragment: d.name.clone(),
                    key: "scale".into(),
                    value: raw.to_string(),
                }),
            }
        }
        let id = self.ctx.tree.push(UiNode::Container(container));
        self.attach(id);
        self.stack.push(Frame::Container(id));
    }

    fn open_select(&mut self, d: &Directive) {
        let mut dropdown = Dropdown::new(d.name.clone())
            .with_defaults(d.arg("v").map(parse_value_list).unwrap_or_default());
        dropdown.prefix = d.arg("prefix").unwrap_or_default().to_string();
        dropdown.postfix = d.arg("postfix").unwrap_or_default().to_string();
        dropdown.sort = d.flag("sort");
        dropdown.random_button = d.flag("build_button_random");

        let id = self.ctx.tree.push(UiNode::Dropdown(dropdown));
        self.ctx.tree.register(id);
        self.attach(id);
        self.stack.push(Frame::Select(id));
    }

    fn dropdown_mut(&mut self, id: NodeId) -> Option<&mut Dropdown> {
        match self.ctx.tree.get_mut(id) {
            Some(UiNode::Dropdown(d)) => Some(d),
            _ => None,
        }
    }

    fn decoration(&mut self, id: NodeId) -> (String, String) {
        self.dropdown_mut(id)
            .map(|d| (d.prefix.clone(), d.postfix.clone()))
            .unwrap_or_default()
    }

    fn add_choice(&mut self, select: NodeId, fragment: Fragment, line: usize) -> crate::Result<()> {
        let (prefix, postfix) = self.decoration(select);
        let name = fragment.name().to_string();
        self.ctx
            .register_fragment(fragment.into_choice(&prefix, &postfix), line)?;
        if let Some(dropdown) = self.dropdown_mut(select) {
            dropdown.add_choice(name);
        }
        Ok(())
    }

    fn choices(&mut self, d: &Directive) -> crate::Result<()> {
        let Some(Frame::Select(select)) = self.stack.last().cloned() else {
            self.misplaced(d);
            return Ok(());
        };
        let raw_type = d.arg("type").unwrap_or_default();
        let Some(set) = ChoiceSet::from_type(raw_type) else {
            self.ctx.warn(Warning::InvalidChoicesType {
                value: raw_type.to_string(),
                line: d.line,
            });
            return Ok(());
        };
        let postfix = match d.arg("postfix") {
            Some(p) => p.to_string(),
            None => self.decoration(select).1,
        };
        for fragment in set.fragments(&postfix, self.ctx.config.legacy_color_names) {
            self.add_choice(select, fragment, d.line)?;
        }
        Ok(())
    }

    fn fragment(&mut self, kind: FragmentKind, d: &Directive) -> crate::Result<()> {
        if d.name.is_empty() {
            self.ctx.warn(Warning::MalformedLine {
                line: d.line,
                reason: "fragment without a name".into(),
            });
            return Ok(());
        }
        let (fragment, warnings) = Fragment::new(kind, d.name.clone(), &d.args);
        self.ctx.warn_all(warnings);

        match self.stack.last().cloned() {
            Some(Frame::Select(select)) => self.add_choice(select, fragment, d.line)?,
            Some(Frame::ChoicePreset { .. }) => self.misplaced(d),
            None | Some(Frame::Container(_)) => {
                self.ctx.register_fragment(fragment, d.line)?;
                let id = self.ctx.tree.push(UiNode::Editor(PromptEditor::bound(d.name.clone())));
                self.ctx.tree.register(id);
                self.attach(id);
            }
        }
        Ok(())
    }

    /// `SET` directly in a SELECT opens the preset of one choice; `SET`
    /// inside that block adds a mapping to it.
    fn set(&mut self, d: &Directive, skip_tagged: bool) {
        match self.stack.last().cloned() {
            Some(Frame::Select(select)) => {
                if skip_tagged {
                    self.skipped.push(Skipped::ChoicePreset);
                    return;
                }
                for (key, value) in d.args.iter().filter(|(k, _)| k.as_str() != super::SKIP_KEY) {
                    self.ctx.warn(Warning::InvalidArgument {
                        fragment: d.name.clone(),
                        key: key.clone(),
                        value: value.clone(),
                    });
                }
                let owned = self.dropdown_mut(select).is_some_and(|dd| dd.owns(&d.name));
                if !owned {
                    let label = self.dropdown_mut(select).map(|dd| dd.label.clone());
                    self.ctx.warn(Warning::UnknownChoice {
                        dropdown: label.unwrap_or_default(),
                        choice: d.name.clone(),
                    });
                }
                self.stack.push(Frame::ChoicePreset {
                    select,
                    choice: d.name.clone(),
                });
            }
            Some(Frame::ChoicePreset { select, choice }) => {
                if skip_tagged {
                    return;
                }
                let mut args = d.args.clone();
                args.remove(super::SKIP_KEY);
                let warning = self
                    .dropdown_mut(select)
                    .and_then(|dd| dd.choice_preset_mut(&choice).add_mapping(d.name.clone(), args));
                if let Some(w) = warning {
                    self.ctx.warn(w);
                }
            }
            _ => self.misplaced(d),
        }
    }
}
