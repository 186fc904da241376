//! Prompt fragments: named, parametrizable building blocks of a prompt.
//!
//! A [`Fragment`] is one of four variants ([`FragmentKind`]) sharing a common
//! [`FragmentValues`] record. Rendering a fragment yields a [`PromptPair`];
//! the [`FragmentRegistry`](crate::registry::FragmentRegistry) joins the pairs
//! of all selected fragments into the final prompts.
//!
//! | variant | renders |
//! |---------|---------|
//! | `Single` | `prompt` with `emphasis`, on the side chosen by `negative` |
//! | `Dual` | `prompt` on the positive side and `prompt_negative` on the negative side |
//! | `Edit` | `[A:B:v]` interpolation between `prompt_a` and `prompt_b` |
//! | `EditLink` | like `Edit`, but `v` comes from the linked edit fragment |

pub mod text;
pub mod values;

pub use values::{ArgBag, FragmentValues, Resettable};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::LOG_TARGET;
use crate::error::Warning;
use crate::registry::FragmentRegistry;
use text::{decorate, emphasize, format_weight, sanitize};

/// The rendered output of one fragment, or of a whole composition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPair {
    pub positive: String,
    pub negative: String,
}

impl PromptPair {
    pub fn new(positive: impl Into<String>, negative: impl Into<String>) -> Self {
        Self {
            positive: positive.into(),
            negative: negative.into(),
        }
    }

    /// Place `text` on the negative side when `negative` is set, otherwise
    /// on the positive side. The other side stays empty.
    pub fn routed(text: String, negative: bool) -> Self {
        if negative {
            Self::new(String::new(), text)
        } else {
            Self::new(text, String::new())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }
}

/// Fragment variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FragmentKind {
    Single,
    Dual,
    Edit,
    EditLink,
}

impl FragmentKind {
    /// Map a layout directive (`SINGLE`, `DUAL`, `EDIT`, `EDIT_LINK`).
    pub fn from_directive(directive: &str) -> Option<Self> {
        match directive {
            "SINGLE" => Some(Self::Single),
            "DUAL" => Some(Self::Dual),
            "EDIT" => Some(Self::Edit),
            "EDIT_LINK" => Some(Self::EditLink),
            _ => None,
        }
    }
}

/// Which editor sub-widgets are shown for a fragment.
///
/// Derived from the variant, plus the adjustments applied to fragments owned
/// by a dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Meta {
    pub name_visible: bool,
    pub prompt_visible: bool,
    pub prompt_enable: bool,
    pub prompt_negative_visible: bool,
    pub prompt_negative_enable: bool,
    pub negative_visible: bool,
    pub prompt_edit_visible: bool,
    /// Interpolation endpoints; edit-links edit them without owning a slider.
    pub prompt_ab_visible: bool,
}

impl Meta {
    pub fn for_kind(kind: FragmentKind, choice: bool) -> Self {
        use FragmentKind::*;
        let prompt = matches!(kind, Single | Dual);
        let meta = Self {
            name_visible: true,
            prompt_visible: prompt,
            prompt_enable: prompt,
            prompt_negative_visible: kind == Dual,
            prompt_negative_enable: kind == Dual,
            negative_visible: matches!(kind, Single | Edit | EditLink),
            prompt_edit_visible: kind == Edit,
            prompt_ab_visible: matches!(kind, Edit | EditLink),
        };
        if choice {
            Self {
                name_visible: false,
                prompt_enable: true,
                prompt_negative_enable: true,
                ..meta
            }
        } else {
            meta
        }
    }
}

/// A named prompt building block.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    name: String,
    label: String,
    kind: FragmentKind,
    choice: bool,
    pub values: FragmentValues,
}

impl Fragment {
    /// Create a fragment whose defaults come from `args`.
    pub fn new(kind: FragmentKind, name: impl Into<String>, args: &ArgBag) -> (Self, Vec<Warning>) {
        let name = name.into();
        let (values, warnings) = FragmentValues::from_args(args, &name);
        let fragment = Self {
            label: name.clone(),
            name,
            kind,
            choice: false,
            values,
        };
        (fragment, warnings)
    }

    /// Override the display label (defaults to the name).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Mark this fragment as owned by a dropdown, inheriting its decoration
    /// where the fragment has none of its own.
    pub fn into_choice(mut self, prefix: &str, postfix: &str) -> Self {
        self.choice = true;
        if self.values.prefix.default_value().is_empty() {
            self.values.prefix.reinit(prefix.to_string(), false);
        }
        if self.values.postfix.default_value().is_empty() {
            self.values.postfix.reinit(postfix.to_string(), false);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    pub fn is_choice(&self) -> bool {
        self.choice
    }

    pub fn meta(&self) -> Meta {
        Meta::for_kind(self.kind, self.choice)
    }

    /// Restore user-visible defaults.
    pub fn reset(&mut self) {
        self.values.reset();
    }

    /// Restore factory defaults.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Render to a `(positive, negative)` pair.
    ///
    /// `registry` is consulted only by edit-links, to read the linked
    /// fragment's interpolation value. Never fails: a dangling link renders
    /// as an empty pair and logs a warning. Render-time warnings go to the
    /// log only; they are not collected on the
    /// [`Context`](crate::context::Context).
    pub fn render(&self, registry: &FragmentRegistry) -> PromptPair {
        let v = &self.values;
        match self.kind {
            FragmentKind::Single => {
                PromptPair::routed(self.weighted(v.prompt.get(), *v.emphasis.get()), *v.negative.get())
            }
            FragmentKind::Dual => PromptPair::new(
                self.weighted(v.prompt.get(), *v.emphasis.get()),
                self.weighted(v.prompt_negative.get(), *v.emphasis_negative.get()),
            ),
            FragmentKind::Edit => {
                PromptPair::routed(self.interpolate(v.edit_factor()), *v.negative.get())
            }
            FragmentKind::EditLink => {
                let target = v.link.get();
                match registry.get(target) {
                    Some(linked) if linked.kind == FragmentKind::Edit => PromptPair::routed(
                        self.interpolate(linked.values.edit_factor()),
                        *v.negative.get(),
                    ),
                    _ => {
                        let warning = Warning::DanglingLink {
                            fragment: self.name.clone(),
                            target: target.clone(),
                        };
                        warn!(target: LOG_TARGET, "{warning}");
                        PromptPair::default()
                    }
                }
            }
        }
    }

    fn decorated(&self, s: &str) -> String {
        decorate(&sanitize(s), self.values.prefix.get(), self.values.postfix.get())
    }

    fn weighted(&self, s: &str, weight: f64) -> String {
        emphasize(&self.decorated(s), weight)
    }

    /// `A` at factor 1, `B` at factor 0, `[A:B:v]` in between.
    fn interpolate(&self, factor: f64) -> String {
        let a = self.decorated(self.values.prompt_a.get());
        let b = self.decorated(self.values.prompt_b.get());
        if a.is_empty() && b.is_empty() {
            String::new()
        } else if factor == 1.0 {
            a
        } else if factor == 0.0 {
            b
        } else {
            format!("[{a}:{b}:{}]", format_weight(factor))
        }
    }
}
