//! Editor bound to a single fragment.

use serde::{Deserialize, Serialize};

use super::NodeId;
use crate::fragment::values::MAX_EDIT;
use crate::fragment::{FragmentKind, Meta};
use crate::registry::FragmentRegistry;

/// Widget values an editor consumes on apply.
///
/// `None` leaves the corresponding cell untouched. Values for sub-widgets the
/// fragment's [`Meta`] hides are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorInput {
    pub prompt: Option<String>,
    pub emphasis: Option<f64>,
    pub negative: Option<bool>,
    pub prompt_negative: Option<String>,
    pub emphasis_negative: Option<f64>,
    pub prompt_a: Option<String>,
    pub prompt_b: Option<String>,
    pub edit: Option<u8>,
}

/// Refresh descriptor for an editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorView {
    pub node: NodeId,
    /// `None` when the editor is not bound to any fragment.
    pub fragment: Option<FragmentView>,
}

/// Current state of the bound fragment, as shown by the editor widgets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FragmentView {
    pub name: String,
    pub label: String,
    pub kind: FragmentKind,
    pub meta: Meta,
    pub selected: bool,
    pub prompt: String,
    pub emphasis: f64,
    pub negative: bool,
    pub prompt_negative: String,
    pub emphasis_negative: f64,
    pub prompt_a: String,
    pub prompt_b: String,
    pub edit: u8,
}

/// Binds one fragment (or none, when embedded in a dropdown with nothing
/// picked) to a group of editor widgets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptEditor {
    fragment: Option<String>,
}

impl PromptEditor {
    pub fn bound(fragment: impl Into<String>) -> Self {
        Self {
            fragment: Some(fragment.into()),
        }
    }

    pub fn unbound() -> Self {
        Self::default()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub fn unbind(&mut self) {
        self.fragment = None;
    }

    /// Switch the binding to `name`, or drop it if `name` is already bound.
    pub fn toggle(&mut self, name: &str) {
        if self.fragment.as_deref() == Some(name) {
            self.fragment = None;
        } else {
            self.fragment = Some(name.to_string());
        }
    }

    /// Write `input` into the bound fragment and select it.
    pub fn apply(&self, fragments: &mut FragmentRegistry, input: &EditorInput) {
        let Some(name) = self.fragment.as_deref() else {
            return;
        };
        let Some(fragment) = fragments.get_mut(name) else {
            return;
        };
        let meta = fragment.meta();
        let v = &mut fragment.values;

        if meta.prompt_visible
            && meta.prompt_enable
            && let Some(p) = &input.prompt
        {
            v.prompt.update(p.clone());
        }
        if meta.prompt_visible
            && let Some(w) = input.emphasis.filter(|w| w.is_finite())
        {
            v.emphasis.update(w);
        }
        if meta.prompt_negative_visible && meta.prompt_negative_enable {
            if let Some(p) = &input.prompt_negative {
                v.prompt_negative.update(p.clone());
            }
            if let Some(w) = input.emphasis_negative.filter(|w| w.is_finite()) {
                v.emphasis_negative.update(w);
            }
        }
        if meta.negative_visible
            && let Some(n) = input.negative
        {
            v.negative.update(n);
        }
        if meta.prompt_ab_visible {
            if let Some(a) = &input.prompt_a {
                v.prompt_a.update(a.clone());
            }
            if let Some(b) = &input.prompt_b {
                v.prompt_b.update(b.clone());
            }
        }
        if meta.prompt_edit_visible
            && let Some(r) = input.edit
        {
            v.edit.update(r.min(MAX_EDIT));
        }

        fragments.set_selected(name, true);
    }

    /// Deselect the bound fragment.
    pub fn remove(&self, fragments: &mut FragmentRegistry) {
        if let Some(name) = self.fragment.as_deref() {
            fragments.set_selected(name, false);
        }
    }

    /// Restore defaults (or factory values with `clear`) and deselect.
    pub fn reset(&self, fragments: &mut FragmentRegistry, clear: bool) {
        let Some(name) = self.fragment.as_deref() else {
            return;
        };
        if let Some(fragment) = fragments.get_mut(name) {
            if clear {
                fragment.clear();
            } else {
                fragment.reset();
            }
        }
        fragments.set_selected(name, false);
    }

    pub fn view(&self, node: NodeId, fragments: &FragmentRegistry) -> EditorView {
        let fragment = self.fragment.as_deref().and_then(|name| {
            let f = fragments.get(name)?;
            let v = &f.values;
            Some(FragmentView {
                name: f.name().to_string(),
                label: f.label().to_string(),
                kind: f.kind(),
                meta: f.meta(),
                selected: fragments.is_selected(name),
                prompt: v.prompt.get().clone(),
                emphasis: *v.emphasis.get(),
                negative: *v.negative.get(),
                prompt_negative: v.prompt_negative.get().clone(),
                emphasis_negative: *v.emphasis_negative.get(),
                prompt_a: v.prompt_a.get().clone(),
                prompt_b: v.prompt_b.get().clone(),
                edit: *v.edit.get(),
            })
        });
        EditorView { node, fragment }
    }
}
