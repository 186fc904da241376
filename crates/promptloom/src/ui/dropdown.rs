//! Multi-select over a set of choice fragments.
//!
//! A [`Dropdown`] owns its choice fragments. The fragments' selected flags
//! are authoritative; the multi-select value shown by the widget is derived
//! from them on every refresh. Each selected choice also gets a button that
//! binds the embedded [`PromptEditor`] to it, so one editor serves every
//! choice.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::NodeId;
use super::editor::{EditorInput, EditorView, PromptEditor};
use super::preset::Preset;
use crate::error::Warning;
use crate::fragment::text::capitalize;
use crate::fragment::values::keys;
use crate::fragment::{ArgBag, Fragment, FragmentKind};
use crate::registry::FragmentRegistry;

/// Colour keys for `CHOICES --type COLOR`, in display order.
pub const COLOR_PALETTE: [&str; 22] = [
    "Dark",
    "Light",
    "Black",
    "Grey",
    "White",
    "Brown",
    "Blue",
    "Green",
    "Red",
    "Blonde",
    "Rainbow",
    "Pink",
    "Purple",
    "Orange",
    "Yellow",
    "Multicolored",
    "Pale",
    "Silver",
    "Gold",
    "Tan",
    "Two tone",
    "Two-tone",
];

/// Generated choice sets available to `CHOICES --type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceSet {
    Color,
}

impl ChoiceSet {
    pub fn from_type(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "COLOR" | "COLOUR" => Some(Self::Color),
            _ => None,
        }
    }

    /// Build the fragments of this set. `postfix` decorates every choice.
    pub fn fragments(self, postfix: &str, legacy_names: bool) -> Vec<Fragment> {
        match self {
            Self::Color => COLOR_PALETTE
                .iter()
                .map(|key| color_choice(key, postfix.trim(), legacy_names))
                .collect(),
        }
    }
}

fn color_choice(key: &str, postfix: &str, legacy_names: bool) -> Fragment {
    let name = match (postfix.is_empty(), legacy_names) {
        (true, _) => key.to_string(),
        (false, true) => format!("{key} {postfix}"),
        (false, false) => format!("{} - {key}", capitalize(postfix)),
    };
    let mut args = ArgBag::new();
    args.insert(keys::PROMPT.into(), key.to_lowercase());
    args.insert(keys::POSTFIX.into(), postfix.to_string());
    Fragment::new(FragmentKind::Single, name, &args).0
}

/// Widget values a dropdown consumes on apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropdownInput {
    /// New multi-select value; `None` keeps the current selection.
    pub selected: Option<Vec<String>>,
    /// Values for the embedded editor.
    pub editor: Option<EditorInput>,
}

/// Refresh descriptor for a dropdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropdownView {
    pub node: NodeId,
    pub label: String,
    /// Derived multi-select value, in choice order.
    pub selected: Vec<String>,
    pub choices: Vec<ChoiceView>,
    pub editor: EditorView,
    pub random_button: bool,
}

/// One choice and its button. The button is visible iff the choice is
/// selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceView {
    pub name: String,
    pub label: String,
    pub selected: bool,
    /// The embedded editor is bound to this choice.
    pub bound: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dropdown {
    pub label: String,
    pub prefix: String,
    pub postfix: String,
    /// Sort choices by name at init.
    pub sort: bool,
    pub random_button: bool,
    choices: Vec<String>,
    defaults: Vec<(String, ArgBag)>,
    choice_presets: HashMap<String, Preset>,
    editor: PromptEditor,
    initialized: bool,
}

impl Dropdown {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            prefix: String::new(),
            postfix: String::new(),
            sort: false,
            random_button: false,
            choices: Vec::new(),
            defaults: Vec::new(),
            choice_presets: HashMap::new(),
            editor: PromptEditor::unbound(),
            initialized: false,
        }
    }

    /// Choices applied and selected once at init (`SELECT --v`).
    pub fn with_defaults(mut self, defaults: Vec<(String, ArgBag)>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn add_choice(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.choices.contains(&name) {
            self.choices.push(name);
        }
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn owns(&self, fragment: &str) -> bool {
        self.choices.iter().any(|c| c == fragment)
    }

    pub fn editor(&self) -> &PromptEditor {
        &self.editor
    }

    /// The additive preset fired when `choice` becomes selected, created on
    /// first use.
    pub fn choice_preset_mut(&mut self, choice: &str) -> &mut Preset {
        let name = format!("{}/{choice}", self.label);
        self.choice_presets
            .entry(choice.to_string())
            .or_insert_with(|| Preset::new(name, true))
    }

    pub fn choice_preset(&self, choice: &str) -> Option<&Preset> {
        self.choice_presets.get(choice)
    }

    /// Sort choices and apply the default selections. Runs once.
    pub fn init(&mut self, fragments: &mut FragmentRegistry) -> Vec<Warning> {
        if self.initialized {
            return Vec::new();
        }
        self.initialized = true;
        if self.sort {
            self.choices.sort();
        }

        let mut warnings = Vec::new();
        for (name, args) in &self.defaults {
            if !self.choices.contains(name) {
                warnings.push(Warning::UnknownChoice {
                    dropdown: self.label.clone(),
                    choice: name.clone(),
                });
                continue;
            }
            if let Some(fragment) = fragments.get_mut(name) {
                warnings.extend(fragment.values.reinit_from_args(args, false, name));
            }
            fragments.set_selected(name, true);
        }
        warnings
    }

    /// Names of the currently selected choices, in choice order.
    pub fn selected(&self, fragments: &FragmentRegistry) -> Vec<String> {
        self.choices
            .iter()
            .filter(|c| fragments.is_selected(c))
            .cloned()
            .collect()
    }

    /// Make exactly `names` the selected choices.
    ///
    /// Choices that become selected fire their per-choice preset, in choice
    /// order. The editor binding is dropped if its fragment is no longer
    /// selected.
    pub fn set_selected_choices(
        &mut self,
        fragments: &mut FragmentRegistry,
        names: &[String],
    ) -> Vec<Warning> {
        let mut warnings: Vec<Warning> = names
            .iter()
            .filter(|n| !self.owns(n))
            .map(|n| Warning::UnknownChoice {
                dropdown: self.label.clone(),
                choice: n.clone(),
            })
            .collect();

        let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
        let before: HashSet<String> = self.selected(fragments).into_iter().collect();

        for choice in &self.choices {
            fragments.set_selected(choice, wanted.contains(choice.as_str()));
        }
        for choice in &self.choices {
            let newly = wanted.contains(choice.as_str()) && !before.contains(choice);
            if newly && let Some(preset) = self.choice_presets.get(choice) {
                warnings.extend(preset.apply_mappings(fragments));
            }
        }

        self.drop_stale_binding(fragments);
        warnings
    }

    /// Choice-button click: bind or unbind the editor. Buttons of unselected
    /// choices are hidden, so clicks on them are ignored.
    pub fn toggle_choice(&mut self, fragments: &FragmentRegistry, name: &str) -> bool {
        if !self.owns(name) || !fragments.is_selected(name) {
            return false;
        }
        self.editor.toggle(name);
        true
    }

    /// Select a random subset of at most `max` choices.
    pub fn randomize<R: Rng + ?Sized>(
        &mut self,
        fragments: &mut FragmentRegistry,
        rng: &mut R,
        max: usize,
    ) {
        let k = rng.gen_range(0..=self.choices.len().min(max));
        let picked: HashSet<String> = self.choices.choose_multiple(rng, k).cloned().collect();
        for choice in &self.choices {
            fragments.set_selected(choice, picked.contains(choice));
        }
        self.drop_stale_binding(fragments);
    }

    /// Restore choice defaults and default selections, or with `clear`
    /// factory values and nothing selected.
    pub fn reset(&mut self, fragments: &mut FragmentRegistry, clear: bool) {
        for choice in &self.choices {
            if let Some(fragment) = fragments.get_mut(choice) {
                if clear {
                    fragment.clear();
                } else {
                    fragment.reset();
                }
            }
            let default_selected = !clear && self.defaults.iter().any(|(n, _)| n == choice);
            fragments.set_selected(choice, default_selected);
        }
        self.editor.unbind();
    }

    /// Reset and deselect only the choices `keep` rejects.
    pub fn reset_except(&mut self, fragments: &mut FragmentRegistry, keep: impl Fn(&str) -> bool) {
        for choice in self.choices.iter().filter(|c| !keep(c.as_str())) {
            if let Some(fragment) = fragments.get_mut(choice) {
                fragment.reset();
            }
            fragments.set_selected(choice, false);
        }
        self.drop_stale_binding(fragments);
    }

    pub fn apply(&mut self, fragments: &mut FragmentRegistry, input: &DropdownInput) -> Vec<Warning> {
        let mut warnings = Vec::new();
        if let Some(selected) = &input.selected {
            warnings = self.set_selected_choices(fragments, selected);
        }
        if let Some(editor_input) = &input.editor {
            self.editor.apply(fragments, editor_input);
        }
        warnings
    }

    /// Apply values to the embedded editor only.
    pub fn apply_editor(&self, fragments: &mut FragmentRegistry, input: &EditorInput) {
        self.editor.apply(fragments, input);
    }

    /// Deselect the bound choice, which also unbinds the editor.
    pub fn remove_editor(&mut self, fragments: &mut FragmentRegistry) {
        self.editor.remove(fragments);
        self.drop_stale_binding(fragments);
    }

    pub fn view(&self, node: NodeId, fragments: &FragmentRegistry) -> DropdownView {
        let choices = self
            .choices
            .iter()
            .map(|name| ChoiceView {
                name: name.clone(),
                label: fragments
                    .get(name)
                    .map_or_else(|| name.clone(), |f| f.label().to_string()),
                selected: fragments.is_selected(name),
                bound: self.editor.fragment() == Some(name.as_str()),
            })
            .collect();
        DropdownView {
            node,
            label: self.label.clone(),
            selected: self.selected(fragments),
            choices,
            editor: self.editor.view(node, fragments),
            random_button: self.random_button,
        }
    }

    fn drop_stale_binding(&mut self, fragments: &FragmentRegistry) {
        if let Some(bound) = self.editor.fragment()
            && !fragments.is_selected(bound)
        {
            self.editor.unbind();
        }
    }
}
