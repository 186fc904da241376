//! Ordered fragment registry and prompt composition.
//!
//! The [`FragmentRegistry`] maps fragment names to `(fragment, selected)`.
//! Insertion order is rendering order: [`compose`](FragmentRegistry::compose)
//! walks the entries front to back and joins the output of every selected
//! fragment with `", "`.

use std::collections::HashMap;

use crate::fragment::{Fragment, PromptPair, text::join};

#[derive(Debug, Clone)]
struct Entry {
    fragment: Fragment,
    selected: bool,
}

/// Registry of all fragments, keyed by name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct FragmentRegistry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl FragmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fragment, unselected.
    ///
    /// Re-registering an existing name replaces the fragment in place, so
    /// the rendering position of the first registration is kept. Returns
    /// `true` when a previous fragment was replaced.
    pub fn add(&mut self, fragment: Fragment) -> bool {
        match self.index.get(fragment.name()) {
            Some(&i) => {
                self.entries[i] = Entry {
                    fragment,
                    selected: false,
                };
                true
            }
            None => {
                self.index.insert(fragment.name().to_string(), self.entries.len());
                self.entries.push(Entry {
                    fragment,
                    selected: false,
                });
                false
            }
        }
    }

    /// Remove a fragment. Edit-links pointing at it render empty afterwards.
    pub fn remove(&mut self, name: &str) -> Option<Fragment> {
        let i = self.index.remove(name)?;
        let entry = self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(entry.fragment)
    }

    pub fn get(&self, name: &str) -> Option<&Fragment> {
        self.index.get(name).map(|&i| &self.entries[i].fragment)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Fragment> {
        self.index.get(name).map(|&i| &mut self.entries[i].fragment)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Set the selected flag. Returns `false` if the name is unknown.
    pub fn set_selected(&mut self, name: &str, selected: bool) -> bool {
        match self.index.get(name) {
            Some(&i) => {
                self.entries[i].selected = selected;
                true
            }
            None => false,
        }
    }

    /// Unknown names are never selected.
    pub fn is_selected(&self, name: &str) -> bool {
        self.index
            .get(name)
            .is_some_and(|&i| self.entries[i].selected)
    }

    /// Deselect every fragment.
    pub fn deselect_all(&mut self) {
        for entry in &mut self.entries {
            entry.selected = false;
        }
    }

    /// Fragments in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        self.entries.iter().map(|e| &e.fragment)
    }

    /// Names of selected fragments in registration order.
    pub fn selected_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.selected)
            .map(|e| e.fragment.name())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Join the rendered output of all selected fragments.
    pub fn compose(&self) -> PromptPair {
        let mut out = PromptPair::default();
        for entry in self.entries.iter().filter(|e| e.selected) {
            let rendered = entry.fragment.render(self);
            out.positive = join(&out.positive, &rendered.positive, false);
            out.negative = join(&out.negative, &rendered.negative, false);
        }
        out
    }
}
