//! Named multi-fragment parameter bundles.
//!
//! A preset maps fragment names to arg bags. Applying it writes each bag into
//! its fragment and selects it. Additive presets stop there; full-override
//! presets also reset every node they do not mention (see
//! [`Context::apply_preset`](crate::context::Context::apply_preset)).

use crate::error::Warning;
use crate::fragment::ArgBag;
use crate::registry::FragmentRegistry;

#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    name: String,
    additive: bool,
    mappings: Vec<(String, ArgBag)>,
}

impl Preset {
    pub fn new(name: impl Into<String>, additive: bool) -> Self {
        Self {
            name: name.into(),
            additive,
            mappings: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_additive(&self) -> bool {
        self.additive
    }

    pub fn mappings(&self) -> &[(String, ArgBag)] {
        &self.mappings
    }

    /// Add a mapping. A second mapping for the same target replaces the
    /// first and is reported.
    pub fn add_mapping(&mut self, target: impl Into<String>, args: ArgBag) -> Option<Warning> {
        let target = target.into();
        if let Some(slot) = self.mappings.iter_mut().find(|(t, _)| *t == target) {
            slot.1 = args;
            return Some(Warning::DuplicatePresetMapping {
                preset: self.name.clone(),
                target,
            });
        }
        self.mappings.push((target, args));
        None
    }

    pub fn mentions(&self, fragment: &str) -> bool {
        self.mappings.iter().any(|(t, _)| t == fragment)
    }

    /// Write every mapping into its fragment and select it.
    pub fn apply_mappings(&self, fragments: &mut FragmentRegistry) -> Vec<Warning> {
        let mut warnings = Vec::new();
        for (target, args) in &self.mappings {
            match fragments.get_mut(target) {
                Some(fragment) => {
                    warnings.extend(fragment.values.update_from_args(args, false, target));
                    fragments.set_selected(target, true);
                }
                None => warnings.push(Warning::UnknownPresetTarget {
                    preset: self.name.clone(),
                    target: target.clone(),
                }),
            }
        }
        warnings
    }
}
