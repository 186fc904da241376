//! Shared engine state passed to parsers and node operations.
//!
//! [`Context`] holds both registries: the fragment registry and the UI node
//! arena with its registered subset. The parsers fill it and the
//! [`Composer`](crate::composer::Composer) owns it afterwards. Node-level
//! operations that touch several nodes (container reset, randomize, preset
//! application) live here so they can borrow the tree and the fragments
//! independently.

use rand::Rng;
use tracing::warn;

use crate::LOG_TARGET;
use crate::config::EngineConfig;
use crate::error::{Error, Warning};
use crate::fragment::Fragment;
use crate::registry::FragmentRegistry;
use crate::ui::{NodeId, NodeInput, Preset, UiNode, UiTree, WidgetUpdate};

#[derive(Debug, Clone, Default)]
pub struct Context {
    pub fragments: FragmentRegistry,
    pub tree: UiTree,
    pub config: EngineConfig,
    warnings: Vec<Warning>,
}

impl Context {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Log a configuration warning and keep it for the host.
    pub fn warn(&mut self, warning: Warning) {
        warn!(target: LOG_TARGET, "{warning}");
        self.warnings.push(warning);
    }

    pub fn warn_all(&mut self, warnings: impl IntoIterator<Item = Warning>) {
        for w in warnings {
            self.warn(w);
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    /// Register a fragment defined on `line`.
    ///
    /// A duplicate name replaces the earlier fragment at its original
    /// position and warns, or fails in strict mode.
    pub fn register_fragment(&mut self, fragment: Fragment, line: usize) -> crate::Result<()> {
        if self.fragments.contains(fragment.name()) {
            let name = fragment.name().to_string();
            if self.config.strict {
                return Err(Error::DuplicateFragment { name, line });
            }
            self.warn(Warning::DuplicateFragment { name, line });
        }
        self.fragments.add(fragment);
        Ok(())
    }

    /// Sort dropdown choices and apply default selections on every node.
    pub fn init_all(&mut self) {
        let mut warnings = Vec::new();
        for i in 0..self.tree.len() {
            if let Some(UiNode::Dropdown(d)) = self.tree.get_mut(NodeId(i)) {
                warnings.extend(d.init(&mut self.fragments));
            }
        }
        self.warn_all(warnings);
    }

    /// Reset `id` and, for containers, everything below it.
    pub fn reset_node(&mut self, id: NodeId, clear: bool) {
        for nid in self.tree.descendants(id) {
            match self.tree.get_mut(nid) {
                Some(UiNode::Editor(e)) => e.reset(&mut self.fragments, clear),
                Some(UiNode::Dropdown(d)) => d.reset(&mut self.fragments, clear),
                _ => {}
            }
        }
    }

    /// Randomize every dropdown at or below `id`.
    pub fn randomize_node<R: Rng + ?Sized>(&mut self, id: NodeId, rng: &mut R) {
        let max = self.config.max_random_choices;
        for nid in self.tree.descendants(id) {
            if let Some(UiNode::Dropdown(d)) = self.tree.get_mut(nid) {
                d.randomize(&mut self.fragments, rng, max);
            }
        }
    }

    /// Consume one node's widget values.
    pub fn apply_input(&mut self, id: NodeId, input: &NodeInput) -> crate::Result<()> {
        let warnings = match (self.tree.get_mut(id), input) {
            (Some(UiNode::Editor(e)), NodeInput::Editor(values)) => {
                e.apply(&mut self.fragments, values);
                Vec::new()
            }
            (Some(UiNode::Dropdown(d)), NodeInput::Dropdown(values)) => {
                d.apply(&mut self.fragments, values)
            }
            _ => return Err(Error::UnknownNode(id)),
        };
        self.warn_all(warnings);
        Ok(())
    }

    /// Apply a preset.
    ///
    /// A non-additive preset first resets and deselects every registered
    /// fragment it does not mention. Default dropdown selections are not
    /// restored; only the preset decides what ends up selected.
    pub fn apply_preset(&mut self, preset: &Preset) {
        if !preset.is_additive() {
            for id in self.tree.registered().to_vec() {
                match self.tree.get_mut(id) {
                    Some(UiNode::Editor(e)) => {
                        if !e.fragment().is_some_and(|f| preset.mentions(f)) {
                            e.reset(&mut self.fragments, false);
                        }
                    }
                    Some(UiNode::Dropdown(d)) => {
                        d.reset_except(&mut self.fragments, |c| preset.mentions(c));
                    }
                    _ => {}
                }
            }
        }
        let warnings = preset.apply_mappings(&mut self.fragments);
        self.warn_all(warnings);
    }

    /// Refresh descriptors for `id` and everything below it.
    pub fn refresh(&self, id: NodeId) -> Vec<WidgetUpdate> {
        self.tree
            .descendants(id)
            .into_iter()
            .filter_map(|nid| self.view(nid))
            .collect()
    }

    /// Refresh descriptors for every registered node.
    pub fn refresh_registered(&self) -> Vec<WidgetUpdate> {
        self.tree
            .registered()
            .iter()
            .filter_map(|&nid| self.view(nid))
            .collect()
    }

    fn view(&self, id: NodeId) -> Option<WidgetUpdate> {
        match self.tree.get(id)? {
            UiNode::Editor(e) => Some(WidgetUpdate::Editor(e.view(id, &self.fragments))),
            UiNode::Dropdown(d) => Some(WidgetUpdate::Dropdown(d.view(id, &self.fragments))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{ArgBag, FragmentKind};
    use crate::ui::{Container, ContainerKind, Dropdown, PromptEditor};

    fn bag(pairs: &[(&str, &str)]) -> ArgBag {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn single(name: &str, prompt: &str) -> Fragment {
        Fragment::new(FragmentKind::Single, name, &bag(&[("pp", prompt)])).0
    }

    fn with_editor(ctx: &mut Context, name: &str, prompt: &str) -> NodeId {
        ctx.register_fragment(single(name, prompt), 0).unwrap();
        let id = ctx.tree.push(UiNode::Editor(PromptEditor::bound(name)));
        ctx.tree.register(id);
        id
    }

    #[test]
    fn duplicate_fragment_warns_or_fails_in_strict_mode() {
        let mut ctx = Context::default();
        ctx.register_fragment(single("a", "x"), 1).unwrap();
        ctx.register_fragment(single("a", "y"), 2).unwrap();
        assert!(matches!(ctx.warnings()[0], Warning::DuplicateFragment { line: 2, .. }));

        let mut strict = Context::new(EngineConfig::default().with_strict(true));
        strict.register_fragment(single("a", "x"), 1).unwrap();
        let err = strict.register_fragment(single("a", "y"), 2).unwrap_err();
        assert!(matches!(err, Error::DuplicateFragment { .. }));
    }

    #[test]
    fn container_reset_reaches_children() {
        let mut ctx = Context::default();
        let a = with_editor(&mut ctx, "a", "cat");
        let b = with_editor(&mut ctx, "b", "dog");
        let group = ctx.tree.push(UiNode::Container(Container {
            children: vec![a, b],
            ..Container::new(ContainerKind::Group, "g")
        }));
        ctx.fragments.set_selected("a", true);
        ctx.fragments.set_selected("b", true);

        ctx.reset_node(group, false);
        assert!(ctx.fragments.selected_names().is_empty());
        assert_eq!(ctx.refresh(group).len(), 2);
    }

    #[test]
    fn non_additive_preset_resets_unmentioned_nodes() {
        let mut ctx = Context::default();
        with_editor(&mut ctx, "hair", "long hair");
        with_editor(&mut ctx, "blurry", "blurry");
        ctx.fragments.set_selected("blurry", true);
        ctx.fragments
            .get_mut("blurry")
            .unwrap()
            .values
            .prompt
            .update("very blurry".into());

        let mut preset = Preset::new("short", false);
        preset.add_mapping("hair", bag(&[("pp", "short hair")]));
        ctx.apply_preset(&preset);

        assert_eq!(ctx.fragments.selected_names(), vec!["hair"]);
        assert_eq!(ctx.fragments.get("blurry").unwrap().values.prompt.get(), "blurry");
    }

    #[test]
    fn additive_preset_leaves_others_alone() {
        let mut ctx = Context::default();
        with_editor(&mut ctx, "hair", "long hair");
        with_editor(&mut ctx, "blurry", "blurry");
        ctx.fragments.set_selected("blurry", true);

        let mut preset = Preset::new("add", true);
        preset.add_mapping("hair", ArgBag::new());
        ctx.apply_preset(&preset);
        assert_eq!(ctx.fragments.selected_names(), vec!["hair", "blurry"]);
    }

    #[test]
    fn partially_mentioned_dropdown_keeps_mentioned_choices() {
        let mut ctx = Context::default();
        let mut dropdown = Dropdown::new("Eyes");
        for name in ["blue", "green"] {
            ctx.register_fragment(single(name, name).into_choice("", "eyes"), 0).unwrap();
            dropdown.add_choice(name);
        }
        let id = ctx.tree.push(UiNode::Dropdown(dropdown));
        ctx.tree.register(id);
        ctx.fragments.set_selected("blue", true);

        let mut preset = Preset::new("green", false);
        preset.add_mapping("green", ArgBag::new());
        ctx.apply_preset(&preset);
        assert_eq!(ctx.fragments.selected_names(), vec!["green"]);
    }

    #[test]
    fn non_additive_preset_drops_default_dropdown_selection() {
        let mut ctx = Context::default();
        with_editor(&mut ctx, "hair", "long hair");
        ctx.register_fragment(single("blue", "blue").into_choice("", "eyes"), 0).unwrap();
        let mut dropdown = Dropdown::new("Eyes").with_defaults(vec![("blue".into(), ArgBag::new())]);
        dropdown.add_choice("blue");
        let id = ctx.tree.push(UiNode::Dropdown(dropdown));
        ctx.tree.register(id);
        ctx.init_all();
        assert_eq!(ctx.fragments.selected_names(), vec!["blue"]);

        let mut preset = Preset::new("short", false);
        preset.add_mapping("hair", bag(&[("pp", "short hair")]));
        ctx.apply_preset(&preset);
        assert_eq!(ctx.fragments.selected_names(), vec!["hair"]);
        assert_eq!(ctx.fragments.compose().positive, "short hair");
    }

    #[test]
    fn apply_input_rejects_mismatched_node() {
        let mut ctx = Context::default();
        let sep = ctx.tree.push(UiNode::Separator);
        let err = ctx
            .apply_input(sep, &NodeInput::Editor(Default::default()))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownNode(id) if id == sep));
    }
}
