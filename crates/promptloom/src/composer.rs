//! Master controller.
//!
//! [`Composer`] owns the parsed layout, the presets and the randomize RNG.
//! Every handler is a synchronous `(state, input) -> (state', updates,
//! prompt)` step: it mutates the [`Context`], then returns an [`Outcome`]
//! holding the refresh descriptors of the affected nodes and the recomposed
//! prompt pair.
//!
//! ```ignore
//! let mut composer = Composer::open(EngineConfig::default(), "layout.txt", Some("presets.txt".as_ref()))?;
//! let outcome = composer.apply_preset("Portrait")?;
//! println!("{}", outcome.prompt.positive);
//! ```

use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::LOG_TARGET;
use crate::config::EngineConfig;
use crate::context::Context;
use crate::dsl::layout::LayoutParser;
use crate::dsl::presets::PresetParser;
use crate::error::{Error, Warning};
use crate::fragment::PromptPair;
use crate::ui::{EditorInput, NodeId, NodeInput, Preset, UiNode, WidgetUpdate};

/// Result of one handler: widgets to refresh and the recomposed prompts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub updates: Vec<WidgetUpdate>,
    pub prompt: PromptPair,
}

pub struct Composer {
    ctx: Context,
    presets: Vec<NodeId>,
    rng: StdRng,
}

impl Composer {
    /// Build from layout and optional presets source text.
    pub fn load(config: EngineConfig, layout: &str, presets: Option<&str>) -> crate::Result<Self> {
        let mut ctx = Context::new(config);
        LayoutParser::new(&mut ctx).parse_str(layout)?;
        let presets = presets
            .map(|src| PresetParser::new(&mut ctx).parse_str(src))
            .unwrap_or_default();
        Ok(Self::from_parts(ctx, presets))
    }

    /// Build from layout and optional presets files.
    pub fn open(
        config: EngineConfig,
        layout: impl AsRef<Path>,
        presets: Option<&Path>,
    ) -> crate::Result<Self> {
        let mut ctx = Context::new(config);
        LayoutParser::new(&mut ctx).parse_file(layout)?;
        let presets = match presets {
            Some(path) => PresetParser::new(&mut ctx).parse_file(path)?,
            None => Vec::new(),
        };
        Ok(Self::from_parts(ctx, presets))
    }

    fn from_parts(mut ctx: Context, presets: Vec<Preset>) -> Self {
        let presets = presets
            .into_iter()
            .map(|p| ctx.tree.push(UiNode::Preset(p)))
            .collect::<Vec<_>>();
        ctx.init_all();
        let rng = match ctx.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        info!(
            target: LOG_TARGET,
            fragments = ctx.fragments.len(),
            nodes = ctx.tree.len(),
            presets = presets.len(),
            warnings = ctx.warnings().len(),
            "composer ready"
        );
        Self { ctx, presets, rng }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn warnings(&self) -> &[Warning] {
        self.ctx.warnings()
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        self.ctx.take_warnings()
    }

    /// Current `(positive, negative)` pair.
    pub fn composed(&self) -> PromptPair {
        self.ctx.fragments.compose()
    }

    pub fn roots(&self) -> &[NodeId] {
        self.ctx.tree.roots()
    }

    pub fn presets(&self) -> Vec<&Preset> {
        self.presets
            .iter()
            .filter_map(|&id| match self.ctx.tree.get(id) {
                Some(UiNode::Preset(p)) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn node(&self, id: NodeId) -> Option<&UiNode> {
        self.ctx.tree.get(id)
    }

    /// First container or dropdown with this label.
    pub fn find_node(&self, label: &str) -> Option<NodeId> {
        self.ctx.tree.find_by_label(label)
    }

    /// Refresh every registered node.
    pub fn refresh_all(&self) -> Outcome {
        self.outcome(self.ctx.refresh_registered())
    }

    fn outcome(&self, updates: Vec<WidgetUpdate>) -> Outcome {
        Outcome {
            updates,
            prompt: self.composed(),
        }
    }

    // ── Node handlers ─────────────────────────────────────────────

    /// Editor Apply. On a dropdown, applies to its embedded editor.
    pub fn apply_editor(&mut self, node: NodeId, input: &EditorInput) -> crate::Result<Outcome> {
        match self.ctx.tree.get(node) {
            Some(UiNode::Editor(e)) => e.apply(&mut self.ctx.fragments, input),
            Some(UiNode::Dropdown(d)) => d.apply_editor(&mut self.ctx.fragments, input),
            _ => return Err(Error::UnknownNode(node)),
        }
        debug!(target: LOG_TARGET, %node, "apply editor");
        Ok(self.outcome(self.ctx.refresh(node)))
    }

    /// Editor Remove. On a dropdown, deselects the choice its editor shows.
    pub fn remove_editor(&mut self, node: NodeId) -> crate::Result<Outcome> {
        match self.ctx.tree.get_mut(node) {
            Some(UiNode::Editor(e)) => e.remove(&mut self.ctx.fragments),
            Some(UiNode::Dropdown(d)) => d.remove_editor(&mut self.ctx.fragments),
            _ => return Err(Error::UnknownNode(node)),
        }
        debug!(target: LOG_TARGET, %node, "remove editor");
        Ok(self.outcome(self.ctx.refresh(node)))
    }

    /// Dropdown multi-select change.
    pub fn select_choices(&mut self, node: NodeId, names: &[String]) -> crate::Result<Outcome> {
        let Some(UiNode::Dropdown(d)) = self.ctx.tree.get_mut(node) else {
            return Err(Error::UnknownNode(node));
        };
        let warnings = d.set_selected_choices(&mut self.ctx.fragments, names);
        self.ctx.warn_all(warnings);
        debug!(target: LOG_TARGET, %node, ?names, "select choices");
        // Per-choice presets may have touched other nodes.
        Ok(self.outcome(self.ctx.refresh_registered()))
    }

    /// Choice button: bind or unbind the dropdown's editor.
    pub fn toggle_choice(&mut self, node: NodeId, name: &str) -> crate::Result<Outcome> {
        let Some(UiNode::Dropdown(d)) = self.ctx.tree.get_mut(node) else {
            return Err(Error::UnknownNode(node));
        };
        if !d.toggle_choice(&self.ctx.fragments, name) {
            debug!(target: LOG_TARGET, %node, name, "ignored click on hidden choice button");
        }
        Ok(self.outcome(self.ctx.refresh(node)))
    }

    /// Randomize a dropdown, or every dropdown below a container.
    pub fn randomize(&mut self, node: NodeId) -> crate::Result<Outcome> {
        match self.ctx.tree.get(node) {
            Some(UiNode::Dropdown(_) | UiNode::Container(_)) => {}
            _ => return Err(Error::UnknownNode(node)),
        }
        self.ctx.randomize_node(node, &mut self.rng);
        debug!(target: LOG_TARGET, %node, "randomize");
        Ok(self.outcome(self.ctx.refresh(node)))
    }

    /// Reset button of an editor, dropdown or container.
    pub fn reset(&mut self, node: NodeId, clear: bool) -> crate::Result<Outcome> {
        match self.ctx.tree.get(node) {
            Some(UiNode::Editor(_) | UiNode::Dropdown(_) | UiNode::Container(_)) => {}
            _ => return Err(Error::UnknownNode(node)),
        }
        self.ctx.reset_node(node, clear);
        debug!(target: LOG_TARGET, %node, clear, "reset");
        Ok(self.outcome(self.ctx.refresh(node)))
    }

    pub fn apply_preset(&mut self, name: &str) -> crate::Result<Outcome> {
        let preset = self
            .presets()
            .into_iter()
            .find(|p| p.name() == name)
            .cloned()
            .ok_or_else(|| Error::UnknownPreset(name.to_string()))?;
        self.ctx.apply_preset(&preset);
        info!(target: LOG_TARGET, preset = name, additive = preset.is_additive(), "applied preset");
        Ok(self.refresh_all())
    }

    /// Select a fragment through the node that hosts it. Choices go through
    /// the dropdown, so their per-choice preset fires.
    pub fn select_fragment(&mut self, name: &str) -> crate::Result<Outcome> {
        let owner = self
            .ctx
            .tree
            .owner_of(name)
            .ok_or_else(|| Error::UnknownFragment(name.to_string()))?;
        match self.ctx.tree.get_mut(owner) {
            Some(UiNode::Dropdown(d)) => {
                let mut names = d.selected(&self.ctx.fragments);
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
                let warnings = d.set_selected_choices(&mut self.ctx.fragments, &names);
                self.ctx.warn_all(warnings);
            }
            _ => {
                self.ctx.fragments.set_selected(name, true);
            }
        }
        Ok(self.refresh_all())
    }

    // ── Global actions ────────────────────────────────────────────

    /// Consume widget values into their nodes and select every fragment
    /// bound to a standalone editor.
    pub fn apply_all(&mut self, inputs: &[(NodeId, NodeInput)]) -> crate::Result<Outcome> {
        self.consume(inputs)?;
        for &id in self.ctx.tree.registered() {
            if let Some(UiNode::Editor(e)) = self.ctx.tree.get(id)
                && let Some(name) = e.fragment()
            {
                self.ctx.fragments.set_selected(name, true);
            }
        }
        info!(target: LOG_TARGET, inputs = inputs.len(), "apply all");
        Ok(self.refresh_all())
    }

    /// Consume widget values, then deselect everything.
    pub fn remove_all(&mut self, inputs: &[(NodeId, NodeInput)]) -> crate::Result<Outcome> {
        self.consume(inputs)?;
        self.ctx.fragments.deselect_all();
        info!(target: LOG_TARGET, inputs = inputs.len(), "remove all");
        Ok(self.refresh_all())
    }

    /// Restore defaults and default selections everywhere.
    pub fn reset_all(&mut self) -> Outcome {
        self.reset_registered(false);
        info!(target: LOG_TARGET, "reset all");
        self.refresh_all()
    }

    /// Restore factory values and deselect everything.
    pub fn clear_all(&mut self) -> Outcome {
        self.reset_registered(true);
        info!(target: LOG_TARGET, "clear all");
        self.refresh_all()
    }

    fn reset_registered(&mut self, clear: bool) {
        for id in self.ctx.tree.registered().to_vec() {
            self.ctx.reset_node(id, clear);
        }
    }

    /// Validate every input against its node, then apply them in order.
    fn consume(&mut self, inputs: &[(NodeId, NodeInput)]) -> crate::Result<()> {
        for (id, input) in inputs {
            let fits = matches!(
                (self.ctx.tree.get(*id), input),
                (Some(UiNode::Editor(_)), NodeInput::Editor(_))
                    | (Some(UiNode::Dropdown(_)), NodeInput::Dropdown(_))
            );
            if !fits {
                return Err(Error::UnknownNode(*id));
            }
        }
        for (id, input) in inputs {
            self.ctx.apply_input(*id, input)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::DropdownInput;

    const LAYOUT: &str = "\
TAB Main --build_button_reset 1
  SINGLE hair --pp long hair --sp 1.2
  SINGLE blurry --pp blurry --n 1
  SELECT Eyes --postfix eyes --v \"blue\"
    SINGLE blue --pp blue
    SINGLE green --pp green
    SET green
      SET hair --pp red hair
    END
  END
END
";

    const PRESETS: &str = "\
PRESET Short
  SET hair --pp short hair --sp 1
END
PRESET Plus --is_additive 1
  SET blurry
END
";

    fn composer() -> Composer {
        Composer::load(EngineConfig::default().with_seed(1), LAYOUT, Some(PRESETS)).unwrap()
    }

    fn id_of(c: &Composer, fragment: &str) -> NodeId {
        c.context().tree.owner_of(fragment).unwrap()
    }

    #[test]
    fn init_applies_dropdown_defaults() {
        let c = composer();
        assert!(c.warnings().is_empty(), "{:?}", c.warnings());
        assert_eq!(c.composed(), PromptPair::new("blue eyes", ""));
        assert_eq!(c.presets().len(), 2);
    }

    #[test]
    fn apply_and_remove_editor() {
        let mut c = composer();
        let hair = id_of(&c, "hair");
        let out = c.apply_editor(hair, &EditorInput::default()).unwrap();
        assert_eq!(out.prompt.positive, "(long hair:1.2), blue eyes");
        assert_eq!(out.updates.len(), 1);

        let out = c.remove_editor(hair).unwrap();
        assert_eq!(out.prompt.positive, "blue eyes");
    }

    #[test]
    fn choice_preset_fires_on_select() {
        let mut c = composer();
        let eyes = id_of(&c, "blue");
        let out = c
            .select_choices(eyes, &["green".to_string()])
            .unwrap();
        assert_eq!(out.prompt.positive, "(red hair:1.2), green eyes");
    }

    #[test]
    fn dropdown_editor_is_addressed_through_the_dropdown() {
        let mut c = composer();
        let eyes = id_of(&c, "blue");
        c.toggle_choice(eyes, "blue").unwrap();
        let out = c
            .apply_editor(
                eyes,
                &EditorInput {
                    emphasis: Some(1.5),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(out.prompt.positive, "(blue eyes:1.5)");
        let out = c.remove_editor(eyes).unwrap();
        assert!(out.prompt.positive.is_empty());
        // The removed choice is no longer bound, so a later Apply is a no-op.
        let out = c.apply_editor(eyes, &EditorInput::default()).unwrap();
        assert!(out.prompt.positive.is_empty());
    }

    #[test]
    fn presets_by_name() {
        let mut c = composer();
        c.apply_preset("Plus").unwrap();
        assert_eq!(c.composed().negative, "blurry");
        // Unmentioned dropdowns lose their default selection too.
        let out = c.apply_preset("Short").unwrap();
        assert_eq!(out.prompt, PromptPair::new("short hair", ""));
        assert!(matches!(c.apply_preset("nope"), Err(Error::UnknownPreset(_))));
    }

    #[test]
    fn global_actions() {
        let mut c = composer();
        let hair = id_of(&c, "hair");
        let eyes = id_of(&c, "blue");
        let inputs = vec![
            (
                hair,
                NodeInput::Editor(EditorInput {
                    prompt: Some("wavy hair".into()),
                    ..Default::default()
                }),
            ),
            (
                eyes,
                NodeInput::Dropdown(DropdownInput {
                    selected: Some(vec!["blue".into()]),
                    editor: None,
                }),
            ),
        ];
        let out = c.apply_all(&inputs).unwrap();
        assert_eq!(out.prompt, PromptPair::new("(wavy hair:1.2), blue eyes", "blurry"));

        let out = c.remove_all(&[]).unwrap();
        assert!(out.prompt.is_empty());

        let out = c.reset_all();
        assert_eq!(out.prompt, PromptPair::new("blue eyes", ""));
        assert_eq!(c.context().fragments.get("hair").unwrap().values.prompt.get(), "long hair");

        let out = c.clear_all();
        assert!(out.prompt.is_empty());
    }

    #[test]
    fn apply_all_rejects_mismatched_inputs_before_mutating() {
        let mut c = composer();
        let hair = id_of(&c, "hair");
        let inputs = vec![
            (hair, NodeInput::Editor(EditorInput::default())),
            (hair, NodeInput::Dropdown(DropdownInput::default())),
        ];
        assert!(c.apply_all(&inputs).is_err());
        assert_eq!(c.composed(), PromptPair::new("blue eyes", ""));
    }

    #[test]
    fn select_fragment_routes_through_owner() {
        let mut c = composer();
        c.select_fragment("green").unwrap();
        assert_eq!(c.composed().positive, "(red hair:1.2), blue eyes, green eyes");
        c.select_fragment("blurry").unwrap();
        assert_eq!(c.composed().negative, "blurry");
        assert!(matches!(c.select_fragment("ghost"), Err(Error::UnknownFragment(_))));
    }

    #[test]
    fn container_reset_and_randomize() {
        let mut c = composer();
        let main = c.roots()[0];
        c.select_fragment("hair").unwrap();
        let out = c.reset(main, false).unwrap();
        assert_eq!(out.prompt.positive, "blue eyes");
        assert_eq!(out.updates.len(), 3);

        let out = c.randomize(main).unwrap();
        assert!(!out.prompt.positive.contains("hair"));
    }

    #[test]
    fn handlers_reject_wrong_nodes() {
        let mut c = composer();
        let hair = id_of(&c, "hair");
        assert!(matches!(c.select_choices(hair, &[]), Err(Error::UnknownNode(_))));
        assert!(matches!(c.randomize(hair), Err(Error::UnknownNode(_))));
        assert!(c.reset(NodeId(999), false).is_err());
    }
}
