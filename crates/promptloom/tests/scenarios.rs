//! End-to-end scenarios driven through the layout and presets DSL.

use std::io::Write;

use promptloom::fragment::{ArgBag, Fragment, FragmentKind};
use promptloom::ui::{EditorInput, UiNode, WidgetUpdate};
use promptloom::{Composer, EngineConfig, Error, FragmentRegistry, PromptPair, Warning};

const HAIR: &str = "SINGLE hair --pp long hair --sp 1.2\n";
const BLURRY: &str = "SINGLE blurry --pp blurry --sp 1 --n 1\n";
const STYLE: &str = "EDIT style --a anime --b realistic --r 25\n";
const HAIR_MIX: &str = "EDIT_LINK hair_mix --link style --a blonde hair --b pink hair\n";

fn load(layout: &str) -> Composer {
    Composer::load(EngineConfig::default().with_seed(11), layout, None).unwrap()
}

fn load_with_presets(layout: &str, presets: &str) -> Composer {
    Composer::load(EngineConfig::default().with_seed(11), layout, Some(presets)).unwrap()
}

fn select(composer: &mut Composer, names: &[&str]) {
    for name in names {
        composer.select_fragment(name).unwrap();
    }
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ── Literal scenarios ──────────────────────────────────────────────

#[test]
fn single_with_emphasis() {
    let mut c = load(HAIR);
    select(&mut c, &["hair"]);
    assert_eq!(c.composed(), PromptPair::new("(long hair:1.2)", ""));
}

#[test]
fn negative_single_alongside_positive() {
    let mut c = load(&format!("{HAIR}{BLURRY}"));
    select(&mut c, &["hair", "blurry"]);
    assert_eq!(c.composed(), PromptPair::new("(long hair:1.2)", "blurry"));
}

#[test]
fn edit_interpolation() {
    let mut c = load(STYLE);
    select(&mut c, &["style"]);
    assert_eq!(c.composed().positive, "[anime:realistic:0.75]");
}

#[test]
fn color_dropdown_in_palette_order() {
    let layout = "SELECT Hair\nCHOICES --type COLOR --postfix hair\nEND\n";
    let mut c = Composer::load(
        EngineConfig::default().with_legacy_color_names(true),
        layout,
        None,
    )
    .unwrap();
    let hair = c.find_node("Hair").unwrap();
    let out = c
        .select_choices(hair, &strings(&["Pink hair", "Blonde hair"]))
        .unwrap();
    assert_eq!(out.prompt.positive, "blonde hair, pink hair");
}

#[test]
fn edit_link_follows_linked_slider() {
    let mut c = load(&format!("{STYLE}{HAIR_MIX}"));
    select(&mut c, &["style", "hair_mix"]);
    assert!(
        c.composed()
            .positive
            .contains("[anime:realistic:0.75], [blonde hair:pink hair:0.75]")
    );
}

#[test]
fn non_additive_preset_overrides_everything_else() {
    let presets = "PRESET Short\nSET hair --pp short hair --sp 1\nEND\n";
    let mut c = load_with_presets(&format!("{HAIR}{BLURRY}"), presets);
    let blurry = c.context().tree.owner_of("blurry").unwrap();
    c.apply_editor(
        blurry,
        &EditorInput {
            prompt: Some("very blurry".into()),
            ..Default::default()
        },
    )
    .unwrap();

    c.apply_preset("Short").unwrap();

    let fragments = &c.context().fragments;
    assert_eq!(fragments.selected_names(), vec!["hair"]);
    assert_eq!(fragments.get("hair").unwrap().values.prompt.get(), "short hair");
    assert_eq!(fragments.get("blurry").unwrap().values.prompt.get(), "blurry");
    assert_eq!(c.composed(), PromptPair::new("short hair", ""));
}

// ── Properties ─────────────────────────────────────────────────────

#[test]
fn compose_is_deterministic_and_ordered() {
    let mut c = load(&format!("{STYLE}{HAIR}{BLURRY}"));
    select(&mut c, &["blurry", "hair", "style"]);
    let first = c.composed();
    assert_eq!(first, c.composed());
    assert_eq!(first.positive, "[anime:realistic:0.75], (long hair:1.2)");
    assert_eq!(first.negative, "blurry");
}

#[test]
fn routing_is_exclusive() {
    let layout = "\
SINGLE a --pp cat
SINGLE b --pp dog --n 1
EDIT c --a x --b y --n 1
EDIT_LINK d --link c --a p --b q
";
    let c = load(layout);
    let registry = &c.context().fragments;
    for fragment in registry.iter() {
        let out = fragment.render(registry);
        assert!(
            out.positive.is_empty() != out.negative.is_empty(),
            "{} rendered {out:?}",
            fragment.name()
        );
    }
}

#[test]
fn emphasis_one_is_bare_and_zero_is_silent() {
    let mut c = load("SINGLE a --pp cat --sp 1\nSINGLE b --pp dog --sp 0\n");
    select(&mut c, &["a", "b"]);
    assert_eq!(c.composed(), PromptPair::new("cat", ""));
}

#[test]
fn edit_boundaries_follow_slider() {
    let mut c = load(STYLE);
    let style = c.context().tree.owner_of("style").unwrap();
    let mut at = |edit: u8| {
        c.apply_editor(
            style,
            &EditorInput {
                edit: Some(edit),
                ..Default::default()
            },
        )
        .unwrap()
        .prompt
        .positive
    };
    assert_eq!(at(0), "anime");
    assert_eq!(at(100), "realistic");
    assert_eq!(at(40), "[anime:realistic:0.6]");
    assert_eq!(at(50), "[anime:realistic:0.5]");
}

#[test]
fn reset_and_clear_are_idempotent() {
    let layout = format!("{HAIR}SELECT Eyes --postfix eyes --v \"blue::sp 1.1\"\nSINGLE blue --pp blue\nSINGLE green --pp green\nEND\n");
    let mut c = load(&layout);
    let hair = c.context().tree.owner_of("hair").unwrap();
    c.apply_editor(
        hair,
        &EditorInput {
            prompt: Some("short".into()),
            ..Default::default()
        },
    )
    .unwrap();

    let once = c.reset_all();
    let twice = c.reset_all();
    assert_eq!(once, twice);
    assert_eq!(once.prompt, PromptPair::new("(blue eyes:1.1)", ""));

    let once = c.clear_all();
    let twice = c.clear_all();
    assert_eq!(once, twice);
    assert!(once.prompt.is_empty());
    assert_eq!(c.context().fragments.get("hair").unwrap().values.prompt.get(), "");
}

#[test]
fn additive_preset_leaves_unmentioned_fragments_alone() {
    let presets = "PRESET Plus --is_additive 1\nSET hair --sp 1.5\nEND\n";
    let mut c = load_with_presets(&format!("{HAIR}{BLURRY}"), presets);
    select(&mut c, &["blurry"]);
    let before = c.context().fragments.get("blurry").unwrap().clone();

    c.apply_preset("Plus").unwrap();

    assert_eq!(c.context().fragments.get("blurry"), Some(&before));
    assert_eq!(c.composed(), PromptPair::new("(long hair:1.5)", "blurry"));
}

#[test]
fn dropdown_selection_matches_request() {
    let layout = "SELECT Hair\nCHOICES --type COLOR --postfix hair\nEND\n";
    let mut c = load(layout);
    let hair = c.find_node("Hair").unwrap();
    let wanted = strings(&["Hair - Red", "Hair - Gold", "Hair - Dark"]);
    let out = c.select_choices(hair, &wanted).unwrap();

    let Some(UiNode::Dropdown(dropdown)) = c.node(hair) else {
        panic!("Hair is not a dropdown");
    };
    let mut selected = dropdown.selected(&c.context().fragments);
    selected.sort();
    let mut expected = wanted.clone();
    expected.sort();
    assert_eq!(selected, expected);

    let view = out
        .updates
        .iter()
        .find_map(|u| match u {
            WidgetUpdate::Dropdown(v) if v.node == hair => Some(v),
            _ => None,
        })
        .unwrap();
    assert_eq!(view.selected, strings(&["Hair - Dark", "Hair - Red", "Hair - Gold"]));
}

#[test]
fn removed_link_target_renders_empty() {
    let mut registry = FragmentRegistry::new();
    let args = |pairs: &[(&str, &str)]| -> ArgBag {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    };
    registry.add(Fragment::new(FragmentKind::Edit, "style", &args(&[("a", "x"), ("b", "y")])).0);
    registry.add(
        Fragment::new(
            FragmentKind::EditLink,
            "mix",
            &args(&[("link", "style"), ("a", "p"), ("b", "q")]),
        )
        .0,
    );
    registry.set_selected("mix", true);
    assert_eq!(registry.compose().positive, "[p:q:0.5]");

    registry.remove("style");
    assert_eq!(registry.compose(), PromptPair::default());
}

#[test]
fn seeded_randomize_is_reproducible_and_bounded() {
    let layout = "GROUP All\nSELECT Hair\nCHOICES --type COLOR --postfix hair\nEND\nEND\n";
    let run = || {
        let mut c = load(layout);
        let group = c.find_node("All").unwrap();
        (0..10)
            .map(|_| c.randomize(group).unwrap().prompt.positive)
            .collect::<Vec<_>>()
    };
    let first = run();
    assert_eq!(first, run());
    for prompt in &first {
        let count = if prompt.is_empty() {
            0
        } else {
            prompt.split(", ").count()
        };
        assert!(count <= 5, "{prompt}");
    }
}

#[test]
fn randomize_honours_configured_bound() {
    let layout = "SELECT Hair\nCHOICES --type COLOR --postfix hair\nEND\n";
    let config = EngineConfig::default().with_seed(3).with_max_random_choices(1);
    let mut c = Composer::load(config, layout, None).unwrap();
    let hair = c.find_node("Hair").unwrap();
    for _ in 0..20 {
        let out = c.randomize(hair).unwrap();
        assert!(!out.prompt.positive.contains(", "));
    }
}

// ── Loading ────────────────────────────────────────────────────────

#[test]
fn loads_layout_and_presets_from_files() {
    let mut layout = tempfile::NamedTempFile::new().unwrap();
    write!(layout, "{HAIR}{BLURRY}").unwrap();
    let mut presets = tempfile::NamedTempFile::new().unwrap();
    write!(presets, "PRESET Both --is_additive 1\nSET hair\nSET blurry\nEND\n").unwrap();

    let mut c = Composer::open(EngineConfig::default(), layout.path(), Some(presets.path())).unwrap();
    let out = c.apply_preset("Both").unwrap();
    assert_eq!(out.prompt, PromptPair::new("(long hair:1.2)", "blurry"));
}

#[test]
fn missing_layout_file_is_an_error() {
    let result = Composer::open(EngineConfig::default(), "/nonexistent/layout.txt", None);
    assert!(matches!(result, Err(Error::Io { .. })));
}

#[test]
fn bad_lines_degrade_to_warnings() {
    let layout = "SINGLE ok --pp fine\nWIBBLE x\nSINGLE --pp nameless\nEND\n";
    let mut c = load(layout);
    let warnings = c.take_warnings();
    assert!(warnings.iter().any(|w| matches!(w, Warning::UnknownType { .. })));
    assert!(warnings.iter().any(|w| matches!(w, Warning::MalformedLine { .. })));
    assert!(warnings.iter().any(|w| matches!(w, Warning::UnbalancedEnd { .. })));
    assert!(c.warnings().is_empty());

    select(&mut c, &["ok"]);
    assert_eq!(c.composed().positive, "fine");
}

#[test]
fn strict_mode_rejects_duplicate_names() {
    let config = EngineConfig::default().with_strict(true);
    let result = Composer::load(config, "SINGLE a --pp x\nSINGLE a --pp y\n", None);
    assert!(matches!(result, Err(Error::DuplicateFragment { line: 2, .. })));

    let c = load("SINGLE a --pp x\nSINGLE a --pp y\n");
    assert_eq!(c.context().fragments.get("a").unwrap().values.prompt.get(), "y");
}
