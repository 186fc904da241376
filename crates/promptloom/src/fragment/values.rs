//! Resettable value cells and the arg-bag vocabulary that drives them.
//!
//! Every fragment carries the full [`FragmentValues`] record regardless of
//! variant; fields a variant does not use are simply never rendered. Each
//! field is a [`Resettable`] cell holding the current value and the
//! user-visible default recorded when the layout was parsed.

use std::collections::BTreeMap;

use super::text::round2;
use crate::error::Warning;

/// Key/value arguments as written in the DSL (`--pp long hair --sp 1.2`).
pub type ArgBag = BTreeMap<String, String>;

/// Stable arg-bag keys.
pub mod keys {
    pub const PROMPT: &str = "pp";
    pub const PROMPT_NEGATIVE: &str = "pn";
    pub const EMPHASIS: &str = "sp";
    pub const EMPHASIS_NEGATIVE: &str = "sn";
    pub const NEGATIVE: &str = "n";
    pub const PROMPT_A: &str = "a";
    pub const PROMPT_B: &str = "b";
    pub const EDIT: &str = "r";
    pub const PREFIX: &str = "prefix";
    pub const POSTFIX: &str = "postfix";
    pub const LINK: &str = "link";
}

/// Factory default for both emphasis cells.
pub const DEFAULT_EMPHASIS: f64 = 1.0;
/// Factory default for the interpolation control.
pub const DEFAULT_EDIT: u8 = 50;
/// Upper bound of the interpolation control.
pub const MAX_EDIT: u8 = 100;

// ── Resettable ─────────────────────────────────────────────────────

/// A value paired with the default it resets to.
#[derive(Debug, Clone, PartialEq)]
pub struct Resettable<T> {
    current: T,
    default: T,
}

impl<T: Clone> Resettable<T> {
    /// A cell whose current value equals its default.
    pub fn new(value: T) -> Self {
        Self {
            current: value.clone(),
            default: value,
        }
    }

    pub fn get(&self) -> &T {
        &self.current
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn update(&mut self, value: T) {
        self.current = value;
    }

    pub fn reset(&mut self) {
        self.current = self.default.clone();
    }

    /// Replace the default. The current value follows it unless
    /// `keep_current` is set.
    pub fn reinit(&mut self, default: T, keep_current: bool) {
        if !keep_current {
            self.current = default.clone();
        }
        self.default = default;
    }
}

impl<T: Clone + Default> Default for Resettable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

// ── FragmentValues ─────────────────────────────────────────────────

/// The common value record shared by all fragment variants.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentValues {
    pub prompt: Resettable<String>,
    pub emphasis: Resettable<f64>,
    pub negative: Resettable<bool>,
    pub prompt_negative: Resettable<String>,
    pub emphasis_negative: Resettable<f64>,
    pub prompt_a: Resettable<String>,
    pub prompt_b: Resettable<String>,
    pub edit: Resettable<u8>,
    pub prefix: Resettable<String>,
    pub postfix: Resettable<String>,
    /// Name of the fragment an edit-link reads its `edit` value from.
    pub link: Resettable<String>,
}

impl Default for FragmentValues {
    fn default() -> Self {
        Self {
            prompt: Resettable::default(),
            emphasis: Resettable::new(DEFAULT_EMPHASIS),
            negative: Resettable::new(false),
            prompt_negative: Resettable::default(),
            emphasis_negative: Resettable::new(DEFAULT_EMPHASIS),
            prompt_a: Resettable::default(),
            prompt_b: Resettable::default(),
            edit: Resettable::new(DEFAULT_EDIT),
            prefix: Resettable::default(),
            postfix: Resettable::default(),
            link: Resettable::default(),
        }
    }
}

/// How parsed arguments are written into the cells.
#[derive(Debug, Clone, Copy)]
enum Write {
    /// Change current values; absent keys optionally reset.
    Update { reset_if_none: bool },
    /// Change defaults; absent keys are untouched.
    Reinit { keep_current: bool },
}

impl FragmentValues {
    /// Build a record whose defaults come from `args`.
    ///
    /// `owner` names the fragment in any warning produced.
    pub fn from_args(args: &ArgBag, owner: &str) -> (Self, Vec<Warning>) {
        let mut values = Self::default();
        let warnings = values.reinit_from_args(args, false, owner);
        (values, warnings)
    }

    /// Write arg-bag values into the current cells.
    ///
    /// With `reset_if_none`, every cell whose key is absent from `args` is
    /// reset to its default.
    pub fn update_from_args(
        &mut self,
        args: &ArgBag,
        reset_if_none: bool,
        owner: &str,
    ) -> Vec<Warning> {
        self.write(args, Write::Update { reset_if_none }, owner)
    }

    /// Write arg-bag values as new defaults.
    pub fn reinit_from_args(&mut self, args: &ArgBag, keep_current: bool, owner: &str) -> Vec<Warning> {
        self.write(args, Write::Reinit { keep_current }, owner)
    }

    /// Restore the user-visible defaults.
    pub fn reset(&mut self) {
        self.prompt.reset();
        self.emphasis.reset();
        self.negative.reset();
        self.prompt_negative.reset();
        self.emphasis_negative.reset();
        self.prompt_a.reset();
        self.prompt_b.reset();
        self.edit.reset();
        self.prefix.reset();
        self.postfix.reset();
        self.link.reset();
    }

    /// Restore the factory defaults of the editable cells.
    ///
    /// Decoration (prefix, postfix) and the edit-link target are structural
    /// and keep their current values.
    pub fn clear(&mut self) {
        self.prompt.update(String::new());
        self.emphasis.update(DEFAULT_EMPHASIS);
        self.negative.update(false);
        self.prompt_negative.update(String::new());
        self.emphasis_negative.update(DEFAULT_EMPHASIS);
        self.prompt_a.update(String::new());
        self.prompt_b.update(String::new());
        self.edit.update(DEFAULT_EDIT);
    }

    /// Interpolation factor `round(1 - edit/100, 2)`.
    pub fn edit_factor(&self) -> f64 {
        round2(1.0 - f64::from(*self.edit.get()) / 100.0)
    }

    fn write(&mut self, args: &ArgBag, mode: Write, owner: &str) -> Vec<Warning> {
        let mut warnings = Vec::new();
        let mut invalid = |key: &str, value: &str| {
            warnings.push(Warning::InvalidArgument {
                fragment: owner.to_string(),
                key: key.to_string(),
                value: value.to_string(),
            });
        };

        let text = |key: &str| args.get(key).cloned();
        let mut number = |key: &str, parse: fn(&str) -> Option<f64>| {
            let raw = args.get(key)?;
            let parsed = parse(raw);
            if parsed.is_none() {
                invalid(key, raw);
            }
            parsed
        };
        let emphasis = number(keys::EMPHASIS, parse_weight);
        let emphasis_negative = number(keys::EMPHASIS_NEGATIVE, parse_weight);
        let edit = number(keys::EDIT, parse_edit).map(|v| v as u8);
        let negative = match args.get(keys::NEGATIVE) {
            Some(raw) => {
                let parsed = parse_flag(raw);
                if parsed.is_none() {
                    invalid(keys::NEGATIVE, raw);
                }
                parsed
            }
            None => None,
        };

        apply(&mut self.prompt, text(keys::PROMPT), mode);
        apply(&mut self.prompt_negative, text(keys::PROMPT_NEGATIVE), mode);
        apply(&mut self.prompt_a, text(keys::PROMPT_A), mode);
        apply(&mut self.prompt_b, text(keys::PROMPT_B), mode);
        apply(&mut self.prefix, text(keys::PREFIX), mode);
        apply(&mut self.postfix, text(keys::POSTFIX), mode);
        apply(&mut self.link, text(keys::LINK), mode);
        apply(&mut self.emphasis, emphasis, mode);
        apply(&mut self.emphasis_negative, emphasis_negative, mode);
        apply(&mut self.edit, edit, mode);
        apply(&mut self.negative, negative, mode);

        warnings
    }
}

fn apply<T: Clone>(cell: &mut Resettable<T>, value: Option<T>, mode: Write) {
    match (value, mode) {
        (Some(v), Write::Update { .. }) => cell.update(v),
        (None, Write::Update { reset_if_none: true }) => cell.reset(),
        (Some(v), Write::Reinit { keep_current }) => cell.reinit(v, keep_current),
        (None, _) => {}
    }
}

// ── Argument parsing ───────────────────────────────────────────────

/// Parse a boolean flag. An empty value counts as set.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_weight(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|w| w.is_finite())
}

/// Parse the interpolation control, clamped to `0..=100`.
fn parse_edit(raw: &str) -> Option<f64> {
    let v = raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(v.round().clamp(0.0, f64::from(MAX_EDIT)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(pairs: &[(&str, &str)]) -> ArgBag {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn resettable_update_and_reset() {
        let mut cell = Resettable::new(3);
        cell.update(7);
        assert_eq!(*cell.get(), 7);
        cell.reset();
        assert_eq!(*cell.get(), 3);
    }

    #[test]
    fn resettable_reinit_keeps_current_on_request() {
        let mut cell = Resettable::new(1);
        cell.update(5);
        cell.reinit(9, true);
        assert_eq!(*cell.get(), 5);
        assert_eq!(*cell.default_value(), 9);
        cell.reinit(4, false);
        assert_eq!(*cell.get(), 4);
    }

    #[test]
    fn from_args_sets_defaults() {
        let (values, warnings) =
            FragmentValues::from_args(&bag(&[("pp", "long hair"), ("sp", "1.2"), ("n", "1")]), "hair");
        assert!(warnings.is_empty());
        assert_eq!(values.prompt.default_value(), "long hair");
        assert_eq!(*values.emphasis.get(), 1.2);
        assert!(*values.negative.get());
    }

    #[test]
    fn update_without_reset_keeps_other_cells() {
        let (mut values, _) = FragmentValues::from_args(&bag(&[("pp", "cat"), ("sp", "1.5")]), "f");
        values.update_from_args(&bag(&[("pp", "dog")]), false, "f");
        assert_eq!(values.prompt.get(), "dog");
        assert_eq!(*values.emphasis.get(), 1.5);
    }

    #[test]
    fn update_with_reset_if_none_resets_absent_cells() {
        let (mut values, _) = FragmentValues::from_args(&bag(&[("pp", "cat"), ("sp", "1.5")]), "f");
        values.emphasis.update(0.4);
        values.update_from_args(&bag(&[("pp", "dog")]), true, "f");
        assert_eq!(values.prompt.get(), "dog");
        assert_eq!(*values.emphasis.get(), 1.5);
    }

    #[test]
    fn invalid_values_warn_and_are_skipped() {
        let mut values = FragmentValues::default();
        let warnings = values.update_from_args(&bag(&[("sp", "lots"), ("n", "maybe")]), false, "f");
        assert_eq!(warnings.len(), 2);
        assert_eq!(*values.emphasis.get(), DEFAULT_EMPHASIS);
        assert!(!*values.negative.get());
    }

    #[test]
    fn edit_is_clamped() {
        let mut values = FragmentValues::default();
        values.update_from_args(&bag(&[("r", "140")]), false, "f");
        assert_eq!(*values.edit.get(), 100);
        values.update_from_args(&bag(&[("r", "-3")]), false, "f");
        assert_eq!(*values.edit.get(), 0);
    }

    #[test]
    fn clear_restores_factory_but_keeps_decoration() {
        let (mut values, _) = FragmentValues::from_args(
            &bag(&[("pp", "cat"), ("r", "10"), ("postfix", "hair")]),
            "f",
        );
        values.clear();
        assert_eq!(values.prompt.get(), "");
        assert_eq!(*values.edit.get(), DEFAULT_EDIT);
        assert_eq!(values.postfix.get(), "hair");
        let once = values.clone();
        values.clear();
        assert_eq!(values, once);
    }

    #[test]
    fn edit_factor_rounds() {
        let mut values = FragmentValues::default();
        values.edit.update(25);
        assert_eq!(values.edit_factor(), 0.75);
        values.edit.update(100);
        assert_eq!(values.edit_factor(), 0.0);
        values.edit.update(0);
        assert_eq!(values.edit_factor(), 1.0);
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag(""), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("True"), Some(true));
        assert_eq!(parse_flag("2"), None);
    }
}
