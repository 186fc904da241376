//! Interactive prompt composition engine for text-to-image generation.
//!
//! `promptloom` assembles a positive and a negative prompt from many named
//! **fragments**. A user-authored layout file arranges the fragments into a
//! tree of containers, dropdowns and editors; a presets file bundles
//! multi-fragment configurations that can be applied additively or as full
//! overrides. Every interaction ends with the selected fragments being
//! composed, in registration order, into a `(positive, negative)` pair.
//!
//! The core has no widget library. Handlers take plain input records and
//! return plain refresh descriptors, so a host UI (or a test) drives the
//! engine directly.
//!
//! # Getting started
//!
//! ```ignore
//! use promptloom::{Composer, EngineConfig};
//!
//! let layout = "\
//! SINGLE hair --pp long hair --sp 1.2
//! SELECT Hair colour
//!   CHOICES --type COLOR --postfix hair
//! END
//! ";
//! let mut composer = Composer::load(EngineConfig::default(), layout, None)?;
//! composer.select_fragment("hair")?;
//! composer.select_fragment("Hair - Blonde")?;
//! assert_eq!(composer.composed().positive, "(long hair:1.2), blonde hair");
//! ```
//!
//! # Where to find things
//!
//! - **How a fragment renders:** [`Fragment::render`](fragment::Fragment::render)
//!   and the helpers in [`fragment::text`].
//! - **How the final prompt is built:**
//!   [`FragmentRegistry::compose`](registry::FragmentRegistry::compose).
//! - **The layout and presets languages:** [`dsl`], [`dsl::layout`],
//!   [`dsl::presets`].
//! - **Handlers a UI calls:** [`Composer`](composer::Composer).
//! - **Feeding the result to a generator:** [`host::splice`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`fragment`] | Fragment variants, value cells, rendering helpers |
//! | [`registry`] | Ordered fragment registry and composition |
//! | [`ui`] | Node arena, editors, dropdowns, containers, presets, refresh descriptors |
//! | [`context`] | Shared state and multi-node operations |
//! | [`dsl`] | Tokenizer, layout parser, presets parser |
//! | [`composer`] | Master controller and global actions |
//! | [`host`] | Prompt splicing and the clear-config utility |
//! | [`config`] | [`EngineConfig`] |
//! | [`error`] | [`Error`] and [`Warning`] |

pub mod composer;
pub mod config;
pub mod context;
pub mod dsl;
pub mod error;
pub mod fragment;
pub mod host;
pub mod registry;
pub mod ui;

/// `tracing` target for every event the engine emits.
pub const LOG_TARGET: &str = "promptloom";

pub use composer::{Composer, Outcome};
pub use config::EngineConfig;
pub use error::{Error, Warning};
pub use fragment::{Fragment, FragmentKind, PromptPair};
pub use registry::FragmentRegistry;

pub type Result<T> = std::result::Result<T, Error>;
