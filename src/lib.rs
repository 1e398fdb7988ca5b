//! Tweenscript: a small scripting language for timed 2-D shape animation.
//!
//! A script is parsed ([`dsl`]), run once against a recording [`scene`] by
//! the [`runtime`], then played back frame by frame through the
//! [`animation`] engine. [`player::Player`] wires these together.

pub mod animation;
pub mod config;
pub mod dsl;
pub mod geometry;
pub mod player;
pub mod render;
pub mod runtime;
pub mod scene;

pub use config::PlaybackConfig;
pub use player::Player;
