//! Animation engine: property tweens, easing curves and boundary morphing.

pub mod easing;
pub mod morph;
pub mod tween;

pub use easing::Easing;
pub use morph::{reconcile, resample, MorphJob, ShapeAnimation, ShapeCommit, MIN_SUBPATH_POINTS};
pub use tween::{Animatable, Property, PropertyAnimation};
