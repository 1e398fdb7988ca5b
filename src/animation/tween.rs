//! Per-property tweens.

use super::easing::Easing;

/// A scalar channel of a primitive that a tween can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    X,
    Y,
    ScaleX,
    ScaleY,
    Rotation,
    Red,
    Green,
    Blue,
    Alpha,
    /// Fraction of the outline drawn, `0.0..=1.0`.
    Reveal,
}

impl Property {
    pub const COLOR: [Property; 4] = [
        Property::Red,
        Property::Green,
        Property::Blue,
        Property::Alpha,
    ];

    /// Script-facing name, matched case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "x" => Property::X,
            "y" => Property::Y,
            "scalex" => Property::ScaleX,
            "scaley" => Property::ScaleY,
            "rotation" => Property::Rotation,
            "red" => Property::Red,
            "green" => Property::Green,
            "blue" => Property::Blue,
            "alpha" => Property::Alpha,
            "reveal" => Property::Reveal,
            _ => return None,
        })
    }
}

/// Anything whose scalar properties can be read and written by a tween.
pub trait Animatable {
    fn get(&self, property: Property) -> f64;
    fn set(&mut self, property: Property, value: f64);
}

/// A time-bounded interpolation of one property from a start to a target value.
///
/// The start value is captured when the tween begins, not when it is scheduled.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAnimation {
    pub property: Property,
    pub from: f64,
    pub to: f64,
    pub duration: f64,
    pub elapsed: f64,
    pub easing: Easing,
}

impl PropertyAnimation {
    /// Start a tween on `target` from its current value.
    pub fn begin(
        target: &impl Animatable,
        property: Property,
        to: f64,
        duration: f64,
        easing: Easing,
    ) -> Self {
        Self {
            property,
            from: target.get(property),
            to,
            duration,
            elapsed: 0.0,
            easing,
        }
    }

    /// Raw (un-eased) progress in `[0.0, 1.0]`. Zero or negative durations are complete.
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    /// Write the value for progress `t` into `target`.
    pub fn apply(&self, target: &mut impl Animatable, t: f64) {
        let e = self.easing.apply(t);
        target.set(self.property, self.from * (1.0 - e) + self.to * e);
    }

    /// Advance by `dt` seconds and apply. Returns `true` once the tween has finished.
    pub fn advance(&mut self, target: &mut impl Animatable, dt: f64) -> bool {
        self.elapsed += dt;
        let t = self.progress();
        self.apply(target, t);
        t >= 1.0
    }
}
