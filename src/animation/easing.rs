//! Easing curves for tweens.
//!
//! Each curve maps progress in `[0.0, 1.0]` to eased progress in `[0.0, 1.0]`
//! with `ease(0) = 0` and `ease(1) = 1`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
}

impl Easing {
    pub const ALL: [Easing; 4] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
    ];

    /// Apply the curve. Input is clamped to `[0.0, 1.0]` first.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            // Hermite smoothstep: 3t² - 2t³
            Easing::EaseInOut => t * t * (3.0 - 2.0 * t),
        }
    }

    /// Look up a curve by script name, ignoring case, `_` and `-`.
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "linear" => Some(Easing::Linear),
            "easein" | "in" => Some(Easing::EaseIn),
            "easeout" | "out" => Some(Easing::EaseOut),
            "easeinout" | "inout" | "smooth" | "smoothstep" => Some(Easing::EaseInOut),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn all_curves_fix_endpoints() {
        for easing in Easing::ALL {
            assert_eq!(easing.apply(0.0), 0.0, "{easing:?} at 0");
            assert_eq!(easing.apply(1.0), 1.0, "{easing:?} at 1");
        }
    }

    #[test]
    fn ease_in_at_half() {
        assert!((Easing::EaseIn.apply(0.5) - 0.25).abs() < EPSILON);
    }

    #[test]
    fn ease_out_at_half() {
        assert!((Easing::EaseOut.apply(0.5) - 0.75).abs() < EPSILON);
    }

    #[test]
    fn ease_in_out_at_half() {
        assert!((Easing::EaseInOut.apply(0.5) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn all_curves_monotonic() {
        for easing in Easing::ALL {
            let mut prev = easing.apply(0.0);
            for i in 1..=100 {
                let t = i as f64 / 100.0;
                let v = easing.apply(t);
                assert!(v >= prev - EPSILON, "{easing:?} not monotonic at t={t}");
                prev = v;
            }
        }
    }

    #[test]
    fn clamps_out_of_range_input() {
        assert_eq!(Easing::Linear.apply(-0.5), 0.0);
        assert_eq!(Easing::EaseOut.apply(1.5), 1.0);
    }

    #[test]
    fn names() {
        assert_eq!(Easing::from_name("EaseInOut"), Some(Easing::EaseInOut));
        assert_eq!(Easing::from_name("ease_in"), Some(Easing::EaseIn));
        assert_eq!(Easing::from_name("LINEAR"), Some(Easing::Linear));
        assert_eq!(Easing::from_name("bounce"), None);
    }

    #[test]
    fn yaml_names_are_lowercase() {
        let parsed: Easing = serde_yaml::from_str("easeout").unwrap();
        assert_eq!(parsed, Easing::EaseOut);
    }
}
