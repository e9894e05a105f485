//! Breathing-exercise catalog
//!
//! Built-in guided meditations offered when the tracker recommends a break.

use serde::{Deserialize, Serialize};

/// Timing of one breathing cycle, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathingPattern {
    pub inhale: u32,
    pub hold: u32,
    pub exhale: u32,
    pub cycles: u32,
}

impl BreathingPattern {
    /// Length of one inhale-hold-exhale cycle
    pub fn cycle_secs(&self) -> u32 {
        self.inhale + self.hold + self.exhale
    }

    /// Length of the whole exercise
    pub fn total_secs(&self) -> u32 {
        self.cycle_secs() * self.cycles
    }

    /// Where in the exercise `elapsed_secs` falls.
    ///
    /// Returns `None` before the start or once every cycle has completed.
    pub fn phase_at(&self, elapsed_secs: f64) -> Option<BreathingStep> {
        let cycle_len = f64::from(self.cycle_secs());
        if elapsed_secs.is_nan() || elapsed_secs < 0.0 || cycle_len <= 0.0 {
            return None;
        }

        let cycle = (elapsed_secs / cycle_len).floor();
        if cycle >= f64::from(self.cycles) {
            return None;
        }

        let mut offset = elapsed_secs - cycle * cycle_len;
        for (phase, secs) in [
            (BreathingPhase::Inhale, self.inhale),
            (BreathingPhase::Hold, self.hold),
            (BreathingPhase::Exhale, self.exhale),
        ] {
            let secs = f64::from(secs);
            if offset < secs {
                return Some(BreathingStep {
                    phase,
                    cycle: cycle as u32 + 1,
                    remaining_secs: secs - offset,
                });
            }
            offset -= secs;
        }

        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BreathingPhase {
    Inhale,
    Hold,
    Exhale,
}

/// Position inside a breathing exercise
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreathingStep {
    pub phase: BreathingPhase,
    /// 1-based cycle number
    pub cycle: u32,
    /// Seconds left in the current phase
    pub remaining_secs: f64,
}

/// A guided breathing exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Meditation {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Nominal length (seconds)
    pub duration: u32,
    pub pattern: BreathingPattern,
}

pub const MEDITATIONS: [Meditation; 3] = [
    Meditation {
        id: "quick-calm",
        name: "Quick Calm (1 min)",
        description: "Box breathing for quick stress relief",
        duration: 60,
        pattern: BreathingPattern {
            inhale: 4,
            hold: 4,
            exhale: 4,
            cycles: 5,
        },
    },
    Meditation {
        id: "mindful-break",
        name: "Mindful Break (3 min)",
        description: "4-7-8 breathing for deep relaxation",
        duration: 180,
        pattern: BreathingPattern {
            inhale: 4,
            hold: 7,
            exhale: 8,
            cycles: 9,
        },
    },
    Meditation {
        id: "deep-relaxation",
        name: "Deep Relaxation (5 min)",
        description: "Extended breathing for full body relaxation",
        duration: 300,
        pattern: BreathingPattern {
            inhale: 5,
            hold: 5,
            exhale: 7,
            cycles: 18,
        },
    },
];

pub fn meditation_by_id(id: &str) -> Option<&'static Meditation> {
    MEDITATIONS.iter().find(|m| m.id == id)
}

/// The mindful break
pub fn default_meditation() -> &'static Meditation {
    &MEDITATIONS[1]
}

/// Catalog entry whose nominal length is nearest to `duration_secs`; ties go
/// to the shorter exercise
pub fn closest_to(duration_secs: u32) -> &'static Meditation {
    MEDITATIONS
        .iter()
        .min_by_key(|m| m.duration.abs_diff(duration_secs))
        .unwrap_or_else(default_meditation)
}

/// Whole minutes credited for a completed exercise, at least one
pub fn credited_minutes(meditation: &Meditation) -> u32 {
    ((meditation.duration + 30) / 60).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_id() {
        assert_eq!(meditation_by_id("quick-calm").map(|m| m.duration), Some(60));
        assert!(meditation_by_id("nope").is_none());
        assert_eq!(default_meditation().id, "mindful-break");
    }

    #[test]
    fn test_closest_to_settings_duration() {
        assert_eq!(closest_to(180).id, "mindful-break");
        assert_eq!(closest_to(0).id, "quick-calm");
        assert_eq!(closest_to(1000).id, "deep-relaxation");
        assert_eq!(closest_to(120).id, "quick-calm");
        assert_eq!(closest_to(250).id, "deep-relaxation");
    }

    #[test]
    fn test_phase_schedule() {
        let pattern = meditation_by_id("mindful-break").unwrap().pattern;
        assert_eq!(pattern.cycle_secs(), 19);
        assert_eq!(pattern.total_secs(), 171);

        let step = pattern.phase_at(0.0).unwrap();
        assert_eq!(step.phase, BreathingPhase::Inhale);
        assert_eq!(step.cycle, 1);
        assert_eq!(step.remaining_secs, 4.0);

        let step = pattern.phase_at(5.0).unwrap();
        assert_eq!(step.phase, BreathingPhase::Hold);
        assert_eq!(step.remaining_secs, 6.0);

        let step = pattern.phase_at(12.0).unwrap();
        assert_eq!(step.phase, BreathingPhase::Exhale);
        assert_eq!(step.remaining_secs, 7.0);

        let step = pattern.phase_at(19.0).unwrap();
        assert_eq!(step.phase, BreathingPhase::Inhale);
        assert_eq!(step.cycle, 2);

        assert_eq!(pattern.phase_at(170.0).unwrap().cycle, 9);
        assert!(pattern.phase_at(171.0).is_none());
        assert!(pattern.phase_at(-1.0).is_none());
        assert!(pattern.phase_at(f64::NAN).is_none());
    }

    #[test]
    fn test_zero_hold_skips_phase() {
        let pattern = BreathingPattern {
            inhale: 2,
            hold: 0,
            exhale: 2,
            cycles: 1,
        };
        assert_eq!(pattern.phase_at(2.0).unwrap().phase, BreathingPhase::Exhale);
    }

    #[test]
    fn test_credited_minutes() {
        assert_eq!(credited_minutes(&MEDITATIONS[0]), 1);
        assert_eq!(credited_minutes(&MEDITATIONS[1]), 3);
        assert_eq!(credited_minutes(&MEDITATIONS[2]), 5);
    }
}
