use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub min: u64,
    pub max: u64,
}

impl Range {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Uniform draw from the range.
    pub fn sample(&self, rng: &RandomSource) -> u64 {
        rng.uniform_int(self.min, self.max)
    }
}

/// Final pause shared by every personality.
pub const FINAL_PAUSE_MS: Range = Range::new(333, 666);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonalityKind {
    Impatient,
    Normal,
    Careful,
}

impl PersonalityKind {
    /// Selection weights in declaration order. They sum to 1.
    pub const WEIGHTS: [(PersonalityKind, f64); 3] = [
        (PersonalityKind::Impatient, 0.1),
        (PersonalityKind::Careful, 0.2),
        (PersonalityKind::Normal, 0.7),
    ];

    /// Weighted draw; total over every input.
    pub fn select(rng: &RandomSource) -> Self {
        rng.weighted_choice(&Self::WEIGHTS)
            .copied()
            .unwrap_or(PersonalityKind::Normal)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonalityKind::Impatient => "impatient",
            PersonalityKind::Normal => "normal",
            PersonalityKind::Careful => "careful",
        }
    }

    pub fn personality(&self) -> Personality {
        match self {
            PersonalityKind::Impatient => Personality {
                kind: *self,
                thinking_ms: Range::new(500, 1500),
                quick_decision_ms: Range::new(200, 400),
                next_item_ms: Range::new(2000, 4000),
                photo_count: Range::new(0, 1),
                photo_delay_ms: Range::new(300, 800),
                pointer_chance: 0.2,
                pointer_duration_ms: Range::new(1300, 1600),
                pointer_steps: Range::new(8, 12),
            },
            PersonalityKind::Normal => Personality {
                kind: *self,
                thinking_ms: Range::new(1000, 3000),
                quick_decision_ms: Range::new(300, 800),
                next_item_ms: Range::new(3000, 8000),
                photo_count: Range::new(1, 3),
                photo_delay_ms: Range::new(500, 3000),
                pointer_chance: 0.4,
                pointer_duration_ms: Range::new(1300, 2100),
                pointer_steps: Range::new(10, 24),
            },
            PersonalityKind::Careful => Personality {
                kind: *self,
                thinking_ms: Range::new(2000, 5000),
                quick_decision_ms: Range::new(500, 1200),
                next_item_ms: Range::new(4000, 10000),
                photo_count: Range::new(2, 4),
                photo_delay_ms: Range::new(800, 4000),
                pointer_chance: 0.6,
                pointer_duration_ms: Range::new(1600, 2100),
                pointer_steps: Range::new(15, 24),
            },
        }
    }
}

impl fmt::Display for PersonalityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed numeric ranges that shape every timing a profile derives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub kind: PersonalityKind,
    pub thinking_ms: Range,
    pub quick_decision_ms: Range,
    pub next_item_ms: Range,
    pub photo_count: Range,
    pub photo_delay_ms: Range,
    pub pointer_chance: f64,
    pub pointer_duration_ms: Range,
    pub pointer_steps: Range,
}

impl Personality {
    pub fn select(rng: &RandomSource) -> Self {
        PersonalityKind::select(rng).personality()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        let total: f64 = PersonalityKind::WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn selection_matches_cumulative_weights() {
        let rng = RandomSource::scripted([0.05, 0.25, 0.9, 0.0, 0.999]);
        assert_eq!(PersonalityKind::select(&rng), PersonalityKind::Impatient);
        assert_eq!(PersonalityKind::select(&rng), PersonalityKind::Careful);
        assert_eq!(PersonalityKind::select(&rng), PersonalityKind::Normal);
        assert_eq!(PersonalityKind::select(&rng), PersonalityKind::Impatient);
        assert_eq!(PersonalityKind::select(&rng), PersonalityKind::Normal);
    }

    #[test]
    fn ranges_are_well_formed() {
        for (kind, _) in PersonalityKind::WEIGHTS {
            let p = kind.personality();
            for r in [
                p.thinking_ms,
                p.quick_decision_ms,
                p.next_item_ms,
                p.photo_count,
                p.photo_delay_ms,
                p.pointer_duration_ms,
                p.pointer_steps,
            ] {
                assert!(r.min <= r.max, "{kind}: {r:?}");
            }
            assert!((0.0..=1.0).contains(&p.pointer_chance));
            assert_eq!(p.kind, kind);
        }
    }

    #[test]
    fn seeded_selection_roughly_tracks_weights() {
        let rng = RandomSource::seeded(2024);
        let mut counts = [0usize; 3];
        for _ in 0..10_000 {
            match PersonalityKind::select(&rng) {
                PersonalityKind::Impatient => counts[0] += 1,
                PersonalityKind::Careful => counts[1] += 1,
                PersonalityKind::Normal => counts[2] += 1,
            }
        }
        assert!((700..1300).contains(&counts[0]), "{counts:?}");
        assert!((1600..2400).contains(&counts[1]), "{counts:?}");
        assert!((6500..7500).contains(&counts[2]), "{counts:?}");
    }
}
