use crate::personality::{Personality, PersonalityKind, Range, FINAL_PAUSE_MS};
use crate::random::{RandomSource, SharedRandom};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Lower bound of the per-variation random jitter.
pub const JITTER_MIN: f64 = 0.85;
/// Upper bound of the per-variation random jitter.
pub const JITTER_MAX: f64 = 1.20;
/// Fatigue growth per elapsed session minute.
pub const FATIGUE_PER_MINUTE: f64 = 0.01;
/// Items between variations, redrawn after every variation.
pub const VARIATION_INTERVAL: Range = Range::new(5, 10);
/// Items between long breaks, redrawn on every query.
pub const BREAK_INTERVAL: Range = Range::new(15, 25);
/// Long break length in milliseconds.
pub const BREAK_DELAY_MS: Range = Range::new(30_000, 90_000);

const PHOTO_REGENERATION_CHANCE: f64 = 0.3;
const POINTER_REROLL_CHANCE: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoViewing {
    pub count: u64,
    pub delays_ms: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerMovement {
    pub should_move: bool,
    pub duration_ms: u64,
    pub steps: u64,
}

/// Concrete delays and counts derived from a [`Personality`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingBundle {
    pub thinking_delay_ms: u64,
    pub quick_decision_delay_ms: u64,
    pub next_item_delay_ms: u64,
    pub final_pause_ms: u64,
    pub photo_viewing: PhotoViewing,
    pub pointer_movement: PointerMovement,
}

impl TimingBundle {
    /// Draws a bundle from `personality`. Photo count comes first since the
    /// delay list length depends on it.
    pub fn generate(personality: &Personality, rng: &RandomSource) -> Self {
        let photo_viewing = generate_photo_viewing(personality, rng);
        Self {
            thinking_delay_ms: personality.thinking_ms.sample(rng),
            quick_decision_delay_ms: personality.quick_decision_ms.sample(rng),
            next_item_delay_ms: personality.next_item_ms.sample(rng),
            final_pause_ms: FINAL_PAUSE_MS.sample(rng),
            photo_viewing,
            pointer_movement: PointerMovement {
                should_move: rng.boolean(personality.pointer_chance),
                duration_ms: personality.pointer_duration_ms.sample(rng),
                steps: personality.pointer_steps.sample(rng),
            },
        }
    }
}

fn generate_photo_viewing(personality: &Personality, rng: &RandomSource) -> PhotoViewing {
    let count = personality.photo_count.sample(rng);
    let delays_ms = (0..count)
        .map(|_| personality.photo_delay_ms.sample(rng))
        .collect();
    PhotoViewing { count, delays_ms }
}

fn scale(value: u64, factor: f64, floor: u64) -> u64 {
    let scaled = (value as f64 * factor).round();
    if scaled < floor as f64 {
        floor
    } else {
        scaled as u64
    }
}

/// Session-scoped personality plus the timing bundle it produced.
///
/// The bundle drifts over the session: every few completed items it is
/// rescaled from the original draw by random jitter times a fatigue factor
/// that grows with elapsed session time.
///
/// ```
/// use cadence_behavior::{BehaviorProfile, RandomSource};
///
/// let mut profile = BehaviorProfile::new(RandomSource::seeded(11).shared());
/// let personality = profile.personality().clone();
///
/// let photos = profile.photo_viewing();
/// assert_eq!(photos.delays_ms.len() as u64, photos.count);
/// assert!(personality.photo_count.contains(photos.count));
///
/// for _ in 0..20 {
///     profile.on_item_completed();
/// }
/// assert_eq!(profile.items_processed(), 20);
/// assert!(profile.thinking_delay().as_millis() as u64 >= personality.thinking_ms.min);
/// ```
#[derive(Debug, Clone)]
pub struct BehaviorProfile {
    rng: SharedRandom,
    personality: Personality,
    base: TimingBundle,
    timings: TimingBundle,
    items_processed: u64,
    session_start: DateTime<Utc>,
    last_variation_update: u64,
    variation_interval: u64,
    last_combined_factor: Option<f64>,
}

impl BehaviorProfile {
    pub fn new(rng: SharedRandom) -> Self {
        Self::new_at(rng, Utc::now())
    }

    /// Construct with an explicit session start.
    pub fn new_at(rng: SharedRandom, session_start: DateTime<Utc>) -> Self {
        let personality = Personality::select(&rng);
        let base = TimingBundle::generate(&personality, &rng);
        let variation_interval = VARIATION_INTERVAL.sample(&rng);
        Self {
            timings: base.clone(),
            base,
            personality,
            rng,
            items_processed: 0,
            session_start,
            last_variation_update: 0,
            variation_interval,
            last_combined_factor: None,
        }
    }

    /// Re-select the personality and redraw the bundle, keeping the session
    /// counters and fatigue clock.
    pub fn reroll(&mut self) {
        self.personality = Personality::select(&self.rng);
        self.base = TimingBundle::generate(&self.personality, &self.rng);
        self.timings = self.base.clone();
        self.last_combined_factor = None;
    }

    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    pub fn personality_kind(&self) -> PersonalityKind {
        self.personality.kind
    }

    pub fn timings(&self) -> &TimingBundle {
        &self.timings
    }

    /// The bundle as originally drawn, before any variation.
    pub fn base_timings(&self) -> &TimingBundle {
        &self.base
    }

    pub fn thinking_delay(&self) -> Duration {
        Duration::from_millis(self.timings.thinking_delay_ms)
    }

    pub fn quick_decision_delay(&self) -> Duration {
        Duration::from_millis(self.timings.quick_decision_delay_ms)
    }

    pub fn next_item_delay(&self) -> Duration {
        Duration::from_millis(self.timings.next_item_delay_ms)
    }

    pub fn final_pause(&self) -> Duration {
        Duration::from_millis(self.timings.final_pause_ms)
    }

    pub fn photo_viewing(&self) -> &PhotoViewing {
        &self.timings.photo_viewing
    }

    pub fn pointer_movement(&self) -> &PointerMovement {
        &self.timings.pointer_movement
    }

    pub fn items_processed(&self) -> u64 {
        self.items_processed
    }

    pub fn session_start(&self) -> DateTime<Utc> {
        self.session_start
    }

    /// Item count at which the last variation ran (0 if none yet).
    pub fn last_variation_update(&self) -> u64 {
        self.last_variation_update
    }

    /// Combined factor used by the most recent variation.
    pub fn last_combined_factor(&self) -> Option<f64> {
        self.last_combined_factor
    }

    /// `1 + 1%` per elapsed session minute; never below 1.
    pub fn fatigue_factor(&self, now: DateTime<Utc>) -> f64 {
        let elapsed_ms = (now - self.session_start).num_milliseconds().max(0) as f64;
        1.0 + FATIGUE_PER_MINUTE * (elapsed_ms / 60_000.0)
    }

    /// Record one completed unit of work.
    pub fn on_item_completed(&mut self) {
        self.on_item_completed_at(Utc::now());
    }

    pub fn on_item_completed_at(&mut self, now: DateTime<Utc>) {
        self.items_processed += 1;
        if self.items_processed - self.last_variation_update >= self.variation_interval {
            self.apply_variation(now);
        }
    }

    fn apply_variation(&mut self, now: DateTime<Utc>) {
        let jitter = self.rng.uniform_float(JITTER_MIN, JITTER_MAX);
        let fatigue = self.fatigue_factor(now);
        let combined = jitter * fatigue;
        let p = self.personality;

        self.timings.thinking_delay_ms =
            scale(self.base.thinking_delay_ms, combined, p.thinking_ms.min);
        self.timings.quick_decision_delay_ms = scale(
            self.base.quick_decision_delay_ms,
            combined,
            p.quick_decision_ms.min,
        );
        self.timings.next_item_delay_ms =
            scale(self.base.next_item_delay_ms, combined, p.next_item_ms.min);
        self.timings.final_pause_ms =
            scale(self.base.final_pause_ms, combined, FINAL_PAUSE_MS.min);
        self.timings.photo_viewing.delays_ms = self
            .base
            .photo_viewing
            .delays_ms
            .iter()
            .map(|d| scale(*d, combined, p.photo_delay_ms.min))
            .collect();
        self.timings.pointer_movement.duration_ms = scale(
            self.base.pointer_movement.duration_ms,
            combined,
            p.pointer_duration_ms.min,
        );

        if self.rng.boolean(PHOTO_REGENERATION_CHANCE) {
            let photos = generate_photo_viewing(&p, &self.rng);
            self.base.photo_viewing = photos.clone();
            self.timings.photo_viewing = photos;
        }
        if self.rng.boolean(POINTER_REROLL_CHANCE) {
            let should_move = self.rng.boolean(p.pointer_chance);
            self.base.pointer_movement.should_move = should_move;
            self.timings.pointer_movement.should_move = should_move;
        }

        self.last_variation_update = self.items_processed;
        self.variation_interval = VARIATION_INTERVAL.sample(&self.rng);
        self.last_combined_factor = Some(combined);

        debug!(
            target: "cadence.behavior",
            items = self.items_processed,
            jitter,
            fatigue,
            combined,
            next_in = self.variation_interval,
            "behavior variation applied"
        );
    }

    /// Whether the caller should take a long break now. Draws a fresh
    /// interval on every call and leaves the profile untouched.
    pub fn should_take_break(&self) -> bool {
        if self.items_processed == 0 {
            return false;
        }
        let interval = BREAK_INTERVAL.sample(&self.rng);
        self.items_processed % interval == 0
    }

    pub fn break_delay(&self) -> Duration {
        Duration::from_millis(BREAK_DELAY_MS.sample(&self.rng))
    }

    pub fn log_summary(&self) {
        let t = &self.timings;
        info!(
            target: "cadence.behavior",
            personality = %self.personality.kind,
            thinking_ms = t.thinking_delay_ms,
            quick_decision_ms = t.quick_decision_delay_ms,
            next_item_ms = t.next_item_delay_ms,
            final_pause_ms = t.final_pause_ms,
            photos = t.photo_viewing.count,
            photo_delays_ms = ?t.photo_viewing.delays_ms,
            pointer = t.pointer_movement.should_move,
            pointer_duration_ms = t.pointer_movement.duration_ms,
            pointer_steps = t.pointer_movement.steps,
            "behavior profile"
        );
    }
}
