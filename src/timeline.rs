//! Staged intro sequence.
//!
//! The intro releases a handful of items at fixed delays, waits until every
//! one of them has landed, then runs a fixed schedule: settle, vibrate,
//! explode, fade to black, done. Everything is a pure function of elapsed
//! time, so the host just asks for the phase each frame and stops asking to
//! cancel.

use wasm_bindgen::prelude::*;

/// Time from the last landing at which each later phase begins (ms).
pub const VIBRATE_AT: f64 = 1400.0;
pub const EXPLODE_AT: f64 = 2200.0;
pub const FADE_AT: f64 = 2700.0;
pub const COMPLETE_AT: f64 = 4200.0;

const SHAKE_X: [f64; 10] = [0.0, -10.0, 10.0, -8.0, 8.0, -5.0, 5.0, -3.0, 3.0, 0.0];
const SHAKE_Y: [f64; 10] = [0.0, -8.0, 8.0, -6.0, 6.0, -4.0, 4.0, -2.0, 2.0, 0.0];

#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntroPhase {
    Dropping,
    Settling,
    Vibrating,
    Exploding,
    FadingOut,
    Complete,
}

#[wasm_bindgen]
#[derive(Clone, Debug)]
pub struct IntroTimeline {
    release_delays: Vec<f64>,
    started_at: Option<f64>,
    released: usize,
    landed: usize,
    last_landing: Option<f64>,
}

impl Default for IntroTimeline {
    fn default() -> Self {
        Self::with_delays(vec![0.0, 1000.0])
    }
}

impl IntroTimeline {
    /// One item per delay (ms after `start`).
    pub fn with_delays(mut release_delays: Vec<f64>) -> Self {
        release_delays.sort_by(f64::total_cmp);
        Self {
            release_delays,
            started_at: None,
            released: 0,
            landed: 0,
            last_landing: None,
        }
    }

    fn phase_window(&self, now: f64) -> (IntroPhase, f64, f64) {
        let Some(landed_at) = self.last_landing else {
            return (IntroPhase::Dropping, 0.0, 0.0);
        };
        let elapsed = (now - landed_at).max(0.0);
        match elapsed {
            e if e < VIBRATE_AT => (IntroPhase::Settling, e, VIBRATE_AT),
            e if e < EXPLODE_AT => (IntroPhase::Vibrating, e - VIBRATE_AT, EXPLODE_AT - VIBRATE_AT),
            e if e < FADE_AT => (IntroPhase::Exploding, e - EXPLODE_AT, FADE_AT - EXPLODE_AT),
            e if e < COMPLETE_AT => (IntroPhase::FadingOut, e - FADE_AT, COMPLETE_AT - FADE_AT),
            _ => (IntroPhase::Complete, 0.0, 0.0),
        }
    }
}

#[wasm_bindgen]
impl IntroTimeline {
    #[wasm_bindgen(constructor)]
    pub fn new(release_delays: Option<Vec<f64>>) -> Self {
        match release_delays {
            Some(delays) if !delays.is_empty() => Self::with_delays(delays),
            _ => Self::default(),
        }
    }

    pub fn start(&mut self, now: f64) {
        self.started_at = Some(now);
        self.released = 0;
        self.landed = 0;
        self.last_landing = None;
    }

    pub fn item_count(&self) -> usize {
        self.release_delays.len()
    }

    /// Number of items whose release delay passed since the last call.
    pub fn take_due(&mut self, now: f64) -> usize {
        let Some(started) = self.started_at else {
            return 0;
        };
        let due = self
            .release_delays
            .iter()
            .take_while(|delay| now - started >= **delay)
            .count();
        let fresh = due.saturating_sub(self.released);
        self.released = due.max(self.released);
        fresh
    }

    /// Record a landing; the schedule starts once every item is down.
    pub fn mark_landed(&mut self, now: f64) {
        if self.landed >= self.release_delays.len() {
            return;
        }
        self.landed += 1;
        if self.landed == self.release_delays.len() {
            self.last_landing = Some(now);
        }
    }

    pub fn phase(&self, now: f64) -> IntroPhase {
        self.phase_window(now).0
    }

    /// Fraction of the current phase already elapsed, 0 while dropping.
    pub fn progress(&self, now: f64) -> f64 {
        match self.phase_window(now) {
            (IntroPhase::Complete, _, _) => 1.0,
            (_, _, span) if span <= 0.0 => 0.0,
            (_, into, span) => into / span,
        }
    }

    pub fn is_complete(&self, now: f64) -> bool {
        self.phase(now) == IntroPhase::Complete
    }

    /// Pin shake offset in pixels while vibrating, zero otherwise.
    pub fn shake_x(&self, now: f64) -> f64 {
        self.shake(now, &SHAKE_X)
    }

    pub fn shake_y(&self, now: f64) -> f64 {
        self.shake(now, &SHAKE_Y)
    }
}

impl IntroTimeline {
    fn shake(&self, now: f64, keys: &[f64; 10]) -> f64 {
        if self.phase(now) != IntroPhase::Vibrating {
            return 0.0;
        }
        keyframe(keys, self.progress(now))
    }
}

/// Linear interpolation over evenly spaced keyframes.
fn keyframe(keys: &[f64], t: f64) -> f64 {
    let last = keys.len() - 1;
    let pos = t.clamp(0.0, 1.0) * last as f64;
    let i = (pos.floor() as usize).min(last - 1);
    let frac = pos - i as f64;
    keys[i] + (keys[i + 1] - keys[i]) * frac
}
