//! Spawning of falling items.

use std::f64::consts::TAU;

use rand::Rng;

use crate::config::GlobeConfig;
use crate::constants::*;
use crate::physics::FallingItem;

/// Creates drops at a throttled, jittered rate.
#[derive(Clone, Debug)]
pub struct Spawner {
    max_drops: usize,
    delay: f64,
    jitter: f64,
    band_start: f64,
    band_width: f64,
    weights: Vec<f64>,
    next_drop_at: f64,
    next_id: u64,
}

impl Spawner {
    pub fn new(config: &GlobeConfig) -> Self {
        Self {
            max_drops: config.max_drops as usize,
            delay: config.spawn_delay,
            jitter: config.spawn_jitter,
            band_start: config.spawn_band_start,
            band_width: config.spawn_band_width,
            weights: config.drop_kinds.iter().map(|k| k.weight).collect(),
            next_drop_at: 0.0,
            next_id: 1,
        }
    }

    pub fn next_drop_at(&self) -> f64 {
        self.next_drop_at
    }

    /// Push a new drop if there is room and the cooldown has passed.
    ///
    /// Returns the id of the spawned drop.
    pub fn maybe_spawn<R: Rng>(
        &mut self,
        drops: &mut Vec<FallingItem>,
        now: f64,
        viewport_width: f64,
        rng: &mut R,
    ) -> Option<u64> {
        if drops.len() >= self.max_drops || now <= self.next_drop_at {
            return None;
        }

        let drop = self.spawn(viewport_width, rng);
        let id = drop.id;
        drops.push(drop);
        self.next_drop_at = now + self.delay + rng.gen::<f64>() * self.jitter;
        Some(id)
    }

    fn spawn<R: Rng>(&mut self, viewport_width: f64, rng: &mut R) -> FallingItem {
        let size = DROP_MIN_SIZE + rng.gen::<f64>() * DROP_SIZE_RANGE;
        let kind = pick_weighted(&self.weights, rng);
        let id = self.allocate_id();

        FallingItem {
            id,
            kind,
            x: viewport_width * (self.band_start + rng.gen::<f64>() * self.band_width),
            y: -size,
            vx: (rng.gen::<f64>() - 0.5) * DROP_VX_RANGE,
            vy: DROP_MIN_VY + rng.gen::<f64>() * DROP_VY_RANGE,
            radius: size * 0.5,
            size,
            rotation: rng.gen::<f64>() * TAU,
            spin: (rng.gen::<f64>() - 0.5) * DROP_SPIN_RANGE,
            mass: DROP_MIN_MASS + rng.gen::<f64>() * DROP_MASS_RANGE,
            wind_phase: rng.gen::<f64>() * TAU,
        }
    }

    /// Hands out an id for a drop created outside the spawner.
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Index drawn from a discrete distribution proportional to `weights`.
///
/// Falls back to the first entry when rounding leaves the roll unspent.
pub fn pick_weighted<R: Rng>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().sum();
    let roll = rng.gen::<f64>() * total;
    pick_with_roll(weights, roll)
}

fn pick_with_roll(weights: &[f64], mut roll: f64) -> usize {
    for (index, weight) in weights.iter().enumerate() {
        roll -= weight;
        if roll <= 0.0 {
            return index;
        }
    }
    0
}
