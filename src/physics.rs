//! Falling item state and the per-frame integrator.

use crate::config::GlobeConfig;
use crate::constants::{GUST_FREQUENCY, WIND_FREQUENCY};

/// An item in flight toward the globe.
#[derive(Clone, Debug, PartialEq)]
pub struct FallingItem {
    pub id: u64,
    /// Index into the configured drop kinds.
    pub kind: usize,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Collision radius, half of `size`.
    pub radius: f64,
    /// Drawn edge length in CSS pixels.
    pub size: f64,
    pub rotation: f64,
    pub spin: f64,
    pub mass: f64,
    /// Offsets this item's gust sinusoid from its neighbours.
    pub wind_phase: f64,
}

impl FallingItem {
    /// A motionless unit-mass item, mostly for scripted drops.
    pub fn at_rest(id: u64, kind: usize, x: f64, y: f64, size: f64) -> Self {
        Self {
            id,
            kind,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            radius: size * 0.5,
            size,
            rotation: 0.0,
            spin: 0.0,
            mass: 1.0,
            wind_phase: 0.0,
        }
    }
}

/// Forces shared by every item in a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Forces {
    pub gravity: f64,
    pub drag: f64,
    pub wind_strength: f64,
    pub gust_strength: f64,
    pub max_dt: f64,
}

impl Forces {
    pub fn from_config(config: &GlobeConfig) -> Self {
        Self {
            gravity: config.gravity,
            drag: config.drag,
            wind_strength: config.wind_strength,
            gust_strength: config.gust_strength,
            max_dt: config.max_dt,
        }
    }

    /// Seconds elapsed between two frame timestamps (ms), never more than `max_dt`.
    ///
    /// A negative or NaN `max_dt` freezes the step at zero.
    pub fn clamp_dt(&self, last_ms: f64, now_ms: f64) -> f64 {
        ((now_ms - last_ms) / 1000.0)
            .max(0.0)
            .min(self.max_dt.max(0.0))
    }

    /// Global wind at wall-clock time `now_ms`.
    #[inline]
    pub fn wind(&self, now_ms: f64) -> f64 {
        (now_ms * WIND_FREQUENCY).sin() * self.wind_strength
    }

    /// Advance one item by `dt` seconds under `wind`.
    ///
    /// Semi-implicit Euler: velocities first, then positions from the new
    /// velocities.
    pub fn step(&self, drop: &mut FallingItem, wind: f64, now_ms: f64, dt: f64) {
        let damping = (1.0 - self.drag * dt).max(0.0);
        let gust = (now_ms * GUST_FREQUENCY + drop.wind_phase).sin() * self.gust_strength;

        drop.vx += (wind + gust) / drop.mass * dt;
        drop.vx *= damping;
        drop.vy += self.gravity * drop.mass * dt;

        drop.x += drop.vx * dt;
        drop.y += drop.vy * dt;
        drop.rotation += drop.spin * dt;
    }

    /// Advance every item by one frame.
    pub fn integrate(&self, drops: &mut [FallingItem], now_ms: f64, dt: f64) {
        let wind = self.wind(now_ms);
        for drop in drops.iter_mut() {
            self.step(drop, wind, now_ms, dt);
        }
    }
}
