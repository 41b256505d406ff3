//! Frame-by-frame simulation state.
//!
//! `Simulation` owns everything that changes between frames: the globe
//! rotation, drops in flight, pins and blasts. One call to [`Simulation::advance`]
//! runs a whole frame in order: rotation, blast sweep, spawn, integrate,
//! impact resolution. Drawing reads the state afterwards and never mutates it.

use std::f64::consts::TAU;

use rand::Rng;

use crate::config::GlobeConfig;
use crate::markers::{BlastField, LabelCycle, Pin, PinBoard};
use crate::physics::{FallingItem, Forces};
use crate::projection::{Globe, LatLon};
use crate::spawner::Spawner;

/// A drop that struck the globe this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Impact {
    pub drop_id: u64,
    /// Screen point where the strike was detected.
    pub x: f64,
    pub y: f64,
    pub pin_id: u64,
    pub at: LatLon,
    /// Pins pushed out to make room for the new one.
    pub evicted: Vec<Pin>,
}

/// What happened during one call to [`Simulation::advance`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    /// Seconds applied to the integrator, after clamping.
    pub dt: f64,
    pub paused: bool,
    pub spawned: Option<u64>,
    pub impacts: Vec<Impact>,
    /// Drops that left the viewport without touching the globe.
    pub missed: usize,
}

#[derive(Clone, Copy, Debug)]
struct DragState {
    last_x: f64,
}

pub struct Simulation<R> {
    config: GlobeConfig,
    forces: Forces,
    spawner: Spawner,
    drops: Vec<FallingItem>,
    pins: PinBoard,
    blasts: BlastField,
    labels: LabelCycle,
    globe: Globe,
    viewport_width: f64,
    viewport_height: f64,
    phi: f64,
    drag: Option<DragState>,
    visible: bool,
    auto_spawn: bool,
    last_time: Option<f64>,
    rng: R,
}

impl<R: Rng> Simulation<R> {
    pub fn new(config: GlobeConfig, rng: R) -> Self {
        Self {
            forces: Forces::from_config(&config),
            spawner: Spawner::new(&config),
            drops: Vec::with_capacity(config.max_drops as usize),
            pins: PinBoard::new(config.max_pins as usize),
            blasts: BlastField::new(config.blast_duration, config.blast_particles as usize),
            labels: LabelCycle::new(config.labels.clone()),
            globe: Globe::default(),
            viewport_width: 0.0,
            viewport_height: 0.0,
            phi: 0.0,
            drag: None,
            visible: true,
            auto_spawn: true,
            last_time: None,
            rng,
            config,
        }
    }

    pub fn config(&self) -> &GlobeConfig {
        &self.config
    }

    pub fn drops(&self) -> &[FallingItem] {
        &self.drops
    }

    pub fn pins(&self) -> &PinBoard {
        &self.pins
    }

    pub fn blasts(&self) -> &BlastField {
        &self.blasts
    }

    pub fn globe(&self) -> Globe {
        self.globe
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    pub fn viewport(&self) -> (f64, f64) {
        (self.viewport_width, self.viewport_height)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Fit the globe to a new viewport and re-evaluate the pin bound.
    pub fn resize(&mut self, width: f64, height: f64) -> Vec<Pin> {
        self.viewport_width = width;
        self.viewport_height = height;
        self.globe = Globe::for_viewport(self.config.layout, width, height);
        self.pins.set_capacity(self.config.pin_capacity(width))
    }

    /// Override the layout-derived globe placement.
    pub fn place_globe(&mut self, globe: Globe) {
        self.globe = globe;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Turn the periodic spawner on or off; scripted drops still work.
    pub fn set_auto_spawn(&mut self, enabled: bool) {
        self.auto_spawn = enabled;
    }

    pub fn set_rotation_speed(&mut self, speed: f64) {
        self.config.rotation_speed = speed;
    }

    pub fn set_forces(&mut self, forces: Forces) {
        self.forces = forces;
    }

    pub fn forces(&self) -> Forces {
        self.forces
    }

    /// Put a drop in flight outside the spawner's schedule.
    pub fn release(&mut self, mut drop: FallingItem) -> u64 {
        drop.id = self.spawner.allocate_id();
        let id = drop.id;
        self.drops.push(drop);
        id
    }

    pub fn begin_drag(&mut self, x: f64) {
        self.drag = Some(DragState { last_x: x });
    }

    /// Spin the globe by the pointer's horizontal travel since the last event.
    pub fn drag_to(&mut self, x: f64) {
        if let Some(state) = self.drag.as_mut() {
            let delta = x - state.last_x;
            state.last_x = x;
            self.phi = (self.phi + delta * self.config.drag_sensitivity).rem_euclid(TAU);
        }
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Run one frame at wall-clock time `now` (milliseconds).
    pub fn advance(&mut self, now: f64) -> Frame {
        let last = self.last_time.replace(now).unwrap_or(now);
        if !self.visible {
            return Frame {
                paused: true,
                ..Frame::default()
            };
        }

        let dt = self.forces.clamp_dt(last, now);
        if self.drag.is_none() {
            self.phi = (self.phi + self.config.rotation_speed * dt).rem_euclid(TAU);
        }

        self.blasts.sweep(now);

        let spawned = if self.auto_spawn {
            self.spawner
                .maybe_spawn(&mut self.drops, now, self.viewport_width, &mut self.rng)
        } else {
            None
        };

        self.forces.integrate(&mut self.drops, now, dt);

        let globe = self.globe;
        let floor = self.viewport_height + globe.radius;
        let mut struck = Vec::new();
        let before = self.drops.len();
        self.drops.retain(|drop| {
            if globe.is_impact(drop.x, drop.y, drop.radius) {
                struck.push(drop.clone());
                return false;
            }
            drop.y - drop.radius <= floor
        });
        let missed = before - self.drops.len() - struck.len();

        let impacts = struck.into_iter().map(|drop| self.land(&drop, now)).collect();

        Frame {
            dt,
            paused: false,
            spawned,
            impacts,
            missed,
        }
    }

    fn land(&mut self, drop: &FallingItem, now: f64) -> Impact {
        let at = self.globe.unproject(drop.x, drop.y, self.phi);
        let label = self.labels.next_label();
        let (pin_id, evicted) = self.pins.push(at, now, label);
        self.blasts.spawn(at, now, &mut self.rng);

        Impact {
            drop_id: drop.id,
            x: drop.x,
            y: drop.y,
            pin_id,
            at,
            evicted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PinLabel;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn still_config() -> GlobeConfig {
        GlobeConfig {
            max_drops: 0,
            gravity: 720.0,
            drag: 0.0,
            wind_strength: 0.0,
            gust_strength: 0.0,
            rotation_speed: 0.0,
            ..GlobeConfig::default()
        }
    }

    fn sim(config: GlobeConfig) -> Simulation<SmallRng> {
        let mut sim = Simulation::new(config, SmallRng::seed_from_u64(5));
        sim.resize(1000.0, 800.0);
        sim
    }

    #[test]
    fn test_free_fall_lands_near_the_top() {
        let mut sim = sim(still_config());
        sim.place_globe(Globe::new(500.0, 800.0, 300.0));
        sim.release(FallingItem::at_rest(0, 0, 500.0, -50.0, 30.0));
        sim.advance(0.0);

        let mut landed = None;
        for step in 1..=200 {
            let frame = sim.advance(step as f64 * FRAME_MS);
            if let Some(impact) = frame.impacts.into_iter().next() {
                landed = Some((step, impact));
                break;
            }
        }
        let (step, impact) = landed.expect("drop never reached the globe");

        // y = -50 + 0.1 * n * (n + 1) crosses 800 - (300 - 0.4 * 15) at n = 75.
        assert!((70..=80).contains(&step), "landed after {step} steps");
        assert!(impact.y > 500.0 && impact.y < 530.0);
        assert!(impact.at.lon.abs() < 1e-9);
        let expected_lat = ((800.0 - impact.y) / 300.0).asin();
        assert!((impact.at.lat - expected_lat).abs() < 1e-9);
        assert!(impact.at.lat > 1.1);

        assert!(sim.drops().is_empty());
        assert_eq!(sim.pins().len(), 1);
        assert_eq!(sim.blasts().len(), 1);
    }

    #[test]
    fn test_miss_leaves_no_pin() {
        let mut sim = sim(still_config());
        sim.place_globe(Globe::new(500.0, 800.0, 100.0));
        sim.release(FallingItem::at_rest(0, 0, 50.0, 850.0, 20.0));
        sim.advance(0.0);

        let mut missed = 0;
        for step in 1..=120 {
            missed += sim.advance(step as f64 * FRAME_MS).missed;
        }
        assert_eq!(missed, 1);
        assert!(sim.drops().is_empty());
        assert!(sim.pins().is_empty());
        assert!(sim.blasts().is_empty());
    }

    #[test]
    fn test_long_pause_is_clamped() {
        let mut sim = sim(still_config());
        sim.release(FallingItem::at_rest(0, 0, 10.0, -100.0, 20.0));
        sim.advance(0.0);
        let frame = sim.advance(5000.0);
        assert!((frame.dt - 0.04).abs() < 1e-12);
        assert!((sim.drops()[0].y - (-100.0 + 720.0 * 0.04 * 0.04)).abs() < 1e-9);
    }

    #[test]
    fn test_negative_max_dt_holds_items_still() {
        for max_dt in [-0.01, f64::NAN] {
            let mut sim = sim(GlobeConfig {
                max_dt,
                ..still_config()
            });
            sim.release(FallingItem::at_rest(0, 0, 10.0, -100.0, 20.0));
            sim.advance(0.0);
            let frame = sim.advance(16.0);
            assert_eq!(frame.dt, 0.0);
            assert_eq!(sim.drops()[0].y, -100.0);
        }
    }

    #[test]
    fn test_impact_reports_pin_id_even_when_evicted() {
        let mut sim = sim(GlobeConfig {
            max_pins: 0,
            ..still_config()
        });
        sim.place_globe(Globe::new(500.0, 800.0, 300.0));
        sim.release(FallingItem::at_rest(0, 0, 500.0, 520.0, 20.0));
        sim.advance(0.0);

        let frame = sim.advance(FRAME_MS);
        assert_eq!(frame.impacts.len(), 1);
        let impact = &frame.impacts[0];
        assert_eq!(impact.evicted.len(), 1);
        assert_eq!(impact.evicted[0].id, impact.pin_id);
        assert!(sim.pins().is_empty());
    }

    #[test]
    fn test_hidden_frames_do_not_advance() {
        let mut sim = sim(GlobeConfig {
            rotation_speed: 1.0,
            ..still_config()
        });
        sim.release(FallingItem::at_rest(0, 0, 10.0, -100.0, 20.0));
        sim.advance(0.0);

        sim.set_visible(false);
        for step in 1..10 {
            assert!(sim.advance(step as f64 * FRAME_MS).paused);
        }
        assert_eq!(sim.drops()[0].y, -100.0);
        assert_eq!(sim.phi(), 0.0);

        sim.set_visible(true);
        let frame = sim.advance(60_000.0);
        assert!(frame.dt <= 0.04);
        assert!((sim.phi() - frame.dt).abs() < 1e-12);
    }

    #[test]
    fn test_drag_overrides_auto_rotation() {
        let mut sim = sim(GlobeConfig {
            rotation_speed: 1.0,
            drag_sensitivity: 0.01,
            ..still_config()
        });
        sim.advance(0.0);
        sim.advance(FRAME_MS);
        let spun = sim.phi();
        assert!(spun > 0.0);

        sim.begin_drag(100.0);
        sim.drag_to(130.0);
        assert!((sim.phi() - (spun + 0.3)).abs() < 1e-12);
        sim.advance(2.0 * FRAME_MS);
        assert!((sim.phi() - (spun + 0.3)).abs() < 1e-12);

        sim.end_drag();
        sim.advance(3.0 * FRAME_MS);
        assert!(sim.phi() > spun + 0.3);
    }

    #[test]
    fn test_rotation_wraps() {
        let mut sim = sim(GlobeConfig {
            drag_sensitivity: 1.0,
            ..still_config()
        });
        sim.begin_drag(0.0);
        sim.drag_to(-1.0);
        assert!((sim.phi() - (TAU - 1.0)).abs() < 1e-12);
        sim.drag_to(10.0);
        assert!(sim.phi() >= 0.0 && sim.phi() < TAU);
    }

    #[test]
    fn test_pins_keep_their_surface_point_while_spinning() {
        let mut sim = sim(GlobeConfig {
            rotation_speed: 0.5,
            ..still_config()
        });
        sim.place_globe(Globe::new(500.0, 800.0, 300.0));
        sim.release(FallingItem::at_rest(0, 0, 560.0, 505.0, 20.0));
        sim.advance(0.0);

        let mut step = 0;
        let impact = loop {
            step += 1;
            assert!(step < 60, "drop should have struck");
            let frame = sim.advance(step as f64 * FRAME_MS);
            if let Some(impact) = frame.impacts.into_iter().next() {
                break impact;
            }
        };

        let pin = sim.pins().get(impact.pin_id).cloned().expect("pin stored");
        let landed = sim.globe().project(pin.at, sim.phi());
        assert!((landed.x - impact.x).abs() < 1e-6);
        assert!((landed.y - impact.y).abs() < 1e-6);

        for later in step + 1..step + 30 {
            sim.advance(later as f64 * FRAME_MS);
        }
        let after = sim.globe().project(pin.at, sim.phi());
        assert!(after.x > landed.x, "pin should glide with the spin");
        assert!((after.y - landed.y).abs() < 1e-9);
    }

    #[test]
    fn test_labels_rotate_across_pins() {
        let mut sim = sim(GlobeConfig {
            labels: vec![
                PinLabel::new("Gymkhana", Some("https://gymkhanarestaurants.com/")),
                PinLabel::new("Kiln", None),
            ],
            ..still_config()
        });
        sim.place_globe(Globe::new(500.0, 800.0, 300.0));
        sim.advance(0.0);
        for x in [450.0, 500.0, 550.0] {
            sim.release(FallingItem::at_rest(0, 0, x, 520.0, 20.0));
        }
        sim.advance(FRAME_MS);

        let names: Vec<String> = sim
            .pins()
            .iter()
            .filter_map(|p| p.label.as_ref().map(|l| l.name.clone()))
            .collect();
        assert_eq!(names, vec!["Gymkhana", "Kiln", "Gymkhana"]);
    }

    #[test]
    fn test_resize_trims_pins_for_compact_viewports() {
        let mut sim = sim(still_config());
        sim.place_globe(Globe::new(500.0, 800.0, 300.0));
        sim.advance(0.0);
        for i in 0..6 {
            sim.release(FallingItem::at_rest(0, 0, 420.0 + i as f64 * 30.0, 520.0, 20.0));
        }
        sim.advance(FRAME_MS);
        assert_eq!(sim.pins().len(), 6);

        let evicted = sim.resize(500.0, 800.0);
        assert_eq!(evicted.len(), 2);
        assert_eq!(sim.pins().len(), 4);
    }

    #[test]
    fn test_spawner_feeds_the_frame_loop() {
        let mut sim = sim(GlobeConfig {
            max_drops: 3,
            ..GlobeConfig::default()
        });
        let mut spawned = 0;
        for step in 0..600 {
            if sim.advance(1.0 + step as f64 * FRAME_MS).spawned.is_some() {
                spawned += 1;
            }
            assert!(sim.drops().len() <= 3);
        }
        assert!(spawned >= 3);
    }

    #[test]
    fn test_blasts_expire_during_advance() {
        let mut sim = sim(still_config());
        sim.place_globe(Globe::new(500.0, 800.0, 300.0));
        sim.advance(0.0);
        sim.release(FallingItem::at_rest(0, 0, 500.0, 520.0, 20.0));
        assert_eq!(sim.advance(20.0).impacts.len(), 1);
        assert_eq!(sim.blasts().len(), 1);

        sim.advance(719.0);
        assert_eq!(sim.blasts().len(), 1);
        sim.advance(720.0);
        assert!(sim.blasts().is_empty());
        assert_eq!(sim.pins().len(), 1);
    }
}
