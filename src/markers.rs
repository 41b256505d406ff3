//! Pins and blasts left on the globe surface.

use std::collections::VecDeque;
use std::f64::consts::{PI, TAU};

use rand::Rng;

use crate::config::PinLabel;
use crate::constants::*;
use crate::projection::LatLon;

/// A persistent marker on the globe.
#[derive(Clone, Debug, PartialEq)]
pub struct Pin {
    pub id: u64,
    pub at: LatLon,
    pub created_at: f64,
    pub label: Option<PinLabel>,
}

impl Pin {
    /// Pop-in scale at `now`; overshoots while landing, then settles.
    pub fn pop_scale(&self, now: f64) -> f64 {
        let age = ((now - self.created_at) / PIN_POP_DURATION).clamp(0.0, 1.0);
        0.85 + 0.2 * (age * PI).sin()
    }

    /// On-screen size of the pin image at depth `z`.
    pub fn base_size(z: f64) -> f64 {
        PIN_BASE_SIZE * (0.65 + z * 0.35)
    }
}

/// Extra bounce applied while the pointer rests on a pin's label.
pub fn hover_scale(hover_started: f64, now: f64) -> f64 {
    let age = ((now - hover_started) / PIN_HOVER_DURATION).clamp(0.0, 1.0);
    1.08 + 0.08 * (age * PI).sin()
}

/// Insertion-ordered pins, oldest evicted first once over capacity.
#[derive(Clone, Debug)]
pub struct PinBoard {
    pins: VecDeque<Pin>,
    capacity: usize,
    next_id: u64,
}

impl PinBoard {
    pub fn new(capacity: usize) -> Self {
        Self {
            pins: VecDeque::with_capacity(capacity + 1),
            capacity,
            next_id: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter()
    }

    pub fn get(&self, id: u64) -> Option<&Pin> {
        self.pins.iter().find(|p| p.id == id)
    }

    /// Add a pin, returning its id and whatever fell off the back.
    ///
    /// With a capacity of zero the new pin is itself among the evicted.
    pub fn push(
        &mut self,
        at: LatLon,
        created_at: f64,
        label: Option<PinLabel>,
    ) -> (u64, Vec<Pin>) {
        let id = self.next_id;
        self.next_id += 1;
        self.pins.push_back(Pin {
            id,
            at,
            created_at,
            label,
        });
        (id, self.trim())
    }

    /// Change the bound, evicting the oldest pins that no longer fit.
    pub fn set_capacity(&mut self, capacity: usize) -> Vec<Pin> {
        self.capacity = capacity;
        self.trim()
    }

    fn trim(&mut self) -> Vec<Pin> {
        let excess = self.pins.len().saturating_sub(self.capacity);
        self.pins.drain(..excess).collect()
    }
}

/// Round-robin supply of pin labels.
#[derive(Clone, Debug, Default)]
pub struct LabelCycle {
    labels: Vec<PinLabel>,
    next: usize,
}

impl LabelCycle {
    pub fn new(labels: Vec<PinLabel>) -> Self {
        Self { labels, next: 0 }
    }

    pub fn next_label(&mut self) -> Option<PinLabel> {
        if self.labels.is_empty() {
            return None;
        }
        let label = self.labels[self.next].clone();
        self.next = (self.next + 1) % self.labels.len();
        Some(label)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlastParticle {
    pub angle: f64,
    pub speed: f64,
    pub radius: f64,
}

impl BlastParticle {
    /// Screen offset from the blast center at progress `t`.
    pub fn offset(&self, t: f64) -> (f64, f64) {
        let reach = self.speed * t;
        (self.angle.cos() * reach, -self.angle.sin() * reach)
    }

    pub fn radius_at(&self, t: f64) -> f64 {
        self.radius * (1.0 - t)
    }
}

/// A short radial burst where a drop hit.
#[derive(Clone, Debug, PartialEq)]
pub struct Blast {
    pub at: LatLon,
    pub created_at: f64,
    pub particles: Vec<BlastParticle>,
}

impl Blast {
    pub fn is_active(&self, now: f64, duration: f64) -> bool {
        let elapsed = now - self.created_at;
        elapsed >= 0.0 && elapsed < duration
    }

    /// Elapsed fraction of the blast lifetime.
    pub fn progress(&self, now: f64, duration: f64) -> f64 {
        ((now - self.created_at) / duration).clamp(0.0, 1.0)
    }

    pub fn ring_radius(t: f64) -> f64 {
        BLAST_RING_START + t * BLAST_RING_GROWTH
    }

    pub fn opacity(t: f64) -> f64 {
        1.0 - t
    }
}

/// Live blasts, swept once they outlive `duration`.
#[derive(Clone, Debug)]
pub struct BlastField {
    blasts: Vec<Blast>,
    duration: f64,
    particle_count: usize,
}

impl BlastField {
    pub fn new(duration: f64, particle_count: usize) -> Self {
        Self {
            blasts: Vec::new(),
            duration,
            particle_count,
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn len(&self) -> usize {
        self.blasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blasts.is_empty()
    }

    pub fn spawn<R: Rng>(&mut self, at: LatLon, now: f64, rng: &mut R) {
        let particles = (0..self.particle_count)
            .map(|_| BlastParticle {
                angle: rng.gen::<f64>() * TAU,
                speed: BLAST_MIN_SPEED + rng.gen::<f64>() * BLAST_SPEED_RANGE,
                radius: BLAST_MIN_RADIUS + rng.gen::<f64>() * BLAST_RADIUS_RANGE,
            })
            .collect();
        self.blasts.push(Blast {
            at,
            created_at: now,
            particles,
        });
    }

    /// Blasts that should be drawn at `now`.
    pub fn active(&self, now: f64) -> impl Iterator<Item = &Blast> {
        let duration = self.duration;
        self.blasts.iter().filter(move |b| b.is_active(now, duration))
    }

    /// Drop every blast whose lifetime has ended.
    pub fn sweep(&mut self, now: f64) {
        let duration = self.duration;
        self.blasts.retain(|b| now - b.created_at < duration);
    }
}

/// Clickable label rectangle captured during a draw pass, centered on `(x, y)`.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelHitbox {
    pub pin_id: u64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub url: String,
}

impl LabelHitbox {
    pub fn contains(&self, px: f64, py: f64) -> bool {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        px >= self.x - half_w && px <= self.x + half_w && py >= self.y - half_h && py <= self.y + half_h
    }
}

/// Topmost hitbox under the point; later boxes were drawn on top.
pub fn hit_test(boxes: &[LabelHitbox], x: f64, y: f64) -> Option<&LabelHitbox> {
    boxes.iter().rev().find(|b| b.contains(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn at(lat: f64) -> LatLon {
        LatLon { lat, lon: 0.0 }
    }

    #[test]
    fn test_board_evicts_oldest_first() {
        let n = 3;
        let mut board = PinBoard::new(n);
        for i in 0..n {
            assert!(board.push(at(i as f64), i as f64, None).1.is_empty());
        }

        let (_, evicted) = board.push(at(n as f64), n as f64, None);
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].at.lat, 0.0);

        let kept: Vec<f64> = board.iter().map(|p| p.at.lat).collect();
        assert_eq!(kept, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_board_shrinks_on_capacity_change() {
        let mut board = PinBoard::new(14);
        for i in 0..6 {
            board.push(at(i as f64), 0.0, None);
        }
        let evicted = board.set_capacity(4);
        assert_eq!(evicted.len(), 2);
        assert_eq!(board.len(), 4);
        assert_eq!(board.iter().next().map(|p| p.at.lat), Some(2.0));

        assert!(board.set_capacity(10).is_empty());
        assert_eq!(board.len(), 4);
    }

    #[test]
    fn test_pin_ids_are_unique() {
        let mut board = PinBoard::new(2);
        board.push(at(0.0), 0.0, None);
        board.push(at(0.0), 0.0, None);
        board.push(at(0.0), 0.0, None);
        let ids: Vec<u64> = board.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(board.get(1).is_none());
        assert!(board.get(3).is_some());
    }

    #[test]
    fn test_zero_capacity_board_reports_the_new_id() {
        let mut board = PinBoard::new(0);
        let (first, evicted) = board.push(at(0.0), 0.0, None);
        assert_eq!(evicted.iter().map(|p| p.id).collect::<Vec<_>>(), vec![first]);

        let (second, evicted) = board.push(at(0.0), 0.0, None);
        assert_ne!(second, first);
        assert_eq!(evicted[0].id, second);
        assert!(board.is_empty());
    }

    #[test]
    fn test_label_cycle_wraps() {
        let mut cycle = LabelCycle::new(vec![
            PinLabel::new("Kiln", Some("https://kilnsoho.com/")),
            PinLabel::new("Luso", None),
        ]);
        assert_eq!(cycle.next_label().map(|l| l.name), Some("Kiln".into()));
        assert_eq!(cycle.next_label().map(|l| l.name), Some("Luso".into()));
        assert_eq!(cycle.next_label().map(|l| l.name), Some("Kiln".into()));

        assert!(LabelCycle::default().next_label().is_none());
    }

    #[test]
    fn test_blast_window_is_half_open() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut field = BlastField::new(700.0, 8);
        field.spawn(at(0.0), 1000.0, &mut rng);

        assert_eq!(field.active(1000.0).count(), 1);
        assert_eq!(field.active(1699.9).count(), 1);
        assert_eq!(field.active(1700.0).count(), 0);
        assert_eq!(field.active(999.0).count(), 0);

        field.sweep(1699.9);
        assert_eq!(field.len(), 1);
        field.sweep(1700.0);
        assert!(field.is_empty());
    }

    #[test]
    fn test_blast_particles() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut field = BlastField::new(700.0, 8);
        field.spawn(at(0.0), 0.0, &mut rng);
        let blast = field.active(0.0).next().cloned();
        let blast = blast.expect("blast just spawned");

        assert_eq!(blast.particles.len(), 8);
        for p in &blast.particles {
            assert!(p.speed >= 40.0 && p.speed <= 100.0);
            assert!(p.radius >= 2.0 && p.radius <= 5.0);
            assert_eq!(p.offset(0.0), (0.0, -0.0));
            assert_eq!(p.radius_at(1.0), 0.0);
        }
    }

    #[test]
    fn test_particle_moves_up_screen_for_positive_angle() {
        let p = BlastParticle {
            angle: PI / 2.0,
            speed: 50.0,
            radius: 4.0,
        };
        let (dx, dy) = p.offset(0.5);
        assert!(dx.abs() < 1e-9);
        assert!((dy + 25.0).abs() < 1e-9);
        assert!((p.radius_at(0.5) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_ring_and_fade() {
        assert_eq!(Blast::ring_radius(0.0), 8.0);
        assert_eq!(Blast::ring_radius(1.0), 36.0);
        assert_eq!(Blast::opacity(0.25), 0.75);
    }

    #[test]
    fn test_pop_scale_settles() {
        let pin = Pin {
            id: 1,
            at: at(0.0),
            created_at: 100.0,
            label: None,
        };
        assert!((pin.pop_scale(100.0) - 0.85).abs() < 1e-12);
        assert!((pin.pop_scale(240.0) - 1.05).abs() < 1e-12);
        assert!((pin.pop_scale(10_000.0) - 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_hover_scale_peaks_midway() {
        assert!((hover_scale(0.0, 0.0) - 1.08).abs() < 1e-12);
        assert!((hover_scale(0.0, 125.0) - 1.16).abs() < 1e-12);
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let boxes = vec![
            LabelHitbox {
                pin_id: 1,
                x: 100.0,
                y: 100.0,
                width: 60.0,
                height: 24.0,
                url: "https://a.example/".into(),
            },
            LabelHitbox {
                pin_id: 2,
                x: 120.0,
                y: 100.0,
                width: 60.0,
                height: 24.0,
                url: "https://b.example/".into(),
            },
        ];
        assert_eq!(hit_test(&boxes, 110.0, 100.0).map(|b| b.pin_id), Some(2));
        assert_eq!(hit_test(&boxes, 75.0, 95.0).map(|b| b.pin_id), Some(1));
        assert!(hit_test(&boxes, 100.0, 120.0).is_none());
    }
}
