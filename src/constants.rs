//! Globe animation constants
//!
//! With the `configurable` feature every parameter can be overridden from JS.
//! Without it the values below are hardcoded.

// Falling items
pub const DEFAULT_MAX_DROPS: u32 = 8;
pub const DEFAULT_GRAVITY: f64 = 720.0;
pub const DEFAULT_DRAG: f64 = 0.12;
pub const DEFAULT_WIND_STRENGTH: f64 = 16.0;
pub const DEFAULT_GUST_STRENGTH: f64 = 6.0;
pub const DEFAULT_MAX_DT: f64 = 0.04;

// Wind angular frequencies (per millisecond of wall-clock time)
pub const WIND_FREQUENCY: f64 = 0.0006;
pub const GUST_FREQUENCY: f64 = 0.001;

// Spawning (milliseconds, fractions of the viewport width)
pub const DEFAULT_SPAWN_DELAY: f64 = 700.0;
pub const DEFAULT_SPAWN_JITTER: f64 = 800.0;
pub const DEFAULT_SPAWN_BAND_START: f64 = 0.15;
pub const DEFAULT_SPAWN_BAND_WIDTH: f64 = 0.7;

pub const DROP_MIN_SIZE: f64 = 28.0;
pub const DROP_SIZE_RANGE: f64 = 18.0;
pub const DROP_VX_RANGE: f64 = 30.0;
pub const DROP_MIN_VY: f64 = 20.0;
pub const DROP_VY_RANGE: f64 = 40.0;
pub const DROP_SPIN_RANGE: f64 = 2.4;
pub const DROP_MIN_MASS: f64 = 0.8;
pub const DROP_MASS_RANGE: f64 = 0.6;

// Impact: share of the item radius that must cross the globe edge
pub const IMPACT_PENETRATION: f64 = 0.4;

// Globe
pub const DEFAULT_ROTATION_SPEED: f64 = 0.12;
pub const DEFAULT_DRAG_SENSITIVITY: f64 = 1.0 / 1400.0;

// Pins
pub const DEFAULT_MAX_PINS: u32 = 14;
pub const DEFAULT_COMPACT_MAX_PINS: u32 = 4;
pub const DEFAULT_COMPACT_BREAKPOINT: f64 = 768.0;
pub const PIN_POP_DURATION: f64 = 280.0;
pub const PIN_HOVER_DURATION: f64 = 250.0;
pub const PIN_BASE_SIZE: f64 = 64.0;
pub const DEFAULT_PIN_IMAGE: &str = "/Pinit Pin.png";

// Blasts
pub const DEFAULT_BLAST_DURATION: f64 = 700.0;
pub const DEFAULT_BLAST_PARTICLES: u32 = 8;
pub const BLAST_MIN_SPEED: f64 = 40.0;
pub const BLAST_SPEED_RANGE: f64 = 60.0;
pub const BLAST_MIN_RADIUS: f64 = 2.0;
pub const BLAST_RADIUS_RANGE: f64 = 3.0;
pub const BLAST_RING_START: f64 = 8.0;
pub const BLAST_RING_GROWTH: f64 = 28.0;

// Pointer
pub const CLICK_SLOP: f64 = 5.0;
pub const VISIBILITY_THRESHOLD: f64 = 0.15;

// Earth texture
pub const TEXTURE_WIDTH: u32 = 1024;
pub const TEXTURE_HEIGHT: u32 = 512;

// Feature flag
pub const RUNTIME_CONFIGURABLE: bool = cfg!(feature = "configurable");
