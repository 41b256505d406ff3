//! Globe animation configuration

use crate::constants::*;
use wasm_bindgen::prelude::*;

/// Where the globe sits on the canvas.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlobeLayout {
    /// Oversized globe rising from the bottom edge of the viewport.
    Horizon,
    /// Globe inscribed in the top square of the canvas.
    Contained,
}

impl GlobeLayout {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "horizon" => Some(Self::Horizon),
            "contained" => Some(Self::Contained),
            _ => None,
        }
    }
}

/// A category of falling item.
#[derive(Clone, Debug, PartialEq)]
pub struct DropKind {
    pub name: String,
    /// Glyph drawn when no image is configured or it has not loaded yet.
    pub emoji: String,
    pub image: Option<String>,
    /// Relative weight; the set does not need to sum to 1.
    pub weight: f64,
}

impl DropKind {
    pub fn new(name: &str, emoji: &str, weight: f64) -> Self {
        Self {
            name: name.into(),
            emoji: emoji.into(),
            image: None,
            weight,
        }
    }

    pub fn with_image(mut self, src: &str) -> Self {
        self.image = Some(src.into());
        self
    }

    pub fn default_set() -> Vec<Self> {
        vec![
            Self::new("burger", "\u{1F354}", 0.4),
            Self::new("disco", "\u{1FAA9}", 0.2),
            Self::new("pint", "\u{1F37A}", 0.25),
            Self::new("tiktok", "\u{1F3B5}", 0.15).with_image("/tiktok-logo.png"),
        ]
    }
}

/// Text shown above a pin, optionally linking out.
#[derive(Clone, Debug, PartialEq)]
pub struct PinLabel {
    pub name: String,
    pub url: Option<String>,
}

impl PinLabel {
    pub fn new(name: &str, url: Option<&str>) -> Self {
        Self {
            name: name.into(),
            url: url.map(Into::into),
        }
    }
}

#[wasm_bindgen]
#[derive(Clone, Debug)]
pub struct GlobeConfig {
    pub max_drops: u32,
    pub gravity: f64,
    pub drag: f64,
    pub wind_strength: f64,
    pub gust_strength: f64,
    pub max_dt: f64,
    pub rotation_speed: f64,
    pub drag_sensitivity: f64,

    pub spawn_delay: f64,
    pub spawn_jitter: f64,
    pub spawn_band_start: f64,
    pub spawn_band_width: f64,

    pub max_pins: u32,
    pub compact_max_pins: u32,
    pub compact_breakpoint: f64,

    pub blast_duration: f64,
    pub blast_particles: u32,

    pub layout: GlobeLayout,
    pub draw_globe: bool,

    #[wasm_bindgen(getter_with_clone)]
    pub pin_image: String,

    #[wasm_bindgen(skip)]
    pub drop_kinds: Vec<DropKind>,

    #[wasm_bindgen(skip)]
    pub labels: Vec<PinLabel>,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            max_drops: DEFAULT_MAX_DROPS,
            gravity: DEFAULT_GRAVITY,
            drag: DEFAULT_DRAG,
            wind_strength: DEFAULT_WIND_STRENGTH,
            gust_strength: DEFAULT_GUST_STRENGTH,
            max_dt: DEFAULT_MAX_DT,
            rotation_speed: DEFAULT_ROTATION_SPEED,
            drag_sensitivity: DEFAULT_DRAG_SENSITIVITY,
            spawn_delay: DEFAULT_SPAWN_DELAY,
            spawn_jitter: DEFAULT_SPAWN_JITTER,
            spawn_band_start: DEFAULT_SPAWN_BAND_START,
            spawn_band_width: DEFAULT_SPAWN_BAND_WIDTH,
            max_pins: DEFAULT_MAX_PINS,
            compact_max_pins: DEFAULT_COMPACT_MAX_PINS,
            compact_breakpoint: DEFAULT_COMPACT_BREAKPOINT,
            blast_duration: DEFAULT_BLAST_DURATION,
            blast_particles: DEFAULT_BLAST_PARTICLES,
            layout: GlobeLayout::Horizon,
            draw_globe: true,
            pin_image: DEFAULT_PIN_IMAGE.into(),
            drop_kinds: DropKind::default_set(),
            labels: Vec::new(),
        }
    }
}

#[wasm_bindgen]
impl GlobeConfig {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }
}

impl GlobeConfig {
    /// Pin capacity for a viewport of the given CSS width.
    pub fn pin_capacity(&self, viewport_width: f64) -> usize {
        if viewport_width >= self.compact_breakpoint {
            self.max_pins as usize
        } else {
            self.compact_max_pins as usize
        }
    }

    /// Replace values the frame loop cannot use with their defaults.
    pub fn sanitized(mut self) -> Self {
        if !(self.max_dt.is_finite() && self.max_dt > 0.0) {
            self.max_dt = DEFAULT_MAX_DT;
        }
        self
    }

    pub fn from_js(value: JsValue) -> Self {
        let mut config = Self::default();

        if !value.is_object() {
            if let Some(count) = value.as_f64() {
                config.max_drops = count as u32;
            }
            return config;
        }

        macro_rules! extract {
            ($field:ident, $key:expr, $ty:ty) => {
                if let Ok(v) = js_sys::Reflect::get(&value, &$key.into()) {
                    if let Some(num) = v.as_f64() {
                        config.$field = num as $ty;
                    }
                }
            };
        }

        extract!(max_drops, "maxDrops", u32);
        extract!(gravity, "gravity", f64);
        extract!(drag, "drag", f64);
        extract!(wind_strength, "windStrength", f64);
        extract!(gust_strength, "gustStrength", f64);
        extract!(max_dt, "maxDt", f64);
        extract!(rotation_speed, "rotationSpeed", f64);
        extract!(drag_sensitivity, "dragSensitivity", f64);
        extract!(spawn_delay, "spawnDelay", f64);
        extract!(spawn_jitter, "spawnJitter", f64);
        extract!(spawn_band_start, "spawnBandStart", f64);
        extract!(spawn_band_width, "spawnBandWidth", f64);
        extract!(max_pins, "maxPins", u32);
        extract!(compact_max_pins, "compactMaxPins", u32);
        extract!(compact_breakpoint, "compactBreakpoint", f64);
        extract!(blast_duration, "blastDuration", f64);
        extract!(blast_particles, "blastParticles", u32);
        config = config.sanitized();

        if let Some(layout) = string_key(&value, "layout").and_then(|s| GlobeLayout::parse(&s)) {
            config.layout = layout;
        }
        if let Ok(v) = js_sys::Reflect::get(&value, &"drawGlobe".into()) {
            if let Some(flag) = v.as_bool() {
                config.draw_globe = flag;
            }
        }
        if let Some(src) = string_key(&value, "pinImage") {
            config.pin_image = src;
        }

        let kinds: Vec<DropKind> = array_key(&value, "dropKinds")
            .iter()
            .filter_map(|entry| {
                let name = string_key(entry, "name")?;
                let emoji = string_key(entry, "emoji").unwrap_or_default();
                let weight = js_sys::Reflect::get(entry, &"weight".into())
                    .ok()
                    .and_then(|w| w.as_f64())
                    .filter(|w| *w > 0.0)?;
                Some(DropKind {
                    name,
                    emoji,
                    image: string_key(entry, "image"),
                    weight,
                })
            })
            .collect();
        if !kinds.is_empty() {
            config.drop_kinds = kinds;
        }

        config.labels = array_key(&value, "labels")
            .iter()
            .filter_map(|entry| {
                let name = string_key(entry, "name")?;
                Some(PinLabel {
                    name,
                    url: string_key(entry, "url"),
                })
            })
            .collect();

        config
    }
}

fn string_key(value: &JsValue, key: &str) -> Option<String> {
    js_sys::Reflect::get(value, &key.into())
        .ok()
        .and_then(|v| v.as_string())
}

fn array_key(value: &JsValue, key: &str) -> Vec<JsValue> {
    match js_sys::Reflect::get(value, &key.into()) {
        Ok(v) if js_sys::Array::is_array(&v) => js_sys::Array::from(&v).iter().collect(),
        _ => Vec::new(),
    }
}
