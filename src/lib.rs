//! GlobeDrop - falling items, a spinning globe and impact pins on a Canvas 2D surface, in WASM

use wasm_bindgen::prelude::*;
use web_sys::console;

pub mod config;
pub mod constants;
pub mod driver;
pub mod markers;
pub mod physics;
pub mod projection;
pub mod renderer;
pub mod simulation;
pub mod spawner;
pub mod texture;
pub mod timeline;

pub use config::{DropKind, GlobeConfig, GlobeLayout, PinLabel};
pub use constants::*;
pub use driver::AnimationLoop;
pub use projection::{Globe, LatLon};
pub use renderer::{GlobeCanvas, RenderResult};
pub use simulation::{Frame, Impact, Simulation};
pub use timeline::{IntroPhase, IntroTimeline};

#[wasm_bindgen(start)]
pub fn main() {
    let mode = if RUNTIME_CONFIGURABLE {
        "configurable"
    } else {
        "release"
    };
    console::log_1(&format!("[GlobeDrop] WASM loaded ({mode})").into());
}

#[wasm_bindgen]
pub fn is_runtime_configurable() -> bool {
    RUNTIME_CONFIGURABLE
}

#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").into()
}
