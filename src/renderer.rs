//! Canvas 2D rendering of the globe, pins, blasts and falling items

use std::f64::consts::TAU;

use js_sys::Math;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;
use web_sys::{
    console, CanvasRenderingContext2d as Ctx2d, HtmlCanvasElement, HtmlImageElement,
};

use crate::config::GlobeConfig;
use crate::constants::*;
use crate::markers::{hit_test, hover_scale, Blast, LabelHitbox, Pin};
use crate::physics::FallingItem;
use crate::simulation::Simulation;
use crate::texture::{earth_texture, texture_column};

const EMOJI_FONT: &str = r#""Apple Color Emoji", "Segoe UI Emoji", "Noto Color Emoji", sans-serif"#;
const LABEL_FONT: &str = r#"-apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif"#;

#[wasm_bindgen]
pub struct RenderResult {
    pub fps: u32,
    pub drops: u32,
    pub pins: u32,
    pub blasts: u32,
    /// Drops that struck the globe during this frame.
    pub impacts: u32,
    pub rotation: f64,
    pub paused: bool,
}

#[derive(Clone, Copy, Debug)]
struct Hover {
    pin_id: u64,
    since: f64,
}

#[wasm_bindgen]
pub struct GlobeCanvas {
    canvas: HtmlCanvasElement,
    ctx: Ctx2d,
    sim: Simulation<SmallRng>,

    earth: Option<HtmlCanvasElement>,
    pin_image: HtmlImageElement,
    drop_images: Vec<Option<HtmlImageElement>>,

    hitboxes: Vec<LabelHitbox>,
    hover: Option<Hover>,
    pointer_down: Option<(f64, f64)>,

    width: f64,
    height: f64,
    last_frame: f64,

    frame_count: u32,
    fps_last_time: f64,
    current_fps: u32,
}

#[wasm_bindgen]
impl GlobeCanvas {
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, config_val: JsValue) -> Result<GlobeCanvas, JsValue> {
        console::log_1(&"[GlobeDrop] Initializing WASM module...".into());

        let config = GlobeConfig::from_js(config_val);

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or("Failed to get document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id(canvas_id)
            .ok_or("Canvas not found")?
            .dyn_into()?;

        let ctx: Ctx2d = canvas
            .get_context("2d")?
            .ok_or("2D context is not supported")?
            .dyn_into()?;

        let earth = if config.draw_globe {
            Some(earth_texture(&document)?)
        } else {
            None
        };

        let pin_image = load_image(&config.pin_image)?;
        let drop_images = config
            .drop_kinds
            .iter()
            .map(|kind| kind.image.as_deref().map(load_image).transpose())
            .collect::<Result<Vec<_>, _>>()?;

        let seed = (Math::random() * (1u64 << 53) as f64) as u64;
        let sim = Simulation::new(config, SmallRng::seed_from_u64(seed));

        let mut globe = Self {
            canvas,
            ctx,
            sim,
            earth,
            pin_image,
            drop_images,
            hitboxes: Vec::new(),
            hover: None,
            pointer_down: None,
            width: 0.0,
            height: 0.0,
            last_frame: 0.0,
            frame_count: 0,
            fps_last_time: 0.0,
            current_fps: 0,
        };

        globe.resize()?;
        globe.set_cursor("grab")?;

        console::log_1(
            &format!(
                "[GlobeDrop] Initialized {}x{} with up to {} drops and {} pins",
                globe.width,
                globe.height,
                globe.sim.config().max_drops,
                globe.sim.pins().capacity(),
            )
            .into(),
        );
        Ok(globe)
    }

    pub fn resize(&mut self) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("Failed to get window")?;
        let dpr = window.device_pixel_ratio();

        let (mut width, mut height) = (
            self.canvas.client_width() as f64,
            self.canvas.client_height() as f64,
        );
        if width <= 0.0 || height <= 0.0 {
            width = window.inner_width()?.as_f64().unwrap_or(0.0);
            height = window.inner_height()?.as_f64().unwrap_or(0.0);
        }

        self.canvas.set_width((width * dpr).round() as u32);
        self.canvas.set_height((height * dpr).round() as u32);
        self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;

        self.width = width;
        self.height = height;
        let evicted = self.sim.resize(width, height);
        if self.hover.is_some_and(|h| evicted.iter().any(|p| p.id == h.pin_id)) {
            self.hover = None;
        }
        Ok(())
    }

    pub fn render(&mut self, current_time: f64) -> RenderResult {
        self.last_frame = current_time;

        self.frame_count += 1;
        if current_time - self.fps_last_time >= 1000.0 {
            self.current_fps = self.frame_count;
            self.frame_count = 0;
            self.fps_last_time = current_time;
        }

        let frame = self.sim.advance(current_time);
        if !frame.paused {
            if let Err(err) = self.draw(current_time) {
                console::warn_2(&"[GlobeDrop] Frame draw failed:".into(), &err);
            }
        }

        RenderResult {
            fps: self.current_fps,
            drops: self.sim.drops().len() as u32,
            pins: self.sim.pins().len() as u32,
            blasts: self.sim.blasts().len() as u32,
            impacts: frame.impacts.len() as u32,
            rotation: self.sim.phi(),
            paused: frame.paused,
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.sim.set_visible(visible);
    }

    /// Enable or disable the periodic spawner.
    pub fn set_auto_spawn(&mut self, enabled: bool) {
        self.sim.set_auto_spawn(enabled);
    }

    /// Release one item of `kind` at `x_fraction` of the width, just above the top edge.
    pub fn drop_item(&mut self, kind: usize, x_fraction: f64, size: f64) -> u64 {
        let kind = kind.min(self.sim.config().drop_kinds.len().saturating_sub(1));
        let drop = FallingItem::at_rest(0, kind, self.width * x_fraction, -size, size);
        self.sim.release(drop)
    }

    pub fn pointer_down(&mut self, client_x: f64, client_y: f64) -> Result<(), JsValue> {
        let (x, y) = self.to_canvas(client_x, client_y);
        self.pointer_down = Some((x, y));
        self.sim.begin_drag(x);
        self.set_cursor("grabbing")
    }

    pub fn pointer_move(&mut self, client_x: f64, client_y: f64) -> Result<(), JsValue> {
        let (x, y) = self.to_canvas(client_x, client_y);
        if self.sim.is_dragging() {
            self.sim.drag_to(x);
            return Ok(());
        }

        let hit = hit_test(&self.hitboxes, x, y).map(|b| b.pin_id);
        match (hit, self.hover) {
            (Some(id), Some(h)) if h.pin_id == id => {}
            (Some(id), _) => {
                self.hover = Some(Hover {
                    pin_id: id,
                    since: self.last_frame,
                })
            }
            (None, _) => self.hover = None,
        }
        self.set_cursor(if hit.is_some() { "pointer" } else { "grab" })
    }

    /// Finish a gesture; a near-stationary press on a label opens its link.
    ///
    /// Returns the URL that was opened, if any.
    pub fn pointer_up(&mut self, client_x: f64, client_y: f64) -> Result<Option<String>, JsValue> {
        self.sim.end_drag();
        self.set_cursor("grab")?;

        let Some((down_x, down_y)) = self.pointer_down.take() else {
            return Ok(None);
        };
        let (x, y) = self.to_canvas(client_x, client_y);
        if (x - down_x).hypot(y - down_y) >= CLICK_SLOP {
            return Ok(None);
        }

        let Some(url) = hit_test(&self.hitboxes, x, y).map(|b| b.url.clone()) else {
            return Ok(None);
        };
        let window = web_sys::window().ok_or("Failed to get window")?;
        window.open_with_url_and_target_and_features(&url, "_blank", "noopener,noreferrer")?;
        Ok(Some(url))
    }

    pub fn pointer_leave(&mut self) -> Result<(), JsValue> {
        self.sim.end_drag();
        self.pointer_down = None;
        self.hover = None;
        self.set_cursor("grab")
    }

    #[cfg(feature = "configurable")]
    pub fn set_gravity(&mut self, value: f64) {
        let mut forces = self.sim.forces();
        forces.gravity = value;
        self.sim.set_forces(forces);
    }

    #[cfg(feature = "configurable")]
    pub fn set_drag(&mut self, value: f64) {
        let mut forces = self.sim.forces();
        forces.drag = value;
        self.sim.set_forces(forces);
    }

    #[cfg(feature = "configurable")]
    pub fn set_wind_strength(&mut self, value: f64) {
        let mut forces = self.sim.forces();
        forces.wind_strength = value;
        self.sim.set_forces(forces);
    }

    #[cfg(feature = "configurable")]
    pub fn set_gust_strength(&mut self, value: f64) {
        let mut forces = self.sim.forces();
        forces.gust_strength = value;
        self.sim.set_forces(forces);
    }

    #[cfg(feature = "configurable")]
    pub fn set_rotation_speed(&mut self, value: f64) {
        self.sim.set_rotation_speed(value);
    }

    pub fn get_fps(&self) -> u32 {
        self.current_fps
    }
    pub fn get_rotation(&self) -> f64 {
        self.sim.phi()
    }
    pub fn get_drop_count(&self) -> u32 {
        self.sim.drops().len() as u32
    }
    pub fn get_pin_count(&self) -> u32 {
        self.sim.pins().len() as u32
    }
    pub fn get_config(&self) -> GlobeConfig {
        self.sim.config().clone()
    }
    pub fn is_configurable(&self) -> bool {
        RUNTIME_CONFIGURABLE
    }
}

impl GlobeCanvas {
    pub(crate) fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn to_canvas(&self, client_x: f64, client_y: f64) -> (f64, f64) {
        let rect = self.canvas.get_bounding_client_rect();
        (client_x - rect.left(), client_y - rect.top())
    }

    fn set_cursor(&self, cursor: &str) -> Result<(), JsValue> {
        self.canvas.style().set_property("cursor", cursor)
    }

    fn draw(&mut self, now: f64) -> Result<(), JsValue> {
        self.ctx.clear_rect(0.0, 0.0, self.width, self.height);

        if let Some(earth) = &self.earth {
            self.draw_globe(earth)?;
        }

        let mut hitboxes = Vec::new();
        for pin in self.sim.pins().iter() {
            if let Some(hitbox) = self.draw_pin(pin, now)? {
                hitboxes.push(hitbox);
            }
        }
        self.hitboxes = hitboxes;

        let duration = self.sim.blasts().duration();
        for blast in self.sim.blasts().active(now) {
            self.draw_blast(blast, now, duration)?;
        }

        for drop in self.sim.drops() {
            self.draw_drop(drop)?;
        }
        Ok(())
    }

    fn draw_globe(&self, earth: &HtmlCanvasElement) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let globe = self.sim.globe();
        let (cx, cy, r) = (globe.center_x, globe.center_y, globe.radius);
        if r <= 0.0 {
            return Ok(());
        }

        ctx.save();

        ctx.begin_path();
        ctx.arc(cx, cy, r, 0.0, TAU)?;
        ctx.set_fill_style_str("#2d0f44");
        ctx.fill();

        // Sample the texture in vertical strips, one longitude per column.
        let (tex_w, tex_h) = (earth.width() as f64, earth.height() as f64);
        let step = (r / 320.0).max(1.5);
        let mut x = -r;
        while x <= r {
            let screen_x = cx + x;
            if screen_x + step >= 0.0 && screen_x <= self.width {
                let nx = x / r;
                let slice = (1.0 - nx * nx).max(0.0).sqrt() * r;
                let column = texture_column(nx, self.sim.phi(), tex_w).floor();
                ctx.draw_image_with_html_canvas_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                    earth,
                    column,
                    0.0,
                    1.0,
                    tex_h,
                    screen_x,
                    cy - slice,
                    step + 0.5,
                    slice * 2.0,
                )?;
            }
            x += step;
        }

        let highlight = ctx.create_radial_gradient(
            cx - r * 0.35,
            cy - r * 0.45,
            r * 0.2,
            cx - r * 0.2,
            cy - r * 0.2,
            r,
        )?;
        highlight.add_color_stop(0.0, "rgba(245, 221, 255, 0.55)")?;
        highlight.add_color_stop(0.5, "rgba(165, 92, 213, 0.15)")?;
        highlight.add_color_stop(1.0, "rgba(50, 10, 72, 0.7)")?;
        ctx.set_global_composite_operation("screen")?;
        ctx.set_fill_style_canvas_gradient(&highlight);
        ctx.begin_path();
        ctx.arc(cx, cy, r, 0.0, TAU)?;
        ctx.fill();

        let shade = ctx.create_radial_gradient(
            cx + r * 0.35,
            cy + r * 0.1,
            r * 0.3,
            cx + r * 0.65,
            cy + r * 0.25,
            r,
        )?;
        shade.add_color_stop(0.0, "rgba(0, 0, 0, 0)")?;
        shade.add_color_stop(0.6, "rgba(20, 0, 40, 0.35)")?;
        shade.add_color_stop(1.0, "rgba(10, 0, 25, 0.8)")?;
        ctx.set_global_composite_operation("multiply")?;
        ctx.set_fill_style_canvas_gradient(&shade);
        ctx.begin_path();
        ctx.arc(cx, cy, r, 0.0, TAU)?;
        ctx.fill();

        ctx.set_global_composite_operation("source-over")?;
        ctx.set_stroke_style_str("rgba(214, 169, 255, 0.35)");
        ctx.set_line_width(6.0);
        ctx.begin_path();
        ctx.arc(cx, cy, r + 4.0, 0.0, TAU)?;
        ctx.stroke();

        ctx.restore();
        Ok(())
    }

    /// Draw one pin and its label; returns the label hitbox if it links out.
    fn draw_pin(&self, pin: &Pin, now: f64) -> Result<Option<LabelHitbox>, JsValue> {
        if !self.pin_image.complete() {
            return Ok(None);
        }
        let point = self.sim.globe().project(pin.at, self.sim.phi());
        if !point.is_front() {
            return Ok(None);
        }

        let ctx = &self.ctx;
        let base = Pin::base_size(point.z);
        let pop = pin.pop_scale(now);
        let hover = match self.hover {
            Some(h) if h.pin_id == pin.id => hover_scale(h.since, now),
            _ => 1.0,
        };

        ctx.save();
        ctx.translate(point.x, point.y)?;
        ctx.scale(pop * hover, pop * hover)?;
        ctx.draw_image_with_html_image_element_and_dw_and_dh(
            &self.pin_image,
            -base * 0.4,
            -base,
            base * 0.8,
            base,
        )?;
        ctx.restore();

        let Some(label) = &pin.label else {
            return Ok(None);
        };

        let label_y = point.y - base * 1.2 * pop * hover;
        let font_size = (14.0 * (0.7 + point.z * 0.3) * hover).round();

        ctx.save();
        ctx.set_font(&format!("{font_size}px {LABEL_FONT}"));
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");

        let text_width = ctx.measure_text(&label.name)?.width();
        let box_width = text_width + 8.0 * hover * 2.0;
        let box_height = font_size + 5.0 * hover * 2.0;

        ctx.set_fill_style_str("rgba(0, 0, 0, 0.7)");
        rounded_rect(ctx, point.x, label_y, box_width, box_height, 6.0 * hover);
        ctx.fill();

        ctx.set_fill_style_str("rgba(0, 0, 0, 0.5)");
        ctx.fill_text(&label.name, point.x + hover, label_y + hover)?;
        ctx.set_fill_style_str("#FFFFFF");
        ctx.fill_text(&label.name, point.x, label_y)?;
        ctx.restore();

        Ok(label.url.as_ref().map(|url| LabelHitbox {
            pin_id: pin.id,
            x: point.x,
            y: label_y,
            width: box_width,
            height: box_height,
            url: url.clone(),
        }))
    }

    fn draw_blast(&self, blast: &Blast, now: f64, duration: f64) -> Result<(), JsValue> {
        let point = self.sim.globe().project(blast.at, self.sim.phi());
        if !point.is_front() {
            return Ok(());
        }

        let ctx = &self.ctx;
        let t = blast.progress(now, duration);

        ctx.save();
        ctx.set_global_alpha(Blast::opacity(t));
        ctx.set_stroke_style_str("rgba(255, 230, 184, 0.9)");
        ctx.set_line_width(3.0);
        ctx.begin_path();
        ctx.arc(point.x, point.y, Blast::ring_radius(t), 0.0, TAU)?;
        ctx.stroke();

        ctx.set_fill_style_str("rgba(255, 197, 246, 0.9)");
        for particle in &blast.particles {
            let (dx, dy) = particle.offset(t);
            ctx.begin_path();
            ctx.arc(point.x + dx, point.y + dy, particle.radius_at(t), 0.0, TAU)?;
            ctx.fill();
        }
        ctx.restore();
        Ok(())
    }

    fn draw_drop(&self, drop: &FallingItem) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        ctx.save();
        ctx.translate(drop.x, drop.y)?;
        ctx.rotate(drop.rotation)?;

        let image = self
            .drop_images
            .get(drop.kind)
            .and_then(Option::as_ref)
            .filter(|img| img.complete() && img.natural_width() > 0);

        if let Some(image) = image {
            let half = drop.size * 0.5;
            ctx.draw_image_with_html_image_element_and_dw_and_dh(
                image, -half, -half, drop.size, drop.size,
            )?;
        } else if let Some(kind) = self.sim.config().drop_kinds.get(drop.kind) {
            ctx.set_font(&format!("{}px {EMOJI_FONT}", drop.size));
            ctx.set_text_align("center");
            ctx.set_text_baseline("middle");
            ctx.fill_text(&kind.emoji, 0.0, 0.0)?;
        }

        ctx.restore();
        Ok(())
    }
}

fn load_image(src: &str) -> Result<HtmlImageElement, JsValue> {
    let image = HtmlImageElement::new()?;
    image.set_decoding("async");
    image.set_src(src);
    Ok(image)
}

/// Path a rounded rectangle centered on `(cx, cy)`.
fn rounded_rect(ctx: &Ctx2d, cx: f64, cy: f64, width: f64, height: f64, radius: f64) {
    let (left, right) = (cx - width / 2.0, cx + width / 2.0);
    let (top, bottom) = (cy - height / 2.0, cy + height / 2.0);

    ctx.begin_path();
    ctx.move_to(left + radius, top);
    ctx.line_to(right - radius, top);
    ctx.quadratic_curve_to(right, top, right, top + radius);
    ctx.line_to(right, bottom - radius);
    ctx.quadratic_curve_to(right, bottom, right - radius, bottom);
    ctx.line_to(left + radius, bottom);
    ctx.quadratic_curve_to(left, bottom, left, bottom - radius);
    ctx.line_to(left, top + radius);
    ctx.quadratic_curve_to(left, top, left + radius, top);
    ctx.close_path();
}
