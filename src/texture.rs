//! Procedural earth texture

use std::f64::consts::TAU;

use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d as Ctx2d, Document, HtmlCanvasElement};

use crate::constants::{TEXTURE_HEIGHT, TEXTURE_WIDTH};

// (center x, center y, width, height, color) in texture pixels
const CONTINENTS: [(f64, f64, f64, f64, &str); 6] = [
    (170.0, 210.0, 240.0, 140.0, "#4ddc7a"),
    (380.0, 260.0, 180.0, 120.0, "#3fbf6e"),
    (620.0, 190.0, 220.0, 120.0, "#61e08b"),
    (780.0, 280.0, 180.0, 120.0, "#3fbf6e"),
    (900.0, 200.0, 120.0, 90.0, "#55d982"),
    (540.0, 360.0, 200.0, 110.0, "#d5a86a"),
];

/// Paint an equirectangular ocean-and-continents map on an off-screen canvas.
pub fn earth_texture(document: &Document) -> Result<HtmlCanvasElement, JsValue> {
    let texture: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
    texture.set_width(TEXTURE_WIDTH);
    texture.set_height(TEXTURE_HEIGHT);

    let ctx: Ctx2d = texture
        .get_context("2d")?
        .ok_or("2D context is not supported")?
        .dyn_into()?;

    let (w, h) = (TEXTURE_WIDTH as f64, TEXTURE_HEIGHT as f64);
    let ocean = ctx.create_linear_gradient(0.0, 0.0, 0.0, h);
    ocean.add_color_stop(0.0, "#1b5fd1")?;
    ocean.add_color_stop(1.0, "#0b2e6f")?;
    ctx.set_fill_style_canvas_gradient(&ocean);
    ctx.fill_rect(0.0, 0.0, w, h);

    for (cx, cy, width, height, color) in CONTINENTS {
        draw_continent(&ctx, cx, cy, width, height, color)?;
    }

    ctx.set_global_composite_operation("multiply")?;
    ctx.set_fill_style_str("rgba(128, 64, 168, 0.2)");
    ctx.fill_rect(0.0, 0.0, w, h);
    ctx.set_global_composite_operation("source-over")?;

    Ok(texture)
}

/// A blob made of four overlapping ellipses.
fn draw_continent(
    ctx: &Ctx2d,
    cx: f64,
    cy: f64,
    width: f64,
    height: f64,
    color: &str,
) -> Result<(), JsValue> {
    let lobes = [
        (cx, cy, width * 0.4, height * 0.35),
        (cx - width * 0.2, cy + height * 0.15, width * 0.3, height * 0.25),
        (cx + width * 0.2, cy - height * 0.1, width * 0.28, height * 0.22),
        (cx - width * 0.15, cy - height * 0.2, width * 0.2, height * 0.18),
    ];

    ctx.save();
    ctx.set_fill_style_str(color);
    ctx.begin_path();
    for (x, y, rx, ry) in lobes {
        ctx.ellipse(x, y, rx, ry, 0.0, 0.0, TAU)?;
    }
    ctx.fill();
    ctx.restore();
    Ok(())
}

/// Texture column to sample for a globe slice at normalized offset `nx`.
///
/// Longitude `asin(nx) + phi` is wrapped onto `[0, texture_width)`.
pub fn texture_column(nx: f64, phi: f64, texture_width: f64) -> f64 {
    let lon = nx.clamp(-1.0, 1.0).asin() + phi;
    ((lon / TAU + 0.5) * texture_width).rem_euclid(texture_width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_column_is_map_middle() {
        assert!((texture_column(0.0, 0.0, 1024.0) - 512.0).abs() < 1e-9);
    }

    #[test]
    fn test_column_wraps_with_rotation() {
        let a = texture_column(0.3, 0.2, 1024.0);
        let b = texture_column(0.3, 0.2 + TAU, 1024.0);
        assert!((a - b).abs() < 1e-6);

        let c = texture_column(-1.0, -10.0, 1024.0);
        assert!((0.0..1024.0).contains(&c));
    }
}
