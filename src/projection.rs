//! Orthographic projection between screen space and the globe surface.
//!
//! The globe is drawn as a disc of `radius` around `(center_x, center_y)` with
//! the viewer looking down the +z axis. Surface points are stored as
//! latitude/longitude in the globe's own frame; the current rotation `phi` is
//! added to the longitude whenever a point is brought back to the screen.

use crate::config::GlobeLayout;
use crate::constants::IMPACT_PENETRATION;

/// A point on the unit sphere, in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// A surface point brought back to screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
    /// Depth toward the viewer; `<= 0` means the far hemisphere.
    pub z: f64,
}

impl ScreenPoint {
    #[inline]
    pub fn is_front(&self) -> bool {
        self.z > 0.0
    }
}

/// Screen-space placement of the globe.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Globe {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

impl Globe {
    pub fn new(center_x: f64, center_y: f64, radius: f64) -> Self {
        Self {
            center_x,
            center_y,
            radius,
        }
    }

    /// Placement for a viewport of `width` x `height` CSS pixels.
    pub fn for_viewport(layout: GlobeLayout, width: f64, height: f64) -> Self {
        match layout {
            GlobeLayout::Horizon => {
                let radius = width * 0.75;
                Self::new(width / 2.0, height + radius * 0.38, radius)
            }
            GlobeLayout::Contained => Self::new(width / 2.0, width / 2.0, width * 0.5 * 0.84),
        }
    }

    /// Whether an item of `item_radius` at `(x, y)` has struck the globe.
    ///
    /// Only items above the center count, and the item must have sunk
    /// `IMPACT_PENETRATION` of its radius past the rim.
    pub fn is_impact(&self, x: f64, y: f64, item_radius: f64) -> bool {
        let dx = x - self.center_x;
        let dy = y - self.center_y;
        let dist = (dx * dx + dy * dy).sqrt();
        dy < 0.0 && dist <= self.radius - item_radius * IMPACT_PENETRATION
    }

    /// Back-project a screen point onto the front hemisphere.
    ///
    /// The returned longitude has `phi` removed so it stays fixed to the
    /// surface while the globe spins. Points slightly outside the disc land
    /// on the rim instead of producing NaN.
    pub fn unproject(&self, x: f64, y: f64, phi: f64) -> LatLon {
        let nx = (x - self.center_x) / self.radius;
        let ny = (self.center_y - y) / self.radius;
        let nz = (1.0 - nx * nx - ny * ny).max(0.0).sqrt();
        LatLon {
            lat: ny.clamp(-1.0, 1.0).asin(),
            lon: nx.atan2(nz) - phi,
        }
    }

    /// Forward-project a stored surface point at rotation `phi`.
    pub fn project(&self, point: LatLon, phi: f64) -> ScreenPoint {
        let lon = point.lon + phi;
        let cos_lat = point.lat.cos();
        let x = lon.sin() * cos_lat;
        let z = lon.cos() * cos_lat;
        let y = point.lat.sin();
        ScreenPoint {
            x: self.center_x + x * self.radius,
            y: self.center_y - y * self.radius,
            z,
        }
    }
}
