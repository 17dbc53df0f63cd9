//! Web-Mercator camera math and 2D-canvas drawing for the map layers.
//!
//! The basemap tiles are the host page's background; this canvas draws the
//! data overlays only: aggregate polygons at the back, waterways and
//! infrastructure icons above them, report markers on top.

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use formats::{GeoPoint, Geometry};
use layers::{
    AggregateLayer, InfrastructureLayer, InfrastructureStyle, MarkerStyle, PolygonStyle,
    ReportLayer, highlight_style, outline_style, selected_style,
};
use model::{InfrastructureKind, RegionId, ReportKey};

pub const TILE_SIZE: f64 = 256.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub center: GeoPoint,
    pub zoom: u8,
    pub width_px: f64,
    pub height_px: f64,
}

impl Camera {
    fn world_scale(&self) -> f64 {
        TILE_SIZE * (1u64 << self.zoom.min(24)) as f64
    }

    fn project_world(&self, point: GeoPoint) -> (f64, f64) {
        let scale = self.world_scale();
        let lat = point.lat_deg.clamp(-85.05112878, 85.05112878).to_radians();
        let x = (point.lon_deg + 180.0) / 360.0 * scale;
        let merc = (PI / 4.0 + lat / 2.0).tan().ln();
        let y = (1.0 - merc / PI) / 2.0 * scale;
        (x, y)
    }

    pub fn to_screen(&self, point: GeoPoint) -> (f64, f64) {
        let (x, y) = self.project_world(point);
        let (cx, cy) = self.project_world(self.center);
        (
            x - cx + self.width_px / 2.0,
            y - cy + self.height_px / 2.0,
        )
    }

    pub fn to_geo(&self, x_px: f64, y_px: f64) -> GeoPoint {
        let scale = self.world_scale();
        let (cx, cy) = self.project_world(self.center);
        let x = cx + x_px - self.width_px / 2.0;
        let y = cy + y_px - self.height_px / 2.0;

        let lon = x / scale * 360.0 - 180.0;
        let n = PI * (1.0 - 2.0 * y / scale);
        let lat = n.sinh().atan().to_degrees();
        GeoPoint::new(lon, lat)
    }

    /// Largest zoom at which the bounds fit the viewport.
    pub fn zoom_to_fit(&self, bounds: formats::LonLatBounds) -> u8 {
        for zoom in (0..=18u8).rev() {
            let probe = Camera { zoom, ..*self };
            let (x0, y0) = probe.project_world(bounds.min);
            let (x1, y1) = probe.project_world(bounds.max);
            if (x1 - x0).abs() <= self.width_px && (y1 - y0).abs() <= self.height_px {
                return zoom;
            }
        }
        0
    }
}

pub fn draw_scene(
    ctx: &CanvasRenderingContext2d,
    camera: &Camera,
    aggregates: Option<&AggregateLayer>,
    infrastructure: &[InfrastructureLayer],
    reports: Option<&ReportLayer>,
    hovered: Option<RegionId>,
    selected: Option<RegionId>,
) {
    ctx_set_fill_style(ctx, "#dbe2e6");
    ctx.fill_rect(0.0, 0.0, camera.width_px, camera.height_px);

    if let Some(layer) = aggregates {
        for region in layer.regions() {
            let style = if selected == Some(region.pkey) {
                selected_style(region.state)
            } else if hovered == Some(region.pkey) {
                highlight_style(region.state)
            } else {
                outline_style(region.state)
            };
            draw_polygon(ctx, camera, &region.geometry, &style);
        }
    }

    for layer in infrastructure {
        match layer.style() {
            InfrastructureStyle::Path(path) => {
                ctx_set_stroke_style(ctx, path.color);
                ctx.set_line_width(path.width);
                ctx.set_global_alpha(path.opacity);
                for feature in layer.features() {
                    draw_lines(ctx, camera, &feature.geometry);
                }
                ctx.set_global_alpha(1.0);
            }
            InfrastructureStyle::Icon(icon) => {
                let radius = icon.size_px[0] / 4.0;
                for feature in layer.features() {
                    if let Geometry::Point(p) = &feature.geometry {
                        draw_disc(ctx, camera, *p, radius, icon_color(layer.kind()), 1.0);
                    }
                }
            }
        }
    }

    if let Some(layer) = reports {
        for marker in layer.markers() {
            draw_marker(ctx, camera, marker.location, &marker.style);
        }
    }
}

/// Screen-space hit test for report markers: nearest marker whose disc
/// (plus a small touch slop) covers the cursor, earliest-loaded wins ties.
pub fn marker_at(
    camera: &Camera,
    layer: &ReportLayer,
    x_px: f64,
    y_px: f64,
) -> Option<ReportKey> {
    let mut best: Option<(f64, ReportKey)> = None;
    for marker in layer.markers() {
        let (mx, my) = camera.to_screen(marker.location);
        let reach = marker.style.radius_px + 2.0;
        let d2 = (mx - x_px).powi(2) + (my - y_px).powi(2);
        if d2 <= reach * reach && best.map(|(bd2, _)| d2 < bd2).unwrap_or(true) {
            best = Some((d2, marker.key));
        }
    }
    best.map(|(_, key)| key)
}

/// Screen-space hit test for infrastructure icon markers.
pub fn infrastructure_at<'a>(
    camera: &Camera,
    layers: &'a [InfrastructureLayer],
    x_px: f64,
    y_px: f64,
) -> Option<&'a model::InfrastructureFeature> {
    for layer in layers {
        let InfrastructureStyle::Icon(icon) = layer.style() else {
            continue;
        };
        let reach = icon.size_px[0] / 2.0;
        for feature in layer.features() {
            let Geometry::Point(p) = &feature.geometry else {
                continue;
            };
            let (mx, my) = camera.to_screen(*p);
            let d2 = (mx - x_px).powi(2) + (my - y_px).powi(2);
            if d2 <= reach * reach {
                return Some(feature);
            }
        }
    }
    None
}

fn draw_polygon(
    ctx: &CanvasRenderingContext2d,
    camera: &Camera,
    geometry: &Geometry,
    style: &PolygonStyle,
) {
    let polys: Vec<&Vec<Vec<GeoPoint>>> = match geometry {
        Geometry::Polygon(rings) => vec![rings],
        Geometry::MultiPolygon(polys) => polys.iter().collect(),
        _ => return,
    };

    for rings in polys {
        ctx.begin_path();
        for ring in rings {
            trace_ring(ctx, camera, ring);
        }
        if style.fill_opacity > 0.0 {
            ctx_set_fill_style(ctx, style.fill_color);
            ctx.set_global_alpha(style.fill_opacity);
            ctx.fill();
        }
        if style.stroke_width > 0.0 && style.stroke_opacity > 0.0 {
            ctx_set_stroke_style(ctx, style.stroke_color);
            ctx.set_line_width(style.stroke_width);
            ctx.set_global_alpha(style.stroke_opacity);
            ctx.stroke();
        }
        ctx.set_global_alpha(1.0);
    }
}

fn trace_ring(ctx: &CanvasRenderingContext2d, camera: &Camera, ring: &[GeoPoint]) {
    let mut points = ring.iter();
    let Some(first) = points.next() else {
        return;
    };
    let (x, y) = camera.to_screen(*first);
    ctx.move_to(x, y);
    for p in points {
        let (x, y) = camera.to_screen(*p);
        ctx.line_to(x, y);
    }
    ctx.close_path();
}

fn draw_lines(ctx: &CanvasRenderingContext2d, camera: &Camera, geometry: &Geometry) {
    let lines: Vec<&Vec<GeoPoint>> = match geometry {
        Geometry::LineString(line) => vec![line],
        Geometry::MultiLineString(lines) => lines.iter().collect(),
        _ => return,
    };
    for line in lines {
        let mut points = line.iter();
        let Some(first) = points.next() else {
            continue;
        };
        ctx.begin_path();
        let (x, y) = camera.to_screen(*first);
        ctx.move_to(x, y);
        for p in points {
            let (x, y) = camera.to_screen(*p);
            ctx.line_to(x, y);
        }
        ctx.stroke();
    }
}

fn draw_marker(
    ctx: &CanvasRenderingContext2d,
    camera: &Camera,
    location: GeoPoint,
    style: &MarkerStyle,
) {
    let (x, y) = camera.to_screen(location);
    ctx.begin_path();
    let _ = ctx.arc(x, y, style.radius_px, 0.0, 2.0 * PI);
    ctx_set_fill_style(ctx, style.fill_color);
    ctx.set_global_alpha(style.fill_opacity);
    ctx.fill();
    ctx.set_global_alpha(1.0);
    if style.stroke_width > 0.0 {
        ctx_set_stroke_style(ctx, style.stroke_color);
        ctx.set_line_width(style.stroke_width);
        ctx.stroke();
    }
}

fn draw_disc(
    ctx: &CanvasRenderingContext2d,
    camera: &Camera,
    location: GeoPoint,
    radius: f64,
    color: &str,
    opacity: f64,
) {
    let (x, y) = camera.to_screen(location);
    ctx.begin_path();
    let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
    ctx_set_fill_style(ctx, color);
    ctx.set_global_alpha(opacity);
    ctx.fill();
    ctx.set_global_alpha(1.0);
    ctx_set_stroke_style(ctx, "#ffffff");
    ctx.set_line_width(1.5);
    ctx.stroke();
}

/// Fallback fills for icon layers until the SVG assets draw as images.
fn icon_color(kind: InfrastructureKind) -> &'static str {
    match kind {
        InfrastructureKind::Waterway => "#3960ac",
        InfrastructureKind::Pump => "#0f766e",
        InfrastructureKind::Floodgate => "#7c3aed",
        InfrastructureKind::Gauge => "#b45309",
    }
}

// Styles assign through Reflect so the same code works across the
// fillStyle/strokeStyle API generations of web-sys.
fn ctx_set_fill_style(ctx: &CanvasRenderingContext2d, value: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("fillStyle"),
        &JsValue::from_str(value),
    );
}

fn ctx_set_stroke_style(ctx: &CanvasRenderingContext2d, value: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("strokeStyle"),
        &JsValue::from_str(value),
    );
}

#[cfg(test)]
mod tests {
    use super::Camera;
    use formats::GeoPoint;

    fn camera() -> Camera {
        Camera {
            center: GeoPoint::new(106.8317, -6.1924),
            zoom: 12,
            width_px: 1280.0,
            height_px: 720.0,
        }
    }

    #[test]
    fn the_center_projects_to_the_canvas_middle() {
        let cam = camera();
        let (x, y) = cam.to_screen(cam.center);
        assert!((x - 640.0).abs() < 1e-9);
        assert!((y - 360.0).abs() < 1e-9);
    }

    #[test]
    fn screen_and_geo_round_trip() {
        let cam = camera();
        let p = GeoPoint::new(106.9, -6.25);
        let (x, y) = cam.to_screen(p);
        let back = cam.to_geo(x, y);
        assert!((back.lon_deg - p.lon_deg).abs() < 1e-9);
        assert!((back.lat_deg - p.lat_deg).abs() < 1e-9);
    }

    #[test]
    fn east_is_right_and_north_is_up() {
        let cam = camera();
        let (x_east, _) = cam.to_screen(GeoPoint::new(106.9, -6.1924));
        assert!(x_east > 640.0);
        let (_, y_north) = cam.to_screen(GeoPoint::new(106.8317, -6.0));
        assert!(y_north < 360.0);
    }

    #[test]
    fn zoom_to_fit_contains_the_bounds() {
        let cam = camera();
        let bounds = formats::LonLatBounds::new(
            GeoPoint::new(106.75, -6.25),
            GeoPoint::new(106.95, -6.10),
        );
        let zoom = cam.zoom_to_fit(bounds);
        let fitted = Camera { zoom, ..cam };
        let (x0, y0) = fitted.to_screen(bounds.min);
        let (x1, y1) = fitted.to_screen(bounds.max);
        assert!((x1 - x0).abs() <= cam.width_px);
        assert!((y1 - y0).abs() <= cam.height_px);
        // One level deeper must overflow at least one axis.
        let over = Camera { zoom: zoom + 1, ..cam };
        let (x0, y0) = over.to_screen(bounds.min);
        let (x1, y1) = over.to_screen(bounds.max);
        assert!((x1 - x0).abs() > cam.width_px || (y1 - y0).abs() > cam.height_px);
    }

    #[test]
    fn zooming_in_doubles_pixel_distances() {
        let mut cam = camera();
        let p = GeoPoint::new(106.9, -6.25);
        let (x1, _) = cam.to_screen(p);
        cam.zoom += 1;
        let (x2, _) = cam.to_screen(p);
        assert!(((x2 - 640.0) - 2.0 * (x1 - 640.0)).abs() < 1e-6);
    }
}
