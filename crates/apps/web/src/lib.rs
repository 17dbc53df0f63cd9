//! Floodwatch browser client.
//!
//! The host page owns the static shell (canvas, table skeleton, control
//! buttons) and calls the exported functions below; this crate owns all
//! state and renders into `#map-canvas`, `#table-body`, `#info-box`,
//! `#count-legend`, `#severity-legend`, `#window-control`,
//! `#reports-badge`, `#notice`, and `#popup`.
//!
//! Pointer events arrive in canvas pixel coordinates through
//! `pointer_move`/`pointer_leave`/`cursor_click`; table events arrive as row
//! numbers through the `table_*` functions (rows render a matching
//! `data-row` attribute for the page's delegated listeners).
//!
//! Load order follows the site's original behavior: reports and subdistrict
//! aggregates join first (primary), then village/neighbourhood aggregates,
//! infrastructure, and the DIMS overlay (secondary). A failed secondary
//! layer posts a notice and never blocks the primary layers.
//!
//! The confirmed-reports layer and the aggregate polygons are alternate
//! baselayers: polygons draw, hover, and click only while reports are
//! toggled off. Infrastructure overlays stay up in both modes.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use gloo_net::http::Request;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

mod dom;
mod i18n;
mod render;

use api::{
    ApiConfig, ApiError, Endpoint, GenerationCounter, LoadJoin, StateUpdate, TimeWindow,
    decode_layer, session_url, state_update_url,
};
use formats::{FeatureSet, GeoPoint, LonLatBounds};
use i18n::{Language, labels};
use layers::{
    AggregateLayer, InfrastructureLayer, ReportLayer, SeverityLegend, level_for_zoom,
};
use model::{
    AggregateRegion, FloodState, InfrastructureKind, RegionId, RegionLevel, Report, ReportKey,
    ReportStatus, UserSession,
};
use render::{Camera, draw_scene, infrastructure_at, marker_at};
use sync::{
    Effect, InteractionController, InteractionState, RowId, TableModel, apply_state_change,
};

static PANIC_HOOK_SET: OnceLock<()> = OnceLock::new();

struct AppState {
    config: ApiConfig,
    language: Language,
    session: UserSession,
    home_bounds: LonLatBounds,

    reports: Vec<Report>,
    report_layer: ReportLayer,
    reports_visible: bool,
    aggregates: BTreeMap<RegionLevel, AggregateLayer>,
    infrastructure: Vec<InfrastructureLayer>,
    pending_dims: Option<FeatureSet>,

    table: TableModel,
    controller: InteractionController,
    severity_legend: SeverityLegend,

    window: TimeWindow,
    generations: GenerationCounter,
    primary_join: Option<LoadJoin<Option<FeatureSet>>>,
    table_join: Option<LoadJoin<Option<FeatureSet>>>,
    reload_join: Option<LoadJoin<Option<FeatureSet>>>,

    pending_focus: Option<ReportKey>,

    camera: Camera,
    ctx: Option<CanvasRenderingContext2d>,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            config: ApiConfig::default(),
            language: Language::English,
            session: UserSession::default(),
            // Greater Jakarta; geolocation outside this box is ignored.
            home_bounds: LonLatBounds::new(
                GeoPoint::new(106.5894, -6.4354),
                GeoPoint::new(107.0782, -5.9029),
            ),

            reports: Vec::new(),
            report_layer: ReportLayer::default(),
            reports_visible: true,
            aggregates: BTreeMap::new(),
            infrastructure: Vec::new(),
            pending_dims: None,

            table: TableModel::default(),
            controller: InteractionController::new(),
            severity_legend: SeverityLegend::default(),

            window: TimeWindow::OneHour,
            generations: GenerationCounter::new(),
            primary_join: None,
            table_join: None,
            reload_join: None,

            pending_focus: None,

            camera: Camera {
                center: GeoPoint::new(106.8317, -6.1924),
                zoom: 12,
                width_px: 1280.0,
                height_px: 720.0,
            },
            ctx: None,
        }
    }
}

thread_local! {
    static STATE: RefCell<AppState> = RefCell::new(AppState::default());
}

/// Safe TLS access helper that returns a default on teardown instead of
/// panicking.
fn with_state<F, R>(f: F) -> R
where
    F: FnOnce(&RefCell<AppState>) -> R,
    R: Default,
{
    STATE.try_with(f).unwrap_or_default()
}

fn init_panic_hook() {
    PANIC_HOOK_SET.get_or_init(|| {
        console_error_panic_hook::set_once();
    });
}

fn console_warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

fn console_log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

// ---------------------------------------------------------------------------
// Boot and configuration

#[wasm_bindgen]
pub fn boot() {
    init_panic_hook();

    let language = dom::document()
        .and_then(|d| d.document_element())
        .and_then(|e| e.get_attribute("lang"))
        .map(|tag| Language::from_tag(&tag))
        .unwrap_or_default();
    let pending_focus = url_report_param();

    with_state(|state| {
        let mut s = state.borrow_mut();
        s.language = language;
        s.pending_focus = pending_focus;
    });

    render_static_controls();
    start_session_load();
    start_primary_load();
}

#[wasm_bindgen]
pub fn set_api_base(base: String) {
    with_state(|state| state.borrow_mut().config.base = base);
}

#[wasm_bindgen]
pub fn init_canvas(canvas_id: &str) -> Result<(), JsValue> {
    let canvas: HtmlCanvasElement = dom::element_by_id(canvas_id)
        .ok_or_else(|| JsValue::from_str("canvas element not found"))?
        .dyn_into()?;
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into()?;

    with_state(|state| {
        let mut s = state.borrow_mut();
        s.camera.width_px = canvas.width() as f64;
        s.camera.height_px = canvas.height() as f64;
        s.ctx = Some(ctx);
    });
    redraw();
    Ok(())
}

#[wasm_bindgen]
pub fn set_canvas_size(width: f64, height: f64) {
    with_state(|state| {
        let mut s = state.borrow_mut();
        s.camera.width_px = width;
        s.camera.height_px = height;
    });
    redraw();
}

/// Localized name for the confirmed-reports layer, for the host page's
/// layer toggle.
#[wasm_bindgen]
pub fn reports_layer_label() -> String {
    with_state(|state| labels(state.borrow().language).confirmed_layer).to_string()
}

#[wasm_bindgen]
pub fn set_language(tag: &str) {
    with_state(|state| state.borrow_mut().language = Language::from_tag(tag));
    render_static_controls();
    rerender_table();
    refresh_severity_legend();
}

// ---------------------------------------------------------------------------
// Camera

#[wasm_bindgen]
pub fn set_view(lon_deg: f64, lat_deg: f64, zoom: u8) {
    let level_changed = with_state(|state| {
        let mut s = state.borrow_mut();
        let before = level_for_zoom(s.camera.zoom);
        s.camera.center = GeoPoint::new(lon_deg, lat_deg);
        s.camera.zoom = zoom;
        before != level_for_zoom(zoom)
    });
    if level_changed {
        clear_hover();
    }
    redraw();
}

#[wasm_bindgen]
pub fn set_zoom(zoom: u8) {
    let level_changed = with_state(|state| {
        let mut s = state.borrow_mut();
        let before = level_for_zoom(s.camera.zoom);
        s.camera.zoom = zoom;
        before != level_for_zoom(zoom)
    });
    if level_changed {
        clear_hover();
    }
    redraw();
}

#[wasm_bindgen]
pub fn pan_by(dx_px: f64, dy_px: f64) {
    with_state(|state| {
        let mut s = state.borrow_mut();
        let (cx, cy) = (s.camera.width_px / 2.0, s.camera.height_px / 2.0);
        s.camera.center = s.camera.to_geo(cx - dx_px, cy - dy_px);
    });
    redraw();
}

/// Toggles the confirmed-reports layer. Reports and aggregate polygons are
/// alternate baselayers: while reports are shown the aggregates stay off the
/// map, so turning reports on also ends any polygon hover.
#[wasm_bindgen]
pub fn set_reports_visible(visible: bool) {
    with_state(|state| state.borrow_mut().reports_visible = visible);
    if visible {
        clear_hover();
    }
    redraw();
}

/// Recenter on the user's position if it is inside the home area.
#[wasm_bindgen]
pub fn locate_me() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(geolocation) = window.navigator().geolocation() else {
        console_warn("geolocation unavailable");
        return;
    };

    let on_position = Closure::wrap(Box::new(|position: web_sys::GeolocationPosition| {
        let coords = position.coords();
        let point = GeoPoint::new(coords.longitude(), coords.latitude());
        let recentered = with_state(|state| {
            let mut s = state.borrow_mut();
            if !s.home_bounds.contains(point) {
                return false;
            }
            s.camera.center = point;
            s.camera.zoom = 16;
            true
        });
        if recentered {
            clear_hover();
            redraw();
        }
    }) as Box<dyn FnMut(web_sys::GeolocationPosition)>);

    if geolocation
        .get_current_position(on_position.as_ref().unchecked_ref())
        .is_err()
    {
        console_warn("geolocation request rejected");
    }
    on_position.forget();
}

// ---------------------------------------------------------------------------
// Pointer interaction

#[wasm_bindgen]
pub fn pointer_move(x_px: f64, y_px: f64) {
    let region = region_under(x_px, y_px);
    let effects = with_state(|state| {
        let mut s = state.borrow_mut();
        let AppState {
            controller, table, ..
        } = &mut *s;
        match region {
            Some(region) => controller.pointer_enter(region, table),
            None => match controller.state() {
                InteractionState::Hover(prev) => controller.pointer_leave(prev, table),
                _ => Vec::new(),
            },
        }
    });
    run_effects(effects);
}

#[wasm_bindgen]
pub fn pointer_leave() {
    clear_hover();
}

#[wasm_bindgen]
pub fn cursor_click(x_px: f64, y_px: f64) {
    // Report markers take precedence, then icon infrastructure, then
    // aggregate polygons.
    enum Hit {
        Marker(String),
        Infrastructure(String),
        Region(RegionId),
        Nothing,
    }

    let hit = with_state(|state| {
        let s = state.borrow();
        if s.reports_visible {
            if let Some(key) = marker_at(&s.camera, &s.report_layer, x_px, y_px) {
                if let Some(marker) = s.report_layer.get(key) {
                    return Some(Hit::Marker(marker.popup.clone()));
                }
            }
        }
        if let Some(feature) = infrastructure_at(&s.camera, &s.infrastructure, x_px, y_px) {
            return Some(Hit::Infrastructure(infrastructure_popup_html(feature)));
        }
        if !s.reports_visible {
            let point = s.camera.to_geo(x_px, y_px);
            if let Some(region) = s
                .aggregates
                .get(&level_for_zoom(s.camera.zoom))
                .and_then(|layer| layer.region_at(point))
            {
                return Some(Hit::Region(region.pkey));
            }
        }
        Some(Hit::Nothing)
    });

    match hit {
        Some(Hit::Marker(popup)) | Some(Hit::Infrastructure(popup)) => dom::show_popup(&popup),
        Some(Hit::Region(pkey)) => {
            dom::hide_popup();
            let effects = with_state(|state| {
                let mut s = state.borrow_mut();
                let AppState {
                    controller, table, ..
                } = &mut *s;
                controller.click(pkey, table)
            });
            run_effects(effects);
        }
        Some(Hit::Nothing) => dom::hide_popup(),
        None => {}
    }
}

/// Double-click zooms the map to the region under the cursor.
#[wasm_bindgen]
pub fn cursor_double_click(x_px: f64, y_px: f64) {
    let view = with_state(|state| {
        let s = state.borrow();
        if s.reports_visible {
            return None;
        }
        let point = s.camera.to_geo(x_px, y_px);
        s.aggregates
            .get(&level_for_zoom(s.camera.zoom))
            .and_then(|layer| layer.region_at(point))
            .and_then(|region| region.bounds())
            .map(|bounds| (bounds.center(), s.camera.zoom_to_fit(bounds)))
    });
    if let Some((center, zoom)) = view {
        set_view(center.lon_deg, center.lat_deg, zoom);
    }
}

#[wasm_bindgen]
pub fn deselect() {
    let effects = with_state(|state| {
        let mut s = state.borrow_mut();
        let AppState {
            controller, table, ..
        } = &mut *s;
        controller.deselect(table)
    });
    run_effects(effects);
}

// ---------------------------------------------------------------------------
// Table interaction

#[wasm_bindgen]
pub fn table_row_enter(row: u32) {
    let effects = with_state(|state| {
        let mut s = state.borrow_mut();
        let AppState {
            controller, table, ..
        } = &mut *s;
        controller.row_enter(RowId(row), table)
    });
    run_effects(effects);
}

#[wasm_bindgen]
pub fn table_row_leave(row: u32) {
    let effects = with_state(|state| {
        let mut s = state.borrow_mut();
        let AppState {
            controller, table, ..
        } = &mut *s;
        controller.row_leave(RowId(row), table)
    });
    run_effects(effects);
}

#[wasm_bindgen]
pub fn table_row_click(row: u32) {
    let effects = with_state(|state| {
        let mut s = state.borrow_mut();
        let AppState {
            controller, table, ..
        } = &mut *s;
        controller.row_click(RowId(row), table)
    });
    run_effects(effects);
}

#[wasm_bindgen]
pub fn table_toggle_expand(row: u32) {
    let changed = with_state(|state| state.borrow_mut().table.toggle(RowId(row)));
    if changed {
        rerender_table();
    }
}

/// REM edit from a row's severity dropdown.
#[wasm_bindgen]
pub fn table_set_state(row: u32, state_code: u8) {
    let Some(new_state) = FloodState::from_code(state_code) else {
        console_warn(&format!("ignoring unknown severity code {state_code}"));
        return;
    };

    let outcome = with_state(|state| {
        let mut s = state.borrow_mut();
        let Some(region) = s.table.region_for_row(RowId(row)) else {
            return None;
        };
        let AppState {
            aggregates,
            session,
            ..
        } = &mut *s;
        let Some(layer) = aggregates.get_mut(&RegionLevel::Neighbourhood) else {
            return None;
        };
        Some(apply_state_change(layer, region, new_state, session))
    });

    match outcome {
        Some(Ok(effects)) => run_effects(effects),
        Some(Err(err)) => console_warn(&format!("severity edit rejected: {err}")),
        None => console_warn("severity edit ignored: row is not bound to a region"),
    }
}

// ---------------------------------------------------------------------------
// Time window reload

#[wasm_bindgen]
pub fn set_time_window(hours: u32) {
    let Some(window) = TimeWindow::from_hours(hours) else {
        console_warn(&format!("ignoring unsupported time window {hours}h"));
        return;
    };

    let generation = with_state(|state| {
        let mut s = state.borrow_mut();
        s.window = window;
        s.reload_join = Some(LoadJoin::new(&["subdistrict", "village", "rw"]));
        // A fresh generation supersedes any reload still in flight.
        s.generations.begin()
    });
    render_static_controls();

    for level in RegionLevel::ALL {
        let slot = level.as_wire();
        let url = with_state(|state| {
            Endpoint::Aggregates { level, window }.url(&state.borrow().config)
        });
        spawn_local(async move {
            match fetch_text(&url).await.and_then(|text| {
                decode_layer(&text, api::WireFormat::TopoJson)
            }) {
                Ok(set) => {
                    let complete = with_state(|state| {
                        let mut s = state.borrow_mut();
                        if !s.generations.is_current(generation) {
                            console_log(&format!("dropping superseded {slot} reload"));
                            return false;
                        }
                        let Some(join) = s.reload_join.as_mut() else {
                            return false;
                        };
                        if let Err(err) = join.resolve(slot, set) {
                            console_warn(&format!("reload join: {err}"));
                            return false;
                        }
                        join.is_complete()
                    });
                    if complete {
                        apply_reload();
                    }
                }
                Err(err) => {
                    // Abandon this reload; the previous layers stay intact.
                    let abandoned = with_state(|state| {
                        let mut s = state.borrow_mut();
                        if s.generations.is_current(generation) {
                            s.reload_join = None;
                            true
                        } else {
                            false
                        }
                    });
                    if abandoned {
                        notice(&format!("aggregate reload failed: {err}"));
                    }
                }
            }
        });
    }
}

fn apply_reload() {
    let results = with_state(|state| {
        let mut s = state.borrow_mut();
        s.reload_join.take().and_then(LoadJoin::finish)
    });
    let Some(mut results) = results else {
        return;
    };

    with_state(|state| {
        let mut s = state.borrow_mut();
        for level in RegionLevel::ALL {
            let set = results.remove(level.as_wire()).flatten();
            let layer = build_aggregate_layer(level, set.as_ref());
            s.aggregates.insert(level, layer);
        }
        let AppState {
            aggregates,
            reports,
            controller,
            ..
        } = &mut *s;
        for layer in aggregates.values_mut() {
            layer.recount(reports);
        }
        // Fresh polygons mean fresh bindings; stale selection dies with them.
        *controller = InteractionController::new();
    });

    rebuild_table();
    apply_pending_dims();
    show_hover_prompt();
    redraw();
}

// ---------------------------------------------------------------------------
// Initial loads

fn start_session_load() {
    let url = with_state(|state| session_url(&state.borrow().config));
    spawn_local(async move {
        match fetch_text(&url).await {
            Ok(text) => match serde_json::from_str::<UserSession>(&text) {
                Ok(session) => {
                    with_state(|state| state.borrow_mut().session = session);
                    // Edit controls may need to appear.
                    rerender_table();
                }
                Err(err) => console_warn(&format!("session payload malformed: {err}")),
            },
            // Read-only view; not worth a visible notice.
            Err(err) => console_warn(&format!("session fetch failed: {err}")),
        }
    });
}

fn start_primary_load() {
    with_state(|state| {
        state.borrow_mut().primary_join = Some(LoadJoin::new(&["reports", "subdistrict"]));
    });

    let (reports_url, aggregates_url) = with_state(|state| {
        let s = state.borrow();
        (
            Endpoint::Reports {
                status: ReportStatus::Confirmed,
            }
            .url(&s.config),
            Endpoint::Aggregates {
                level: RegionLevel::Subdistrict,
                window: s.window,
            }
            .url(&s.config),
        )
    });

    spawn_fetch_into_primary("reports", reports_url);
    spawn_fetch_into_primary("subdistrict", aggregates_url);
}

fn spawn_fetch_into_primary(slot: &'static str, url: String) {
    spawn_local(async move {
        let set = match fetch_text(&url)
            .await
            .and_then(|text| decode_layer(&text, api::WireFormat::TopoJson))
        {
            Ok(set) => set,
            Err(err) => {
                notice(&format!("{slot} load failed: {err}"));
                None
            }
        };
        let complete = with_state(|state| {
            let mut s = state.borrow_mut();
            let Some(join) = s.primary_join.as_mut() else {
                return false;
            };
            if let Err(err) = join.resolve(slot, set) {
                console_warn(&format!("primary join: {err}"));
                return false;
            }
            join.is_complete()
        });
        if complete {
            finish_primary_load();
        }
    });
}

fn finish_primary_load() {
    let results = with_state(|state| {
        let mut s = state.borrow_mut();
        s.primary_join.take().and_then(LoadJoin::finish)
    });
    let Some(mut results) = results else {
        return;
    };

    with_state(|state| {
        let mut s = state.borrow_mut();

        let reports = results
            .remove("reports")
            .flatten()
            .map(|set| build_reports(&set))
            .unwrap_or_default();
        s.report_layer = ReportLayer::build(&reports);
        s.reports = reports;

        let subdistrict = build_aggregate_layer(
            RegionLevel::Subdistrict,
            results.remove("subdistrict").flatten().as_ref(),
        );
        s.aggregates.insert(RegionLevel::Subdistrict, subdistrict);

        let AppState {
            aggregates,
            reports,
            ..
        } = &mut *s;
        for layer in aggregates.values_mut() {
            layer.recount(reports);
        }
    });

    update_reports_badge();
    redraw();
    focus_url_report();
    start_secondary_load();
}

fn start_secondary_load() {
    with_state(|state| {
        state.borrow_mut().table_join = Some(LoadJoin::new(&["village", "rw"]));
    });

    for level in [RegionLevel::Village, RegionLevel::Neighbourhood] {
        let slot = level.as_wire();
        let url = with_state(|state| {
            let s = state.borrow();
            Endpoint::Aggregates {
                level,
                window: s.window,
            }
            .url(&s.config)
        });
        spawn_local(async move {
            let set = match fetch_text(&url)
                .await
                .and_then(|text| decode_layer(&text, api::WireFormat::TopoJson))
            {
                Ok(set) => set,
                Err(err) => {
                    notice(&format!("{slot} aggregates load failed: {err}"));
                    None
                }
            };
            let complete = with_state(|state| {
                let mut s = state.borrow_mut();
                let Some(join) = s.table_join.as_mut() else {
                    return false;
                };
                if let Err(err) = join.resolve(slot, set) {
                    console_warn(&format!("table join: {err}"));
                    return false;
                }
                join.is_complete()
            });
            if complete {
                finish_table_load();
            }
        });
    }

    for kind in InfrastructureKind::ALL {
        let url = with_state(|state| {
            Endpoint::Infrastructure { kind }.url(&state.borrow().config)
        });
        spawn_local(async move {
            match fetch_text(&url)
                .await
                .and_then(|text| decode_layer(&text, api::WireFormat::TopoJson))
            {
                Ok(set) => {
                    let layer = set
                        .as_ref()
                        .map(|set| build_infrastructure_layer(kind, set))
                        .unwrap_or_else(|| InfrastructureLayer::empty(kind));
                    with_state(|state| {
                        let mut s = state.borrow_mut();
                        s.infrastructure.retain(|l| l.kind() != kind);
                        s.infrastructure.push(layer);
                    });
                    redraw();
                }
                // Secondary layers fail soft: the map keeps working.
                Err(err) => notice(&format!("{} load failed: {err}", kind.as_wire())),
            }
        });
    }

    let dims_url = with_state(|state| {
        Endpoint::DimsStates {
            level: RegionLevel::Neighbourhood,
        }
        .url(&state.borrow().config)
    });
    spawn_local(async move {
        match fetch_text(&dims_url)
            .await
            .and_then(|text| decode_layer(&text, api::WireFormat::TopoJson))
        {
            Ok(Some(set)) => {
                with_state(|state| state.borrow_mut().pending_dims = Some(set));
                apply_pending_dims();
            }
            Ok(None) => {}
            Err(err) => notice(&format!("DIMS overlay load failed: {err}")),
        }
    });
}

fn finish_table_load() {
    let results = with_state(|state| {
        let mut s = state.borrow_mut();
        s.table_join.take().and_then(LoadJoin::finish)
    });
    let Some(mut results) = results else {
        return;
    };

    with_state(|state| {
        let mut s = state.borrow_mut();
        for level in [RegionLevel::Village, RegionLevel::Neighbourhood] {
            let set = results.remove(level.as_wire()).flatten();
            let layer = build_aggregate_layer(level, set.as_ref());
            s.aggregates.insert(level, layer);
        }
        let AppState {
            aggregates,
            reports,
            ..
        } = &mut *s;
        for layer in aggregates.values_mut() {
            layer.recount(reports);
        }
    });

    rebuild_table();
    apply_pending_dims();
    redraw();
}

/// Rebuilds the table model and bindings atomically from the current
/// village/neighbourhood layers, then re-renders.
fn rebuild_table() {
    with_state(|state| {
        let mut s = state.borrow_mut();
        let villages = s
            .aggregates
            .get(&RegionLevel::Village)
            .cloned()
            .unwrap_or_else(|| AggregateLayer::empty(RegionLevel::Village));
        let neighbourhoods = s
            .aggregates
            .get(&RegionLevel::Neighbourhood)
            .cloned()
            .unwrap_or_else(|| AggregateLayer::empty(RegionLevel::Neighbourhood));
        s.table = TableModel::build(&villages, &neighbourhoods);
        s.severity_legend = SeverityLegend::tally(neighbourhoods.regions());
    });
    rerender_table();
    refresh_severity_legend();
}

fn apply_pending_dims() {
    let applied = with_state(|state| {
        let mut s = state.borrow_mut();
        let Some(set) = s.pending_dims.clone() else {
            return false;
        };
        let Some(layer) = s.aggregates.get_mut(&RegionLevel::Neighbourhood) else {
            return false;
        };
        if layer.is_empty() {
            return false;
        }
        let mut applied = false;
        for feature in &set.features {
            let Some(pkey) = feature
                .properties
                .get("pkey")
                .and_then(serde_json::Value::as_u64)
            else {
                continue;
            };
            let Some(value) = feature
                .properties
                .get("state")
                .and_then(serde_json::Value::as_i64)
            else {
                continue;
            };
            applied |= layer.set_dims_state(RegionId(pkey), value);
        }
        applied
    });
    if applied {
        rerender_table();
    }
}

// ---------------------------------------------------------------------------
// URL report focus

fn url_report_param() -> Option<ReportKey> {
    let search = web_sys::window()?.location().search().ok()?;
    let params = web_sys::UrlSearchParams::new_with_str(&search).ok()?;
    let raw = params.get("report")?;
    match raw.parse::<u64>() {
        Ok(id) => Some(ReportKey(id)),
        Err(_) => {
            console_warn(&format!("invalid report id parameter: '{raw}'"));
            None
        }
    }
}

fn focus_url_report() {
    let pending = with_state(|state| {
        let s = state.borrow();
        s.pending_focus.map(|key| {
            (
                key,
                s.report_layer.contains(key),
                Endpoint::Report { id: key }.url(&s.config),
            )
        })
    });
    let Some((key, already_loaded, url)) = pending else {
        return;
    };

    if already_loaded {
        with_state(|state| state.borrow_mut().pending_focus = None);
        focus_report(key);
        return;
    }

    // Not in the loaded set: exactly one fetch for this report, then center.
    spawn_local(async move {
        match fetch_text(&url)
            .await
            .and_then(|text| decode_layer(&text, api::WireFormat::GeoJson))
        {
            Ok(Some(set)) => {
                let report = set
                    .features
                    .first()
                    .and_then(|f| Report::from_feature(f, ReportStatus::Confirmed).ok());
                let Some(report) = report else {
                    console_warn(&format!("report {key} payload malformed"));
                    return;
                };
                with_state(|state| {
                    let mut s = state.borrow_mut();
                    s.report_layer.insert(&report);
                    s.reports.push(report);
                    s.pending_focus = None;
                });
                update_reports_badge();
                focus_report(key);
            }
            Ok(None) => console_log(&format!("report {key} not found")),
            Err(err) => notice(&format!("report {key} load failed: {err}")),
        }
    });
}

fn focus_report(key: ReportKey) {
    let popup = with_state(|state| {
        let mut s = state.borrow_mut();
        let Some(marker) = s.report_layer.get(key) else {
            return None;
        };
        let location = marker.location;
        let popup = marker.popup.clone();
        s.reports_visible = true;
        s.camera.center = location;
        s.camera.zoom = 17;
        Some(popup)
    });
    if let Some(popup) = popup {
        redraw();
        dom::show_popup(&popup);
    }
}

// ---------------------------------------------------------------------------
// Effects and rendering

fn run_effects(effects: Vec<Effect>) {
    let mut redraw_needed = false;
    for effect in effects {
        match effect {
            Effect::HighlightLayer(_) | Effect::SelectLayer(_) | Effect::RestyleLayer(_) => {
                redraw_needed = true;
            }
            Effect::SetSelected { region, selected } => {
                with_state(|state| {
                    let mut s = state.borrow_mut();
                    for layer in s.aggregates.values_mut() {
                        layer.set_selected(region, selected);
                    }
                });
            }
            Effect::HighlightRow(row) => dom::set_row_highlight(row, true),
            Effect::ClearRowHighlight(row) => dom::set_row_highlight(row, false),
            Effect::ScrollRowIntoView(row) => dom::scroll_row_into_view(row),
            Effect::ExpandParentRow(row) => {
                let changed = with_state(|state| state.borrow_mut().table.expand(row));
                if changed {
                    rerender_table();
                }
            }
            Effect::ShowRegionInfo(region) => show_region_info(region),
            Effect::ClearInfo => show_hover_prompt(),
            Effect::PersistState { region, state } => persist_state(region, state),
            Effect::RefreshLegend => refresh_severity_legend(),
        }
    }
    if redraw_needed {
        redraw();
    }
}

fn redraw() {
    with_state(|state| {
        let s = state.borrow();
        let Some(ctx) = s.ctx.as_ref() else {
            return;
        };
        let (hovered, selected) = match s.controller.state() {
            InteractionState::Idle => (None, None),
            InteractionState::Hover(region) => (Some(region), None),
            InteractionState::Selected(region) => (None, Some(region)),
        };
        // Reports and aggregates swap as baselayers: polygons render only
        // while the point layer is off.
        let aggregates = (!s.reports_visible)
            .then(|| s.aggregates.get(&level_for_zoom(s.camera.zoom)))
            .flatten();
        draw_scene(
            ctx,
            &s.camera,
            aggregates,
            &s.infrastructure,
            s.reports_visible.then_some(&s.report_layer),
            hovered,
            selected,
        );
    });
}

fn rerender_table() {
    let (html, highlight) = with_state(|state| {
        let s = state.borrow();
        let empty_villages = AggregateLayer::empty(RegionLevel::Village);
        let empty_neighbourhoods = AggregateLayer::empty(RegionLevel::Neighbourhood);
        let villages = s
            .aggregates
            .get(&RegionLevel::Village)
            .unwrap_or(&empty_villages);
        let neighbourhoods = s
            .aggregates
            .get(&RegionLevel::Neighbourhood)
            .unwrap_or(&empty_neighbourhoods);
        let html = dom::table_html(&s.table, villages, neighbourhoods, &s.session, s.language);

        let active = match s.controller.state() {
            InteractionState::Idle => None,
            InteractionState::Hover(region) | InteractionState::Selected(region) => {
                s.table.row_for_region(region)
            }
        };
        (html, active)
    });

    dom::set_inner_html("table-body", &html);
    // innerHTML replacement dropped any highlight class; restore it.
    if let Some(row) = highlight {
        dom::set_row_highlight(row, true);
    }
}

fn render_static_controls() {
    let (language, window) = with_state(|state| {
        let s = state.borrow();
        (s.language, s.window)
    });
    dom::set_inner_html("count-legend", &dom::count_legend_html(language));
    dom::set_inner_html("window-control", &dom::window_control_html(window, language));
    show_hover_prompt();
}

fn refresh_severity_legend() {
    with_state(|state| {
        let mut s = state.borrow_mut();
        if let Some(layer) = s.aggregates.get(&RegionLevel::Neighbourhood) {
            s.severity_legend = SeverityLegend::tally(layer.regions());
        }
    });
    let html = with_state(|state| {
        let s = state.borrow();
        dom::severity_legend_html(&s.severity_legend, s.language)
    });
    dom::set_inner_html("severity-legend", &html);
}

fn show_region_info(region: RegionId) {
    let html = with_state(|state| {
        let s = state.borrow();
        find_region(&s, region).map(|r| dom::info_html(r, labels(s.language)))
    });
    if let Some(html) = html {
        dom::set_inner_html("info-box", &html);
    }
}

fn show_hover_prompt() {
    let prompt = with_state(|state| labels(state.borrow().language).hover_prompt);
    dom::set_text("info-box", prompt);
}

fn update_reports_badge() {
    let count = with_state(|state| state.borrow().report_layer.len());
    dom::set_text("reports-badge", &count.to_string());
}

fn clear_hover() {
    let effects = with_state(|state| {
        let mut s = state.borrow_mut();
        let AppState {
            controller, table, ..
        } = &mut *s;
        match controller.state() {
            InteractionState::Hover(prev) => controller.pointer_leave(prev, table),
            _ => Vec::new(),
        }
    });
    run_effects(effects);
}

fn region_under(x_px: f64, y_px: f64) -> Option<RegionId> {
    with_state(|state| {
        let s = state.borrow();
        if s.reports_visible {
            return None;
        }
        let point = s.camera.to_geo(x_px, y_px);
        s.aggregates
            .get(&level_for_zoom(s.camera.zoom))
            .and_then(|layer| layer.region_at(point))
            .map(|region| region.pkey)
    })
}

fn find_region<'a>(s: &'a AppState, pkey: RegionId) -> Option<&'a AggregateRegion> {
    s.aggregates.values().find_map(|layer| layer.region(pkey))
}

// ---------------------------------------------------------------------------
// Network plumbing

async fn fetch_text(url: &str) -> Result<String, ApiError> {
    let response = Request::get(url)
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    if !response.ok() {
        return Err(ApiError::Http {
            status: response.status(),
        });
    }
    response
        .text()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))
}

fn persist_state(region: RegionId, state_value: FloodState) {
    let (url, body) = with_state(|state| {
        let s = state.borrow();
        let body = serde_json::to_string(&StateUpdate::new(state_value)).unwrap_or_default();
        (state_update_url(&s.config, region), body)
    });

    spawn_local(async move {
        let request = Request::put(&url)
            .header("content-type", "application/json")
            .body(body);
        let outcome = match request {
            Ok(request) => request
                .send()
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))
                .and_then(|resp| {
                    if resp.ok() {
                        Ok(())
                    } else {
                        Err(ApiError::Http {
                            status: resp.status(),
                        })
                    }
                }),
            Err(e) => Err(ApiError::Transport(e.to_string())),
        };
        if let Err(err) = outcome {
            notice(&format!("saving flood state for region {region} failed: {err}"));
        }
    });
}

fn notice(message: &str) {
    console_warn(message);
    dom::show_notice(message);
}

// ---------------------------------------------------------------------------
// Feature-set builders: invalid features are logged and skipped so one bad
// row cannot take a whole layer down.

fn build_reports(set: &FeatureSet) -> Vec<Report> {
    let mut reports = Vec::with_capacity(set.len());
    for feature in &set.features {
        match Report::from_feature(feature, ReportStatus::Confirmed) {
            Ok(report) => reports.push(report),
            Err(err) => console_warn(&format!("skipping malformed report: {err}")),
        }
    }
    reports
}

fn build_aggregate_layer(level: RegionLevel, set: Option<&FeatureSet>) -> AggregateLayer {
    let Some(set) = set else {
        return AggregateLayer::empty(level);
    };
    let mut regions = Vec::with_capacity(set.len());
    for feature in &set.features {
        match AggregateRegion::from_feature(feature, level) {
            Ok(region) => regions.push(region),
            Err(err) => console_warn(&format!(
                "skipping malformed {} region: {err}",
                level.as_wire()
            )),
        }
    }
    AggregateLayer::build(level, regions)
}

fn build_infrastructure_layer(kind: InfrastructureKind, set: &FeatureSet) -> InfrastructureLayer {
    match InfrastructureLayer::from_features(kind, set) {
        Ok(layer) => layer,
        Err(err) => {
            console_warn(&format!(
                "skipping malformed {} layer: {err}",
                kind.as_wire()
            ));
            InfrastructureLayer::empty(kind)
        }
    }
}

fn infrastructure_popup_html(feature: &model::InfrastructureFeature) -> String {
    use layers::popup::escape_html;

    let mut html = format!(
        "<div class=\"popup-infrastructure\"><h5>{}</h5>",
        escape_html(&feature.name)
    );
    if let Some(latest) = feature.observations.last() {
        html.push_str(&format!(
            "<p>{} cm · {}</p>",
            latest.depth_cm,
            escape_html(&latest.measured_at)
        ));
    }
    html.push_str("</div>");
    html
}
