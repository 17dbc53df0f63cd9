//! HTML generation for the table, info box, and legends, plus thin DOM
//! update helpers.
//!
//! The page provides the containers; we own their contents:
//! `#table-body`, `#info-box`, `#count-legend`, `#severity-legend`,
//! `#window-control`, `#reports-badge`, `#notice`, `#popup`. Table rows
//! carry `id="row-<n>"` and `data-row="<n>"`; the host page delegates row
//! events back into the exported functions with that row number.

use web_sys::{Document, Element};

use crate::i18n::{Labels, Language, labels, severity_label};
use api::TimeWindow;
use layers::{AggregateLayer, SeverityLegend, count_legend, popup::escape_html};
use model::{AggregateRegion, FloodState, UserSession};
use sync::{RowId, TableModel};

pub fn table_html(
    table: &TableModel,
    villages: &AggregateLayer,
    neighbourhoods: &AggregateLayer,
    session: &UserSession,
    language: Language,
) -> String {
    let mut html = String::new();

    for parent in table.parents() {
        let Some(region) = villages.region(parent.region) else {
            continue;
        };
        parent_row_html(&mut html, parent.row, region, table.is_expanded(parent.row));

        let expanded = table.is_expanded(parent.row);
        for child in table.children_of(parent.row) {
            let Some(region) = neighbourhoods.region(child.region) else {
                continue;
            };
            child_row_html(&mut html, child.row, region, expanded, session, language);
        }
    }

    // Orphan sub-regions render at the top level, always visible.
    for child in table.children() {
        if child.parent.is_some() {
            continue;
        }
        let Some(region) = neighbourhoods.region(child.region) else {
            continue;
        };
        child_row_html(&mut html, child.row, region, true, session, language);
    }

    html
}

fn parent_row_html(html: &mut String, row: RowId, region: &AggregateRegion, expanded: bool) {
    let toggle = if expanded { "-" } else { "+" };
    html.push_str(&format!(
        "<tr class=\"village\" id=\"row-{n}\" data-row=\"{n}\">\
         <td><a class=\"row-toggle\" data-row=\"{n}\">{toggle}</a></td>\
         <td>{pkey}</td>\
         <td>{name}</td>\
         <td>{count}</td>\
         <td>{dims}</td>\
         <td></td>\
         </tr>",
        n = row.0,
        pkey = region.pkey,
        name = escape_html(&region.name),
        count = region.count,
        dims = dims_cell(region),
    ));
}

fn child_row_html(
    html: &mut String,
    row: RowId,
    region: &AggregateRegion,
    visible: bool,
    session: &UserSession,
    language: Language,
) {
    let display = if visible { "" } else { " style=\"display:none\"" };
    html.push_str(&format!(
        "<tr class=\"rw\" id=\"row-{n}\" data-row=\"{n}\"{display}>\
         <td></td>\
         <td>{pkey}</td>\
         <td>{name}</td>\
         <td>{count}</td>\
         <td>{dims}</td>\
         <td>{state}</td>\
         </tr>",
        n = row.0,
        pkey = region.pkey,
        name = escape_html(&region.name),
        count = region.count,
        dims = dims_cell(region),
        state = state_cell(row, region, session, language),
    ));
}

fn dims_cell(region: &AggregateRegion) -> String {
    region
        .dims_state
        .map(|v| v.to_string())
        .unwrap_or_default()
}

fn state_cell(
    row: RowId,
    region: &AggregateRegion,
    session: &UserSession,
    language: Language,
) -> String {
    if !session.can_edit() {
        return severity_label(language, region.state).to_string();
    }

    let mut select = format!("<select class=\"state-select\" data-row=\"{}\">", row.0);
    for state in FloodState::ALL {
        let selected = if state == region.state { " selected" } else { "" };
        select.push_str(&format!(
            "<option value=\"{}\"{selected}>{}</option>",
            state.code(),
            severity_label(language, state)
        ));
    }
    select.push_str("</select>");
    select
}

pub fn info_html(region: &AggregateRegion, labels: &Labels) -> String {
    format!(
        "{}: {} {}",
        escape_html(&region.name),
        region.count,
        labels.reports_suffix
    )
}

pub fn count_legend_html(language: Language) -> String {
    let labels = labels(language);
    let entries = count_legend();

    let mut html = format!("{}<br>", labels.count_legend_title);
    for entry in &entries {
        html.push_str(&format!(
            "<i class=\"color\" style=\"background:{}\"></i>",
            entry.color
        ));
    }
    html.push_str("<br>");
    for entry in &entries[..entries.len() - 1] {
        html.push_str(&format!("<span class=\"number\">{}</span>", entry.grade));
    }
    html.push_str(&format!(
        "<span class=\"number\">{}+</span>",
        entries[entries.len() - 1].grade
    ));
    html
}

/// Buttons for the aggregation time-window control. The page delegates
/// clicks on `data-hours` back into `set_time_window`.
pub fn window_control_html(active: TimeWindow, language: Language) -> String {
    let labels = labels(language);
    let mut html = String::new();
    for (window, label) in TimeWindow::ALL.into_iter().zip(labels.window_hours) {
        let active_class = if window == active { " active" } else { "" };
        html.push_str(&format!(
            "<button class=\"btn{active_class}\" data-hours=\"{}\">{label}</button>",
            window.hours()
        ));
    }
    html
}

pub fn severity_legend_html(legend: &SeverityLegend, language: Language) -> String {
    let mut html = format!("{}<br>", labels(language).severity_legend_title);
    for (state, count) in legend.entries() {
        let style = layers::outline_style(state);
        html.push_str(&format!(
            "<div class=\"legend-row\"><i class=\"color\" style=\"background:{};opacity:{}\"></i>\
             <span>{}</span><span class=\"count\">{}</span></div>",
            style.fill_color,
            style.fill_opacity,
            severity_label(language, state),
            count
        ));
    }
    html
}

// The helpers below touch the live page and are no-ops when an element is
// missing, so a stripped-down embed cannot crash the map.

pub fn document() -> Option<Document> {
    web_sys::window()?.document()
}

pub fn element_by_id(id: &str) -> Option<Element> {
    document()?.get_element_by_id(id)
}

pub fn set_inner_html(id: &str, html: &str) {
    if let Some(el) = element_by_id(id) {
        el.set_inner_html(html);
    }
}

pub fn set_text(id: &str, text: &str) {
    if let Some(el) = element_by_id(id) {
        el.set_text_content(Some(text));
    }
}

pub fn row_element(row: RowId) -> Option<Element> {
    element_by_id(&format!("row-{}", row.0))
}

pub fn set_row_highlight(row: RowId, on: bool) {
    let Some(el) = row_element(row) else {
        return;
    };
    let classes = el.class_list();
    let _ = if on {
        classes.add_1("highlighted")
    } else {
        classes.remove_1("highlighted")
    };
}

pub fn scroll_row_into_view(row: RowId) {
    if let Some(el) = row_element(row) {
        el.scroll_into_view();
    }
}

pub fn show_notice(message: &str) {
    if let Some(el) = element_by_id("notice") {
        el.set_text_content(Some(message));
        let _ = el.class_list().add_1("visible");
    }
}

pub fn show_popup(html: &str) {
    if let Some(el) = element_by_id("popup") {
        el.set_inner_html(html);
        let _ = el.class_list().add_1("visible");
    }
}

pub fn hide_popup() {
    if let Some(el) = element_by_id("popup") {
        el.set_inner_html("");
        let _ = el.class_list().remove_1("visible");
    }
}
