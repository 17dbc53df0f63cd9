use model::{FloodState, InfrastructureKind, ReportSource, ReportStatus};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PolygonStyle {
    pub fill_color: &'static str,
    pub fill_opacity: f64,
    pub stroke_color: &'static str,
    pub stroke_width: f64,
    pub stroke_opacity: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerStyle {
    pub radius_px: f64,
    pub fill_color: &'static str,
    pub fill_opacity: f64,
    pub stroke_color: &'static str,
    pub stroke_width: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathStyle {
    pub color: &'static str,
    pub width: f64,
    pub opacity: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IconStyle {
    /// Asset path relative to the site root.
    pub icon_url: &'static str,
    pub size_px: [f64; 2],
    pub anchor_px: [f64; 2],
}

/// How an infrastructure layer draws.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InfrastructureStyle {
    Path(PathStyle),
    Icon(IconStyle),
}

/// Region fill for a recorded severity state.
///
/// Deterministic and distinct per state; `Unset` renders fully transparent
/// so the basemap shows through where nothing has been recorded.
pub fn outline_style(state: FloodState) -> PolygonStyle {
    let (fill_color, fill_opacity) = match state {
        FloodState::Unset => ("#000000", 0.0),
        FloodState::Caution => ("#a0a9f7", 0.7),
        FloodState::Minor => ("#ffff00", 0.7),
        FloodState::Moderate => ("#ff8300", 0.7),
        FloodState::Severe => ("#cc2a41", 0.7),
    };
    PolygonStyle {
        fill_color,
        fill_opacity,
        // Borders stay off at rest; highlighting turns them on.
        stroke_color: "#ffffff",
        stroke_width: 0.0,
        stroke_opacity: 0.0,
    }
}

/// Hover highlight: the region keeps its severity fill and gains a border.
pub fn highlight_style(state: FloodState) -> PolygonStyle {
    PolygonStyle {
        stroke_color: "#333333",
        stroke_width: 5.0,
        stroke_opacity: 1.0,
        ..outline_style(state)
    }
}

/// Selection is a stronger, frozen variant of the hover highlight.
pub fn selected_style(state: FloodState) -> PolygonStyle {
    PolygonStyle {
        stroke_color: "#111111",
        stroke_width: 5.0,
        stroke_opacity: 1.0,
        ..outline_style(state)
    }
}

pub fn marker_style(source: ReportSource, status: ReportStatus) -> MarkerStyle {
    let fill_color = match source {
        ReportSource::Twitter => "#1da1f2",
        ReportSource::Detik => "#ff6200",
        ReportSource::Web => "#2f63b5",
    };
    match status {
        ReportStatus::Confirmed => MarkerStyle {
            radius_px: 7.0,
            fill_color,
            fill_opacity: 0.8,
            stroke_color: "#000000",
            stroke_width: 1.0,
        },
        ReportStatus::Unconfirmed => MarkerStyle {
            radius_px: 5.0,
            fill_color,
            fill_opacity: 0.4,
            stroke_color: "#666666",
            stroke_width: 1.0,
        },
    }
}

pub fn infrastructure_style(kind: InfrastructureKind) -> InfrastructureStyle {
    match kind {
        InfrastructureKind::Waterway => InfrastructureStyle::Path(PathStyle {
            color: "#3960ac",
            width: 2.5,
            opacity: 1.0,
        }),
        InfrastructureKind::Pump => InfrastructureStyle::Icon(IconStyle {
            icon_url: "img/pump.svg",
            size_px: [28.0, 28.0],
            anchor_px: [14.0, 14.0],
        }),
        InfrastructureKind::Floodgate => InfrastructureStyle::Icon(IconStyle {
            icon_url: "img/floodgate.svg",
            size_px: [28.0, 28.0],
            anchor_px: [14.0, 14.0],
        }),
        InfrastructureKind::Gauge => InfrastructureStyle::Icon(IconStyle {
            icon_url: "img/gauge.svg",
            size_px: [28.0, 28.0],
            anchor_px: [14.0, 14.0],
        }),
    }
}

/// Graded report-count ramp for the hover legend (Color Brewer reds).
pub const COUNT_GRADES: [u32; 8] = [0, 1, 5, 10, 15, 20, 25, 30];

pub fn count_color(count: u32) -> &'static str {
    match count {
        c if c > 30 => "#800026",
        c if c > 25 => "#bd0026",
        c if c > 20 => "#e31a1c",
        c if c > 15 => "#fc4e2a",
        c if c > 10 => "#fd8d3c",
        c if c > 5 => "#feb24c",
        c if c > 1 => "#fed976",
        _ => "#ffeda0",
    }
}

#[cfg(test)]
mod tests {
    use super::{count_color, highlight_style, marker_style, outline_style};
    use model::{FloodState, ReportSource, ReportStatus};

    #[test]
    fn severity_fills_are_distinct_and_unset_is_transparent() {
        let styles: Vec<_> = FloodState::ALL.iter().map(|s| outline_style(*s)).collect();
        assert_eq!(styles[0].fill_opacity, 0.0);
        for s in &styles[1..] {
            assert!(s.fill_opacity > 0.0);
        }
        for (i, a) in styles.iter().enumerate() {
            for b in styles.iter().skip(i + 1) {
                assert_ne!((a.fill_color, a.fill_opacity), (b.fill_color, b.fill_opacity));
            }
        }
    }

    #[test]
    fn outline_style_is_deterministic() {
        assert_eq!(
            outline_style(FloodState::Moderate),
            outline_style(FloodState::Moderate)
        );
    }

    #[test]
    fn highlight_keeps_the_severity_fill() {
        let base = outline_style(FloodState::Severe);
        let hl = highlight_style(FloodState::Severe);
        assert_eq!(hl.fill_color, base.fill_color);
        assert!(hl.stroke_width > 0.0);
    }

    #[test]
    fn confirmed_markers_are_larger_than_unconfirmed() {
        let c = marker_style(ReportSource::Twitter, ReportStatus::Confirmed);
        let u = marker_style(ReportSource::Twitter, ReportStatus::Unconfirmed);
        assert!(c.radius_px > u.radius_px);
        assert_eq!(c.fill_color, u.fill_color);
    }

    #[test]
    fn count_ramp_darkens_with_count() {
        assert_eq!(count_color(0), count_color(1));
        assert_ne!(count_color(1), count_color(2));
        assert_eq!(count_color(31), "#800026");
    }
}
