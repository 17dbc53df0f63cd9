//! Point-in-polygon tests used for report counting and pointer hit testing.

use formats::{GeoPoint, Geometry};

/// Even-odd ray cast against one ring. Degenerate rings contain nothing.
pub fn point_in_ring(point: GeoPoint, ring: &[GeoPoint]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[j];
        if (a.lat_deg > point.lat_deg) != (b.lat_deg > point.lat_deg) {
            let t = (point.lat_deg - a.lat_deg) / (b.lat_deg - a.lat_deg);
            let lon = a.lon_deg + t * (b.lon_deg - a.lon_deg);
            if point.lon_deg < lon {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Containment for polygonal geometry.
///
/// Ring parity makes holes work: a point inside the outer ring and inside a
/// hole crosses both, which cancels out. Non-polygon geometry contains
/// nothing.
pub fn geometry_contains(geometry: &Geometry, point: GeoPoint) -> bool {
    match geometry {
        Geometry::Polygon(rings) => rings_contain(rings, point),
        Geometry::MultiPolygon(polys) => polys.iter().any(|rings| rings_contain(rings, point)),
        _ => false,
    }
}

fn rings_contain(rings: &[Vec<GeoPoint>], point: GeoPoint) -> bool {
    rings
        .iter()
        .fold(false, |acc, ring| acc ^ point_in_ring(point, ring))
}

#[cfg(test)]
mod tests {
    use super::{geometry_contains, point_in_ring};
    use formats::{GeoPoint, Geometry};

    fn ring(points: &[(f64, f64)]) -> Vec<GeoPoint> {
        points.iter().map(|(x, y)| GeoPoint::new(*x, *y)).collect()
    }

    fn unit_square() -> Vec<GeoPoint> {
        ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)])
    }

    #[test]
    fn square_contains_its_interior() {
        assert!(point_in_ring(GeoPoint::new(2.0, 2.0), &unit_square()));
        assert!(!point_in_ring(GeoPoint::new(5.0, 2.0), &unit_square()));
        assert!(!point_in_ring(GeoPoint::new(-1.0, 2.0), &unit_square()));
    }

    #[test]
    fn holes_exclude_their_interior() {
        let geom = Geometry::Polygon(vec![
            unit_square(),
            ring(&[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0), (1.0, 1.0)]),
        ]);
        assert!(geometry_contains(&geom, GeoPoint::new(0.5, 0.5)));
        assert!(!geometry_contains(&geom, GeoPoint::new(2.0, 2.0)));
    }

    #[test]
    fn multipolygons_check_every_part() {
        let geom = Geometry::MultiPolygon(vec![
            vec![unit_square()],
            vec![ring(&[(10.0, 10.0), (12.0, 10.0), (12.0, 12.0), (10.0, 12.0), (10.0, 10.0)])],
        ]);
        assert!(geometry_contains(&geom, GeoPoint::new(11.0, 11.0)));
        assert!(geometry_contains(&geom, GeoPoint::new(1.0, 1.0)));
        assert!(!geometry_contains(&geom, GeoPoint::new(7.0, 7.0)));
    }

    #[test]
    fn lines_contain_nothing() {
        let geom = Geometry::LineString(ring(&[(0.0, 0.0), (4.0, 4.0)]));
        assert!(!geometry_contains(&geom, GeoPoint::new(2.0, 2.0)));
    }
}
