use super::point::Point;
use super::rect::Rect;
use crate::error::RouteError;

const GEOM_EPS: f64 = 1e-9;

/// Closed polygon ring. The last vertex connects back to the first implicitly.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    points: Vec<Point<f64>>,
}

impl Polygon {
    pub fn new(points: Vec<Point<f64>>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point<f64>] {
        &self.points
    }

    pub fn edges(&self) -> impl Iterator<Item = (Point<f64>, Point<f64>)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::bounding(&self.points)
    }

    /// Rejects degenerate rings and self-intersecting outlines.
    pub fn validate(&self) -> Result<(), RouteError> {
        let n = self.points.len();
        if n < 3 {
            return Err(RouteError::InvalidGeometry(format!(
                "keep-out outline has {} vertices, need at least 3",
                n
            )));
        }
        for (a, b) in self.edges() {
            if a.distance(b) < GEOM_EPS {
                return Err(RouteError::InvalidGeometry(
                    "keep-out outline contains a zero-length edge".to_string(),
                ));
            }
        }
        let edges: Vec<(Point<f64>, Point<f64>)> = self.edges().collect();
        for i in 0..n {
            for j in (i + 1)..n {
                // Neighbouring edges share a vertex and may not be tested.
                if j == i + 1 || (i == 0 && j == n - 1) {
                    continue;
                }
                let (a1, a2) = edges[i];
                let (b1, b2) = edges[j];
                if segments_properly_intersect(a1, a2, b1, b2)
                    || segments_collinear_overlap(a1, a2, b1, b2)
                {
                    return Err(RouteError::InvalidGeometry(format!(
                        "keep-out outline self-intersects between edge {} and edge {}",
                        i, j
                    )));
                }
            }
        }
        Ok(())
    }

    /// Crossing-number containment test. Points on the boundary count as inside.
    pub fn contains(&self, p: Point<f64>) -> bool {
        if self.distance_to_boundary(p) < GEOM_EPS {
            return true;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let t = (p.y - a.y) / (b.y - a.y);
                let x_cross = a.x + t * (b.x - a.x);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Minimum distance from a point to the polygon outline.
    pub fn distance_to_boundary(&self, p: Point<f64>) -> f64 {
        self.edges()
            .map(|(a, b)| point_segment_distance(p, a, b))
            .fold(f64::INFINITY, f64::min)
    }
}

/// Sign of the turn p -> q -> r: 0 collinear, 1 clockwise, 2 counter-clockwise.
pub fn orientation(p: Point<f64>, q: Point<f64>, r: Point<f64>) -> i32 {
    let val = (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y);
    if val.abs() < GEOM_EPS {
        return 0;
    }
    if val > 0.0 { 1 } else { 2 }
}

fn within_extent(p: Point<f64>, a: Point<f64>, b: Point<f64>) -> bool {
    p.x >= a.x.min(b.x) - GEOM_EPS
        && p.x <= a.x.max(b.x) + GEOM_EPS
        && p.y >= a.y.min(b.y) - GEOM_EPS
        && p.y <= a.y.max(b.y) + GEOM_EPS
}

/// True when the segments cross at a single interior point of both.
pub fn segments_properly_intersect(
    a1: Point<f64>,
    a2: Point<f64>,
    b1: Point<f64>,
    b2: Point<f64>,
) -> bool {
    let o1 = orientation(a1, a2, b1);
    let o2 = orientation(a1, a2, b2);
    let o3 = orientation(b1, b2, a1);
    let o4 = orientation(b1, b2, a2);
    o1 != o2 && o3 != o4 && o1 != 0 && o2 != 0 && o3 != 0 && o4 != 0
}

/// True when the segments lie on one line and their extents overlap in more
/// than a single point.
pub fn segments_collinear_overlap(
    a1: Point<f64>,
    a2: Point<f64>,
    b1: Point<f64>,
    b2: Point<f64>,
) -> bool {
    if orientation(a1, a2, b1) != 0 || orientation(a1, a2, b2) != 0 {
        return false;
    }
    let t_b1 = project_onto_line(a1, a2, b1);
    let t_b2 = project_onto_line(a1, a2, b2);
    let (b_min, b_max) = if t_b1 <= t_b2 { (t_b1, t_b2) } else { (t_b2, t_b1) };
    let len = a1.distance(a2);
    if len < GEOM_EPS {
        return within_extent(a1, b1, b2);
    }
    let overlap = b_max.min(1.0) - b_min.max(0.0);
    overlap * len > GEOM_EPS
}

/// Intersection point of two segments, if they cross (including endpoint touches).
pub fn segment_intersection_point(
    a1: Point<f64>,
    a2: Point<f64>,
    b1: Point<f64>,
    b2: Point<f64>,
) -> Option<Point<f64>> {
    let d1 = a2 - a1;
    let d2 = b2 - b1;
    let denom = -d2.x * d1.y + d1.x * d2.y;
    if denom.abs() < GEOM_EPS {
        return None;
    }
    let s = (-d1.y * (a1.x - b1.x) + d1.x * (a1.y - b1.y)) / denom;
    let t = (d2.x * (a1.y - b1.y) - d2.y * (a1.x - b1.x)) / denom;
    if (-GEOM_EPS..=1.0 + GEOM_EPS).contains(&s) && (-GEOM_EPS..=1.0 + GEOM_EPS).contains(&t) {
        return Some(Point::new(a1.x + t * d1.x, a1.y + t * d1.y));
    }
    None
}

/// Scalar parameter of p projected onto the line through a and b.
pub fn project_onto_line(a: Point<f64>, b: Point<f64>, p: Point<f64>) -> f64 {
    let d = b - a;
    let l2 = d.x * d.x + d.y * d.y;
    if l2 < GEOM_EPS * GEOM_EPS {
        return 0.0;
    }
    ((p.x - a.x) * d.x + (p.y - a.y) * d.y) / l2
}

pub fn point_segment_distance(p: Point<f64>, a: Point<f64>, b: Point<f64>) -> f64 {
    let t = project_onto_line(a, b, p).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y));
    p.distance(proj)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ])
    }

    #[test]
    fn contains_interior_and_boundary() {
        let poly = square();
        assert!(poly.contains(Point::new(2.0, 2.0)));
        assert!(poly.contains(Point::new(0.0, 2.0)));
        assert!(poly.contains(Point::new(4.0, 4.0)));
        assert!(!poly.contains(Point::new(5.0, 2.0)));
        assert!(!poly.contains(Point::new(-0.1, 2.0)));
    }

    #[test]
    fn validates_simple_ring() {
        assert!(square().validate().is_ok());
    }

    #[test]
    fn rejects_self_intersection() {
        let bowtie = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 4.0),
        ]);
        assert!(bowtie.validate().is_err());
    }

    #[test]
    fn rejects_degenerate_ring() {
        let line = Polygon::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        assert!(line.validate().is_err());
    }

    #[test]
    fn proper_crossing_detected() {
        assert!(segments_properly_intersect(
            Point::new(0.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(2.0, 0.0),
            Point::new(0.0, 2.0),
        ));
        // Shared endpoint is not a proper crossing.
        assert!(!segments_properly_intersect(
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
        ));
    }

    #[test]
    fn collinear_overlap_detected() {
        assert!(segments_collinear_overlap(
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(5.0, 0.0),
        ));
        // Touching end to end overlaps in a single point only.
        assert!(!segments_collinear_overlap(
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(5.0, 0.0),
        ));
    }

    #[test]
    fn boundary_distance() {
        let poly = square();
        assert!((poly.distance_to_boundary(Point::new(5.0, 2.0)) - 1.0).abs() < 1e-9);
        assert!(poly.distance_to_boundary(Point::new(4.0, 2.0)) < 1e-9);
    }
}
