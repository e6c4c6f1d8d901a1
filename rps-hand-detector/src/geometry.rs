//! Shape analysis of the hand candidate on a binary mask.
//!
//! Outer contours come from the mask backend; the largest plausible one is measured
//! against its convex hull and its convexity defects are filtered by depth and angle.

use anyhow::Result;
use rps_shared::GameConfig;

use crate::mask::HandMask;
use crate::ops;

/// A 2D point in ROI pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f32 {
        (self.distance_sq(other) as f32).sqrt()
    }

    fn distance_sq(&self, other: &Point) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

/// Defect as contour indices, before it is measured and filtered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RawDefect {
    pub start: usize,
    pub end: usize,
    pub far: usize,
    pub depth: f32,
}

/// Region where the contour dips inward from its convex hull.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvexityDefect {
    pub start: Point,
    pub end: Point,
    pub far: Point,
    /// Distance from the hull edge `start`-`end` to `far`.
    pub depth: f32,
    /// Angle at `far` between `start` and `end`, in degrees.
    pub angle_deg: f32,
}

/// Shape measurements of the hand candidate for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourFeatures {
    pub defect_count: usize,
    pub solidity: f32,
    pub circularity: f32,
    pub area: f32,
    pub perimeter: f32,
    pub hull_area: f32,
}

struct Candidate {
    points: Vec<Point>,
    area: f32,
    perimeter: f32,
}

/// Extracts `ContourFeatures` from masks.
#[derive(Debug, Clone)]
pub struct GeometryAnalyzer {
    min_contour_area: f32,
    min_area_perimeter_ratio: f32,
    defect_depth_threshold: f32,
    max_defect_angle_deg: f32,
}

impl GeometryAnalyzer {
    pub fn new(min_contour_area: f32, defect_depth_threshold: f32, max_defect_angle_deg: f32) -> Self {
        Self {
            min_contour_area,
            min_area_perimeter_ratio: GameConfig::default().min_area_perimeter_ratio,
            defect_depth_threshold,
            max_defect_angle_deg,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(
            config.min_contour_area,
            config.defect_depth_threshold,
            config.max_defect_angle_deg,
        )
        .with_min_area_perimeter_ratio(config.min_area_perimeter_ratio)
    }

    pub fn with_min_area_perimeter_ratio(mut self, ratio: f32) -> Self {
        self.min_area_perimeter_ratio = ratio;
        self
    }

    /// Returns `Ok(None)` when no contour is large and compact enough (empty ROI).
    pub fn analyze(&self, mask: &HandMask) -> Result<Option<ContourFeatures>> {
        let Some(Candidate {
            points,
            area,
            perimeter,
        }) = self.hand_contour(mask)?
        else {
            return Ok(None);
        };

        let hull = ops::hull_indices(&points)?;
        let hull_points: Vec<Point> = hull.iter().map(|&i| points[i]).collect();
        let hull_area = ops::contour_area(&hull_points)?;

        let defect_count = convexity_defects(&points, &hull)?
            .iter()
            .filter(|d| d.depth >= self.defect_depth_threshold && d.angle_deg <= self.max_defect_angle_deg)
            .count();

        let solidity = if hull_area > 0.0 { (area / hull_area).clamp(0.0, 1.0) } else { 0.0 };
        let circularity = if perimeter > 0.0 {
            (4.0 * std::f32::consts::PI * area / (perimeter * perimeter)).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Ok(Some(ContourFeatures {
            defect_count,
            solidity,
            circularity,
            area,
            perimeter,
            hull_area,
        }))
    }

    /// Largest contour that reaches the minimum area and is not a thin sliver. Equal areas
    /// keep the contour found first.
    fn hand_contour(&self, mask: &HandMask) -> Result<Option<Candidate>> {
        let mut contours = Vec::new();
        for points in ops::outer_contours(mask.as_image())? {
            contours.push((ops::contour_area(&points)?, points));
        }
        contours.sort_by(|a, b| b.0.total_cmp(&a.0));

        for (area, points) in contours {
            if area < self.min_contour_area {
                log::debug!(
                    "Contour area {:.0} below minimum {:.0}",
                    area,
                    self.min_contour_area
                );
                break;
            }
            let perimeter = ops::arc_length(&points)?;
            if perimeter > 0.0 && area / perimeter > self.min_area_perimeter_ratio {
                return Ok(Some(Candidate {
                    points,
                    area,
                    perimeter,
                }));
            }
            log::debug!("Skipping thin contour: area {:.0}, perimeter {:.0}", area, perimeter);
        }
        Ok(None)
    }
}

pub(crate) fn cross(o: Point, a: Point, b: Point) -> i64 {
    (a.x - o.x) as i64 * (b.y - o.y) as i64 - (a.y - o.y) as i64 * (b.x - o.x) as i64
}

fn on_segment(p: Point, a: Point, b: Point) -> bool {
    cross(a, b, p) == 0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

/// Hull vertices plus every contour point lying on a hull edge, sorted along the contour.
///
/// Hulls drop collinear points, so fingertips at the same height would otherwise share a
/// single hull edge and the valleys between them would collapse into one defect.
pub fn hull_with_edge_points(contour: &[Point], hull: &[usize]) -> Vec<usize> {
    let mut vertices = hull.to_vec();
    for (k, &a) in hull.iter().enumerate() {
        let (start, end) = (contour[a], contour[hull[(k + 1) % hull.len()]]);
        vertices.extend(
            contour
                .iter()
                .enumerate()
                .filter(|(_, p)| on_segment(**p, start, end))
                .map(|(i, _)| i),
        );
    }
    vertices.sort_unstable();
    vertices.dedup();
    vertices
}

/// Convexity defects of `contour` against its hull `hull`, given in hull order.
pub fn convexity_defects(contour: &[Point], hull: &[usize]) -> Result<Vec<ConvexityDefect>> {
    if hull.len() < 3 || contour.len() < 4 {
        return Ok(Vec::new());
    }

    let vertices = hull_with_edge_points(contour, hull);
    Ok(ops::convexity_defects(contour, &vertices)?
        .into_iter()
        .map(|d| {
            let (start, end, far) = (contour[d.start], contour[d.end], contour[d.far]);
            ConvexityDefect {
                start,
                end,
                far,
                depth: d.depth,
                angle_deg: angle_at(far, start, end),
            }
        })
        .collect())
}

/// Angle at `vertex` in the triangle (`a`, `vertex`, `b`), by the law of cosines.
fn angle_at(vertex: Point, a: Point, b: Point) -> f32 {
    let side_a = vertex.distance_sq(&a) as f64;
    let side_b = vertex.distance_sq(&b) as f64;
    let opposite = a.distance_sq(&b) as f64;
    if side_a == 0.0 || side_b == 0.0 {
        return 180.0;
    }
    let cos = ((side_a + side_b - opposite) / (2.0 * (side_a * side_b).sqrt())).clamp(-1.0, 1.0);
    cos.acos().to_degrees() as f32
}
