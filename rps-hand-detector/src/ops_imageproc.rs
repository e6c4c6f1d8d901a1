//! Mask operations on `image` buffers through `imageproc`.

use anyhow::Result;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::geometry;
use imageproc::morphology;
use imageproc::point::Point as PixelPoint;

use crate::geometry::{cross, Point, RawDefect};

fn kernel_radius(radius: usize) -> u8 {
    radius.min(u8::MAX as usize) as u8
}

fn to_pixels(contour: &[Point]) -> Vec<PixelPoint<i32>> {
    contour.iter().map(|p| PixelPoint::new(p.x, p.y)).collect()
}

pub(crate) fn open(mask: &GrayImage, radius: usize) -> Result<GrayImage> {
    Ok(morphology::open(mask, Norm::LInf, kernel_radius(radius)))
}

pub(crate) fn close(mask: &GrayImage, radius: usize) -> Result<GrayImage> {
    Ok(morphology::close(mask, Norm::LInf, kernel_radius(radius)))
}

/// Outer borders of every foreground component, every border pixel included.
pub(crate) fn outer_contours(mask: &GrayImage) -> Result<Vec<Vec<Point>>> {
    Ok(find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer))
        .map(|c| c.points.into_iter().map(|p| Point::new(p.x, p.y)).collect())
        .collect())
}

pub(crate) fn contour_area(contour: &[Point]) -> Result<f32> {
    Ok(geometry::contour_area(&to_pixels(contour)).abs() as f32)
}

pub(crate) fn arc_length(contour: &[Point]) -> Result<f32> {
    Ok(geometry::arc_length(&to_pixels(contour), true) as f32)
}

/// Convex hull vertices as indices into `contour`, in hull order.
pub(crate) fn hull_indices(contour: &[Point]) -> Result<Vec<usize>> {
    if contour.len() < 3 {
        return Ok((0..contour.len()).collect());
    }
    let hull = geometry::convex_hull(to_pixels(contour).as_slice());
    Ok(hull
        .iter()
        .filter_map(|v| contour.iter().position(|p| p.x == v.x && p.y == v.y))
        .collect())
}

/// Deepest contour point between each pair of neighbouring hull vertices. `hull` must be
/// sorted along the contour; segments with nothing between their ends yield no defect.
pub(crate) fn convexity_defects(contour: &[Point], hull: &[usize]) -> Result<Vec<RawDefect>> {
    let n = contour.len();
    let mut defects = Vec::new();

    for (k, &a) in hull.iter().enumerate() {
        let b = hull[(k + 1) % hull.len()];
        let (start, end) = (contour[a], contour[b]);
        let edge_len = start.distance_to(&end);
        if edge_len == 0.0 {
            continue;
        }

        let mut deepest: Option<(usize, f32)> = None;
        let mut j = (a + 1) % n;
        while j != b {
            let depth = cross(start, end, contour[j]).abs() as f32 / edge_len;
            if deepest.map_or(true, |(_, d)| depth > d) {
                deepest = Some((j, depth));
            }
            j = (j + 1) % n;
        }

        if let Some((far, depth)) = deepest {
            defects.push(RawDefect {
                start: a,
                end: b,
                far,
                depth,
            });
        }
    }

    Ok(defects)
}
