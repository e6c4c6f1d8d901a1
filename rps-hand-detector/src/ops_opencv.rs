//! Mask operations through OpenCV.

use anyhow::{Context, Result};
use image::GrayImage;
use opencv::{
    core::{self, Mat, Point as CvPoint, Scalar, Size, Vector, CV_8UC1},
    imgproc,
    prelude::*,
};

use crate::geometry::{Point, RawDefect};

fn to_mat(mask: &GrayImage) -> Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(
        mask.height() as i32,
        mask.width() as i32,
        CV_8UC1,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(mask.as_raw());
    Ok(mat)
}

fn to_image(mat: &Mat) -> Result<GrayImage> {
    GrayImage::from_raw(mat.cols() as u32, mat.rows() as u32, mat.data_bytes()?.to_vec())
        .context("OpenCV returned a mask of unexpected size")
}

fn to_vector(contour: &[Point]) -> Vector<CvPoint> {
    contour.iter().map(|p| CvPoint::new(p.x, p.y)).collect()
}

fn morphology(mask: &GrayImage, radius: usize, op: i32) -> Result<GrayImage> {
    let side = 2 * radius as i32 + 1;
    let kernel = imgproc::get_structuring_element(
        imgproc::MORPH_RECT,
        Size::new(side, side),
        CvPoint::new(-1, -1),
    )?;
    let src = to_mat(mask)?;
    let mut dst = Mat::default();
    imgproc::morphology_ex(
        &src,
        &mut dst,
        op,
        &kernel,
        CvPoint::new(-1, -1),
        1,
        core::BORDER_REPLICATE,
        Scalar::default(),
    )?;
    to_image(&dst)
}

pub(crate) fn open(mask: &GrayImage, radius: usize) -> Result<GrayImage> {
    morphology(mask, radius, imgproc::MORPH_OPEN)
}

pub(crate) fn close(mask: &GrayImage, radius: usize) -> Result<GrayImage> {
    morphology(mask, radius, imgproc::MORPH_CLOSE)
}

pub(crate) fn outer_contours(mask: &GrayImage) -> Result<Vec<Vec<Point>>> {
    if mask.as_raw().is_empty() {
        return Ok(Vec::new());
    }
    let src = to_mat(mask)?;
    let mut contours = Vector::<Vector<CvPoint>>::new();
    imgproc::find_contours(
        &src,
        &mut contours,
        imgproc::RETR_EXTERNAL,
        imgproc::CHAIN_APPROX_NONE,
        CvPoint::new(0, 0),
    )?;
    Ok(contours
        .iter()
        .map(|c| c.iter().map(|p| Point::new(p.x, p.y)).collect())
        .collect())
}

pub(crate) fn contour_area(contour: &[Point]) -> Result<f32> {
    Ok(imgproc::contour_area(&to_vector(contour), false)? as f32)
}

pub(crate) fn arc_length(contour: &[Point]) -> Result<f32> {
    Ok(imgproc::arc_length(&to_vector(contour), true)? as f32)
}

pub(crate) fn hull_indices(contour: &[Point]) -> Result<Vec<usize>> {
    if contour.len() < 3 {
        return Ok((0..contour.len()).collect());
    }
    let mut hull = Vector::<i32>::new();
    imgproc::convex_hull(&to_vector(contour), &mut hull, false, false)?;
    Ok(hull.iter().map(|i| i as usize).collect())
}

/// Depths come back in 24.8 fixed point.
pub(crate) fn convexity_defects(contour: &[Point], hull: &[usize]) -> Result<Vec<RawDefect>> {
    let hull: Vector<i32> = hull.iter().map(|&i| i as i32).collect();
    let mut defects = Vector::<core::Vec4i>::new();
    imgproc::convexity_defects(&to_vector(contour), &hull, &mut defects)?;
    Ok(defects
        .iter()
        .map(|d| RawDefect {
            start: d[0] as usize,
            end: d[1] as usize,
            far: d[2] as usize,
            depth: d[3] as f32 / 256.0,
        })
        .collect())
}
