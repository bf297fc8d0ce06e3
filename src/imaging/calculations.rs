//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate contain-fit dimensions: the largest size with the source aspect
/// ratio that fits entirely inside `bounds`.
///
/// The relatively larger source dimension is pinned to its bound and the other
/// is scaled and rounded. Smaller sources are scaled up to the box. Both
/// results are clamped to `1..=bound`.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `bounds` - Bounding box (max width, max height)
///
/// # Examples
/// ```
/// # use photo_ingest::imaging::calculate_contain_dimensions;
/// // 16:9 landscape into the 480x854 portrait box → width-constrained
/// assert_eq!(calculate_contain_dimensions((1920, 1080), (480, 854)), (480, 270));
///
/// // 3:4 portrait → height-constrained
/// assert_eq!(calculate_contain_dimensions((3000, 4000), (480, 854)), (480, 640));
/// ```
pub fn calculate_contain_dimensions(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let max_w = bounds.0.max(1);
    let max_h = bounds.1.max(1);

    if src_w == 0 || src_h == 0 {
        return (max_w.min(1), max_h.min(1));
    }

    let src_aspect = src_w as f64 / src_h as f64;
    let box_aspect = max_w as f64 / max_h as f64;

    if src_aspect > box_aspect {
        // Source is relatively wider: width hits the bound
        let h = (max_w as f64 / src_aspect).round() as u32;
        (max_w, h.clamp(1, max_h))
    } else {
        // Source is relatively taller (or equal): height hits the bound
        let w = (max_h as f64 * src_aspect).round() as u32;
        (w.clamp(1, max_w), max_h)
    }
}
