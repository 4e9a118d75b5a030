use image::imageops::FilterType;

/// Fit a source into a derivative bounding box, preserving aspect ratio.
///
/// Landscape sources are bound by `max_width`; square and portrait sources by
/// `max_height`. The derived side is rounded and never drops below 1. Sources
/// smaller than the box are scaled up to it.
pub fn bounding_box_dimensions(
    orig_width: u32,
    orig_height: u32,
    max_width: u32,
    max_height: u32,
) -> (u32, u32) {
    if orig_width == 0 || orig_height == 0 {
        return (max_width.max(1), max_height.max(1));
    }

    let aspect_ratio = orig_width as f64 / orig_height as f64;
    if aspect_ratio > 1.0 {
        let h = (max_width as f64 / aspect_ratio).round() as u32;
        (max_width.max(1), h.max(1))
    } else {
        let w = (max_height as f64 * aspect_ratio).round() as u32;
        (w.max(1), max_height.max(1))
    }
}

/// Select appropriate filter type based on resize ratio
pub fn select_filter(
    orig_width: u32,
    orig_height: u32,
    new_width: u32,
    new_height: u32,
) -> FilterType {
    let width_ratio = orig_width as f32 / new_width.max(1) as f32;
    let height_ratio = orig_height as f32 / new_height.max(1) as f32;
    let max_ratio = width_ratio.max(height_ratio);

    if max_ratio > 2.0 {
        FilterType::Triangle
    } else if max_ratio > 1.5 {
        FilterType::CatmullRom
    } else {
        FilterType::Lanczos3
    }
}
