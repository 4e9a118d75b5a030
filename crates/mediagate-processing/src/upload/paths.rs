use mediagate_core::constants::DERIVATIVE_EXTENSION;

/// Storage path of a thumbnail variant.
///
/// Replaces the file extension of `base_path` with `_thumb_{variant}.jpg`
/// (`a/b.png` → `a/b_thumb_small.jpg`). A file name without an extension, or
/// a dotfile, gets the suffix appended. Dots in directory names are ignored.
pub fn thumbnail_path(base_path: &str, variant: &str) -> String {
    let (dir, file) = match base_path.rfind('/') {
        Some(idx) => base_path.split_at(idx + 1),
        None => ("", base_path),
    };

    let stem = match file.rfind('.') {
        Some(idx) if idx > 0 => &file[..idx],
        _ => file,
    };

    format!("{}{}_thumb_{}.{}", dir, stem, variant, DERIVATIVE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_replaced() {
        assert_eq!(thumbnail_path("a/b.png", "small"), "a/b_thumb_small.jpg");
        assert_eq!(thumbnail_path("photo.jpeg", "large"), "photo_thumb_large.jpg");
        assert_eq!(
            thumbnail_path("x/archive.tar.gz", "medium"),
            "x/archive.tar_thumb_medium.jpg"
        );
    }

    #[test]
    fn test_no_extension_appends() {
        assert_eq!(thumbnail_path("a/b", "small"), "a/b_thumb_small.jpg");
        assert_eq!(thumbnail_path("b", "small"), "b_thumb_small.jpg");
    }

    #[test]
    fn test_dots_outside_file_name_ignored() {
        assert_eq!(
            thumbnail_path("v1.2/image", "small"),
            "v1.2/image_thumb_small.jpg"
        );
        assert_eq!(thumbnail_path("a/.hidden", "small"), "a/.hidden_thumb_small.jpg");
    }
}
