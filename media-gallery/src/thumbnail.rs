use image::{imageops::FilterType, DynamicImage};

/// Computes thumbnail dimensions for an image bounded by `max_width` x `max_height`.
///
/// A bound of 0 means unconstrained on that axis; the other axis follows the
/// aspect ratio. Images already within bounds keep their size. When both
/// bounds are set the image is scaled to fit inside them.
pub fn thumbnail_dimensions(
    original_width: u32,
    original_height: u32,
    max_width: u32,
    max_height: u32,
) -> (u32, u32) {
    if original_width == 0 || original_height == 0 {
        return (original_width, original_height);
    }

    let width_ratio = if max_width == 0 {
        None
    } else {
        Some(original_width as f64 / max_width as f64)
    };
    let height_ratio = if max_height == 0 {
        None
    } else {
        Some(original_height as f64 / max_height as f64)
    };

    let ratio = match (width_ratio, height_ratio) {
        (Some(w), Some(h)) => w.max(h),
        (Some(w), None) => w,
        (None, Some(h)) => h,
        (None, None) => return (original_width, original_height),
    };

    if ratio <= 1.0 {
        return (original_width, original_height);
    }

    let mut new_width = ((original_width as f64 / ratio).round() as u32).max(1);
    let new_height = ((original_height as f64 / ratio).round() as u32).max(1);

    // Width bound wins over rounding on the other axis
    if max_width > 0 {
        new_width = new_width.min(max_width);
    }

    (new_width, new_height)
}

/// Derives a bounded copy of `image` using Lanczos3 resampling
pub fn create_thumbnail(image: &DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    let (width, height) =
        thumbnail_dimensions(image.width(), image.height(), max_width, max_height);

    if (width, height) == (image.width(), image.height()) {
        log::debug!("Image {}x{} already within thumbnail bounds", width, height);
        return image.clone();
    }

    log::debug!(
        "Resizing {}x{} to {}x{}",
        image.width(),
        image.height(),
        width,
        height
    );
    image.resize_exact(width, height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_width_bound_keeps_aspect() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(1000, 500));
        let thumb = create_thumbnail(&img, 200, 0);
        assert_eq!(thumb.width(), 200);
        assert_eq!(thumb.height(), 100);
    }

    #[test]
    fn test_resize_dimensions() {
        // Portrait image, width bound only
        assert_eq!(thumbnail_dimensions(600, 1200, 200, 0), (200, 400));

        // Height bound only
        assert_eq!(thumbnail_dimensions(1000, 500, 0, 50), (100, 50));

        // Both bounds, fit inside
        let (w, h) = thumbnail_dimensions(2000, 1500, 1024, 1024);
        assert!(w <= 1024);
        assert!(h <= 1024);
        assert_eq!(w as f32 / h as f32, 2000.0 / 1500.0);

        // Image smaller than max
        assert_eq!(thumbnail_dimensions(150, 90, 200, 0), (150, 90));

        // Unbounded
        assert_eq!(thumbnail_dimensions(800, 600, 0, 0), (800, 600));
    }

    #[test]
    fn test_extreme_aspect_never_collapses() {
        assert_eq!(thumbnail_dimensions(10_000, 3, 200, 0), (200, 1));
    }

    #[test]
    fn test_small_image_is_not_upscaled() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(64, 48));
        let thumb = create_thumbnail(&img, 200, 0);
        assert_eq!((thumb.width(), thumb.height()), (64, 48));
    }
}
