use image::DynamicImage;
use std::io::Cursor;

/// The eight EXIF orientation values and the correction each one needs to
/// display the stored pixels upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// 1: already upright
    Normal,
    /// 2: mirrored left-right
    FlipHorizontal,
    /// 3: upside down
    Rotate180,
    /// 4: mirrored top-bottom
    FlipVertical,
    /// 5: mirrored along the main diagonal
    Transpose,
    /// 6: needs a 90° clockwise turn
    Rotate90,
    /// 7: mirrored along the anti-diagonal
    Transverse,
    /// 8: needs a 270° clockwise turn
    Rotate270,
}

impl Orientation {
    pub fn from_exif(value: u32) -> Option<Self> {
        Some(match value {
            1 => Orientation::Normal,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270,
            _ => return None,
        })
    }

    /// Clockwise rotation applied first, then an optional horizontal/vertical flip.
    pub fn transforms(&self) -> (Option<u16>, bool, bool) {
        match self {
            Orientation::Normal => (None, false, false),
            Orientation::FlipHorizontal => (None, true, false),
            Orientation::Rotate180 => (Some(180), false, false),
            Orientation::FlipVertical => (None, false, true),
            Orientation::Transpose => (Some(90), true, false),
            Orientation::Rotate90 => (Some(90), false, false),
            Orientation::Transverse => (Some(270), true, false),
            Orientation::Rotate270 => (Some(270), false, false),
        }
    }

    pub fn apply(&self, img: DynamicImage) -> DynamicImage {
        let (rotate, flip_h, flip_v) = self.transforms();

        let img = match rotate {
            Some(90) => img.rotate90(),
            Some(180) => img.rotate180(),
            Some(270) => img.rotate270(),
            _ => img,
        };
        let img = if flip_h { img.fliph() } else { img };
        if flip_v {
            img.flipv()
        } else {
            img
        }
    }
}

/// EXIF orientation helpers
pub struct ImageOrientation;

impl ImageOrientation {
    /// Orientation tag of the primary image, if the container carries readable EXIF.
    pub fn read_exif_orientation(data: &[u8]) -> Option<Orientation> {
        let mut cursor = Cursor::new(data);
        let exif = exif::Reader::new().read_from_container(&mut cursor).ok()?;
        let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
        field.value.get_uint(0).and_then(Orientation::from_exif)
    }

    /// Upright version of `img`. Missing or unreadable metadata leaves it untouched.
    pub fn apply_exif_orientation(img: DynamicImage, data: &[u8]) -> DynamicImage {
        match Self::read_exif_orientation(data) {
            Some(orientation) if orientation != Orientation::Normal => {
                tracing::debug!(orientation = ?orientation, "Applying EXIF orientation");
                orientation.apply(img)
            }
            _ => img,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::test_support::{encode, gradient, with_exif_orientation};
    use image::{GenericImageView, ImageFormat};

    const W: u32 = 4;
    const H: u32 = 3;

    fn stored() -> DynamicImage {
        DynamicImage::ImageRgba8(gradient(W, H))
    }

    /// Where pixel (x, y) of the corrected image comes from in the stored image.
    fn source_of(orientation: Orientation, x: u32, y: u32) -> (u32, u32) {
        match orientation {
            Orientation::Normal => (x, y),
            Orientation::FlipHorizontal => (W - 1 - x, y),
            Orientation::Rotate180 => (W - 1 - x, H - 1 - y),
            Orientation::FlipVertical => (x, H - 1 - y),
            Orientation::Transpose => (y, x),
            Orientation::Rotate90 => (y, H - 1 - x),
            Orientation::Transverse => (W - 1 - y, H - 1 - x),
            Orientation::Rotate270 => (W - 1 - y, x),
        }
    }

    #[test]
    fn test_pixel_layout_for_all_orientations() {
        let original = stored();
        for value in 1..=8 {
            let orientation = Orientation::from_exif(value).unwrap();
            let corrected = orientation.apply(original.clone());
            let (cw, ch) = corrected.dimensions();
            let swaps = matches!(
                orientation,
                Orientation::Transpose
                    | Orientation::Rotate90
                    | Orientation::Transverse
                    | Orientation::Rotate270
            );
            assert_eq!((cw, ch), if swaps { (H, W) } else { (W, H) }, "value {}", value);

            for y in 0..ch {
                for x in 0..cw {
                    let (sx, sy) = source_of(orientation, x, y);
                    assert_eq!(
                        corrected.get_pixel(x, y),
                        original.get_pixel(sx, sy),
                        "orientation {} at ({}, {})",
                        value,
                        x,
                        y
                    );
                }
            }
        }
    }

    #[test]
    fn test_inverse_restores_original() {
        let original = stored();
        let inverse = |o: Orientation| match o {
            Orientation::Rotate90 => Orientation::Rotate270,
            Orientation::Rotate270 => Orientation::Rotate90,
            other => other,
        };
        for value in 1..=8 {
            let orientation = Orientation::from_exif(value).unwrap();
            let round_trip = inverse(orientation).apply(orientation.apply(original.clone()));
            assert_eq!(round_trip.to_rgba8(), original.to_rgba8(), "value {}", value);
        }
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(Orientation::from_exif(0).is_none());
        assert!(Orientation::from_exif(9).is_none());
    }

    #[test]
    fn test_read_orientation_from_jpeg_exif() {
        let jpeg = encode(
            &DynamicImage::ImageRgb8(stored().to_rgb8()),
            ImageFormat::Jpeg,
        );
        let tagged = with_exif_orientation(&jpeg, 6);
        assert_eq!(
            ImageOrientation::read_exif_orientation(&tagged),
            Some(Orientation::Rotate90)
        );
    }

    #[test]
    fn test_missing_exif_is_none() {
        let png = encode(&stored(), ImageFormat::Png);
        assert_eq!(ImageOrientation::read_exif_orientation(&png), None);
        assert_eq!(ImageOrientation::read_exif_orientation(b"garbage"), None);
    }

    #[test]
    fn test_apply_without_exif_keeps_image() {
        let img = stored();
        let png = encode(&img, ImageFormat::Png);
        let out = ImageOrientation::apply_exif_orientation(img.clone(), &png);
        assert_eq!(out.to_rgba8(), img.to_rgba8());
    }
}
