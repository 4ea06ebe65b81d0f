use std::io::Cursor;

use image::{ImageFormat, ImageReader};
use log::debug;

use crate::error::TextureError;

/// Decoded RGBA8 pixels of one source image.
#[derive(Clone)]
pub struct TextureAsset {
    /// Source image index, the texture cache key.
    pub image: usize,
    pub size: (u32, u32),
    pub pixels: Vec<u8>,
}

impl std::fmt::Debug for TextureAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureAsset")
            .field("image", &self.image)
            .field("size", &self.size)
            .field("pixels", &self.pixels.len())
            .finish()
    }
}

/// Decode embedded image bytes. The format comes from `mime` when it names
/// one `image` knows, otherwise from the data itself.
pub fn decode_texture(
    image: usize,
    bytes: &[u8],
    mime: Option<&str>,
) -> Result<TextureAsset, TextureError> {
    let mut reader = ImageReader::new(Cursor::new(bytes));
    match mime.and_then(ImageFormat::from_mime_type) {
        Some(format) => reader.set_format(format),
        None => reader = reader.with_guessed_format()?,
    }
    let decoded = reader.decode()?.into_rgba8();
    let size = decoded.dimensions();
    debug!("Decoded image #{} ({}x{})", image, size.0, size.1);
    Ok(TextureAsset {
        image,
        size,
        pixels: decoded.into_raw(),
    })
}

#[cfg(test)]
mod test {
    use image::{Rgba, RgbaImage};

    use super::*;

    fn png() -> Vec<u8> {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 0, 255, 128]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decodes_png_to_rgba() {
        let bytes = png();
        for mime in [Some("image/png"), None] {
            let texture = decode_texture(3, &bytes, mime).unwrap();
            assert_eq!(texture.image, 3);
            assert_eq!(texture.size, (2, 1));
            assert_eq!(texture.pixels, vec![255, 0, 0, 255, 0, 0, 255, 128]);
        }
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(decode_texture(0, b"not an image", None).is_err());
        assert!(matches!(
            decode_texture(0, b"not an image", Some("image/png")),
            Err(TextureError::Decode(_))
        ));
    }
}
