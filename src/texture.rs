use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::io::Cursor;

use crate::model::Rgba;

/// Bitmap used as a tiled polygon fill.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

#[derive(Debug)]
pub enum TextureError {
    Base64(base64::DecodeError),
    Image(image::ImageError),
    Empty,
    SizeMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for TextureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextureError::Base64(e) => write!(f, "invalid base64: {e}"),
            TextureError::Image(e) => write!(f, "invalid image: {e}"),
            TextureError::Empty => write!(f, "texture has no pixels"),
            TextureError::SizeMismatch { expected, actual } => {
                write!(f, "expected {expected} bytes of RGBA data, got {actual}")
            }
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TextureError::Base64(e) => Some(e),
            TextureError::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl Texture {
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::Empty);
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn solid(width: u32, height: u32, color: Rgba) -> Result<Self, TextureError> {
        let rgba = [color.r, color.g, color.b, color.a].repeat(width as usize * height as usize);
        Self::from_rgba(width, height, rgba)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Texel at `(x, y)`, tiling in both directions.
    pub fn sample(&self, x: i32, y: i32) -> Rgba {
        let tx = x.rem_euclid(self.width as i32) as usize;
        let ty = y.rem_euclid(self.height as i32) as usize;
        let idx = (ty * self.width as usize + tx) * 4;
        Rgba::new(
            self.rgba[idx],
            self.rgba[idx + 1],
            self.rgba[idx + 2],
            self.rgba[idx + 3],
        )
    }

    pub fn from_png(bytes: &[u8]) -> Result<Self, TextureError> {
        let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
            .map_err(TextureError::Image)?
            .to_rgba8();
        let (width, height) = img.dimensions();
        Self::from_rgba(width, height, img.into_raw())
    }

    pub fn to_png(&self) -> Result<Vec<u8>, TextureError> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.rgba.clone()).ok_or(
            TextureError::SizeMismatch {
                expected: self.width as usize * self.height as usize * 4,
                actual: self.rgba.len(),
            },
        )?;
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)
            .map_err(TextureError::Image)?;
        Ok(out.into_inner())
    }

    pub fn from_base64_png(encoded: &str) -> Result<Self, TextureError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(TextureError::Base64)?;
        Self::from_png(&bytes)
    }

    pub fn to_base64_png(&self) -> Result<String, TextureError> {
        Ok(STANDARD.encode(self.to_png()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Texture {
        let red = [255, 0, 0, 255];
        let blue = [0, 0, 255, 255];
        let rgba = [red, blue, blue, red].concat();
        Texture::from_rgba(2, 2, rgba).unwrap()
    }

    #[test]
    fn sampling_tiles_in_both_directions() {
        let tex = checker();
        assert_eq!(tex.sample(0, 0), Rgba::rgb(255, 0, 0));
        assert_eq!(tex.sample(1, 0), Rgba::rgb(0, 0, 255));
        assert_eq!(tex.sample(2, 2), Rgba::rgb(255, 0, 0));
        assert_eq!(tex.sample(-1, 0), Rgba::rgb(0, 0, 255));
        assert_eq!(tex.sample(-1, -1), Rgba::rgb(255, 0, 0));
    }

    #[test]
    fn png_base64_preserves_pixels() {
        let tex = checker();
        let encoded = tex.to_base64_png().unwrap();
        let decoded = Texture::from_base64_png(&encoded).unwrap();
        assert_eq!(decoded, tex);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            Texture::from_base64_png("not base64!!"),
            Err(TextureError::Base64(_))
        ));
        let not_png = STANDARD.encode(b"hello");
        assert!(matches!(
            Texture::from_base64_png(&not_png),
            Err(TextureError::Image(_))
        ));
        assert!(matches!(
            Texture::from_rgba(0, 3, Vec::new()),
            Err(TextureError::Empty)
        ));
        assert!(matches!(
            Texture::from_rgba(1, 1, vec![0; 3]),
            Err(TextureError::SizeMismatch { .. })
        ));
    }
}
