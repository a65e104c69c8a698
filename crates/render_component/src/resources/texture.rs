//! Texture collaborator
//!
//! Textures are chosen by file extension: `bmp` goes to the bitmap loader,
//! `dds` to the compressed-texture loader, an empty name means the caller
//! supplies the texture handle, and anything else is refused.

use crate::gpu::{DeviceError, GraphicsDevice, TextureHandle};
use image::ImageFormat;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced while loading textures
#[derive(Error, Debug)]
pub enum TextureError {
    /// IO error while opening a texture file
    #[error("IO error reading {path}: {source}")]
    Io {
        /// File that failed
        path: String,
        /// Underlying error
        source: std::io::Error,
    },
    /// The file could not be decoded
    #[error("Failed to decode {path}: {message}")]
    Decode {
        /// File that failed
        path: String,
        /// Decoder message
        message: String,
    },
    /// Extension is neither bmp nor dds
    #[error("Unsupported texture format: '{0}'")]
    UnsupportedFormat(String),
    /// The device refused the upload
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
}

/// Which loader a texture file name is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureRoute {
    /// `.bmp` (any case)
    Bitmap,
    /// `.dds` (any case)
    Compressed,
    /// Empty name: the texture handle is supplied externally
    External,
    /// Any other name, including one without an extension
    Unsupported,
}

impl TextureRoute {
    /// Classify a texture file name by the text after its last `.`.
    ///
    /// A bare dotfile such as `.bmp` counts as having that extension; a name
    /// with no `.` at all is unsupported.
    pub fn from_file_name(name: &str) -> Self {
        if name.is_empty() {
            return Self::External;
        }
        match name.rsplit_once('.') {
            Some((_, ext)) if ext.eq_ignore_ascii_case("bmp") => Self::Bitmap,
            Some((_, ext)) if ext.eq_ignore_ascii_case("dds") => Self::Compressed,
            _ => Self::Unsupported,
        }
    }
}

/// Loads texture files onto the GPU
pub trait TextureLoader {
    /// Load a bitmap (`.bmp`) texture
    fn load_bitmap_texture(&mut self, device: &mut dyn GraphicsDevice, path: &str) -> Result<TextureHandle, TextureError>;

    /// Load a compressed (`.dds`) texture
    fn load_compressed_texture(&mut self, device: &mut dyn GraphicsDevice, path: &str) -> Result<TextureHandle, TextureError>;
}

/// Decoded RGBA8 image ready for GPU upload
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Raw RGBA pixel data, first row at the bottom
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageData {
    /// Decode a file with a known format
    pub fn from_file_with_format<P: AsRef<Path>>(path: P, format: ImageFormat) -> Result<Self, TextureError> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref).map_err(|source| TextureError::Io {
            path: path_ref.display().to_string(),
            source,
        })?;
        let img = image::load(BufReader::new(file), format).map_err(|e| TextureError::Decode {
            path: path_ref.display().to_string(),
            message: e.to_string(),
        })?;

        // GL samples with the origin at the bottom-left
        let rgba_img = img.flipv().to_rgba8();
        let (width, height) = rgba_img.dimensions();
        log::debug!("Decoded {}x{} {:?} image from {:?}", width, height, format, path_ref);

        Ok(Self {
            data: rgba_img.into_raw(),
            width,
            height,
        })
    }

    /// Create a solid color image (useful for external textures and tests)
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixel_count * 4);
        for _ in 0..pixel_count {
            data.extend_from_slice(&color);
        }
        Self { data, width, height }
    }

    /// Upload to the device as a new texture
    pub fn upload(&self, device: &mut dyn GraphicsDevice) -> Result<TextureHandle, TextureError> {
        Ok(device.create_texture_rgba8(self.width, self.height, &self.data)?)
    }
}

/// Texture loader decoding files with the `image` crate
#[derive(Debug, Clone, Default)]
pub struct ImageTextureLoader {
    assets_dir: Option<PathBuf>,
}

impl ImageTextureLoader {
    /// Loader resolving relative paths against `assets_dir` when the path
    /// does not exist as given
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: Some(assets_dir.into()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let direct = Path::new(path);
        match &self.assets_dir {
            Some(dir) if !direct.exists() => dir.join(path),
            _ => direct.to_path_buf(),
        }
    }

    fn load(&self, device: &mut dyn GraphicsDevice, path: &str, format: ImageFormat) -> Result<TextureHandle, TextureError> {
        let image = ImageData::from_file_with_format(self.resolve(path), format)?;
        let handle = image.upload(device)?;
        log::info!("Loaded texture {} ({}x{})", path, image.width, image.height);
        Ok(handle)
    }
}

impl TextureLoader for ImageTextureLoader {
    fn load_bitmap_texture(&mut self, device: &mut dyn GraphicsDevice, path: &str) -> Result<TextureHandle, TextureError> {
        self.load(device, path, ImageFormat::Bmp)
    }

    fn load_compressed_texture(&mut self, device: &mut dyn GraphicsDevice, path: &str) -> Result<TextureHandle, TextureError> {
        self.load(device, path, ImageFormat::Dds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessDevice;

    #[test]
    fn test_route_by_extension() {
        assert_eq!(TextureRoute::from_file_name("uvtemplate.bmp"), TextureRoute::Bitmap);
        assert_eq!(TextureRoute::from_file_name("UVTEMPLATE.BMP"), TextureRoute::Bitmap);
        assert_eq!(TextureRoute::from_file_name("dir.v2/skin.Dds"), TextureRoute::Compressed);
        assert_eq!(TextureRoute::from_file_name(""), TextureRoute::External);
        assert_eq!(TextureRoute::from_file_name("photo.png"), TextureRoute::Unsupported);
        assert_eq!(TextureRoute::from_file_name("bmp"), TextureRoute::Unsupported);
        assert_eq!(TextureRoute::from_file_name("archive.bmp.png"), TextureRoute::Unsupported);
        assert_eq!(TextureRoute::from_file_name("dir.bmp/skin"), TextureRoute::Unsupported);
    }

    #[test]
    fn test_dotfile_routes_by_its_suffix() {
        assert_eq!(TextureRoute::from_file_name(".bmp"), TextureRoute::Bitmap);
        assert_eq!(TextureRoute::from_file_name("textures/.DDS"), TextureRoute::Compressed);
        assert_eq!(TextureRoute::from_file_name("."), TextureRoute::Unsupported);
    }

    #[test]
    fn test_solid_color_upload() {
        let mut device = HeadlessDevice::new();
        let image = ImageData::solid_color(4, 2, [255, 0, 0, 255]);
        assert_eq!(image.data.len(), 4 * 2 * 4);
        assert_eq!(&image.data[0..4], &[255, 0, 0, 255]);

        let handle = image.upload(&mut device).unwrap();
        assert_eq!(device.texture_size(handle), Some((4, 2)));
    }

    #[test]
    fn test_bitmap_file_round_trip() {
        let path = std::env::temp_dir().join(format!("render_component_tex_{}.bmp", std::process::id()));
        image::RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]))
            .save_with_format(&path, ImageFormat::Bmp)
            .unwrap();

        let mut device = HeadlessDevice::new();
        let mut loader = ImageTextureLoader::default();
        let handle = loader.load_bitmap_texture(&mut device, &path.to_string_lossy()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(device.texture_size(handle), Some((2, 3)));
    }

    #[test]
    fn test_missing_file_fails_without_allocating() {
        let mut device = HeadlessDevice::new();
        let mut loader = ImageTextureLoader::new("nowhere");
        assert!(matches!(
            loader.load_compressed_texture(&mut device, "missing.dds"),
            Err(TextureError::Io { .. })
        ));
        assert_eq!(device.live_textures(), 0);
    }
}
