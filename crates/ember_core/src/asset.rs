//! Image asset loading for textures.
//!
//! Images are decoded once, at scene-build time, into linear RGB floats. The
//! trace path only ever reads width, height and a clamped pixel accessor.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ember_math::Vec3;
use thiserror::Error;

/// Errors that can occur while loading an image asset.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("image {path} has zero size")]
    Empty { path: String },
}

pub type AssetResult<T> = Result<T, AssetError>;

/// A decoded image in linear RGB, row-major, top row first.
#[derive(Clone, Debug, Default)]
pub struct ImageData {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 3]>,
    /// Source path, kept for log messages.
    path: String,
}

impl ImageData {
    /// Wrap already decoded linear pixels.
    ///
    /// `pixels.len()` must equal `width * height`; anything else is treated
    /// as an empty image.
    pub fn from_linear(width: u32, height: u32, pixels: Vec<[f32; 3]>) -> Self {
        if pixels.len() != (width as usize) * (height as usize) {
            return Self::default();
        }
        Self {
            width,
            height,
            pixels,
            path: "<memory>".to_string(),
        }
    }

    /// Decode an image file.
    pub fn load(path: impl AsRef<Path>) -> AssetResult<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| AssetError::Open {
            path: path.display().to_string(),
            source,
        })?;

        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(AssetError::Empty {
                path: path.display().to_string(),
            });
        }

        let pixels = rgb
            .pixels()
            .map(|p| [srgb_to_linear(p[0]), srgb_to_linear(p[1]), srgb_to_linear(p[2])])
            .collect();

        Ok(Self {
            width,
            height,
            pixels,
            path: path.display().to_string(),
        })
    }

    /// Decode an image file, or return an empty image if that fails.
    ///
    /// Textures sample an empty image as solid magenta, so a missing asset
    /// shows up on screen instead of stopping the render.
    pub fn load_or_placeholder(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("{e}; using placeholder texture");
                Self::default()
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Path the image was decoded from, `<memory>` for generated images.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// True if no pixel data was loaded.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Linear color of pixel `(x, y)`, clamped to the image edges.
    ///
    /// Returns black for an empty image.
    pub fn pixel(&self, x: u32, y: u32) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        Vec3::from_array(self.pixels[y * self.width as usize + x])
    }

    /// Approximate memory footprint.
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<[f32; 3]>()
    }
}

/// Shares decoded images between textures that reference the same file.
pub struct ImageCache {
    images: HashMap<String, Arc<ImageData>>,
    base_dir: Option<PathBuf>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
            base_dir: None,
        }
    }

    /// Cache that resolves relative paths against `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            images: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Load `path`, reusing a previous decode when available.
    pub fn load(&mut self, path: &str) -> AssetResult<Arc<ImageData>> {
        if let Some(image) = self.images.get(path) {
            return Ok(image.clone());
        }

        let image = Arc::new(ImageData::load(self.resolve_path(path))?);
        log::debug!(
            "Loaded image: {} ({}x{}, {:.1} KB)",
            image.path(),
            image.width(),
            image.height(),
            image.size_bytes() as f32 / 1024.0
        );
        self.images.insert(path.to_string(), image.clone());
        Ok(image)
    }

    /// Like [`ImageCache::load`] but degrades to an empty placeholder.
    ///
    /// Failures are not cached, so a file that appears later is picked up
    /// on the next scene build.
    pub fn load_or_placeholder(&mut self, path: &str) -> Arc<ImageData> {
        match self.load(path) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("{e}; using placeholder texture");
                Arc::new(ImageData::default())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.base_dir {
            Some(base) if !path.is_absolute() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert an sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_access_is_clamped() {
        let image = ImageData::from_linear(
            2,
            1,
            vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        );
        assert_eq!(image.pixel(0, 0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(image.pixel(1, 0), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(image.pixel(7, 3), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_mismatched_pixels_give_empty_image() {
        let image = ImageData::from_linear(4, 4, vec![[0.0; 3]]);
        assert!(image.is_empty());
        assert_eq!(image.pixel(0, 0), Vec3::ZERO);
    }

    #[test]
    fn test_cache_resolves_and_shares_images() {
        let dir = std::env::temp_dir().join(format!("ember_asset_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        image::RgbImage::from_pixel(2, 2, image::Rgb([255, 0, 0]))
            .save(dir.join("red.png"))
            .unwrap();

        let mut cache = ImageCache::with_base_dir(&dir);
        let first = cache.load("red.png").unwrap();
        let second = cache.load("red.png").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(first.path(), dir.join("red.png").display().to_string());
        assert!((first.pixel(1, 1) - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
        assert_eq!(ImageData::from_linear(1, 1, vec![[0.0; 3]]).path(), "<memory>");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = ImageData::load("definitely/not/here.png").unwrap_err();
        assert!(matches!(err, AssetError::Open { .. }));
    }

    #[test]
    fn test_missing_file_placeholder() {
        let _ = env_logger::builder().is_test(true).try_init();
        let image = ImageData::load_or_placeholder("definitely/not/here.png");
        assert!(image.is_empty());

        let mut cache = ImageCache::with_base_dir("/nonexistent");
        let image = cache.load_or_placeholder("earth.jpg");
        assert!(image.is_empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_srgb_to_linear() {
        assert!(srgb_to_linear(0).abs() < 0.001);
        assert!((srgb_to_linear(255) - 1.0).abs() < 0.001);

        let mid = srgb_to_linear(128);
        assert!(mid > 0.1 && mid < 0.5);
    }
}
