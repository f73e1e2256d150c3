//! On-disk storage for uploaded recipe images

use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageResult};
use tracing::debug;
use uuid::Uuid;

/// Directory, relative to the media root, holding recipe images
pub const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

/// Longest uploaded file extension kept in the stored name
pub const MAX_EXTENSION_LENGTH: usize = 10;

/// Files stored under a media root directory
#[derive(Debug, Clone)]
pub struct ImageStore {
    media_root: PathBuf,
}

impl ImageStore {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }

    /// Absolute location of a stored path
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.media_root.join(relative)
    }

    /// Write `bytes` to `relative`, creating parent directories
    pub async fn save(&self, relative: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.resolve(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&path, bytes).await?;
        debug!("Stored {} bytes at {}", bytes.len(), path.display());

        Ok(path)
    }

    /// Delete a stored file
    pub async fn remove(&self, relative: &str) -> std::io::Result<()> {
        tokio::fs::remove_file(self.resolve(relative)).await
    }
}

/// Check that `bytes` decode as an image and return the detected format
///
/// Decoding is CPU bound; async callers should run this on a blocking thread.
pub fn validate_image(bytes: &[u8]) -> ImageResult<ImageFormat> {
    let format = image::guess_format(bytes)?;
    image::load_from_memory_with_format(bytes, format)?;
    Ok(format)
}

/// Storage path for a new recipe image, named by a fresh UUID
pub fn recipe_image_path(file_name: Option<&str>, format: ImageFormat) -> String {
    recipe_image_path_with(Uuid::new_v4(), file_name, format)
}

/// Storage path using the given UUID
///
/// The uploaded file's extension is kept when it is plain alphanumeric and
/// at most `MAX_EXTENSION_LENGTH` characters; otherwise the detected format
/// decides it.
pub fn recipe_image_path_with(id: Uuid, file_name: Option<&str>, format: ImageFormat) -> String {
    let extension = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LENGTH
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(str::to_string)
        .or_else(|| format.extensions_str().first().map(|ext| ext.to_string()));

    match extension {
        Some(ext) => format!("{}/{}.{}", RECIPE_IMAGE_DIR, id, ext),
        None => format!("{}/{}", RECIPE_IMAGE_DIR, id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbImage::new(10, 10)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_validate_image() {
        assert_eq!(validate_image(&png_bytes()).unwrap(), ImageFormat::Png);
        assert!(validate_image(b"notanimage").is_err());
    }

    #[test]
    fn test_recipe_image_path() {
        let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();

        assert_eq!(
            recipe_image_path_with(id, Some("example.jpg"), ImageFormat::Jpeg),
            "uploads/recipe/67e55044-10b1-426f-9247-bb680e5fe0c8.jpg"
        );
        assert_eq!(
            recipe_image_path_with(id, None, ImageFormat::Png),
            "uploads/recipe/67e55044-10b1-426f-9247-bb680e5fe0c8.png"
        );
        assert_eq!(
            recipe_image_path_with(id, Some("../../etc/passwd.$h"), ImageFormat::Png),
            "uploads/recipe/67e55044-10b1-426f-9247-bb680e5fe0c8.png"
        );
        assert_eq!(
            recipe_image_path_with(id, Some("photo.webp2jpeg10"), ImageFormat::Png),
            "uploads/recipe/67e55044-10b1-426f-9247-bb680e5fe0c8.png"
        );
    }

    #[test]
    fn test_long_extension_fits_column() {
        let file_name = format!("photo.{}", "a".repeat(300));
        let path = recipe_image_path(Some(&file_name), ImageFormat::Png);

        assert!(path.ends_with(".png"));
        assert!(path.chars().count() <= 255);
        let base_name = Path::new(&path).file_name().unwrap().len();
        assert!(base_name <= 255);
    }

    #[test]
    fn test_fresh_names_differ() {
        let first = recipe_image_path(Some("a.png"), ImageFormat::Png);
        let second = recipe_image_path(Some("a.png"), ImageFormat::Png);

        assert!(first.starts_with("uploads/recipe/"));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let root = std::env::temp_dir().join(format!("recipe-media-{}", Uuid::new_v4()));
        let store = ImageStore::new(&root);
        let relative = recipe_image_path(Some("sample.png"), ImageFormat::Png);

        let path = store.save(&relative, &png_bytes()).await.unwrap();
        assert!(path.exists());
        assert_eq!(path, root.join(&relative));

        store.remove(&relative).await.unwrap();
        assert!(!path.exists());
        assert!(store.remove(&relative).await.is_err());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
