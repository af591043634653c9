use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::domain::InspirationImage;
use crate::error::{AppError, Result};

/// Allowed image extensions
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Maximum file size (10 MB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// URL prefix the uploads directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        _ => "image/webp",
    }
}

/// Lowercased extension of an allowed image file name.
pub fn image_extension(filename: &str) -> Result<String> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .ok_or_else(|| AppError::Validation("Invalid filename".to_string()))?;

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::Validation(format!(
            "Invalid file type. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    Ok(extension)
}

/// Store an inspiration image under a random name and describe it.
pub async fn save_inspiration_image(
    uploads_dir: &str,
    filename: &str,
    data: &[u8],
) -> Result<InspirationImage> {
    if data.is_empty() {
        return Err(AppError::Validation("File is empty".to_string()));
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::Validation("File too large (max 10 MB)".to_string()));
    }

    let extension = image_extension(filename)?;

    let uploads_path = PathBuf::from(uploads_dir);
    fs::create_dir_all(&uploads_path).await.map_err(|e| {
        AppError::Internal(format!("Failed to create uploads directory: {}", e))
    })?;

    let stored_name = format!("{}.{}", Uuid::new_v4(), extension);
    let file_path = uploads_path.join(&stored_name);

    let mut file = fs::File::create(&file_path).await.map_err(|e| {
        AppError::Internal(format!("Failed to create file: {}", e))
    })?;

    file.write_all(data).await.map_err(|e| {
        AppError::Internal(format!("Failed to write file: {}", e))
    })?;

    tracing::debug!("Stored upload {} as {}", filename, file_path.display());

    Ok(InspirationImage {
        file_name: filename.to_string(),
        path: format!("{}/{}", PUBLIC_PREFIX, stored_name),
        content_type: Some(content_type_for(&extension).to_string()),
        size: data.len() as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("nails.JPG").unwrap(), "jpg");
        assert_eq!(image_extension("my.design.webp").unwrap(), "webp");
        assert!(image_extension("notes.pdf").is_err());
        assert!(image_extension("noextension").is_err());
    }

    #[tokio::test]
    async fn test_save_and_reject() {
        let dir = std::env::temp_dir().join(format!("lacquer-uploads-{}", Uuid::new_v4()));
        let dir = dir.to_string_lossy().to_string();

        let image = save_inspiration_image(&dir, "french tips.png", b"\x89PNG data").await.unwrap();
        assert_eq!(image.file_name, "french tips.png");
        assert_eq!(image.content_type.as_deref(), Some("image/png"));
        assert_eq!(image.size, 9);
        assert!(image.path.starts_with("/uploads/"));

        let stored = image.path.trim_start_matches("/uploads/");
        assert!(std::path::Path::new(&dir).join(stored).exists());

        assert!(save_inspiration_image(&dir, "empty.png", b"").await.is_err());
        assert!(save_inspiration_image(&dir, "script.sh", b"echo").await.is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
