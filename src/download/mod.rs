use crate::generate::ImageResult;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::info;
use std::path::{Path, PathBuf};

/// Decodes `image` and writes it to `dir/meme_<n>.png`, creating `dir` if needed.
#[tracing::instrument(skip(runtime, image), fields(ordinal = image.ordinal()))]
pub fn save_image<R: Runtime>(runtime: &R, image: &ImageResult, dir: &Path) -> Result<PathBuf> {
    let bytes = BASE64
        .decode(image.payload())
        .with_context(|| format!("Image {} is not valid base64", image.ordinal() + 1))?;

    if !runtime.exists(dir) {
        runtime
            .create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {:?}", dir))?;
    }

    let path = dir.join(image.filename());
    runtime
        .write(&path, &bytes)
        .with_context(|| format!("Failed to save image to {:?}", path))?;

    info!("Saved {} bytes to {:?}", bytes.len(), path);
    Ok(path)
}

/// Where images go when no directory is given: the download directory, else the working directory.
pub fn default_output_dir<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    match runtime.download_dir() {
        Some(dir) => Ok(dir),
        None => runtime.current_dir(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use tempfile::tempdir;

    #[test]
    fn test_save_image_uses_one_based_filename() {
        // --- Setup Runtime ---
        let mut runtime = MockRuntime::new();
        let dir = PathBuf::from("/home/user/Downloads");

        runtime
            .expect_exists()
            .with(eq(dir.clone()))
            .returning(|_| true);

        // Write: meme_3.png -> decoded bytes
        runtime
            .expect_write()
            .withf(|path, contents| path.ends_with("meme_3.png") && contents == b"png-bytes")
            .times(1)
            .returning(|_, _| Ok(()));

        // --- Execute ---
        let image = ImageResult::new(2, BASE64.encode(b"png-bytes"));
        let path = save_image(&runtime, &image, &dir).unwrap();

        // --- Verify ---
        assert_eq!(path, dir.join("meme_3.png"));
    }

    #[test]
    fn test_save_image_creates_missing_dir() {
        let mut runtime = MockRuntime::new();
        let dir = PathBuf::from("/tmp/memes");

        runtime.expect_exists().returning(|_| false);
        runtime
            .expect_create_dir_all()
            .with(eq(dir.clone()))
            .times(1)
            .returning(|_| Ok(()));
        runtime.expect_write().times(1).returning(|_, _| Ok(()));

        let image = ImageResult::new(0, BASE64.encode(b"x"));
        assert!(save_image(&runtime, &image, &dir).is_ok());
    }

    #[test]
    fn test_save_image_rejects_invalid_payload() {
        // No expectations = strict mode (panics if any method called)
        let runtime = MockRuntime::new();

        let image = ImageResult::new(0, "not base64!".to_string());
        let err = save_image(&runtime, &image, Path::new("/tmp")).unwrap_err();
        assert!(err.to_string().contains("not valid base64"));
    }

    #[test]
    fn test_save_image_real_file() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");

        let image = ImageResult::new(1, BASE64.encode(b"\x89PNG\r\n"));
        let path = save_image(&RealRuntime, &image, &out).unwrap();

        assert_eq!(path, out.join("meme_2.png"));
        assert_eq!(std::fs::read(path).unwrap(), b"\x89PNG\r\n");
    }

    #[test]
    fn test_default_output_dir_prefers_download_dir() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_download_dir()
            .returning(|| Some(PathBuf::from("/home/user/Downloads")));

        assert_eq!(
            default_output_dir(&runtime).unwrap(),
            PathBuf::from("/home/user/Downloads")
        );
    }

    #[test]
    fn test_default_output_dir_falls_back_to_current_dir() {
        let mut runtime = MockRuntime::new();
        runtime.expect_download_dir().returning(|| None);
        runtime
            .expect_current_dir()
            .returning(|| Ok(PathBuf::from("/work")));

        assert_eq!(default_output_dir(&runtime).unwrap(), PathBuf::from("/work"));
    }
}
