use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;

/// At most this many images are kept per listing; extra payloads are ignored.
pub const MAX_IMAGES_PER_LISTING: usize = 5;

/// 10 MB decoded limit per image
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Stores decoded listing images as flat files at `{dir}/{uuid}.{ext}` and
/// hands back the URL they are served under.
pub struct ImageStore {
    dir: PathBuf,
    public_prefix: String,
}

#[derive(Debug)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

impl ImageStore {
    pub async fn new(dir: PathBuf, public_prefix: impl Into<String>) -> anyhow::Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Image storage directory: {}", dir.display());
        Ok(Self {
            dir,
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        })
    }

    /// URL path the stored files are served under, without a trailing slash.
    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Decode and persist up to `MAX_IMAGES_PER_LISTING` payloads, returning
    /// their public URLs. Every payload is decoded before anything is written,
    /// so one bad image leaves nothing behind.
    pub async fn save_all(&self, payloads: &[String]) -> Result<Vec<String>, ApiError> {
        let decoded = payloads
            .iter()
            .filter(|p| !p.trim().is_empty())
            .take(MAX_IMAGES_PER_LISTING)
            .map(|p| decode_payload(p))
            .collect::<Result<Vec<_>, _>>()?;

        let mut urls = Vec::with_capacity(decoded.len());
        for image in decoded {
            let file_name = format!("{}.{}", Uuid::new_v4(), image.extension);
            let path = self.dir.join(&file_name);
            if let Err(e) = fs::write(&path, &image.bytes).await {
                // Don't leave the earlier files of this batch orphaned.
                self.remove_all(&urls).await;
                return Err(anyhow::anyhow!("Failed to write image {}: {}", path.display(), e).into());
            }
            urls.push(format!("{}/{}", self.public_prefix, file_name));
        }
        Ok(urls)
    }

    /// Best-effort delete of previously stored images by URL.
    pub async fn remove_all(&self, urls: &[String]) {
        for url in urls {
            let Some(file_name) = self.file_name_for(url) else {
                warn!("Not a stored image URL, skipping delete: {}", url);
                continue;
            };
            match fs::remove_file(self.dir.join(file_name)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!("Image {} already gone", file_name);
                }
                Err(e) => warn!("Failed to delete image {}: {}", file_name, e),
            }
        }
    }

    /// Map a public URL back to its file name, refusing anything that could
    /// escape the storage directory.
    fn file_name_for<'a>(&self, url: &'a str) -> Option<&'a str> {
        let name = url.strip_prefix(&self.public_prefix)?.strip_prefix('/')?;
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !name.starts_with('.');
        valid.then_some(name)
    }
}

/// Decode a base64 image, optionally wrapped as `data:image/<type>;base64,...`.
pub fn decode_payload(payload: &str) -> Result<DecodedImage, ApiError> {
    let payload = payload.trim();

    let (extension, data) = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (meta, data) = rest
                .split_once(',')
                .ok_or_else(|| ApiError::validation("Invalid image data"))?;
            let media_type = meta
                .strip_suffix(";base64")
                .ok_or_else(|| ApiError::validation("Image data URL must be base64"))?;
            let subtype = media_type
                .strip_prefix("image/")
                .ok_or_else(|| ApiError::validation("Only image uploads are accepted"))?;
            (extension_for(subtype), data)
        }
        None => ("jpg", payload),
    };

    // base64 expands by 4/3; reject before allocating the decoded buffer
    if data.len() / 4 * 3 > MAX_IMAGE_BYTES + 3 {
        return Err(ApiError::validation("Image exceeds 10 MB"));
    }

    let bytes = B64
        .decode(data)
        .map_err(|_| ApiError::validation("Invalid image data"))?;
    if bytes.is_empty() {
        return Err(ApiError::validation("Invalid image data"));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::validation("Image exceeds 10 MB"));
    }

    Ok(DecodedImage { bytes, extension })
}

fn extension_for(subtype: &str) -> &'static str {
    match subtype.to_ascii_lowercase().as_str() {
        "png" => "png",
        "gif" => "gif",
        "webp" => "webp",
        _ => "jpg",
    }
}
