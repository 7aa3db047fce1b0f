use std::path::{Path, PathBuf};

use anyhow::Context as _;
use async_trait::async_trait;
use base64::Engine as _;
use sha2::Digest as _;
use tokio::fs;

use crate::api::ArticleStore;
use crate::error::{Result, SeoError};
use crate::formats::{NewSavedArticle, SavedArticle};

/// Image formats accepted for upload, by extension and content type.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
];

/// Saved articles and uploaded images under one data directory.
///
/// Layout: `articles/<uuid>.json` and `images/<sha256>.<ext>`.
#[derive(Debug, Clone)]
pub struct LocalFsArticleStore {
    base_dir: PathBuf,
    public_url: String,
}

impl LocalFsArticleStore {
    /// `public_url` prefixes the URLs returned for uploaded images.
    pub fn new(base_dir: impl Into<PathBuf>, public_url: &str) -> Self {
        Self {
            base_dir: base_dir.into(),
            public_url: public_url.trim_end_matches('/').to_owned(),
        }
    }

    fn articles_dir(&self) -> PathBuf {
        self.base_dir.join("articles")
    }

    fn article_json_path(&self, id: &str) -> PathBuf {
        self.articles_dir().join(format!("{id}.json"))
    }

    pub fn images_dir(&self) -> PathBuf {
        self.base_dir.join("images")
    }

    /// Resolves a stored image file name, or `None` if it is not one we wrote.
    pub fn image_path(&self, file_name: &str) -> Option<(PathBuf, &'static str)> {
        let (hash, ext) = file_name.split_once('.')?;
        if hash.len() != 64 || !hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return None;
        }
        let content_type = IMAGE_TYPES
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, content_type)| *content_type)?;
        Some((self.images_dir().join(file_name), content_type))
    }
}

#[async_trait]
impl ArticleStore for LocalFsArticleStore {
    async fn list(&self) -> Result<Vec<SavedArticle>> {
        let dir = self.articles_dir();
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(anyhow::Error::new(err)
                    .context(format!("read dir: {}", dir.display()))
                    .into());
            }
        };

        let mut articles = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("read dir entry: {}", dir.display()))?
        {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match read_json::<SavedArticle>(&path).await {
                Ok(Some(article)) => articles.push(article),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %format!("{err:#}"), "skip unreadable article");
                }
            }
        }

        articles.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then_with(|| a.id.cmp(&b.id)));
        Ok(articles)
    }

    async fn create(&self, article: &NewSavedArticle) -> Result<SavedArticle> {
        if article.articles.is_empty() {
            return Err(SeoError::NoContent);
        }

        let saved = SavedArticle {
            id: uuid::Uuid::new_v4().to_string(),
            saved_at: chrono::Utc::now(),
            record: article.clone(),
        };
        write_json_atomic(&self.article_json_path(&saved.id), &saved)
            .await
            .context("write article json")?;

        tracing::info!(id = %saved.id, primary_keyword = %saved.record.primary_keyword, "article stored");
        Ok(saved)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        if uuid::Uuid::parse_str(id).is_err() {
            return Err(SeoError::NotFound(format!("article {id}")));
        }

        let path = self.article_json_path(id);
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(id, "article removed");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(SeoError::NotFound(format!("article {id}")))
            }
            Err(err) => Err(anyhow::Error::new(err)
                .context(format!("remove: {}", path.display()))
                .into()),
        }
    }

    async fn upload_image(&self, image_data: &str) -> Result<String> {
        let (declared_type, bytes) = decode_image_data(image_data)?;
        let ext = sniff_image_ext(&bytes)
            .or_else(|| {
                declared_type.and_then(|declared| {
                    IMAGE_TYPES
                        .iter()
                        .find(|(_, content_type)| *content_type == declared)
                        .map(|(ext, _)| *ext)
                })
            })
            .ok_or_else(|| SeoError::Validation("unsupported image type".to_owned()))?;

        let hash = hex::encode(sha2::Sha256::digest(&bytes));
        let file_name = format!("{hash}.{ext}");
        let path = self.images_dir().join(&file_name);

        if fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(file = %file_name, "image already stored");
        } else {
            write_bytes_atomic(&path, &bytes)
                .await
                .context("write image")?;
            tracing::info!(file = %file_name, bytes = bytes.len(), "image stored");
        }

        Ok(format!("{}/images/{file_name}", self.public_url))
    }
}

/// Accepts `data:<type>;base64,<payload>` or bare base64.
fn decode_image_data(image_data: &str) -> Result<(Option<&str>, Vec<u8>)> {
    let image_data = image_data.trim();
    let (declared_type, payload) = match image_data.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| SeoError::Validation("malformed data URL".to_owned()))?;
            let Some(content_type) = header.strip_suffix(";base64") else {
                return Err(SeoError::Validation("data URL must be base64 encoded".to_owned()));
            };
            (Some(content_type), payload)
        }
        None => (None, image_data),
    };

    if payload.is_empty() {
        return Err(SeoError::Validation("image data is empty".to_owned()));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|err| SeoError::Validation(format!("invalid base64 image data: {err}")))?;
    Ok((declared_type, bytes))
}

fn sniff_image_ext(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let value = serde_json::from_slice(&bytes).context("parse json")?;
    Ok(Some(value))
}

async fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let data = serde_json::to_vec_pretty(value).context("serialize json")?;
    write_bytes_atomic(path, &data).await
}

async fn write_bytes_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("path has no parent: {}", path.display()))?;
    fs::create_dir_all(parent)
        .await
        .with_context(|| format!("create parent dir: {}", parent.display()))?;

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    fs::write(&tmp_path, data)
        .await
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("rename tmp to final: {}", path.display()))?;
    Ok(())
}
