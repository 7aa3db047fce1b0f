use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SeoError};
use crate::formats::{NewSavedArticle, SavedArticle};

/// Where saved articles and uploaded images live.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn list(&self) -> Result<Vec<SavedArticle>>;
    /// Persists `article`; the store assigns `id` and `savedAt`.
    async fn create(&self, article: &NewSavedArticle) -> Result<SavedArticle>;
    async fn delete(&self, id: &str) -> Result<()>;
    /// Stores a base64 image (bare or as a `data:` URL) and returns its public URL.
    async fn upload_image(&self, image_data: &str) -> Result<String>;
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageRequest {
    pub image_data: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadImageResponse {
    pub url: String,
}

/// REST client for the article backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &url::Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| SeoError::Transport(format!("build http client: {err}")))?;
        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_owned(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|err| SeoError::Transport(format!("{what}: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), what, "article backend error");
            return Err(SeoError::Persistence {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn json<T: serde::de::DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T> {
        response
            .json()
            .await
            .map_err(|err| SeoError::Transport(format!("decode {what} response: {err}")))
    }
}

#[async_trait]
impl ArticleStore for ApiClient {
    async fn list(&self) -> Result<Vec<SavedArticle>> {
        let response = self
            .send(self.client.get(self.endpoint("articles")), "GET /articles")
            .await?;
        Self::json(response, "list").await
    }

    async fn create(&self, article: &NewSavedArticle) -> Result<SavedArticle> {
        let response = self
            .send(
                self.client.post(self.endpoint("articles")).json(article),
                "POST /articles",
            )
            .await?;
        let saved: SavedArticle = Self::json(response, "create").await?;
        tracing::info!(id = %saved.id, "article saved");
        Ok(saved)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = format!("articles/{id}");
        self.send(self.client.delete(self.endpoint(&path)), "DELETE /articles")
            .await?;
        tracing::info!(id, "article deleted");
        Ok(())
    }

    async fn upload_image(&self, image_data: &str) -> Result<String> {
        let body = UploadImageRequest {
            image_data: image_data.to_owned(),
        };
        let response = self
            .send(
                self.client.post(self.endpoint("images/upload")).json(&body),
                "POST /images/upload",
            )
            .await?;
        let uploaded: UploadImageResponse = Self::json(response, "upload").await?;
        Ok(uploaded.url)
    }
}
