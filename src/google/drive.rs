//! Remote Uploader: page images → Google Drive files with a public link.
//!
//! The Slides API fetches inserted images by URL, so each page is uploaded
//! to Drive and shared "anyone with the link can view". Two calls per image,
//! no retries: any failure aborts the run and files already uploaded stay.

use crate::error::Pdf2SlidesError;
use crate::google::api::{send, send_json};
use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A stored image and the public URL Slides will fetch it from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteAsset {
    pub file_id: String,
    /// Id of the "anyone / reader" permission, used to revoke it later.
    pub permission_id: Option<String>,
    pub url: String,
}

/// Public download URL for a Drive file.
pub fn public_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?id={file_id}&export=download")
}

/// Cloud storage for page images.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store `png` under `name`, make it publicly readable, return its URL.
    async fn upload(&self, name: &str, png: &[u8]) -> Result<RemoteAsset, Pdf2SlidesError>;

    /// Remove the public-read grant from `asset`.
    async fn revoke_public(&self, asset: &RemoteAsset) -> Result<(), Pdf2SlidesError>;

    /// Delete the stored object.
    async fn delete(&self, asset: &RemoteAsset) -> Result<(), Pdf2SlidesError>;
}

/// Drive v3 REST client authorised with one access token.
pub struct DriveClient {
    http: reqwest::Client,
    access_token: String,
    upload_base: String,
    base: String,
}

#[derive(Deserialize)]
struct IdOnly {
    id: String,
}

impl DriveClient {
    pub fn new(
        http: reqwest::Client,
        access_token: impl Into<String>,
        upload_base: impl Into<String>,
        base: impl Into<String>,
    ) -> Self {
        Self {
            http,
            access_token: access_token.into(),
            upload_base: upload_base.into(),
            base: base.into(),
        }
    }

    /// `files.create` with a multipart (metadata + media) body.
    pub async fn create_file(
        &self,
        name: &str,
        mime_type: &str,
        content: &[u8],
    ) -> Result<String, Pdf2SlidesError> {
        let boundary = multipart_boundary();
        let metadata = serde_json::json!({ "name": name, "mimeType": mime_type });
        let body = multipart_related_body(&boundary, &metadata, mime_type, content);

        let request = self
            .http
            .post(format!("{}/files", self.upload_base))
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .bearer_auth(&self.access_token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body);

        let created: IdOnly = send_json("Drive upload", request).await?;
        debug!("Uploaded {} → file {}", name, created.id);
        Ok(created.id)
    }

    /// `permissions.create {type: anyone, role: reader}`.
    pub async fn grant_public_read(&self, file_id: &str) -> Result<String, Pdf2SlidesError> {
        let request = self
            .http
            .post(format!("{}/files/{}/permissions", self.base, file_id))
            .query(&[("fields", "id")])
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "type": "anyone", "role": "reader" }));

        let permission: IdOnly = send_json("Drive share", request).await?;
        Ok(permission.id)
    }
}

#[async_trait]
impl AssetStore for DriveClient {
    async fn upload(&self, name: &str, png: &[u8]) -> Result<RemoteAsset, Pdf2SlidesError> {
        let file_id = self.create_file(name, "image/png", png).await?;
        let permission_id = self.grant_public_read(&file_id).await?;
        Ok(RemoteAsset {
            url: public_url(&file_id),
            file_id,
            permission_id: Some(permission_id),
        })
    }

    async fn revoke_public(&self, asset: &RemoteAsset) -> Result<(), Pdf2SlidesError> {
        let Some(permission_id) = asset.permission_id.as_deref() else {
            return Ok(());
        };
        let request = self
            .http
            .delete(format!(
                "{}/files/{}/permissions/{}",
                self.base, asset.file_id, permission_id
            ))
            .bearer_auth(&self.access_token);
        send("Drive unshare", request).await.map(|_| ())
    }

    async fn delete(&self, asset: &RemoteAsset) -> Result<(), Pdf2SlidesError> {
        let request = self
            .http
            .delete(format!("{}/files/{}", self.base, asset.file_id))
            .bearer_auth(&self.access_token);
        send("Drive delete", request).await.map(|_| ())
    }
}

fn multipart_boundary() -> String {
    let tail: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();
    format!("pdf2slides_{tail}")
}

/// Assemble a `multipart/related` body: JSON metadata part, then media part.
pub fn multipart_related_body(
    boundary: &str,
    metadata: &serde_json::Value,
    media_type: &str,
    content: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 512);
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("--{boundary}\r\nContent-Type: {media_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
