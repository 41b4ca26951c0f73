use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use serde::Deserialize;

use crate::config::{resolve_access_token, StorageConfig};
use crate::error::{PipelineError, Result};
use crate::upload::BlobStore;

#[derive(Debug, Deserialize)]
struct ObjectResource {
    name: String,
    bucket: String,
}

/// Google Cloud Storage media upload over the JSON API.
pub struct GcsBlobStore {
    endpoint: String,
    bucket: String,
    prefix: String,
    access_token: String,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for GcsBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcsBlobStore")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl GcsBlobStore {
    pub fn from_config(config: &StorageConfig) -> anyhow::Result<Self> {
        if config.bucket.is_empty() {
            anyhow::bail!("Storage bucket not configured. Set [storage] bucket in wavscribe.toml");
        }
        let access_token = resolve_access_token(&config.access_token)?;

        // Uploads of long recordings are slow; no request timeout.
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .build()
            .context("Failed to build storage HTTP client")?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            prefix: config.prefix.trim_matches('/').to_string(),
            access_token,
            client,
        })
    }

    fn object_name(&self, local_path: &Path) -> Result<String> {
        let file_name = local_path
            .file_name()
            .ok_or_else(|| PipelineError::FileNotFound(local_path.to_path_buf()))?
            .to_string_lossy();
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        Ok(object_name(&self.prefix, &stamp.to_string(), &file_name))
    }

    fn upload_url(&self, object: &str) -> Result<url::Url> {
        let mut url = url::Url::parse(&format!(
            "{}/upload/storage/v1/b/{}/o",
            self.endpoint, self.bucket
        ))
        .map_err(|e| PipelineError::UploadFailure(format!("invalid storage endpoint: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", object);
        Ok(url)
    }
}

fn object_name(prefix: &str, stamp: &str, file_name: &str) -> String {
    if prefix.is_empty() {
        format!("{}-{}", stamp, file_name)
    } else {
        format!("{}/{}-{}", prefix, stamp, file_name)
    }
}

impl BlobStore for GcsBlobStore {
    fn name(&self) -> &str {
        "gcs"
    }

    fn upload(&self, local_path: &Path) -> Result<String> {
        let file = std::fs::File::open(local_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PipelineError::FileNotFound(local_path.to_path_buf()),
            _ => PipelineError::Io(e),
        })?;
        let object = self.object_name(local_path)?;
        let url = self.upload_url(&object)?;

        tracing::info!("Uploading {} to gs://{}/{}", local_path.display(), self.bucket, object);

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(reqwest::blocking::Body::from(file))
            .send()
            .map_err(|e| PipelineError::UploadFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(PipelineError::UploadFailure(format!(
                "storage returned HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let resource: ObjectResource = response
            .json()
            .map_err(|e| PipelineError::UploadFailure(format!("unreadable upload response: {}", e)))?;

        Ok(format!("gs://{}/{}", resource.bucket, resource.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> StorageConfig {
        StorageConfig {
            bucket: "clips".to_string(),
            access_token: "token".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_config_requires_bucket() {
        let config = StorageConfig {
            access_token: "token".to_string(),
            ..Default::default()
        };
        let err = GcsBlobStore::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("bucket"));
    }

    #[test]
    fn test_object_name_with_and_without_prefix() {
        assert_eq!(
            object_name("wavscribe", "20261016-120000", "talk1.wav"),
            "wavscribe/20261016-120000-talk1.wav"
        );
        assert_eq!(object_name("", "20261016-120000", "a.wav"), "20261016-120000-a.wav");
    }

    #[test]
    fn test_upload_url_encodes_object_name() {
        let store = GcsBlobStore::from_config(&configured()).unwrap();
        let url = store.upload_url("wavscribe/20261016-120000-my talk.wav").unwrap();
        assert!(url
            .as_str()
            .starts_with("https://storage.googleapis.com/upload/storage/v1/b/clips/o?"));
        assert!(url.as_str().contains("uploadType=media"));
        assert!(url.as_str().contains("name=wavscribe%2F20261016-120000-my+talk.wav"));
    }

    #[test]
    fn test_upload_missing_file_is_file_not_found() {
        let store = GcsBlobStore::from_config(&configured()).unwrap();
        let result = store.upload(Path::new("/nonexistent/clip.wav"));
        assert!(matches!(result, Err(PipelineError::FileNotFound(_))));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = StorageConfig {
            access_token: "gcs-secret-token".to_string(),
            ..configured()
        };
        let store = GcsBlobStore::from_config(&config).unwrap();
        let debug_output = format!("{:?}", store);
        assert!(!debug_output.contains("gcs-secret-token"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
