//! Object download from blob storage onto local disk.

use std::path::Path;

use async_trait::async_trait;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use tokio::fs;
use tracing::info;

use crate::types::FerryError;

/// Capability to copy one named object out of blob storage.
///
/// Implementations create any missing parent directories of `dest` before
/// writing and return the number of bytes written. A missing object, a
/// service failure, or a failed local write all surface as
/// [`FerryError::Transfer`]; callers abort rather than retry.
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    async fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64, FerryError>;
}

/// [`ObjectFetcher`] backed by an S3-compatible endpoint.
///
/// Credentials come from the default discovery chain (environment, profile,
/// instance metadata) at fetch time, so construction itself cannot fail.
#[derive(Clone, Debug)]
pub struct S3ObjectFetcher {
    region: String,
}

impl S3ObjectFetcher {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }
}

#[async_trait]
impl ObjectFetcher for S3ObjectFetcher {
    async fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64, FerryError> {
        let region: Region = self
            .region
            .parse()
            .map_err(|err| FerryError::Transfer(format!("region '{}': {err}", self.region)))?;
        let credentials =
            Credentials::default().map_err(|err| FerryError::Transfer(err.to_string()))?;
        let bucket = Bucket::new(bucket, region, credentials)
            .map_err(|err| FerryError::Transfer(err.to_string()))?;

        let response = bucket
            .get_object(key)
            .await
            .map_err(|err| FerryError::Transfer(format!("object '{key}': {err}")))?;
        if response.status_code() != 200 {
            return Err(FerryError::Transfer(format!(
                "object '{key}' fetch returned status {}",
                response.status_code()
            )));
        }

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|err| FerryError::Transfer(err.to_string()))?;
            }
        }
        fs::write(dest, response.bytes())
            .await
            .map_err(|err| FerryError::Transfer(err.to_string()))?;

        let written = response.bytes().len() as u64;
        info!(key, bytes = written, dest = %dest.display(), "object downloaded");
        Ok(written)
    }
}
