use crate::config;
use crate::model::post_id::PostId;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use tracing::warn;

/// Attempts per put/delete before giving up. Blob writes happen after the
/// owning transaction commits, so a lost write is recoverable by re-upload.
const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, thiserror::Error)]
#[error("Object store {operation} of '{key}' failed: {source}")]
pub struct StorageError {
    operation: &'static str,
    key: String,
    source: Box<dyn std::error::Error + Send + Sync>,
}

/// Content-addressed blob store for originals and renditions. All keys are
/// relative to one bucket and prefixed with the owning post id, which
/// partitions concurrent writes by post.
#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
    bucket: String,
}

impl ObjectStore {
    pub async fn connect() -> Self {
        let store_config = &config::get().object_store;
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(store_config.region.to_string()));
        if let Some(endpoint) = &store_config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(store_config.endpoint.is_some())
            .build();
        Self {
            client: Client::from_conf(s3_config),
            bucket: store_config.bucket.to_string(),
        }
    }

    pub async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let result = self
                .client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .content_type(content_type)
                .body(ByteStream::from(data.clone()))
                .send()
                .await;
            match result {
                Ok(_) => return Ok(()),
                Err(err) if attempt < MAX_ATTEMPTS => {
                    warn!("Object store put of '{key}' failed on attempt {attempt}: {err}");
                }
                Err(err) => {
                    return Err(StorageError {
                        operation: "put",
                        key: key.to_owned(),
                        source: Box::new(err),
                    });
                }
            }
        }
        unreachable!("put loop always returns")
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let result = self
                .client
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await;
            match result {
                Ok(_) => return Ok(()),
                Err(err) if attempt < MAX_ATTEMPTS => {
                    warn!("Object store delete of '{key}' failed on attempt {attempt}: {err}");
                }
                Err(err) => {
                    return Err(StorageError {
                        operation: "delete",
                        key: key.to_owned(),
                        source: Box::new(err),
                    });
                }
            }
        }
        unreachable!("delete loop always returns")
    }
}

/// Object keys for everything stored under a single post.
#[derive(Clone, Copy)]
pub struct PostKeys {
    post_id: PostId,
}

impl PostKeys {
    pub fn new(post_id: PostId) -> Self {
        Self { post_id }
    }

    pub fn original(&self, filename: &str) -> String {
        format!("{}/{filename}", self.post_id)
    }

    pub fn thumbnail_webp(&self, size: u32) -> String {
        format!("{}/thumbnails/{size}.webp", self.post_id)
    }

    pub fn thumbnail_jpeg(&self, size: u32) -> String {
        format!("{}/thumbnails/{size}.jpg", self.post_id)
    }

    pub fn icon(&self, handle: &str, extension: &str) -> String {
        format!("{}/icons/{}.{extension}", self.post_id, handle.to_lowercase())
    }

    pub fn banner(&self, handle: &str, extension: &str) -> String {
        format!("{}/banners/{}.{extension}", self.post_id, handle.to_lowercase())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key_layout() {
        let keys = PostKeys::new(PostId::decode("AAAAAAAB").unwrap());
        assert_eq!(keys.original("fox.png"), "AAAAAAAB/fox.png");
        assert_eq!(keys.original("fox-web.png"), "AAAAAAAB/fox-web.png");
        assert_eq!(keys.thumbnail_webp(100), "AAAAAAAB/thumbnails/100.webp");
        assert_eq!(keys.thumbnail_jpeg(1200), "AAAAAAAB/thumbnails/1200.jpg");
        assert_eq!(keys.icon("Kit", "webp"), "AAAAAAAB/icons/kit.webp");
        assert_eq!(keys.banner("Kit", "jpg"), "AAAAAAAB/banners/kit.jpg");
    }
}
