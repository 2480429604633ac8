use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use uuid::Uuid;

use crate::config::{S3Config, StoreBackend};

/// Opaque byte sink/source holding the whole store snapshot.
#[async_trait]
pub trait DurableMedium: Send + Sync {
    /// `None` when nothing has been written yet.
    async fn read(&self) -> anyhow::Result<Option<Bytes>>;
    async fn write(&self, body: Bytes) -> anyhow::Result<()>;
    fn describe(&self) -> String;
}

pub async fn medium_from_config(
    backend: &StoreBackend,
) -> anyhow::Result<std::sync::Arc<dyn DurableMedium>> {
    Ok(match backend {
        StoreBackend::File { path } => std::sync::Arc::new(FileMedium::new(path.clone())),
        StoreBackend::S3(cfg) => std::sync::Arc::new(S3Medium::new(cfg).await?),
    })
}

// ---- file ----

#[derive(Debug, Clone)]
pub struct FileMedium {
    path: PathBuf,
}

impl FileMedium {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DurableMedium for FileMedium {
    async fn read(&self) -> anyhow::Result<Option<Bytes>> {
        match tokio::fs::read(&self.path).await {
            Ok(buf) => Ok(Some(Bytes::from(buf))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", self.path.display())),
        }
    }

    /// Writes to a sibling temp file and renames it over the target.
    async fn write(&self, body: Bytes) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let tmp = self.path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        if let Err(e) = tokio::fs::write(&tmp, &body).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("write {}", tmp.display()));
        }
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("rename {} -> {}", tmp.display(), self.path.display()))?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }
}

// ---- s3 blob ----

#[derive(Clone)]
pub struct S3Medium {
    client: Client,
    bucket: String,
    key: String,
}

impl S3Medium {
    pub async fn new(cfg: &S3Config) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
            key: cfg.object_key.clone(),
        })
    }
}

#[async_trait]
impl DurableMedium for S3Medium {
    async fn read(&self) -> anyhow::Result<Option<Bytes>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await;

        let out = match resp {
            Ok(out) => out,
            Err(e) => {
                let service = e.into_service_error();
                if service.is_no_such_key() {
                    return Ok(None);
                }
                return Err(anyhow::Error::new(service).context("s3 get_object"));
            }
        };

        let body = out
            .body
            .collect()
            .await
            .context("s3 read body")?
            .into_bytes();
        Ok(Some(body))
    }

    async fn write(&self, body: Bytes) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .body(ByteStream::from(body))
            .content_type("application/json")
            .send()
            .await
            .context("s3 put_object")?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

// ---- memory ----

/// Keeps the snapshot in process memory. Optionally fails every write.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryMedium {
    bytes: tokio::sync::Mutex<Option<Bytes>>,
    fail_writes: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl MemoryMedium {
    pub fn with_bytes(bytes: Bytes) -> Self {
        Self {
            bytes: tokio::sync::Mutex::new(Some(bytes)),
            ..Default::default()
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub async fn contents(&self) -> Option<Bytes> {
        self.bytes.lock().await.clone()
    }
}

#[cfg(test)]
#[async_trait]
impl DurableMedium for MemoryMedium {
    async fn read(&self) -> anyhow::Result<Option<Bytes>> {
        Ok(self.bytes.lock().await.clone())
    }

    async fn write(&self, body: Bytes) -> anyhow::Result<()> {
        if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
            anyhow::bail!("memory medium rejected write");
        }
        *self.bytes.lock().await = Some(body);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}
