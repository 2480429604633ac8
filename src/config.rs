use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

/// Where the store snapshot lives.
#[derive(Debug, Clone, Deserialize)]
pub enum StoreBackend {
    File { path: PathBuf },
    S3(S3Config),
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub object_key: String,
}

/// Reserved administrator account created at bootstrap.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: StoreBackend,
    pub admin: AdminSeed,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = match env_or("STORE_BACKEND", "file").as_str() {
            "file" => StoreBackend::File {
                path: PathBuf::from(env_or("STORE_PATH", "data/wanderly.json")),
            },
            "s3" => StoreBackend::S3(S3Config {
                endpoint: std::env::var("S3_ENDPOINT").context("S3_ENDPOINT")?,
                bucket: std::env::var("S3_BUCKET").context("S3_BUCKET")?,
                access_key: std::env::var("S3_ACCESS_KEY").context("S3_ACCESS_KEY")?,
                secret_key: std::env::var("S3_SECRET_KEY").context("S3_SECRET_KEY")?,
                region: env_or("S3_REGION", "us-east-1"),
                object_key: env_or("STORE_OBJECT_KEY", "wanderly/store.json"),
            }),
            other => anyhow::bail!("unknown STORE_BACKEND {other:?}, expected \"file\" or \"s3\""),
        };

        let admin = AdminSeed {
            email: env_or("ADMIN_EMAIL", "admin@wanderly.travel")
                .trim()
                .to_lowercase(),
            password: env_or("ADMIN_PASSWORD", "admin123"),
            full_name: env_or("ADMIN_NAME", "Administrator"),
        };

        let port = std::env::var("APP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);

        Ok(Self {
            host: env_or("APP_HOST", "0.0.0.0"),
            port,
            backend,
            admin,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}
