/// Configuration management for the registration and sales server.
/// Every option can be given on the command line or through the environment.
use crate::db::replica::{RetryPolicy, DEFAULT_PROBE_TIMEOUT, DEFAULT_WRITE_TIMEOUT};
use crate::face::{FaceApiConfig, DEFAULT_COMPARE_URL};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "QRTix Server")]
#[command(about = "User registration, face login and ticket sales backend", long_about = None)]
pub struct Config {
    /// Interface to bind the HTTP server to
    #[arg(long, env = "QRTIX_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port (default: 8080)
    #[arg(long, env = "QRTIX_PORT", default_value = "8080")]
    pub port: u16,

    /// Primary (authoritative) SQLite database file
    #[arg(long, env = "PRIMARY_DATABASE", default_value = "qrtixpro.db")]
    pub database: PathBuf,

    /// Mirror SQLite database file (optional) - receives best-effort copies of every write
    #[arg(long, env = "MIRROR_DATABASE")]
    pub mirror_database: Option<PathBuf>,

    /// Only origin allowed by CORS
    #[arg(long, env = "CORS_ORIGIN", default_value = "http://localhost:3000")]
    pub cors_origin: String,

    #[arg(long, env = "FACE_API_URL", default_value = DEFAULT_COMPARE_URL)]
    pub face_api_url: String,

    #[arg(long, env = "FACE_API_KEY", default_value = "", hide_env_values = true)]
    pub face_api_key: String,

    #[arg(long, env = "FACE_API_SECRET", default_value = "", hide_env_values = true)]
    pub face_api_secret: String,

    #[arg(long, env = "FACE_API_TIMEOUT_SECONDS", default_value = "10")]
    pub face_api_timeout_seconds: u64,

    /// Attempts for mirror updates (inserts and deletes are always single-shot)
    #[arg(long, env = "MIRROR_RETRY_ATTEMPTS", default_value = "3")]
    pub mirror_retry_attempts: u32,

    #[arg(long, env = "MIRROR_RETRY_DELAY_SECONDS", default_value = "2")]
    pub mirror_retry_delay_seconds: u64,
}

impl Config {
    /// Parse command-line arguments into Config
    pub fn from_args() -> Self {
        Config::parse()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn face_api(&self) -> FaceApiConfig {
        FaceApiConfig {
            compare_url: self.face_api_url.clone(),
            api_key: self.face_api_key.clone(),
            api_secret: self.face_api_secret.clone(),
            timeout: Duration::from_secs(self.face_api_timeout_seconds),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.mirror_retry_attempts,
            delay: Duration::from_secs(self.mirror_retry_delay_seconds),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::try_parse_from(["qrtix-server"]).expect("Defaults should parse");
        assert_eq!(config.port, 8080);
        assert_eq!(config.database, PathBuf::from("qrtixpro.db"));
        assert!(config.mirror_database.is_none());
        assert_eq!(config.cors_origin, "http://localhost:3000");
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_mirror_and_retry_flags() {
        let config = Config::try_parse_from([
            "qrtix-server",
            "--mirror-database",
            "/tmp/mirror.db",
            "--mirror-retry-attempts",
            "5",
            "--mirror-retry-delay-seconds",
            "1",
        ])
        .expect("Flags should parse");

        assert_eq!(config.mirror_database, Some(PathBuf::from("/tmp/mirror.db")));
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay, Duration::from_secs(1));
    }

    #[test]
    fn test_face_api_config() {
        let config = Config::try_parse_from([
            "qrtix-server",
            "--face-api-url",
            "http://127.0.0.1:9999/compare",
            "--face-api-key",
            "k",
            "--face-api-secret",
            "s",
            "--face-api-timeout-seconds",
            "3",
        ])
        .expect("Flags should parse");

        let face = config.face_api();
        assert_eq!(face.compare_url, "http://127.0.0.1:9999/compare");
        assert_eq!(face.api_key, "k");
        assert_eq!(face.timeout, Duration::from_secs(3));
    }
}
