use std::str::FromStr;
use std::time::Duration;

use memora_core::session::MAX_PHOTO_BYTES;

use crate::auth::jwt::JwtConfig;

/// `CORS_ORIGINS` entry that admits every origin.
pub const ANY_ORIGIN: &str = "*";

/// Room for the JSON around an inline photo.
const BODY_ENVELOPE_BYTES: usize = 2 * 1024 * 1024;

/// Default body limit: the largest accepted photo plus its envelope, so an
/// oversized photo gets a validation error rather than a bare 413.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = MAX_PHOTO_BYTES + BODY_ENVELOPE_BYTES;

/// Server configuration loaded from environment variables.
///
/// Everything except `JWT_SECRET` has a development default.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed to call the API. [`ANY_ORIGIN`] admits all.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Base URL of the guest frontend, used to build event join links.
    pub public_base_url: String,
    /// Seeds the stored admin hash on first start only.
    pub admin_password: String,
    /// Largest accepted request body (photos and backgrounds travel inline).
    pub max_upload_bytes: usize,
    /// Idle lifetime of a guest session.
    pub session_ttl_mins: u64,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `PUBLIC_BASE_URL`      | `http://localhost:5173`    |
    /// | `ADMIN_PASSWORD`       | `memora2024`               |
    /// | `MAX_UPLOAD_BYTES`     | `10485760`                 |
    /// | `SESSION_TTL_MINS`     | `120`                      |
    ///
    /// Panics on a value that does not parse.
    pub fn from_env() -> Self {
        let max_upload_bytes = env_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES);
        if max_upload_bytes <= MAX_PHOTO_BYTES {
            tracing::warn!(
                max_upload_bytes,
                max_photo_bytes = MAX_PHOTO_BYTES,
                "MAX_UPLOAD_BYTES is below the photo limit; large photos will be cut off at the body limit"
            );
        }

        let public_base_url = env_or("PUBLIC_BASE_URL", "http://localhost:5173".to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            host: env_or("HOST", "0.0.0.0".to_string()),
            port: env_or("PORT", 3000),
            cors_origins: split_origins(&env_or(
                "CORS_ORIGINS",
                "http://localhost:5173".to_string(),
            )),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            public_base_url,
            admin_password: env_or("ADMIN_PASSWORD", "memora2024".to_string()),
            max_upload_bytes,
            session_ttl_mins: env_or("SESSION_TTL_MINS", 120),
            jwt: JwtConfig::from_env(),
        }
    }

    /// Link a guest opens to join `code`'s event (also the QR payload).
    pub fn join_url(&self, code: &str) -> String {
        format!("{}/?event={code}", self.public_base_url)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_mins * 60)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == ANY_ORIGIN)
    }
}

fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            split_origins(" https://a.test, ,https://b.test,"),
            vec!["https://a.test".to_string(), "https://b.test".to_string()]
        );
    }

    #[test]
    fn default_body_limit_admits_the_largest_photo() {
        assert!(DEFAULT_MAX_UPLOAD_BYTES > MAX_PHOTO_BYTES);
        assert_eq!(DEFAULT_MAX_UPLOAD_BYTES, 10 * 1024 * 1024);
    }

    #[test]
    fn join_url_carries_event_code() {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: vec![ANY_ORIGIN.into()],
            request_timeout_secs: 30,
            public_base_url: "https://memora.test".into(),
            admin_password: "memora2024".into(),
            max_upload_bytes: 1024,
            session_ttl_mins: 2,
            jwt: JwtConfig {
                secret: "secret".into(),
                expiry_mins: 60,
            },
        };
        assert_eq!(config.join_url("AB12CD"), "https://memora.test/?event=AB12CD");
        assert_eq!(config.session_ttl(), Duration::from_secs(120));
        assert!(config.allows_any_origin());
    }
}
