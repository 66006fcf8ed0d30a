use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Connection settings for the ClickHouse destination.
///
/// This intentionally does not implement [`Serialize`] to avoid accidentally
/// leaking the password into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct ClickHouseConnectionConfig {
    /// HTTP(S) endpoint of the ClickHouse server.
    pub url: String,
    /// User to authenticate as.
    pub user: String,
    /// Optional password for the user.
    pub password: Option<SecretString>,
    /// Database the mirrored tables live in.
    pub database: String,
}

impl ClickHouseConnectionConfig {
    /// Validates the connection settings.
    ///
    /// Ensures the endpoint is an HTTP(S) URL and the database is set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ValidationError::ClickHouseConnectionInvalid(format!(
                "`url` must start with http:// or https://, got `{}`",
                self.url
            )));
        }

        if self.database.is_empty() {
            return Err(ValidationError::ClickHouseConnectionInvalid(
                "`database` cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Same as [`ClickHouseConnectionConfig`] but without secrets. This type
/// implements [`Serialize`] because it does not contain secrets so is safe
/// to serialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickHouseConnectionConfigWithoutSecrets {
    /// HTTP(S) endpoint of the ClickHouse server.
    pub url: String,
    /// User to authenticate as.
    pub user: String,
    /// Database the mirrored tables live in.
    pub database: String,
}

impl From<ClickHouseConnectionConfig> for ClickHouseConnectionConfigWithoutSecrets {
    fn from(value: ClickHouseConnectionConfig) -> Self {
        ClickHouseConnectionConfigWithoutSecrets {
            url: value.url,
            user: value.user,
            database: value.database,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str, database: &str) -> ClickHouseConnectionConfig {
        ClickHouseConnectionConfig {
            url: url.to_string(),
            user: "default".to_string(),
            password: None,
            database: database.to_string(),
        }
    }

    #[test]
    fn accepts_http_and_https_urls() {
        assert!(config("http://localhost:8123", "analytics").validate().is_ok());
        assert!(config("https://ch.example.com", "analytics").validate().is_ok());
    }

    #[test]
    fn rejects_non_http_url() {
        assert!(config("tcp://localhost:9000", "analytics").validate().is_err());
    }

    #[test]
    fn rejects_empty_database() {
        assert!(config("http://localhost:8123", "").validate().is_err());
    }

    #[test]
    fn secret_free_mirror_drops_the_password() {
        let mut with_password = config("http://localhost:8123", "analytics");
        with_password.password = Some("hunter2".to_string().into());

        let mirror: ClickHouseConnectionConfigWithoutSecrets = with_password.into();
        assert_eq!(mirror.url, "http://localhost:8123");
        assert_eq!(mirror.user, "default");
        assert_eq!(mirror.database, "analytics");
    }
}
