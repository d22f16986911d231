//! Destination configuration.
//!
//! [`MirrorConfig`] is a plain value passed to [`crate::Mirror`]. The only
//! place the environment is consulted is [`MirrorConfig::from_env`], which
//! binaries call once at startup.

use crate::MirrorError;

/// Default destination for syncs that don't name one explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorConfig {
    /// Fallback destination bucket.
    pub bucket: Option<String>,
    /// Destination region. `None` defers to the SDK's region chain.
    pub region: Option<String>,
    /// Endpoint override for S3-compatible services.
    pub endpoint_url: Option<String>,
}

impl MirrorConfig {
    /// Reads `S3_BUCKET` (or `AWS_S3_BUCKET`), `AWS_REGION` (or
    /// `AWS_DEFAULT_REGION`) and `AWS_ENDPOINT_URL`.
    ///
    /// Missing variables are left as `None`; a missing bucket only becomes
    /// an error when a sync needs it.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            bucket: optional_env("S3_BUCKET").or_else(|| optional_env("AWS_S3_BUCKET")),
            region: optional_env("AWS_REGION").or_else(|| optional_env("AWS_DEFAULT_REGION")),
            endpoint_url: optional_env("AWS_ENDPOINT_URL"),
        }
    }

    /// Returns a copy with the bucket and region overridden where given.
    #[must_use]
    pub fn with_overrides(&self, bucket: Option<&str>, region: Option<&str>) -> Self {
        Self {
            bucket: bucket.map(String::from).or_else(|| self.bucket.clone()),
            region: region.map(String::from).or_else(|| self.region.clone()),
            endpoint_url: self.endpoint_url.clone(),
        }
    }

    /// Picks the explicit bucket if given, otherwise the configured one.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Configuration`] if neither is set.
    pub fn resolve_bucket(&self, explicit: Option<&str>) -> Result<String, MirrorError> {
        explicit
            .map(String::from)
            .or_else(|| self.bucket.clone())
            .ok_or_else(|| {
                log::error!("No S3 bucket name configured");
                MirrorError::Configuration {
                    message: "No S3 bucket name configured".to_string(),
                }
            })
    }
}

/// Reads an environment variable, treating unset and empty the same.
fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_bucket_wins() {
        let config = MirrorConfig {
            bucket: Some("fallback".to_string()),
            ..MirrorConfig::default()
        };
        assert_eq!(config.resolve_bucket(Some("explicit")).unwrap(), "explicit");
        assert_eq!(config.resolve_bucket(None).unwrap(), "fallback");
    }

    #[test]
    fn missing_bucket_is_configuration_error() {
        let err = MirrorConfig::default().resolve_bucket(None).unwrap_err();
        assert!(matches!(err, MirrorError::Configuration { .. }));
    }

    #[test]
    fn overrides_keep_unset_fields() {
        let config = MirrorConfig {
            bucket: Some("b".to_string()),
            region: Some("us-east-1".to_string()),
            endpoint_url: Some("http://localhost:9000".to_string()),
        };

        let overridden = config.with_overrides(None, Some("eu-west-1"));

        assert_eq!(overridden.bucket.as_deref(), Some("b"));
        assert_eq!(overridden.region.as_deref(), Some("eu-west-1"));
        assert_eq!(overridden.endpoint_url, config.endpoint_url);
    }
}
