//! Feed API settings.

/// Default API host.
pub const DEFAULT_ENDPOINT: &str = "https://us.api.blizzard.com";

/// Default OAuth token endpoint for the client-credentials exchange.
pub const DEFAULT_TOKEN_URL: &str = "https://oauth.battle.net/token";

/// Default realm.
pub const DEFAULT_REALM: &str = "thrall";

/// Default locale.
pub const DEFAULT_LOCALE: &str = "en_US";

/// Where and how to list snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// API base URL, without a trailing slash.
    pub endpoint: String,
    /// Realm whose snapshots are listed. Also the destination key prefix.
    pub realm: String,
    /// Locale passed to the API.
    pub locale: String,
    /// Pre-issued bearer token. Takes precedence over client credentials.
    pub access_token: Option<String>,
    /// OAuth client id, exchanged with `client_secret` for a token on every
    /// listing.
    pub client_id: Option<String>,
    /// OAuth client secret.
    pub client_secret: Option<String>,
    /// Where client credentials are exchanged for a token.
    pub token_url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            realm: DEFAULT_REALM.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            access_token: None,
            client_id: None,
            client_secret: None,
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

impl FeedConfig {
    /// Reads `FEED_API_ENDPOINT`, `FEED_REALM`, `FEED_LOCALE`,
    /// `FEED_ACCESS_TOKEN`, `FEED_CLIENT_ID` (or `WOW_CLIENT_ID`),
    /// `FEED_CLIENT_SECRET` (or `WOW_CLIENT_SECRET`) and `FEED_TOKEN_URL`,
    /// using the defaults for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: std::env::var("FEED_API_ENDPOINT").unwrap_or(defaults.endpoint),
            realm: std::env::var("FEED_REALM").unwrap_or(defaults.realm),
            locale: std::env::var("FEED_LOCALE").unwrap_or(defaults.locale),
            access_token: optional_env("FEED_ACCESS_TOKEN"),
            client_id: optional_env("FEED_CLIENT_ID").or_else(|| optional_env("WOW_CLIENT_ID")),
            client_secret: optional_env("FEED_CLIENT_SECRET")
                .or_else(|| optional_env("WOW_CLIENT_SECRET")),
            token_url: std::env::var("FEED_TOKEN_URL").unwrap_or(defaults.token_url),
        }
    }

    /// Client id and secret, if both are set.
    #[must_use]
    pub fn client_credentials(&self) -> Option<(&str, &str)> {
        Some((self.client_id.as_deref()?, self.client_secret.as_deref()?))
    }

    /// URL of the snapshot listing for the configured realm.
    #[must_use]
    pub fn listing_url(&self) -> String {
        format!(
            "{}/wow/auction/data/{}",
            self.endpoint.trim_end_matches('/'),
            self.realm
        )
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
