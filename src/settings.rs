use cloudflare::framework::auth::Credentials;
use cloudflare::framework::Environment;
use config::{Config, ConfigError, File};
use serde::Deserialize;
use url::Url;

use crate::plan::{CleanupPlan, SetupPlan};

const USER_CONFIG: &str = "~/.config/pages-provision/pages";

#[derive(Debug, Deserialize)]
pub struct Settings {
    /// `CLOUDFLARE_ACCOUNT_ID`
    pub account_id: String,

    /// `CLOUDFLARE_API_TOKEN`
    pub api_token: Option<String>,
    pub email: Option<String>,
    pub api_key: Option<String>,

    /// Overrides the API base url, e.g. for a local mock server.
    pub api_url: Option<String>,
    pub ttl: Option<u32>,

    #[serde(default)]
    pub log_json: bool,

    #[serde(default)]
    pub setup: SetupPlan,
    #[serde(default)]
    pub cleanup: CleanupPlan,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            .add_source(File::with_name("pages").required(false))
            .add_source(File::with_name(&shellexpand::tilde(USER_CONFIG)).required(false))
            .add_source(config::Environment::with_prefix("CLOUDFLARE"))
            .build()?;

        cfg.try_deserialize()
    }

    /// Prefers an API token, falling back to the global key.
    pub fn credentials(&mut self) -> Result<Credentials, ConfigError> {
        if let Some(token) = self.api_token.take() {
            Ok(Credentials::UserAuthToken { token })
        } else if let (Some(email), Some(key)) = (self.email.take(), self.api_key.take()) {
            Ok(Credentials::UserAuthKey { email, key })
        } else {
            Err(ConfigError::Message(
                "missing cloudflare credentials, set CLOUDFLARE_API_TOKEN".to_owned(),
            ))
        }
    }

    pub fn environment(&self) -> Result<Environment, ConfigError> {
        let Some(raw) = &self.api_url else {
            return Ok(Environment::Production);
        };

        let mut url = Url::parse(raw)
            .map_err(|e| ConfigError::Message(format!("invalid api_url {raw}: {e}")))?;
        // Endpoint paths are joined onto the base, which drops a last segment
        // that has no trailing slash.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Environment::Custom(url))
    }
}
