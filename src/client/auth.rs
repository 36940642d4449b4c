use reqwest::header::HeaderValue;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use super::{server_base, SessionToken};
use crate::error::{Error, Result};

/// Login credentials. Lives only for one authentication exchange.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    #[serde(rename = "otp")]
    pub one_time_code: String,
}

/// Source of login credentials: an interactive prompt in the binary, a stub in tests.
pub trait CredentialProvider {
    fn collect(&self) -> anyhow::Result<Credentials>;
}

pub struct AuthClient<'a> {
    client: &'a Client,
    server: &'a Url,
}

impl<'a> AuthClient<'a> {
    pub fn new(client: &'a Client, server: &'a Url) -> Self {
        Self { client, server }
    }

    /// Exchange credentials for a session token via `POST {server}/login`.
    ///
    /// Persisting the token is left to the caller.
    pub async fn authenticate(&self, provider: &dyn CredentialProvider) -> Result<SessionToken> {
        let credentials = provider.collect().map_err(Error::Prompt)?;
        let url = format!("{}/login", server_base(self.server));
        info!(%url, username = %credentials.username, "logging in");

        let response = self.client.post(&url).json(&credentials).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            warn!(status = status.as_u16(), "login rejected");
            return Err(Error::Auth {
                status: status.as_u16(),
                body,
            });
        }

        // Every later submission carries the token in an Authorization header.
        let token = String::from_utf8(body.to_vec())
            .ok()
            .filter(|raw| HeaderValue::from_str(&format!("Bearer {raw}")).is_ok())
            .and_then(SessionToken::new)
            .ok_or(Error::InvalidToken)?;
        debug!("login succeeded");
        Ok(token)
    }
}
