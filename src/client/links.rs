use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use super::{server_base, SessionToken};
use crate::error::Result;

/// One link to shorten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortenRequest {
    pub link: Url,
    #[serde(rename = "requestedCode", skip_serializing_if = "Option::is_none")]
    pub requested_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortenOutcome {
    /// Full shortlink: server endpoint joined with the returned path.
    Created(String),
    Rejected { status: u16, message: String },
}

pub struct ShortenClient<'a> {
    client: &'a Client,
    server: &'a Url,
    token: &'a SessionToken,
}

impl<'a> ShortenClient<'a> {
    pub fn new(client: &'a Client, server: &'a Url, token: &'a SessionToken) -> Self {
        Self {
            client,
            server,
            token,
        }
    }

    /// `POST {server}` with a bearer token. Only 201 counts as created.
    ///
    /// A non-201 answer is an `Ok(Rejected)`; `Err` is reserved for transport failures.
    pub async fn submit(&self, request: &ShortenRequest) -> Result<ShortenOutcome> {
        debug!(link = %request.link, code = ?request.requested_code, "submitting link");
        let response = self
            .client
            .post(self.server.as_str())
            .bearer_auth(self.token.as_str())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        let body = String::from_utf8_lossy(&body).into_owned();

        if status == StatusCode::CREATED {
            Ok(ShortenOutcome::Created(format!(
                "{}/{}",
                server_base(self.server),
                body
            )))
        } else {
            warn!(link = %request.link, status = status.as_u16(), "server rejected link");
            Ok(ShortenOutcome::Rejected {
                status: status.as_u16(),
                message: body,
            })
        }
    }
}
