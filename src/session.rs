use std::io::Write;

use colored::Colorize;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::client::{
    AuthClient, CredentialProvider, SessionToken, ShortenClient, ShortenOutcome, ShortenRequest,
};
use crate::config::{ConfigDir, ServerStore, TokenStore};
use crate::error::{Error, Result};

/// What a single run of the tool was asked to do.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    links: Vec<Url>,
    requested_code: Option<String>,
    set_server: Option<Url>,
    force_login: bool,
    logout: bool,
}

impl Invocation {
    /// Validates argument combinations before anything touches disk or network.
    pub fn new(
        links: Vec<Url>,
        requested_code: Option<String>,
        set_server: Option<Url>,
    ) -> Result<Self> {
        if requested_code.is_some() && links.len() != 1 {
            return Err(Error::Usage(
                "--request-code is only valid when shortening a single URL".to_string(),
            ));
        }

        Ok(Self {
            links,
            requested_code,
            set_server,
            ..Self::default()
        })
    }

    pub fn with_login(mut self, force_login: bool) -> Self {
        self.force_login = force_login;
        self
    }

    pub fn logout() -> Self {
        Self {
            logout: true,
            ..Self::default()
        }
    }

    fn requests(&self) -> impl Iterator<Item = ShortenRequest> + '_ {
        self.links.iter().map(|link| ShortenRequest {
            link: link.clone(),
            requested_code: self.requested_code.clone(),
        })
    }
}

/// Writes per-link results as they complete.
pub struct Reporter<O, E> {
    plain: bool,
    out: O,
    err: E,
}

impl<O: Write, E: Write> Reporter<O, E> {
    pub fn new(plain: bool, out: O, err: E) -> Self {
        Self { plain, out, err }
    }

    fn created(&mut self, link: &Url, shortlink: &str) -> Result<()> {
        let written = if self.plain {
            writeln!(self.out, "{shortlink}")
        } else {
            writeln!(
                self.out,
                "Successfully created shortlink pointing from {} to {}",
                link,
                shortlink.green().bold()
            )
        };
        written
            .and_then(|()| self.out.flush())
            .map_err(Error::Output)
    }

    fn rejected(&mut self, link: &Url, status: u16, message: &str) -> Result<()> {
        writeln!(
            self.err,
            "{} {status} shortening {link}: {message}",
            "Error".red().bold()
        )
        .map_err(Error::Output)
    }

    fn notice(&mut self, message: &str) -> Result<()> {
        if self.plain {
            return Ok(());
        }
        writeln!(self.out, "{} {message}", "✓".green())
            .and_then(|()| self.out.flush())
            .map_err(Error::Output)
    }
}

pub struct Session<'a> {
    servers: ServerStore,
    tokens: TokenStore,
    client: Client,
    credentials: &'a dyn CredentialProvider,
}

impl<'a> Session<'a> {
    pub fn new(
        config_dir: &ConfigDir,
        client: Client,
        credentials: &'a dyn CredentialProvider,
    ) -> Self {
        Self {
            servers: config_dir.server_store(),
            tokens: config_dir.token_store(),
            client,
            credentials,
        }
    }

    /// One pass: resolve server, resolve token, submit links in order.
    ///
    /// A rejected link is reported and the batch continues; the run then ends
    /// with `SubmissionsFailed`. A transport error stops the batch at once.
    pub async fn run<O: Write, E: Write>(
        &self,
        invocation: &Invocation,
        reporter: &mut Reporter<O, E>,
    ) -> Result<()> {
        if invocation.logout {
            let removed = self.tokens.clear()?;
            info!(removed, "cleared session token");
            return reporter.notice(if removed {
                "Logged out"
            } else {
                "No saved session to remove"
            });
        }

        let (server, must_login) = match &invocation.set_server {
            Some(server) => {
                self.servers.set(server)?;
                // The old server's token must never reach the new host.
                self.tokens.clear()?;
                info!(%server, path = %self.servers.path().display(), "default server updated");
                (server.clone(), true)
            }
            None => {
                let server = self.servers.get()?.ok_or(Error::ServerNotConfigured)?;
                (server, invocation.force_login)
            }
        };

        let cached = if must_login { None } else { self.tokens.get()? };
        let token = match cached {
            Some(token) => token,
            None => self.login(&server).await?,
        };

        if invocation.links.is_empty() {
            let message = if invocation.set_server.is_some() {
                format!("Default server set to {server}")
            } else {
                format!("Logged in to {server}")
            };
            return reporter.notice(&message);
        }

        self.submit_all(&server, &token, invocation, reporter).await
    }

    async fn login(&self, server: &Url) -> Result<SessionToken> {
        debug!(%server, "no usable session token, authenticating");
        let token = AuthClient::new(&self.client, server)
            .authenticate(self.credentials)
            .await?;
        self.tokens.set(&token)?;
        info!(path = %self.tokens.path().display(), "session token saved");
        Ok(token)
    }

    async fn submit_all<O: Write, E: Write>(
        &self,
        server: &Url,
        token: &SessionToken,
        invocation: &Invocation,
        reporter: &mut Reporter<O, E>,
    ) -> Result<()> {
        let client = ShortenClient::new(&self.client, server, token);
        let total = invocation.links.len();
        let mut failed = 0;

        for request in invocation.requests() {
            match client.submit(&request).await? {
                ShortenOutcome::Created(shortlink) => reporter.created(&request.link, &shortlink)?,
                ShortenOutcome::Rejected { status, message } => {
                    failed += 1;
                    reporter.rejected(&request.link, status, &message)?;
                }
            }
        }

        if failed > 0 {
            Err(Error::SubmissionsFailed { failed, total })
        } else {
            Ok(())
        }
    }
}
