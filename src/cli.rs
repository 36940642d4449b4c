use clap::Parser;
use url::Url;

use crate::client::http_client;
use crate::config::ConfigDir;
use crate::error::{Error, Result};
use crate::prompts::TerminalPrompt;
use crate::session::{Invocation, Reporter, Session};

#[derive(Parser, Debug)]
#[command(name = "shorten", version, arg_required_else_help = true)]
#[command(about = "Turn long URLs into shortlinks on your shortlinks server", long_about = None)]
pub struct Cli {
    /// URLs to shorten
    #[arg(value_name = "URL")]
    pub urls: Vec<Url>,

    /// Server URL to use for making shortlinks; saved as the default and logs in again
    #[arg(short = 's', long, value_name = "URL")]
    pub set_server: Option<Url>,

    /// The shortlink path to request from the server (single URL only)
    #[arg(short = 'c', long, value_name = "CODE")]
    pub request_code: Option<String>,

    /// Print only the resulting shortlinks
    #[arg(short, long)]
    pub plain: bool,

    /// Log in again even if a session token is saved
    #[arg(long, conflicts_with = "logout")]
    pub login: bool,

    /// Remove the saved session token and exit
    #[arg(long, conflicts_with_all = ["urls", "set_server", "request_code"])]
    pub logout: bool,

    /// Username for login (prompted when missing)
    #[arg(long, env = "SHORTLINKS_USERNAME")]
    pub username: Option<String>,

    /// Password for login (prompted when missing)
    #[arg(long, env = "SHORTLINKS_PASSWORD", hide = true, hide_env_values = true)]
    pub password: Option<String>,

    /// One-time code for login (prompted when missing)
    #[arg(long, env = "SHORTLINKS_OTP", hide = true, hide_env_values = true)]
    pub otp: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn invocation(&self) -> Result<Option<Invocation>> {
        if self.logout {
            return Ok(Some(Invocation::logout()));
        }
        if self.urls.is_empty() && self.set_server.is_none() && !self.login {
            return Ok(None);
        }

        let invocation = Invocation::new(
            self.urls.clone(),
            self.request_code.clone(),
            self.set_server.clone(),
        )?;
        Ok(Some(invocation.with_login(self.login)))
    }

    pub async fn run(self, config_dir: ConfigDir) -> Result<()> {
        let Some(invocation) = self.invocation()? else {
            return Err(Error::Usage(
                "Nothing to do. Pass URLs to shorten, or one of --set-server, --login, --logout."
                    .to_string(),
            ));
        };

        let prompt = TerminalPrompt {
            username: self.username,
            password: self.password,
            one_time_code: self.otp,
        };
        let session = Session::new(&config_dir, http_client()?, &prompt);
        let mut reporter = Reporter::new(self.plain, std::io::stdout(), std::io::stderr());

        session.run(&invocation, &mut reporter).await
    }
}
