use anyhow::{Context, Result};
use inquire::{validator::Validation, Password, PasswordDisplayMode, Text};
use std::error::Error;

use crate::client::{CredentialProvider, Credentials};

/// Asks on the terminal for whichever credential fields were not pre-supplied.
#[derive(Debug, Default)]
pub struct TerminalPrompt {
    pub username: Option<String>,
    pub password: Option<String>,
    pub one_time_code: Option<String>,
}

impl CredentialProvider for TerminalPrompt {
    fn collect(&self) -> Result<Credentials> {
        let username = match &self.username {
            Some(username) => username.clone(),
            None => prompt_username()?,
        };
        let password = match &self.password {
            Some(password) => password.clone(),
            None => prompt_password()?,
        };
        let one_time_code = match &self.one_time_code {
            Some(code) => code.clone(),
            None => prompt_one_time_code()?,
        };

        Ok(Credentials {
            username,
            password,
            one_time_code,
        })
    }
}

fn not_empty(input: &str) -> Result<Validation, Box<dyn Error + Send + Sync>> {
    if input.trim().is_empty() {
        Ok(Validation::Invalid("Value cannot be empty".into()))
    } else {
        Ok(Validation::Valid)
    }
}

/// Prompt for the login name
fn prompt_username() -> Result<String> {
    Text::new("Username:")
        .with_validator(not_empty)
        .prompt()
        .map(|username| username.trim().to_string())
        .context("Failed to read username input")
}

/// Prompt for the password, masked
fn prompt_password() -> Result<String> {
    Password::new("Password:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read password input")
}

/// Prompt for the one-time code
fn prompt_one_time_code() -> Result<String> {
    Text::new("One-time code:")
        .with_validator(not_empty)
        .prompt()
        .map(|code| code.trim().to_string())
        .context("Failed to read one-time code input")
}
