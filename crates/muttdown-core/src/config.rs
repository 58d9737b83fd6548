//! YAML configuration.
//!
//! Every key is optional. An empty file gives the defaults, and unknown keys
//! are rejected:
//!
//! ```yaml
//! smtp_host: smtp.example.com
//! smtp_port: 465
//! smtp_ssl: true
//! smtp_username: me@example.com
//! smtp_password_command: pass show mail/example
//! css_file: ~/.config/muttdown/style.css
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// File name of the default configuration in the home directory.
pub const DEFAULT_FILE_NAME: &str = ".muttdown.yaml";

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// SMTP relay host.
    pub smtp_host: String,
    /// SMTP relay port.
    pub smtp_port: u16,
    /// Use implicit TLS; when false the connection is upgraded with STARTTLS.
    pub smtp_ssl: bool,
    /// SMTP user name; empty disables authentication.
    pub smtp_username: String,
    /// SMTP password.
    pub smtp_password: Option<String>,
    /// Shell command printing the SMTP password.
    pub smtp_password_command: Option<String>,
    /// Timeout in seconds for every SMTP operation.
    pub smtp_timeout: u64,
    /// Stylesheet inlined into rendered HTML.
    pub css_file: Option<PathBuf>,
    /// Convert text parts even without the `!m` sigil.
    pub assume_markdown: bool,
    /// Local delivery command used with `--sendmail-passthru`.
    pub sendmail: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            smtp_host: "127.0.0.1".to_string(),
            smtp_port: 25,
            smtp_ssl: true,
            smtp_username: String::new(),
            smtp_password: None,
            smtp_password_command: None,
            smtp_timeout: 10,
            css_file: None,
            assume_markdown: false,
            sendmail: "/usr/sbin/sendmail".to_string(),
        }
    }
}

impl Config {
    /// Returns `~/.muttdown.yaml`, if the home directory is known.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_FILE_NAME))
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed YAML, unknown keys, wrong value types,
    /// or conflicting password settings.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let mut config = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str::<Option<Self>>(text)?.unwrap_or_default()
        };
        config.css_file = config.css_file.map(|path| expand_home(&path));
        config.validate()?;
        Ok(config)
    }

    /// Checks settings that cannot be expressed in the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if both `smtp_password` and `smtp_password_command`
    /// are set.
    pub fn validate(&self) -> Result<()> {
        let has_password = self.smtp_password.as_deref().is_some_and(|p| !p.is_empty());
        let has_command = self
            .smtp_password_command
            .as_deref()
            .is_some_and(|c| !c.is_empty());
        if has_password && has_command {
            return Err(Error::Config(
                "Cannot set smtp_password *and* smtp_password_command".into(),
            ));
        }
        Ok(())
    }

    /// Returns the SMTP password, running `smtp_password_command` if set.
    ///
    /// Trailing newlines of the command output are removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be run or exits unsuccessfully.
    pub fn smtp_password(&self) -> Result<Option<String>> {
        let Some(command) = self
            .smtp_password_command
            .as_deref()
            .filter(|c| !c.is_empty())
        else {
            return Ok(self.smtp_password.clone());
        };

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .map_err(|e| Error::PasswordCommand(e.to_string()))?;
        if !output.status.success() {
            return Err(Error::PasswordCommand(format!(
                "{command:?} exited with {}",
                output.status
            )));
        }

        let password = String::from_utf8(output.stdout)
            .map_err(|_| Error::PasswordCommand("output is not valid UTF-8".into()))?;
        Ok(Some(password.trim_end_matches('\n').to_string()))
    }

    /// Returns the sendmail command split into program and arguments.
    #[must_use]
    pub fn sendmail_command(&self) -> Vec<String> {
        self.sendmail.split_whitespace().map(str::to_owned).collect()
    }

    /// Returns the SMTP timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.smtp_timeout)
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
