use std::process::Command;

use derive_getters::Getters;
use serde::Deserialize;

use crate::config::ConfigError;

#[derive(Debug, Deserialize, Getters)]
pub struct PlainAuthConfig {
    user: String,
    #[getter(skip)]
    password_cmd: String,
}

impl PlainAuthConfig {
    /// Runs `password_cmd` and returns its trimmed output.
    pub fn password(&self) -> Result<String, ConfigError> {
        let mut cmd_parts = self.password_cmd.split_whitespace();
        let mut cmd = Command::new(cmd_parts.next().ok_or(ConfigError::EmptyPasswordCommand)?);
        cmd.args(cmd_parts);
        let output = cmd.output().map_err(ConfigError::PasswordCommand)?;

        let password = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        if password.is_empty() {
            return Err(ConfigError::NoPassword);
        }
        Ok(password)
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum AuthConfig {
    Plain(PlainAuthConfig),
}

#[cfg(test)]
mod tests {
    use assertables::*;
    use rstest::*;

    use super::*;

    fn plain(password_cmd: &str) -> PlainAuthConfig {
        PlainAuthConfig {
            user: "user".to_string(),
            password_cmd: password_cmd.to_string(),
        }
    }

    #[rstest]
    fn test_password_is_trimmed_output() {
        assert_eq!("hunter2", assert_ok!(plain("echo hunter2").password()));
    }

    #[rstest]
    #[case("")]
    #[case("true")]
    fn test_missing_password_is_an_error(#[case] password_cmd: &str) {
        assert_err!(plain(password_cmd).password());
    }
}
