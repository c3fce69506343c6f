use std::{collections::HashMap, fs::read_to_string, path::PathBuf};

use derive_getters::Getters;
use log::debug;
use serde::Deserialize;

use crate::config::{AccountConfig, ConfigError, xdg_dir};

#[derive(Debug, Deserialize, Getters)]
pub struct Config {
    #[serde(default = "statedir")]
    statedir: PathBuf,
    accounts: HashMap<String, AccountConfig>,
}

impl Config {
    pub fn load_from_file(file: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = file.unwrap_or_else(default_location);
        debug!("loading config from {}", path.display());
        let contents = read_to_string(&path).map_err(|source| ConfigError::Read { path, source })?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn account(&self, name: &str) -> Result<&AccountConfig, ConfigError> {
        self.accounts
            .get(name)
            .ok_or_else(|| ConfigError::UnknownAccount(name.to_string()))
    }

    pub fn account_state_dir(&self, account: &str) -> PathBuf {
        self.statedir.join(account)
    }
}

fn default_location() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config").join("config.toml")
}

fn statedir() -> PathBuf {
    xdg_dir("XDG_STATE_HOME", ".local/state")
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use assertables::*;
    use rstest::*;
    use tempfile::TempDir;

    use super::*;
    use crate::config::AuthConfig;

    const CONFIG: &str = r#"
statedir = "/var/lib/imapcore"

[accounts.work]
host = "imap.example.org"
port = 993
resilient_server_ids = true

[accounts.work.auth]
type = "Plain"
user = "me@example.org"
password_cmd = "pass show work"

[accounts.home]
host = "mail.example.net"
port = 143

[accounts.home.auth]
type = "Plain"
user = "me"
password_cmd = "echo secret"
"#;

    #[fixture]
    fn dir() -> TempDir {
        tempfile::tempdir().expect("temp dir should be creatable")
    }

    fn write(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("config.toml");
        fs::write(&path, contents).expect("config should be writable");
        path
    }

    #[rstest]
    fn test_accounts_are_parsed(dir: TempDir) {
        let config = assert_ok!(Config::load_from_file(Some(write(dir.path(), CONFIG))));

        assert_eq!(Path::new("/var/lib/imapcore"), config.statedir().as_path());
        let work = assert_ok!(config.account("work"));
        assert_eq!("imap.example.org", work.host());
        assert_eq!(993, work.port());
        assert!(work.settings().resilient_server_ids);
        let AuthConfig::Plain(auth) = work.auth();
        assert_eq!("me@example.org", auth.user());

        let home = assert_ok!(config.account("home"));
        assert!(!home.settings().resilient_server_ids);
        assert_eq!(
            Path::new("/var/lib/imapcore/home"),
            config.account_state_dir("home")
        );
    }

    #[rstest]
    fn test_unknown_account_is_an_error(dir: TempDir) {
        let config = assert_ok!(Config::load_from_file(Some(write(dir.path(), CONFIG))));
        assert_matches!(config.account("nope"), Err(ConfigError::UnknownAccount(_)));
    }

    #[rstest]
    fn test_missing_file_is_an_error(dir: TempDir) {
        assert_matches!(
            Config::load_from_file(Some(dir.path().join("absent.toml"))),
            Err(ConfigError::Read { .. })
        );
    }

    #[rstest]
    fn test_malformed_file_is_an_error(dir: TempDir) {
        assert_matches!(
            Config::load_from_file(Some(write(dir.path(), "accounts = 3"))),
            Err(ConfigError::Parse(_))
        );
    }
}
