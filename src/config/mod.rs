mod account;
mod auth;
mod imapcore;

use std::{env, io, path::PathBuf};

use thiserror::Error;

pub use account::AccountConfig;
pub use auth::AuthConfig;
pub use auth::PlainAuthConfig;
pub use imapcore::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no account named {0} is configured")]
    UnknownAccount(String),
    #[error("password_cmd is empty")]
    EmptyPasswordCommand,
    #[error("could not run password_cmd: {0}")]
    PasswordCommand(#[source] io::Error),
    #[error("password_cmd did not print a password")]
    NoPassword,
}

/// `$XDG_<kind>_HOME/imapcore`, falling back to `$HOME/<fallback>/imapcore`.
fn xdg_dir(variable: &str, fallback: &str) -> PathBuf {
    let mut dir = match env::var_os(variable) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let mut home = env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
            home.push(fallback);
            home
        }
    };
    dir.push(env!("CARGO_PKG_NAME"));
    dir
}
