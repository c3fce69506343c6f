use derive_getters::Getters;
use serde::Deserialize;

use crate::{account::AccountSettings, config::auth::AuthConfig};

#[derive(Debug, Deserialize, Getters)]
pub struct AccountConfig {
    host: String,
    #[getter(skip)]
    port: u16,
    auth: AuthConfig,
    /// Whether the server keeps message uids across moves.
    #[getter(skip)]
    #[serde(default)]
    resilient_server_ids: bool,
}

impl AccountConfig {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn settings(&self) -> AccountSettings {
        AccountSettings {
            resilient_server_ids: self.resilient_server_ids,
        }
    }
}
