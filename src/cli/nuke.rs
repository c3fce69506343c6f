use std::fs::remove_dir_all;

use log::trace;

use crate::config::Config;

pub fn nuke(config: &Config, account: &str) -> anyhow::Result<()> {
    let state = config.account_state_dir(account);
    if state.try_exists()? {
        trace!("removing {}", state.display());
        remove_dir_all(state)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use assertables::*;
    use rstest::*;

    use super::*;

    #[rstest]
    fn test_nuke_removes_only_the_account() {
        let dir = tempfile::tempdir().expect("temp dir should be creatable");
        let config: Config = toml::from_str(&format!(
            "statedir = {:?}\n[accounts]\n",
            dir.path().display().to_string()
        ))
        .expect("config should parse");
        fs::create_dir_all(config.account_state_dir("work")).expect("state should be creatable");
        fs::create_dir_all(config.account_state_dir("home")).expect("state should be creatable");

        assert_ok!(nuke(&config, "work"));
        assert_ok!(nuke(&config, "work"));

        assert!(!config.account_state_dir("work").exists());
        assert!(config.account_state_dir("home").exists());
    }
}
