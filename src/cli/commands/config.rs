//! `teamspace config`: print the effective configuration.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Show the API key instead of masking it
    #[arg(long)]
    pub show_secrets: bool,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ConfigOutput(pub Config);

impl CommandOutput for ConfigOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.0).unwrap_or_default()
    }
}

pub async fn execute(args: ConfigArgs, json_mode: bool) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    if !args.show_secrets {
        mask_secrets(&mut config);
    }
    output(&ConfigOutput(config), json_mode);
    Ok(())
}

fn mask_secrets(config: &mut Config) {
    if let Some(key) = config.embedding.api_key.as_mut() {
        *key = "********".to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_masked() {
        let mut config = Config::default();
        config.embedding.api_key = Some("sk-live".to_string());
        mask_secrets(&mut config);

        let human = ConfigOutput(config).to_human();
        assert!(!human.contains("sk-live"));
        assert!(human.contains("********"));
    }
}
