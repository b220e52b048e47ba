//! Prompts command handler.

use clap::Args;
use reviewlens_core::{config::AppConfig, AppResult};
use reviewlens_prompt::{list_prompts, load_prompt};

/// List or show prompt definitions
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Show the effective definition of one prompt
    #[arg(long)]
    pub show: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing prompts command");

        if let Some(ref id) = self.show {
            let definition = load_prompt(&config.workspace, id)?;
            if self.json {
                println!("{}", serde_json::to_string_pretty(&definition)?);
            } else {
                print!("{}", serde_yaml::to_string(&definition)?);
            }
            return Ok(());
        }

        let ids = list_prompts(&config.workspace)?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&ids)?);
        } else {
            for id in ids {
                println!("{}", id);
            }
        }

        Ok(())
    }
}
