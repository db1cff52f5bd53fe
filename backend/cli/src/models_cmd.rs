//! CLI Models Command
//!
//! Lists the models visible to the configured key and the one auto-selection
//! would pick.

use anyhow::Result;
use signvision_config::SignVisionConfig;
use signvision_gateway::provider_settings;
use signvision_providers::{connect, select_model};

use crate::terminal_output::{note_info, note_success, note_warn, render_table};

pub async fn run(config: &SignVisionConfig) -> Result<()> {
    let mut settings = provider_settings(&config.model)?;
    settings.auto_select = false;
    let provider = connect(&settings).await?;

    println!("\nModels available to {} key\n", provider.name());
    let models = provider.list_models().await?;
    if models.is_empty() {
        note_warn("The provider returned no models");
    } else {
        let rows: Vec<Vec<String>> = models
            .iter()
            .map(|m| vec![m.name.clone(), m.display_name.clone()])
            .collect();
        print!("{}", render_table(&["NAME", "DISPLAY NAME"], &rows));
        println!();
    }

    let names: Vec<String> = models.into_iter().map(|m| m.name).collect();
    let selection = select_model(&names, &settings.chain);
    note_info(&format!("Preferred model: {}", settings.chain.primary()));
    note_success(&format!("Would use: {} ({})", selection.model, selection.reason));
    Ok(())
}
