use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api;
use crate::config;
use crate::data::{self, CharacterService, EpisodeService};
use crate::ui;

pub fn run() -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;

    let user_agent = if cfg.api.user_agent.trim().is_empty() {
        format!("rm-tui/{}", crate::VERSION)
    } else {
        cfg.api.user_agent.clone()
    };

    let mut episode_service: Option<Arc<dyn EpisodeService + Send + Sync>> = None;
    let mut character_service: Option<Arc<dyn CharacterService + Send + Sync>> = None;
    let status: String;

    match api::Client::new(api::ClientConfig {
        user_agent,
        timeout: Some(cfg.api.timeout),
        ..api::ClientConfig::default()
    }) {
        Ok(client) => {
            let client = Arc::new(client);
            episode_service = Some(Arc::new(data::ApiEpisodeService::new(client.clone())));
            character_service = Some(Arc::new(data::ApiCharacterService::new(client)));
            status = "Loading episodes…".to_string();
        }
        Err(err) => {
            status = format!("Failed to initialize API client: {err}");
        }
    }

    let fetch_episodes_on_start = episode_service.is_some();
    let options = ui::Options {
        status_message: status,
        episodes: Vec::new(),
        episode_service,
        character_service,
        fetch_episodes_on_start,
    };

    let mut model = ui::Model::new(options);
    model.run()
}
