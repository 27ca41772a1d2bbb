use anyhow::{Context, Result};
use std::sync::Arc;

use crate::api::{self, Character, Episode};

pub trait EpisodeService: Send + Sync {
    fn all_episodes(&self) -> Result<Vec<Episode>>;
}

pub trait CharacterService: Send + Sync {
    fn characters_for(&self, episode: &Episode) -> Result<Vec<Character>>;
}

pub struct ApiEpisodeService {
    client: Arc<api::Client>,
}

impl ApiEpisodeService {
    pub fn new(client: Arc<api::Client>) -> Self {
        Self { client }
    }
}

impl EpisodeService for ApiEpisodeService {
    fn all_episodes(&self) -> Result<Vec<Episode>> {
        self.client.episodes().context("fetch episode collection")
    }
}

pub struct ApiCharacterService {
    client: Arc<api::Client>,
}

impl ApiCharacterService {
    pub fn new(client: Arc<api::Client>) -> Self {
        Self { client }
    }
}

impl CharacterService for ApiCharacterService {
    fn characters_for(&self, episode: &Episode) -> Result<Vec<Character>> {
        self.client
            .characters(&episode.character_ids())
            .context("fetch episode characters")
    }
}

#[derive(Default)]
pub struct MockEpisodeService;

impl EpisodeService for MockEpisodeService {
    fn all_episodes(&self) -> Result<Vec<Episode>> {
        Ok(mock_episodes())
    }
}

#[derive(Default)]
pub struct MockCharacterService;

impl CharacterService for MockCharacterService {
    fn characters_for(&self, _episode: &Episode) -> Result<Vec<Character>> {
        Ok(vec![
            Character {
                id: 1,
                name: "Rick Sanchez".into(),
                species: "Human".into(),
                status: "Alive".into(),
                image: String::new(),
            },
            Character {
                id: 2,
                name: "Morty Smith".into(),
                species: "Human".into(),
                status: "Alive".into(),
                image: String::new(),
            },
        ])
    }
}

fn mock_episodes() -> Vec<Episode> {
    vec![
        Episode {
            id: 1,
            name: "Pilot".into(),
            episode: "S01E01".into(),
            air_date: "December 2, 2013".into(),
            characters: vec![
                "https://rickandmortyapi.com/api/character/1".into(),
                "https://rickandmortyapi.com/api/character/2".into(),
            ],
        },
        Episode {
            id: 2,
            name: "Lawnmower Dog".into(),
            episode: "S01E02".into(),
            air_date: "December 9, 2013".into(),
            characters: vec!["https://rickandmortyapi.com/api/character/1".into()],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_services_round_trip_through_trait_objects() {
        let episodes: Arc<dyn EpisodeService + Send + Sync> = Arc::new(MockEpisodeService);
        let characters: Arc<dyn CharacterService + Send + Sync> = Arc::new(MockCharacterService);

        let all = episodes.all_episodes().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].episode, "S01E01");

        let cast = characters.characters_for(&all[0]).unwrap();
        assert_eq!(cast[0].name, "Rick Sanchez");
    }
}
