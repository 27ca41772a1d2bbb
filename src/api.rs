use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::USER_AGENT;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://rickandmortyapi.com/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

// Upper bound on cursor hops while collecting the episode list. The API
// currently serves three pages; the cap only matters if `info.next`
// never resolves to null.
const MAX_EPISODE_PAGES: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub http_client: Option<HttpClient>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("api: resource not found: {url}")]
    NotFound { url: String },
    #[error("api: rate limited: {body}")]
    RateLimited { body: String },
    #[error("api: request failed with status {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug)]
pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: String,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            bail!("api client user agent required");
        }

        let base = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Url::parse(&base).context("api: invalid base url")?;

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout.unwrap_or(DEFAULT_TIMEOUT))
                .build()?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url: base.trim_end_matches('/').to_string(),
        })
    }

    /// Collects the full episode list by following the `info.next` cursor
    /// until it is null, concatenating pages in return order. Stops after
    /// `MAX_EPISODE_PAGES` hops even if the cursor never nulls out.
    pub fn episodes(&self) -> Result<Vec<Episode>> {
        let mut url = format!("{}/episode", self.base_url);
        let mut all = Vec::new();

        for _ in 0..MAX_EPISODE_PAGES {
            let page: Page<Episode> = self
                .get_json(&url)
                .with_context(|| format!("api: fetch episode page {url}"))?;
            all.extend(page.results);
            match page.info.next {
                Some(next) => url = next,
                None => break,
            }
        }

        Ok(all)
    }

    /// Batch lookup keyed by a comma-joined id list. The API answers with
    /// a bare object when exactly one id is requested and an array
    /// otherwise; both shapes are accepted. Returned order follows the
    /// requested order.
    pub fn characters(&self, ids: &[i64]) -> Result<Vec<Character>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let joined = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/character/{}", self.base_url, joined);
        let batch: CharacterBatch = self
            .get_json(&url)
            .with_context(|| format!("api: fetch characters {joined}"))?;
        Ok(batch.into_vec())
    }

    fn get_json<T>(&self, url: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let resp = self
            .http
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(match status.as_u16() {
                404 => ApiError::NotFound {
                    url: url.to_string(),
                }
                .into(),
                429 => ApiError::RateLimited { body }.into(),
                code => ApiError::Status { status: code, body }.into(),
            });
        }
        Ok(resp.json()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub id: i64,
    pub name: String,
    pub episode: String,
    #[serde(default)]
    pub air_date: String,
    #[serde(default)]
    pub characters: Vec<String>,
}

impl Episode {
    /// Season number parsed from the "S{2d}E{2d}" code field (the two
    /// characters after the leading 'S'). Codes that deviate from that
    /// shape yield `None`.
    pub fn season(&self) -> Option<u32> {
        if !self.episode.starts_with('S') {
            return None;
        }
        self.episode.get(1..3)?.parse().ok()
    }

    /// Numeric character ids taken from the last path segment of each
    /// character reference URL. Unparseable references are skipped.
    pub fn character_ids(&self) -> Vec<i64> {
        self.characters
            .iter()
            .filter_map(|link| {
                let parsed = Url::parse(link).ok()?;
                parsed
                    .path_segments()?
                    .rev()
                    .find(|segment| !segment.is_empty())?
                    .parse()
                    .ok()
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub info: PageInfo,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub pages: i64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CharacterBatch {
    Many(Vec<Character>),
    One(Box<Character>),
}

impl CharacterBatch {
    fn into_vec(self) -> Vec<Character> {
        match self {
            CharacterBatch::Many(list) => list,
            CharacterBatch::One(one) => vec![*one],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tiny_http::{Header, Response, Server};

    fn episode_json(id: i64, code: &str) -> String {
        format!(
            r#"{{"id":{id},"name":"Episode {id}","episode":"{code}","air_date":"December 2, 2013","characters":["https://rickandmortyapi.com/api/character/{id}"]}}"#
        )
    }

    fn page_json(episodes: &[String], next: Option<&str>) -> String {
        let next = match next {
            Some(url) => format!(r#""{url}""#),
            None => "null".to_string(),
        };
        format!(
            r#"{{"info":{{"count":{},"pages":1,"next":{next},"prev":null}},"results":[{}]}}"#,
            episodes.len(),
            episodes.join(",")
        )
    }

    fn json_header() -> Header {
        Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap()
    }

    fn test_client(base_url: String) -> Client {
        Client::new(ClientConfig {
            user_agent: "rm-tui-tests/0.0".to_string(),
            base_url: Some(base_url),
            ..ClientConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn episodes_follow_cursor_in_page_order() {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let base = format!("http://{addr}/api");
        let second_page = format!("http://{addr}/api/episode?page=2");

        let page_one = page_json(
            &[episode_json(1, "S01E01"), episode_json(2, "S01E02")],
            Some(&second_page),
        );
        let page_two = page_json(&[episode_json(3, "S02E01")], None);

        thread::spawn(move || {
            for request in server.incoming_requests().take(2) {
                let body = if request.url().contains("page=2") {
                    page_two.clone()
                } else {
                    page_one.clone()
                };
                let _ = request.respond(Response::from_string(body).with_header(json_header()));
            }
        });

        let episodes = test_client(base).episodes().unwrap();
        let ids: Vec<i64> = episodes.iter().map(|ep| ep.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn episodes_stop_at_page_cap() {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let base = format!("http://{addr}/api");
        let next = format!("http://{addr}/api/episode?page=again");

        thread::spawn(move || {
            // The cursor never nulls out; the client must stop on its own.
            for (index, request) in server
                .incoming_requests()
                .take(MAX_EPISODE_PAGES)
                .enumerate()
            {
                let body = page_json(
                    &[episode_json(index as i64 + 1, "S01E01")],
                    Some(&next),
                );
                let _ = request.respond(Response::from_string(body).with_header(json_header()));
            }
        });

        let episodes = test_client(base).episodes().unwrap();
        assert_eq!(episodes.len(), MAX_EPISODE_PAGES);
    }

    #[test]
    fn episodes_surface_http_failures() {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let base = format!("http://{addr}/api");

        thread::spawn(move || {
            for request in server.incoming_requests().take(1) {
                let _ = request.respond(Response::from_string("boom").with_status_code(500));
            }
        });

        let err = test_client(base).episodes().unwrap_err();
        let api_err = err.downcast::<ApiError>().unwrap();
        assert!(matches!(api_err, ApiError::Status { status: 500, .. }));
    }

    #[test]
    fn characters_decode_array_shape() {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let base = format!("http://{addr}/api");

        thread::spawn(move || {
            for request in server.incoming_requests().take(1) {
                assert_eq!(request.url(), "/api/character/1,2");
                let body = r#"[{"id":1,"name":"Rick Sanchez","species":"Human","status":"Alive","image":"https://example.test/1.jpeg"},{"id":2,"name":"Morty Smith","species":"Human","status":"Alive","image":"https://example.test/2.jpeg"}]"#;
                let _ = request.respond(Response::from_string(body).with_header(json_header()));
            }
        });

        let characters = test_client(base).characters(&[1, 2]).unwrap();
        let names: Vec<&str> = characters.iter().map(|ch| ch.name.as_str()).collect();
        assert_eq!(names, vec!["Rick Sanchez", "Morty Smith"]);
    }

    #[test]
    fn characters_decode_single_object_shape() {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let base = format!("http://{addr}/api");

        thread::spawn(move || {
            for request in server.incoming_requests().take(1) {
                let body = r#"{"id":8,"name":"Adjudicator Rick","species":"Human","status":"Dead","image":"https://example.test/8.jpeg"}"#;
                let _ = request.respond(Response::from_string(body).with_header(json_header()));
            }
        });

        let characters = test_client(base).characters(&[8]).unwrap();
        assert_eq!(characters.len(), 1);
        assert_eq!(characters[0].name, "Adjudicator Rick");
    }

    #[test]
    fn characters_skip_request_for_empty_id_list() {
        let client = test_client("http://127.0.0.1:1/api".to_string());
        assert!(client.characters(&[]).unwrap().is_empty());
    }

    #[test]
    fn season_parses_well_formed_codes() {
        let mut episode = Episode {
            id: 1,
            name: "Pilot".to_string(),
            episode: "S02E08".to_string(),
            air_date: String::new(),
            characters: Vec::new(),
        };
        assert_eq!(episode.season(), Some(2));

        episode.episode = "S11E01".to_string();
        assert_eq!(episode.season(), Some(11));
    }

    #[test]
    fn season_rejects_malformed_codes() {
        let mut episode = Episode {
            id: 1,
            name: "Pilot".to_string(),
            episode: "PILOT".to_string(),
            air_date: String::new(),
            characters: Vec::new(),
        };
        assert_eq!(episode.season(), None);

        episode.episode = "S1".to_string();
        assert_eq!(episode.season(), None);
    }

    #[test]
    fn character_ids_take_last_path_segment() {
        let episode = Episode {
            id: 1,
            name: "Pilot".to_string(),
            episode: "S01E01".to_string(),
            air_date: String::new(),
            characters: vec![
                "https://rickandmortyapi.com/api/character/38".to_string(),
                "https://rickandmortyapi.com/api/character/45/".to_string(),
                "https://rickandmortyapi.com/api/character/not-a-number".to_string(),
            ],
        };
        assert_eq!(episode.character_ids(), vec![38, 45]);
    }

    #[test]
    fn client_requires_user_agent() {
        let err = Client::new(ClientConfig::default()).unwrap_err();
        assert!(err.to_string().contains("user agent"));
    }
}
