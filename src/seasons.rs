use crate::api::Episode;

/// Distinct seasons present in `episodes`, in first-seen order.
/// Episodes whose code does not parse contribute nothing.
pub fn extract_seasons(episodes: &[Episode]) -> Vec<u32> {
    let mut seasons = Vec::new();
    for episode in episodes {
        if let Some(season) = episode.season() {
            if !seasons.contains(&season) {
                seasons.push(season);
            }
        }
    }
    seasons
}

/// Season prefix of an episode code, zero-padded below ten: "S01".."S09",
/// then "S10" and up.
pub fn season_key(season: u32) -> String {
    format!("S{:02}", season)
}

/// Subsequence of `episodes` belonging to `season`, order preserved.
/// The source slice is never touched.
pub fn filter_by_season(episodes: &[Episode], season: u32) -> Vec<Episode> {
    episodes
        .iter()
        .filter(|episode| episode.season() == Some(season))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(id: i64, code: &str) -> Episode {
        Episode {
            id,
            name: format!("Episode {id}"),
            episode: code.to_string(),
            air_date: String::new(),
            characters: Vec::new(),
        }
    }

    #[test]
    fn seasons_are_first_seen_and_deduplicated() {
        let episodes = vec![
            episode(1, "S01E01"),
            episode(2, "S01E02"),
            episode(3, "S02E01"),
        ];
        assert_eq!(extract_seasons(&episodes), vec![1, 2]);
    }

    #[test]
    fn malformed_codes_do_not_produce_seasons() {
        let episodes = vec![episode(1, "S03E01"), episode(2, "SPECIAL")];
        assert_eq!(extract_seasons(&episodes), vec![3]);
    }

    #[test]
    fn season_key_pads_single_digits() {
        assert_eq!(season_key(2), "S02");
        assert_eq!(season_key(10), "S10");
    }

    #[test]
    fn filter_keeps_order_and_source() {
        let episodes = vec![
            episode(1, "S01E01"),
            episode(2, "S02E01"),
            episode(3, "S02E02"),
        ];
        let filtered = filter_by_season(&episodes, 2);
        let ids: Vec<i64> = filtered.iter().map(|ep| ep.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(episodes.len(), 3);
    }
}
