use serde::Deserialize;
use serde_json::Value;
use watch_models::parse_count;
use crate::error::CatalogError;
use crate::traits::CatalogEntry;

/// Title lookup response (`?t=<title>&type=series`)
#[derive(Debug, Deserialize)]
pub struct OmdbTitleResponse {
    #[serde(rename = "Response")]
    pub response: String,
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "totalSeasons")]
    pub total_seasons: Option<Value>,
    #[serde(rename = "Error")]
    pub error: Option<String>,
}

/// Season lookup response (`?t=<title>&Season=<n>`)
#[derive(Debug, Deserialize)]
pub struct OmdbSeasonResponse {
    #[serde(rename = "Response")]
    pub response: String,
    #[serde(rename = "Episodes", default)]
    pub episodes: Vec<OmdbEpisode>,
    #[serde(rename = "Error")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OmdbEpisode {
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Episode")]
    pub episode: Option<Value>,
}

fn is_true(flag: &str) -> bool {
    flag.eq_ignore_ascii_case("true")
}

/// OMDb answers HTTP 200 with `Response: "False"` for unknown titles.
fn interpret_failure(title: &str, error: Option<&str>) -> CatalogError {
    match error {
        Some(msg) if msg.to_ascii_lowercase().contains("not found") => CatalogError::not_found(title),
        Some(msg) => CatalogError::Decode(msg.to_string()),
        None => CatalogError::not_found(title),
    }
}

pub fn interpret_title(title: &str, response: OmdbTitleResponse) -> Result<CatalogEntry, CatalogError> {
    if !is_true(&response.response) {
        return Err(interpret_failure(title, response.error.as_deref()));
    }
    Ok(CatalogEntry::from_raw_seasons(response.total_seasons.as_ref()))
}

/// Episode count of a season: the highest listed episode number, or the list length
/// when numbers are missing. An empty season yields `None`.
pub fn interpret_season(title: &str, response: OmdbSeasonResponse) -> Result<Option<u32>, CatalogError> {
    if !is_true(&response.response) {
        return Err(interpret_failure(title, response.error.as_deref()));
    }
    let highest = response
        .episodes
        .iter()
        .filter_map(|e| e.episode.as_ref().and_then(parse_count))
        .max();
    let count = highest.unwrap_or(response.episodes.len() as u32);
    Ok(Some(count).filter(|n| *n > 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn title_response(value: serde_json::Value) -> OmdbTitleResponse {
        serde_json::from_value(value).unwrap()
    }

    fn season_response(value: serde_json::Value) -> OmdbSeasonResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_title_with_string_season_count() {
        let response = title_response(json!({
            "Title": "Breaking Bad",
            "totalSeasons": "5",
            "Response": "True"
        }));
        let entry = interpret_title("Breaking Bad", response).unwrap();
        assert_eq!(entry.total_seasons, Some(5));
    }

    #[test]
    fn test_title_without_usable_season_count() {
        let response = title_response(json!({
            "Title": "Some Miniseries",
            "totalSeasons": "N/A",
            "Response": "True"
        }));
        let entry = interpret_title("Some Miniseries", response).unwrap();
        assert_eq!(entry.total_seasons, None);
    }

    #[test]
    fn test_unknown_title_is_not_found() {
        let response = title_response(json!({ "Response": "False", "Error": "Series not found!" }));
        let err = interpret_title("Nope", response).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_other_api_errors_are_not_not_found() {
        let response = title_response(json!({ "Response": "False", "Error": "Invalid API key!" }));
        let err = interpret_title("Dark", response).unwrap_err();
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_season_uses_highest_episode_number() {
        let response = season_response(json!({
            "Season": "1",
            "Episodes": [
                { "Title": "Pilot", "Episode": "1" },
                { "Title": "Two", "Episode": "2" },
                { "Title": "Finale", "Episode": "9" }
            ],
            "Response": "True"
        }));
        assert_eq!(interpret_season("Show", response).unwrap(), Some(9));
    }

    #[test]
    fn test_empty_season_has_no_count() {
        let response = season_response(json!({ "Episodes": [], "Response": "True" }));
        assert_eq!(interpret_season("Show", response).unwrap(), None);
    }
}
