use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::server::utils::json_utils::{field_string, value_to_string};

/// result of the handshake dance, an empty token means negotiation failed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    pub token: String,
    pub profile: Map<String, Value>,
    pub account_info: Map<String, Value>,
}

impl Session {
    pub fn failed(profile: Map<String, Value>) -> Self {
        Self {
            token: String::new(),
            profile,
            account_info: Map::new(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn profile_field(&self, key: &str) -> Option<String> {
        self.profile.get(key).and_then(value_to_string).filter(|s| !s.is_empty())
    }

    pub fn account_field(&self, key: &str) -> Option<String> {
        self.account_info
            .get(key)
            .and_then(value_to_string)
            .filter(|s| !s.is_empty())
    }

    /// `max_online` of the first storage the profile reports
    pub fn max_online(&self) -> Option<String> {
        let storages = self.profile.get("storages")?;
        let first = match storages {
            Value::Object(map) => map.values().next()?,
            Value::Array(list) => list.first()?,
            _ => return None,
        };
        field_string(first, "max_online")
    }
}

/// a mapping from `js`, arrays and garbage (portals send `[]` when empty) become empty maps
pub fn into_mapping(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}

/// one live channel as the playlist sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    // portal side channel id, only used when cmd doesn't carry one
    pub id: Option<String>,
    pub name: String,
    pub cmd: String,
    pub xmltv_id: String,
    pub genre_id: String,
    pub logo: String,
    pub genre_title: String,
}

impl Channel {
    /// raw record from `get_all_channels`, missing names become "Unknown" and unknown genres
    /// become "Other"
    pub fn from_record(record: &Value, genres: &GenreMap) -> Self {
        let genre_id = field_string(record, "tv_genre_id").unwrap_or_default();

        Self {
            id: field_string(record, "id"),
            name: field_string(record, "name").unwrap_or_else(|| "Unknown".to_string()),
            cmd: field_string(record, "cmd").unwrap_or_default(),
            xmltv_id: field_string(record, "xmltv_id").unwrap_or_default(),
            genre_title: genres.title_for(&genre_id),
            genre_id,
            logo: field_string(record, "logo").unwrap_or_default(),
        }
    }

    pub fn is_adult(&self) -> bool {
        self.genre_title.to_lowercase().starts_with("adult")
    }
}

/// genre id -> display title, last write wins on duplicate ids
#[derive(Debug, Clone, Default)]
pub struct GenreMap(HashMap<String, String>);

impl GenreMap {
    pub fn from_genres(genres: &[Value]) -> Self {
        let mut map = HashMap::new();
        for genre in genres {
            if let Some(id) = field_string(genre, "id") {
                map.insert(id, field_string(genre, "title").unwrap_or_default());
            }
        }
        Self(map)
    }

    pub fn title_for(&self, genre_id: &str) -> String {
        self.0
            .get(genre_id)
            .filter(|t| !t.is_empty())
            .cloned()
            .unwrap_or_else(|| "Other".to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
