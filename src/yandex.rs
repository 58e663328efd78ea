//! Yandex.Music implementation of the [`Catalog`] trait.
//!
//! Blocking REST client.  Every response arrives wrapped in a
//! `{"result": ...}` envelope; a success envelope with a missing result on a
//! mutating call means the service rejected the mutation (stale revision),
//! which the trait reports as `Ok(None)`.
//!
//! Authentication: OAuth token loaded from `tracksync_token.toml`,
//! `/etc/tracksync/token.toml` or `~/.config/tracksync/token.toml`
//! (key `token`), unless one is passed in explicitly.

use serde::Deserialize;
use serde_json::json;

use crate::catalog::{Candidate, Catalog, Playlist, PlaylistEntry, PlaylistMeta, SearchPage};
use crate::errors::SyncError;
use crate::rate_limiter::RateLimiter;

const API_BASE: &str = "https://api.music.yandex.net";
const USER_AGENT: &str = "tracksync/0.1 +https://github.com/tracksync/tracksync";

/// Minimum interval between API calls.
const PACE_MS: u64 = 350;

// ── Credentials ──────────────────────────────────────────────────────────────

/// Try to load the OAuth token from known paths, return None if not found.
fn load_token() -> Option<String> {
    let paths = [
        // Next to the binary / workspace root
        "tracksync_token.toml",
        // System-wide
        "/etc/tracksync/token.toml",
    ];

    for path in &paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            if let Ok(table) = content.parse::<toml::Table>() {
                if let Some(token) = table.get("token").and_then(|t| t.as_str()) {
                    return Some(token.to_string());
                }
            }
        }
    }

    // Try home directory
    if let Some(home) = std::env::var_os("HOME") {
        let path = std::path::PathBuf::from(home).join(".config/tracksync/token.toml");
        if let Ok(content) = std::fs::read_to_string(&path) {
            if let Ok(table) = content.parse::<toml::Table>() {
                if let Some(token) = table.get("token").and_then(|t| t.as_str()) {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

// ── API response types ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    account: ApiAccount,
}

#[derive(Debug, Deserialize)]
struct ApiAccount {
    uid: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ApiSearch {
    #[serde(default)]
    best: Option<ApiBest>,
    #[serde(default)]
    tracks: Option<ApiTrackPage>,
}

#[derive(Debug, Deserialize)]
struct ApiBest {
    #[serde(rename = "type")]
    result_type: String,
    #[serde(default)]
    result: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ApiTrackPage {
    #[serde(default)]
    results: Vec<ApiTrack>,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    // Track ids come back as numbers or strings depending on the endpoint
    id: serde_json::Value,
    #[serde(default)]
    title: String,
    #[serde(default)]
    artists: Vec<ApiArtist>,
    #[serde(default)]
    albums: Vec<ApiAlbum>,
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiAlbum {
    id: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPlaylist {
    kind: u64,
    title: String,
    revision: u64,
    #[serde(default)]
    track_count: usize,
    #[serde(default)]
    tracks: Vec<ApiPlaylistItem>,
}

#[derive(Debug, Deserialize)]
struct ApiPlaylistItem {
    #[serde(default)]
    track: Option<ApiTrack>,
}

// ── Conversions ──────────────────────────────────────────────────────────────

fn scalar_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn candidate_from(track: ApiTrack) -> Candidate {
    Candidate {
        id: scalar_string(&track.id),
        album_id: track.albums.first().map(|a| scalar_string(&a.id)),
        title: track.title,
        artists: track.artists.into_iter().map(|a| a.name).collect(),
    }
}

fn search_page_from(api: ApiSearch) -> SearchPage {
    let best = api.best.and_then(|b| {
        if b.result_type == "track" {
            b.result
                .and_then(|v| serde_json::from_value::<ApiTrack>(v).ok())
                .map(candidate_from)
        } else {
            None
        }
    });
    let tracks = api
        .tracks
        .map(|page| page.results.into_iter().map(candidate_from).collect())
        .unwrap_or_default();
    SearchPage { best, tracks }
}

fn playlist_from(api: ApiPlaylist) -> Playlist {
    let entries: Vec<PlaylistEntry> = api
        .tracks
        .into_iter()
        .filter_map(|item| item.track)
        .enumerate()
        .map(|(index, track)| {
            let candidate = candidate_from(track);
            PlaylistEntry {
                index,
                track_id: candidate.id,
                album_id: candidate.album_id,
                title: candidate.title,
                artists: candidate.artists,
            }
        })
        .collect();
    let track_count = if entries.is_empty() {
        api.track_count
    } else {
        entries.len()
    };
    Playlist {
        kind: api.kind,
        title: api.title,
        revision: api.revision,
        track_count,
        entries,
    }
}

// ── Client ───────────────────────────────────────────────────────────────────

pub struct YandexCatalog {
    token: String,
    uid: u64,
    limiter: RateLimiter,
}

impl YandexCatalog {
    /// Connect with the given token, or the one from the credentials file.
    /// Resolves the account uid up front; a token that maps to no account is
    /// a configuration error.
    pub fn connect(token_override: Option<&str>) -> Result<Self, SyncError> {
        let token = match token_override {
            Some(t) => t.to_string(),
            None => load_token().ok_or_else(|| {
                SyncError::Config(
                    "no OAuth token: pass --token or create tracksync_token.toml".to_string(),
                )
            })?,
        };
        let mut limiter = RateLimiter::from_millis(PACE_MS);

        limiter.wait_if_needed();
        let response = ureq::get(&format!("{API_BASE}/account/status"))
            .set("Authorization", &format!("OAuth {token}"))
            .set("User-Agent", USER_AGENT)
            .call()?;
        let env: Envelope<ApiStatus> = serde_json::from_reader(response.into_reader())?;
        let uid = env
            .result
            .and_then(|s| s.account.uid)
            .ok_or_else(|| SyncError::Config("token does not map to an account".to_string()))?;

        Ok(YandexCatalog {
            token,
            uid,
            limiter,
        })
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    fn get(&mut self, path: &str) -> ureq::Request {
        self.limiter.wait_if_needed();
        ureq::get(&format!("{API_BASE}{path}"))
            .set("Authorization", &format!("OAuth {}", self.token))
            .set("User-Agent", USER_AGENT)
    }

    fn post(&mut self, path: &str) -> ureq::Request {
        self.limiter.wait_if_needed();
        ureq::post(&format!("{API_BASE}{path}"))
            .set("Authorization", &format!("OAuth {}", self.token))
            .set("User-Agent", USER_AGENT)
    }

    /// POST a change-relative diff against the given revision.
    /// Returns the updated playlist, or None when the service rejected it.
    fn change_relative(
        &mut self,
        kind: u64,
        diff: &serde_json::Value,
        revision: u64,
    ) -> Result<Option<Playlist>, SyncError> {
        let uid = self.uid;
        let response = self
            .post(&format!("/users/{uid}/playlists/{kind}/change-relative"))
            .send_form(&[
                ("diff", &diff.to_string()),
                ("revision", &revision.to_string()),
            ])?;
        let env: Envelope<ApiPlaylist> = serde_json::from_reader(response.into_reader())?;
        Ok(env.result.map(playlist_from))
    }
}

impl Catalog for YandexCatalog {
    fn search(&mut self, text: &str) -> Result<SearchPage, SyncError> {
        let response = self
            .get("/search")
            .query("text", text)
            .query("type", "all")
            .query("page", "0")
            .call()?;
        let env: Envelope<ApiSearch> = serde_json::from_reader(response.into_reader())?;
        Ok(env.result.map(search_page_from).unwrap_or_default())
    }

    fn list_playlists(&mut self) -> Result<Vec<PlaylistMeta>, SyncError> {
        let uid = self.uid;
        let response = self.get(&format!("/users/{uid}/playlists/list")).call()?;
        let env: Envelope<Vec<ApiPlaylist>> = serde_json::from_reader(response.into_reader())?;
        Ok(env
            .result
            .unwrap_or_default()
            .into_iter()
            .map(|p| PlaylistMeta {
                kind: p.kind,
                title: p.title,
            })
            .collect())
    }

    fn fetch_playlist(&mut self, kind: u64) -> Result<Playlist, SyncError> {
        let uid = self.uid;
        let response = self.get(&format!("/users/{uid}/playlists/{kind}")).call()?;
        let env: Envelope<ApiPlaylist> = serde_json::from_reader(response.into_reader())?;
        env.result
            .map(playlist_from)
            .ok_or_else(|| SyncError::Remote(format!("playlist {kind} not found")))
    }

    fn create_playlist(&mut self, name: &str) -> Result<Playlist, SyncError> {
        let uid = self.uid;
        let response = self
            .post(&format!("/users/{uid}/playlists/create"))
            .send_form(&[("title", name), ("visibility", "public")])?;
        let env: Envelope<ApiPlaylist> = serde_json::from_reader(response.into_reader())?;
        env.result
            .map(playlist_from)
            .ok_or_else(|| SyncError::MutationRejected(format!("create playlist \"{name}\"")))
    }

    fn insert_track(
        &mut self,
        kind: u64,
        track_id: &str,
        album_id: Option<&str>,
        revision: u64,
    ) -> Result<Option<Playlist>, SyncError> {
        let mut track = serde_json::Map::new();
        track.insert("id".to_string(), json!(track_id));
        if let Some(album) = album_id {
            track.insert("albumId".to_string(), json!(album));
        }
        // Inserting at 0 prepends the track
        let diff = json!([{ "op": "insert", "at": 0, "tracks": [track] }]);
        self.change_relative(kind, &diff, revision)
    }

    fn delete_range(
        &mut self,
        kind: u64,
        from: usize,
        to: usize,
        revision: u64,
    ) -> Result<Option<Playlist>, SyncError> {
        let diff = json!([{ "op": "delete", "from": from, "to": to }]);
        self.change_relative(kind, &diff, revision)
    }

    fn like_track(&mut self, track_id: &str) -> Result<bool, SyncError> {
        let uid = self.uid;
        let response = self
            .post(&format!("/users/{uid}/likes/tracks/add"))
            .send_form(&[("track-id", track_id)])?;
        let env: Envelope<serde_json::Value> = serde_json::from_reader(response.into_reader())?;
        Ok(env.result.is_some())
    }
}
