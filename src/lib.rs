pub mod cache;
pub mod catalog;
pub mod config;
pub mod csvfile;
pub mod diff;
pub mod errors;
pub mod progress;
pub mod rate_limiter;
pub mod reconcile;
pub mod resolver;
pub mod sync;
pub mod track;
pub mod yandex;

pub use cache::LookupCache;
pub use catalog::{Candidate, Catalog, Playlist, PlaylistEntry, PlaylistMeta, SearchPage};
pub use config::{Config, RunOptions};
pub use errors::SyncError;
pub use sync::{SyncOptions, SyncResult};
pub use track::{Track, TrackKey};
pub use yandex::YandexCatalog;
