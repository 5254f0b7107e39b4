// ============================
// crates/backend-lib/src/catalog.rs
// ============================
//! In-memory stream catalog.
//!
//! Streams carry a denormalized `viewer_count` that mirrors the heartbeat
//! path. The presence store owns the real membership and pushes every change
//! here through [`ViewerCountSink`].

use chrono::{DateTime, Utc};
use cosmictv_common::StreamId;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::presence::ViewerCountSink;
use crate::validation::ValidationError;

const DEFAULT_CATEGORY: &str = "sports";
const ALL_CATEGORIES: &str = "all";

/// A stream (channel) record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub id: StreamId,
    pub title: String,
    pub description: String,
    pub stream_url: String,
    pub thumbnail_url: String,
    pub is_live: bool,
    pub category: String,
    pub viewer_count: usize,
    pub country: String,
    pub language: String,
    pub quality: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin request body for a new stream
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewStream {
    pub title: String,
    pub description: String,
    pub stream_url: String,
    pub thumbnail_url: Option<String>,
    pub category: Option<String>,
    pub quality: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
}

impl NewStream {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyField("description"));
        }
        if self.stream_url.trim().is_empty() {
            return Err(ValidationError::EmptyField("streamUrl"));
        }
        Ok(())
    }
}

/// Catalog of known streams.
///
/// Records are keyed by id so a count update locks only its own stream.
/// `order` keeps the listing order and is only written by admin changes.
#[derive(Debug, Default)]
pub struct StreamCatalog {
    streams: DashMap<StreamId, Stream>,
    order: RwLock<Vec<StreamId>>,
}

impl StreamCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the default channel line-up
    pub fn with_defaults() -> Self {
        let now = Utc::now();
        let seed = |id: &str, title: &str, description: &str, stream_url: &str, thumb: &str| Stream {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            stream_url: stream_url.to_string(),
            thumbnail_url: thumb.to_string(),
            is_live: true,
            category: DEFAULT_CATEGORY.to_string(),
            viewer_count: 0,
            country: "AR".to_string(),
            language: "es".to_string(),
            quality: "HD".to_string(),
            created_at: now,
            updated_at: now,
        };

        let catalog = Self::new();
        for stream in [
            seed(
                "tnt-sports-hd",
                "TNT Sports HD",
                "Transmisión en vivo del canal TNT Sports en alta definición. Fútbol argentino e internacional.",
                "https://cdn.live.tn.com.ar/live/c7eds/TNTSports/SA_Live_dash_enc_2A/TNTSports.mpd",
                "https://example.com/tnt-sports-thumb.jpg",
            ),
            seed(
                "espn-premium-hd",
                "ESPN Premium HD",
                "Canal premium de ESPN con los mejores partidos de fútbol argentino y Copa Libertadores.",
                "https://cdn.live.espn.com.ar/live/espn-premium/hls/playlist.m3u8",
                "https://example.com/espn-premium-thumb.jpg",
            ),
            seed(
                "directv-sport",
                "DirecTV Sports",
                "Deportes en vivo con la mejor calidad. Fútbol argentino, Copa Sudamericana y más.",
                "https://edge.cvattv.com.ar/live/c3eds/DirectTVSports/SA_Live_dash_enc/DirectTVSports.mpd",
                "https://example.com/directv-sports-thumb.jpg",
            ),
            seed(
                "fox-sports-hd",
                "Fox Sports HD",
                "Transmisiones deportivas de Fox Sports. Premier League, Champions League y fútbol internacional.",
                "https://live.foxsportsla.tv/foxsportshd/playlist.m3u8",
                "https://example.com/fox-sports-thumb.jpg",
            ),
            seed(
                "espn-hd",
                "ESPN HD",
                "Canal principal de ESPN con noticias deportivas y transmisiones en vivo.",
                "https://cdn.live.espn.com.ar/live/espn/hls/playlist.m3u8",
                "https://example.com/espn-thumb.jpg",
            ),
        ] {
            catalog.push(stream);
        }
        catalog
    }

    fn push(&self, stream: Stream) {
        let id = stream.id.clone();
        self.streams.insert(id.clone(), stream);
        self.order.write().push(id);
    }

    pub fn get(&self, stream_id: &str) -> Option<Stream> {
        self.streams.get(stream_id).map(|s| s.value().clone())
    }

    pub fn exists(&self, stream_id: &str) -> bool {
        self.streams.contains_key(stream_id)
    }

    /// Get a stream or fail with `NotFound`
    pub fn require(&self, stream_id: &str) -> Result<Stream, AppError> {
        self.get(stream_id)
            .ok_or_else(|| AppError::stream_not_found(stream_id))
    }

    /// List streams in creation order, optionally filtered by category
    /// (`all` matches everything)
    pub fn list(&self, category: Option<&str>) -> Vec<Stream> {
        let category = category.filter(|category| *category != ALL_CATEGORIES);
        self.order
            .read()
            .iter()
            .filter_map(|id| self.streams.get(id).map(|s| s.value().clone()))
            .filter(|s| match category {
                Some(category) => s.category == category,
                None => true,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Add a stream with a generated id
    pub fn insert(&self, new: NewStream) -> Result<Stream, AppError> {
        new.validate()?;

        let now = Utc::now();
        let stream = Stream {
            id: Uuid::new_v4().to_string(),
            title: new.title.trim().to_string(),
            description: new.description.trim().to_string(),
            stream_url: new.stream_url.trim().to_string(),
            thumbnail_url: new.thumbnail_url.unwrap_or_default(),
            is_live: true,
            category: new.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            viewer_count: 0,
            country: new.country.unwrap_or_else(|| "AR".to_string()),
            language: new.language.unwrap_or_else(|| "es".to_string()),
            quality: new.quality.unwrap_or_else(|| "HD".to_string()),
            created_at: now,
            updated_at: now,
        };

        self.push(stream.clone());
        tracing::info!(stream_id = %stream.id, title = %stream.title, "stream created");
        Ok(stream)
    }

    /// Remove a stream, returning it if it existed
    pub fn remove(&self, stream_id: &str) -> Option<Stream> {
        let (_, stream) = self.streams.remove(stream_id)?;
        self.order.write().retain(|id| id != stream_id);
        Some(stream)
    }
}

impl ViewerCountSink for StreamCatalog {
    fn viewer_count_changed(&self, stream_id: &str, count: usize) -> Result<(), AppError> {
        let mut stream = self
            .streams
            .get_mut(stream_id)
            .ok_or_else(|| AppError::stream_not_found(stream_id))?;
        stream.viewer_count = count;
        stream.updated_at = Utc::now();
        Ok(())
    }
}
