//! Video records and their indexed document form

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CatalogError;

/// Age rating of a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "ER")]
    Er,
    #[serde(rename = "L")]
    L,
    #[serde(rename = "10")]
    Age10,
    #[serde(rename = "12")]
    Age12,
    #[serde(rename = "14")]
    Age14,
    #[serde(rename = "16")]
    Age16,
    #[serde(rename = "18")]
    Age18,
}

impl Rating {
    pub const ALL: [Rating; 7] = [
        Rating::Er,
        Rating::L,
        Rating::Age10,
        Rating::Age12,
        Rating::Age14,
        Rating::Age16,
        Rating::Age18,
    ];

    /// Name used in documents and query clauses
    pub fn name(&self) -> &'static str {
        match self {
            Rating::Er => "ER",
            Rating::L => "L",
            Rating::Age10 => "10",
            Rating::Age12 => "12",
            Rating::Age14 => "14",
            Rating::Age16 => "16",
            Rating::Age18 => "18",
        }
    }

    /// Case-insensitive lookup by name
    pub fn of(name: &str) -> Option<Rating> {
        let name = name.trim();
        Self::ALL.into_iter().find(|r| r.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Rating {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rating::of(s).ok_or_else(|| CatalogError::InvalidInput(format!("unknown rating '{s}'")))
    }
}

/// A published (or draft) video as the catalog exposes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub launched_at: i32,
    pub duration: f64,
    pub rating: Option<Rating>,
    pub opened: bool,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub video: Option<String>,
    pub trailer: Option<String>,
    pub banner: Option<String>,
    pub thumbnail: Option<String>,
    pub thumbnail_half: Option<String>,
    pub categories: BTreeSet<String>,
    pub genres: BTreeSet<String>,
    pub cast_members: BTreeSet<String>,
}

/// Video as stored in the search index
///
/// Ratings are kept as their plain names so that an index written by another
/// producer with an unknown rating still deserializes; the mapping to
/// [`Video`] drops ratings it does not recognise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDocument {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub launched_at: i32,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub opened: bool,
    #[serde(default)]
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub trailer: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub thumbnail_half: Option<String>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub genres: BTreeSet<String>,
    #[serde(default)]
    pub cast_members: BTreeSet<String>,
}

impl From<VideoDocument> for Video {
    fn from(doc: VideoDocument) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            description: doc.description,
            launched_at: doc.launched_at,
            duration: doc.duration,
            rating: doc.rating.as_deref().and_then(Rating::of),
            opened: doc.opened,
            published: doc.published,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            video: doc.video,
            trailer: doc.trailer,
            banner: doc.banner,
            thumbnail: doc.thumbnail,
            thumbnail_half: doc.thumbnail_half,
            categories: doc.categories,
            genres: doc.genres,
            cast_members: doc.cast_members,
        }
    }
}

impl From<&Video> for VideoDocument {
    fn from(video: &Video) -> Self {
        Self {
            id: video.id.clone(),
            title: video.title.clone(),
            description: video.description.clone(),
            launched_at: video.launched_at,
            duration: video.duration,
            rating: video.rating.map(|r| r.name().to_string()),
            opened: video.opened,
            published: video.published,
            created_at: video.created_at,
            updated_at: video.updated_at,
            video: video.video.clone(),
            trailer: video.trailer.clone(),
            banner: video.banner.clone(),
            thumbnail: video.thumbnail.clone(),
            thumbnail_half: video.thumbnail_half.clone(),
            categories: video.categories.clone(),
            genres: video.genres.clone(),
            cast_members: video.cast_members.clone(),
        }
    }
}
