use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::errors::Error;

pub const ADDON_NAME: &str = "MyFlixer";
pub const BINGE_GROUP: &str = "myflixer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContentType {
    Movie,
    Series,
}

impl ContentType {
    /// Path segment the source site uses for this kind of content page.
    pub fn site_segment(&self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::Series => "tv",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeTarget {
    /// Season as written in the identifier, compared against the season label.
    pub season: String,
    pub episode: u32,
}

/// `source:contentType:contentId[:season:episode]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentIdentifier {
    pub source: String,
    pub content_type: ContentType,
    pub slug: String,
    pub episode: Option<EpisodeTarget>,
}

const ID_DELIMITER: char = ':';

impl ContentIdentifier {
    pub fn new(source: &str, content_type: ContentType, slug: &str) -> Self {
        Self {
            source: source.to_owned(),
            content_type,
            slug: slug.to_owned(),
            episode: None,
        }
    }
}

impl FromStr for ContentIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidIdentifier(s.to_owned());
        let parts: Vec<&str> = s.split(ID_DELIMITER).collect();

        let (source, content_type, slug) = match parts.as_slice() {
            [source, content_type, slug, ..] => (*source, *content_type, *slug),
            _ => return Err(invalid()),
        };

        if source.is_empty() || slug.is_empty() {
            return Err(invalid());
        }

        let content_type = ContentType::from_str(content_type).map_err(|_| invalid())?;

        let episode = match (content_type, &parts[3..]) {
            (_, []) => None,
            (ContentType::Series, [season, episode]) => {
                let episode = episode.trim().parse().map_err(|_| invalid())?;
                Some(EpisodeTarget {
                    season: season.trim().to_owned(),
                    episode,
                })
            }
            _ => return Err(invalid()),
        };

        Ok(Self {
            source: source.to_owned(),
            content_type,
            slug: slug.to_owned(),
            episode,
        })
    }
}

impl fmt::Display for ContentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.content_type, self.slug)?;
        if let Some(target) = &self.episode {
            write!(f, ":{}:{}", target.season, target.episode)?;
        }
        Ok(())
    }
}

/// Optional catalog arguments, sent as `skip=20&search=...`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogExtra {
    pub skip: u32,
    pub search: Option<String>,
}

impl CatalogExtra {
    pub fn parse(raw: &str) -> Self {
        let mut extra = CatalogExtra::default();

        for (key, value) in url::form_urlencoded::parse(raw.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "skip" => extra.skip = value.trim().parse().unwrap_or_default(),
                "search" if !value.trim().is_empty() => extra.search = Some(value.trim().into()),
                _ => {}
            }
        }

        extra
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub name: String,
}

// scraped records

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCard {
    pub title: String,
    pub link: String,
    pub poster: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailPage {
    pub name: String,
    pub poster: Option<String>,
    pub description: Option<String>,
    pub imdb_rating: Option<String>,
    pub trailer: Option<String>,
    pub internal_data_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonRecord {
    pub season_id: String,
    pub season_label: String,
}

impl SeasonRecord {
    /// Label with the "Season"/"Series" wording removed, e.g. "Season 2" -> "2".
    pub fn season_number(&self) -> String {
        self.season_label
            .replacen("Season ", "", 1)
            .replacen("Series", "", 1)
            .trim()
            .to_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRecord {
    pub episode_data_id: String,
    pub episode_number: u32,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLinkRecord {
    pub link_id: String,
}

/// Answer of the site's per-link sources endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcePayload {
    #[serde(default)]
    pub link: Option<String>,
}

/// Host name to password mapping published by the key distribution endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct DecryptionKeyRing {
    keys: HashMap<String, serde_json::Value>,
}

impl DecryptionKeyRing {
    pub fn password_for(&self, host: &str) -> Option<&str> {
        self.keys
            .get(host)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }
}

// media-player wire shapes

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamKind {
    Hls,
    #[default]
    Direct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subtitle {
    pub url: String,
    pub lang: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorHints {
    pub binge_group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_web_ready: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamDescriptor {
    pub name: String,
    pub title: String,
    pub url: String,
    pub behavior_hints: BehaviorHints,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<Vec<Subtitle>>,
    #[serde(skip)]
    pub kind: StreamKind,
}

impl StreamDescriptor {
    pub fn hls(url: &str) -> Self {
        Self {
            name: ADDON_NAME.into(),
            title: format!("{ADDON_NAME} - HLS"),
            url: url.to_owned(),
            behavior_hints: BehaviorHints {
                binge_group: BINGE_GROUP.into(),
                not_web_ready: Some(true),
            },
            subtitles: None,
            kind: StreamKind::Hls,
        }
    }

    pub fn direct(url: &str) -> Self {
        Self {
            name: ADDON_NAME.into(),
            title: format!("{ADDON_NAME} - Direct"),
            url: url.to_owned(),
            behavior_hints: BehaviorHints {
                binge_group: BINGE_GROUP.into(),
                not_web_ready: None,
            },
            subtitles: None,
            kind: StreamKind::Direct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaPreview {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub name: String,
    pub poster: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trailer {
    pub source: String,
    #[serde(rename = "type")]
    pub trailer_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub season: u32,
    pub episode: u32,
    pub overview: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaDetail {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer: Option<Vec<Trailer>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<Video>>,
}
