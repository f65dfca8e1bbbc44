//! JW Player style source/track lists as served by embed hosts.

use serde::Deserialize;

use crate::models::{StreamDescriptor, Subtitle};

const SUBTITLE_KINDS: &[&str] = &["captions", "subtitles"];

#[derive(Deserialize, Debug, Clone)]
pub struct Track {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Source {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default, rename = "type")]
    pub source_type: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

/// One descriptor per HLS entry, in payload order.
pub fn hls_streams(sources: &[Source]) -> Vec<StreamDescriptor> {
    sources
        .iter()
        .filter(|source| source.source_type.as_deref() == Some("hls"))
        .filter_map(|source| source.file.as_deref())
        .filter(|file| !file.is_empty())
        .map(StreamDescriptor::hls)
        .collect()
}

/// Caption and subtitle tracks only; thumbnails, chapters etc. are dropped.
pub fn subtitles(tracks: &[Track]) -> Vec<Subtitle> {
    tracks
        .iter()
        .filter(|track| {
            track
                .kind
                .as_deref()
                .is_some_and(|kind| SUBTITLE_KINDS.contains(&kind))
        })
        .filter_map(|track| {
            let url = track.file.as_deref().filter(|file| !file.is_empty())?;
            Some(Subtitle {
                url: url.to_owned(),
                lang: track.label.clone().unwrap_or_else(|| "Unknown".into()),
            })
        })
        .collect()
}
