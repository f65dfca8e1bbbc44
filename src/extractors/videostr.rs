use anyhow::{anyhow, bail};
use log::debug;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::{
    config::VideoHostConfig,
    errors::Error,
    extractors::LinkStreams,
    models::DecryptionKeyRing,
    utils::{
        crypto_js,
        jwp_player::{self, Source, Track},
        text, UpstreamClient,
    },
};

#[derive(Deserialize, Debug)]
struct GetSourcesResponse {
    #[serde(default)]
    sources: serde_json::Value,
    #[serde(default)]
    tracks: Option<Vec<Track>>,
}

pub fn is_host_link(host: &VideoHostConfig, link: &str) -> bool {
    !host.domain.is_empty() && link.contains(&host.domain)
}

pub fn extract_video_id(link: &str) -> Option<&str> {
    text::last_path_segment(link)
}

/// Asks the host API for the sources of the embed at `link`. Encrypted source
/// lists are opened with the host's password from a freshly fetched key ring.
pub async fn extract(
    client: &UpstreamClient,
    host: &VideoHostConfig,
    link: &str,
) -> anyhow::Result<LinkStreams> {
    let video_id =
        extract_video_id(link).ok_or_else(|| anyhow!("[videostr] no video id in {link}"))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
    headers.insert(header::REFERER, HeaderValue::from_str(&host.referer)?);

    let response: GetSourcesResponse = client
        .get_json_with(&format!("{}?id={video_id}", host.api_url), headers)
        .await?;

    let sources: Vec<Source> = match response.sources {
        serde_json::Value::String(encrypted) if !encrypted.is_empty() => {
            let password = load_password(client, host).await?;
            let decrypted = crypto_js::decrypt(&encrypted, &password)?;
            serde_json::from_str(&decrypted)?
        }
        serde_json::Value::Array(items) => {
            serde_json::from_value(serde_json::Value::Array(items))?
        }
        _ => bail!("[videostr] no sources for video {video_id}"),
    };

    debug!("[videostr] video {video_id}: {} source(s)", sources.len());

    Ok(LinkStreams {
        streams: jwp_player::hls_streams(&sources),
        subtitles: jwp_player::subtitles(&response.tracks.unwrap_or_default()),
    })
}

/// Keys rotate upstream, so the ring is fetched on every call.
async fn load_password(client: &UpstreamClient, host: &VideoHostConfig) -> Result<String, Error> {
    let ring: DecryptionKeyRing = client.get_json(&host.keys_url).await?;

    ring.password_for(&host.key_name)
        .map(str::to_owned)
        .ok_or_else(|| Error::MissingKey(host.key_name.clone()))
}
