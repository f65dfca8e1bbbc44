mod scraper;

use std::sync::OnceLock;

use futures::StreamExt;
use indexmap::IndexMap;
use log::{debug, error, info, warn};

use super::{Context, ContentSupplier};
use crate::{
    errors::Error,
    extractors::{videostr, LinkStreams},
    models::{
        CatalogDescriptor, CatalogExtra, ContentIdentifier, ContentType, EpisodeRecord,
        EpisodeTarget, MetaDetail, MetaPreview, SeasonRecord, ServerLinkRecord, SourcePayload,
        StreamDescriptor, Trailer, Video,
    },
    utils::text,
};

const SUPPLIER_NAME: &str = "myflixer";

#[derive(Default)]
pub struct MyFlixerContentSupplier;

impl ContentSupplier for MyFlixerContentSupplier {
    fn get_supported_types(&self) -> Vec<ContentType> {
        vec![ContentType::Movie, ContentType::Series]
    }

    fn get_catalogs(&self) -> Vec<CatalogDescriptor> {
        get_catalogs_map()
            .iter()
            .map(|(id, (content_type, name))| CatalogDescriptor {
                id: (*id).to_owned(),
                content_type: *content_type,
                name: (*name).to_owned(),
            })
            .collect()
    }

    async fn load_catalog(
        &self,
        ctx: &Context,
        content_type: ContentType,
        extra: &CatalogExtra,
    ) -> anyhow::Result<Vec<MetaPreview>> {
        let url = catalog_url(ctx, content_type, extra);
        let page = ctx.client.get_text(&url).await?;

        let previews: Vec<_> = scraper::parse_listing(&page)
            .into_iter()
            .filter_map(|card| {
                let (card_type, slug) = scraper::parse_listing_link(&card.link)?;
                Some(MetaPreview {
                    id: ContentIdentifier::new(SUPPLIER_NAME, card_type, &slug).to_string(),
                    content_type: card_type,
                    name: card.title.clone(),
                    poster: card.poster,
                    description: card.title,
                })
            })
            .filter(|preview| preview.content_type == content_type)
            .collect();

        debug!("[myflixer] catalog {url}: {} item(s)", previews.len());
        Ok(previews)
    }

    async fn load_meta(&self, ctx: &Context, id: &ContentIdentifier) -> anyhow::Result<MetaDetail> {
        let url = detail_url(ctx, id);
        let detail = scraper::parse_detail_page(&ctx.client.get_text(&url).await?);

        if detail.name.is_empty() {
            return Err(Error::ContentNotFound(id.to_string()).into());
        }

        let meta_id = ContentIdentifier::new(&id.source, id.content_type, &id.slug).to_string();

        let videos = match (id.content_type, &detail.internal_data_id) {
            (ContentType::Series, Some(data_id)) => {
                match load_videos(ctx, &meta_id, data_id).await {
                    Ok(videos) => Some(videos).filter(|v| !v.is_empty()),
                    Err(err) => {
                        error!("[myflixer] fail to load seasons (id: {meta_id}, data_id: {data_id}): {err}");
                        None
                    }
                }
            }
            _ => None,
        };

        Ok(MetaDetail {
            id: meta_id,
            content_type: id.content_type,
            name: detail.name,
            poster: detail.poster,
            description: detail.description,
            imdb_rating: detail.imdb_rating,
            trailer: detail.trailer.map(|source| {
                vec![Trailer {
                    source,
                    trailer_type: "trailer".into(),
                }]
            }),
            videos,
        })
    }

    async fn load_streams(
        &self,
        ctx: &Context,
        id: &ContentIdentifier,
    ) -> anyhow::Result<Vec<StreamDescriptor>> {
        info!("[myflixer] resolving streams for {id}");

        let data_id = resolve_container(ctx, id).await?;

        let servers_url = match (id.content_type, &id.episode) {
            (ContentType::Series, Some(target)) => {
                let episode_data_id = resolve_episode(ctx, &data_id, target).await?;
                episode_servers_url(ctx, &episode_data_id)
            }
            _ => episode_list_url(ctx, &data_id),
        };

        let links = resolve_servers(ctx, &servers_url).await?;
        let streams = resolve_each_source(ctx, links).await;

        info!("[myflixer] {id}: {} stream(s)", streams.len());
        Ok(streams)
    }
}

// catalogs

fn get_catalogs_map() -> &'static IndexMap<&'static str, (ContentType, &'static str)> {
    static CATALOGS_MAP: OnceLock<IndexMap<&'static str, (ContentType, &'static str)>> =
        OnceLock::new();
    CATALOGS_MAP.get_or_init(|| {
        IndexMap::from([
            ("myflixer-movies", (ContentType::Movie, "MyFlixer Movies")),
            ("myflixer-series", (ContentType::Series, "MyFlixer TV Series")),
        ])
    })
}

fn catalog_url(ctx: &Context, content_type: ContentType, extra: &CatalogExtra) -> String {
    let base = &ctx.config.base_url;

    if let Some(search) = &extra.search {
        return format!("{base}/search/{}", text::dash_separated(search));
    }

    let page = extra.skip / ctx.config.page_size.max(1) + 1;
    match content_type {
        ContentType::Movie => format!("{base}/movie?page={page}"),
        ContentType::Series => format!("{base}/tv-show?page={page}"),
    }
}

// meta

async fn load_videos(ctx: &Context, meta_id: &str, data_id: &str) -> anyhow::Result<Vec<Video>> {
    let seasons = load_seasons(ctx, data_id).await?;
    let mut videos: Vec<Video> = vec![];

    for season in seasons {
        let season_number = season.season_number();
        let episodes = match load_season_episodes(ctx, &season).await {
            Ok(episodes) => episodes,
            Err(err) => {
                warn!(
                    "[myflixer] fail to load episodes of season {season_number} (season_id: {}): {err}",
                    season.season_id
                );
                continue;
            }
        };

        let season_index = text::leading_number(&season_number)
            .filter(|n| *n > 0)
            .unwrap_or(1);

        videos.extend(episodes.into_iter().map(|episode| {
            let title = episode.title.trim().to_owned();
            Video {
                id: format!("{meta_id}:{season_number}:{}", episode.episode_number),
                title: title.clone(),
                season: season_index,
                episode: episode.episode_number,
                overview: title,
            }
        }));
    }

    videos.sort_by_key(|video| (video.season, video.episode));
    Ok(videos)
}

// streams

/// Internal data id of the content page, the key of every AJAX endpoint.
async fn resolve_container(ctx: &Context, id: &ContentIdentifier) -> anyhow::Result<String> {
    let page = ctx.client.get_text(&detail_url(ctx, id)).await?;

    scraper::parse_detail_page(&page)
        .internal_data_id
        .ok_or_else(|| Error::ContentNotFound(id.to_string()).into())
}

/// First season whose stripped label equals the requested one, then the
/// episode with the requested number inside it.
async fn resolve_episode(
    ctx: &Context,
    data_id: &str,
    target: &EpisodeTarget,
) -> anyhow::Result<String> {
    let not_found = || Error::EpisodeNotFound {
        season: target.season.clone(),
        episode: target.episode,
    };

    let seasons = load_seasons(ctx, data_id).await?;
    let season = seasons
        .iter()
        .find(|season| season.season_number() == target.season)
        .ok_or_else(not_found)?;

    debug!(
        "[myflixer] season {} matched season_id {}",
        target.season, season.season_id
    );

    let episode = load_season_episodes(ctx, season)
        .await?
        .into_iter()
        .find(|episode| episode.episode_number == target.episode)
        .ok_or_else(not_found)?;

    Ok(episode.episode_data_id)
}

async fn resolve_servers(ctx: &Context, url: &str) -> anyhow::Result<Vec<ServerLinkRecord>> {
    let fragment = ctx.client.get_text(url).await?;
    let links = scraper::parse_server_links(&fragment);

    debug!("[myflixer] {url}: {} server link(s)", links.len());
    Ok(links)
}

/// Links are resolved one after another; a failed link contributes nothing.
/// Subtitles of a link land on the last descriptor accumulated so far.
async fn resolve_each_source(ctx: &Context, links: Vec<ServerLinkRecord>) -> Vec<StreamDescriptor> {
    futures::stream::iter(links)
        .fold(vec![], move |mut streams, link| async move {
            match resolve_source(ctx, &link.link_id).await {
                Ok(LinkStreams {
                    streams: link_streams,
                    subtitles,
                }) => {
                    streams.extend(link_streams);
                    if !subtitles.is_empty() {
                        if let Some(last) = streams.last_mut() {
                            last.subtitles = Some(subtitles);
                        }
                    }
                }
                Err(err) => {
                    warn!("[myflixer] fail to resolve link {}: {err:#}", link.link_id);
                }
            }
            streams
        })
        .await
}

async fn resolve_source(ctx: &Context, link_id: &str) -> anyhow::Result<LinkStreams> {
    let payload: SourcePayload = ctx.client.get_json(&sources_url(ctx, link_id)).await?;

    let link = payload
        .link
        .filter(|link| !link.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("no link in source payload"))?;

    let host = &ctx.config.video_host;
    if videostr::is_host_link(host, &link) {
        videostr::extract(&ctx.client, host, &link).await
    } else {
        Ok(LinkStreams::single(StreamDescriptor::direct(&link)))
    }
}

// site requests

async fn load_seasons(ctx: &Context, data_id: &str) -> anyhow::Result<Vec<SeasonRecord>> {
    let url = format!("{}/ajax/season/list/{data_id}", ctx.config.base_url);
    let fragment = ctx.client.get_text(&url).await?;
    Ok(scraper::parse_seasons(&fragment))
}

async fn load_season_episodes(
    ctx: &Context,
    season: &SeasonRecord,
) -> anyhow::Result<Vec<EpisodeRecord>> {
    let url = format!(
        "{}/ajax/season/episodes/{}",
        ctx.config.base_url, season.season_id
    );
    let fragment = ctx.client.get_text(&url).await?;
    Ok(scraper::parse_episodes(&fragment))
}

fn detail_url(ctx: &Context, id: &ContentIdentifier) -> String {
    format!(
        "{}/{}/{}",
        ctx.config.base_url,
        id.content_type.site_segment(),
        id.slug
    )
}

fn episode_list_url(ctx: &Context, data_id: &str) -> String {
    format!("{}/ajax/episode/list/{data_id}", ctx.config.base_url)
}

fn episode_servers_url(ctx: &Context, episode_data_id: &str) -> String {
    format!("{}/ajax/episode/servers/{episode_data_id}", ctx.config.base_url)
}

fn sources_url(ctx: &Context, link_id: &str) -> String {
    format!("{}/ajax/episode/sources/{link_id}", ctx.config.base_url)
}
