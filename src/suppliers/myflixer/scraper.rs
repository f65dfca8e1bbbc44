//! Markup extraction for the MyFlixer site. Selectors mirror the site's
//! current templates; when the site changes, this is the only file to touch.
//! Every parser is lenient: rows missing what they need are dropped.

use std::sync::OnceLock;

use regex::Regex;
use scraper::ElementRef;

use crate::{
    models::{
        ContentType, DetailPage, EpisodeRecord, ListingCard, SeasonRecord, ServerLinkRecord,
    },
    utils::{
        html::{self, AttrValue, DOMProcessor, ExtractValue, ItemsProcessor, MapValue},
        text,
    },
};

const LISTING_CARD: &str = ".flw-item";
const LISTING_TITLE_LINK: &str = "h2.film-name > a";
const LISTING_POSTER: &str = "img.film-poster-img";

const DETAIL_NAME: &str = ".detail_page-infor h2.heading-name > a";
const DETAIL_POSTER: &str = ".detail_page-infor .film-poster img";
const DETAIL_DESCRIPTION: &str = ".detail_page-infor .description";
const DETAIL_IMDB: &str = ".detail_page-infor .btn-imdb";
const DETAIL_TRAILER: &str = "#iframe-trailer";
const DETAIL_WATCH: &str = ".detail_page-watch";

const SEASON_ITEM: &str = "a.ss-item";
const EPISODE_ITEM: &str = "a.eps-item";
const SERVER_LINK_ITEM: &str = "a.link-item";

type ListProcessor<T> = MapValue<Vec<Option<T>>, Vec<T>>;

// listing

struct ListingCardProcessor {
    title: Box<dyn DOMProcessor<Option<String>>>,
    link: Box<dyn DOMProcessor<Option<String>>>,
    poster: Box<dyn DOMProcessor<Option<String>>>,
}

impl DOMProcessor<Option<ListingCard>> for ListingCardProcessor {
    fn process(&self, el: &ElementRef) -> Option<ListingCard> {
        Some(ListingCard {
            title: self.title.process(el)?,
            link: self.link.process(el)?,
            poster: self.poster.process(el)?,
        })
    }
}

fn listing_processor() -> &'static ListProcessor<ListingCard> {
    static LISTING_PROCESSOR: OnceLock<ListProcessor<ListingCard>> = OnceLock::new();
    LISTING_PROCESSOR.get_or_init(|| {
        ItemsProcessor::<Option<ListingCard>>::new(
            LISTING_CARD,
            Box::new(ListingCardProcessor {
                title: html::optional_attr_value(LISTING_TITLE_LINK, &["title"]),
                link: html::optional_attr_value(LISTING_TITLE_LINK, &["href"]),
                poster: html::optional_attr_value(LISTING_POSTER, &["data-src", "src"]),
            }),
        )
        .flatten()
    })
}

pub fn parse_listing(page: &str) -> Vec<ListingCard> {
    html::process_document(page, listing_processor())
}

/// `/movie/the-matrix-19995` -> `(Movie, "the-matrix-19995")`; anything that is
/// not a movie link is treated as a series.
pub fn parse_listing_link(link: &str) -> Option<(ContentType, String)> {
    let slug = text::last_path_segment(link)?;
    let content_type = if link.contains("/movie/") {
        ContentType::Movie
    } else {
        ContentType::Series
    };

    Some((content_type, slug.to_owned()))
}

// detail page

struct DetailPageProcessor {
    name: Box<dyn DOMProcessor<Option<String>>>,
    poster: Box<dyn DOMProcessor<Option<String>>>,
    description: Box<dyn DOMProcessor<Option<String>>>,
    imdb_rating: Box<dyn DOMProcessor<Option<String>>>,
    trailer: Box<dyn DOMProcessor<Option<String>>>,
    internal_data_id: Box<dyn DOMProcessor<Option<String>>>,
}

impl DOMProcessor<DetailPage> for DetailPageProcessor {
    fn process(&self, el: &ElementRef) -> DetailPage {
        DetailPage {
            name: self.name.process(el).unwrap_or_default(),
            poster: self.poster.process(el),
            description: self.description.process(el),
            imdb_rating: self.imdb_rating.process(el),
            trailer: self.trailer.process(el),
            internal_data_id: self.internal_data_id.process(el),
        }
    }
}

fn detail_page_processor() -> &'static DetailPageProcessor {
    static DETAIL_PAGE_PROCESSOR: OnceLock<DetailPageProcessor> = OnceLock::new();
    DETAIL_PAGE_PROCESSOR.get_or_init(|| DetailPageProcessor {
        name: html::optional_text_value(DETAIL_NAME),
        poster: html::optional_attr_value(DETAIL_POSTER, &["src"]),
        description: html::optional_text_value(DETAIL_DESCRIPTION),
        imdb_rating: MapValue::new(
            |rating: Option<String>| {
                let rating = rating?.replace("N/A", "").replace("IMDB: ", "");
                text::non_empty(rating.trim().to_owned())
            },
            html::optional_text_value(DETAIL_IMDB),
        )
        .into(),
        trailer: html::optional_attr_value(DETAIL_TRAILER, &["data-src"]),
        internal_data_id: html::optional_attr_value(DETAIL_WATCH, &["data-id"]),
    })
}

pub fn parse_detail_page(page: &str) -> DetailPage {
    html::process_document(page, detail_page_processor())
}

// seasons

fn seasons_processor() -> &'static ListProcessor<SeasonRecord> {
    static SEASONS_PROCESSOR: OnceLock<ListProcessor<SeasonRecord>> = OnceLock::new();
    SEASONS_PROCESSOR.get_or_init(|| {
        ItemsProcessor::<Option<SeasonRecord>>::new(
            SEASON_ITEM,
            ExtractValue::new(|el| {
                let season_id = el.attr("data-id").map(str::trim).filter(|id| !id.is_empty())?;
                let label: String = el.text().collect();

                Some(SeasonRecord {
                    season_id: season_id.to_owned(),
                    season_label: text::sanitize_text(&label),
                })
            })
            .into(),
        )
        .flatten()
    })
}

pub fn parse_seasons(fragment: &str) -> Vec<SeasonRecord> {
    html::process_fragment(fragment, seasons_processor())
}

// episodes

/// Splits `"Eps 5: Finale"` into `(5, "Finale")`.
pub fn parse_episode_label(label: &str) -> Option<(u32, String)> {
    static EPISODE_LABEL_REGEXP: OnceLock<Regex> = OnceLock::new();
    let re = EPISODE_LABEL_REGEXP
        .get_or_init(|| Regex::new(r#"Eps (?<number>\d+): (?<title>.+)"#).unwrap());

    let captures = re.captures(label)?;
    let number = captures.name("number")?.as_str().parse().ok()?;
    let title = captures.name("title")?.as_str().to_owned();

    Some((number, title))
}

fn episodes_processor() -> &'static ListProcessor<EpisodeRecord> {
    static EPISODES_PROCESSOR: OnceLock<ListProcessor<EpisodeRecord>> = OnceLock::new();
    EPISODES_PROCESSOR.get_or_init(|| {
        ItemsProcessor::<Option<EpisodeRecord>>::new(
            EPISODE_ITEM,
            ExtractValue::new(|el| {
                let data_id = el.attr("data-id").map(str::trim).filter(|id| !id.is_empty())?;
                let (episode_number, title) = parse_episode_label(el.attr("title")?)?;

                Some(EpisodeRecord {
                    episode_data_id: data_id.to_owned(),
                    episode_number,
                    title,
                })
            })
            .into(),
        )
        .flatten()
    })
}

pub fn parse_episodes(fragment: &str) -> Vec<EpisodeRecord> {
    html::process_fragment(fragment, episodes_processor())
}

// servers

fn server_links_processor() -> &'static ListProcessor<ServerLinkRecord> {
    static SERVER_LINKS_PROCESSOR: OnceLock<ListProcessor<ServerLinkRecord>> = OnceLock::new();
    SERVER_LINKS_PROCESSOR.get_or_init(|| {
        ItemsProcessor::<Option<ServerLinkRecord>>::new(
            SERVER_LINK_ITEM,
            MapValue::new(
                |link_id: Option<String>| link_id.map(|link_id| ServerLinkRecord { link_id }),
                AttrValue::first_of(&["data-linkid", "data-id"]).into(),
            )
            .into(),
        )
        .flatten()
    })
}

pub fn parse_server_links(fragment: &str) -> Vec<ServerLinkRecord> {
    html::process_fragment(fragment, server_links_processor())
}
