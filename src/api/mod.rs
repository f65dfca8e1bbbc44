//! Inbound HTTP surface for the media-player client: manifest, catalogs,
//! metadata and streams. Paths follow the player's addon protocol, so the
//! last segment may carry a `.json` suffix.

use std::{net::SocketAddr, str::FromStr, sync::Arc};

use anyhow::Context as _;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use indexmap::IndexSet;
use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::json;
use strum::IntoEnumIterator;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    config::Config,
    errors::Error,
    models::{CatalogExtra, ContentIdentifier, ContentType, ADDON_NAME},
    suppliers::{available_suppliers, get_supplier, AllContentSuppliers, ContentSupplier, Context},
};

const ADDON_ID: &str = "myflixer.stremio.addon";
const ADDON_DESCRIPTION: &str = "Watch movies and series from MyFlixer";
const ADDON_LOGO: &str = "https://myflixerz.to/images/group_1/theme_7/logo.png?v=0.1";
const CONFIGURE_TEMPLATE: &str = include_str!("configure.html");

pub fn create_router(ctx: Arc<Context>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/manifest.json", get(manifest))
        .route("/configure", get(configure))
        .route("/catalog/{content_type}/{id}", get(catalog))
        .route("/catalog/{content_type}/{id}/{extra}", get(catalog_with_extra))
        .route("/meta/{content_type}/{id}", get(meta))
        .route("/stream/{content_type}/{id}", get(stream))
        .layer(cors)
        .with_state(ctx)
}

pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid server address")?;

    let ctx = Arc::new(Context::new(config)?);
    let app = create_router(ctx);

    info!("[api] listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("[api] server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("[api] failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }

    info!("[api] shutdown signal received");
}

// descriptors

pub fn manifest_json() -> serde_json::Value {
    let catalogs: Vec<_> = AllContentSuppliers::iter()
        .flat_map(|sup| sup.get_catalogs())
        .map(|catalog| {
            json!({
                "type": catalog.content_type,
                "id": catalog.id,
                "name": catalog.name,
                "extra": [
                    { "name": "skip", "isRequired": false },
                    { "name": "search", "isRequired": false }
                ]
            })
        })
        .collect();

    let types: Vec<ContentType> = AllContentSuppliers::iter()
        .flat_map(|sup| sup.get_supported_types())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect();

    let id_prefixes: Vec<_> = available_suppliers()
        .into_iter()
        .map(|name| format!("{name}:"))
        .collect();

    json!({
        "id": ADDON_ID,
        "version": env!("CARGO_PKG_VERSION"),
        "name": ADDON_NAME,
        "description": ADDON_DESCRIPTION,
        "logo": ADDON_LOGO,
        "resources": ["catalog", "meta", "stream"],
        "types": types,
        "catalogs": catalogs,
        "idPrefixes": id_prefixes
    })
}

async fn manifest() -> Json<serde_json::Value> {
    Json(manifest_json())
}

/// `https://{Host}` when the client sent a host, the local listener otherwise.
fn public_base_url(ctx: &Context, headers: &HeaderMap) -> String {
    headers
        .get(header::HOST)
        .and_then(|host| host.to_str().ok())
        .filter(|host| !host.is_empty())
        .map(|host| format!("https://{host}"))
        .unwrap_or_else(|| format!("http://localhost:{}", ctx.config.port))
}

async fn index(State(ctx): State<Arc<Context>>, headers: HeaderMap) -> Json<serde_json::Value> {
    let base_url = public_base_url(&ctx, &headers);

    Json(json!({
        "message": format!("{ADDON_NAME} addon"),
        "manifest": format!("{base_url}/manifest.json"),
        "endpoints": {
            "manifest": "/manifest.json",
            "configure": "/configure",
            "catalog": "/catalog/{type}/{id}",
            "meta": "/meta/{type}/{id}",
            "stream": "/stream/{type}/{id}"
        }
    }))
}

pub fn render_configure_page(base_url: &str) -> String {
    let manifest_url = format!("{base_url}/manifest.json");
    let install_url = match manifest_url.split_once("://") {
        Some((_, rest)) => format!("stremio://{rest}"),
        None => format!("stremio://{manifest_url}"),
    };

    CONFIGURE_TEMPLATE
        .replace("{{INSTALL_URL}}", &install_url)
        .replace("{{MANIFEST_URL}}", &manifest_url)
        .replace("{{VERSION}}", env!("CARGO_PKG_VERSION"))
}

async fn configure(State(ctx): State<Arc<Context>>, headers: HeaderMap) -> Html<String> {
    Html(render_configure_page(&public_base_url(&ctx, &headers)))
}

// resources

#[derive(Deserialize, Debug, Default)]
struct ExtraQuery {
    extra: Option<String>,
}

fn strip_json(segment: &str) -> &str {
    segment.strip_suffix(".json").unwrap_or(segment)
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<Error>().is_some_and(Error::is_not_found)
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn parse_content_type(raw: &str) -> Result<ContentType, Response> {
    ContentType::from_str(strip_json(raw))
        .map_err(|_| bad_request(format!("invalid content type: {raw}")))
}

fn parse_identifier(raw: &str) -> Result<ContentIdentifier, Response> {
    ContentIdentifier::from_str(strip_json(raw)).map_err(|e| bad_request(e.to_string()))
}

/// The identifier must name the same content type as the request path.
fn parse_typed_identifier(content_type: &str, raw: &str) -> Result<ContentIdentifier, Response> {
    let content_type = parse_content_type(content_type)?;
    let id = parse_identifier(raw)?;

    if id.content_type != content_type {
        return Err(bad_request(format!(
            "identifier {id} is not of type {content_type}"
        )));
    }
    Ok(id)
}

async fn catalog(
    State(ctx): State<Arc<Context>>,
    Path((content_type, id)): Path<(String, String)>,
    Query(query): Query<ExtraQuery>,
) -> Response {
    let extra = query.extra.as_deref().unwrap_or_default();
    load_catalog(&ctx, &content_type, strip_json(&id), extra).await
}

async fn catalog_with_extra(
    State(ctx): State<Arc<Context>>,
    Path((content_type, id, extra)): Path<(String, String, String)>,
) -> Response {
    load_catalog(&ctx, &content_type, &id, strip_json(&extra)).await
}

async fn load_catalog(ctx: &Context, content_type: &str, catalog_id: &str, extra: &str) -> Response {
    let content_type = match parse_content_type(content_type) {
        Ok(content_type) => content_type,
        Err(res) => return res,
    };
    let extra = CatalogExtra::parse(extra);

    let supplier = AllContentSuppliers::iter().find(|sup| {
        sup.get_catalogs()
            .iter()
            .any(|c| c.id == catalog_id && c.content_type == content_type)
    });

    let Some(supplier) = supplier else {
        warn!("[api] unknown catalog {content_type}/{catalog_id}");
        return Json(json!({ "metas": [] })).into_response();
    };

    debug!("[api] catalog {content_type}/{catalog_id} {extra:?}");

    match supplier.load_catalog(ctx, content_type, &extra).await {
        Ok(metas) => Json(json!({ "metas": metas })).into_response(),
        Err(err) => {
            error!("[api] fail to load catalog {content_type}/{catalog_id}: {err:#}");
            Json(json!({ "metas": [] })).into_response()
        }
    }
}

async fn meta(
    State(ctx): State<Arc<Context>>,
    Path((content_type, id)): Path<(String, String)>,
) -> Response {
    let id = match parse_typed_identifier(&content_type, &id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    let supplier = match get_supplier(&id.source) {
        Ok(supplier) => supplier,
        Err(err) => {
            return (StatusCode::NOT_FOUND, Json(json!({ "error": err.to_string() })))
                .into_response()
        }
    };

    match supplier.load_meta(&ctx, &id).await {
        Ok(meta) => Json(json!({ "meta": meta })).into_response(),
        Err(err) if is_not_found(&err) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Content not found" })),
        )
            .into_response(),
        Err(err) => {
            error!("[api] fail to load meta {id}: {err:#}");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "Failed to fetch metadata" })),
            )
                .into_response()
        }
    }
}

async fn stream(
    State(ctx): State<Arc<Context>>,
    Path((content_type, id)): Path<(String, String)>,
) -> Response {
    let id = match parse_typed_identifier(&content_type, &id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    let supplier = match get_supplier(&id.source) {
        Ok(supplier) => supplier,
        Err(err) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": err.to_string(), "streams": [] })),
            )
                .into_response()
        }
    };

    let deadline = ctx.config.stream_deadline;
    let res = tokio::time::timeout(deadline, supplier.load_streams(&ctx, &id)).await;

    match res {
        Ok(Ok(streams)) => Json(json!({ "streams": streams })).into_response(),
        Ok(Err(err)) if is_not_found(&err) => {
            info!("[api] {id}: {err}");
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": err.to_string(), "streams": [] })),
            )
                .into_response()
        }
        Ok(Err(err)) => {
            error!("[api] fail to load streams for {id}: {err:#}");
            Json(json!({ "streams": [] })).into_response()
        }
        Err(_) => {
            warn!("[api] stream resolution for {id} exceeded {deadline:?}");
            Json(json!({ "streams": [] })).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    fn router_for(base_url: String, stream_deadline: Duration) -> Router {
        let config = Config {
            base_url,
            stream_deadline,
            ..Default::default()
        };
        create_router(Arc::new(Context::new(config).unwrap()))
    }

    fn offline_router() -> Router {
        router_for("http://127.0.0.1:9".into(), Duration::from_secs(5))
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let res = router
            .oneshot(
                Request::get(uri)
                    .header(header::HOST, "addon.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = get(router, uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn mount_matrix(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/movie/the-matrix-19995"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<div class="detail_page-watch" data-id="123"></div>
                   <div class="detail_page-infor"><h2 class="heading-name"><a>The Matrix</a></h2></div>"#,
            ))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn should_serve_manifest() {
        let (status, manifest) = get_json(offline_router(), "/manifest.json").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(manifest["id"], "myflixer.stremio.addon");
        assert_eq!(manifest["name"], "MyFlixer");
        assert_eq!(manifest["types"], json!(["movie", "series"]));
        assert_eq!(manifest["resources"], json!(["catalog", "meta", "stream"]));
        assert_eq!(manifest["idPrefixes"], json!(["myflixer:"]));
        assert_eq!(manifest["catalogs"][0]["id"], "myflixer-movies");
        assert_eq!(manifest["catalogs"][1]["type"], "series");
        assert_eq!(manifest["catalogs"][1]["extra"][1]["name"], "search");
    }

    #[tokio::test]
    async fn should_derive_urls_from_host_header() {
        let (_, index) = get_json(offline_router(), "/").await;
        assert_eq!(index["manifest"], "https://addon.example/manifest.json");

        let (status, page) = get(offline_router(), "/configure").await;
        let page = String::from_utf8(page).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert!(page.contains("https://addon.example/manifest.json"));
        assert!(page.contains("stremio://addon.example/manifest.json"));
        assert!(!page.contains("{{"));
    }

    #[test]
    fn should_render_configure_page_for_local_address() {
        let page = render_configure_page("http://localhost:7000");

        assert!(page.contains(r#"href="stremio://localhost:7000/manifest.json""#));
        assert!(page.contains(env!("CARGO_PKG_VERSION")));
    }

    #[tokio::test]
    async fn should_reject_invalid_type_and_identifier() {
        let (status, body) = get_json(offline_router(), "/stream/anime/myflixer:movie:x.json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = get_json(offline_router(), "/stream/movie/the-matrix.json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_json(offline_router(), "/meta/movie/myflixer:anime:x.json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_json(offline_router(), "/catalog/anime/myflixer-movies.json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_reject_identifier_of_other_type() {
        let (status, body) =
            get_json(offline_router(), "/stream/series/myflixer:movie:x.json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "identifier myflixer:movie:x is not of type series");

        let (status, _) = get_json(offline_router(), "/meta/movie/myflixer:series:show-1.json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_report_unknown_source() {
        let (status, body) = get_json(offline_router(), "/stream/movie/netflix:movie:x.json").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["streams"], json!([]));
    }

    #[test_log::test(tokio::test)]
    async fn should_serve_streams() {
        let server = MockServer::start().await;
        mount_matrix(&server).await;
        Mock::given(path("/ajax/episode/list/123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<a class="link-item" data-linkid="456">Server</a>"#),
            )
            .mount(&server)
            .await;
        Mock::given(path("/ajax/episode/sources/456"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"type": "iframe", "link": "https://cdn.example/video.m3u8"})),
            )
            .mount(&server)
            .await;

        let router = router_for(server.uri(), Duration::from_secs(5));
        let (status, body) =
            get_json(router, "/stream/movie/myflixer:movie:the-matrix-19995.json").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "streams": [{
                    "name": "MyFlixer",
                    "title": "MyFlixer - Direct",
                    "url": "https://cdn.example/video.m3u8",
                    "behaviorHints": { "bingeGroup": "myflixer" }
                }]
            })
        );
    }

    #[test_log::test(tokio::test)]
    async fn should_answer_not_found_streams() {
        let server = MockServer::start().await;
        Mock::given(path("/movie/gone"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let router = router_for(server.uri(), Duration::from_secs(5));
        let (status, body) = get_json(router, "/stream/movie/myflixer:movie:gone.json").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["streams"], json!([]));
    }

    #[test_log::test(tokio::test)]
    async fn should_give_up_after_stream_deadline() {
        let server = MockServer::start().await;
        Mock::given(path("/movie/the-matrix-19995"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let router = router_for(server.uri(), Duration::from_millis(200));
        let (status, body) =
            get_json(router, "/stream/movie/myflixer:movie:the-matrix-19995.json").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "streams": [] }));
    }

    #[test_log::test(tokio::test)]
    async fn should_serve_catalog_with_extra() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<div class="flw-item">
                    <img class="film-poster-img" src="https://img.example/matrix.jpg">
                    <h2 class="film-name"><a href="/movie/the-matrix-19995" title="The Matrix">The Matrix</a></h2>
                </div>"#,
            ))
            .mount(&server)
            .await;

        let router = router_for(server.uri(), Duration::from_secs(5));
        let (status, body) =
            get_json(router.clone(), "/catalog/movie/myflixer-movies/skip=20.json").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metas"][0]["id"], "myflixer:movie:the-matrix-19995");

        let (_, body) = get_json(router, "/catalog/movie/myflixer-movies.json?extra=skip%3D20").await;
        assert_eq!(body["metas"].as_array().map(Vec::len), Some(1));
    }

    #[test_log::test(tokio::test)]
    async fn should_degrade_catalog_to_empty() {
        let (status, body) = get_json(offline_router(), "/catalog/series/myflixer-series.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "metas": [] }));

        let (status, body) = get_json(offline_router(), "/catalog/movie/unknown.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "metas": [] }));
    }

    #[test_log::test(tokio::test)]
    async fn should_serve_meta() {
        let server = MockServer::start().await;
        mount_matrix(&server).await;
        Mock::given(path("/movie/gone"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let router = router_for(server.uri(), Duration::from_secs(5));
        let (status, body) =
            get_json(router.clone(), "/meta/movie/myflixer:movie:the-matrix-19995.json").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["name"], "The Matrix");
        assert_eq!(body["meta"]["type"], "movie");

        let (status, _) = get_json(router, "/meta/movie/myflixer:movie:gone.json").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
