use myflixer_bridge::{api, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    log::info!(
        "[main] source {} (timeout {:?}, stream deadline {:?})",
        config.base_url,
        config.request_timeout,
        config.stream_deadline
    );

    api::start_server(config).await
}
