use pagefetch::{config::Config, fetcher::CachingFetcher, http::HttpClient};
use std::str::FromStr;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_path().unwrap_or_default();

    let level = tracing::Level::from_str(&config.log_level).unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    let url = std::env::args()
        .nth(1)
        .expect("no url given, usage: pagefetch <url>");

    let conn = prepare_cache(&config).await;
    let mut fetcher = CachingFetcher::new(conn, HttpClient::new());

    let page = fetcher
        .fetch(&url)
        .await
        .unwrap_or_else(|err| panic!("fail to fetch `{url}`: {err:#}"));
    println!("{page}");
}

async fn prepare_cache(config: &Config) -> redis::aio::ConnectionManager {
    let client = redis::Client::open(config.redis_addr.as_str()).expect("fail to open client");
    redis::aio::ConnectionManager::new(client)
        .await
        .expect("fail to connect to redis")
}
