use anyhow::Result;
use reqwest::{StatusCode, Url};
use serde_json::{Value, json};
use tracing::info;
use watchlist_dal::watchlist::WatchlistEntry;

pub fn movie(title: &str, popularity: i64) -> Value {
    json!({
        "original_title": title,
        "overview": format!("Overview of {title}"),
        "genres": "Drama",
        "popularity": popularity,
        "release_date": "1979-05-25",
        "poster_path": format!("/{}.jpg", title.to_lowercase().replace(' ', "_"))
    })
}

pub async fn create_movie(client: &reqwest::Client, base_url: &Url, payload: &Value) -> Result<()> {
    let api_url = base_url.join("watchlist")?;

    let response = client.post(api_url).json(payload).send().await?;
    info!("Response: {:#?}", response);
    assert_eq!(response.status(), StatusCode::CREATED);
    Ok(())
}

pub async fn list_movies(client: &reqwest::Client, base_url: &Url) -> Result<Vec<WatchlistEntry>> {
    let api_url = base_url.join("watchlist")?;

    let response = client.get(api_url).send().await?;
    info!("Response: {:#?}", response);
    assert!(response.status().is_success());
    let entries: Vec<WatchlistEntry> = response.json().await?;
    Ok(entries)
}
