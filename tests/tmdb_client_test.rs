//! Integration tests for the TMDB client and the merged catalog search.

mod common;

use std::sync::Arc;

use serde_json::json;
use streamflix::catalog::CatalogRegistry;
use streamflix_common::{MediaType, TimeWindow};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{anime_client, anime_listing, tmdb_client};

#[tokio::test]
async fn requests_carry_key_and_language() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trending/all/week"))
        .and(query_param("api_key", "test-key"))
        .and(query_param("language", "en-US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": 603, "media_type": "movie", "title": "The Matrix" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = tmdb_client(&server);
    let first = client.trending(TimeWindow::Week).await.unwrap();
    let second = client.trending(TimeWindow::Week).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first["results"][0]["id"], 603);
}

#[tokio::test]
async fn trailer_is_picked_from_videos() {
    let server = MockServer::start().await;
    Mock::given(path("/movie/603/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "key": "t", "type": "Teaser", "site": "YouTube" },
                { "key": "m", "type": "Trailer", "site": "YouTube" }
            ]
        })))
        .mount(&server)
        .await;

    let client = tmdb_client(&server);
    let trailer = client.trailer(MediaType::Movie, 603).await.unwrap().unwrap();
    assert_eq!(trailer["key"], "m");
}

#[tokio::test]
async fn discover_params_override_defaults() {
    let server = MockServer::start().await;
    Mock::given(path("/discover/tv"))
        .and(query_param("sort_by", "vote_average.desc"))
        .and(query_param("page", "1"))
        .and(query_param("with_genres", "16"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = tmdb_client(&server);
    client
        .discover(
            MediaType::Tv,
            &[("sort_by", "vote_average.desc"), ("with_genres", "16")],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn registry_merges_catalogs_and_skips_failures() {
    let tmdb_server = MockServer::start().await;
    Mock::given(path("/search/multi"))
        .and(query_param("query", "frieren"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "id": 209867, "media_type": "tv", "name": "Frieren: Beyond Journey's End" },
                { "id": 1, "media_type": "person", "name": "Someone" }
            ]
        })))
        .mount(&tmdb_server)
        .await;

    let anime_server = MockServer::builder().start().await;
    Mock::given(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(anime_listing(&["frieren-18542"])))
        .mount(&anime_server)
        .await;

    let mut registry = CatalogRegistry::new();
    registry.register(Arc::new(tmdb_client(&tmdb_server)));
    registry.register(Arc::new(anime_client(&anime_server)));

    let items = registry.search("frieren", 1).await.unwrap();
    let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["209867", "frieren-18542"]);
    assert_eq!(items[1].media_type, Some(MediaType::Anime));

    // The anime backend going down leaves the TMDB results.
    drop(anime_server);
    let items = registry.search("frieren", 2).await.unwrap();
    assert!(items.iter().all(|i| i.media_type == Some(MediaType::Tv)));
}
