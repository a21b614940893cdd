mod common;

use std::time::Duration;

use common::{TestServer, MATCHES_JSON, TEAMS_JSON};
use matchday_core::{ApiClient, AppError, MatchType};

fn client(base_url: &str) -> ApiClient {
    ApiClient::with_base_url(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_fetch_matches_flattens_envelope() {
    let server = TestServer::start().await;
    server.route("/teams/matches", 200, MATCHES_JSON);

    let matches = client(&server.base_url()).fetch_matches().await.unwrap();

    assert_eq!(matches.len(), 3);
    let kinds: Vec<MatchType> = matches.iter().map(|m| m.match_type).collect();
    assert_eq!(kinds, vec![MatchType::Previous, MatchType::Previous, MatchType::Upcoming]);
    assert_eq!(
        matches[0].identifier(),
        "Apr 23, 2022 18:00Team Cool Eagles vs. Team Red Dragons"
    );
    assert_eq!(matches[1].identifier(), "Apr 24, 2022 18:00Team Chill Elephants vs. Team Cool Eagles");
    assert_eq!(matches[2].winner, None);
    assert_eq!(server.requests(), vec!["GET /teams/matches HTTP/1.1"]);
}

#[tokio::test]
async fn test_fetch_teams() {
    let server = TestServer::start().await;
    server.route("/teams", 200, TEAMS_JSON);

    let teams = client(&server.base_url()).fetch_teams().await.unwrap();

    assert_eq!(teams.len(), 3);
    assert_eq!(teams[0].name.as_deref(), Some("Team Red Dragons"));
    assert_eq!(teams[2].logo, None);
}

#[tokio::test]
async fn test_base_path_is_kept() {
    let server = TestServer::start().await;
    server.route("/prod/teams", 200, r#"{"teams": []}"#);

    let teams = client(&format!("{}/prod", server.base_url())).fetch_teams().await.unwrap();
    assert!(teams.is_empty());
}

#[tokio::test]
async fn test_missing_teams_key_is_empty() {
    let server = TestServer::start().await;
    server.route("/teams", 200, "{}");

    let teams = client(&server.base_url()).fetch_teams().await.unwrap();
    assert!(teams.is_empty());
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let server = TestServer::start().await;
    let api = client(&server.base_url());

    for (status, expected) in [
        (400, AppError::BadRequest),
        (401, AppError::Unauthorized),
        (403, AppError::Forbidden),
        (404, AppError::NotFound),
        (429, AppError::Error4xx(429)),
        (500, AppError::ServerError),
        (503, AppError::Error5xx(503)),
    ] {
        server.route("/teams", status, r#"{"message": "nope"}"#);
        assert_eq!(api.fetch_teams().await, Err(expected), "status {}", status);
    }
}

#[tokio::test]
async fn test_unrouted_path_is_not_found() {
    let server = TestServer::start().await;
    assert_eq!(client(&server.base_url()).fetch_matches().await, Err(AppError::NotFound));
}

#[tokio::test]
async fn test_malformed_body_is_decoding_error() {
    let server = TestServer::start().await;
    server.route("/teams", 200, "<html>oops</html>");
    server.route("/teams/matches", 200, r#"{"matches": {"previous": []}}"#);
    let api = client(&server.base_url());

    assert!(matches!(api.fetch_teams().await, Err(AppError::DecodingError(_))));
    // Both groups are required
    assert!(matches!(api.fetch_matches().await, Err(AppError::DecodingError(_))));
}

#[tokio::test]
async fn test_bad_date_is_decoding_error() {
    let server = TestServer::start().await;
    server.route(
        "/teams/matches",
        200,
        r#"{"matches": {"previous": [{"date": "23/04/2022", "description": "x"}], "upcoming": []}}"#,
    );

    let result = client(&server.base_url()).fetch_matches().await;
    assert!(matches!(result, Err(AppError::DecodingError(_))));
}

#[tokio::test]
async fn test_refused_connection_is_transport_failure() {
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let result = client(&format!("http://{}", addr)).fetch_teams().await;
    assert!(matches!(result, Err(AppError::TransportFailed(_))), "got {:?}", result);
}
