use super::*;
use mockito::Matcher;

#[test]
fn test_credentials_anonymous() {
    let creds = Credentials::anonymous();
    assert_eq!(creds, Credentials::Anonymous);
    assert_eq!(creds.to_header_value(), None);
    assert_eq!(Credentials::default(), Credentials::Anonymous);
}

#[test]
fn test_credentials_basic() {
    let creds = Credentials::basic("testuser", "testpass");
    match &creds {
        Credentials::Basic { username, password } => {
            assert_eq!(username, "testuser");
            assert_eq!(password, "testpass");
        }
        _ => panic!("Expected Basic credentials"),
    }

    let header = creds.to_header_value().unwrap();
    assert_eq!(header, "Basic dGVzdHVzZXI6dGVzdHBhc3M=");
}

#[test]
fn test_credentials_bearer() {
    let creds = Credentials::bearer("my_token");
    assert_eq!(creds.to_header_value().unwrap(), "Bearer my_token");
}

#[test]
fn test_credentials_from_parts() {
    assert_eq!(
        Credentials::from_parts(Some("user"), Some("pass")),
        Credentials::basic("user", "pass")
    );
    assert_eq!(
        Credentials::from_parts(Some("user"), None),
        Credentials::basic("user", "")
    );
    assert_eq!(Credentials::from_parts(Some(""), Some("pass")), Credentials::Anonymous);
    assert_eq!(Credentials::from_parts(None, Some("pass")), Credentials::Anonymous);
}

#[test]
fn test_challenge_parse_bearer() {
    let header = r#"Bearer realm="https://auth.example.com/token",service="registry.example.com",scope="repository:alpine:pull""#;

    let challenge = Challenge::parse(header).unwrap();
    assert_eq!(
        challenge,
        Challenge::Bearer {
            realm: "https://auth.example.com/token".to_string(),
            service: Some("registry.example.com".to_string()),
            scope: Some("repository:alpine:pull".to_string()),
        }
    );
}

#[test]
fn test_challenge_parse_without_service() {
    let header = r#"Bearer realm="https://auth.example.com/token",scope="repository:alpine:pull""#;

    match Challenge::parse(header).unwrap() {
        Challenge::Bearer { realm, service, .. } => {
            assert_eq!(realm, "https://auth.example.com/token");
            assert_eq!(service, None);
        }
        other => panic!("Expected Bearer challenge, got {other:?}"),
    }
}

#[test]
fn test_challenge_parse_scope_with_comma() {
    let header = r#"Bearer realm="https://auth.example.com/token",scope="repository:a:pull,push",service="svc""#;

    match Challenge::parse(header).unwrap() {
        Challenge::Bearer { scope, service, .. } => {
            assert_eq!(scope.as_deref(), Some("repository:a:pull,push"));
            assert_eq!(service.as_deref(), Some("svc"));
        }
        other => panic!("Expected Bearer challenge, got {other:?}"),
    }
}

#[test]
fn test_challenge_parse_basic() {
    let header = r#"Basic realm="Registry Access""#;
    assert_eq!(Challenge::parse(header).unwrap(), Challenge::Basic);
}

#[test]
fn test_challenge_parse_missing_realm() {
    let header = r#"Bearer service="registry""#;

    let err = Challenge::parse(header).unwrap_err();
    assert!(matches!(err, FreightError::Authentication { .. }));
}

#[test]
fn test_challenge_parse_unknown_scheme() {
    assert!(Challenge::parse("Negotiate abc").is_err());
    assert!(Challenge::parse("InvalidHeader").is_err());
}

#[tokio::test]
async fn test_cache_probes_each_host_once() {
    let mut server = mockito::Server::new_async().await;
    let ping = server
        .mock("GET", "/v2/")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let cache = ChallengeCache::new();

    let (first, second) = tokio::join!(
        cache.get_or_discover(&client),
        cache.get_or_discover(&client)
    );
    let third = cache.get_or_discover(&client).await;

    ping.assert_async().await;
    assert_eq!(first.unwrap(), Challenge::Anonymous);
    assert_eq!(second.unwrap(), Challenge::Anonymous);
    assert_eq!(third.unwrap(), Challenge::Anonymous);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_cache_keeps_hosts_apart() {
    let mut first_server = mockito::Server::new_async().await;
    let mut second_server = mockito::Server::new_async().await;
    let _first = first_server
        .mock("GET", "/v2/")
        .with_status(200)
        .create_async()
        .await;
    let _second = second_server
        .mock("GET", "/v2/")
        .with_status(401)
        .with_header("WWW-Authenticate", r#"Basic realm="private""#)
        .create_async()
        .await;

    let cache = ChallengeCache::new();
    let open = Client::new(&first_server.url()).unwrap();
    let private = Client::new(&second_server.url()).unwrap();

    assert_eq!(cache.get_or_discover(&open).await.unwrap(), Challenge::Anonymous);
    assert_eq!(cache.get_or_discover(&private).await.unwrap(), Challenge::Basic);
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn test_cache_does_not_remember_failures() {
    let mut server = mockito::Server::new_async().await;
    let failing = server
        .mock("GET", "/v2/")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let cache = ChallengeCache::new();
    assert!(cache.get_or_discover(&client).await.is_err());
    failing.assert_async().await;
    failing.remove_async().await;

    let _ok = server
        .mock("GET", "/v2/")
        .with_status(200)
        .create_async()
        .await;
    assert_eq!(cache.get_or_discover(&client).await.unwrap(), Challenge::Anonymous);
}

#[tokio::test]
async fn test_authorizer_anonymous_registry() {
    let mut server = mockito::Server::new_async().await;
    let _ping = server
        .mock("GET", "/v2/")
        .with_status(200)
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let authorizer = Authorizer::new(
        Credentials::basic("user", "pass"),
        Arc::new(ChallengeCache::new()),
    );

    assert_eq!(authorizer.authorization(&client, "team/app").await.unwrap(), None);
}

#[tokio::test]
async fn test_authorizer_basic_challenge_sends_credentials() {
    let mut server = mockito::Server::new_async().await;
    let _ping = server
        .mock("GET", "/v2/")
        .with_status(401)
        .with_header("WWW-Authenticate", r#"Basic realm="private""#)
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let authorizer = Authorizer::new(
        Credentials::basic("user", "pass"),
        Arc::new(ChallengeCache::new()),
    );

    assert_eq!(
        authorizer.authorization(&client, "team/app").await.unwrap(),
        Some("Basic dXNlcjpwYXNz".to_string())
    );
}

#[tokio::test]
async fn test_authorizer_exchanges_bearer_token_once() {
    let mut server = mockito::Server::new_async().await;
    let challenge = format!(
        r#"Bearer realm="{}/token",service="test-registry""#,
        server.url()
    );
    let _ping = server
        .mock("GET", "/v2/")
        .with_status(401)
        .with_header("WWW-Authenticate", &challenge)
        .create_async()
        .await;
    let token = server
        .mock("GET", "/token")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("scope".into(), "repository:team/app:pull".into()),
            Matcher::UrlEncoded("service".into(), "test-registry".into()),
        ]))
        .match_header("authorization", "Basic dXNlcjpwYXNz")
        .with_status(200)
        .with_body(r#"{"token":"pull-token"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let authorizer = Authorizer::new(
        Credentials::basic("user", "pass"),
        Arc::new(ChallengeCache::new()),
    );

    for _ in 0..2 {
        assert_eq!(
            authorizer.authorization(&client, "team/app").await.unwrap(),
            Some("Bearer pull-token".to_string())
        );
    }
    token.assert_async().await;
}

#[tokio::test]
async fn test_authorizer_static_bearer_skips_discovery() {
    let mut server = mockito::Server::new_async().await;
    let ping = server
        .mock("GET", "/v2/")
        .with_status(200)
        .expect(0)
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let authorizer = Authorizer::new(Credentials::bearer("static"), Arc::new(ChallengeCache::new()));

    assert_eq!(
        authorizer.authorization(&client, "team/app").await.unwrap(),
        Some("Bearer static".to_string())
    );
    ping.assert_async().await;
}
