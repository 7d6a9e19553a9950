use super::*;
use std::error::Error;

#[test]
fn test_config_error_message() {
    let err = FreightError::config("invalid image selection strategy \"invalid\"");

    assert!(matches!(err, FreightError::Config { path: None, .. }));
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(
        err.to_string()
            .contains("invalid image selection strategy \"invalid\"")
    );
}

#[test]
fn test_config_file_error_keeps_path_and_source() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
    let err = FreightError::config_file("failed to read config", Some("/tmp/freight.yaml"), io_err);

    match &err {
        FreightError::Config { path, .. } => {
            assert_eq!(path.as_deref(), Some("/tmp/freight.yaml"));
        }
        _ => panic!("Expected Config error"),
    }
    assert!(err.source().is_some());
}

#[test]
fn test_network_error_timeout() {
    let err = FreightError::network("request to https://ghcr.io timed out after 30 seconds");

    assert!(err.to_string().contains("timed out"));
    assert!(err.is_transport());
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[test]
fn test_network_error_with_source() {
    let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
    let err = FreightError::network_with_source("failed to connect", io_err);

    assert!(err.source().is_some());
    assert_eq!(err.source().unwrap().to_string(), "refused");
}

#[test]
fn test_http_status_error_embeds_status() {
    let err = FreightError::http_status("http://localhost/repo/index.yaml", 404);

    assert_eq!(err.kind(), ErrorKind::HttpStatus);
    assert!(err.to_string().contains("received unexpected HTTP 404"));
    assert!(err.to_string().contains("http://localhost/repo/index.yaml"));
    assert!(!err.is_transport());
}

#[test]
fn test_authentication_error() {
    let err = FreightError::authentication("invalid username or password", Some(401));

    assert!(matches!(
        err,
        FreightError::Authentication {
            status_code: Some(401),
            ..
        }
    ));
    assert!(err.to_string().contains("invalid username or password"));
}

#[test]
fn test_parse_error() {
    let err = FreightError::parse("error parsing constraint \"invalid\"");

    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(err.to_string().contains("error parsing constraint"));
}

#[test]
fn test_chart_not_found_message() {
    let err = FreightError::chart_not_found("fake-chart", "https://charts.example.com");

    assert_eq!(err.kind(), ErrorKind::NotFound);
    let msg = err.to_string();
    assert!(msg.contains("no versions of chart \"fake-chart\""));
    assert!(msg.contains("found in repository index"));
    assert!(msg.contains("https://charts.example.com"));
}

#[test]
fn test_registry_error_wraps_cause() {
    let inner = FreightError::http_status("https://ghcr.io/v2/app/tags/list", 500);
    let err = FreightError::registry("listing tags", "ghcr.io/example/app", inner);

    assert_eq!(err.kind(), ErrorKind::Registry);
    assert_eq!(err.root().kind(), ErrorKind::HttpStatus);
    assert!(!err.is_transport());

    let msg = err.to_string();
    assert!(msg.contains("listing tags"));
    assert!(msg.contains("ghcr.io/example/app"));
    assert!(err.source().is_some());
}

#[test]
fn test_registry_error_leaves_cause_to_source_chain() {
    let inner = FreightError::http_status("https://ghcr.io/v2/app/tags/list", 500);
    let err = FreightError::registry("listing tags", "ghcr.io/example/app", inner);

    assert_eq!(
        err.to_string(),
        "Registry error while listing tags for ghcr.io/example/app"
    );
    let cause = err.source().unwrap().to_string();
    assert_eq!(
        cause,
        "received unexpected HTTP 500 from https://ghcr.io/v2/app/tags/list"
    );
}

#[test]
fn test_registry_error_transport_detection_through_nesting() {
    let err = FreightError::registry(
        "retrieving image with tag \"1.0.0\"",
        "docker.io/library/debian",
        FreightError::registry(
            "fetching manifest",
            "docker.io/library/debian",
            FreightError::network("connection reset"),
        ),
    );

    assert!(err.is_transport());
}

#[test]
fn test_error_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<FreightError>();
}
