//! A minimal mock registry for command tests.

use libfreight::Digest;
use mockito::{Mock, ServerGuard};

fn digest_of(content: &str) -> Digest {
    Digest::sha256_of(content.as_bytes()).unwrap()
}

pub(crate) async fn mock_tags(server: &mut ServerGuard, repository: &str, tags: &[&str]) -> Vec<Mock> {
    let body = serde_json::json!({ "name": repository, "tags": tags }).to_string();
    vec![
        server.mock("GET", "/v2/").with_status(200).create_async().await,
        server
            .mock("GET", format!("/v2/{repository}/tags/list").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await,
    ]
}

/// Serves a linux/amd64 image built at `created` under `tag`. Returns the
/// manifest digest.
pub(crate) async fn mock_image(
    server: &mut ServerGuard,
    repository: &str,
    tag: &str,
    created: &str,
) -> (Digest, Vec<Mock>) {
    let config = serde_json::json!({
        "architecture": "amd64",
        "os": "linux",
        "created": created,
        "config": {},
        "rootfs": { "type": "layers", "diff_ids": [] }
    })
    .to_string();
    let manifest = serde_json::json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.oci.image.manifest.v1+json",
        "config": {
            "mediaType": "application/vnd.oci.image.config.v1+json",
            "size": config.len(),
            "digest": digest_of(&config).to_string()
        },
        "layers": []
    })
    .to_string();

    let mocks = vec![
        server
            .mock("GET", format!("/v2/{repository}/manifests/{tag}").as_str())
            .with_status(200)
            .with_header("content-type", "application/vnd.oci.image.manifest.v1+json")
            .with_header("Docker-Content-Digest", &digest_of(&manifest).to_string())
            .with_body(&manifest)
            .create_async()
            .await,
        server
            .mock("GET", format!("/v2/{repository}/blobs/{}", digest_of(&config)).as_str())
            .with_status(200)
            .with_body(&config)
            .create_async()
            .await,
    ];
    (digest_of(&manifest), mocks)
}
