//! Fixtures and mock registry routes shared by unit tests.

use crate::digest::Digest;
use mockito::{Mock, ServerGuard};

/// `(os, architecture, variant, config blob)` for one index entry.
pub(crate) type IndexEntry<'a> = (&'a str, &'a str, Option<&'a str>, &'a str);

pub(crate) fn digest_of(content: &str) -> Digest {
    Digest::sha256_of(content.as_bytes()).unwrap()
}

pub(crate) fn config_json(
    created: Option<&str>,
    os: &str,
    architecture: &str,
    variant: Option<&str>,
) -> String {
    let mut value = serde_json::json!({
        "architecture": architecture,
        "os": os,
        "config": {},
        "rootfs": { "type": "layers", "diff_ids": [] }
    });
    if let Some(created) = created {
        value["created"] = created.into();
    }
    if let Some(variant) = variant {
        value["variant"] = variant.into();
    }
    value.to_string()
}

/// A single-platform manifest whose config blob is `config`.
pub(crate) fn image_manifest_json(config: &str) -> String {
    format!(
        r#"{{
    "schemaVersion": 2,
    "mediaType": "application/vnd.oci.image.manifest.v1+json",
    "config": {{
        "mediaType": "application/vnd.oci.image.config.v1+json",
        "size": {},
        "digest": "{}"
    }},
    "layers": []
}}"#,
        config.len(),
        digest_of(config)
    )
}

pub(crate) fn index_json(entries: &[IndexEntry<'_>]) -> String {
    let manifests: Vec<serde_json::Value> = entries
        .iter()
        .map(|(os, arch, variant, config)| {
            let manifest = image_manifest_json(config);
            let mut platform = serde_json::json!({ "architecture": arch, "os": os });
            if let Some(variant) = variant {
                platform["variant"] = (*variant).into();
            }
            serde_json::json!({
                "mediaType": "application/vnd.oci.image.manifest.v1+json",
                "size": manifest.len(),
                "digest": digest_of(&manifest).to_string(),
                "platform": platform
            })
        })
        .collect();

    serde_json::json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.oci.image.index.v1+json",
        "manifests": manifests
    })
    .to_string()
}

pub(crate) async fn mock_ping(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/v2/")
        .with_status(200)
        .create_async()
        .await
}

pub(crate) async fn mock_tags(server: &mut ServerGuard, repository: &str, tags: &[&str]) -> Mock {
    let body = serde_json::json!({ "name": repository, "tags": tags }).to_string();
    server
        .mock("GET", format!("/v2/{repository}/tags/list").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

async fn mock_manifest(
    server: &mut ServerGuard,
    repository: &str,
    reference: &str,
    body: &str,
    media_type: &str,
) -> Mock {
    server
        .mock("GET", format!("/v2/{repository}/manifests/{reference}").as_str())
        .with_status(200)
        .with_header("content-type", media_type)
        .with_header("Docker-Content-Digest", &digest_of(body).to_string())
        .with_body(body)
        .create_async()
        .await
}

async fn mock_blob(server: &mut ServerGuard, repository: &str, content: &str) -> Mock {
    server
        .mock(
            "GET",
            format!("/v2/{repository}/blobs/{}", digest_of(content)).as_str(),
        )
        .with_status(200)
        .with_body(content)
        .create_async()
        .await
}

/// Serves a single-platform image under `tag`. Returns the manifest digest.
pub(crate) async fn mock_image(
    server: &mut ServerGuard,
    repository: &str,
    tag: &str,
    config: &str,
) -> (Digest, Vec<Mock>) {
    let manifest = image_manifest_json(config);
    let mocks = vec![
        mock_manifest(
            server,
            repository,
            tag,
            &manifest,
            "application/vnd.oci.image.manifest.v1+json",
        )
        .await,
        mock_blob(server, repository, config).await,
    ];
    (digest_of(&manifest), mocks)
}

/// Serves a multi-platform index under `tag`, plus every entry's manifest and
/// config. Returns the index digest.
pub(crate) async fn mock_index(
    server: &mut ServerGuard,
    repository: &str,
    tag: &str,
    entries: &[IndexEntry<'_>],
) -> (Digest, Vec<Mock>) {
    let index = index_json(entries);
    let mut mocks = vec![
        mock_manifest(
            server,
            repository,
            tag,
            &index,
            "application/vnd.oci.image.index.v1+json",
        )
        .await,
    ];
    for (_, _, _, config) in entries {
        let manifest = image_manifest_json(config);
        let digest = digest_of(&manifest).to_string();
        mocks.push(
            mock_manifest(
                server,
                repository,
                &digest,
                &manifest,
                "application/vnd.oci.image.manifest.v1+json",
            )
            .await,
        );
        mocks.push(mock_blob(server, repository, config).await);
    }
    (digest_of(&index), mocks)
}
