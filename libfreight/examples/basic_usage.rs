//! Basic usage example for the Freight library.
//!
//! Resolves the newest `1.x` tag of an image and the latest chart version
//! from a classic Helm repository.
//!
//! Run with: cargo run --example basic_usage -- <image-repo> [chart-repo chart]

use libfreight::chart::get_latest_chart_version;
use libfreight::image::{SelectionStrategy, Selector, SelectorOptions};
use libfreight::ClientConfig;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let image_repo = args.next().unwrap_or_else(|| "localhost:5000/app".to_string());

    println!("Freight Library - Basic Usage Example\n");

    let selector = Selector::new(
        &image_repo,
        SelectionStrategy::SemVer,
        SelectorOptions::new()
            .with_constraint("^1.0.0")
            .with_platform("linux/amd64"),
    )?;

    match selector.select_with_timeout(Duration::from_secs(30)).await {
        Ok(Some(image)) => {
            println!("✓ Selected image from {}", image.repository);
            println!("  tag:    {}", image.tag.as_deref().unwrap_or("-"));
            println!("  digest: {}", image.digest);
            if let Some(created) = image.created_at {
                println!("  built:  {}", created.to_rfc3339());
            }
        }
        Ok(None) => println!("✓ No image matches ^1.0.0 on linux/amd64"),
        Err(e) => {
            eprintln!("✗ Selection failed: {}", e);
            eprintln!("  Make sure a registry is running and reachable at {}", image_repo);
        }
    }

    if let (Some(chart_repo), Some(chart)) = (args.next(), args.next()) {
        println!("\nResolving chart {} from {}...", chart, chart_repo);
        match get_latest_chart_version(&chart_repo, &chart, "", None, &ClientConfig::default()).await {
            Ok(Some(version)) => println!("✓ Latest version: {}", version),
            Ok(None) => println!("✓ No versions available"),
            Err(e) => eprintln!("✗ Chart resolution failed: {}", e),
        }
    }

    Ok(())
}
