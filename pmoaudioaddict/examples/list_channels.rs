//! Example: List the channels of an AudioAddict service with stream URLs
//!
//! Run with: cargo run -p pmoaudioaddict --example list_channels
//! Or with a specific service: cargo run -p pmoaudioaddict --example list_channels -- jazz
//!
//! Preferences (listen key, tiers, source preference) are read from
//! ~/.pmoaudioaddict/config.yaml and PMOAUDIOADDICT_CONFIG__* variables.

use pmoaudioaddict::{channel_directory, service_menu, AudioAddictConfig, StreamUrlCache};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let service = env::args().nth(1).unwrap_or_else(|| "di".to_string());

    println!("Services:");
    for entry in service_menu() {
        println!("  {:<12} {}", entry.id, entry.title);
    }
    println!();

    let config = AudioAddictConfig::load(AudioAddictConfig::default_path())?;
    let mut client = config.build_client()?;

    let mut cache = match &config.stream_cache_path {
        Some(path) => StreamUrlCache::load(path)?,
        None => StreamUrlCache::new(),
    };

    let directory = channel_directory(&mut client, &mut cache, &config, &service)?;
    println!("{} ({} channels, tier {})", directory.title, directory.items.len(), client.stream_tier());
    println!("---");

    for item in &directory.items {
        println!(
            "{:<30} {:>4} kbps  {}",
            item.title, item.media.bitrate, item.url
        );
    }

    if let Some(first) = directory.items.first() {
        match client.now_playing(&first.key) {
            Ok(track) => println!("\nNow on {}: {}", first.title, track),
            Err(e) => println!("\nNo track info for {}: {}", first.title, e),
        }
    }

    if let Some(path) = &config.stream_cache_path {
        cache.save(path)?;
    }

    Ok(())
}
