// src/engine.rs
use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};

use rusbit_inspect::bencode::bvalue_to_json;
use rusbit_inspect::config::Config;
use rusbit_inspect::torrent::Torrent;
use rusbit_inspect::tracker::{AnnounceEvent, AnnounceRequest, TrackerClient, TrackerResponse};
use rusbit_inspect::utils::generate_peer_id;

use crate::{Cli, Command};

#[tokio::main]
pub async fn use_command(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    let opts = config.decode_options();

    match cli.command {
        Command::Decode { value } => {
            let value = opts
                .decode_exact(value.as_bytes())
                .context("decoding bencoded input")?;
            println!("{}", serde_json::to_string(&bvalue_to_json(&value))?);
        }
        Command::Info { torrent, json } => {
            let torrent = load_torrent(&torrent, &config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&torrent)?);
            } else {
                print_info(&torrent);
            }
        }
        Command::Peers { torrent } => {
            let torrent = load_torrent(&torrent, &config)?;
            let announce = first_announce(&torrent)?;
            let client = TrackerClient::new(config.request_timeout(), opts)?;

            let request = AnnounceRequest {
                announce_url: announce.to_string(),
                info_hash: torrent.info_hash,
                peer_id: generate_peer_id(&config.peer_id_prefix),
                port: config.listen_port,
                uploaded: 0,
                downloaded: 0,
                left: torrent.info.total_length,
                compact: true,
                event: Some(AnnounceEvent::Started),
                numwant: config.numwant,
                no_peer_id: None,
            };
            info!("Announcing {} to {}", torrent.info_hash_hex(), announce);

            let response = client.announce(&request).await;
            print_response(&response)?;
        }
        Command::Scrape { torrent } => {
            let torrent = load_torrent(&torrent, &config)?;
            let announce = first_announce(&torrent)?;
            let client = TrackerClient::new(config.request_timeout(), opts)?;

            let stats = client
                .scrape(announce, &torrent.info_hash)
                .await
                .with_context(|| format!("scraping {}", announce))?;
            println!("Seeders: {}", stats.complete);
            println!("Leechers: {}", stats.incomplete);
            println!("Completed: {}", stats.downloaded);
        }
    }
    Ok(())
}

fn load_torrent(path: &std::path::Path, config: &Config) -> Result<Torrent> {
    let buf = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Torrent::from_bytes(&buf, &config.decode_options())
        .with_context(|| format!("parsing {}", path.display()))
}

fn first_announce(torrent: &Torrent) -> Result<&str> {
    torrent
        .primary_announce()
        .ok_or_else(|| anyhow!("torrent {} lists no tracker", torrent.info.name))
}

fn print_info(torrent: &Torrent) {
    println!("Name: {}", torrent.info.name);
    println!("Info Hash: {}", torrent.info_hash_hex());
    println!("Total Length: {}", torrent.info.total_length);
    println!("Piece Length: {}", torrent.info.piece_length);
    println!("Number of Pieces: {}", torrent.num_pieces());

    if torrent.info.multi_file {
        println!("Files:");
        for file in &torrent.info.files {
            println!("  {} ({} bytes at offset {})", file.path, file.length, file.offset);
        }
    }

    if torrent.announce_urls.is_empty() {
        println!("Trackers: none");
    } else {
        println!("Trackers:");
        for url in &torrent.announce_urls {
            println!("  {}", url);
        }
    }
    if let Some(comment) = &torrent.comment {
        println!("Comment: {}", comment);
    }
    if let Some(created_by) = &torrent.created_by {
        println!("Created By: {}", created_by);
    }
    if let Some(date) = torrent.creation_date {
        println!("Creation Date: {}", date);
    }

    println!("Piece Hashes:");
    for hash in torrent.piece_hashes() {
        println!("{}", hex::encode(hash));
    }
}

fn print_response(response: &TrackerResponse) -> Result<()> {
    if let Some(reason) = &response.failure_reason {
        bail!("tracker failure: {}", reason);
    }
    if let Some(warning) = &response.warning_message {
        warn!("Tracker warning: {}", warning);
    }

    println!("Interval: {}", response.interval);
    if let Some(min) = response.min_interval {
        println!("Min Interval: {}", min);
    }
    if let (Some(seeders), Some(leechers)) = (response.complete, response.incomplete) {
        println!("Seeders: {} Leechers: {}", seeders, leechers);
    }
    for peer in &response.peers {
        println!("{}", peer);
    }
    Ok(())
}
