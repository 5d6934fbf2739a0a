//! Bridge Viewer Example
//!
//! Asks an SRT bridge to pull a stream and plays it back over WebRTC:
//! - Video/audio: attached to the stats surface (packet counters)
//! - Metadata: printed as it arrives, duplicates suppressed
//!
//! Usage:
//!   cargo run --release --example bridge_viewer -- <signaling_url> <srt_host> <srt_port> <stream_id> [--video-only] [--trickle-log] [--vanilla-ice]
//!
//! Examples:
//!   # Local bridge, all tracks
//!   cargo run --release --example bridge_viewer -- http://127.0.0.1:8080 srt.example.net 40052 live001
//!
//!   # Video only, log every local ICE candidate
//!   cargo run --release --example bridge_viewer -- http://127.0.0.1:8080 srt.example.net 40052 live001 --video-only --trickle-log

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bridge_receiver::{
    BridgeRequest, EventLog, MetadataFeed, NegotiationSession, RemoteDescriptionClient, SessionConfig,
    SessionPhase, StatsSurface, TrackFilter, google_stun_servers,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();
    let positional: Vec<&String> = args.iter().skip(1).filter(|a| !a.starts_with("--")).collect();

    if positional.len() < 4 {
        eprintln!(
            "Usage: {} <signaling_url> <srt_host> <srt_port> <stream_id> [--video-only] [--trickle-log] [--vanilla-ice]",
            args[0]
        );
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  {} http://127.0.0.1:8080 srt.example.net 40052 live001", args[0]);
        eprintln!("  {} http://127.0.0.1:8080 srt.example.net 40052 live001 --video-only", args[0]);
        std::process::exit(1);
    }

    let signaling_url = positional[0];
    let request = BridgeRequest::new(positional[1].as_str(), positional[2].as_str(), positional[3].as_str());
    let flag = |name: &str| args.iter().any(|a| a == name);

    let mut config = SessionConfig::from_env()
        .with_signaling_url(signaling_url)
        .with_ice_servers(google_stun_servers());
    if flag("--video-only") {
        config = config.with_track_filter(TrackFilter::VideoOnly);
    }
    if flag("--trickle-log") {
        config = config.with_trickle_ice_logging(true);
    }
    if flag("--vanilla-ice") {
        config = config.with_gather_before_exchange(Some(Duration::from_secs(5)));
    }

    println!("========================================");
    println!("  SRT Bridge Viewer");
    println!("========================================");
    println!();
    println!("Signaling:     {}{}", config.signaling_url, config.signaling_path);
    println!("SRT source:    {}:{} ({})", request.host, request.port, request.stream_id);
    println!("Track filter:  {:?}", config.track_filter);
    println!("Trickle log:   {}", config.trickle_ice_logging);
    println!();

    let log = EventLog::new();
    let surface = StatsSurface::new();
    let feed = MetadataFeed::new();

    let client = RemoteDescriptionClient::new(&config, log.clone())?.with_failure_notifier(Arc::new(|notice: &str| {
        println!("[ALERT] {}", notice);
    }));

    let mut session = NegotiationSession::open(config, log.clone())
        .await?
        .with_surface(surface.clone())
        .with_metadata_sink(feed.clone());

    println!("Negotiating with bridge...");
    let phase = session.start(&request, &client).await;
    let mut printed = print_new_entries(&log, 0);

    if phase != SessionPhase::Established {
        println!("[FAIL] Session {}", phase);
        session.close().await?;
        std::process::exit(2);
    }
    println!("[OK] Session established");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || {
        println!("\nReceived Ctrl+C, shutting down...");
        running_clone.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    println!("Receiving media... Press Ctrl+C to stop.");
    println!();

    let mut metadata_shown = 0;
    while running.load(Ordering::SeqCst) {
        session.pump_for(Duration::from_secs(1)).await;
        printed = print_new_entries(&log, printed);

        let lines = feed.lines();
        for line in lines.iter().take(lines.len() - metadata_shown).rev() {
            println!("  meta | {}", line);
        }
        metadata_shown = lines.len();

        let stats = &surface.stats;
        println!(
            "Video: {} packets ({} bytes) | Audio: {} packets ({} bytes) | Read errors: {}",
            stats.video_packets_received.load(Ordering::Relaxed),
            stats.video_bytes_received.load(Ordering::Relaxed),
            stats.audio_packets_received.load(Ordering::Relaxed),
            stats.audio_bytes_received.load(Ordering::Relaxed),
            stats.read_errors.load(Ordering::Relaxed),
        );
    }

    println!();
    println!("Disconnecting...");
    session.close().await?;
    print_new_entries(&log, printed);
    println!("[OK] Disconnected");

    Ok(())
}

/// Print entries added since the last call, oldest first
fn print_new_entries(log: &EventLog, already_printed: usize) -> usize {
    let entries = log.entries();
    let fresh = entries.len().saturating_sub(already_printed);
    for entry in entries.iter().take(fresh).rev() {
        println!("  {}", entry);
    }
    entries.len()
}
