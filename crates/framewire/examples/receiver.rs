//! Demo receiver: connects to a sender, requests media, prints frames.
//!
//! - cargo run -p framewire --example receiver -- 127.0.0.1:7000
//! - cargo run -p framewire --example receiver -- 127.0.0.1:7000 10
//!   (receive for 10 seconds)

use std::{
    env,
    time::{Duration, Instant},
};

use framewire::{Config, VideoRx};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let server = env::args().nth(1).unwrap_or_else(|| "127.0.0.1:7000".to_string());
    let seconds: u64 = env::args().nth(2).and_then(|arg| arg.parse().ok()).unwrap_or(10);

    let rx = VideoRx::new(
        server.as_str(),
        Config::default(),
        Box::new(|payload, frame_type| {
            println!("[frame] {:?} {} bytes", frame_type, payload.len());
        }),
    )?;
    rx.on_connect(Box::new(|connected| {
        println!("[connection] {}", if connected { "up" } else { "down" });
    }));

    println!("framewire receiver {} -> {}", framewire::version(), server);
    rx.connect()?;
    rx.wait_connected(Duration::from_secs(5))?;

    rx.start(None)?;
    rx.send(b"hello from receiver")?;

    let deadline = Instant::now() + Duration::from_secs(seconds);
    while Instant::now() < deadline && rx.is_connected() {
        rx.poll(Duration::from_millis(5))?;
    }

    rx.stop()?;
    let stats = rx.stats();
    println!(
        "done: {} frames ({} I / {} P), {} lost, {} dup, {} incomplete, loss {:.2}%",
        stats.total_frames,
        stats.total_i_frames,
        stats.total_p_frames,
        stats.lost_packets,
        stats.dup_packets,
        stats.incomplete_frames,
        stats.loss_rate() * 100.0
    );
    rx.close()?;
    Ok(())
}
