//! Demo sender: serves synthetic media frames to one receiver.
//!
//! Run the sender first:
//! - cargo run -p framewire --example sender -- 0.0.0.0:7000
//!
//! Then run the receiver:
//! - cargo run -p framewire --example receiver -- 127.0.0.1:7000

use std::{
    env,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use framewire::{Config, FrameType, VideoTx};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let bind_addr = env::args().nth(1).unwrap_or_else(|| "0.0.0.0:7000".to_string());
    let frame_count: u64 =
        env::args().nth(2).and_then(|arg| arg.parse().ok()).unwrap_or(300);

    let tx = VideoTx::bind(bind_addr.as_str(), Config::default())?;
    println!("framewire sender {} listening on {}", framewire::version(), bind_addr);

    let streaming = Arc::new(AtomicBool::new(false));
    let streaming_flag = Arc::clone(&streaming);
    tx.on_media_control(Box::new(move |frame_type, url| match frame_type {
        FrameType::Start => {
            println!("[start] source={}", url.unwrap_or("<default>"));
            streaming_flag.store(true, Ordering::Relaxed);
        }
        FrameType::Stop => {
            println!("[stop]");
            streaming_flag.store(false, Ordering::Relaxed);
        }
        _ => {}
    }));
    tx.on_data(Box::new(|frame_type, payload| {
        println!("[data] {:?} {} bytes", frame_type, payload.len());
    }));

    println!("waiting for a receiver...");
    tx.accept(Duration::from_secs(60))?;
    println!("receiver connected");

    // Synthetic 30 fps stream: a keyframe every 30 frames.
    let mut sent = 0u64;
    while sent < frame_count {
        tx.poll(Duration::from_millis(1))?;
        if !tx.is_connected() {
            println!("receiver went away");
            break;
        }
        if !streaming.load(Ordering::Relaxed) {
            continue;
        }

        let mut frame = tx.alloc_media_frame();
        let keyframe = sent % 30 == 0;
        let size = if keyframe { 48_000 } else { 8_000 };
        let fill = (sent % 251) as u8;
        frame.buffer_mut()[..size].fill(fill);
        frame.set_len(size)?;
        frame.frame_type = if keyframe { FrameType::I } else { FrameType::P };

        tx.send_media(frame)?;
        sent += 1;
        std::thread::sleep(Duration::from_millis(33));
    }

    let stats = tx.stats();
    println!(
        "done: {} frames ({} I / {} P), {} packets, {} retransmitted ({:.2}%)",
        stats.total_frames,
        stats.total_i_frames,
        stats.total_p_frames,
        stats.total_packets,
        stats.retrans_packets,
        stats.retrans_rate() * 100.0
    );
    tx.close()?;
    Ok(())
}
