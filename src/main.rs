use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

mod config;
mod frames;
mod net;
mod sched;
mod worker;

use config::Config;
use net::probe::ProbeSocket;
use net::queue::AddrQueue;
use sched::Scheduler;

/// Pings a still or animated image onto an IPv6-addressed pixel display,
/// one echo request per lit pixel.
#[derive(Parser, Debug)]
#[command(name = "pingtree", version)]
struct Cli {
    /// Destination network of the IPv6 pixel display.
    #[arg(long = "dst-net", default_value = "2001:4c08:2028")]
    dst_net: String,

    /// The image to ping to the display.
    #[arg(long)]
    image: PathBuf,

    /// The x offset to draw the image at.
    #[arg(short = 'x', default_value_t = 0)]
    x_offset: u32,

    /// The y offset to draw the image at.
    #[arg(short = 'y', default_value_t = 0)]
    y_offset: u32,

    /// How many times to draw each frame per second.
    #[arg(long, default_value_t = 100)]
    rate: u32,

    /// The number of sender workers to use.
    #[arg(long, default_value_t = 1)]
    workers: usize,
}

fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    anyhow::ensure!(cli.rate >= 1, "rate must be at least 1");
    anyhow::ensure!(cli.workers >= 1, "worker count must be at least 1");

    let config = Config {
        dst_net: cli.dst_net,
        x_offset: cli.x_offset,
        y_offset: cli.y_offset,
        rate: cli.rate,
        workers: cli.workers,
        max_x: config::MAX_X,
        max_y: config::MAX_Y,
    };

    // One-time, single-threaded pass: decode, composite, encode addresses.
    // Everything after this point is immutable and reused on every loop.
    let decoded = frames::decode::decode_file(&cli.image)?;
    let grids = frames::compose::compose(&decoded.frames, decoded.width, decoded.height);
    let steady = Duration::from_secs(1) / config.rate;
    let durations = frames::compose::durations(&decoded.frames, steady);

    let (lists, max_len) = net::addr::build_addr_lists(&grids, &config);
    let total: usize = lists.iter().map(Vec::len).sum();
    log::info!(
        "{} frame(s), {} addrs total, queue capacity {}",
        lists.len(),
        total,
        max_len.max(1)
    );

    let cancel = CancellationToken::new();
    let queue = Arc::new(AddrQueue::with_capacity(max_len));

    // Sockets open before anything is sent so a bind failure stays fatal.
    for id in 0..config.workers {
        let socket = ProbeSocket::open().context("could not open ping socket")?;
        tokio::spawn(worker::run(id, Arc::clone(&queue), socket, cancel.clone()));
    }

    let scheduler = Scheduler::new(lists, durations, config.rate);
    tokio::spawn(scheduler.run(queue.writer.clone(), cancel.clone()));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::signal::ctrl_c() => {
                log::info!("exiting...");
                cancel.cancel();
            },
        }
    }

    Ok(())
}
