use std::net::Ipv6Addr;

use crate::config::Config;
use crate::frames::types::PixelGrid;

/// Builds the probe target for one lit pixel. The display decodes addresses
/// of the form `prefix:x:y:rr:gg:bb` where x/y are decimal digit groups and
/// the colors are the top byte of each channel in hex.
///
/// Returns `None` for undrawn pixels (alpha 0) and for any combination the
/// address parser rejects; a bad pixel is skipped, never fatal.
pub fn encode(prefix: &str, x: u32, y: u32, r: u8, g: u8, b: u8, a: u8) -> Option<Ipv6Addr> {
    if a == 0 {
        return None;
    }
    format!("{prefix}:{x}:{y}:{r:x}:{g:x}:{b:x}").parse().ok()
}

/// Scans one composited frame in row-major order and encodes every drawn
/// pixel that still falls on the board after the configured offset.
pub fn frame_addrs(frame: &PixelGrid, config: &Config) -> Vec<Ipv6Addr> {
    let mut addrs = Vec::new();
    for y in 0..frame.height() {
        let dy = y + config.y_offset;
        if dy >= config.max_y {
            break;
        }
        for x in 0..frame.width() {
            let dx = x + config.x_offset;
            if dx >= config.max_x {
                break;
            }
            let [r, g, b, a] = frame.get(x, y);
            if let Some(addr) = encode(&config.dst_net, dx, dy, r, g, b, a) {
                addrs.push(addr);
            }
        }
    }
    addrs
}

/// One address list per frame, plus the longest list length. The queue is
/// sized to the maximum so a full frame burst fits without blocking.
pub fn build_addr_lists(frames: &[PixelGrid], config: &Config) -> (Vec<Vec<Ipv6Addr>>, usize) {
    let lists: Vec<Vec<Ipv6Addr>> = frames.iter().map(|f| frame_addrs(f, config)).collect();
    let max_len = lists.iter().map(Vec::len).max().unwrap_or(0);
    (lists, max_len)
}
