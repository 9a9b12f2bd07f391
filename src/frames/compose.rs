use std::time::Duration;

use crate::frames::types::{is_lit, Disposal, PixelGrid, RawFrame, Rgba8, BLACK};

/// Turns a raw sub-image sequence into fully-resolved display frames.
///
/// The canvas accumulates sub-image composites across the whole animation
/// (a GIF sub-image may only cover part of the logical bounds); each output
/// frame is a point-in-time snapshot of the canvas with every pixel the
/// previous frame lit forced to opaque black first, so that a board which
/// stays lit until told otherwise ends up showing exactly this frame.
pub fn compose(raws: &[RawFrame], width: u32, height: u32) -> Vec<PixelGrid> {
    let mut canvas = PixelGrid::new(width, height);
    let mut frames: Vec<PixelGrid> = Vec::with_capacity(raws.len());

    for raw in raws {
        let frame = draw_frame(&mut canvas, frames.last(), raw);
        frames.push(frame);
    }

    // Loop seam: rebuild frame 0 against the final frame so that wrapping
    // from the last frame back to the first blanks pixels only the last
    // frame lit.
    if frames.len() > 1 {
        let mut canvas = PixelGrid::new(width, height);
        let last = frames[frames.len() - 1].clone();
        frames[0] = draw_frame(&mut canvas, Some(&last), &raws[0]);
    }

    frames
}

/// Per-frame display durations. Sub-images without a usable delay (stills,
/// or GIFs with a zero delay) fall back to `fallback`, normally the
/// reciprocal of the configured refresh rate.
pub fn durations(raws: &[RawFrame], fallback: Duration) -> Vec<Duration> {
    raws.iter()
        .map(|r| r.delay.filter(|d| !d.is_zero()).unwrap_or(fallback))
        .collect()
}

/// Draws one sub-image: blackout of previously lit pixels, composite onto
/// the canvas, snapshot, then disposal rollback of the touched sub-region.
fn draw_frame(canvas: &mut PixelGrid, prev: Option<&PixelGrid>, raw: &RawFrame) -> PixelGrid {
    let mut frame = PixelGrid::new(canvas.width(), canvas.height());

    if let Some(prev) = prev {
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                if is_lit(prev.get(x, y)) {
                    frame.put(x, y, BLACK);
                }
            }
        }
    }

    let region = Region::clamp(raw, canvas.width(), canvas.height());

    match raw.disposal {
        Disposal::Previous => {
            let saved = copy_region(canvas, region);
            blit_over(canvas, raw, region);
            overlay(&mut frame, canvas);
            restore_region(canvas, region, &saved);
        }
        Disposal::Background => {
            blit_over(canvas, raw, region);
            overlay(&mut frame, canvas);
            fill_region(canvas, region, raw.background);
        }
        Disposal::None => {
            blit_over(canvas, raw, region);
            overlay(&mut frame, canvas);
        }
    }

    frame
}

/// Sub-image placement clamped to the canvas. Half-open on the right/bottom.
#[derive(Clone, Copy, Debug)]
struct Region {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl Region {
    fn clamp(raw: &RawFrame, width: u32, height: u32) -> Self {
        let x0 = raw.left.min(width);
        let y0 = raw.top.min(height);
        Self {
            x0,
            y0,
            x1: raw.left.saturating_add(raw.width).min(width),
            y1: raw.top.saturating_add(raw.height).min(height),
        }
    }
}

fn blit_over(canvas: &mut PixelGrid, raw: &RawFrame, region: Region) {
    for y in region.y0..region.y1 {
        for x in region.x0..region.x1 {
            canvas.composite_over(x, y, raw.pixel(x - raw.left, y - raw.top));
        }
    }
}

fn overlay(frame: &mut PixelGrid, canvas: &PixelGrid) {
    for y in 0..frame.height() {
        for x in 0..frame.width() {
            frame.composite_over(x, y, canvas.get(x, y));
        }
    }
}

fn copy_region(canvas: &PixelGrid, region: Region) -> Vec<Rgba8> {
    let mut saved = Vec::new();
    for y in region.y0..region.y1 {
        for x in region.x0..region.x1 {
            saved.push(canvas.get(x, y));
        }
    }
    saved
}

fn restore_region(canvas: &mut PixelGrid, region: Region, saved: &[Rgba8]) {
    let mut it = saved.iter();
    for y in region.y0..region.y1 {
        for x in region.x0..region.x1 {
            if let Some(&px) = it.next() {
                canvas.put(x, y, px);
            }
        }
    }
}

fn fill_region(canvas: &mut PixelGrid, region: Region, color: Rgba8) {
    for y in region.y0..region.y1 {
        for x in region.x0..region.x1 {
            canvas.put(x, y, color);
        }
    }
}

#[cfg(test)]
#[path = "compose_test.rs"]
mod compose_test;
