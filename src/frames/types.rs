use std::time::Duration;

/// RGBA pixel, straight (non-premultiplied) alpha.
pub type Rgba8 = [u8; 4];

pub const TRANSPARENT: Rgba8 = [0, 0, 0, 0];
pub const BLACK: Rgba8 = [0, 0, 0, 255];

/// How the shared canvas is rolled back after a sub-image has been shown,
/// before the next sub-image is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposal {
    /// Canvas keeps the just-drawn sub-image.
    None,
    /// The region the sub-image occupied is reset to its background color.
    Background,
    /// The region the sub-image occupied is reset to its pre-draw content.
    Previous,
}

/// One raw animation sub-image: RGBA pixel data plus the placement and
/// disposal metadata the compositor needs. A still image is modeled as a
/// single full-canvas `RawFrame` with no delay.
#[derive(Clone, Debug)]
pub struct RawFrame {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA, `width * height * 4` bytes. Transparent pixels have
    /// alpha 0.
    pub rgba: Vec<u8>,
    pub disposal: Disposal,
    /// None when the source declared no delay for this sub-image.
    pub delay: Option<Duration>,
    /// Fill color for `Disposal::Background`.
    pub background: Rgba8,
}

impl RawFrame {
    pub fn pixel(&self, x: u32, y: u32) -> Rgba8 {
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ]
    }
}

/// Rectangular RGBA8 pixel buffer, row-major. Used both for the mutable
/// compositing canvas and for the immutable frame snapshots handed to the
/// address pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelGrid {
    /// A fully transparent grid.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height * 4) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Rgba8 {
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    pub fn put(&mut self, x: u32, y: u32, px: Rgba8) {
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&px);
    }

    /// Alpha-blends `src` onto the pixel at (x, y).
    pub fn composite_over(&mut self, x: u32, y: u32, src: Rgba8) {
        let dst = self.get(x, y);
        self.put(x, y, over(dst, src));
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        ((y * self.width + x) * 4) as usize
    }
}

/// Standard source-over blend in straight alpha. GIF pixels are either fully
/// opaque or fully transparent, so the two early returns cover the hot path.
pub fn over(dst: Rgba8, src: Rgba8) -> Rgba8 {
    let sa = u32::from(src[3]);
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }

    let da = mul_div255(u32::from(dst[3]), 255 - sa);
    let oa = sa + da;
    if oa == 0 {
        return TRANSPARENT;
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        out[i] = ((u32::from(src[i]) * sa + u32::from(dst[i]) * da + oa / 2) / oa) as u8;
    }
    out[3] = oa as u8;
    out
}

/// Whether a physical board pixel is currently lit: drawn at all and not
/// pure black.
pub fn is_lit(px: Rgba8) -> bool {
    px[3] != 0 && (px[0] != 0 || px[1] != 0 || px[2] != 0)
}

fn mul_div255(x: u32, y: u32) -> u32 {
    (x * y + 127) / 255
}
