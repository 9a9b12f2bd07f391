/// Addressable area of the display board.
pub const MAX_X: u32 = 160;
pub const MAX_Y: u32 = 120;

/// Runtime configuration shared by the address pipeline and the scheduler.
#[derive(Clone, Debug)]
pub struct Config {
    /// Destination network prefix of the display, e.g. `2001:4c08:2028`.
    pub dst_net: String,
    /// Where on the board the image's top-left corner lands.
    pub x_offset: u32,
    pub y_offset: u32,
    /// How many times to draw each frame per second.
    pub rate: u32,
    /// Number of sender workers.
    pub workers: usize,
    /// Display bounds; pixels past these are never addressed.
    pub max_x: u32,
    pub max_y: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dst_net: "2001:4c08:2028".to_string(),
            x_offset: 0,
            y_offset: 0,
            rate: 100,
            workers: 1,
            max_x: MAX_X,
            max_y: MAX_Y,
        }
    }
}
