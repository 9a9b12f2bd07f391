use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::frames::types::{Disposal, RawFrame, Rgba8, TRANSPARENT};

/// Typed output of the decoding step: logical canvas bounds plus the raw
/// sub-image sequence the compositor consumes. A still image decodes to a
/// single full-canvas sub-image.
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub frames: Vec<RawFrame>,
    pub animated: bool,
}

/// Decodes the image at `path`. GIFs go through the raw frame decoder so
/// disposal and delay metadata stay visible; everything else goes through
/// the generic still-image codecs.
pub fn decode_file(path: &Path) -> Result<DecodedImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    match image::guess_format(&bytes) {
        Ok(image::ImageFormat::Gif) => decode_gif(&bytes),
        _ => decode_still(&bytes),
    }
}

fn decode_still(bytes: &[u8]) -> Result<DecodedImage> {
    let img = image::load_from_memory(bytes).context("decode image")?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width,
        height,
        frames: vec![RawFrame {
            left: 0,
            top: 0,
            width,
            height,
            rgba: rgba.into_raw(),
            disposal: Disposal::None,
            delay: None,
            background: TRANSPARENT,
        }],
        animated: false,
    })
}

fn decode_gif(bytes: &[u8]) -> Result<DecodedImage> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options
        .read_info(std::io::Cursor::new(bytes))
        .context("decode gif header")?;

    let width = u32::from(decoder.width());
    let height = u32::from(decoder.height());
    let bg_index = decoder.bg_color();
    let global_palette = decoder.global_palette().map(<[u8]>::to_vec);

    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame().context("decode gif frame")? {
        let background = background_color(
            frame.palette.as_deref(),
            global_palette.as_deref(),
            bg_index,
        );
        frames.push(RawFrame {
            left: u32::from(frame.left),
            top: u32::from(frame.top),
            width: u32::from(frame.width),
            height: u32::from(frame.height),
            rgba: frame.buffer.to_vec(),
            disposal: match frame.dispose {
                gif::DisposalMethod::Background => Disposal::Background,
                gif::DisposalMethod::Previous => Disposal::Previous,
                gif::DisposalMethod::Any | gif::DisposalMethod::Keep => Disposal::None,
            },
            // GIF delays are hundredths of a second; zero means "no delay
            // declared" and gets the steady-state fallback later
            delay: (frame.delay > 0).then(|| Duration::from_millis(u64::from(frame.delay) * 10)),
            background,
        });
    }

    anyhow::ensure!(!frames.is_empty(), "gif contains no frames");
    Ok(DecodedImage {
        width,
        height,
        frames,
        animated: true,
    })
}

/// Looks up the declared background color index, preferring the frame's
/// local palette over the global one. Missing palette or out-of-range index
/// degrades to transparent black.
fn background_color(local: Option<&[u8]>, global: Option<&[u8]>, index: Option<usize>) -> Rgba8 {
    let Some(index) = index else {
        return TRANSPARENT;
    };
    let Some(palette) = local.or(global) else {
        return TRANSPARENT;
    };
    match palette.get(index * 3..index * 3 + 3) {
        Some(rgb) => [rgb[0], rgb[1], rgb[2], 255],
        None => TRANSPARENT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PALETTE: &[u8] = &[
        0xff, 0x00, 0x00, // 0: red
        0x00, 0xff, 0x00, // 1: green
        0x00, 0x00, 0xff, // 2: blue
    ];

    fn encode_gif(frames: Vec<gif::Frame<'_>>, width: u16, height: u16) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut encoder = gif::Encoder::new(&mut buf, width, height, PALETTE).unwrap();
            for frame in &frames {
                encoder.write_frame(frame).unwrap();
            }
        }
        buf
    }

    #[test]
    fn test_decode_gif_keeps_disposal_and_delay() {
        let mut first =
            gif::Frame::from_palette_pixels(2, 2, &[0u8, 1, 1, 0], PALETTE, Some(1));
        first.delay = 5; // 50ms
        first.dispose = gif::DisposalMethod::Background;

        let mut second = gif::Frame::from_palette_pixels(1, 1, &[2u8], PALETTE, None);
        second.left = 1;
        second.top = 1;
        second.dispose = gif::DisposalMethod::Previous;

        let bytes = encode_gif(vec![first, second], 2, 2);
        let decoded = decode_gif(&bytes).unwrap();

        assert!(decoded.animated);
        assert_eq!((decoded.width, decoded.height), (2, 2));
        assert_eq!(decoded.frames.len(), 2);

        let f0 = &decoded.frames[0];
        assert_eq!((f0.left, f0.top, f0.width, f0.height), (0, 0, 2, 2));
        assert_eq!(f0.disposal, Disposal::Background);
        assert_eq!(f0.delay, Some(Duration::from_millis(50)));
        assert_eq!(f0.pixel(0, 0), [0xff, 0, 0, 0xff]);
        // index 1 is the transparent index of the first frame
        assert_eq!(f0.pixel(1, 0)[3], 0);

        let f1 = &decoded.frames[1];
        assert_eq!((f1.left, f1.top, f1.width, f1.height), (1, 1, 1, 1));
        assert_eq!(f1.disposal, Disposal::Previous);
        assert_eq!(f1.delay, None);
        assert_eq!(f1.pixel(0, 0), [0, 0, 0xff, 0xff]);
    }

    #[test]
    fn test_decode_still_png() {
        let mut img = image::RgbaImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgba([0xff, 0, 0, 0xff]));
        img.put_pixel(1, 0, image::Rgba([0, 0, 0, 0]));

        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();

        let decoded = decode_still(bytes.get_ref()).unwrap();
        assert!(!decoded.animated);
        assert_eq!((decoded.width, decoded.height), (2, 1));
        assert_eq!(decoded.frames.len(), 1);
        assert_eq!(decoded.frames[0].delay, None);
        assert_eq!(decoded.frames[0].pixel(0, 0), [0xff, 0, 0, 0xff]);
        assert_eq!(decoded.frames[0].pixel(1, 0)[3], 0);
    }

    #[test]
    fn test_decode_garbage_is_an_error() {
        assert!(decode_still(b"not an image").is_err());
        assert!(decode_gif(b"not a gif").is_err());
    }

    #[test]
    fn test_background_color_lookup() {
        assert_eq!(background_color(None, Some(PALETTE), Some(2)), [0, 0, 0xff, 0xff]);
        // local palette wins
        assert_eq!(
            background_color(Some(&[1, 2, 3]), Some(PALETTE), Some(0)),
            [1, 2, 3, 0xff]
        );
        assert_eq!(background_color(None, Some(PALETTE), Some(9)), TRANSPARENT);
        assert_eq!(background_color(None, None, Some(0)), TRANSPARENT);
        assert_eq!(background_color(None, Some(PALETTE), None), TRANSPARENT);
    }
}
