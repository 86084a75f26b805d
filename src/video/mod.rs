//! # Video Module
//!
//! Pixel packing for the CPC's screen modes, and conversion between RGB
//! palettes and the firmware ink colour space.
//!
//! In Mode 0 a screen byte holds 2 pixels of 4 bits each (16 colours); in
//! Mode 1 it holds 4 pixels of 2 bits each (4 colours).  In both modes the
//! pixel bits are interleaved across the byte rather than stored adjacently,
//! an artifact of how the gate array shifts video data out, so the mapping
//! has to be reproduced bit for bit.  The layouts are documented at
//! <http://www.cpctech.org.uk/docs/graphics.html>
//!
//! Firmware ink colours are a 3 level RGB cube: each channel takes the value
//! 0, 1, or 2, and the colour number is `blue + red*3 + green*9`, giving 27
//! colours numbered 0-26.

use log::error;

/// Enumerates pixel and palette errors.  The `Display` trait will print an
/// equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("set of pixels to encode must contain 2 or 4 values")]
    PixelCount,
    #[error("pixel {index} does not contain a value between 0 and {max}")]
    PixelRange { index: usize, max: u8 },
    #[error("only screen modes 0 and 1 are supported")]
    ScreenMode,
    #[error("RGB palette must be 1-256 triples of channel values")]
    PaletteSize,
    #[error("ink palette must contain between 1 and 16 values")]
    PaletteLength,
    #[error("ink {index} of palette does not contain a value between 0 and 26")]
    InkRange { index: usize }
}

/// Encode a set of pixels into one screen byte.  The first pixel is the
/// leftmost.  The screen mode is implied by the count: 2 pixels encode for
/// Mode 0 (values 0-15), 4 pixels encode for Mode 1 (values 0-3).
pub fn encode_pixels(pixels: &[u8]) -> Result<u8,Error> {
    let max_pixel_value: u8 = match pixels.len() {
        2 => 15,
        4 => 3,
        _ => {
            error!("pixel list had {} items",pixels.len());
            return Err(Error::PixelCount);
        }
    };
    for (index,pixel) in pixels.iter().enumerate() {
        if *pixel > max_pixel_value {
            error!("pixel {} had value {}",index,pixel);
            return Err(Error::PixelRange { index, max: max_pixel_value });
        }
    }
    if pixels.len() == 2 {
        // Mode 0 bit order is L0 R0 L2 R2 L1 R1 L3 R3, where L and R are the
        // left and right pixels and the digit is the bit within the pixel
        let mut ans = (pixels[0] & 0x08) >> 2
            | (pixels[0] & 0x04) << 3
            | (pixels[0] & 0x02) << 2
            | (pixels[0] & 0x01) << 7;
        ans |= (pixels[1] & 0x08) >> 3
            | (pixels[1] & 0x04) << 2
            | (pixels[1] & 0x02) << 1
            | (pixels[1] & 0x01) << 6;
        Ok(ans)
    } else {
        // Mode 1 bit order is P0,0 P1,0 P2,0 P3,0 P0,1 P1,1 P2,1 P3,1, where
        // P0 is the leftmost pixel and the second digit is the bit
        let mut ans = (pixels[0] & 0x02) << 2
            | (pixels[0] & 0x01) << 7;
        ans |= (pixels[1] & 0x02) << 1
            | (pixels[1] & 0x01) << 6;
        ans |= (pixels[2] & 0x02)
            | (pixels[2] & 0x01) << 5;
        ans |= (pixels[3] & 0x02) >> 1
            | (pixels[3] & 0x01) << 4;
        Ok(ans)
    }
}

/// Decode one screen byte into its pixels, leftmost first.  Mode 0 yields
/// 2 values 0-15, Mode 1 yields 4 values 0-3.
pub fn decode_pixels(byte: u8,screen_mode: u8) -> Result<Vec<u8>,Error> {
    match screen_mode {
        0 => {
            let left = (byte & 0x02) << 2
                | (byte & 0x20) >> 3
                | (byte & 0x08) >> 2
                | (byte & 0x80) >> 7;
            let right = (byte & 0x01) << 3
                | (byte & 0x10) >> 2
                | (byte & 0x04) >> 1
                | (byte & 0x40) >> 6;
            Ok(vec![left,right])
        },
        1 => {
            Ok(vec![
                (byte & 0x08) >> 2 | (byte & 0x80) >> 7,
                (byte & 0x04) >> 1 | (byte & 0x40) >> 6,
                (byte & 0x02)      | (byte & 0x20) >> 5,
                (byte & 0x01) << 1 | (byte & 0x10) >> 4
            ])
        },
        _ => {
            error!("screen mode {} cannot be decoded",screen_mode);
            Err(Error::ScreenMode)
        }
    }
}

/// Quantize an RGB palette (triples of 0-255 channel values) to firmware ink
/// colours.  Each channel maps to one of 3 levels, so the conversion is lossy
/// by design.  The answer always has 256 entries, zero filled past the input,
/// so it can serve directly as a nearest-colour lookup table for indexed
/// image data.
pub fn rgb_palette_to_ink_palette(palette: &[u8]) -> Result<Vec<u8>,Error> {
    if palette.len() % 3 != 0 || palette.len() > 768 {
        error!("RGB palette had {} values",palette.len());
        return Err(Error::PaletteSize);
    }
    let quantize = |channel: u8| -> u8 {
        match channel {
            0..=85 => 0,
            86..=170 => 1,
            _ => 2
        }
    };
    let mut ans = vec![0;256];
    for index in 0..palette.len()/3 {
        let red = quantize(palette[index*3]);
        let green = quantize(palette[index*3 + 1]);
        let blue = quantize(palette[index*3 + 2]);
        ans[index] = blue + red*3 + green*9;
    }
    Ok(ans)
}

/// Expand firmware ink colours (1-16 values, each 0-26) to an RGB palette.
/// Each level 0/1/2 digit becomes channel value 0/128/255; the answer is 3
/// bytes per input colour in red, green, blue order.
pub fn ink_palette_to_rgb_palette(palette: &[u8]) -> Result<Vec<u8>,Error> {
    if palette.len() < 1 || palette.len() > 16 {
        error!("ink palette had {} values",palette.len());
        return Err(Error::PaletteLength);
    }
    for (index,ink) in palette.iter().enumerate() {
        if *ink > 26 {
            error!("ink {} of palette had value {}",index,ink);
            return Err(Error::InkRange { index });
        }
    }
    let expand = |level: u8| -> u8 {
        match level {
            0 => 0,
            1 => 128,
            _ => 255
        }
    };
    let mut ans = Vec::new();
    for &ink in palette {
        let green = ink / 9;
        let red = (ink - green*9) / 3;
        let blue = ink - green*9 - red*3;
        ans.push(expand(red));
        ans.push(expand(green));
        ans.push(expand(blue));
    }
    Ok(ans)
}
