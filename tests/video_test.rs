// test of the video module
use cpckit::video;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn mode_0_round_trip() {
    init_logging();
    assert_eq!(video::encode_pixels(&[0,0]).expect("encode failed"),0x00);
    assert_eq!(video::encode_pixels(&[15,15]).expect("encode failed"),0xff);
    for left in 0..16 {
        for right in 0..16 {
            let byte = video::encode_pixels(&[left,right]).expect("encode failed");
            assert_eq!(video::decode_pixels(byte,0).expect("decode failed"),vec![left,right]);
        }
    }
    // every byte value decodes to pixels that encode back to itself
    for byte in 0..=255u8 {
        let pixels = video::decode_pixels(byte,0).expect("decode failed");
        assert_eq!(pixels.len(),2);
        assert_eq!(video::encode_pixels(&pixels).expect("encode failed"),byte);
    }
}

#[test]
fn mode_1_round_trip() {
    init_logging();
    assert_eq!(video::encode_pixels(&[0,0,0,0]).expect("encode failed"),0x00);
    assert_eq!(video::encode_pixels(&[3,3,3,3]).expect("encode failed"),0xff);
    for value in 0..=255u8 {
        let pixels = [value & 3,(value >> 2) & 3,(value >> 4) & 3,(value >> 6) & 3];
        let byte = video::encode_pixels(&pixels).expect("encode failed");
        assert_eq!(video::decode_pixels(byte,1).expect("decode failed"),pixels.to_vec());
    }
}

#[test]
fn known_bit_layouts() {
    init_logging();
    // Mode 0: the left pixel's bit 0 is the byte's top bit
    assert_eq!(video::encode_pixels(&[1,0]).expect("encode failed"),0x80);
    assert_eq!(video::encode_pixels(&[0,1]).expect("encode failed"),0x40);
    assert_eq!(video::encode_pixels(&[8,0]).expect("encode failed"),0x02);
    // Mode 1: the leftmost pixel's bit 0 is the byte's top bit
    assert_eq!(video::encode_pixels(&[1,0,0,0]).expect("encode failed"),0x80);
    assert_eq!(video::encode_pixels(&[2,0,0,0]).expect("encode failed"),0x08);
    assert_eq!(video::encode_pixels(&[0,0,0,1]).expect("encode failed"),0x10);
    assert_eq!(video::encode_pixels(&[0,0,0,2]).expect("encode failed"),0x01);
}

#[test]
fn pixel_input_errors() {
    init_logging();
    match video::encode_pixels(&[0,0,0]) {
        Err(video::Error::PixelCount) => {},
        _ => panic!("expected the pixel count error kind")
    }
    match video::encode_pixels(&[]) {
        Err(video::Error::PixelCount) => {},
        _ => panic!("expected the pixel count error kind")
    }
    match video::encode_pixels(&[16,0]) {
        Err(video::Error::PixelRange { index, max }) => {
            assert_eq!(index,0);
            assert_eq!(max,15);
        },
        _ => panic!("expected the pixel range error kind")
    }
    match video::encode_pixels(&[0,1,2,4]) {
        Err(video::Error::PixelRange { index, max }) => {
            assert_eq!(index,3);
            assert_eq!(max,3);
        },
        _ => panic!("expected the pixel range error kind")
    }
    match video::decode_pixels(0,2) {
        Err(video::Error::ScreenMode) => {},
        _ => panic!("expected the screen mode error kind")
    }
}

#[test]
fn rgb_palette_quantization() {
    init_logging();
    let inks = video::rgb_palette_to_ink_palette(&[0,0,0,255,255,255]).expect("conversion failed");
    assert_eq!(inks.len(),256);
    assert_eq!(inks[0],0);
    assert_eq!(inks[1],26);
    assert_eq!(&inks[2..],&vec![0;254][..]);
    // channel weights: blue + red*3 + green*9
    assert_eq!(video::rgb_palette_to_ink_palette(&[255,0,0]).expect("conversion failed")[0],6);
    assert_eq!(video::rgb_palette_to_ink_palette(&[0,255,0]).expect("conversion failed")[0],18);
    assert_eq!(video::rgb_palette_to_ink_palette(&[0,0,255]).expect("conversion failed")[0],2);
    // level thresholds sit at 85 and 170
    assert_eq!(video::rgb_palette_to_ink_palette(&[85,0,0]).expect("conversion failed")[0],0);
    assert_eq!(video::rgb_palette_to_ink_palette(&[86,0,0]).expect("conversion failed")[0],3);
    assert_eq!(video::rgb_palette_to_ink_palette(&[170,0,0]).expect("conversion failed")[0],3);
    assert_eq!(video::rgb_palette_to_ink_palette(&[171,0,0]).expect("conversion failed")[0],6);
    match video::rgb_palette_to_ink_palette(&[0,0]) {
        Err(video::Error::PaletteSize) => {},
        _ => panic!("expected the palette size error kind")
    }
    match video::rgb_palette_to_ink_palette(&vec![0;771]) {
        Err(video::Error::PaletteSize) => {},
        _ => panic!("expected the palette size error kind")
    }
}

#[test]
fn ink_palette_expansion() {
    init_logging();
    assert_eq!(video::ink_palette_to_rgb_palette(&[0]).expect("conversion failed"),vec![0,0,0]);
    assert_eq!(video::ink_palette_to_rgb_palette(&[26]).expect("conversion failed"),vec![255,255,255]);
    // 13 is the middle of the cube
    assert_eq!(video::ink_palette_to_rgb_palette(&[13]).expect("conversion failed"),vec![128,128,128]);
    let rgb = video::ink_palette_to_rgb_palette(&[10,15,25,0]).expect("conversion failed");
    assert_eq!(rgb.len(),12);
    // ink 10: green 1, red 0, blue 1
    assert_eq!(&rgb[0..3],&[0,128,128]);
    match video::ink_palette_to_rgb_palette(&[]) {
        Err(video::Error::PaletteLength) => {},
        _ => panic!("expected the palette length error kind")
    }
    match video::ink_palette_to_rgb_palette(&[0;17]) {
        Err(video::Error::PaletteLength) => {},
        _ => panic!("expected the palette length error kind")
    }
    match video::ink_palette_to_rgb_palette(&[0,27]) {
        Err(video::Error::InkRange { index }) => assert_eq!(index,1),
        _ => panic!("expected the ink range error kind")
    }
}

#[test]
fn palette_conversions_invert() {
    init_logging();
    // the RGB expansion of any ink quantizes back to the same ink
    for ink in 0..27 {
        let rgb = video::ink_palette_to_rgb_palette(&[ink]).expect("conversion failed");
        let back = video::rgb_palette_to_ink_palette(&rgb).expect("conversion failed");
        assert_eq!(back[0],ink);
    }
}
