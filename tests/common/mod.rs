#![allow(dead_code)]

use collagekit::SourceImage;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

pub const RED: [u8; 4] = [220, 40, 40, 255];
pub const GREEN: [u8; 4] = [40, 200, 80, 255];
pub const BLUE: [u8; 4] = [40, 80, 220, 255];
pub const YELLOW: [u8; 4] = [240, 210, 40, 255];

pub fn encode(img: &RgbaImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).expect("encode fixture");
    out.into_inner()
}

pub fn solid_png(w: u32, h: u32, rgba: [u8; 4]) -> SourceImage {
    SourceImage::from(encode(&RgbaImage::from_pixel(w, h, Rgba(rgba)), ImageFormat::Png))
}

/// Four fixed-size solid-color images in grid order.
pub fn four_solids() -> Vec<SourceImage> {
    [RED, GREEN, BLUE, YELLOW]
        .iter()
        .map(|c| solid_png(64, 64, *c))
        .collect()
}

/// Image whose left half is black and right half is white.
pub fn split_png(w: u32, h: u32) -> SourceImage {
    let img = RgbaImage::from_fn(w, h, |x, _| {
        if x < w / 2 {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });
    SourceImage::from(encode(&img, ImageFormat::Png))
}

pub fn near(a: (u8, u8, u8, u8), b: [u8; 4]) -> bool {
    let d = |x: u8, y: u8| (x as i16 - y as i16).abs() <= 2;
    d(a.0, b[0]) && d(a.1, b[1]) && d(a.2, b[2]) && d(a.3, b[3])
}
