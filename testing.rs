//! Test doubles: a small framebuffer surface and a host that counts requests

use embedded_graphics::{pixelcolor::Rgb888, prelude::*};

use crate::driver::{FrameHost, FrameRequest};

pub const SIZE: usize = 32;

/// Colour of pixels nothing has drawn to yet.
pub const UNTOUCHED: Rgb888 = Rgb888::new(1, 2, 3);

#[derive(Debug, PartialEq, Eq)]
pub struct SurfaceLost;

pub struct Canvas {
    pixels: [[Rgb888; SIZE]; SIZE],
    lost: bool,
    pub draws: usize,
}

impl Canvas {
    pub fn new() -> Self {
        Self {
            pixels: [[UNTOUCHED; SIZE]; SIZE],
            lost: false,
            draws: 0,
        }
    }

    /// Every draw call fails from now on.
    pub fn lose(&mut self) {
        self.lost = true;
    }

    pub fn at(&self, x: usize, y: usize) -> Rgb888 {
        self.pixels[y][x]
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(SIZE as u32, SIZE as u32)
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = SurfaceLost;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        if self.lost {
            return Err(SurfaceLost);
        }
        self.draws += 1;
        for Pixel(point, color) in pixels {
            if (0..SIZE as i32).contains(&point.x) && (0..SIZE as i32).contains(&point.y) {
                self.pixels[point.y as usize][point.x as usize] = color;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingHost {
    pub next: u32,
    pub requested: u32,
    pub cancelled: heapless::Vec<FrameRequest, 8>,
    pub releases: u32,
}

impl FrameHost for CountingHost {
    fn request_frame(&mut self) -> FrameRequest {
        self.next += 1;
        self.requested += 1;
        FrameRequest(self.next)
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        self.cancelled.push(request).unwrap();
    }

    fn release_listeners(&mut self) {
        self.releases += 1;
    }
}
