use serde::{Deserialize, Serialize};

use crate::CoreError;

fn check_len(width: usize, height: usize, channels: usize, got: usize) -> Result<(), CoreError> {
    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .ok_or(CoreError::InvalidDimensions { width, height })?;
    if got != expected {
        return Err(CoreError::InvalidBuffer { expected, got });
    }
    Ok(())
}

/// Borrowed single-channel 8-bit image. Also used for binary masks
/// (non-zero = foreground).
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

impl<'a> GrayImageView<'a> {
    /// Wrap a row-major buffer, checking its length.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Result<Self, CoreError> {
        check_len(width, height, 1, data.len())?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// `true` when the buffer length matches the declared dimensions.
    pub fn is_well_formed(&self) -> bool {
        check_len(self.width, self.height, 1, self.data.len()).is_ok()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

/// Interleaved channel order of a three-channel buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// Borrowed interleaved 8-bit three-channel image.
#[derive(Clone, Copy, Debug)]
pub struct RgbImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub order: ChannelOrder,
    pub data: &'a [u8], // row-major, len = w*h*3
}

impl<'a> RgbImageView<'a> {
    pub fn new(
        width: usize,
        height: usize,
        order: ChannelOrder,
        data: &'a [u8],
    ) -> Result<Self, CoreError> {
        check_len(width, height, 3, data.len())?;
        Ok(Self {
            width,
            height,
            order,
            data,
        })
    }

    pub fn is_well_formed(&self) -> bool {
        check_len(self.width, self.height, 3, self.data.len()).is_ok()
    }

    /// Pixel at `(x, y)` in canonical R, G, B order.
    #[inline]
    pub fn rgb(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        let px = [self.data[i], self.data[i + 1], self.data[i + 2]];
        match self.order {
            ChannelOrder::Rgb => px,
            ChannelOrder::Bgr => [px[2], px[1], px[0]],
        }
    }
}
