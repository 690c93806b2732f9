use colorcard_core::{PixelRect, Quad};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{GridError, GridParams};

/// One cell of the grid and the central rectangle sampled inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub cell: PixelRect,
    pub center: PixelRect,
    /// `true` when the area-ratio center collapsed and the quarter-inset
    /// box was used instead.
    pub quarter_inset: bool,
}

/// Cell geometry of one card, row-major.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub rows: usize,
    pub cols: usize,
    /// Cropped working rectangle that the cells tile.
    pub bounds: PixelRect,
    pub cells: Vec<GridCell>,
}

impl GridLayout {
    /// Lay out the grid for `quad` inside a `width × height` image.
    pub fn compute(
        params: &GridParams,
        quad: &Quad,
        width: usize,
        height: usize,
    ) -> Result<Self, GridError> {
        let visible = quad.bounding_rect().clamped(width, height);
        let bounds = crop_bounds(&visible, params.crop_long, params.crop_short);
        let (rows, cols) = (params.rows, params.cols);
        if bounds.width() < cols as i32 || bounds.height() < rows as i32 {
            return Err(GridError::CellTooSmall {
                bounds,
                rows,
                cols,
            });
        }

        let side = params.center_side_ratio();
        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            let y0 = split(bounds.y0, bounds.height(), row, rows);
            let y1 = split(bounds.y0, bounds.height(), row + 1, rows);
            for col in 0..cols {
                let x0 = split(bounds.x0, bounds.width(), col, cols);
                let x1 = split(bounds.x0, bounds.width(), col + 1, cols);
                let cell = PixelRect::new(x0, y0, x1, y1);
                let (center, quarter_inset) = center_rect(&cell, side);
                if quarter_inset {
                    debug!("cell ({row}, {col}) center collapsed, using quarter inset");
                }
                cells.push(GridCell {
                    row,
                    col,
                    cell,
                    center,
                    quarter_inset,
                });
            }
        }

        Ok(Self {
            rows,
            cols,
            bounds,
            cells,
        })
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&GridCell> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col)
    }
}

/// `i`-th of `n` boundaries over a span of `len` pixels starting at `start`.
#[inline]
fn split(start: i32, len: i32, i: usize, n: usize) -> i32 {
    start + (len as i64 * i as i64 / n as i64) as i32
}

/// `r` trimmed by `crop_long` of its long side and `crop_short` of its short
/// side at each end.
fn crop_bounds(r: &PixelRect, crop_long: f32, crop_short: f32) -> PixelRect {
    let (w, h) = (r.width(), r.height());
    let (rx, ry) = if w >= h {
        (crop_long, crop_short)
    } else {
        (crop_short, crop_long)
    };
    let dw = (w as f32 * rx) as i32;
    let dh = (h as f32 * ry) as i32;
    PixelRect::new(r.x0 + dw, r.y0 + dh, r.x1 - dw, r.y1 - dh)
}

/// Centered sub-rectangle whose sides are `side` times the cell's sides.
fn center_rect(cell: &PixelRect, side: f32) -> (PixelRect, bool) {
    let margin = (1.0 - side) / 2.0;
    let dx = (cell.width() as f32 * margin) as i32;
    let dy = (cell.height() as f32 * margin) as i32;
    let center = PixelRect::new(cell.x0 + dx, cell.y0 + dy, cell.x1 - dx, cell.y1 - dy);
    if !center.is_empty() {
        return (center, false);
    }
    let qx = cell.width() / 4;
    let qy = cell.height() / 4;
    (
        PixelRect::new(cell.x0 + qx, cell.y0 + qy, cell.x1 - qx, cell.y1 - qy),
        true,
    )
}
