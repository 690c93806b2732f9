use ndarray::{Array3, ArrayView3};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Per-cell mean colors of one card, shape `(3, rows, cols)`, channels in
/// R, G, B order, values on the 8-bit `[0, 255]` scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Array3<f32>", into = "Array3<f32>")]
pub struct ColorMeanTensor {
    data: Array3<f32>,
}

impl ColorMeanTensor {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: Array3::zeros((3, rows, cols)),
        }
    }

    /// Every cell set to the same RGB triple.
    pub fn filled(rows: usize, cols: usize, rgb: [f32; 3]) -> Self {
        Self {
            data: Array3::from_shape_fn((3, rows, cols), |(c, _, _)| rgb[c]),
        }
    }

    pub fn from_array(data: Array3<f32>) -> Result<Self, CoreError> {
        let (c, rows, cols) = data.dim();
        if c != 3 || rows == 0 || cols == 0 {
            return Err(CoreError::InvalidTensorShape {
                got: data.shape().to_vec(),
            });
        }
        Ok(Self { data })
    }

    pub fn rows(&self) -> usize {
        self.data.dim().1
    }

    pub fn cols(&self) -> usize {
        self.data.dim().2
    }

    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    pub fn into_array(self) -> Array3<f32> {
        self.data
    }

    /// RGB triple of cell `(row, col)`.
    pub fn cell(&self, row: usize, col: usize) -> [f32; 3] {
        [
            self.data[[0, row, col]],
            self.data[[1, row, col]],
            self.data[[2, row, col]],
        ]
    }

    pub fn set_cell(&mut self, row: usize, col: usize, rgb: [f32; 3]) {
        for (c, v) in rgb.into_iter().enumerate() {
            self.data[[c, row, col]] = v;
        }
    }
}

impl TryFrom<Array3<f32>> for ColorMeanTensor {
    type Error = CoreError;

    fn try_from(value: Array3<f32>) -> Result<Self, Self::Error> {
        Self::from_array(value)
    }
}

impl From<ColorMeanTensor> for Array3<f32> {
    fn from(value: ColorMeanTensor) -> Self {
        value.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_rgb_shapes() {
        assert!(ColorMeanTensor::from_array(Array3::zeros((4, 2, 2))).is_err());
        assert!(ColorMeanTensor::from_array(Array3::zeros((3, 0, 2))).is_err());
        assert!(ColorMeanTensor::from_array(Array3::zeros((3, 2, 5))).is_ok());
    }

    #[test]
    fn cells_are_channel_major() {
        let mut t = ColorMeanTensor::zeros(2, 3);
        t.set_cell(1, 2, [1.0, 2.0, 3.0]);
        assert_eq!(t.cell(1, 2), [1.0, 2.0, 3.0]);
        assert_eq!(t.view()[[2, 1, 2]], 3.0);
        assert_eq!((t.rows(), t.cols()), (2, 3));
    }

    #[test]
    fn serde_checks_shape() {
        let t = ColorMeanTensor::filled(1, 2, [5.0, 6.0, 7.0]);
        let json = serde_json::to_string(&t).unwrap();
        let back: ColorMeanTensor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);

        let bad = serde_json::to_string(&Array3::<f32>::zeros((2, 1, 1))).unwrap();
        assert!(serde_json::from_str::<ColorMeanTensor>(&bad).is_err());
    }
}
