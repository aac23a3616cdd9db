// SPDX-License-Identifier: MIT
//
// randimg: Random Noise Images from random.org
// Copyright (c) 2025 randimg Contributors

//! Fixed-shape random byte buffer
//!
//! A `RandomBuffer` is a (128, 128, 3) array stored flat in row-major order with the
//! channel axis varying fastest: consecutive triples are the (r, g, b) values of one
//! pixel, and pixels run left to right, top to bottom. This is exactly the arrival
//! order of the integers it was built from.

use crate::{Error, Result, CHANNELS, IMG_DIM, NUM_RAND_INTS};

/// Immutable (128, 128, 3) buffer of byte values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomBuffer {
    data: Vec<u8>,
}

impl RandomBuffer {
    /// Reshape a flat integer sequence into a buffer
    ///
    /// The sequence must hold exactly `NUM_RAND_INTS` values, each within 0..=255.
    pub fn from_flat(values: &[i32]) -> Result<Self> {
        if values.len() != NUM_RAND_INTS {
            return Err(Error::Validation(format!(
                "expected {} integers, got {}",
                NUM_RAND_INTS,
                values.len()
            )));
        }

        let data = values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                u8::try_from(v).map_err(|_| {
                    Error::Validation(format!("value {} at position {} is outside 0..=255", v, i))
                })
            })
            .collect::<Result<Vec<u8>>>()?;

        Ok(Self { data })
    }

    /// Buffer dimensions as (rows, columns, channels)
    pub fn shape(&self) -> (usize, usize, usize) {
        (IMG_DIM, IMG_DIM, CHANNELS)
    }

    /// Value at `(row, col, channel)`, or `None` when out of bounds
    pub fn get(&self, row: usize, col: usize, channel: usize) -> Option<u8> {
        if row >= IMG_DIM || col >= IMG_DIM || channel >= CHANNELS {
            return None;
        }
        Some(self.data[Self::offset(row, col, channel)])
    }

    /// RGB triple of one pixel
    pub fn pixel(&self, row: usize, col: usize) -> Option<[u8; 3]> {
        if row >= IMG_DIM || col >= IMG_DIM {
            return None;
        }
        let start = Self::offset(row, col, 0);
        Some([self.data[start], self.data[start + 1], self.data[start + 2]])
    }

    /// Flattened view in row-major, channel-fastest order
    pub fn as_flat(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    fn offset(row: usize, col: usize, channel: usize) -> usize {
        (row * IMG_DIM + col) * CHANNELS + channel
    }
}
