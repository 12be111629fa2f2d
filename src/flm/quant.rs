//! Per-row integer quantization for container payloads.
//!
//! Weight matrices are quantized one output row at a time: Q8 stores a
//! symmetric absmax scale per row, Q4 an affine (min, scale) pair per row
//! with two 4-bit codes packed into each byte.

/// Q8 quantization result: one scale per row, one i8 per element
#[derive(Debug, Clone, PartialEq)]
pub struct Q8Rows {
    /// Per-row scale factors (`rows` entries)
    pub scales: Vec<f32>,
    /// Quantized values, row-major (`rows * cols` entries)
    pub data: Vec<i8>,
    /// Row length
    pub cols: usize,
}

impl Q8Rows {
    /// Number of quantized rows
    #[must_use]
    pub fn rows(&self) -> usize {
        self.scales.len()
    }
}

/// Q4 quantization result: (min, scale) per row, two codes per byte
#[derive(Debug, Clone, PartialEq)]
pub struct Q4Rows {
    /// Per-row minimum values (`rows` entries)
    pub mins: Vec<f32>,
    /// Per-row scale factors (`rows` entries)
    pub scales: Vec<f32>,
    /// Packed codes, row-major, `ceil(cols/2)` bytes per row
    pub data: Vec<u8>,
    /// Row length in elements (not bytes)
    pub cols: usize,
}

impl Q4Rows {
    /// Number of quantized rows
    #[must_use]
    pub fn rows(&self) -> usize {
        self.scales.len()
    }

    /// Packed bytes per row
    #[must_use]
    pub fn row_stride(&self) -> usize {
        self.cols.div_ceil(2)
    }
}

/// Split a tensor shape into (rows, cols) for per-row quantization.
///
/// cols is the last dimension, rows the product of the rest.
#[must_use]
pub fn row_split(shape: &[usize]) -> (usize, usize) {
    match shape.split_last() {
        Some((&cols, rest)) => (rest.iter().product(), cols),
        None => (0, 0),
    }
}

/// Quantize row-major values to 8-bit with a symmetric absmax scale per row.
///
/// `q = round(v / scale)` clamped to `[-127, 127]` with `scale = absmax / 127`.
/// All-zero rows get scale 0 and all-zero codes.
#[must_use]
pub fn quantize_q8_rows(values: &[f32], rows: usize, cols: usize) -> Q8Rows {
    debug_assert_eq!(values.len(), rows * cols);
    let mut scales = Vec::with_capacity(rows);
    let mut data = Vec::with_capacity(rows * cols);

    for row in values.chunks_exact(cols.max(1)).take(rows) {
        let absmax = row.iter().fold(0.0f32, |acc, &v| acc.max(v.abs()));
        let scale = absmax / 127.0;
        let inv = if scale > 0.0 { 1.0 / scale } else { 0.0 };
        scales.push(scale);
        for &v in row {
            let q = (v * inv).round().clamp(-127.0, 127.0);
            data.push(q as i8);
        }
    }
    // Degenerate shapes (cols == 0) still declare their rows
    scales.resize(rows, 0.0);

    Q8Rows { scales, data, cols }
}

/// Reconstruct f32 values from Q8 rows (`v = q * scale`)
#[must_use]
pub fn dequantize_q8(q: &Q8Rows) -> Vec<f32> {
    let mut out = Vec::with_capacity(q.data.len());
    for (row, &scale) in q.scales.iter().enumerate() {
        for col in 0..q.cols {
            out.push(f32::from(q.data[row * q.cols + col]) * scale);
        }
    }
    out
}

/// Quantize row-major values to 4-bit with an affine (min, scale) per row.
///
/// `q = round((v - min) / scale)` clamped to `[0, 15]` with
/// `scale = (max - min) / 15`. Even-indexed elements occupy the low nibble,
/// odd-indexed the high nibble; a row with odd length pads its final high
/// nibble with 0. Constant rows get scale 0 and all-zero codes.
#[must_use]
pub fn quantize_q4_rows(values: &[f32], rows: usize, cols: usize) -> Q4Rows {
    debug_assert_eq!(values.len(), rows * cols);
    let stride = cols.div_ceil(2);
    let mut mins = Vec::with_capacity(rows);
    let mut scales = Vec::with_capacity(rows);
    let mut data = Vec::with_capacity(rows * stride);

    for row in values.chunks_exact(cols.max(1)).take(rows) {
        let min = row.iter().fold(f32::INFINITY, |acc, &v| acc.min(v));
        let max = row.iter().fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
        let (min, max) = if min.is_finite() { (min, max) } else { (0.0, 0.0) };
        let scale = (max - min) / 15.0;
        let inv = if scale > 0.0 { 1.0 / scale } else { 0.0 };
        mins.push(min);
        scales.push(scale);

        for pair in row.chunks(2) {
            let lo = quantize_nibble(pair[0], min, inv);
            let hi = if pair.len() == 2 {
                quantize_nibble(pair[1], min, inv)
            } else {
                0
            };
            data.push(lo | (hi << 4));
        }
    }
    mins.resize(rows, 0.0);
    scales.resize(rows, 0.0);

    Q4Rows {
        mins,
        scales,
        data,
        cols,
    }
}

fn quantize_nibble(v: f32, min: f32, inv_scale: f32) -> u8 {
    ((v - min) * inv_scale).round().clamp(0.0, 15.0) as u8
}

/// Reconstruct f32 values from Q4 rows (`v = min + q * scale`)
#[must_use]
pub fn dequantize_q4(q: &Q4Rows) -> Vec<f32> {
    let stride = q.row_stride();
    let mut out = Vec::with_capacity(q.rows() * q.cols);
    for row in 0..q.rows() {
        let min = q.mins[row];
        let scale = q.scales[row];
        for col in 0..q.cols {
            let byte = q.data[row * stride + col / 2];
            let code = if col % 2 == 0 { byte & 0x0F } else { byte >> 4 };
            out.push(min + f32::from(code) * scale);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_row_split() {
        assert_eq!(row_split(&[4, 8]), (4, 8));
        assert_eq!(row_split(&[2, 3, 4]), (6, 4));
        assert_eq!(row_split(&[5]), (1, 5));
        assert_eq!(row_split(&[]), (0, 0));
    }

    #[test]
    fn test_q8_sizes() {
        let values: Vec<f32> = (0..12).map(|i| i as f32).collect();
        let q = quantize_q8_rows(&values, 3, 4);
        assert_eq!(q.rows(), 3);
        assert_eq!(q.scales.len(), 3);
        assert_eq!(q.data.len(), 12);
    }

    #[test]
    fn test_q8_absmax_maps_to_127() {
        let values = [1.0f32, -2.0, 4.0, 0.5];
        let q = quantize_q8_rows(&values, 1, 4);
        assert!((q.scales[0] - 4.0 / 127.0).abs() < 1e-7);
        assert_eq!(q.data[2], 127);
    }

    #[test]
    fn test_q8_zero_row_has_zero_scale() {
        let q = quantize_q8_rows(&[0.0; 8], 2, 4);
        assert_eq!(q.scales, vec![0.0, 0.0]);
        assert!(q.data.iter().all(|&v| v == 0));
        assert_eq!(dequantize_q8(&q), vec![0.0; 8]);
    }

    #[test]
    fn test_q4_even_element_in_low_nibble() {
        // Row 0..4 over [0, 3]: scale 0.2, codes 0, 5, 10, 15
        let values = [0.0f32, 1.0, 2.0, 3.0];
        let q = quantize_q4_rows(&values, 1, 4);
        assert_eq!(q.data.len(), 2);
        assert_eq!(q.data[0] & 0x0F, 0);
        assert_eq!(q.data[0] >> 4, 5);
        assert_eq!(q.data[1] & 0x0F, 10);
        assert_eq!(q.data[1] >> 4, 15);
    }

    #[test]
    fn test_q4_odd_cols_pads_final_nibble() {
        let values = [1.0f32, 2.0, 3.0];
        let q = quantize_q4_rows(&values, 1, 3);
        assert_eq!(q.row_stride(), 2);
        assert_eq!(q.data.len(), 2);
        assert_eq!(q.data[1] >> 4, 0, "padding nibble must be zero");
    }

    #[test]
    fn test_q4_constant_row_is_exact() {
        let values = [2.5f32; 6];
        let q = quantize_q4_rows(&values, 2, 3);
        assert_eq!(q.scales, vec![0.0, 0.0]);
        assert_eq!(q.mins, vec![2.5, 2.5]);
        assert_eq!(dequantize_q4(&q), values.to_vec());
    }

    #[test]
    fn test_empty_input() {
        let q8 = quantize_q8_rows(&[], 0, 4);
        assert!(q8.scales.is_empty());
        assert!(q8.data.is_empty());
        assert!(dequantize_q8(&q8).is_empty());

        let q4 = quantize_q4_rows(&[], 0, 4);
        assert!(q4.scales.is_empty());
        assert!(q4.data.is_empty());
        assert!(dequantize_q4(&q4).is_empty());
    }

    #[test]
    fn test_q8_rows_independent_scales() {
        // Two rows with very different magnitudes must not share a scale
        let values = [0.01f32, -0.02, 100.0, -200.0];
        let q = quantize_q8_rows(&values, 2, 2);
        assert!(q.scales[0] < 0.001);
        assert!(q.scales[1] > 1.0);
        let deq = dequantize_q8(&q);
        assert!((deq[0] - 0.01).abs() <= q.scales[0] * 0.51);
        assert!((deq[3] + 200.0).abs() <= q.scales[1] * 0.51);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_q8_roundtrip_within_half_step(
            (rows, cols, values) in (1usize..6, 1usize..12).prop_flat_map(|(rows, cols)| {
                proptest::collection::vec(-64.0f32..64.0, rows * cols)
                    .prop_map(move |values| (rows, cols, values))
            })
        ) {
            let q = quantize_q8_rows(&values, rows, cols);
            let deq = dequantize_q8(&q);
            prop_assert_eq!(deq.len(), values.len());
            for (i, (&v, &d)) in values.iter().zip(deq.iter()).enumerate() {
                let scale = q.scales[i / cols];
                prop_assert!(
                    (v - d).abs() <= scale * 0.51 + 1e-6,
                    "row {}: {} reconstructed as {} (scale {})",
                    i / cols, v, d, scale
                );
            }
        }

        #[test]
        fn prop_q4_roundtrip_within_half_step(
            (rows, cols, values) in (1usize..6, 1usize..12).prop_flat_map(|(rows, cols)| {
                proptest::collection::vec(-64.0f32..64.0, rows * cols)
                    .prop_map(move |values| (rows, cols, values))
            })
        ) {
            let q = quantize_q4_rows(&values, rows, cols);
            let deq = dequantize_q4(&q);
            prop_assert_eq!(deq.len(), values.len());
            for (i, (&v, &d)) in values.iter().zip(deq.iter()).enumerate() {
                let scale = q.scales[i / cols];
                prop_assert!(
                    (v - d).abs() <= scale * 0.51 + 1e-6,
                    "row {}: {} reconstructed as {} (scale {})",
                    i / cols, v, d, scale
                );
            }
        }

        #[test]
        fn prop_q4_packed_size(
            rows in 1usize..8,
            cols in 1usize..17,
        ) {
            let values = vec![1.0f32; rows * cols];
            let q = quantize_q4_rows(&values, rows, cols);
            prop_assert_eq!(q.data.len(), rows * cols.div_ceil(2));
            prop_assert_eq!(q.mins.len(), rows);
            prop_assert_eq!(q.scales.len(), rows);
        }

        #[test]
        fn prop_q8_codes_within_range(
            values in proptest::collection::vec(-1e6f32..1e6, 1..64),
        ) {
            let cols = values.len();
            let q = quantize_q8_rows(&values, 1, cols);
            for &code in &q.data {
                prop_assert!((-127..=127).contains(&i32::from(code)));
            }
        }
    }
}
