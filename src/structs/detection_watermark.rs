/*---------------------------------------------------------------------------------------------
 *  Licensed under the Apache License, Version 2.0.
 *--------------------------------------------------------------------------------------------*/

use crate::consts::BLOCK_COUNT;
use crate::helpers::popcount_parity;

use super::channel_matrix::ChannelMatrix;

/// Three tamper-detection bits per 2x2 block, derived from the block's
/// singular values s0 >= s1:
///
///   wd1 = parity of delta = s0 - s1 (fractional part scaled to an integer
///         when delta is not whole)
///   wd2 = 1 when delta >= 255
///   wd3 = parity of eta = s0 + s1, scaled the same way
///
/// The watermark is share-specific: it is computed from the POB-index share,
/// not from the original channel, so the receiver can recompute it from the
/// extracted share alone.
pub fn detection_watermark(share: &ChannelMatrix<u8>) -> Vec<[u8; 3]> {
    let mut out = Vec::with_capacity(BLOCK_COUNT);

    for bpos in 0..BLOCK_COUNT {
        let (s0, s1) = singular_values(share.get_block(bpos));

        let delta = s0 - s1;
        let eta = s0 + s1;

        out.push([
            scaled_parity(delta),
            (delta >= 255.0) as u8,
            scaled_parity(eta),
        ]);
    }

    return out;
}

/// closed-form singular values of a 2x2 block, largest first. For a real
/// 2x2 matrix M they are sqrt((s +- sqrt(s^2 - 4 d^2)) / 2) with
/// s = trace(M^T M) and d = det(M), which avoids a general SVD.
fn singular_values(m: [u8; 4]) -> (f64, f64) {
    let a = m[0] as f64;
    let b = m[1] as f64;
    let c = m[2] as f64;
    let d = m[3] as f64;

    let s = a * a + b * b + c * c + d * d;
    let det = a * d - b * c;

    // clamped at zero: rounding can push the discriminant slightly negative
    // when the two singular values coincide
    let disc = (s * s - 4.0 * det * det).max(0.0).sqrt();

    let s0 = ((s + disc) / 2.0).sqrt();
    let s1 = ((s - disc).max(0.0) / 2.0).sqrt();

    return (s0, s1);
}

/// parity of the bit count of the integer form of `value`: the value itself
/// when whole, otherwise its fractional part scaled by the length of its
/// decimal expansion. The expansion length is taken per value from the
/// canonical shortest rendering of the f64.
fn scaled_parity(value: f64) -> u8 {
    let frac = value.fract();

    let integer_form = if frac == 0.0 {
        value as u64
    } else {
        // "0.1259765625" -> 1259765625; capped at 17 digits, the longest
        // expansion the shortest-roundtrip rendering can produce for u64
        let rendered = format!("{}", frac);
        let digits = &rendered[2..];
        let digits = &digits[..digits.len().min(17)];
        digits.parse::<u64>().unwrap_or(0)
    };

    return popcount_parity(integer_form);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0)] // popcount(0) = 0
    #[case(200.0, 1)] // popcount(200) = 3
    #[case(2.5, 0)] // frac "0.5" -> 5, popcount 2
    #[case(1.25, 1)] // frac "0.25" -> 25, popcount 3
    #[case(96.0, 0)] // popcount(96) = 2
    fn parity_of_scaled_values(#[case] value: f64, #[case] expected: u8) {
        assert_eq!(scaled_parity(value), expected);
    }

    #[test]
    fn equal_diagonal_block() {
        // [[100, 0], [0, 100]] has both singular values equal to 100,
        // so delta = 0 and eta = 200
        let mut share = ChannelMatrix::<u8>::new();
        share.set_block(0, [100, 0, 0, 100]);

        let wd = detection_watermark(&share);
        assert_eq!(wd[0], [0, 0, 1]);
        assert_eq!(wd.len(), BLOCK_COUNT);
    }

    #[test]
    fn rank_one_block() {
        // [[100, 100], [100, 100]] has singular values (200, 0)
        let (s0, s1) = singular_values([100, 100, 100, 100]);
        assert!((s0 - 200.0).abs() < 1e-9);
        assert!(s1.abs() < 1e-9);
    }

    #[test]
    fn zero_block_is_all_zero_bits() {
        let share = ChannelMatrix::<u8>::new();
        let wd = detection_watermark(&share);
        assert!(wd.iter().all(|&bits| bits == [0, 0, 0]));
    }
}
