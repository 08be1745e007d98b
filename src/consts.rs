/*---------------------------------------------------------------------------------------------
 *  Licensed under the Apache License, Version 2.0.
 *--------------------------------------------------------------------------------------------*/

/// width and height of a channel plane. The pipeline only handles this
/// fixed tile size; larger images are tiled by the caller.
pub const IMAGE_DIM: usize = 256;

pub const IMAGE_PIXELS: usize = IMAGE_DIM * IMAGE_DIM;

/// 2x2 tiles per row of the plane
pub const BLOCKS_PER_ROW: usize = IMAGE_DIM / 2;

/// total number of non-overlapping 2x2 tiles (16384)
pub const BLOCK_COUNT: usize = BLOCKS_PER_ROW * BLOCKS_PER_ROW;

/// bit width of a pixel sibling before embedding
pub const PIXEL_BITS: usize = 8;

/// bit width of an embedded cell: 8 payload bits plus 2 carrier bits
pub const CARRIER_BITS: usize = 10;

/// seeds of the two canonical scatter permutations
pub const TENT_SEED_1: f64 = 1e-5;
pub const TENT_SEED_2: f64 = 1e-8;

/// slope of the tent map, slightly below 2 so the orbit stays inside (0, 1)
pub const TENT_MU: f64 = 1.999999;

/// the orbit is sampled at 14 decimal digits before reduction mod BLOCK_COUNT
pub const TENT_SCALE: f64 = 1e14;

// used to precalculate the binomial coefficients up to C(10, 10); everything
// the POB codec needs fits in u16 since C(10, 5) = 252
const fn binomial_table() -> [[u16; CARRIER_BITS + 1]; CARRIER_BITS + 1] {
    let mut retval = [[0u16; CARRIER_BITS + 1]; CARRIER_BITS + 1];
    let mut n = 0;
    while n <= CARRIER_BITS {
        retval[n][0] = 1;
        let mut r = 1;
        while r <= n {
            retval[n][r] = retval[n - 1][r - 1] + retval[n - 1][r];
            r += 1;
        }
        n += 1;
    }

    return retval;
}

static BINOMIAL: [[u16; CARRIER_BITS + 1]; CARRIER_BITS + 1] = binomial_table();

/// C(n, r) for n <= 10, with C(n, r) = 0 when r > n
#[inline(always)]
pub fn binomial(n: usize, r: usize) -> u16 {
    if r > n {
        return 0;
    }
    BINOMIAL[n][r]
}

#[test]
fn binomial_matches_pascal() {
    assert_eq!(binomial(0, 0), 1);
    assert_eq!(binomial(8, 4), 70);
    assert_eq!(binomial(10, 5), 252);
    assert_eq!(binomial(10, 0), 1);
    assert_eq!(binomial(3, 7), 0);

    for n in 1..=10 {
        for r in 1..n {
            assert_eq!(
                binomial(n, r),
                binomial(n - 1, r - 1) + binomial(n - 1, r),
                "C({0},{1})",
                n,
                r
            );
        }
    }
}
