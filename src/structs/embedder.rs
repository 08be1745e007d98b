/*---------------------------------------------------------------------------------------------
 *  Licensed under the Apache License, Version 2.0.
 *--------------------------------------------------------------------------------------------*/

use anyhow::{Context, Result};

use unroll::unroll_for_loops;

use crate::consts::{BLOCK_COUNT, CARRIER_BITS, PIXEL_BITS};
use crate::helpers::{bit_sum, here};

use super::channel_matrix::ChannelMatrix;
use super::pob::{pob_decode, pob_encode};

// Each 2x2 block donates 8 carrier bits (2 per cell), exactly enough for the
// 3 detection bits and the 5 recovery bits. The layout is fixed, cells in
// row-major order:
//
//   cell 0: dw0 dw1
//   cell 1: dw2 rw0
//   cell 2: rw1 rw2
//   cell 3: rw3 rw4

/// Expands a POB(8) index share into a POB(10) carrier share by appending
/// two watermark bits to every cell. Returns the carrier and its weight map;
/// the weight map travels out of band as the recovery bundle.
pub fn embed_share(
    index_share: &ChannelMatrix<u8>,
    weight_map: &ChannelMatrix<u8>,
    detection: &[[u8; 3]],
    recovery: &[u8],
) -> Result<(ChannelMatrix<u16>, ChannelMatrix<u8>)> {
    debug_assert!(detection.len() == BLOCK_COUNT && recovery.len() == BLOCK_COUNT);

    let mut carrier = ChannelMatrix::<u16>::new();
    let mut weights = ChannelMatrix::<u8>::new();

    for bpos in 0..BLOCK_COUNT {
        let (cells, cell_weights) = embed_block(
            index_share.get_block(bpos),
            weight_map.get_block(bpos),
            &detection[bpos],
            recovery[bpos],
        )
        .context(here!())?;

        carrier.set_block(bpos, cells);
        weights.set_block(bpos, cell_weights);
    }

    return Ok((carrier, weights));
}

#[unroll_for_loops]
fn embed_block(
    indices: [u8; 4],
    weights: [u8; 4],
    dw: &[u8; 3],
    rw: u8,
) -> Result<([u16; 4], [u8; 4])> {
    let carrier_bits: [[u8; 2]; 4] = [
        [dw[0], dw[1]],
        [dw[2], (rw >> 4) & 1],
        [(rw >> 3) & 1, (rw >> 2) & 1],
        [(rw >> 1) & 1, rw & 1],
    ];

    let mut out_indices = [0u16; 4];
    let mut out_weights = [0u8; 4];

    for cell in 0..4 {
        let payload = pob_decode::<PIXEL_BITS>(weights[cell], indices[cell] as u16)?;

        let mut expanded = [0u8; CARRIER_BITS];
        expanded[..PIXEL_BITS].copy_from_slice(&payload);
        expanded[PIXEL_BITS] = carrier_bits[cell][0];
        expanded[PIXEL_BITS + 1] = carrier_bits[cell][1];

        out_indices[cell] = pob_encode(&expanded);
        out_weights[cell] = bit_sum(&expanded);
    }

    return Ok((out_indices, out_weights));
}
