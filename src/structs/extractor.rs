/*---------------------------------------------------------------------------------------------
 *  Licensed under the Apache License, Version 2.0.
 *--------------------------------------------------------------------------------------------*/

use anyhow::{Context, Result};

use unroll::unroll_for_loops;
use wide::u8x16;

use crate::consts::{BLOCK_COUNT, CARRIER_BITS, PIXEL_BITS};
use crate::helpers::{bit_sum, bits_to_byte, here};

use super::channel_matrix::ChannelMatrix;
use super::detection_watermark::detection_watermark;
use super::pob::{pob_decode, pob_encode};
use super::tent_map::TentPermutation;

/// everything the receiver can pull back out of one carrier share
pub struct ExtractedShare {
    /// the POB(8) index share as it was before embedding
    pub index_8: ChannelMatrix<u8>,

    /// weights of the POB(8) payloads
    pub weight_8: ChannelMatrix<u8>,

    /// the decoded sibling bytes, ready to be XOR-ed with the other share
    pub plain: ChannelMatrix<u8>,

    /// detection bits as embedded, one triple per block
    pub detection: Vec<[u8; 3]>,

    /// recovery mean codes as embedded, still in scattered order
    pub recovery: Vec<u8>,
}

/// Inverts the embedding: decodes every POB(10) cell, splits off the two
/// carrier bits per the fixed block layout and re-derives the POB(8) pair
/// of the 8-bit payload.
pub fn extract_share(
    carrier: &ChannelMatrix<u16>,
    weights: &ChannelMatrix<u8>,
) -> Result<ExtractedShare> {
    let mut extracted = ExtractedShare {
        index_8: ChannelMatrix::new(),
        weight_8: ChannelMatrix::new(),
        plain: ChannelMatrix::new(),
        detection: Vec::with_capacity(BLOCK_COUNT),
        recovery: Vec::with_capacity(BLOCK_COUNT),
    };

    for bpos in 0..BLOCK_COUNT {
        extract_block(carrier.get_block(bpos), weights.get_block(bpos), bpos, &mut extracted)
            .context(here!())?;
    }

    return Ok(extracted);
}

#[unroll_for_loops]
fn extract_block(
    cells: [u16; 4],
    cell_weights: [u8; 4],
    bpos: usize,
    extracted: &mut ExtractedShare,
) -> Result<()> {
    let mut index_8 = [0u8; 4];
    let mut weight_8 = [0u8; 4];
    let mut plain = [0u8; 4];
    let mut carrier_bits = [[0u8; 2]; 4];

    for cell in 0..4 {
        let bits = pob_decode::<CARRIER_BITS>(cell_weights[cell], cells[cell])?;
        let payload = &bits[..PIXEL_BITS];

        index_8[cell] = pob_encode(payload) as u8;
        weight_8[cell] = bit_sum(payload);
        plain[cell] = bits_to_byte(payload);
        carrier_bits[cell] = [bits[PIXEL_BITS], bits[PIXEL_BITS + 1]];
    }

    extracted.index_8.set_block(bpos, index_8);
    extracted.weight_8.set_block(bpos, weight_8);
    extracted.plain.set_block(bpos, plain);

    // inverse of the embedding layout
    extracted.detection.push([
        carrier_bits[0][0],
        carrier_bits[0][1],
        carrier_bits[1][0],
    ]);
    extracted.recovery.push(
        (carrier_bits[1][1] << 4)
            | (carrier_bits[2][0] << 3)
            | (carrier_bits[2][1] << 2)
            | (carrier_bits[3][0] << 1)
            | carrier_bits[3][1],
    );

    return Ok(());
}

/// XOR of the two sibling planes, 16 lanes at a time
pub fn recombine(first: &ChannelMatrix<u8>, second: &ChannelMatrix<u8>) -> ChannelMatrix<u8> {
    let mut out = ChannelMatrix::new();

    let a = first.as_slice().chunks_exact(16);
    let b = second.as_slice().chunks_exact(16);
    let o = out.as_mut_slice().chunks_exact_mut(16);

    for ((a, b), o) in a.zip(b).zip(o) {
        let lanes = u8x16::new(a.try_into().unwrap()) ^ u8x16::new(b.try_into().unwrap());
        o.copy_from_slice(&lanes.to_array());
    }

    return out;
}

/// Blocks whose extracted detection bits disagree with ones recomputed from
/// the extracted POB(8) share. Compared element-wise over the full triple.
pub fn find_tampered_blocks(extracted: &ExtractedShare) -> Vec<u32> {
    let recomputed = detection_watermark(&extracted.index_8);

    return (0..BLOCK_COUNT)
        .filter(|&bpos| extracted.detection[bpos] != recomputed[bpos])
        .map(|bpos| bpos as u32)
        .collect();
}

/// rebuilds the natural-order mean-code table from one scattered copy
pub fn unscatter_recovery(codes: &[u8], perm: &TentPermutation) -> Vec<u8> {
    debug_assert!(codes.len() == BLOCK_COUNT);

    let mut table = vec![0u8; BLOCK_COUNT];
    for k in 0..BLOCK_COUNT {
        table[perm.scatter(k)] = codes[k];
    }

    return table;
}

/// upscales a 5-bit mean code to a display gray by bit replication, so that
/// code 31 comes back as 255
pub fn gray_from_code(code: u8) -> u8 {
    (code << 3) | (code >> 2)
}
