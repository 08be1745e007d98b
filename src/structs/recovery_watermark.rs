/*---------------------------------------------------------------------------------------------
 *  Licensed under the Apache License, Version 2.0.
 *--------------------------------------------------------------------------------------------*/

use crate::consts::BLOCK_COUNT;

use super::channel_matrix::ChannelMatrix;
use super::tent_map::TentPermutations;

/// 5-bit mean code of every 2x2 block of the original channel: the low five
/// bits of floor(sum / 4). Means above 31 wrap; the recovered gray tile is
/// an approximation by design.
pub fn block_mean_codes(channel: &ChannelMatrix<u8>) -> Vec<u8> {
    let mut codes = Vec::with_capacity(BLOCK_COUNT);

    for bpos in 0..BLOCK_COUNT {
        let m = channel.get_block(bpos);
        let sum = m[0] as u16 + m[1] as u16 + m[2] as u16 + m[3] as u16;
        codes.push(((sum / 4) & 0x1f) as u8);
    }

    return codes;
}

/// Two independently scattered copies of the mean codes: copy `i` at block
/// `k` carries the code of block `pi_i(k)`. Tampering a contiguous region of
/// one share then damages only scattered entries of the copy held by the
/// other share, so most block means stay recoverable.
pub fn recovery_watermark(
    channel: &ChannelMatrix<u8>,
    perms: &TentPermutations,
) -> (Vec<u8>, Vec<u8>) {
    let codes = block_mean_codes(channel);

    let scattered_1 = (0..BLOCK_COUNT).map(|k| codes[perms.pi1.scatter(k)]).collect();
    let scattered_2 = (0..BLOCK_COUNT).map(|k| codes[perms.pi2.scatter(k)]).collect();

    return (scattered_1, scattered_2);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enabled_features::EnabledFeatures;

    #[test]
    fn mean_codes_wrap_at_five_bits() {
        let mut channel = ChannelMatrix::<u8>::new();
        channel.set_block(0, [10, 20, 30, 40]); // mean 25, below the wrap
        channel.set_block(1, [255, 255, 255, 255]); // mean 255 -> code 31
        channel.set_block(2, [0, 255, 255, 0]); // mean 127 -> code 31
        channel.set_block(3, [40, 40, 40, 40]); // mean 40 -> code 8

        let codes = block_mean_codes(&channel);
        assert_eq!(codes[0], 25);
        assert_eq!(codes[1], 31);
        assert_eq!(codes[2], 31);
        assert_eq!(codes[3], 8);
    }

    #[test]
    fn scatter_is_a_permutation_of_the_codes() {
        let mut channel = ChannelMatrix::<u8>::new();
        for bpos in 0..BLOCK_COUNT {
            let v = (bpos % 32) as u8;
            channel.set_block(bpos, [v, v, v, v]);
        }

        let perms = TentPermutations::generate(&EnabledFeatures::default()).unwrap();
        let codes = block_mean_codes(&channel);
        let (scattered_1, scattered_2) = recovery_watermark(&channel, &perms);

        // unscattering restores the original table
        let mut restored = vec![0u8; BLOCK_COUNT];
        for k in 0..BLOCK_COUNT {
            restored[perms.pi1.scatter(k)] = scattered_1[k];
        }
        assert_eq!(restored, codes);

        let mut restored = vec![0u8; BLOCK_COUNT];
        for k in 0..BLOCK_COUNT {
            restored[perms.pi2.scatter(k)] = scattered_2[k];
        }
        assert_eq!(restored, codes);
    }
}
