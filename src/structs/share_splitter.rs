/*---------------------------------------------------------------------------------------------
 *  Licensed under the Apache License, Version 2.0.
 *--------------------------------------------------------------------------------------------*/

use rand::Rng;

use crate::consts::IMAGE_PIXELS;
use crate::helpers::{bit_sum, byte_to_bits};

use super::channel_matrix::ChannelMatrix;
use super::pob::pob_encode;

/// one channel split into two POB-coded siblings. Either matrix pair alone
/// is indistinguishable from noise; together they XOR back to the channel.
pub struct SplitShares {
    pub index_1: ChannelMatrix<u8>,
    pub index_2: ChannelMatrix<u8>,
    pub weight_1: ChannelMatrix<u8>,
    pub weight_2: ChannelMatrix<u8>,
}

/// Splits every pixel into two random 8-bit siblings a ^ b = pixel and
/// stores each as its POB (weight, index) pair. The set bits of the pixel
/// are assigned to `a` by the parity of the running weight, the clear bits
/// get fresh random bits, and the whole vector is then whitened by a random
/// mask so that each sibling on its own is uniform.
pub fn split_channel<R: Rng>(channel: &ChannelMatrix<u8>, rng: &mut R) -> SplitShares {
    let mut shares = SplitShares {
        index_1: ChannelMatrix::new(),
        index_2: ChannelMatrix::new(),
        weight_1: ChannelMatrix::new(),
        weight_2: ChannelMatrix::new(),
    };

    for pos in 0..IMAGE_PIXELS {
        let bits = byte_to_bits(channel.as_slice()[pos]);
        let mask = byte_to_bits(rng.gen::<u8>());

        let mut a = [0u8; 8];
        let mut b = [0u8; 8];
        let mut ones_so_far = 0;

        for i in 0..8 {
            if bits[i] != 0 {
                ones_so_far += 1;
                a[i] = (ones_so_far % 2 == 0) as u8;
            } else {
                a[i] = rng.gen::<bool>() as u8;
            }

            a[i] ^= mask[i];
            b[i] = a[i] ^ bits[i];
        }

        shares.weight_1.as_mut_slice()[pos] = bit_sum(&a);
        shares.weight_2.as_mut_slice()[pos] = bit_sum(&b);
        shares.index_1.as_mut_slice()[pos] = pob_encode(&a) as u8;
        shares.index_2.as_mut_slice()[pos] = pob_encode(&b) as u8;
    }

    return shares;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::bits_to_byte;
    use crate::structs::pob::pob_decode;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;
    use rstest::rstest;

    #[rstest]
    #[case(0u64)]
    #[case(1u64)]
    #[case(0xdeadbeefu64)]
    fn sibling_xor_recovers_every_pixel(#[case] seed: u64) {
        let mut rng = ChaCha12Rng::seed_from_u64(seed);

        let mut channel = ChannelMatrix::<u8>::new();
        for (pos, p) in channel.as_mut_slice().iter_mut().enumerate() {
            *p = (pos * 7 + pos / 251) as u8;
        }

        let shares = split_channel(&channel, &mut rng);

        for pos in 0..IMAGE_PIXELS {
            let a = pob_decode::<8>(
                shares.weight_1.as_slice()[pos],
                shares.index_1.as_slice()[pos] as u16,
            )
            .unwrap();
            let b = pob_decode::<8>(
                shares.weight_2.as_slice()[pos],
                shares.index_2.as_slice()[pos] as u16,
            )
            .unwrap();

            let recovered = bits_to_byte(&a) ^ bits_to_byte(&b);
            assert_eq!(recovered, channel.as_slice()[pos]);
        }
    }

    #[test]
    fn all_255_weights_are_complementary() {
        let mut rng = ChaCha12Rng::seed_from_u64(7);

        let channel = ChannelMatrix::<u8>::from_raw(vec![255; IMAGE_PIXELS]).unwrap();
        let shares = split_channel(&channel, &mut rng);

        // b is the complement of a, so the weights pair up to 8 pointwise
        for pos in 0..IMAGE_PIXELS {
            assert_eq!(
                shares.weight_1.as_slice()[pos] + shares.weight_2.as_slice()[pos],
                8
            );
        }
    }

    #[test]
    fn fresh_randomness_gives_different_splits() {
        let channel = ChannelMatrix::<u8>::from_raw(vec![0x5a; IMAGE_PIXELS]).unwrap();

        let mut rng_a = ChaCha12Rng::seed_from_u64(1);
        let mut rng_b = ChaCha12Rng::seed_from_u64(2);

        let first = split_channel(&channel, &mut rng_a);
        let second = split_channel(&channel, &mut rng_b);

        assert_ne!(first.weight_1, second.weight_1);
        assert_ne!(first.index_1, second.index_1);
    }
}
