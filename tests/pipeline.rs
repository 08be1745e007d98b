/*---------------------------------------------------------------------------------------------
 *  Licensed under the Apache License, Version 2.0.
 *--------------------------------------------------------------------------------------------*/

// End-to-end scenarios over the full encrypt/decrypt pipeline.

use std::hash::Hasher;

use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use siphasher::sip::SipHasher13;

use securevision::enabled_features::EnabledFeatures;
use securevision::{
    block_origin, decrypt_channel, decrypt_image, encrypt_channel, encrypt_image, extract_share,
    merge_interleaved, read_bundle, split_channel, split_interleaved, write_bundle, ChannelMatrix,
    TentPermutations,
};

const IMAGE_PIXELS: usize = 256 * 256;

fn gradient_channel(step: usize) -> ChannelMatrix<u8> {
    let mut channel = ChannelMatrix::new();
    for (pos, p) in channel.as_mut_slice().iter_mut().enumerate() {
        *p = ((pos / 256) * step + (pos % 256)) as u8;
    }

    return channel;
}

fn checkerboard_channel() -> ChannelMatrix<u8> {
    let mut channel = ChannelMatrix::new();
    for pos in 0..IMAGE_PIXELS {
        let (row, col) = (pos / 256, pos % 256);
        channel.as_mut_slice()[pos] = if (row + col) % 2 == 0 { 0 } else { 255 };
    }

    return channel;
}

fn sip_hash(bytes: &[u8]) -> u64 {
    let mut hasher = SipHasher13::new();
    hasher.write(bytes);
    return hasher.finish();
}

#[test]
fn all_zero_channel_roundtrip() {
    let mut rng = ChaCha12Rng::seed_from_u64(11);
    let features = EnabledFeatures::default();
    let perms = TentPermutations::generate(&features).unwrap();

    let channel = ChannelMatrix::from_raw(vec![0u8; IMAGE_PIXELS]).unwrap();

    let shares = encrypt_channel(&channel, &mut rng, &perms).unwrap();
    let recovered = decrypt_channel(&shares, &perms, &features).unwrap();

    assert_eq!(recovered.image, channel);
    assert!(recovered.tampered_1.is_empty() && recovered.tampered_2.is_empty());

    // every bit of the siblings is randomized, so the weights average out
    // to about half the 8 positions
    let split = split_channel(&channel, &mut rng);
    let mean = split.weight_1.as_slice().iter().map(|&w| w as u32).sum::<u32>() as f64
        / IMAGE_PIXELS as f64;
    assert!(mean > 3.9 && mean < 4.1, "weight mean {0}", mean);
}

#[test]
fn all_255_channel_roundtrip() {
    let mut rng = ChaCha12Rng::seed_from_u64(12);
    let features = EnabledFeatures::default();
    let perms = TentPermutations::generate(&features).unwrap();

    let channel = ChannelMatrix::from_raw(vec![255u8; IMAGE_PIXELS]).unwrap();

    let shares = encrypt_channel(&channel, &mut rng, &perms).unwrap();
    let recovered = decrypt_channel(&shares, &perms, &features).unwrap();

    assert_eq!(recovered.image, channel);
}

#[test]
fn tampered_block_is_flagged_and_repaired() {
    let mut rng = ChaCha12Rng::seed_from_u64(13);
    let features = EnabledFeatures::default();
    let perms = TentPermutations::generate(&features).unwrap();

    let channel = checkerboard_channel();
    let mut shares = encrypt_channel(&channel, &mut rng, &perms).unwrap();

    // overwrite one block of the first carrier with a valid but wrong
    // POB(10) payload. The extracted detection bits for the block become
    // (0, 0, 0) while the recomputed ones see the [[1,1],[1,1]] index
    // block, whose singular values give wd1 = 1, so the mismatch is
    // structural rather than probabilistic.
    let target = 5000;
    shares.carrier_1.set_block(target, [3, 3, 3, 3]);
    shares.weights_1.set_block(target, [1, 1, 1, 1]);

    let recovered = decrypt_channel(&shares, &perms, &features).unwrap();

    assert_eq!(recovered.tampered_1, vec![target as u32]);
    assert!(recovered.tampered_2.is_empty());

    // every checkerboard block has two 255s, so its mean is 127 and its
    // 5-bit code is 31, which the repair upscales back to a 255 tile
    assert_eq!(recovered.image.get_block(target), [255, 255, 255, 255]);

    // the rest of the image is untouched
    let (row, col) = block_origin(target);
    for pos in 0..IMAGE_PIXELS {
        let (r, c) = (pos / 256, pos % 256);
        if r / 2 == row / 2 && c / 2 == col / 2 {
            continue;
        }
        assert_eq!(
            recovered.image.as_slice()[pos],
            channel.as_slice()[pos],
            "pixel ({0},{1})",
            r,
            c
        );
    }

    // with extraction only, the same damage goes unflagged and unrepaired
    let extract_only = EnabledFeatures::extract_only();
    let raw = decrypt_channel(&shares, &perms, &extract_only).unwrap();

    assert!(raw.tampered_1.is_empty() && raw.tampered_2.is_empty());
    assert_ne!(raw.image.get_block(target), [255, 255, 255, 255]);
}

#[test]
fn fresh_randomness_but_identical_recovery() {
    let features = EnabledFeatures::default();
    let planes = [
        gradient_channel(1),
        gradient_channel(3),
        gradient_channel(5),
    ];

    let first = encrypt_image(&planes, &features).unwrap();
    let second = encrypt_image(&planes, &features).unwrap();

    // shares draw fresh process randomness
    assert_ne!(first[0].carrier_1, second[0].carrier_1);

    let recovered_first = decrypt_image(&first, &features).unwrap();
    let recovered_second = decrypt_image(&second, &features).unwrap();

    let merged_first = merge_interleaved([
        &recovered_first[0].image,
        &recovered_first[1].image,
        &recovered_first[2].image,
    ]);
    let merged_second = merge_interleaved([
        &recovered_second[0].image,
        &recovered_second[1].image,
        &recovered_second[2].image,
    ]);

    let original = merge_interleaved([&planes[0], &planes[1], &planes[2]]);

    assert_eq!(sip_hash(&merged_first), sip_hash(&original));
    assert_eq!(sip_hash(&merged_second), sip_hash(&original));
}

#[test]
fn bundle_survives_serialization() {
    let features = EnabledFeatures::default();
    let planes = [
        gradient_channel(2),
        checkerboard_channel(),
        gradient_channel(7),
    ];

    let shares = encrypt_image(&planes, &features).unwrap();

    let mut bytes = Vec::new();
    write_bundle(&mut bytes, &shares).unwrap();
    let restored = read_bundle(&mut &bytes[..]).unwrap();

    let recovered = decrypt_image(&restored, &features).unwrap();
    for (plane, channel) in planes.iter().zip(recovered.iter()) {
        assert_eq!(&channel.image, plane);
    }
}

#[test]
fn single_share_bytes_look_uniform() {
    let mut rng = ChaCha12Rng::seed_from_u64(14);
    let features = EnabledFeatures::default();
    let perms = TentPermutations::generate(&features).unwrap();

    // a strongly structured cover
    let channel = checkerboard_channel();
    let shares = encrypt_channel(&channel, &mut rng, &perms).unwrap();

    // the decoded sibling bytes of one share alone are whitened by the
    // random mask, so their histogram should pass a loose chi-squared
    // check against uniform
    let extracted = extract_share(&shares.carrier_1, &shares.weights_1).unwrap();

    let mut histogram = [0u32; 256];
    for &b in extracted.plain.as_slice() {
        histogram[b as usize] += 1;
    }

    let expected = (IMAGE_PIXELS / 256) as f64;
    let chi_squared: f64 = histogram
        .iter()
        .map(|&observed| {
            let diff = observed as f64 - expected;
            diff * diff / expected
        })
        .sum();

    // 255 degrees of freedom; anything under 400 is comfortably ordinary
    assert!(chi_squared < 400.0, "chi squared {0}", chi_squared);
}

#[test]
fn raw_buffer_split_merge_roundtrip() {
    let buffer: Vec<u8> = (0..IMAGE_PIXELS * 3).map(|v| (v * 17) as u8).collect();

    let planes = split_interleaved(&buffer).unwrap();
    let merged = merge_interleaved([&planes[0], &planes[1], &planes[2]]);

    assert_eq!(buffer, merged);
    assert!(split_interleaved(&buffer[1..]).is_err());
}
