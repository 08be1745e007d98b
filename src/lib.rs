/*---------------------------------------------------------------------------------------------
 *  Licensed under the Apache License, Version 2.0.
 *--------------------------------------------------------------------------------------------*/

//! Visual secret sharing with tamper recovery for 256x256 images.
//!
//! A cover image is converted into two noise-like carrier shares plus a
//! small recovery bundle of weight maps. Either share alone reveals
//! nothing; both together reconstruct the cover exactly. Detection
//! watermarks embedded in each share locate tampered 2x2 blocks, and
//! scattered recovery watermarks approximate their content from the
//! intact share.

mod consts;
mod helpers;
mod structs;

pub mod enabled_features;
pub mod securevision_error;

use anyhow::{Context, Result};

use crate::consts::IMAGE_PIXELS;
use crate::enabled_features::EnabledFeatures;
use crate::helpers::err_exit_code;
use crate::securevision_error::ExitCode;

pub use crate::structs::channel_codec::{
    decrypt_channel, encrypt_channel, ChannelShares, RecoveredChannel,
};
pub use crate::structs::channel_matrix::{block_origin, ChannelMatrix};
pub use crate::structs::extractor::{extract_share, recombine, ExtractedShare};
pub use crate::structs::pob::{pob_decode, pob_encode};
pub use crate::structs::recovery_bundle::{read_bundle, write_bundle};
pub use crate::structs::share_splitter::{split_channel, SplitShares};
pub use crate::structs::tent_map::{TentPermutation, TentPermutations};

/// Encrypts the three channels of a 256x256 image, each on its own task.
/// The channels are a fixed ordered triple in B, G, R order. The share
/// split draws fresh process randomness, so two calls on the same image
/// produce different shares; the scatter permutations are deterministic
/// and shared by all three channels.
pub fn encrypt_image(
    channels: &[ChannelMatrix<u8>; 3],
    features: &EnabledFeatures,
) -> Result<[ChannelShares; 3]> {
    let perms = TentPermutations::generate(features).context(crate::here!())?;

    return run_channel_tasks(|index| {
        let mut rng = rand::thread_rng();
        encrypt_channel(&channels[index], &mut rng, &perms)
    });
}

/// decrypts all three channels in parallel; see `decrypt_channel`
pub fn decrypt_image(
    shares: &[ChannelShares; 3],
    features: &EnabledFeatures,
) -> Result<[RecoveredChannel; 3]> {
    let perms = TentPermutations::generate(features).context(crate::here!())?;

    return run_channel_tasks(|index| decrypt_channel(&shares[index], &perms, features));
}

/// runs one closure per color channel, on the rayon pool when the
/// use_rayon feature is enabled, otherwise on scoped threads
fn run_channel_tasks<T, F>(f: F) -> Result<[T; 3]>
where
    T: Send,
    F: Fn(usize) -> Result<T> + Sync,
{
    let mut slots: [Option<Result<T>>; 3] = [None, None, None];

    #[cfg(not(feature = "use_rayon"))]
    std::thread::scope(|s| {
        let mut handles = Vec::with_capacity(3);
        for index in 0..3 {
            let f = &f;
            handles.push(s.spawn(move || f(index)));
        }

        for (slot, handle) in slots.iter_mut().zip(handles) {
            *slot = Some(match handle.join() {
                Ok(r) => r,
                Err(_) => err_exit_code(ExitCode::AssertionFailure, "channel worker panicked"),
            });
        }
    });

    #[cfg(feature = "use_rayon")]
    rayon_core::scope(|s| {
        for (index, slot) in slots.iter_mut().enumerate() {
            let f = &f;
            s.spawn(move |_| *slot = Some(f(index)));
        }
    });

    let [blue, green, red] = slots;

    return Ok([blue.unwrap()?, green.unwrap()?, red.unwrap()?]);
}

/// splits an interleaved 256x256x3 pixel buffer into its three planes
pub fn split_interleaved(buffer: &[u8]) -> Result<[ChannelMatrix<u8>; 3]> {
    if buffer.len() != IMAGE_PIXELS * 3 {
        return err_exit_code(
            ExitCode::InvalidDimensions,
            "image buffer is not 256x256x3",
        );
    }

    let mut planes = [
        ChannelMatrix::new(),
        ChannelMatrix::new(),
        ChannelMatrix::new(),
    ];

    for pos in 0..IMAGE_PIXELS {
        for c in 0..3 {
            planes[c].as_mut_slice()[pos] = buffer[pos * 3 + c];
        }
    }

    return Ok(planes);
}

/// inverse of `split_interleaved`
pub fn merge_interleaved(planes: [&ChannelMatrix<u8>; 3]) -> Vec<u8> {
    let mut buffer = vec![0u8; IMAGE_PIXELS * 3];

    for pos in 0..IMAGE_PIXELS {
        for c in 0..3 {
            buffer[pos * 3 + c] = planes[c].as_slice()[pos];
        }
    }

    return buffer;
}
