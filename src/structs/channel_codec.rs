/*---------------------------------------------------------------------------------------------
 *  Licensed under the Apache License, Version 2.0.
 *--------------------------------------------------------------------------------------------*/

use anyhow::{Context, Result};

use log::{info, warn};
use rand::Rng;

use crate::enabled_features::EnabledFeatures;
use crate::helpers::here;

use super::channel_matrix::ChannelMatrix;
use super::detection_watermark::detection_watermark;
use super::embedder::embed_share;
use super::extractor::{
    extract_share, find_tampered_blocks, gray_from_code, recombine, unscatter_recovery,
};
use super::recovery_watermark::recovery_watermark;
use super::share_splitter::split_channel;
use super::tent_map::TentPermutations;

/// the complete output of encrypting one channel: two carrier shares plus
/// the two weight maps that travel out of band as the recovery bundle
pub struct ChannelShares {
    pub carrier_1: ChannelMatrix<u16>,
    pub carrier_2: ChannelMatrix<u16>,
    pub weights_1: ChannelMatrix<u8>,
    pub weights_2: ChannelMatrix<u8>,
}

/// one decrypted channel together with what the watermarks had to say
pub struct RecoveredChannel {
    /// the recombined channel; flagged blocks are replaced by their
    /// recovered gray tiles when repair is enabled
    pub image: ChannelMatrix<u8>,

    /// blocks of share 1 whose detection watermark did not verify
    pub tampered_1: Vec<u32>,

    /// same for share 2
    pub tampered_2: Vec<u32>,
}

/// Runs the full per-channel pipeline: POB split, share-specific detection
/// watermarks, scattered recovery watermarks of the original channel, and
/// the POB(10) embedding of both siblings.
pub fn encrypt_channel<R: Rng>(
    channel: &ChannelMatrix<u8>,
    rng: &mut R,
    perms: &TentPermutations,
) -> Result<ChannelShares> {
    let shares = split_channel(channel, rng);

    let detection_1 = detection_watermark(&shares.index_1);
    let detection_2 = detection_watermark(&shares.index_2);

    let (recovery_1, recovery_2) = recovery_watermark(channel, perms);

    let (carrier_1, weights_1) =
        embed_share(&shares.index_1, &shares.weight_1, &detection_1, &recovery_1)
            .context(here!())?;
    let (carrier_2, weights_2) =
        embed_share(&shares.index_2, &shares.weight_2, &detection_2, &recovery_2)
            .context(here!())?;

    info!("channel encrypted into two carrier shares");

    return Ok(ChannelShares {
        carrier_1,
        carrier_2,
        weights_1,
        weights_2,
    });
}

/// Inverts the pipeline: extracts both carrier shares, recombines the
/// sibling planes, and optionally verifies the detection watermarks and
/// repairs flagged blocks from the other share's scattered mean codes.
pub fn decrypt_channel(
    shares: &ChannelShares,
    perms: &TentPermutations,
    features: &EnabledFeatures,
) -> Result<RecoveredChannel> {
    let extracted_1 = extract_share(&shares.carrier_1, &shares.weights_1).context(here!())?;
    let extracted_2 = extract_share(&shares.carrier_2, &shares.weights_2).context(here!())?;

    let mut image = recombine(&extracted_1.plain, &extracted_2.plain);

    let (tampered_1, tampered_2) = if features.verify_detection_watermark {
        (
            find_tampered_blocks(&extracted_1),
            find_tampered_blocks(&extracted_2),
        )
    } else {
        (Vec::new(), Vec::new())
    };

    if !tampered_1.is_empty() || !tampered_2.is_empty() {
        warn!(
            "detection watermark mismatch on {0} blocks of share 1, {1} of share 2",
            tampered_1.len(),
            tampered_2.len()
        );

        if features.repair_tampered_blocks {
            // each share's damage is approximated from the scattered mean
            // codes held by the other, intact share
            let means_from_2 = unscatter_recovery(&extracted_2.recovery, &perms.pi2);
            let means_from_1 = unscatter_recovery(&extracted_1.recovery, &perms.pi1);

            for &bpos in &tampered_1 {
                let gray = gray_from_code(means_from_2[bpos as usize]);
                image.set_block(bpos as usize, [gray; 4]);
            }

            for &bpos in &tampered_2 {
                let gray = gray_from_code(means_from_1[bpos as usize]);
                image.set_block(bpos as usize, [gray; 4]);
            }
        }
    }

    return Ok(RecoveredChannel {
        image,
        tampered_1,
        tampered_2,
    });
}
