/*---------------------------------------------------------------------------------------------
 *  Licensed under the Apache License, Version 2.0.
 *--------------------------------------------------------------------------------------------*/

/// Options that control how far the receiver goes when shares disagree.
#[derive(Debug, Clone)]
pub struct EnabledFeatures {
    /// compare the extracted detection watermark against one recomputed
    /// from the extracted share and flag mismatching blocks
    pub verify_detection_watermark: bool,

    /// fill flagged blocks with the gray tile recovered from the other share
    pub repair_tampered_blocks: bool,

    /// upper bound on tent-map iterations before the permutation builder
    /// gives up (both canonical seeds finish in under 150k iterations)
    pub max_tent_iterations: u32,
}

impl Default for EnabledFeatures {
    fn default() -> Self {
        EnabledFeatures {
            verify_detection_watermark: true,
            repair_tampered_blocks: true,
            max_tent_iterations: 1 << 22,
        }
    }
}

impl EnabledFeatures {
    /// extraction only: recombine whatever the shares hold without
    /// looking at the watermarks
    pub fn extract_only() -> Self {
        EnabledFeatures {
            verify_detection_watermark: false,
            repair_tampered_blocks: false,
            max_tent_iterations: 1 << 22,
        }
    }
}
