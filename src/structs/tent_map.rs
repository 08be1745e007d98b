/*---------------------------------------------------------------------------------------------
 *  Licensed under the Apache License, Version 2.0.
 *--------------------------------------------------------------------------------------------*/

use anyhow::Result;

use default_boxed::DefaultBoxed;

use crate::consts::{BLOCK_COUNT, TENT_MU, TENT_SCALE, TENT_SEED_1, TENT_SEED_2};
use crate::enabled_features::EnabledFeatures;
use crate::helpers::err_exit_code;
use crate::securevision_error::ExitCode;

// The scatter permutations are driven by the chaotic tent map
// x -> mu*x for x < 1/2, mu*(1-x) otherwise, sampled at 14 decimal digits
// and reduced mod BLOCK_COUNT. This is a deterministic collaborator: the
// same seed always yields the same permutation, unlike the uniform source
// that drives the share split.

/// the tent-map orbit for one seed, emitting one block index per step
pub struct TentMap {
    x: f64,
}

impl TentMap {
    pub fn new(seed: f64) -> Self {
        TentMap { x: seed }
    }

    /// advances the orbit one step and samples it as a block index
    #[inline(always)]
    pub fn next_index(&mut self) -> usize {
        if self.x < 0.5 {
            self.x = self.x * TENT_MU;
        } else {
            self.x = (1.0 - self.x) * TENT_MU;
        }

        return ((self.x * TENT_SCALE).round() as u64 % BLOCK_COUNT as u64) as usize;
    }
}

/// a permutation of the 16384 block positions in first-visit order of the
/// tent-map orbit
#[derive(DefaultBoxed)]
pub struct TentPermutation {
    forward: [u16; BLOCK_COUNT],
}

impl TentPermutation {
    /// Builds the permutation for the given seed by iterating the map and
    /// keeping each index the first time it appears. Both canonical seeds
    /// cover all positions within 150k iterations; the bound guards
    /// against a pathological seed whose orbit collapses.
    pub fn generate(seed: f64, max_iterations: u32) -> Result<Box<TentPermutation>> {
        let mut perm = TentPermutation::default_boxed();
        let mut seen = [false; BLOCK_COUNT];
        let mut map = TentMap::new(seed);
        let mut filled = 0;

        for _ in 0..max_iterations {
            let index = map.next_index();
            if !seen[index] {
                seen[index] = true;
                perm.forward[filled] = index as u16;
                filled += 1;

                if filled == BLOCK_COUNT {
                    return Ok(perm);
                }
            }
        }

        return err_exit_code(
            ExitCode::InternalInconsistency,
            "tent map failed to cover every block position",
        );
    }

    /// position that block `k` scatters to
    #[inline(always)]
    pub fn scatter(&self, k: usize) -> usize {
        usize::from(self.forward[k])
    }
}

/// the two canonical scatter permutations used by the recovery watermark
pub struct TentPermutations {
    pub pi1: Box<TentPermutation>,
    pub pi2: Box<TentPermutation>,
}

impl TentPermutations {
    pub fn generate(features: &EnabledFeatures) -> Result<Self> {
        return Ok(TentPermutations {
            pi1: TentPermutation::generate(TENT_SEED_1, features.max_tent_iterations)?,
            pi2: TentPermutation::generate(TENT_SEED_2, features.max_tent_iterations)?,
        });
    }
}
