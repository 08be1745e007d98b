/*---------------------------------------------------------------------------------------------
 *  Licensed under the Apache License, Version 2.0.
 *--------------------------------------------------------------------------------------------*/

pub mod channel_codec;
pub mod channel_matrix;
pub mod detection_watermark;
pub mod embedder;
pub mod extractor;
pub mod pob;
pub mod recovery_bundle;
pub mod recovery_watermark;
pub mod share_splitter;
pub mod tent_map;
