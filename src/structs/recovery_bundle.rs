/*---------------------------------------------------------------------------------------------
 *  Licensed under the Apache License, Version 2.0.
 *--------------------------------------------------------------------------------------------*/

use std::io::{Read, Write};

use anyhow::{Context, Result};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::consts::IMAGE_PIXELS;
use crate::helpers::{err_exit_code, here};
use crate::securevision_error::ExitCode;

use super::channel_codec::ChannelShares;
use super::channel_matrix::ChannelMatrix;

// Container for the full three-channel output (B, G, R order). Carrier
// shares are stored as little-endian u16 planes, weight maps as byte
// planes; the weight maps hold values in [0, 10] and compress very well,
// so the whole body goes through zlib.

const BUNDLE_MAGIC: [u8; 4] = *b"SVSH";
const BUNDLE_VERSION: u8 = 1;

pub fn write_bundle<W: Write>(writer: &mut W, shares: &[ChannelShares; 3]) -> Result<()> {
    writer.write_all(&BUNDLE_MAGIC).context(here!())?;
    writer.write_u8(BUNDLE_VERSION).context(here!())?;

    let mut encoder = ZlibEncoder::new(writer, Compression::default());

    for channel in shares {
        write_carrier(&mut encoder, &channel.carrier_1)?;
        write_carrier(&mut encoder, &channel.carrier_2)?;
        encoder.write_all(channel.weights_1.as_slice()).context(here!())?;
        encoder.write_all(channel.weights_2.as_slice()).context(here!())?;
    }

    encoder.finish().context(here!())?;

    return Ok(());
}

pub fn read_bundle<R: Read>(reader: &mut R) -> Result<[ChannelShares; 3]> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).context(here!())?;
    if magic != BUNDLE_MAGIC {
        return err_exit_code(ExitCode::BadBundleFormat, "bad magic number");
    }

    let version = reader.read_u8().context(here!())?;
    if version != BUNDLE_VERSION {
        return err_exit_code(ExitCode::BadBundleFormat, "unknown bundle version");
    }

    let mut decoder = ZlibDecoder::new(reader);

    let blue = read_channel(&mut decoder)?;
    let green = read_channel(&mut decoder)?;
    let red = read_channel(&mut decoder)?;

    return Ok([blue, green, red]);
}

fn read_channel<R: Read>(reader: &mut R) -> Result<ChannelShares> {
    return Ok(ChannelShares {
        carrier_1: read_carrier(reader)?,
        carrier_2: read_carrier(reader)?,
        weights_1: read_weights(reader)?,
        weights_2: read_weights(reader)?,
    });
}

fn write_carrier<W: Write>(writer: &mut W, carrier: &ChannelMatrix<u16>) -> Result<()> {
    if cfg!(target_endian = "little") {
        // stored format is the in-memory format, no conversion pass needed
        writer
            .write_all(bytemuck::cast_slice(carrier.as_slice()))
            .context(here!())?;
    } else {
        for &v in carrier.as_slice() {
            writer.write_u16::<LittleEndian>(v).context(here!())?;
        }
    }

    return Ok(());
}

fn read_carrier<R: Read>(reader: &mut R) -> Result<ChannelMatrix<u16>> {
    let mut bytes = vec![0u8; IMAGE_PIXELS * 2];
    reader.read_exact(&mut bytes).context(here!())?;

    let mut values = vec![0u16; IMAGE_PIXELS];
    LittleEndian::read_u16_into(&bytes, &mut values);

    return ChannelMatrix::from_raw(values);
}

fn read_weights<R: Read>(reader: &mut R) -> Result<ChannelMatrix<u8>> {
    let mut bytes = vec![0u8; IMAGE_PIXELS];
    reader.read_exact(&mut bytes).context(here!())?;

    return ChannelMatrix::from_raw(bytes);
}
