/*---------------------------------------------------------------------------------------------
 *  Licensed under the Apache License, Version 2.0.
 *--------------------------------------------------------------------------------------------*/

// Command line utility around the library. Operates on raw 256x256x3
// interleaved pixel buffers (B, G, R order); decoding image file formats
// is the caller's business.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{info, warn};
use simple_logger::SimpleLogger;

use securevision::enabled_features::EnabledFeatures;
use securevision::here;
use securevision::securevision_error::exit_code_from_error;
use securevision::{
    decrypt_image, encrypt_image, merge_interleaved, read_bundle, split_interleaved, write_bundle,
};

const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

fn print_usage() {
    println!("securevision_util {0}", GIT_VERSION);
    println!();
    println!("usage:");
    println!("  securevision_util encrypt <input.bgr> <output.svsh>");
    println!("  securevision_util decrypt <input.svsh> <output.bgr>");
    println!();
    println!("options:");
    println!("  -v, --verbose     log pipeline stages");
    println!("  --extract-only    recombine the shares without touching the watermarks");
    println!("  --no-verify       skip detection watermark verification");
    println!("  --no-repair       flag tampered blocks but do not repair them");
    println!("  --high-priority   raise thread priority for stable timings");
}

fn main() {
    match main_with_result() {
        Ok(_) => {}
        Err(e) => {
            eprintln!("error: {0:#}", e);
            std::process::exit(exit_code_from_error(&e).as_i32());
        }
    }
}

fn main_with_result() -> Result<()> {
    let mut args = pico_args::Arguments::from_env();

    if args.contains(["-h", "--help"]) {
        print_usage();
        return Ok(());
    }

    let verbose = args.contains(["-v", "--verbose"]);
    SimpleLogger::new()
        .with_level(if verbose {
            log::LevelFilter::Info
        } else {
            log::LevelFilter::Warn
        })
        .init()
        .context(here!())?;

    let mut features = if args.contains("--extract-only") {
        EnabledFeatures::extract_only()
    } else {
        EnabledFeatures::default()
    };
    if args.contains("--no-verify") {
        features.verify_detection_watermark = false;
    }
    if args.contains("--no-repair") {
        features.repair_tampered_blocks = false;
    }

    let high_priority = args.contains("--high-priority");

    #[cfg(any(target_os = "linux", target_os = "windows"))]
    if high_priority {
        if thread_priority::set_current_thread_priority(thread_priority::ThreadPriority::Max)
            .is_err()
        {
            warn!("could not raise thread priority");
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    if high_priority {
        warn!("--high-priority is not supported on this platform");
    }

    let command: String = match args.opt_free_from_str().context(here!())? {
        Some(c) => c,
        None => {
            print_usage();
            std::process::exit(1);
        }
    };
    let input: PathBuf = args.free_from_str().context("missing input path")?;
    let output: PathBuf = args.free_from_str().context("missing output path")?;

    let remaining = args.finish();
    if !remaining.is_empty() {
        warn!("ignoring extra arguments: {0:?}", remaining);
    }

    info!("securevision_util {0}", GIT_VERSION);

    #[cfg(any(target_os = "linux", target_os = "windows"))]
    let cpu_start = cpu_time::ProcessTime::try_now().ok();

    let wall_start = Instant::now();

    match command.as_str() {
        "encrypt" => {
            let buffer = std::fs::read(&input).context(here!())?;
            let planes = split_interleaved(&buffer)?;

            let shares = encrypt_image(&planes, &features)?;

            let mut writer = BufWriter::new(File::create(&output).context(here!())?);
            write_bundle(&mut writer, &shares)?;
            writer.flush().context(here!())?;
        }
        "decrypt" => {
            let mut reader = BufReader::new(File::open(&input).context(here!())?);
            let shares = read_bundle(&mut reader)?;

            let recovered = decrypt_image(&shares, &features)?;

            for (channel, name) in recovered.iter().zip(["blue", "green", "red"]) {
                if !channel.tampered_1.is_empty() || !channel.tampered_2.is_empty() {
                    println!(
                        "{0}: {1} tampered blocks in share 1, {2} in share 2",
                        name,
                        channel.tampered_1.len(),
                        channel.tampered_2.len()
                    );
                }
            }

            let buffer = merge_interleaved([
                &recovered[0].image,
                &recovered[1].image,
                &recovered[2].image,
            ]);
            std::fs::write(&output, buffer).context(here!())?;
        }
        _ => {
            print_usage();
            std::process::exit(1);
        }
    }

    info!("{0} took {1:?}", command, wall_start.elapsed());

    #[cfg(any(target_os = "linux", target_os = "windows"))]
    if let Some(start) = cpu_start {
        info!("cpu time {0:?}", start.elapsed());
    }

    return Ok(());
}
