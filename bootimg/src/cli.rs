//! Command line interface for nezha-bootimg

use crate::profile::BoardProfile;
use crate::zimage::{ZImageMode, build_zimage};
use crate::{BootImage, BootImageBuilder, VERSION};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{LevelFilter, debug, info};
use std::path::{Path, PathBuf};

const EXAMPLES: &str = "\
Examples:
  building boot.img from zImage:
    nezha-bootimg build -i zImage -o my_boot.img

  building boot.img from vmlinux:
    nezha-bootimg build -l -i vmlinux -o my_boot.img

  dumping boot.img info:
    nezha-bootimg dump -i boot.img

  extracting zImage from a boot.img:
    nezha-bootimg extract -i boot.img -o extracted_zImage";

/// Command line arguments for nezha-bootimg
#[derive(Parser, Debug)]
#[command(name = "nezha-bootimg")]
#[command(version = VERSION)]
#[command(about = "boot.img utility for Allwinner D1 Nezha", long_about = None)]
#[command(after_help = EXAMPLES)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode - only output errors; `build` skips its dump report
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a boot.img from a zImage or vmlinux
    Build(BuildArgs),
    /// Print the header fields of a boot.img
    Dump(DumpArgs),
    /// Extract the zImage from a boot.img
    Extract(ExtractArgs),
    /// Check the id stored in a boot.img against its contents
    Verify(VerifyArgs),
}

#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Input kernel file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output boot.img
    #[arg(short, long)]
    pub output: PathBuf,

    /// Kernel command line
    #[arg(short, long, default_value = "")]
    pub cmdline: String,

    /// Converts a vmlinux image to zImage before creating the boot.img
    #[arg(short = 'l', long)]
    pub vmlinux: bool,

    /// Rebuild the zImage around the .text fingerprint instead of patching
    /// the first instruction (experimental)
    #[arg(long, requires = "vmlinux")]
    pub anchor_scan: bool,

    /// TOML board profile overriding addresses, page size and image name
    #[arg(long)]
    pub profile: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct DumpArgs {
    /// boot.img to examine
    #[arg(short, long)]
    pub input: PathBuf,

    /// Print in JSON format
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// boot.img to read
    #[arg(short, long)]
    pub input: PathBuf,

    /// Where to write the zImage
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// boot.img to verify
    #[arg(short, long)]
    pub input: PathBuf,
}

/// Install the stderr logger at the level selected by `-v`/`-q`
pub fn init_logger(args: &Args) {
    let level = if args.quiet {
        LevelFilter::Error
    } else if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let _ = simple_logger::SimpleLogger::new()
        .with_level(level)
        .without_timestamps()
        .init();
}

/// Main CLI handler
pub fn run_cli(args: Args) -> Result<()> {
    let quiet = args.quiet;
    match args.command {
        Commands::Build(build_args) => handle_build(build_args, quiet),
        Commands::Dump(dump_args) => handle_dump(dump_args),
        Commands::Extract(extract_args) => handle_extract(extract_args, quiet),
        Commands::Verify(verify_args) => handle_verify(verify_args, quiet),
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))
}

fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    std::fs::write(path, data).with_context(|| format!("failed to write '{}'", path.display()))
}

fn handle_build(args: BuildArgs, quiet: bool) -> Result<()> {
    let profile = match &args.profile {
        Some(path) => {
            debug!("loading board profile from {}", path.display());
            BoardProfile::from_file(path)?
        }
        None => BoardProfile::default(),
    };

    let mut kernel = read_input(&args.input)?;
    info!("kernel loaded: {} bytes", kernel.len());

    if args.vmlinux {
        let mode = if args.anchor_scan {
            ZImageMode::AnchorScan
        } else {
            ZImageMode::Patch
        };
        info!("converting vmlinux to zImage ({mode:?})");
        kernel = build_zimage(&kernel, mode)?;
    }

    let image = BootImageBuilder::new()
        .profile(profile)
        .cmdline(args.cmdline)
        .kernel(kernel)
        .build()
        .context("failed to build boot image")?;

    write_output(&args.output, &image)?;

    if quiet {
        return Ok(());
    }

    eprintln!(
        "{} {} ({} bytes)",
        "Boot image created:".green(),
        args.output.display(),
        image.len()
    );

    handle_dump(DumpArgs {
        input: args.output,
        json: false,
    })
}

fn handle_dump(args: DumpArgs) -> Result<()> {
    let data = read_input(&args.input)?;
    let image = BootImage::parse(&data)
        .with_context(|| format!("failed to parse '{}'", args.input.display()))?;
    let report = image.header().report();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("boot img: {}", args.input.display());
        println!("{report}");
    }

    Ok(())
}

fn handle_extract(args: ExtractArgs, quiet: bool) -> Result<()> {
    let data = read_input(&args.input)?;
    let kernel = BootImage::parse(&data)
        .and_then(|image| image.extract_kernel())
        .with_context(|| format!("failed to extract kernel from '{}'", args.input.display()))?;

    write_output(&args.output, &kernel)?;

    if !quiet {
        eprintln!(
            "{} {} ({} bytes)",
            "Kernel extracted:".green(),
            args.output.display(),
            kernel.len()
        );
    }
    Ok(())
}

fn handle_verify(args: VerifyArgs, quiet: bool) -> Result<()> {
    let data = read_input(&args.input)?;
    let image = BootImage::parse(&data)
        .with_context(|| format!("failed to parse '{}'", args.input.display()))?;
    image.verify()?;

    if !quiet {
        println!("Image id verification successful");
    }
    Ok(())
}
