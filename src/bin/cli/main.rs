//! CLI tool for volume-split streams.

mod commands;
mod exit_codes;
mod output;
mod password;

use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use commands::{JoinConfig, SplitConfig, UpdateConfig, parse_size};

/// Split files into fixed-size volumes and join them back
#[derive(Parser)]
#[command(name = "volsplit")]
#[command(author, version, about = "Split files into fixed-size volumes", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Suppress summary output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// env_logger-style filter string; overrides -v and RUST_LOG
    #[arg(long, global = true)]
    log_filter: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a file into volumes (alias: s)
    #[command(alias = "s")]
    Split {
        /// File to split
        input: PathBuf,

        /// Path of the first volume; later volumes get .2, .3, ...
        base: PathBuf,

        /// Volume capacity (K/M/G suffixes allowed, 0 = single volume)
        #[arg(short = 's', long, value_parser = parse_size, default_value = "0")]
        size: u64,

        /// Compress with LZMA2 at this preset (0-9)
        #[arg(short = 'l', long)]
        compress: Option<u32>,

        /// Encrypt with this passphrase
        #[arg(short = 'p', long, env = "VOLSPLIT_PASSPHRASE", hide_env_values = true)]
        passphrase: Option<String>,

        /// Prompt for a passphrase and encrypt
        #[arg(long)]
        encrypt: bool,
    },

    /// Join volumes back into a single file (alias: j)
    #[command(alias = "j")]
    Join {
        /// Path of the first volume
        base: PathBuf,

        /// File to write
        output: PathBuf,

        /// The volumes were written with --compress
        #[arg(long)]
        compressed: bool,

        /// Decrypt with this passphrase
        #[arg(short = 'p', long, env = "VOLSPLIT_PASSPHRASE", hide_env_values = true)]
        passphrase: Option<String>,

        /// Prompt for a passphrase and decrypt
        #[arg(long)]
        decrypt: bool,
    },

    /// Show the volume layout (alias: i)
    #[command(alias = "i")]
    Info {
        /// Path of the first volume
        base: PathBuf,
    },

    /// Grow or shrink a split stream to a given length
    Truncate {
        /// Path of the first volume
        base: PathBuf,

        /// New logical length (K/M/G suffixes allowed)
        #[arg(value_parser = parse_size)]
        length: u64,

        /// Capacity of any volume created while growing
        #[arg(short = 's', long, value_parser = parse_size, default_value = "0")]
        size: u64,

        /// Fill a partial last volume up to --size before creating new ones
        #[arg(long)]
        append_to_partial: bool,
    },

    /// Append a file to the end of a split stream (alias: a)
    #[command(alias = "a")]
    Append {
        /// File to append
        input: PathBuf,

        /// Path of the first volume
        base: PathBuf,

        /// Capacity of any volume created while appending
        #[arg(short = 's', long, value_parser = parse_size, default_value = "0")]
        size: u64,

        /// Fill a partial last volume up to --size before creating new ones
        #[arg(long)]
        append_to_partial: bool,
    },
}

fn init_logging(verbose: u8, filter: Option<&str>) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(level));
    if let Some(filter) = filter {
        builder.parse_filters(filter);
    }
    builder.format_timestamp(None);
    builder.init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_filter.as_deref());

    let exit_code = match cli.command {
        Commands::Split {
            input,
            base,
            size,
            compress,
            passphrase,
            encrypt,
        } => commands::split(&SplitConfig {
            input: &input,
            base: &base,
            volume_size: size,
            compress,
            passphrase,
            encrypt,
            quiet: cli.quiet,
        }),

        Commands::Join {
            base,
            output,
            compressed,
            passphrase,
            decrypt,
        } => commands::join(&JoinConfig {
            base: &base,
            output: &output,
            compressed,
            passphrase,
            decrypt,
            quiet: cli.quiet,
        }),

        Commands::Info { base } => commands::info(&base),

        Commands::Truncate {
            base,
            length,
            size,
            append_to_partial,
        } => commands::truncate(
            &UpdateConfig {
                base: &base,
                volume_size: size,
                append_to_partial,
                quiet: cli.quiet,
            },
            length,
        ),

        Commands::Append {
            input,
            base,
            size,
            append_to_partial,
        } => commands::append(
            &UpdateConfig {
                base: &base,
                volume_size: size,
                append_to_partial,
                quiet: cli.quiet,
            },
            &input,
        ),
    };

    std::process::exit(exit_code.code());
}
