// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Usage: disallow-probe [--proxy ADDR] [--output NAME] [--workers N]
//                       [--output-dir DIR] [--fail-fast] [--json] DOMAIN
//
// The parsed values are turned into a ScanConfig (src/config.rs) right
// after parsing; nothing else in the program reads the Cli struct.
// =============================================================================

use crate::config::DEFAULT_WORKERS;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "disallow-probe",
    version,
    about = "Checks whether the paths a robots.txt disallows are publicly reachable",
    long_about = "disallow-probe downloads a site's robots.txt, extracts every 'Disallow: /' entry \
                  and requests each one. Paths that answer 200 are saved under the output directory."
)]
pub struct Cli {
    /// Target domain (e.g. example.com or https://example.com)
    ///
    /// http:// is assumed when no scheme is given
    pub domain: String,

    /// Full address of the proxy server to use: [address:port]
    #[arg(long)]
    pub proxy: Option<String>,

    /// Name for the scan output (default: the target host)
    #[arg(long)]
    pub output: Option<String>,

    /// Directory that holds all scan output (default: ./output)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Maximum number of concurrent requests
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Exit with status 1 if any entry could not be fetched at all
    #[arg(long)]
    pub fail_fast: bool,

    /// Print the scan report as JSON instead of a summary
    #[arg(long)]
    pub json: bool,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
