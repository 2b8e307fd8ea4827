// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments and build the immutable ScanConfig
// 2. Download <domain>/robots.txt and extract the Disallow entries
// 3. Run the worker pool over every entry, saving the reachable ones
// 4. Print the summary (or JSON report) and write the success list
// 5. Exit with proper code (0 = scan done, 1 = --fail-fast tripped, 2 = error)
//
// Rust concepts used:
// - async/await: robots.txt and every entry are fetched over the network
// - Arc: the fetcher is shared between main and every pool worker
// - Result + ?: any setup failure bubbles up to main() and becomes exit 2
// - Generics: fetch_entries works with any Fetcher, so tests can mock it
// =============================================================================

// Module declarations - one per source file / directory under src/
mod cli;       // src/cli.rs - command-line parsing
mod config;    // src/config.rs - validated, immutable scan settings
mod error;     // src/error.rs - ScanError and TransportKind
mod fetch;     // src/fetch/ - the Fetcher trait and its reqwest implementation
mod logging;   // src/logging.rs - tracing subscriber setup
mod output;    // src/output/ - writing bodies and the success list
mod pipeline;  // src/pipeline/ - the producer/consumer worker pool
mod resource;  // src/resource.rs - a fetched URL with its streaming body
mod robots;    // src/robots/ - robots.txt parsing

// anyhow::Result lets run() return any error type with ?, and Context
// adds a human readable line on top of the original error
use anyhow::{anyhow, Context, Result};
use clap::Parser; // Parser trait enables Cli::parse()
use cli::Cli;
use config::ScanConfig;
use fetch::{Fetcher, HttpFetcher};
use output::FileWriter;
use pipeline::{Pipeline, ScanReport};
use robots::RobotsParser;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use url::Url;

// #[tokio::main] builds the multi-threaded runtime the worker pool runs on
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // A broken log filter should not stop the scan, so only report it
    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Error: {}", e);
    }

    std::process::exit(exit_code(run(cli).await));
}

// Maps the outcome of run() to the process exit code:
//   Ok(code) = the scan finished, code says whether --fail-fast tripped
//   Err      = configuration, robots.txt or output error, always 2
fn exit_code(outcome: Result<i32>) -> i32 {
    match outcome {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            error!("{:#}", e);
            2
        }
    }
}

// This is the main application logic
// Returns:
//   Ok(0) = scan completed (or nothing to scan)
//   Ok(1) = --fail-fast and at least one entry could not be fetched
//   Err   = the scan could not run at all
async fn run(cli: Cli) -> Result<i32> {
    // The banner would corrupt the JSON document on stdout
    if !cli.json {
        print_banner();
    }

    // Validated before any request goes out
    let config = ScanConfig::from_cli(&cli)?;
    // Arc so the same client (and its connection pool) is shared by the workers
    let fetcher = Arc::new(HttpFetcher::new(&config)?);

    info!("Starting scan for domain: {}", config.target());
    info!("Attempt to get the robot file at address: {}", config.robots_url());

    let entries = fetch_entries(fetcher.as_ref(), &config).await?;

    if entries.is_empty() {
        info!("The file doesn't contain any entry to scan, quitting.");
        if cli.json {
            print_results(&ScanReport::new(config.target().as_str(), Vec::new(), Default::default()), true)?;
        }
        return Ok(0);
    }

    let scan_dir = config.scan_dir();
    output::prepare_output_dir(&scan_dir)
        .await
        .with_context(|| format!("could not create output directory {}", scan_dir.display()))?;

    // Producers fetch, consumers write; see pipeline/pool.rs
    let writer = Arc::new(FileWriter::new(&scan_dir));
    let pipeline = Pipeline::new(fetcher, writer, &config);
    let report = pipeline.run(config.target().as_str(), entries).await;

    info!(
        "The scan has completed with {} error and {} success in {:.2?}.",
        report.error_count(),
        report.success_count(),
        report.elapsed
    );

    let list_path = config.success_list_path();
    output::write_success_list(&list_path, &report.found_urls())
        .await
        .with_context(|| format!("could not write {}", list_path.display()))?;
    info!("The resulting output file has been created at path: {}", list_path.display());

    print_results(&report, cli.json)?;

    // 404s and write failures never fail the run, only missing responses do
    let failures = report.transport_failures().count();
    if config.fail_fast() && failures > 0 {
        error!("{} entries could not be fetched, failing the run", failures);
        return Ok(1);
    }

    Ok(0)
}

// Downloads robots.txt through the fetcher and turns it into the entry list
//
// Returns:
//   Ok(entries) = robots.txt answered 200 and every entry parsed
//   Ok(empty)   = robots.txt answered anything else
//   Err         = no response at all, or a malformed entry
async fn fetch_entries<F: Fetcher>(fetcher: &F, config: &ScanConfig) -> Result<Vec<Url>> {
    // Same delivery path the pool uses: the fetcher hands the Resource to a sink
    let (tx, mut rx) = mpsc::channel(1);
    fetcher
        .fetch_into(config.robots_url(), &tx)
        .await
        .context("robots.txt download error")?;
    drop(tx);

    let robots = rx
        .recv()
        .await
        .ok_or_else(|| anyhow!("robots.txt download produced no result"))?;

    if !robots.found {
        warn!("robots.txt answered {}, nothing to scan", robots.status);
        // Releases the connection without reading the error page
        robots.body.close();
        return Ok(Vec::new());
    }

    // robots.txt is small, so it is read whole before parsing
    let body = robots
        .body
        .into_bytes()
        .await
        .context("robots.txt download error")?;

    let entries = RobotsParser::new(config.robots_url().clone())
        .parse(body.as_slice())
        .context("robots.txt file is invalid and can't be parsed")?;

    info!("The file has been found and properly parsed ({} entries).", entries.len());
    Ok(entries)
}

fn print_banner() {
    println!();
    println!("   |  |   ");
    println!("   \\**/    disallow-probe v{}", env!("CARGO_PKG_VERSION"));
    println!("  o={{}}=o   robots.txt disallowed path checker");
    println!(" / /()\\ \\");
    println!("   \\  /  ");
    println!();
}

// Prints results either as a table or JSON
fn print_results(report: &ScanReport, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{}", json_output);
    } else {
        print_table(report);
    }
    Ok(())
}

// Prints one row per entry, in robots.txt order, then the counts
fn print_table(report: &ScanReport) {
    println!("{:<60} {:<20}", "URL", "RESULT");
    println!("{}", "=".repeat(80));

    for entry in &report.entries {
        // Long URLs are cut so the columns stay aligned; URLs are ASCII
        // once serialized, so byte 57 is always a char boundary
        let url_display = if entry.url.len() > 57 {
            format!("{}...", &entry.url[..57])
        } else {
            entry.url.clone()
        };
        println!("{:<60} {:<20}", url_display, entry.status.to_string());
    }

    println!();
    println!("Summary:");
    println!("   Reachable: {}", report.success_count());
    println!("   Errors:    {}", report.error_count());
    println!("   Total:     {}", report.total());
    println!("   Elapsed:   {:.2?}", report.elapsed);
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does run() return Result<i32> instead of calling exit() itself?
//    - exit() skips destructors, so it is called exactly once, in main()
//    - run() stays testable: tests look at the value, not the process
//
// 2. What is F: Fetcher in fetch_entries?
//    - A generic parameter: any type implementing the Fetcher trait
//    - The real program passes HttpFetcher, tests pass a mock server URL
//
// 3. What does .context("...") do?
//    - Wraps the error with a message, keeping the original as its cause
//    - {:#} prints "message: cause: cause of cause" on one line
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ScanConfig {
        ScanConfig::new(&server.uri(), None, None).unwrap()
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::with_timeout(Duration::from_secs(5), None).unwrap()
    }

    async fn robots_server(response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_fetch_entries_found() {
        let server = robots_server(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /admin\nDisallow: /secret\n"),
        )
        .await;

        let entries = fetch_entries(&fetcher(), &config_for(&server)).await.unwrap();

        let entries: Vec<String> = entries.iter().map(Url::to_string).collect();
        assert_eq!(
            entries,
            vec![
                format!("{}/admin", server.uri()),
                format!("{}/secret", server.uri())
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_entries_missing_robots_is_empty() {
        let server = robots_server(
            ResponseTemplate::new(404).set_body_string("Disallow: /not-a-robots-file\n"),
        )
        .await;

        let entries = fetch_entries(&fetcher(), &config_for(&server)).await.unwrap();

        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_entries_malformed_body_fails() {
        let server = robots_server(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /%zz\n"),
        )
        .await;

        let err = fetch_entries(&fetcher(), &config_for(&server))
            .await
            .unwrap_err();

        let message = format!("{:#}", err);
        assert!(message.contains("can't be parsed"));
        assert!(message.contains("line 2"));
        assert_eq!(exit_code(Err(err)), 2);
    }

    #[tokio::test]
    async fn test_fetch_entries_unreachable_host_fails() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let config = ScanConfig::new(&format!("127.0.0.1:{}", port), None, None).unwrap();

        let err = fetch_entries(&fetcher(), &config).await.unwrap_err();

        assert!(format!("{:#}", err).contains("robots.txt download error"));
    }

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(exit_code(Ok(0)), 0);
        assert_eq!(exit_code(Ok(1)), 1);
        assert_eq!(exit_code(Err(anyhow!("boom"))), 2);
    }
}
