//! 定期預金金利の一括取得・公開
//!
//! 実行方法:
//! ```
//! cargo run --bin fd-rates                      # 全金融機関
//! cargo run --bin fd-rates -- "DFCC Bank" "LOLC Finance"
//! cargo run --bin fd-rates -- --list
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use fd_rates_scraper::config::load_env_file;
use fd_rates_scraper::{
    institutions, select_jobs, ConfigError, FetchMode, JobOutcome, Orchestrator, RunSummary,
    ScraperConfig, SiteFetcher, SupabaseStore,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // ログ設定
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--list") {
        print_registry();
        return ExitCode::SUCCESS;
    }

    match run(&args).await {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Configuration error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(names: &[String]) -> Result<RunSummary, ConfigError> {
    // .envがあれば読み込む
    match load_env_file(".env") {
        Ok(0) => {}
        Ok(count) => info!("Loaded {} variables from .env", count),
        Err(e) => warn!("Could not read .env: {}", e),
    }

    let config = ScraperConfig::from_env()?;
    let jobs = select_jobs(names)?;

    let fetcher = Arc::new(SiteFetcher::new(&config)?);
    let store = Arc::new(SupabaseStore::new(&config)?);

    let orchestrator = Orchestrator::new(&config, fetcher, store);
    orchestrator.run_all(jobs).await
}

fn print_registry() {
    for inst in institutions::all() {
        let mode = match inst.fetch {
            FetchMode::Http => "http",
            FetchMode::Browser(_) => "browser",
        };
        println!("{:<30} {:<16} {:<8} {}", inst.name, inst.category, mode, inst.url);
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("=== Results ===");
    for result in &summary.results {
        match &result.outcome {
            JobOutcome::Success { report, .. } => println!(
                "SUCCESS {:<30} {:>4} records (replaced {})",
                result.institution_name, result.record_count, report.deleted
            ),
            JobOutcome::Failure { kind, message } => println!(
                "FAILED  {:<30} {:?}: {}",
                result.institution_name, kind, message
            ),
        }
    }
    println!();
    println!(
        "{} of {} institutions updated, {} failed",
        summary.succeeded,
        summary.total(),
        summary.failed
    );
    if !summary.log_flushed {
        println!("Warning: run log was not written");
    }
}
