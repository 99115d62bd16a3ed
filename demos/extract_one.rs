//! 1金融機関だけ取得・抽出して表示する（ストアには書き込まない）
//!
//! 実行方法:
//! ```
//! cargo run --example extract_one -- "Alliance Finance"
//! SCRAPER_HEADLESS=false cargo run --example extract_one -- "Commercial Bank"
//! ```

use fd_rates_scraper::config::load_env_file;
use fd_rates_scraper::{extract_records, institutions, Fetcher, ScraperConfig, SiteFetcher};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ログ設定
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    load_env_file(".env")?;

    let name = std::env::args()
        .nth(1)
        .ok_or("usage: extract_one <institution name>")?;
    let inst = institutions::find(&name).ok_or(format!("unknown institution: {}", name))?;

    // 認証情報は不要なので既定値に環境変数のブラウザ設定だけ反映
    let headless = std::env::var("SCRAPER_HEADLESS").map_or(true, |v| v != "false");
    let config = ScraperConfig::default()
        .with_headless(headless)
        .with_debug(std::env::var("SCRAPER_DEBUG").is_ok());

    println!("=== {} ===", inst.name);
    println!("URL: {}", inst.url);
    println!();

    let fetcher = SiteFetcher::new(&config)?;
    let raw = fetcher.fetch(inst.target()).await?;
    let records = extract_records(&inst, &raw)?;

    for record in &records {
        println!(
            "{:<16} {:>3}m {:<12} {:>6.2}% AER {}",
            record.product_variant,
            record.term_months,
            record.payout_schedule,
            record.nominal_rate,
            record
                .effective_rate
                .map_or_else(|| "-".to_string(), |aer| format!("{:.2}%", aer)),
        );
    }
    println!();
    println!("{} records", records.len());
    Ok(())
}
