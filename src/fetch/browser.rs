use std::fmt::Display;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::{BrowserStep, RawDocument};
use crate::config::ScraperConfig;
use crate::error::FetchError;

/// 要素表示のポーリング間隔（ミリ秒）
const VISIBILITY_POLL_MS: u64 = 250;
/// Clickステップで要素の表示を待つ上限（秒）
const CLICK_WAIT_SECS: u64 = 20;
/// 終了処理でプロセスの終了を待つ上限（秒）。超えたら強制終了する
const SHUTDOWN_WAIT_SECS: u64 = 10;

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// ブラウザでページを描画してマークアップを取得する
///
/// 取得ごとに独立したブラウザ（専用のユーザーデータディレクトリ）を起動し、
/// 成否に関わらず必ず終了させる。
#[derive(Debug, Clone)]
pub struct BrowserFetcher {
    headless: bool,
    debug: bool,
    timeout: Duration,
    chrome_path: Option<PathBuf>,
}

impl BrowserFetcher {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            headless: config.headless,
            debug: config.debug,
            timeout: config.browser_timeout,
            chrome_path: config.chrome_path.clone(),
        }
    }

    pub async fn render(
        &self,
        url: &str,
        steps: &[BrowserStep],
    ) -> Result<RawDocument, FetchError> {
        let session = BrowserSession::launch(self).await?;

        let result = self.render_in(&session, url, steps).await;

        session.shutdown().await;
        result
    }

    async fn render_in(
        &self,
        session: &BrowserSession,
        url: &str,
        steps: &[BrowserStep],
    ) -> Result<RawDocument, FetchError> {
        let page = session
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::BrowserInit(e.to_string()))?;

        info!("Navigating to {}", url);
        tokio::time::timeout(self.timeout, page.goto(url))
            .await
            .map_err(|_| {
                FetchError::Timeout(format!(
                    "navigation to {} exceeded {}s",
                    url,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| FetchError::Navigation(format!("{}: {}", url, e)))?;

        for step in steps {
            debug!("Browser step: {:?}", step);
            match *step {
                BrowserStep::WaitVisible {
                    selector,
                    text,
                    timeout,
                } => self.wait_visible(&page, selector, text, timeout).await?,
                BrowserStep::Click { selector, text } => {
                    self.wait_visible(&page, selector, text, Duration::from_secs(CLICK_WAIT_SECS))
                        .await?;
                    click(&page, selector, text).await?;
                }
                BrowserStep::Pause(duration) => sleep(duration).await,
            }
        }

        let html = page
            .content()
            .await
            .map_err(|e| FetchError::Navigation(format!("could not read rendered markup: {}", e)))?;

        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }

        info!("Rendered {} ({} bytes)", url, html.len());
        Ok(RawDocument::new(url, html))
    }

    /// 要素が表示されるまでポーリングする
    async fn wait_visible(
        &self,
        page: &Page,
        selector: &str,
        text: Option<&str>,
        timeout: Duration,
    ) -> Result<(), FetchError> {
        let script = visibility_script(selector, text);
        let start = Instant::now();

        loop {
            let visible = page
                .evaluate(script.as_str())
                .await
                .map(|v| v.into_value::<bool>().unwrap_or(false))
                .unwrap_or(false);

            if visible {
                debug!("{} visible after {:?}", selector, start.elapsed());
                return Ok(());
            }

            if start.elapsed() > timeout {
                if self.debug {
                    self.log_screenshot(page).await;
                }
                return Err(FetchError::Timeout(format!(
                    "{} not visible after {}s",
                    describe(selector, text),
                    timeout.as_secs()
                )));
            }

            sleep(Duration::from_millis(VISIBILITY_POLL_MS)).await;
        }
    }

    async fn log_screenshot(&self, page: &Page) {
        match page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
        {
            Ok(screenshot) => {
                use base64::Engine;
                let encoded = base64::engine::general_purpose::STANDARD.encode(&screenshot);
                debug!("Timeout screenshot: data:image/png;base64,{}", encoded);
            }
            Err(e) => debug!("Failed to capture screenshot: {}", e),
        }
    }
}

async fn click(page: &Page, selector: &str, text: Option<&str>) -> Result<(), FetchError> {
    let clicked = page
        .evaluate(click_script(selector, text).as_str())
        .await
        .map_err(|e| {
            FetchError::Navigation(format!("click on {}: {}", describe(selector, text), e))
        })?
        .into_value::<bool>()
        .unwrap_or(false);

    if !clicked {
        return Err(FetchError::ElementNotFound(describe(selector, text)));
    }
    Ok(())
}

fn describe(selector: &str, text: Option<&str>) -> String {
    match text {
        Some(text) => format!("{} containing {:?}", selector, text),
        None => selector.to_string(),
    }
}

fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

fn js_text_filter(text: Option<&str>) -> String {
    text.map(js_string).unwrap_or_else(|| "null".to_string())
}

fn visibility_script(selector: &str, text: Option<&str>) -> String {
    format!(
        r#"
        (() => {{
            const text = {text};
            return Array.from(document.querySelectorAll({selector})).some(el => {{
                if (text !== null && !(el.textContent || '').includes(text)) return false;
                const style = window.getComputedStyle(el);
                const rect = el.getBoundingClientRect();
                return style.display !== 'none' &&
                       style.visibility !== 'hidden' &&
                       (rect.width > 0 || rect.height > 0);
            }});
        }})()
        "#,
        text = js_text_filter(text),
        selector = js_string(selector),
    )
}

fn click_script(selector: &str, text: Option<&str>) -> String {
    format!(
        r#"
        (() => {{
            const text = {text};
            const target = Array.from(document.querySelectorAll({selector}))
                .find(el => text === null || (el.textContent || '').includes(text));
            if (!target) return false;
            target.scrollIntoView({{ block: 'center' }});
            target.click();
            return true;
        }})()
        "#,
        text = js_text_filter(text),
        selector = js_string(selector),
    )
}

/// 1回の取得専用のブラウザプロセス
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: PathBuf,
}

impl BrowserSession {
    async fn launch(fetcher: &BrowserFetcher) -> Result<Self, FetchError> {
        // ユニークなユーザーデータディレクトリを生成
        let unique_id = format!(
            "{}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
            SESSION_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        let user_data_dir = std::env::temp_dir().join(format!("fd-rates-{}", unique_id));

        let mut builder = BrowserConfig::builder()
            .user_data_dir(&user_data_dir)
            .window_size(1366, 900)
            .request_timeout(fetcher.timeout);

        if let Some(path) = &fetcher.chrome_path {
            builder = builder.chrome_executable(path);
        }
        if !fetcher.headless {
            builder = builder.with_head();
        }

        builder = builder
            .no_sandbox()
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        if fetcher.debug {
            builder = builder.arg("--enable-logging=stderr").arg("--v=1");
        }

        let config = builder.build().map_err(FetchError::BrowserInit)?;

        let (browser, mut handler) = match Browser::launch(config).await {
            Ok(launched) => launched,
            Err(e) => {
                remove_dir(&user_data_dir);
                return Err(FetchError::BrowserInit(e.to_string()));
            }
        };

        // ハンドラータスクを起動
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {:?}", e);
                }
            }
        });

        debug!("Browser launched with profile {:?}", user_data_dir);
        Ok(Self {
            browser,
            handler,
            user_data_dir,
        })
    }

    /// ブラウザを終了しプロファイルを削除する（エラーはログのみ）
    ///
    /// closeが失敗した場合や終了待ちが上限を超えた場合はプロセスを強制終了する。
    async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser, killing process: {}", e);
            self.kill().await;
        }
        let limit = Duration::from_secs(SHUTDOWN_WAIT_SECS);
        if !wait_for_exit(self.browser.wait(), limit).await {
            warn!("Browser did not exit within {}s, killing process", SHUTDOWN_WAIT_SECS);
            self.kill().await;
        }
        self.handler.abort();
        remove_dir(&self.user_data_dir);
        debug!("Browser session torn down");
    }

    async fn kill(&mut self) {
        match self.browser.kill().await {
            Some(Ok(())) => debug!("Browser process killed"),
            Some(Err(e)) => warn!("Failed to kill browser: {}", e),
            None => debug!("No browser process to kill"),
        }
    }
}

/// 終了待ちを上限付きで行う。上限内に終わればtrue（待機自体の失敗も含む）
async fn wait_for_exit<F, T, E>(exit: F, limit: Duration) -> bool
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(limit, exit).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!("Failed to wait for browser exit: {}", e);
            true
        }
        Err(_) => false,
    }
}

fn remove_dir(path: &Path) {
    if let Err(e) = std::fs::remove_dir_all(path) {
        debug!("Failed to remove browser profile {:?}: {}", path, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_quote_selector_and_text() {
        let script = visibility_script(r#"a:has-text("x")"#, Some("Fixed \"Deposits\""));
        assert!(script.contains(r#"document.querySelectorAll("a:has-text(\"x\")")"#));
        assert!(script.contains(r#"const text = "Fixed \"Deposits\"";"#));

        let script = click_script("a.expand-link", None);
        assert!(script.contains("const text = null;"));
        assert!(script.contains(r#"querySelectorAll("a.expand-link")"#));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_exit_is_bounded() {
        let limit = Duration::from_secs(SHUTDOWN_WAIT_SECS);

        let hung = futures::future::pending::<Result<(), std::io::Error>>();
        let started = tokio::time::Instant::now();
        assert!(!wait_for_exit(hung, limit).await);
        assert!(started.elapsed() >= limit);

        assert!(wait_for_exit(async { Ok::<_, std::io::Error>(()) }, limit).await);
        let failed = async { Err::<(), _>(std::io::Error::other("no child")) };
        assert!(wait_for_exit(failed, limit).await);
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe("h2#cRate", None), "h2#cRate");
        assert_eq!(
            describe("a.expand-link", Some("Fixed Deposits")),
            r#"a.expand-link containing "Fixed Deposits""#
        );
    }
}
