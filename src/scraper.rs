//! Headless-browser page rendering for sources that populate client-side.
//!
//! All browser work is blocking and runs on the blocking thread pool. Errors
//! stay `anyhow` inside this module; adapters classify them into the crate
//! taxonomy. The browser and tab live in a guard that releases them on every
//! exit path, success or failure.

use anyhow::{anyhow, Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ScraperConfig;
use crate::proxy::ProxySession;

#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub url: String,
    /// Selector list that must appear before the page counts as loaded.
    pub wait_for: String,
    pub proxy: Option<ProxySession>,
}

/// Renders a page to its post-navigation HTML snapshot.
#[derive(Clone)]
pub struct PageRenderer {
    config: ScraperConfig,
}

impl PageRenderer {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    /// Navigate with the bounded retry policy, wait for the readiness
    /// selectors, apply the settle delay, and return the rendered document.
    pub async fn render(&self, request: RenderRequest) -> Result<String> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || render_page(&config, &request))
            .await
            .map_err(|e| anyhow!("render task failed: {e}"))?
    }
}

fn render_page(config: &ScraperConfig, request: &RenderRequest) -> Result<String> {
    let session = BrowserSession::launch(config, request.proxy.as_ref())?;

    let backoff = Duration::from_millis(config.retry_backoff_ms);
    let mut attempt = 1;
    loop {
        debug!(url = %request.url, attempt, "navigation attempt");
        match session.try_navigate(config, request) {
            Ok(()) => break,
            Err(e) if attempt >= config.navigation_retries => {
                return Err(e.context(format!(
                    "navigation failed after {} attempts",
                    config.navigation_retries
                )));
            }
            Err(e) => {
                warn!(url = %request.url, attempt, error = %e, "navigation attempt failed");
                std::thread::sleep(backoff);
                attempt += 1;
            }
        }
    }

    // Let client-side content populate before snapshotting
    std::thread::sleep(Duration::from_secs(config.settle_delay_secs));

    session.content()
}

/// Browser plus tab for one scrape attempt. Dropping the guard closes the
/// tab and tears down the browser process exactly once, on every exit path.
struct BrowserSession {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl BrowserSession {
    fn launch(config: &ScraperConfig, proxy: Option<&ProxySession>) -> Result<Self> {
        let proxy_arg = proxy.map(|p| format!("--proxy-server={}", p.server_url()));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-setuid-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-gpu"),
        ];
        if let Some(arg) = proxy_arg.as_deref() {
            args.push(OsStr::new(arg));
        }

        let mut launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .args(args)
            .build()
            .map_err(|e| anyhow!("Failed to create launch options: {e}"))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(std::path::PathBuf::from(chrome_path));
        }

        let browser = Browser::new(launch_options).context("Failed to launch browser")?;
        let tab = browser.new_tab().context("Failed to create tab")?;

        tab.set_default_timeout(Duration::from_secs(config.navigation_timeout_secs));
        tab.set_user_agent(&config.user_agent, None, None)
            .context("Failed to set user agent")?;

        if let Some(p) = proxy {
            tab.authenticate(Some(p.username.clone()), Some(p.password.clone()))
                .context("Failed to set proxy credentials")?;
        }

        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    fn try_navigate(&self, config: &ScraperConfig, request: &RenderRequest) -> Result<()> {
        self.tab
            .navigate_to(&request.url)
            .with_context(|| format!("Navigation to {} failed", request.url))?;
        self.tab
            .wait_until_navigated()
            .context("Page load failed")?;
        self.tab
            .wait_for_element_with_custom_timeout(
                &request.wait_for,
                Duration::from_secs(config.selector_wait_secs),
            )
            .with_context(|| format!("Wait for selector '{}' failed", request.wait_for))?;
        Ok(())
    }

    fn content(&self) -> Result<String> {
        self.tab.get_content().context("Failed to get page content")
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // Tab close may fail if the browser already went away; the browser
        // process itself is reaped when `_browser` drops.
        let _ = self.tab.close(true);
    }
}
