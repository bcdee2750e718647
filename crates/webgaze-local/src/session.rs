use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::EnableParams as NetworkEnableParams;
use chromiumoxide::cdp::browser_protocol::page::SetLifecycleEventsEnabledParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use webgaze_core::{Error, Result};

use crate::navigate;
use crate::screenshot::{self, PageTarget};

fn browser_bin_from_env() -> Option<String> {
    std::env::var("WEBGAZE_BROWSER_BIN")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Locate the browser binary without launching it: the env override first,
/// then chromiumoxide's platform detection. Used by `webgaze doctor`.
pub fn detect_browser() -> Option<std::path::PathBuf> {
    if let Some(bin) = browser_bin_from_env() {
        return Some(std::path::PathBuf::from(bin));
    }
    chromiumoxide::detection::default_executable(chromiumoxide::detection::DetectionOptions::default())
        .ok()
}

struct SessionState {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

/// Result of a guarded page visit.
#[derive(Debug, Clone)]
pub struct VisitOutcome {
    pub html: String,
    /// Base64 PNG, present when a screenshot was requested.
    pub screenshot: Option<String>,
}

/// The single shared browser session: at most one live Chromium process and
/// one live page per server instance.
///
/// The async mutex is the explicit mutual-exclusion guard around session
/// use; it is held for the duration of each visit/screenshot so calls do
/// not race on the page handle. The browser launches lazily on first use
/// and is torn down by [`BrowserSession::close`]. A page is never exposed
/// without a live browser backing it.
pub struct BrowserSession {
    state: Mutex<Option<SessionState>>,
}

impl Default for BrowserSession {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserSession {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(None),
        }
    }

    /// Navigate to `url` through the guard and extract the page HTML,
    /// optionally capturing a size-reduced screenshot of the landed page.
    pub async fn visit(&self, url: &str, take_screenshot: bool) -> Result<VisitOutcome> {
        let mut guard = self.state.lock().await;
        let state = ensure_launched(&mut guard).await?;
        let html = navigate::guarded_navigate(&state.page, url).await?;
        let screenshot = if take_screenshot {
            let mut target = PageTarget::new(&state.page);
            Some(screenshot::capture_reduced(&mut target).await?)
        } else {
            None
        };
        Ok(VisitOutcome { html, screenshot })
    }

    /// Capture a size-reduced screenshot of whatever page is currently
    /// loaded (a blank page if nothing has been visited yet).
    pub async fn screenshot(&self) -> Result<String> {
        let mut guard = self.state.lock().await;
        let state = ensure_launched(&mut guard).await?;
        let mut target = PageTarget::new(&state.page);
        screenshot::capture_reduced(&mut target).await
    }

    /// Tear down the browser process if one is running. Idempotent.
    pub async fn close(&self) {
        let mut guard = self.state.lock().await;
        if let Some(mut state) = guard.take() {
            info!("closing browser session");
            if let Err(e) = state.browser.close().await {
                warn!("error closing browser: {e}");
            }
            let _ = state.browser.wait().await;
            state.handler_task.abort();
        }
    }
}

async fn ensure_launched(slot: &mut Option<SessionState>) -> Result<&mut SessionState> {
    if slot.is_none() {
        *slot = Some(launch().await?);
    }
    match slot {
        Some(state) => Ok(state),
        None => Err(Error::Browser("browser state missing after launch".to_string())),
    }
}

async fn launch() -> Result<SessionState> {
    info!("launching headless browser");

    let mut builder = BrowserConfig::builder()
        .no_sandbox()
        .arg("--disable-gpu")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-extensions")
        .window_size(1600, 900);
    if let Some(bin) = browser_bin_from_env() {
        builder = builder.chrome_executable(bin);
    }
    let config = builder.build().map_err(Error::Browser)?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .map_err(|e| Error::Browser(format!("failed to launch browser: {e}")))?;

    // The handler task pumps CDP messages; the browser is unusable without it.
    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                debug!("cdp handler event loop ended");
                break;
            }
        }
    });

    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| Error::Browser(format!("failed to create page: {e}")))?;

    // Network + lifecycle events feed the navigation guard's status and
    // settle checks.
    page.execute(NetworkEnableParams::default())
        .await
        .map_err(|e| Error::Browser(format!("failed to enable network events: {e}")))?;
    page.execute(SetLifecycleEventsEnabledParams::new(true))
        .await
        .map_err(|e| Error::Browser(format!("failed to enable lifecycle events: {e}")))?;

    info!("headless browser ready");
    Ok(SessionState {
        browser,
        page,
        handler_task,
    })
}
