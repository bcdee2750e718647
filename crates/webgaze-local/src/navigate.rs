use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, EventResponseReceived, ResourceType, SetCookiesParams,
};
use chromiumoxide::cdp::browser_protocol::page::EventLifecycleEvent;
use chromiumoxide::Page;
use futures::StreamExt;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;
use webgaze_core::heuristics::{
    BOT_CHALLENGE_SELECTORS, MIN_WORD_COUNT, SUSPICIOUS_TITLE_PHRASES,
};
use webgaze_core::urlcheck::is_valid_url;
use webgaze_core::{Error, Result};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);
const EVENT_DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

fn nav_timeout() -> Duration {
    // Requests can hang indefinitely without an explicit timeout; keep a
    // conservative cap even if the env override is huge.
    let ms = std::env::var("WEBGAZE_NAV_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(15_000)
        .clamp(1_000, 120_000);
    Duration::from_millis(ms)
}

/// Transient result of inspecting a loaded page. Consumed immediately by
/// [`PageAudit::validate`]; never persisted.
#[derive(Debug, Clone)]
pub struct PageAudit {
    pub title: String,
    pub word_count: usize,
    pub bot_challenge: bool,
    pub suspicious_title: bool,
}

impl PageAudit {
    /// Build an audit from page markup and its visible body text.
    pub fn inspect(html: &str, title: &str, body_text: &str) -> Self {
        Self {
            title: title.to_string(),
            word_count: body_text.split_whitespace().count(),
            bot_challenge: has_bot_challenge_markup(html),
            suspicious_title: has_suspicious_title(title),
        }
    }

    /// Accept or reject the page. Rejection order: bot markup, then
    /// suspicious title, then insufficient content.
    pub fn validate(&self) -> Result<()> {
        if self.bot_challenge {
            return Err(Error::BotProtection);
        }
        if self.suspicious_title {
            return Err(Error::SuspiciousTitle);
        }
        if self.word_count < MIN_WORD_COUNT {
            return Err(Error::InsufficientContent);
        }
        Ok(())
    }
}

fn has_bot_challenge_markup(html: &str) -> bool {
    let doc = Html::parse_document(html);
    BOT_CHALLENGE_SELECTORS.iter().any(|raw| {
        Selector::parse(raw)
            .map(|sel| doc.select(&sel).next().is_some())
            .unwrap_or(false)
    })
}

fn has_suspicious_title(title: &str) -> bool {
    let t = title.to_lowercase();
    SUSPICIOUS_TITLE_PHRASES.iter().any(|p| t.contains(p))
}

/// Drive the page to `url` and return its HTML, rejecting pages that look
/// bot-blocked or empty.
///
/// Per-call state machine: navigate (content loaded, 15 s cap), settle
/// (network idle raced against a 5 s timer), validate (bot markup,
/// suspicious title, word count). The three rejection errors propagate
/// verbatim; anything else is wrapped as a navigation failure.
pub async fn guarded_navigate(page: &Page, url: &str) -> Result<String> {
    if !is_valid_url(url) {
        return Err(Error::InvalidUrl(url.to_string()));
    }

    inject_consent_cookie(page).await?;

    let mut responses = page
        .event_listener::<EventResponseReceived>()
        .await
        .map_err(|e| Error::navigation(url, e.to_string()))?;

    let timeout = nav_timeout();
    let nav = async {
        page.goto(url)
            .await
            .map_err(|e| Error::navigation(url, e.to_string()))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| Error::navigation(url, e.to_string()))?;
        Ok::<(), Error>(())
    };
    match tokio::time::timeout(timeout, nav).await {
        Ok(r) => r?,
        Err(_) => {
            return Err(Error::navigation(
                url,
                format!("timed out after {}ms", timeout.as_millis()),
            ))
        }
    }

    // The handler buffers Network.responseReceived events during the load;
    // the last Document response carries the final status after redirects.
    let mut document_status: Option<i64> = None;
    loop {
        match tokio::time::timeout(EVENT_DRAIN_TIMEOUT, responses.next()).await {
            Ok(Some(ev)) => {
                if matches!(ev.r#type, ResourceType::Document) {
                    document_status = Some(ev.response.status);
                }
            }
            Ok(None) | Err(_) => break,
        }
    }
    match document_status {
        None => return Err(Error::navigation(url, "no response received")),
        Some(status) if status >= 400 => {
            return Err(Error::navigation(url, format!("HTTP status {status}")))
        }
        Some(status) => debug!(url, status, "navigation response received"),
    }

    settle(page).await;

    let title = page
        .get_title()
        .await
        .map_err(|e| Error::navigation(url, e.to_string()))?
        .unwrap_or_default();
    let body_text = page
        .evaluate("document.body ? document.body.innerText : ''")
        .await
        .map_err(|e| Error::navigation(url, e.to_string()))?
        .into_value::<String>()
        .unwrap_or_default();
    let html = page
        .content()
        .await
        .map_err(|e| Error::navigation(url, e.to_string()))?;

    let audit = PageAudit::inspect(&html, &title, &body_text);
    debug!(
        url,
        title = %audit.title,
        words = audit.word_count,
        "auditing navigated page"
    );
    audit.validate()?;

    Ok(html)
}

/// Wait for the network to quiet down, bounded to 5 seconds total.
///
/// The network-idle lifecycle wait is best-effort: whichever of it or the
/// unconditional timer resolves first wins.
async fn settle(page: &Page) {
    let idle = async {
        match page.event_listener::<EventLifecycleEvent>().await {
            Ok(mut events) => {
                while let Some(ev) = events.next().await {
                    if ev.name == "networkIdle" {
                        break;
                    }
                }
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    tokio::select! {
        _ = idle => {}
        _ = tokio::time::sleep(SETTLE_TIMEOUT) => {}
    }
}

/// Suppress Google's consent interstitial before navigating. A narrow,
/// call-specific workaround, not general cookie management.
async fn inject_consent_cookie(page: &Page) -> Result<()> {
    let cookie = CookieParam::builder()
        .name("CONSENT")
        .value("YES+")
        .domain(".google.com")
        .path("/")
        .build()
        .map_err(Error::Browser)?;
    page.execute(SetCookiesParams::new(vec![cookie]))
        .await
        .map_err(|e| Error::Browser(format!("consent cookie injection failed: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT_30_WORDS: &str = "one two three four five six seven eight nine ten \
        eleven twelve thirteen fourteen fifteen sixteen seventeen eighteen nineteen twenty \
        a b c d e f g h i j";

    #[test]
    fn bot_challenge_markup_rejects_regardless_of_content() {
        let html = r#"<html><body><div id="cf-challenge-running"></div><p>text</p></body></html>"#;
        let audit = PageAudit::inspect(html, "A perfectly fine title", CONTENT_30_WORDS);
        assert!(audit.bot_challenge);
        let err = audit.validate().unwrap_err();
        assert_eq!(err.to_string(), "Bot protection detected");
    }

    #[test]
    fn every_challenge_selector_is_detected() {
        for marker in [
            r#"<form id="challenge-form"></form>"#,
            r#"<div id="cf-challenge-running"></div>"#,
            r#"<form id="captcha-form"></form>"#,
            r#"<div class="g-recaptcha"></div>"#,
            r#"<div class="h-captcha"></div>"#,
        ] {
            let html = format!("<html><body>{marker}</body></html>");
            assert!(has_bot_challenge_markup(&html), "missed: {marker}");
        }
    }

    #[test]
    fn suspicious_title_rejects_before_word_count() {
        let audit = PageAudit::inspect(
            "<html><body></body></html>",
            "Just a Moment...",
            CONTENT_30_WORDS,
        );
        assert!(audit.suspicious_title);
        let err = audit.validate().unwrap_err();
        assert_eq!(err.to_string(), "Suspicious page title detected");
    }

    #[test]
    fn suspicious_title_match_is_case_insensitive_substring() {
        assert!(has_suspicious_title("SECURITY CHECK in progress"));
        assert!(has_suspicious_title("Cloudflare | Attention Required!"));
        assert!(!has_suspicious_title("Rust release notes"));
    }

    #[test]
    fn five_words_is_insufficient_content() {
        let audit = PageAudit::inspect("<html><body></body></html>", "ok", "one two three four five");
        assert_eq!(audit.word_count, 5);
        let err = audit.validate().unwrap_err();
        assert_eq!(err.to_string(), "Page contains insufficient content");
    }

    #[test]
    fn exactly_ten_words_is_accepted() {
        let audit = PageAudit::inspect(
            "<html><body></body></html>",
            "ok",
            "one two three four five six seven eight nine ten",
        );
        assert_eq!(audit.word_count, 10);
        assert!(audit.validate().is_ok());
    }

    #[test]
    fn bot_markup_takes_precedence_over_other_rejections() {
        let html = r#"<html><body><div class="g-recaptcha"></div></body></html>"#;
        let audit = PageAudit::inspect(html, "Please wait", "too short");
        let err = audit.validate().unwrap_err();
        assert_eq!(err.to_string(), "Bot protection detected");
    }
}
