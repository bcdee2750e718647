use scraper::{Html, Selector};
use webgaze_core::{Error, Result, SafeSearch, SearchHit, SearchOptions, SearchProvider};

const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const SEARCH_TIMEOUT_MS: u64 = 20_000;

pub fn ddg_endpoint_from_env() -> Option<String> {
    std::env::var("WEBGAZE_DDG_ENDPOINT")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// DuckDuckGo's `kp` safe-search parameter.
fn kp_code(level: SafeSearch) -> &'static str {
    match level {
        SafeSearch::Off => "-2",
        SafeSearch::Moderate => "-1",
        SafeSearch::Strict => "1",
    }
}

#[derive(Debug, Clone)]
pub struct DuckDuckGoProvider {
    client: reqwest::Client,
}

impl DuckDuckGoProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn endpoint() -> String {
        ddg_endpoint_from_env().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }
}

#[async_trait::async_trait]
impl SearchProvider for DuckDuckGoProvider {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchHit>> {
        let resp = self
            .client
            .post(Self::endpoint())
            .form(&[
                ("q", query),
                ("kl", options.region.as_str()),
                ("kp", kp_code(options.safe_search)),
            ])
            .header("Accept", "text/html")
            .timeout(std::time::Duration::from_millis(SEARCH_TIMEOUT_MS))
            .send()
            .await
            .map_err(|e| Error::Search(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Search(format!("duckduckgo search HTTP {status}")));
        }

        let body = resp.text().await.map_err(|e| Error::Search(e.to_string()))?;
        Ok(parse_results(&body, options.count))
    }
}

/// Parse DuckDuckGo's HTML results page.
///
/// Runs synchronously because `scraper::Html` is `!Send` and must not live
/// across an await point.
pub(crate) fn parse_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let doc = Html::parse_document(html);
    let (Ok(result_sel), Ok(link_sel), Ok(snippet_sel)) = (
        Selector::parse(".result"),
        Selector::parse("a.result__a"),
        Selector::parse("a.result__snippet, .result__snippet"),
    ) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for result in doc.select(&result_sel) {
        if out.len() >= max_results {
            break;
        }
        let Some(link) = result.select(&link_sel).next() else {
            continue;
        };
        let title = link.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }
        let url = extract_ddg_url(link.value().attr("href").unwrap_or(""));
        if !url.starts_with("http") {
            continue;
        }
        let description = result
            .select(&snippet_sel)
            .next()
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default()
            .trim()
            .to_string();
        out.push(SearchHit {
            title,
            url,
            description,
        });
    }
    out
}

/// DDG wraps result URLs in redirect links like
/// `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...`.
/// Extract and percent-decode the actual destination.
fn extract_ddg_url(href: &str) -> String {
    if let Some(pos) = href.find("uddg=") {
        let start = pos + 5;
        let end = href[start..]
            .find('&')
            .map(|i| start + i)
            .unwrap_or(href.len());
        let encoded = &href[start..end];
        if !encoded.is_empty() {
            if let Ok(decoded) = urlencoding::decode(encoded) {
                return decoded.into_owned();
            }
        }
    }
    href.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-global; hold a lock for the full test so the
    // endpoint-override tests cannot race each other.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    struct EnvGuard {
        _lock: std::sync::MutexGuard<'static, ()>,
        k: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(k: &'static str, v: &str) -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            let prev = std::env::var(k).ok();
            std::env::set_var(k, v);
            Self {
                _lock: lock,
                k,
                prev,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(v) = self.prev.take() {
                std::env::set_var(self.k, v);
            } else {
                std::env::remove_var(self.k);
            }
        }
    }

    const FIXTURE: &str = r##"
    <html><body>
      <div class="result">
        <h2><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fdocs%2F&rut=abc">Example Docs</a></h2>
        <a class="result__snippet" href="#">Reference documentation for Example.</a>
      </div>
      <div class="result">
        <h2><a class="result__a" href="https://blog.example.org/post">A Post</a></h2>
        <div class="result__snippet">Long-form writing.</div>
      </div>
      <div class="result">
        <h2><a class="result__a" href="javascript:void(0)">Junk</a></h2>
      </div>
    </body></html>
    "##;

    #[test]
    fn parses_results_and_decodes_redirect_urls() {
        let hits = parse_results(FIXTURE, 50);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Example Docs");
        assert_eq!(hits[0].url, "https://example.com/docs/");
        assert_eq!(hits[0].description, "Reference documentation for Example.");
        assert_eq!(hits[1].url, "https://blog.example.org/post");
    }

    #[test]
    fn respects_the_result_cap() {
        let hits = parse_results(FIXTURE, 1);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn empty_and_resultless_pages_parse_to_nothing() {
        assert!(parse_results("", 10).is_empty());
        assert!(parse_results("<html><body><p>no hits</p></body></html>", 10).is_empty());
    }

    #[test]
    fn extract_ddg_url_passes_plain_urls_through() {
        assert_eq!(
            extract_ddg_url("https://example.com/a"),
            "https://example.com/a"
        );
        assert_eq!(
            extract_ddg_url("//duckduckgo.com/l/?uddg=https%3A%2F%2Fa.b%2Fc&rut=x"),
            "https://a.b/c"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn searches_against_a_local_fixture_endpoint() {
        use axum::{routing::post, Router};

        let app = Router::new().route(
            "/html/",
            post(|| async { ([("content-type", "text/html")], FIXTURE) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("axum serve");
        });

        let _g = EnvGuard::set("WEBGAZE_DDG_ENDPOINT", &format!("http://{addr}/html/"));
        let provider = DuckDuckGoProvider::new(reqwest::Client::new());
        let hits = provider
            .search("example docs", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://example.com/docs/");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn http_errors_surface_as_search_failures() {
        use axum::{http::StatusCode, routing::post, Router};

        let app = Router::new().route(
            "/html/",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("axum serve");
        });

        let _g = EnvGuard::set("WEBGAZE_DDG_ENDPOINT", &format!("http://{addr}/html/"));
        let provider = DuckDuckGoProvider::new(reqwest::Client::new());
        let err = provider
            .search("example", &SearchOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("429"));
    }
}
