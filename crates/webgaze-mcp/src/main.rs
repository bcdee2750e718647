use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "webgaze")]
#[command(about = "Browser-backed web tools (MCP stdio server)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as an MCP stdio server (for Cursor / MCP clients).
    #[cfg(feature = "stdio")]
    McpStdio,
    /// Diagnose configuration/launch issues (json; no secrets).
    Doctor(DoctorCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct DoctorCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[cfg(feature = "stdio")]
mod mcp {
    use rmcp::{
        handler::server::router::tool::ToolRouter as RmcpToolRouter,
        handler::server::wrapper::Parameters,
        model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
        tool, tool_handler, tool_router,
        transport::stdio,
        ErrorData as McpError, ServiceExt,
    };
    use schemars::JsonSchema;
    use serde::Deserialize;
    use std::sync::Arc;
    use webgaze_core::retry::{with_retry, RetryPolicy};
    use webgaze_core::urlcheck::is_valid_url;
    use webgaze_core::{
        Error as WebgazeError, SafeSearch, SearchOptions, SearchProvider, SearchResponse,
    };
    use webgaze_local::extract::extract_markdown;
    use webgaze_local::{BrowserSession, DuckDuckGoProvider};

    #[path = "envelope.rs"]
    mod envelope;
    use envelope::{invalid_params, normalize};

    fn tool_result(payload: serde_json::Value) -> CallToolResult {
        // Structured content for machine consumers, plus a serialized text
        // fallback for clients that only read `content[0].text`.
        let mut r = CallToolResult::structured(payload.clone());
        r.content = vec![Content::text(payload.to_string())];
        r
    }

    fn iso_timestamp() -> String {
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }

    #[derive(Debug, Deserialize, JsonSchema, Default)]
    struct SearchArgs {
        /// Search query (required).
        #[serde(default)]
        query: Option<String>,
        /// Region code (default: "zh-cn").
        #[serde(default)]
        region: Option<String>,
        /// Safe-search level. Allowed: off, moderate, strict (default: moderate).
        #[serde(default)]
        safe_search: Option<String>,
        /// Max results (default: 50; clamped to 1..=50).
        #[serde(default)]
        count: Option<usize>,
    }

    #[derive(Debug, Deserialize, JsonSchema, Default)]
    struct VisitPageArgs {
        /// Absolute http/https URL to visit (required).
        #[serde(default)]
        url: Option<String>,
        /// If true, also capture a screenshot of the landed page.
        #[serde(default)]
        take_screenshot: Option<bool>,
    }

    #[derive(Debug, Deserialize, JsonSchema, Default)]
    struct TakeScreenshotArgs {}

    #[derive(Debug)]
    struct SearchParams {
        query: String,
        options: SearchOptions,
    }

    #[derive(Debug)]
    struct VisitParams {
        url: String,
        take_screenshot: bool,
    }

    /// Pure validation: raw search arguments to typed parameters, or a
    /// validation failure before any search is attempted.
    fn validate_search_args(args: SearchArgs) -> Result<SearchParams, WebgazeError> {
        let query = args.query.unwrap_or_default();
        if query.trim().is_empty() {
            return Err(WebgazeError::InvalidParams(
                "query must be non-empty".to_string(),
            ));
        }
        let safe_search = match args.safe_search.as_deref() {
            None => SafeSearch::Moderate,
            Some(raw) => SafeSearch::parse(raw).ok_or_else(|| {
                WebgazeError::InvalidParams(
                    "safe_search must be one of: off, moderate, strict".to_string(),
                )
            })?,
        };
        let region = args
            .region
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "zh-cn".to_string());
        let count = args.count.unwrap_or(50).clamp(1, 50);
        Ok(SearchParams {
            query,
            options: SearchOptions {
                region,
                safe_search,
                count,
            },
        })
    }

    /// Pure validation: raw visit arguments to typed parameters, or a
    /// validation failure before any navigation is attempted.
    fn validate_visit_args(args: VisitPageArgs) -> Result<VisitParams, WebgazeError> {
        let url = args.url.unwrap_or_default();
        if !is_valid_url(&url) {
            return Err(WebgazeError::InvalidUrl(url));
        }
        Ok(VisitParams {
            url,
            take_screenshot: args.take_screenshot.unwrap_or(false),
        })
    }

    #[derive(Clone)]
    pub(crate) struct WebgazeMcp {
        tool_router: RmcpToolRouter<Self>,
        session: Arc<BrowserSession>,
        provider: Arc<DuckDuckGoProvider>,
    }

    #[tool_router]
    impl WebgazeMcp {
        pub(crate) fn new() -> Result<Self, McpError> {
            let http = reqwest::Client::builder()
                .user_agent("webgaze-mcp/0.1")
                .build()
                .map_err(|e| McpError::internal_error(e.to_string(), None))?;
            Ok(Self {
                tool_router: Self::tool_router(),
                session: Arc::new(BrowserSession::new()),
                provider: Arc::new(DuckDuckGoProvider::new(http)),
            })
        }

        #[tool(description = "Search DuckDuckGo and return classified results with metadata as JSON")]
        async fn search_duckduckgo(
            &self,
            params: Parameters<Option<SearchArgs>>,
        ) -> Result<CallToolResult, McpError> {
            let args = params.0.unwrap_or_default();
            let p = validate_search_args(args).map_err(invalid_params)?;
            tracing::debug!(query = %p.query, "search_duckduckgo");

            let provider = self.provider.clone();
            let hits = with_retry(RetryPolicy::default(), || {
                provider.search(&p.query, &p.options)
            })
            .await
            .map_err(normalize)?;

            let response = SearchResponse::assemble(&p.query, &p.options, hits, iso_timestamp());
            let payload = serde_json::to_value(&response)
                .map_err(|e| McpError::internal_error(e.to_string(), None))?;
            Ok(tool_result(payload))
        }

        #[tool(description = "Visit an http/https URL and return the page content as Markdown")]
        async fn visit_page(
            &self,
            params: Parameters<Option<VisitPageArgs>>,
        ) -> Result<CallToolResult, McpError> {
            let args = params.0.unwrap_or_default();
            let p = validate_visit_args(args).map_err(invalid_params)?;
            tracing::debug!(url = %p.url, screenshot = p.take_screenshot, "visit_page");

            let session = self.session.clone();
            let outcome = with_retry(RetryPolicy::default(), || {
                session.visit(&p.url, p.take_screenshot)
            })
            .await
            .map_err(normalize)?;

            let markdown = extract_markdown(&outcome.html, None);
            let mut contents = vec![Content::text(markdown)];
            if let Some(png) = outcome.screenshot {
                contents.push(Content::image(png, "image/png"));
            }
            Ok(CallToolResult::success(contents))
        }

        #[tool(description = "Screenshot whatever page is currently loaded in the shared browser session")]
        async fn take_screenshot(
            &self,
            _params: Parameters<Option<TakeScreenshotArgs>>,
        ) -> Result<CallToolResult, McpError> {
            let png = self.session.screenshot().await.map_err(normalize)?;
            Ok(CallToolResult::success(vec![Content::image(
                png,
                "image/png",
            )]))
        }
    }

    #[tool_handler]
    impl rmcp::ServerHandler for WebgazeMcp {
        fn get_info(&self) -> ServerInfo {
            ServerInfo {
                instructions: Some(
                    "Web search, page visiting, and screenshots over one shared headless browser session."
                        .to_string(),
                ),
                capabilities: ServerCapabilities::builder().enable_tools().build(),
                ..Default::default()
            }
        }
    }

    pub(crate) async fn serve_stdio() -> Result<(), McpError> {
        let svc = WebgazeMcp::new()?;
        let session = svc.session.clone();
        let running = svc
            .serve(stdio())
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        // Keep the stdio server alive until the client closes or we get an
        // interrupt; either way the browser is torn down before exit.
        tokio::select! {
            r = running.waiting() => {
                r.map_err(|e| McpError::internal_error(e.to_string(), None))?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupt received, shutting down");
            }
        }
        session.close().await;
        Ok(())
    }

}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    // Logs go to stderr so stdout stays protocol-clean for the stdio server.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_doctor(args: DoctorCmd) {
    let env_override = std::env::var("WEBGAZE_BROWSER_BIN")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let detected = webgaze_local::session::detect_browser();
    let ddg_override = webgaze_local::duckduckgo::ddg_endpoint_from_env();
    let nav_timeout_override = std::env::var("WEBGAZE_NAV_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok());

    let ok = detected.is_some();
    let v = serde_json::json!({
        "schema_version": 1,
        "kind": "doctor",
        "ok": ok,
        "name": "webgaze",
        "version": env!("CARGO_PKG_VERSION"),
        "browser": {
            "env_override": env_override,
            "detected": detected.as_ref().map(|p| p.display().to_string()),
        },
        "search": {
            "ddg_endpoint_override": ddg_override.as_deref(),
        },
        "nav_timeout_ms_override": nav_timeout_override,
    });
    match args.output.to_ascii_lowercase().as_str() {
        "text" => {
            println!("webgaze {}", env!("CARGO_PKG_VERSION"));
            println!("checks:");
            match detected {
                Some(p) => println!("  browser: ok ({})", p.display()),
                None => println!("  browser: missing (set WEBGAZE_BROWSER_BIN or install Chromium)"),
            }
            match ddg_override {
                Some(ep) => println!("  ddg_endpoint: override ({ep})"),
                None => println!("  ddg_endpoint: default"),
            }
        }
        _ => println!("{}", v),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        #[cfg(feature = "stdio")]
        Commands::McpStdio => {
            mcp::serve_stdio().await?;
        }
        Commands::Doctor(args) => {
            run_doctor(args);
        }
        Commands::Version(args) => {
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "version",
                "ok": true,
                "name": "webgaze",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => println!("webgaze {}", env!("CARGO_PKG_VERSION")),
                _ => println!("{}", v),
            }
        }
    }
    Ok(())
}
