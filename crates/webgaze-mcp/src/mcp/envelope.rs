use rmcp::ErrorData as McpError;
use webgaze_core::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidParams,
    InvalidUrl,
    NavigationFailed,
    PageRejected,
    SearchFailed,
    BrowserError,
    ScreenshotOversized,
}

impl ErrorCode {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::InvalidParams => "invalid_params",
            Self::InvalidUrl => "invalid_url",
            Self::NavigationFailed => "navigation_failed",
            Self::PageRejected => "page_rejected",
            Self::SearchFailed => "search_failed",
            Self::BrowserError => "browser_error",
            Self::ScreenshotOversized => "screenshot_oversized",
        }
    }

    pub(crate) fn retryable(self) -> bool {
        match self {
            Self::NavigationFailed | Self::SearchFailed => true,
            // Rejections, terminal resource failures, and invalid input are
            // not retryable without changing something.
            Self::InvalidParams
            | Self::InvalidUrl
            | Self::PageRejected
            | Self::BrowserError
            | Self::ScreenshotOversized => false,
        }
    }
}

pub(crate) fn code_for(e: &Error) -> ErrorCode {
    match e {
        Error::InvalidUrl(_) => ErrorCode::InvalidUrl,
        Error::InvalidParams(_) => ErrorCode::InvalidParams,
        Error::BotProtection | Error::SuspiciousTitle | Error::InsufficientContent => {
            ErrorCode::PageRejected
        }
        Error::Navigation { .. } => ErrorCode::NavigationFailed,
        Error::Search(_) => ErrorCode::SearchFailed,
        Error::Browser(_) => ErrorCode::BrowserError,
        Error::ScreenshotOversized => ErrorCode::ScreenshotOversized,
    }
}

/// Shortcut for validation failures detected before any side-effecting work.
pub(crate) fn invalid_params(e: Error) -> McpError {
    McpError::invalid_params(e.to_string(), None)
}

/// Normalize a component failure to the protocol error shape at the
/// dispatcher boundary. Validation failures stay invalid-params; everything
/// else becomes an internal "tool execution failed" error carrying the
/// original message and a stable code.
pub(crate) fn normalize(e: Error) -> McpError {
    match e {
        Error::InvalidUrl(_) | Error::InvalidParams(_) => invalid_params(e),
        other => {
            let code = code_for(&other);
            McpError::internal_error(
                format!("tool execution failed: {other}"),
                Some(serde_json::json!({
                    "code": code.as_str(),
                    "retryable": code.retryable(),
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_normalize_to_invalid_params() {
        let e = normalize(Error::InvalidUrl("ftp://x".to_string()));
        assert_eq!(e.code, McpError::invalid_params("", None).code);
        assert!(e.message.contains("invalid url"));
    }

    #[test]
    fn component_errors_become_internal_with_prefix_and_code() {
        let e = normalize(Error::BotProtection);
        assert_eq!(e.code, McpError::internal_error("", None).code);
        assert_eq!(e.message, "tool execution failed: Bot protection detected");
        let data = e.data.expect("data");
        assert_eq!(data["code"], "page_rejected");
        assert_eq!(data["retryable"], false);
    }

    #[test]
    fn navigation_and_search_failures_are_marked_retryable() {
        assert!(code_for(&Error::navigation("https://x", "HTTP status 503")).retryable());
        assert!(code_for(&Error::Search("timeout".to_string())).retryable());
        assert!(!code_for(&Error::ScreenshotOversized).retryable());
    }
}
