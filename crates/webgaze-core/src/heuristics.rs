//! Fixed heuristic tables shared by the navigation guard, the content
//! extractor, and search classification.
//!
//! These are deliberately coarse; they mirror the interstitials and page
//! shapes seen in the wild rather than attempting anything adaptive.

/// DOM markers of known anti-automation interstitials.
pub const BOT_CHALLENGE_SELECTORS: [&str; 5] = [
    "#challenge-form",
    "#cf-challenge-running",
    "#captcha-form",
    ".g-recaptcha",
    ".h-captcha",
];

/// Case-insensitive substrings of "please wait / security check" titles.
pub const SUSPICIOUS_TITLE_PHRASES: [&str; 5] = [
    "just a moment",
    "please wait",
    "security check",
    "attention required",
    "access denied",
];

/// Probed in order; the first match wins.
pub const MAIN_CONTENT_SELECTORS: [&str; 8] = [
    "main",
    "article",
    "[role=\"main\"]",
    "#content",
    ".content",
    ".main",
    ".post",
    ".article",
];

/// Stripped from the body copy before full-document extraction.
pub const NOISE_SELECTORS: [&str; 14] = [
    "header",
    "footer",
    "nav",
    "aside",
    ".sidebar",
    ".menu",
    ".advertisement",
    ".ads",
    ".ad",
    ".cookie-banner",
    ".cookie-notice",
    ".popup",
    ".social-share",
    ".comments",
];

/// Accepted pages must carry at least this many whitespace-delimited words.
pub const MIN_WORD_COUNT: usize = 10;

pub const TECHNOLOGY_KEYWORDS: [&str; 9] = [
    "api",
    "sdk",
    "code",
    "programming",
    "software",
    "developer",
    "rust",
    "python",
    "javascript",
];

pub const DOCUMENTATION_KEYWORDS: [&str; 6] = [
    "docs",
    "documentation",
    "guide",
    "tutorial",
    "reference",
    "manual",
];
