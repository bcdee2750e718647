use crate::heuristics::{DOCUMENTATION_KEYWORDS, TECHNOLOGY_KEYWORDS};
use crate::ContentType;

/// Infer a coarse content type from a result URL.
///
/// Hostname/path containing "docs." / "/docs/" / "/documentation/" or the
/// big Q&A/code hosts count as documentation; the big social hosts as
/// social; everything else is an article. Unparseable URLs fall back to
/// article.
pub fn content_type_for(raw_url: &str) -> ContentType {
    let Ok(u) = url::Url::parse(raw_url) else {
        return ContentType::Article;
    };
    let host = u.host_str().unwrap_or("").to_ascii_lowercase();
    let path = u.path().to_ascii_lowercase();

    if host.contains("docs.")
        || path.contains("/docs/")
        || path.contains("/documentation/")
        || host == "github.com"
        || host == "stackoverflow.com"
    {
        return ContentType::Documentation;
    }
    if host.contains("twitter.com") || host.contains("facebook.com") || host.contains("linkedin.com")
    {
        return ContentType::Social;
    }
    ContentType::Article
}

/// Hostname of a result URL, or empty for unparseable input.
pub fn source_host(raw_url: &str) -> String {
    url::Url::parse(raw_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_default()
}

/// Hyphen-presence language heuristic, kept as-is from the original
/// behavior: a query containing "-" is treated as "zh-cn", else "en".
/// It misclassifies hyphenated English queries; do not "fix" it here.
pub fn detect_language(query: &str) -> &'static str {
    if query.contains('-') {
        "zh-cn"
    } else {
        "en"
    }
}

/// Keyword-match result titles into a subset of {technology, documentation}.
pub fn detect_topics<'a, I>(titles: I) -> Vec<&'static str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut technology = false;
    let mut documentation = false;
    for title in titles {
        let t = title.to_ascii_lowercase();
        technology = technology || TECHNOLOGY_KEYWORDS.iter().any(|k| t.contains(k));
        documentation = documentation || DOCUMENTATION_KEYWORDS.iter().any(|k| t.contains(k));
    }
    let mut out = Vec::new();
    if technology {
        out.push("technology");
    }
    if documentation {
        out.push("documentation");
    }
    out
}
