use htmd::HtmlToMarkdown;
use scraper::{Html, Selector};
use webgaze_core::heuristics::{MAIN_CONTENT_SELECTORS, NOISE_SELECTORS};

/// Convert a loaded page's HTML into Markdown.
///
/// Selection order: an explicit selector (single element, empty string if
/// absent), then the fixed main-content probe list, then the whole body with
/// noise regions stripped. Empty input yields empty output, never an error.
pub fn extract_markdown(html: &str, selector: Option<&str>) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let markup = select_content(html, selector);
    if markup.trim().is_empty() {
        return String::new();
    }
    tidy_markdown(&to_markdown(&markup))
}

fn select_content(html: &str, selector: Option<&str>) -> String {
    let doc = Html::parse_document(html);

    if let Some(raw) = selector {
        let Ok(sel) = Selector::parse(raw) else {
            return String::new();
        };
        return doc
            .select(&sel)
            .next()
            .map(|el| el.html())
            .unwrap_or_default();
    }

    for raw in MAIN_CONTENT_SELECTORS {
        let Ok(sel) = Selector::parse(raw) else {
            continue;
        };
        if let Some(el) = doc.select(&sel).next() {
            return el.html();
        }
    }

    body_without_noise(&doc)
}

/// Serialize the body with noise regions removed.
///
/// `scraper` documents are immutable, so removal works on the serialized
/// copy: every noise element's exact serialization is excised from the body
/// markup. The live page is never touched.
fn body_without_noise(doc: &Html) -> String {
    let Ok(body_sel) = Selector::parse("body") else {
        return String::new();
    };
    let Some(body) = doc.select(&body_sel).next() else {
        return String::new();
    };
    let mut markup = body.html();
    for raw in NOISE_SELECTORS {
        let Ok(sel) = Selector::parse(raw) else {
            continue;
        };
        for el in doc.select(&sel) {
            let noise = el.html();
            if !noise.is_empty() {
                markup = markup.replace(&noise, "");
            }
        }
    }
    markup
}

fn to_markdown(markup: &str) -> String {
    let converter = HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "noscript", "iframe"])
        .build();
    converter.convert(markup).unwrap_or_default()
}

/// Collapse 3+ consecutive newlines to exactly 2, drop bare-bullet lines,
/// drop whitespace-only lines, trim.
fn tidy_markdown(md: &str) -> String {
    let mut out = String::with_capacity(md.len());
    let mut blank_run = 0usize;
    for line in md.lines() {
        let trimmed = line.trim();
        if matches!(trimmed, "-" | "*" | "+") {
            continue;
        }
        if trimmed.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            if blank_run > 0 {
                out.push_str("\n\n");
            } else {
                out.push('\n');
            }
        }
        blank_run = 0;
        out.push_str(line.trim_end());
    }
    out.trim().to_string()
}
