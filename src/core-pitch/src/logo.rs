//! Finding the client's logo and putting it into the page.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

/// Where a logo URL comes from, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoSource {
    /// A URL handed over directly, usually one returned by the upload endpoints.
    Upload(String),
    /// A Shopify global id (`gid://shopify/MediaImage/…`) still to be resolved to a URL.
    ShopifyGid(String),
    /// The first image URL found in the prompt text.
    Prompt(String),
}

static LOGO_IMG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*?\bid\s*=\s*["']logo-img["'][^>]*>"#).expect("logo img pattern is valid")
});

static SRC_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)(\s)src\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).expect("src attribute pattern is valid")
});

static STYLE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)(\sstyle\s*=\s*)("[^"]*"|'[^']*')"#).expect("style attribute pattern is valid")
});

static DISPLAY_NONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)display\s*:\s*none").expect("display pattern is valid"));

static IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"'<>()]+?\.(?:png|jpe?g|gif|webp|svg)(?:\?[^\s"'<>(),]*)?"#)
        .expect("image url pattern is valid")
});

static SHOPIFY_GID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"gid://shopify/[A-Za-z]+/\d+").expect("gid pattern is valid"));

/// First `http(s)` URL in the text that points at an image file.
pub fn find_image_url(text: &str) -> Option<String> {
    IMAGE_URL.find(text).map(|m| m.as_str().to_string())
}

/// Decides which logo to use for a request.
///
/// An explicit `http(s)` (or site-relative) URL wins, then a Shopify GID given explicitly or
/// mentioned in the prompt, then an image URL mentioned in the prompt.
pub fn classify_logo(explicit: Option<&str>, prompt: &str) -> Option<LogoSource> {
    let explicit = explicit.map(str::trim).filter(|s| !s.is_empty());

    if let Some(value) = explicit {
        if value.starts_with('/') && !value.starts_with("//") {
            return Some(LogoSource::Upload(value.to_string()));
        }
        if let Ok(url) = Url::parse(value)
            && matches!(url.scheme(), "http" | "https")
        {
            return Some(LogoSource::Upload(value.to_string()));
        }
        if SHOPIFY_GID.is_match(value) {
            return Some(LogoSource::ShopifyGid(value.to_string()));
        }
        tracing::warn!("Ignoring logo reference '{}': not a URL or Shopify GID", value);
    }

    if let Some(gid) = SHOPIFY_GID.find(prompt) {
        return Some(LogoSource::ShopifyGid(gid.as_str().to_string()));
    }
    find_image_url(prompt).map(LogoSource::Prompt)
}

/// Points the page's `<img id="logo-img">` at `url` and makes it visible.
///
/// Only the first such element is touched. The `src` attribute is rewritten or added, and a
/// `display: none` inside its inline style becomes `display: block`. Without the element the
/// HTML is returned as is.
pub fn inject_logo(html: &str, url: &str) -> String {
    let Some(tag) = LOGO_IMG.find(html) else {
        tracing::debug!("Template has no logo-img element; logo not injected");
        return html.to_string();
    };

    let src = format!("src=\"{}\"", url.replace('"', "&quot;"));
    let mut new_tag = if SRC_ATTR.is_match(tag.as_str()) {
        SRC_ATTR
            .replacen(tag.as_str(), 1, |caps: &Captures| format!("{}{}", &caps[1], src))
            .into_owned()
    } else {
        format!("<img {}{}", src, &tag.as_str()[4..])
    };

    new_tag = STYLE_ATTR
        .replacen(&new_tag, 1, |caps: &Captures| {
            format!("{}{}", &caps[1], DISPLAY_NONE.replace_all(&caps[2], "display: block"))
        })
        .into_owned();

    let mut output = String::with_capacity(html.len() + url.len());
    output.push_str(&html[..tag.start()]);
    output.push_str(&new_tag);
    output.push_str(&html[tag.end()..]);
    output
}
