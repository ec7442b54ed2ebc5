//! Image reference optimization
//!
//! Post-processes sanitized HTML to add lazy-loading hints to images.
//! Pure string transformation: only `<img>` tags change, and applying it
//! twice yields the same output as applying it once.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

const IMAGE_CLASS: &str = "post-image";

lazy_static! {
    static ref IMG_TAG: Regex = Regex::new(r"<img\b[^>]*>").unwrap();
    static ref HAS_LOADING: Regex = Regex::new(r#"\bloading\s*="#).unwrap();
    static ref HAS_DECODING: Regex = Regex::new(r#"\bdecoding\s*="#).unwrap();
    static ref CLASS_ATTR: Regex = Regex::new(r#"\bclass\s*=\s*"([^"]*)""#).unwrap();
}

/// Add `loading="lazy"`, `decoding="async"`, and the responsive image
/// class to every `<img>` tag that does not already carry them.
pub fn optimize_images(html: &str) -> String {
    IMG_TAG
        .replace_all(html, |caps: &Captures| rewrite_img(&caps[0]))
        .into_owned()
}

fn rewrite_img(tag: &str) -> String {
    let self_closing = tag.ends_with("/>");
    let inner = tag.trim_end_matches('>').trim_end_matches('/').trim_end();

    let mut out = match CLASS_ATTR.captures(inner) {
        Some(caps) if caps[1].split_whitespace().any(|c| c == IMAGE_CLASS) => inner.to_string(),
        Some(caps) => {
            let merged = format!(r#"class="{} {}""#, &caps[1], IMAGE_CLASS);
            CLASS_ATTR.replace(inner, merged.as_str()).into_owned()
        }
        None => format!(r#"{} class="{}""#, inner, IMAGE_CLASS),
    };

    if !HAS_LOADING.is_match(&out) {
        out.push_str(r#" loading="lazy""#);
    }
    if !HAS_DECODING.is_match(&out) {
        out.push_str(r#" decoding="async""#);
    }

    out.push_str(if self_closing { "/>" } else { ">" });
    out
}
