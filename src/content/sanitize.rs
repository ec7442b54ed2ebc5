//! HTML sanitization
//!
//! Rendered Markdown passes through an allow-list sanitizer before it is
//! handed to any caller. Scripts, event handlers, and anything outside
//! the allow-list are stripped unconditionally.

use ammonia::Builder;

/// Strip disallowed tags and attributes from rendered HTML.
pub fn sanitize(html: &str) -> String {
    builder().clean(html).to_string()
}

fn builder() -> Builder<'static> {
    let mut builder = Builder::default();

    builder.add_tag_attributes(
        "img",
        &["src", "alt", "title", "loading", "decoding", "class"],
    );
    builder.add_tag_attributes("a", &["href", "title", "rel"]);
    // ammonia requires `link_rel(None)` when `rel` is an allowed `a` attribute,
    // otherwise it panics on the conflicting default rel injection.
    builder.link_rel(None);
    builder.add_tag_attributes("input", &["type", "checked", "disabled"]);
    // `id` keeps heading anchors addressable from the TOC
    builder.add_generic_attributes(&["class", "id"]);
    builder.add_tags(&["input"]);
    builder.add_url_schemes(["http", "https", "mailto"].iter().copied());

    builder
}
