//! Markdown rendering with syntax highlighting and TOC generation

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::collections::HashMap;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// Code hosts whose auto-link text is shortened to the repository path
const SHORT_LINK_HOSTS: &[&str] = &["github.com", "gitlab.com", "bitbucket.org"];

const CLASS_STYLE: ClassStyle = ClassStyle::Spaced;

/// Result of rendering one document
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub html: String,
    pub toc: String,
}

struct TocEntry {
    level: u8,
    text: String,
    id: String,
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme: Option<Theme>,
}

impl MarkdownRenderer {
    /// Create a renderer using the given syntect theme for code blocks.
    ///
    /// An unknown theme name degrades to rendering without a stylesheet
    /// instead of failing; code blocks still carry highlight classes.
    pub fn new(theme_name: &str) -> Self {
        let theme_set = ThemeSet::load_defaults();
        let theme = theme_set.themes.get(theme_name).cloned();
        if theme.is_none() {
            tracing::warn!("highlight theme {:?} not found, serving unstyled code", theme_name);
        }
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    /// Stylesheet for the configured theme, for serving alongside posts.
    pub fn theme_css(&self) -> Option<String> {
        let theme = self.theme.as_ref()?;
        match css_for_theme_with_class_style(theme, CLASS_STYLE) {
            Ok(css) => Some(css),
            Err(e) => {
                tracing::warn!("failed to generate highlight stylesheet: {}", e);
                None
            }
        }
    }

    /// Render a Markdown body to HTML plus a table-of-contents fragment.
    pub fn render(&self, markdown: &str) -> Rendered {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS;

        let toc_entries = collect_headings(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut code_lang: Option<String> = None;
        let mut code_buf = String::new();
        let mut in_code = false;
        let mut heading_idx = 0usize;
        let mut pending_link: Option<String> = None;

        for event in Parser::new_ext(markdown, options) {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code = true;
                    code_buf.clear();
                    code_lang = match kind {
                        CodeBlockKind::Fenced(info) => {
                            let lang = info.split([',', ' ']).next().unwrap_or("").to_string();
                            (!lang.is_empty()).then_some(lang)
                        }
                        CodeBlockKind::Indented => None,
                    };
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code = false;
                    let block = match code_lang.as_deref() {
                        Some("mermaid") => {
                            format!(r#"<div class="mermaid">{}</div>"#, escape_html(&code_buf))
                        }
                        lang => self.highlight_code(&code_buf, lang),
                    };
                    events.push(Event::Html(CowStr::from(block)));
                    code_lang = None;
                }
                Event::Text(text) if in_code => {
                    code_buf.push_str(&text);
                }
                Event::Start(Tag::Heading { level, .. }) => {
                    let id = toc_entries.get(heading_idx).map(|e| e.id.as_str()).unwrap_or("");
                    events.push(Event::Html(CowStr::from(format!(r#"<{} id="{}">"#, level, id))));
                }
                Event::End(TagEnd::Heading(level)) => {
                    let id = toc_entries.get(heading_idx).map(|e| e.id.as_str()).unwrap_or("");
                    heading_idx += 1;
                    events.push(Event::Html(CowStr::from(format!(
                        r##"<a class="headerlink" href="#{}" title="Permalink to this headline">&para;</a></{}>"##,
                        id, level
                    ))));
                }
                Event::Start(Tag::Link { ref dest_url, .. }) => {
                    pending_link = Some(dest_url.to_string());
                    events.push(event);
                }
                Event::End(TagEnd::Link) => {
                    pending_link = None;
                    events.push(event);
                }
                Event::Text(text) => {
                    // Auto-links render their URL as the visible text;
                    // shorten it for recognized code hosts.
                    match pending_link.take() {
                        Some(url) if *text == url => {
                            events.push(Event::Text(CowStr::from(shorten_url(&url))));
                        }
                        _ => events.push(Event::Text(text)),
                    }
                }
                _ => events.push(event),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Rendered {
            html: html_output,
            toc: build_toc(&toc_entries),
        }
    }

    /// Highlight one code block with CSS classes.
    ///
    /// An unlabeled block is rendered as plain text, never by guessing
    /// the language. Highlighting errors degrade to an escaped block.
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let syntax = match lang {
            Some(l) => self
                .syntax_set
                .find_syntax_by_token(l)
                .or_else(|| self.syntax_set.find_syntax_by_extension(l))
                .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text()),
            None => self.syntax_set.find_syntax_plain_text(),
        };

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
                tracing::warn!("highlighting failed for {:?} block: {}", lang, e);
                return plain_code_block(code, lang);
            }
        }

        format!(
            r#"<div class="highlight"><pre><code class="language-{}">{}</code></pre></div>"#,
            lang.unwrap_or("text"),
            generator.finalize()
        )
    }
}

fn plain_code_block(code: &str, lang: Option<&str>) -> String {
    format!(
        r#"<pre><code class="language-{}">{}</code></pre>"#,
        lang.unwrap_or("text"),
        escape_html(code)
    )
}

/// First pass: collect heading text and assign stable anchor ids.
fn collect_headings(markdown: &str, options: Options) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    let mut current: Option<(u8, String)> = None;

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some((heading_level(level), String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, text)) = current.take() {
                    entries.push(TocEntry { level, text, id: String::new() });
                }
            }
            Event::Text(t) | Event::Code(t) => {
                if let Some((_, buf)) = current.as_mut() {
                    buf.push_str(&t);
                }
            }
            _ => {}
        }
    }

    // Assign ids, disambiguating repeats with a numeric suffix
    let mut seen: HashMap<String, usize> = HashMap::new();
    for entry in &mut entries {
        let mut base = slug::slugify(&entry.text);
        if base.is_empty() {
            base = "section".to_string();
        }
        let count = seen.entry(base.clone()).or_insert(0);
        entry.id = if *count == 0 { base.clone() } else { format!("{}-{}", base, count) };
        *count += 1;
    }

    entries
}

fn heading_level(level: pulldown_cmark::HeadingLevel) -> u8 {
    use pulldown_cmark::HeadingLevel::*;
    match level {
        H1 => 1,
        H2 => 2,
        H3 => 3,
        H4 => 4,
        H5 => 5,
        H6 => 6,
    }
}

/// Build a nested `<ul>` table of contents.
fn build_toc(entries: &[TocEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut html = String::from(r#"<div class="toc"><ul>"#);
    let mut open_levels: Vec<u8> = Vec::new();

    for entry in entries {
        loop {
            match open_levels.last() {
                None => {
                    open_levels.push(entry.level);
                    break;
                }
                Some(&top) if entry.level == top => {
                    html.push_str("</li>");
                    break;
                }
                Some(&top) if entry.level > top => {
                    html.push_str("<ul>");
                    open_levels.push(entry.level);
                    break;
                }
                Some(_) => {
                    html.push_str("</li></ul>");
                    open_levels.pop();
                }
            }
        }
        html.push_str(&format!(
            r##"<li><a href="#{}">{}</a>"##,
            entry.id,
            escape_html(&entry.text)
        ));
    }

    for _ in 0..open_levels.len() {
        html.push_str("</li></ul>");
    }
    html.push_str("</div>");
    html
}

/// Shorten a recognized code-host URL to its repository path.
fn shorten_url(url: &str) -> String {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    for host in SHORT_LINK_HOSTS {
        if let Some(path) = without_scheme.strip_prefix(host) {
            let path = path.trim_start_matches('/').trim_end_matches('/');
            if !path.is_empty() {
                return path.to_string();
            }
        }
    }

    url.to_string()
}

/// Simple HTML escaping
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
