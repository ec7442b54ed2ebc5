//! Content repository - loads posts from the content directory
//!
//! Directory scans never fail as a whole: each file either produces a
//! post or a `SkipReason`, and skips are logged and filtered out.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use super::date;
use super::frontmatter::{self, RawFrontMatter};
use super::images::optimize_images;
use super::markdown::MarkdownRenderer;
use super::metadata;
use super::post::{read_time, word_count, PostSummary, RenderedPost};
use super::sanitize::sanitize;
use super::slug::{make_slug, SlugError};

/// Why a file was left out of a scan
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("not a regular file")]
    NotAFile,
    #[error("file is empty")]
    EmptyFile,
    #[error("unreadable: {0}")]
    Unreadable(#[from] std::io::Error),
    #[error("not valid UTF-8")]
    InvalidEncoding,
    #[error("front-matter error: {0}")]
    FrontMatter(#[from] frontmatter::FrontMatterError),
    #[error("slug error: {0}")]
    Slug(#[from] SlugError),
}

/// Loads posts from a single content directory
pub struct ContentRepository {
    content_dir: PathBuf,
    renderer: MarkdownRenderer,
}

impl ContentRepository {
    pub fn new<P: Into<PathBuf>>(content_dir: P, renderer: MarkdownRenderer) -> Self {
        Self { content_dir: content_dir.into(), renderer }
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    pub fn renderer(&self) -> &MarkdownRenderer {
        &self.renderer
    }

    /// Scan the content directory and return all posts, newest first.
    ///
    /// A missing or empty directory yields an empty list, not an error.
    pub fn list_posts(&self) -> Vec<PostSummary> {
        let files = self.markdown_files();
        if files.is_empty() {
            return Vec::new();
        }

        let mut posts: Vec<PostSummary> = Vec::new();
        for path in &files {
            match self.load_summary(path) {
                Ok(post) => posts.push(post),
                Err(reason) => {
                    tracing::warn!("skipping {:?}: {}", path, reason);
                }
            }
        }

        // DateTime ordering is total, so the sort itself cannot fail;
        // filename descending remains as the tie-break for equal dates.
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.filename.cmp(&a.filename)));

        tracing::debug!("loaded {} posts from {} files", posts.len(), files.len());
        posts
    }

    /// Find a post by slug and render it for the detail view.
    ///
    /// Returns `None` for an unknown slug, an unreadable match, or a
    /// file with neither content nor metadata.
    pub fn get_post(&self, slug: &str) -> Option<RenderedPost> {
        if slug.is_empty() {
            return None;
        }

        let matching = self.markdown_files().into_iter().find(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| make_slug(n).ok())
                .is_some_and(|s| s == slug)
        });

        let Some(path) = matching else {
            tracing::debug!("no post found with slug {:?}", slug);
            return None;
        };

        match self.render_post(&path, slug) {
            Ok(post) => Some(post),
            Err(reason) => {
                tracing::warn!("cannot load post {:?}: {}", path, reason);
                None
            }
        }
    }

    /// Markdown files directly inside the content directory, in a stable
    /// name order so linear slug lookup is deterministic.
    fn markdown_files(&self) -> Vec<PathBuf> {
        if !self.content_dir.is_dir() {
            tracing::debug!("content directory missing or not a directory: {:?}", self.content_dir);
            return Vec::new();
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&self.content_dir)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file() && is_markdown_file(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();

        files.sort();
        files
    }

    fn load_summary(&self, path: &Path) -> Result<PostSummary, SkipReason> {
        let (raw_map, body, filename) = read_post_file(path)?;
        let slug = make_slug(&filename)?;
        let meta = metadata::validate(&raw_map, &filename);
        let date = date::resolve(&raw_map, path);

        let words = word_count(&body);
        Ok(PostSummary {
            slug,
            filename,
            title: meta.title,
            summary: meta.summary,
            tags: meta.tags,
            date,
            raw: body,
            word_count: words,
            read_time: read_time(words),
        })
    }

    fn render_post(&self, path: &Path, slug: &str) -> Result<RenderedPost, SkipReason> {
        let (raw_map, body, filename) = read_post_file(path)?;
        if body.is_empty() && raw_map.is_empty() {
            return Err(SkipReason::EmptyFile);
        }

        let meta = metadata::validate(&raw_map, &filename);
        let date = date::resolve(&raw_map, path);

        let rendered = self.renderer.render(&body);
        let content = optimize_images(&sanitize(&rendered.html));

        let words = word_count(&body);
        Ok(RenderedPost {
            slug: slug.to_string(),
            filename,
            title: meta.title,
            summary: meta.summary,
            tags: meta.tags,
            date,
            content,
            toc: rendered.toc,
            word_count: words,
            read_time: read_time(words),
        })
    }
}

/// Read and split one post file: front-matter map, body, filename.
fn read_post_file(path: &Path) -> Result<(RawFrontMatter, String, String), SkipReason> {
    let meta = fs::metadata(path)?;
    if !meta.is_file() {
        return Err(SkipReason::NotAFile);
    }
    if meta.len() == 0 {
        return Err(SkipReason::EmptyFile);
    }

    let bytes = fs::read(path)?;
    let text = String::from_utf8(bytes).map_err(|_| SkipReason::InvalidEncoding)?;

    let (raw_map, body) = frontmatter::parse(&text)?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .ok_or(SkipReason::NotAFile)?;

    Ok((raw_map, body.to_string(), filename))
}

fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn repo(dir: &TempDir) -> ContentRepository {
        ContentRepository::new(dir.path(), MarkdownRenderer::new("base16-ocean.dark"))
    }

    fn write_post(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn test_missing_directory_yields_empty_list() {
        let repo = ContentRepository::new(
            "/definitely/not/a/real/dir",
            MarkdownRenderer::new("base16-ocean.dark"),
        );
        assert!(repo.list_posts().is_empty());
    }

    #[test]
    fn test_empty_directory_yields_empty_list() {
        let dir = TempDir::new().unwrap();
        assert!(repo(&dir).list_posts().is_empty());
    }

    #[test]
    fn test_posts_loaded_with_metrics() {
        let dir = TempDir::new().unwrap();
        write_post(&dir, "first-post.md", "---\ntitle: First\ndate: 2025-01-02\n---\none two three four");
        let posts = repo(&dir).list_posts();
        assert_eq!(posts.len(), 1);
        let p = &posts[0];
        assert_eq!(p.slug, "first-post");
        assert_eq!(p.title, "First");
        assert_eq!(p.word_count, 4);
        assert_eq!(p.read_time, 1);
        assert_eq!(p.raw, "one two three four");
    }

    #[test]
    fn test_bad_files_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        write_post(&dir, "good.md", "---\ntitle: Good\ndate: 2025-01-01\n---\nbody");
        write_post(&dir, "empty.md", "");
        write_post(&dir, "broken.md", "---\ntitle: [unterminated\n---\nbody");
        fs::write(dir.path().join("binary.md"), [0xff, 0xfe, 0x00, 0x9f]).unwrap();
        write_post(&dir, "notes.txt", "not markdown");

        let posts = repo(&dir).list_posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "good");
    }

    #[test]
    fn test_sorted_newest_first() {
        let dir = TempDir::new().unwrap();
        write_post(&dir, "older.md", "---\ntitle: Older\ndate: 2024-03-01\n---\nx");
        write_post(&dir, "newer.md", "---\ntitle: Newer\ndate: 2025-03-01\n---\nx");
        write_post(&dir, "middle.md", "---\ntitle: Middle\ndate: 2024-09-01\n---\nx");

        let slugs: Vec<_> = repo(&dir).list_posts().into_iter().map(|p| p.slug).collect();
        assert_eq!(slugs, vec!["newer", "middle", "older"]);
    }

    #[test]
    fn test_same_day_ordering_uses_time() {
        let dir = TempDir::new().unwrap();
        write_post(&dir, "early.md", "---\ntitle: Early\ndate: 8/2/2025\ntime: \"02:00\"\n---\nx");
        write_post(&dir, "late.md", "---\ntitle: Late\ndate: 8/2/2025\ntime: \"03:12\"\n---\nx");

        let slugs: Vec<_> = repo(&dir).list_posts().into_iter().map(|p| p.slug).collect();
        assert_eq!(slugs, vec!["late", "early"]);
    }

    #[test]
    fn test_get_post_renders_and_sanitizes() {
        let dir = TempDir::new().unwrap();
        write_post(
            &dir,
            "xss-test.md",
            "---\ntitle: XSS\n---\n# Heading\n\n<script>alert('bad')</script>\n\n![pic](https://a/b.png)\n",
        );

        let post = repo(&dir).get_post("xss-test").unwrap();
        assert!(!post.content.contains("<script"));
        assert!(post.content.contains("<h1"));
        assert!(post.content.contains(r#"loading="lazy""#));
        assert!(post.toc.contains("Heading"));
    }

    #[test]
    fn test_get_post_unknown_slug_absent() {
        let dir = TempDir::new().unwrap();
        write_post(&dir, "real.md", "---\ntitle: Real\n---\nbody");
        assert!(repo(&dir).get_post("no-such-slug").is_none());
        assert!(repo(&dir).get_post("").is_none());
    }

    #[test]
    fn test_get_post_first_match_wins() {
        let dir = TempDir::new().unwrap();
        // Both filenames slugify to "my-post"; name order decides
        write_post(&dir, "My Post.md", "---\ntitle: Spaced\n---\nbody");
        write_post(&dir, "my_post.md", "---\ntitle: Underscored\n---\nbody");

        let post = repo(&dir).get_post("my-post").unwrap();
        assert_eq!(post.title, "Spaced");
    }

    #[test]
    fn test_title_defaults_from_filename() {
        let dir = TempDir::new().unwrap();
        write_post(&dir, "my_post.md", "no front-matter here");
        let posts = repo(&dir).list_posts();
        assert_eq!(posts[0].title, "My Post");
    }
}
