//! List blog content

use anyhow::Result;
use std::collections::HashMap;

use crate::content::{ContentRepository, MarkdownRenderer};
use crate::Blog;

/// List blog content by type
pub fn run(blog: &Blog, content_type: &str) -> Result<()> {
    let renderer = MarkdownRenderer::new(&blog.config.highlight_theme);
    let repo = ContentRepository::new(blog.content_dir.clone(), renderer);

    match content_type {
        "post" | "posts" => {
            let posts = repo.list_posts();
            println!("Posts ({}):", posts.len());
            for post in posts {
                println!(
                    "  {} - {} [{}] ({} min)",
                    post.date.format("%Y-%m-%d"),
                    post.title,
                    post.filename,
                    post.read_time
                );
            }
        }
        "tag" | "tags" => {
            let posts = repo.list_posts();
            let mut tags: HashMap<String, usize> = HashMap::new();
            for post in &posts {
                for tag in &post.tags {
                    *tags.entry(tag.clone()).or_insert(0) += 1;
                }
            }
            println!("Tags ({}):", tags.len());
            let mut tags: Vec<_> = tags.into_iter().collect();
            tags.sort_by(|a, b| b.1.cmp(&a.1));
            for (tag, count) in tags {
                println!("  {} ({})", tag, count);
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, tag", content_type);
        }
    }

    Ok(())
}
