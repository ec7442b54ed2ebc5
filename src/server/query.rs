//! Post listing filters and pagination

use crate::content::PostSummary;

/// Filter posts by a free-text query over title, summary, and tags.
/// Case-insensitive; an empty query keeps everything.
pub fn apply_filter(query: &str, posts: &[PostSummary]) -> Vec<PostSummary> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return posts.to_vec();
    }

    posts
        .iter()
        .filter(|p| {
            p.title.to_lowercase().contains(&query)
                || p.summary.as_deref().is_some_and(|s| s.to_lowercase().contains(&query))
                || p.tags.iter().any(|t| t.to_lowercase().contains(&query))
        })
        .cloned()
        .collect()
}

/// Posts carrying the given tag (case-insensitive exact match).
pub fn filter_by_tag(tag: &str, posts: &[PostSummary]) -> Vec<PostSummary> {
    posts
        .iter()
        .filter(|p| p.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
        .cloned()
        .collect()
}

/// Posts carrying any of the given tags.
pub fn filter_by_tags(tags: &[String], posts: &[PostSummary]) -> Vec<PostSummary> {
    if tags.is_empty() {
        return posts.to_vec();
    }
    posts
        .iter()
        .filter(|p| {
            p.tags
                .iter()
                .any(|t| tags.iter().any(|wanted| t.eq_ignore_ascii_case(wanted)))
        })
        .cloned()
        .collect()
}

/// One page of results plus the total page count.
///
/// Pages are 1-based; a page past the end clamps to the last valid
/// page. An empty input yields one empty page.
pub fn paginate(posts: &[PostSummary], page: usize, per_page: usize) -> (Vec<PostSummary>, usize) {
    let per_page = per_page.max(1);
    let total_pages = posts.len().div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * per_page;
    let slice = posts.iter().skip(start).take(per_page).cloned().collect();
    (slice, total_pages)
}
