//! Plain-text rendering of view state for the terminal.
use std::fmt::Write;

use crate::contact::ContactPage;
use crate::model::Post;
use crate::views::{DetailSnapshot, ListSnapshot, ViewState};

const DATE_FORMAT: &str = "%B %-d, %Y";

fn source_banner(fallback: bool) -> &'static str {
    if fallback {
        " (offline sample content)"
    } else {
        ""
    }
}

fn post_line(out: &mut String, post: &Post) {
    let _ = writeln!(
        out,
        "  {}  [{}]  {}  {} min read\n    /blog/{}\n    {}",
        post.date_posted.format(DATE_FORMAT),
        post.category,
        post.title,
        post.read_time,
        post.slug,
        post.excerpt
    );
}

pub fn list(state: &ViewState<ListSnapshot>) -> String {
    let ViewState::Ready(fetched) = state else {
        return "Loading posts...\n".to_string();
    };
    let snap = fetched.get();
    let mut out = String::new();

    let _ = writeln!(out, "Blog{}", source_banner(fetched.is_fallback()));
    if let Some(category) = &snap.query.category {
        let _ = writeln!(out, "Category: {}", category);
    }
    if let Some(search) = &snap.query.search {
        let _ = writeln!(out, "Search: \"{}\"", search);
    }
    out.push('\n');

    if snap.page.posts.is_empty() {
        out.push_str("  No posts found.\n");
    }
    for post in &snap.page.posts {
        post_line(&mut out, post);
    }

    let p = &snap.page.pagination;
    let _ = writeln!(
        out,
        "\nPage {} of {} ({} posts){}{}",
        p.page,
        p.pages.max(1),
        p.total,
        if p.has_prev() { "  [prev]" } else { "" },
        if p.has_next() { "  [next]" } else { "" }
    );

    if !snap.categories.is_empty() {
        out.push_str("\nCategories:\n");
        for c in &snap.categories {
            let _ = writeln!(out, "  {} ({})", c.name, c.count);
        }
    }
    if !snap.recent.is_empty() {
        out.push_str("\nRecent posts:\n");
        for post in &snap.recent {
            let _ = writeln!(out, "  {} - /blog/{}", post.title, post.slug);
        }
    }
    out
}

pub fn detail(state: &ViewState<DetailSnapshot>) -> String {
    let ViewState::Ready(fetched) = state else {
        return "Loading post...\n".to_string();
    };
    let snap = fetched.get();
    let post = &snap.post;
    let mut out = String::new();

    let _ = writeln!(out, "{}{}", post.title, source_banner(fetched.is_fallback()));
    let _ = writeln!(
        out,
        "By {} | {} | {} | {} min read | {} views",
        post.author,
        post.date_posted.format(DATE_FORMAT),
        post.category,
        post.read_time,
        post.view_count
    );
    if !post.tags.is_empty() {
        let _ = writeln!(out, "Tags: {}", post.tags.join(", "));
    }
    let _ = writeln!(out, "Image: {}\n", post.featured_image);
    let _ = writeln!(out, "{}", post.content);

    if !snap.recent.is_empty() {
        out.push_str("\nMore from the blog:\n");
        for p in &snap.recent {
            let _ = writeln!(out, "  {} - /blog/{}", p.title, p.slug);
        }
    }
    out
}

pub fn featured(posts: &[Post], fallback: bool) -> String {
    let mut out = format!("Featured{}\n", source_banner(fallback));
    for post in posts {
        post_line(&mut out, post);
    }
    out
}

pub fn contact(page: &ContactPage, fallback: bool) -> String {
    let mut out = String::new();
    let a = &page.info.address;
    let _ = writeln!(out, "Contact{}", source_banner(fallback));
    let _ = writeln!(out, "  {}, {}, {} {}, {}", a.street, a.city, a.state, a.zip, a.country);
    let _ = writeln!(out, "  Phone: {} (support {})", page.info.phone.main, page.info.phone.support);
    let _ = writeln!(out, "  Email: {} (support {})", page.info.email.general, page.info.email.support);
    let h = &page.info.hours;
    let _ = writeln!(out, "  Mon-Fri {} | Sat {} | Sun {}", h.weekdays, h.saturday, h.sunday);
    for (platform, profile) in &page.social {
        let _ = writeln!(out, "  {}: {} ({})", platform, profile.handle, profile.url);
    }
    out
}
