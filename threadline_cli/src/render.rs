use chrono::{DateTime, Utc};
use html2text::from_read;
use threadline_frontend::app::{Notice, NoticeKind};
use threadline_frontend::comments::ThreadEntry;
use threadline_frontend::likes::LikeSet;
use threadline_frontend::listing::PopularDiscussions;
use threadline_frontend::models::{parse_timestamp, Like, Profile};
use threadline_frontend::{DiscussionSession, ForumGateway, Viewer};

const WIDTH: usize = 100;
const INDENT: &str = "    ";

pub fn notice(notice: &Notice) {
    let label = match notice.kind {
        NoticeKind::Success => "ok",
        NoticeKind::Error => "error",
    };
    eprintln!("[{label}] {}", notice.key.default_text());
}

pub fn discussion<G: ForumGateway>(session: &DiscussionSession<G>, highlight: Option<&str>) {
    let state = session.state();
    let Some(discussion) = state.discussion.as_ref() else {
        return;
    };
    let viewer = session.viewer();
    let now = Utc::now();

    println!("{}", session.redact(&discussion.title));
    let mut byline = Vec::new();
    if let Some(profile) = discussion.profile.as_ref() {
        byline.push(format!("by {}", display_name(profile)));
    }
    if let Some(created) = discussion.created_at_utc() {
        byline.push(relative(created, now));
    }
    if let Some(category) = discussion.category.as_ref() {
        byline.push(category.title.clone());
    }
    byline.push(format!("{} views", discussion.view));
    byline.push(likes_summary(&discussion.likes, viewer));
    println!("{}", byline.join(" · "));
    println!();
    println!("{}", body(session, &discussion.content, ""));

    let total = state.pagination.total;
    println!("── {total} comments ──");
    for entry in state.comments.entries() {
        let marker = if highlight == Some(entry.slug()) { ">> " } else { "" };
        let indent = INDENT.repeat(entry.depth());
        let (author, text, likes, created) = match entry {
            ThreadEntry::Comment { number, comment } => (
                format!("#{number} {}", display_name(&comment.author)),
                &comment.comment,
                &comment.likes,
                comment.created_at.as_deref(),
            ),
            ThreadEntry::Reply { reply, .. } => (
                display_name(&reply.author).to_string(),
                &reply.comment,
                &reply.likes,
                reply.created_at.as_deref(),
            ),
        };
        let when = parse_timestamp(created)
            .map(|ts| relative(ts, now))
            .unwrap_or_default();
        println!(
            "{indent}{marker}{author} {when} · {} [{}]",
            likes_summary(likes, viewer),
            entry.slug()
        );
        println!("{}", body(session, text, &indent));
    }
    if state.has_more_comments() {
        println!(
            "more comments available, rerun with --pages {}",
            state.pagination.next_page()
        );
    }
}

pub fn popular<G: ForumGateway>(listing: &PopularDiscussions<G>) {
    let pagination = listing.pagination();
    for discussion in listing.discussions() {
        println!(
            "{:>6} views  {}  ({})",
            discussion.view, discussion.title, discussion.slug
        );
    }
    if listing.has_pages() {
        println!("page {} of {}", pagination.page, pagination.page_count());
    }
}

fn body<G: ForumGateway>(session: &DiscussionSession<G>, html: &str, indent: &str) -> String {
    let text = from_read(html.as_bytes(), WIDTH.saturating_sub(indent.len()));
    session
        .redact(text.trim())
        .lines()
        .map(|line| format!("{indent}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn display_name(profile: &Profile) -> &str {
    if profile.name.is_empty() {
        &profile.username
    } else {
        &profile.name
    }
}

fn likes_summary(likes: &[Like], viewer: &Viewer) -> String {
    let set = LikeSet::new(likes);
    if set.contains(viewer.id()) {
        format!("{} likes (you liked this)", set.len())
    } else {
        format!("{} likes", set.len())
    }
}

fn relative(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(ts);
    match elapsed.num_seconds() {
        s if s < 60 => "just now".to_string(),
        s if s < 3_600 => format!("{} min ago", s / 60),
        s if s < 86_400 => format!("{} h ago", s / 3_600),
        s if s < 7 * 86_400 => format!("{} days ago", s / 86_400),
        _ => ts.format("%Y-%m-%d").to_string(),
    }
}
