use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use super::*;
use crate::error::{GatewayError, GatewayResult};
use crate::models::{
    Category, Comment, CommentsPage, CreatedEntity, Discussion, DiscussionsPage, Like, LikeInput,
    LikeTarget, NewComment, NewReply, Profile, Reply, Report, ReportKind, Settings,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Settings,
    GetDiscussion(String),
    UpdateViews(String, u64),
    ListComments { page: u32, limit: u32 },
    CreateComment(NewComment),
    CreateReply(NewReply),
    ToggleLike(LikeTarget, LikeInput),
    Report(Report),
}

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,
    discussion: Option<Discussion>,
    comments: Vec<Comment>,
    page_overrides: HashMap<u32, Vec<Comment>>,
    reject_posts: bool,
    fail_views: bool,
    /// Comment pages whose next fetch fails with a malformed response.
    fail_pages_once: HashSet<u32>,
    /// Discussion, post, like and report calls fail at the transport level.
    transport_down: bool,
    settings: Settings,
}

#[derive(Default)]
struct RecordingGateway {
    inner: Mutex<Inner>,
}

impl RecordingGateway {
    fn with_discussion(discussion: Discussion, comments: Vec<Comment>) -> Arc<Self> {
        let gateway = Self::default();
        {
            let mut inner = gateway.inner.lock().unwrap();
            inner.discussion = Some(discussion);
            inner.comments = comments;
            inner.settings = Settings {
                ban_words: Some("darn, heck".into()),
                ..Default::default()
            };
        }
        Arc::new(gateway)
    }

    fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.inner.lock().unwrap().calls.push(call);
    }

    fn transport_down(&self) -> bool {
        self.inner.lock().unwrap().transport_down
    }
}

fn malformed() -> GatewayError {
    GatewayError::Decode(serde_json::from_str::<serde_json::Value>("<html>").unwrap_err())
}

#[async_trait]
impl ForumGateway for RecordingGateway {
    async fn get_discussion(&self, slug: &str) -> GatewayResult<Discussion> {
        self.record(Call::GetDiscussion(slug.to_string()));
        if self.transport_down() {
            return Err(malformed());
        }
        let inner = self.inner.lock().unwrap();
        inner
            .discussion
            .clone()
            .filter(|d| d.slug == slug)
            .ok_or_else(|| GatewayError::NotFound {
                what: format!("discussion {slug}"),
            })
    }

    async fn update_discussion_views(&self, discussion_id: &str, view: u64) -> GatewayResult<()> {
        self.record(Call::UpdateViews(discussion_id.to_string(), view));
        if self.inner.lock().unwrap().fail_views {
            return Err(GatewayError::Rejected { action: "record view" });
        }
        Ok(())
    }

    async fn list_comments(&self, _discussion_id: &str, page: u32, limit: u32) -> GatewayResult<CommentsPage> {
        self.record(Call::ListComments { page, limit });
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_pages_once.remove(&page) {
            return Err(malformed());
        }
        let total = inner.comments.len() as u64;
        if let Some(data) = inner.page_overrides.get(&page) {
            return Ok(CommentsPage {
                data: data.clone(),
                total,
            });
        }
        let start = ((page - 1) * limit) as usize;
        let data = inner
            .comments
            .iter()
            .skip(start)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(CommentsPage { data, total })
    }

    async fn create_comment(&self, input: &NewComment) -> GatewayResult<CreatedEntity> {
        self.record(Call::CreateComment(input.clone()));
        let mut inner = self.inner.lock().unwrap();
        if inner.transport_down {
            return Err(malformed());
        }
        if inner.reject_posts {
            return Err(GatewayError::Rejected { action: "create comment" });
        }
        let id = format!("c{}", inner.comments.len() + 1);
        let slug = format!("{id}-new");
        inner.comments.push(Comment {
            id: id.clone(),
            slug: slug.clone(),
            comment: input.comment.clone(),
            ..Default::default()
        });
        Ok(CreatedEntity { slug, id: Some(id) })
    }

    async fn create_reply(&self, input: &NewReply) -> GatewayResult<CreatedEntity> {
        self.record(Call::CreateReply(input.clone()));
        let mut inner = self.inner.lock().unwrap();
        let parent = inner
            .comments
            .iter_mut()
            .find(|c| c.id == input.reply_id)
            .ok_or(GatewayError::Rejected { action: "create reply" })?;
        let id = format!("{}-r{}", parent.id, parent.replies.len() + 1);
        parent.replies.push(Reply {
            id: id.clone(),
            slug: id.clone(),
            comment: input.comment.clone(),
            reply_id: input.reply_id.clone(),
            ..Default::default()
        });
        Ok(CreatedEntity { slug: id, id: None })
    }

    async fn toggle_like(&self, target: &LikeTarget, input: &LikeInput) -> GatewayResult<()> {
        self.record(Call::ToggleLike(target.clone(), input.clone()));
        let mut inner = self.inner.lock().unwrap();
        if inner.transport_down {
            return Err(malformed());
        }
        let likes = match target {
            LikeTarget::Discussion => inner.discussion.as_mut().map(|d| &mut d.likes),
            LikeTarget::Comment(id) => inner.comments.iter_mut().find(|c| &c.id == id).map(|c| &mut c.likes),
            LikeTarget::Reply(_) => None,
        };
        let Some(likes) = likes else {
            return Err(GatewayError::Rejected { action: "toggle like" });
        };
        if let Some(pos) = likes.iter().position(|l| l.user_id == input.user_id) {
            likes.remove(pos);
        } else {
            likes.push(Like {
                id: format!("like-{}", input.user_id),
                user_id: input.user_id.clone(),
                profile: None,
            });
        }
        Ok(())
    }

    async fn submit_report(&self, report: &Report) -> GatewayResult<()> {
        self.record(Call::Report(report.clone()));
        if self.transport_down() {
            return Err(malformed());
        }
        Ok(())
    }

    async fn get_settings(&self) -> GatewayResult<Settings> {
        self.record(Call::Settings);
        Ok(self.inner.lock().unwrap().settings.clone())
    }

    async fn list_popular(&self, _page: u32, _limit: u32) -> GatewayResult<DiscussionsPage> {
        Ok(DiscussionsPage::default())
    }
}

fn discussion() -> Discussion {
    Discussion {
        id: "d1".into(),
        slug: "first-post".into(),
        title: "Darn good question".into(),
        content: "<p>hello</p>".into(),
        view: 5,
        user_id: Some("author".into()),
        category: Some(Category {
            id: "cat".into(),
            slug: "general".into(),
            title: "General".into(),
            ..Default::default()
        }),
        profile: Some(Profile {
            username: "author".into(),
            name: "Author".into(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn comment(id: &str) -> Comment {
    Comment {
        id: id.into(),
        slug: format!("{id}-slug"),
        comment: format!("comment {id}"),
        ..Default::default()
    }
}

fn config(limit: u32) -> ClientConfig {
    ClientConfig {
        page_limit: limit,
        settle_delay: Duration::from_millis(5),
        ..Default::default()
    }
}

async fn opened(
    gateway: &Arc<RecordingGateway>,
    viewer: Viewer,
    limit: u32,
    fragment: Option<&str>,
) -> (DiscussionSession<RecordingGateway>, flume::Receiver<ViewEvent>) {
    let mut session = DiscussionSession::new(gateway.clone(), viewer, &config(limit));
    let events = session.subscribe();
    session.open("first-post", fragment.map(str::to_string));
    session.settle().await;
    (session, events)
}

fn notices(events: &flume::Receiver<ViewEvent>) -> Vec<NoticeKey> {
    events
        .try_iter()
        .filter_map(|e| match e {
            ViewEvent::Notice(notice) => Some(notice.key),
            _ => None,
        })
        .collect()
}

fn scrolls(events: &flume::Receiver<ViewEvent>) -> Vec<String> {
    events
        .try_iter()
        .filter_map(|e| match e {
            ViewEvent::ScrollTo(anchor) => Some(anchor),
            _ => None,
        })
        .collect()
}

fn comment_ids(session: &DiscussionSession<RecordingGateway>) -> Vec<String> {
    session
        .state()
        .comments
        .comments()
        .iter()
        .map(|c| c.id.clone())
        .collect()
}

#[tokio::test]
async fn opening_records_exactly_one_view_increment() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![comment("c1"), comment("c2")]);
    let (session, _events) = opened(&gateway, Viewer::anonymous(), 20, None).await;

    assert_eq!(session.state().load_state, LoadState::Ready);
    let increments: Vec<_> = gateway
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::UpdateViews(..)))
        .collect();
    assert_eq!(increments, vec![Call::UpdateViews("d1".into(), 6)]);
    assert_eq!(comment_ids(&session), vec!["c1", "c2"]);
    assert_eq!(session.state().pagination.total, 2);
    assert!(!session.state().comments_loading);
    assert_eq!(session.in_flight(), 0);
}

#[tokio::test]
async fn settings_ban_words_apply_to_displayed_text() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![]);
    let (session, _events) = opened(&gateway, Viewer::anonymous(), 20, None).await;

    let title = session.state().discussion.as_ref().map(|d| d.title.clone()).unwrap();
    assert_eq!(session.redact(&title), "***** good question");
    assert_eq!(session.filter().len(), 2);
}

#[tokio::test]
async fn failed_view_increment_is_silent() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![comment("c1")]);
    gateway.inner.lock().unwrap().fail_views = true;
    let (session, events) = opened(&gateway, Viewer::anonymous(), 20, None).await;

    assert_eq!(session.state().load_state, LoadState::Ready);
    assert_eq!(comment_ids(&session), vec!["c1"]);
    assert!(notices(&events).is_empty());
}

#[tokio::test]
async fn missing_discussion_is_reported_and_comments_are_not_fetched() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![comment("c1")]);
    let mut session = DiscussionSession::new(gateway.clone(), Viewer::anonymous(), &config(20));
    let events = session.subscribe();
    session.open("does-not-exist", None);
    session.settle().await;

    assert_eq!(session.state().load_state, LoadState::NotFound);
    assert_eq!(notices(&events), vec![NoticeKey::DiscussionNotFound]);
    assert_eq!(gateway.count(|c| matches!(c, Call::ListComments { .. })), 0);
    assert_eq!(gateway.count(|c| matches!(c, Call::UpdateViews(..))), 0);
}

#[tokio::test]
async fn fragment_scrolls_after_first_comment_page() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![comment("c1"), comment("c2")]);
    let (_session, events) = opened(&gateway, Viewer::anonymous(), 20, Some("#c2-slug")).await;

    assert_eq!(scrolls(&events), vec!["c2-slug".to_string()]);
}

#[tokio::test]
async fn no_scroll_when_the_page_is_empty() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![]);
    let (_session, events) = opened(&gateway, Viewer::anonymous(), 20, Some("c2-slug")).await;

    assert!(scrolls(&events).is_empty());
}

#[tokio::test]
async fn blank_comment_makes_no_gateway_call() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![]);
    let (mut session, events) = opened(&gateway, Viewer::user("u1"), 20, None).await;
    let before = gateway.calls().len();
    let _ = notices(&events);

    assert!(!session.submit_comment(""));
    assert!(!session.submit_comment("   "));
    session.settle().await;

    assert_eq!(gateway.calls().len(), before);
    assert_eq!(notices(&events), vec![NoticeKey::CommentBlank, NoticeKey::CommentBlank]);
}

#[tokio::test]
async fn anonymous_viewer_cannot_comment() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![]);
    let (mut session, events) = opened(&gateway, Viewer::anonymous(), 20, None).await;
    let before = gateway.calls().len();
    let _ = notices(&events);

    assert!(!session.submit_comment("hello"));
    assert!(!session.like_discussion());
    assert_eq!(gateway.calls().len(), before);
    assert_eq!(
        notices(&events),
        vec![NoticeKey::SignInRequired, NoticeKey::SignInRequired]
    );
}

#[tokio::test]
async fn new_comment_triggers_full_refetch_and_scroll() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![comment("c1")]);
    let (mut session, events) = opened(&gateway, Viewer::user("u1"), 20, None).await;
    let _ = scrolls(&events);
    let lists_before = gateway.count(|c| matches!(c, Call::ListComments { .. }));

    assert!(session.submit_comment("  nice post  "));
    assert!(session.state().sending);
    session.settle().await;

    let calls = gateway.calls();
    assert!(calls.contains(&Call::CreateComment(NewComment {
        comment: "nice post".into(),
        discussion_id: "d1".into(),
        user_id: "u1".into(),
    })));
    assert_eq!(
        gateway.count(|c| matches!(c, Call::ListComments { .. })),
        lists_before + 1
    );
    assert_eq!(calls.last(), Some(&Call::ListComments { page: 1, limit: 20 }));
    assert_eq!(comment_ids(&session), vec!["c1", "c2"]);
    assert!(!session.state().sending);
    assert_eq!(scrolls(&events), vec!["c2-new".to_string()]);
}

#[tokio::test]
async fn rejected_comment_surfaces_notice_without_refetch() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![comment("c1")]);
    gateway.inner.lock().unwrap().reject_posts = true;
    let (mut session, events) = opened(&gateway, Viewer::user("u1"), 20, None).await;
    let _ = notices(&events);
    let lists_before = gateway.count(|c| matches!(c, Call::ListComments { .. }));

    assert!(session.submit_comment("hello"));
    session.settle().await;

    assert_eq!(notices(&events), vec![NoticeKey::CommentFailed]);
    assert_eq!(gateway.count(|c| matches!(c, Call::ListComments { .. })), lists_before);
}

#[tokio::test]
async fn reply_targets_the_parent_comment() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![comment("c1")]);
    let (mut session, _events) = opened(&gateway, Viewer::user("u1"), 20, None).await;

    assert!(!session.submit_reply("missing", "hi"));
    assert!(session.submit_reply("c1", "hi back"));
    session.settle().await;

    assert!(gateway.calls().contains(&Call::CreateReply(NewReply::new(
        "hi back".into(),
        "d1".into(),
        "u1".into(),
        "c1".into(),
    ))));
    let parent = session.state().comments.comment("c1").cloned().unwrap();
    assert_eq!(parent.replies.len(), 1);
    assert_eq!(parent.replies[0].reply_id, "c1");
}

#[tokio::test]
async fn concurrent_load_more_does_not_duplicate_comments() {
    let all: Vec<_> = (1..=6).map(|i| comment(&format!("c{i}"))).collect();
    let gateway = RecordingGateway::with_discussion(discussion(), all);
    {
        let mut inner = gateway.inner.lock().unwrap();
        inner.page_overrides.insert(2, vec![comment("c3"), comment("c4")]);
        inner.page_overrides.insert(3, vec![comment("c3"), comment("c4")]);
    }
    let (mut session, _events) = opened(&gateway, Viewer::anonymous(), 2, None).await;
    assert!(session.state().has_more_comments());

    assert!(session.load_more());
    assert!(session.load_more());
    assert!(session.state().comments_loading);
    session.settle().await;

    assert_eq!(comment_ids(&session), vec!["c1", "c2", "c3", "c4"]);
    assert!(!session.state().comments_loading);
}

#[tokio::test]
async fn load_more_appends_the_next_page() {
    let all: Vec<_> = (1..=5).map(|i| comment(&format!("c{i}"))).collect();
    let gateway = RecordingGateway::with_discussion(discussion(), all);
    let (mut session, _events) = opened(&gateway, Viewer::anonymous(), 2, None).await;

    assert!(session.load_more());
    session.settle().await;

    assert_eq!(comment_ids(&session), vec!["c1", "c2", "c3", "c4"]);
    assert_eq!(session.state().pagination.page, 2);
    assert!(gateway.calls().contains(&Call::ListComments { page: 2, limit: 2 }));
}

#[tokio::test]
async fn load_more_is_unavailable_below_the_page_size() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![comment("c1")]);
    let (mut session, _events) = opened(&gateway, Viewer::anonymous(), 20, None).await;

    assert!(!session.state().has_more_comments());
    assert!(!session.load_more());
}

#[tokio::test]
async fn liking_the_discussion_refetches_it() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![]);
    let viewer = Viewer::user("u1");
    let (mut session, _events) = opened(&gateway, viewer.clone(), 20, None).await;
    assert!(!session.state().is_liked_by(&viewer));

    assert!(session.like_discussion());
    session.settle().await;

    assert_eq!(gateway.count(|c| matches!(c, Call::GetDiscussion(_))), 2);
    assert!(session.state().is_liked_by(&viewer));
    // A refresh never counts as a new view.
    assert_eq!(gateway.count(|c| matches!(c, Call::UpdateViews(..))), 1);
}

#[tokio::test]
async fn liking_a_comment_refetches_the_comment_page() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![comment("c1")]);
    let (mut session, _events) = opened(&gateway, Viewer::user("u1"), 20, None).await;

    assert!(session.like_comment("c1"));
    session.settle().await;

    assert!(gateway.calls().contains(&Call::ToggleLike(
        LikeTarget::Comment("c1".into()),
        LikeInput {
            user_id: "u1".into(),
            discussion_id: "d1".into(),
            post_id: Some("c1".into()),
        }
    )));
    let likes = &session.state().comments.comment("c1").unwrap().likes;
    assert_eq!(likes.len(), 1);
    assert_eq!(gateway.count(|c| matches!(c, Call::ListComments { .. })), 2);
}

#[tokio::test]
async fn rejected_like_surfaces_notice() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![comment("c1")]);
    let (mut session, events) = opened(&gateway, Viewer::user("u1"), 20, None).await;
    let _ = notices(&events);

    assert!(session.like_reply("c1-r1"));
    session.settle().await;

    assert_eq!(notices(&events), vec![NoticeKey::LikeFailed]);
}

#[tokio::test]
async fn report_is_fire_and_forget() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![]);
    let (mut session, events) = opened(&gateway, Viewer::user("u1"), 20, None).await;
    let _ = notices(&events);

    assert!(session.report(ReportKind::FraudOrSpam));
    session.settle().await;

    assert!(gateway.calls().contains(&Call::Report(Report {
        discussion_id: "d1".into(),
        kind: ReportKind::FraudOrSpam,
        slug: "first-post".into(),
    })));
    assert_eq!(notices(&events), vec![NoticeKey::Reported]);
}

#[tokio::test]
async fn completions_after_close_are_ignored() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![comment("c1")]);
    let mut session = DiscussionSession::new(gateway.clone(), Viewer::anonymous(), &config(20));
    session.open("first-post", None);
    session.close();
    session.settle().await;

    assert!(session.is_closed());
    assert!(session.state().discussion.is_none());
    assert_eq!(session.state().load_state, LoadState::Idle);
    assert_eq!(gateway.count(|c| matches!(c, Call::ListComments { .. })), 0);
}

#[tokio::test]
async fn gated_category_is_flagged_for_anonymous_viewers() {
    let mut gated = discussion();
    if let Some(category) = gated.category.as_mut() {
        category.auth_required = true;
    }
    let gateway = RecordingGateway::with_discussion(gated, vec![]);
    let (session, _events) = opened(&gateway, Viewer::anonymous(), 20, None).await;

    assert!(session.state().requires_login(session.viewer()));
}

#[tokio::test]
async fn failed_load_more_is_retried_for_the_same_page() {
    let all: Vec<_> = (1..=6).map(|i| comment(&format!("c{i}"))).collect();
    let gateway = RecordingGateway::with_discussion(discussion(), all);
    gateway.inner.lock().unwrap().fail_pages_once.insert(2);
    let (mut session, events) = opened(&gateway, Viewer::anonymous(), 2, None).await;

    assert!(session.load_more());
    session.settle().await;
    assert_eq!(session.state().pagination.page, 1);
    assert_eq!(comment_ids(&session), vec!["c1", "c2"]);
    assert!(notices(&events).is_empty());

    assert!(session.load_more());
    session.settle().await;
    assert_eq!(comment_ids(&session), vec!["c1", "c2", "c3", "c4"]);
    assert_eq!(session.state().pagination.page, 2);
    assert_eq!(gateway.count(|c| *c == Call::ListComments { page: 2, limit: 2 }), 2);
}

#[tokio::test]
async fn transport_failure_on_open_marks_the_view_failed() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![comment("c1")]);
    gateway.inner.lock().unwrap().transport_down = true;
    let (session, events) = opened(&gateway, Viewer::anonymous(), 20, None).await;

    assert_eq!(session.state().load_state, LoadState::Failed);
    assert!(session.state().discussion.is_none());
    assert!(notices(&events).is_empty());
    assert_eq!(gateway.count(|c| matches!(c, Call::ListComments { .. })), 0);
    assert_eq!(gateway.count(|c| matches!(c, Call::UpdateViews(..))), 0);
}

#[tokio::test]
async fn transport_failures_on_actions_stay_silent() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![comment("c1")]);
    let (mut session, events) = opened(&gateway, Viewer::user("u1"), 20, None).await;
    let _ = notices(&events);
    gateway.inner.lock().unwrap().transport_down = true;
    let lists_before = gateway.count(|c| matches!(c, Call::ListComments { .. }));

    assert!(session.submit_comment("hello"));
    assert!(session.like_comment("c1"));
    assert!(session.report(ReportKind::Violence));
    session.settle().await;

    assert!(notices(&events).is_empty());
    assert!(!session.state().sending);
    assert_eq!(session.state().pending_anchor, None);
    assert_eq!(gateway.count(|c| matches!(c, Call::ListComments { .. })), lists_before);
    assert_eq!(comment_ids(&session), vec!["c1"]);
}

#[tokio::test]
async fn failed_refresh_drops_the_pending_scroll() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![comment("c1")]);
    let (mut session, events) = opened(&gateway, Viewer::user("u1"), 20, None).await;
    let _ = scrolls(&events);
    gateway.inner.lock().unwrap().fail_pages_once.insert(1);

    assert!(session.submit_comment("new one"));
    session.settle().await;
    assert_eq!(session.state().pending_anchor, None);

    assert!(session.like_comment("c1"));
    session.settle().await;

    assert_eq!(comment_ids(&session), vec!["c1", "c2"]);
    assert!(scrolls(&events).is_empty());
}

#[tokio::test]
async fn blank_reply_is_reported_before_the_target_is_checked() {
    let gateway = RecordingGateway::with_discussion(discussion(), vec![comment("c1")]);
    let (mut session, events) = opened(&gateway, Viewer::user("u1"), 20, None).await;
    let _ = notices(&events);
    let before = gateway.calls().len();

    assert!(!session.submit_reply("missing", "  "));

    assert_eq!(notices(&events), vec![NoticeKey::CommentBlank]);
    assert_eq!(gateway.calls().len(), before);
}
