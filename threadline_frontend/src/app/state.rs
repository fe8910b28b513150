use crate::comments::CommentPage;
use crate::likes::is_liked_by;
use crate::models::{Discussion, Settings};
use crate::pagination::Pagination;

/// Who is looking at the view. `user_id` is `None` for anonymous readers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Option<String>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.id().is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    NotFound,
    /// The discussion could not be fetched for a transport reason.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Stable key for a transient notification. The renderer translates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKey {
    CommentBlank,
    CommentFailed,
    ReplyFailed,
    LikeFailed,
    Reported,
    ReportFailed,
    SignInRequired,
    DiscussionNotFound,
}

impl NoticeKey {
    pub fn default_text(&self) -> &'static str {
        match self {
            Self::CommentBlank => "Comment is blank!",
            Self::CommentFailed => "Unable to save comment.",
            Self::ReplyFailed => "Unable to save reply.",
            Self::LikeFailed => "Unable to update like.",
            Self::Reported => "Discussion reported!",
            Self::ReportFailed => "Error occured. Please try again!",
            Self::SignInRequired => "You are required to login to access this page",
            Self::DiscussionNotFound => "Discussion not found.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub key: NoticeKey,
}

impl Notice {
    pub fn error(key: NoticeKey) -> Self {
        Self {
            kind: NoticeKind::Error,
            key,
        }
    }

    pub fn success(key: NoticeKey) -> Self {
        Self {
            kind: NoticeKind::Success,
            key,
        }
    }
}

/// What subscribers hear about after each committed update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Changed,
    Notice(Notice),
    /// Bring the element anchored at this slug into view.
    ScrollTo(String),
}

#[derive(Debug, Clone, Default)]
pub struct DiscussionState {
    pub slug: Option<String>,
    pub load_state: LoadState,
    pub discussion: Option<Discussion>,
    pub comments: CommentPage,
    pub comments_loading: bool,
    pub pagination: Pagination,
    pub settings: Settings,
    /// URL fragment to scroll to once the first comment page has arrived.
    pub fragment: Option<String>,
    /// Slug of a just-created comment or reply awaiting its refresh.
    pub pending_anchor: Option<String>,
    pub sending: bool,
}

impl DiscussionState {
    pub fn new(limit: u32) -> Self {
        Self {
            pagination: Pagination::new(limit),
            ..Default::default()
        }
    }

    pub fn discussion_id(&self) -> Option<&str> {
        self.discussion
            .as_ref()
            .map(|d| d.id.as_str())
            .filter(|id| !id.is_empty())
    }

    pub fn is_ready(&self) -> bool {
        self.load_state == LoadState::Ready
    }

    /// Anonymous readers may not open discussions in gated categories.
    pub fn requires_login(&self, viewer: &Viewer) -> bool {
        let gated = self
            .discussion
            .as_ref()
            .and_then(|d| d.category.as_ref())
            .map(|c| c.auth_required)
            .unwrap_or(false);
        gated && !viewer.is_authenticated()
    }

    pub fn is_liked_by(&self, viewer: &Viewer) -> bool {
        self.discussion
            .as_ref()
            .map(|d| is_liked_by(&d.likes, viewer.id()))
            .unwrap_or(false)
    }

    pub fn is_author(&self, viewer: &Viewer) -> bool {
        match (self.discussion.as_ref(), viewer.id()) {
            (Some(discussion), Some(id)) => discussion.user_id.as_deref() == Some(id),
            _ => false,
        }
    }

    pub fn has_more_comments(&self) -> bool {
        self.pagination.has_more()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Like};

    fn gated_discussion(auth_required: bool) -> DiscussionState {
        DiscussionState {
            discussion: Some(Discussion {
                id: "d1".into(),
                user_id: Some("author".into()),
                likes: vec![Like {
                    id: "l1".into(),
                    user_id: "u1".into(),
                    profile: None,
                }],
                category: Some(Category {
                    id: "c".into(),
                    slug: "c".into(),
                    title: "Members".into(),
                    auth_required,
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..DiscussionState::new(20)
        }
    }

    #[test]
    fn gated_category_requires_login_for_anonymous_viewers() {
        let state = gated_discussion(true);
        assert!(state.requires_login(&Viewer::anonymous()));
        assert!(!state.requires_login(&Viewer::user("u1")));
        assert!(!gated_discussion(false).requires_login(&Viewer::anonymous()));
    }

    #[test]
    fn like_and_author_checks_follow_the_viewer() {
        let state = gated_discussion(false);
        assert!(state.is_liked_by(&Viewer::user("u1")));
        assert!(!state.is_liked_by(&Viewer::anonymous()));
        assert!(state.is_author(&Viewer::user("author")));
        assert!(!state.is_author(&Viewer::user("u1")));
    }

    #[test]
    fn empty_viewer_id_is_anonymous() {
        assert!(!Viewer::user("").is_authenticated());
    }
}
