use tracing::debug;

use crate::api::ForumGateway;
use crate::error::GatewayResult;
use crate::models::{CommentsPage, CreatedEntity, Discussion, LikeTarget, Settings};

use super::DiscussionSession;

/// How a fetched comment page is merged into the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// First page after the discussion arrived.
    Initial,
    /// "Load more": append unseen comments.
    Append,
    /// Re-fetch of everything loaded so far after a mutation.
    Refresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind {
    Comment,
    Reply,
}

/// Completion of an asynchronous gateway call, sent back to the session.
#[derive(Debug)]
pub enum ViewMessage {
    SettingsLoaded(GatewayResult<Settings>),
    DiscussionLoaded {
        slug: String,
        refresh: bool,
        result: GatewayResult<Discussion>,
    },
    ViewRecorded {
        discussion_id: String,
        result: GatewayResult<()>,
    },
    CommentsLoaded {
        discussion_id: String,
        mode: PageMode,
        /// Page that was requested, used to rewind the cursor on failure.
        page: u32,
        result: GatewayResult<CommentsPage>,
    },
    PostCreated {
        discussion_id: String,
        kind: PostKind,
        result: GatewayResult<CreatedEntity>,
    },
    LikeToggled {
        discussion_id: String,
        target: LikeTarget,
        result: GatewayResult<()>,
    },
    ReportSubmitted {
        discussion_id: String,
        result: GatewayResult<()>,
    },
    ScrollDue {
        discussion_id: String,
        anchor: String,
    },
}

impl<G: ForumGateway> DiscussionSession<G> {
    pub(super) fn process_message(&mut self, message: ViewMessage) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.closed {
            debug!("view closed, dropping late completion");
            return;
        }
        match message {
            ViewMessage::SettingsLoaded(result) => self.handle_settings_loaded(result),
            ViewMessage::DiscussionLoaded {
                slug,
                refresh,
                result,
            } => self.handle_discussion_loaded(slug, refresh, result),
            ViewMessage::ViewRecorded {
                discussion_id,
                result,
            } => self.handle_view_recorded(discussion_id, result),
            ViewMessage::CommentsLoaded {
                discussion_id,
                mode,
                page,
                result,
            } => self.handle_comments_loaded(discussion_id, mode, page, result),
            ViewMessage::PostCreated {
                discussion_id,
                kind,
                result,
            } => self.handle_post_created(discussion_id, kind, result),
            ViewMessage::LikeToggled {
                discussion_id,
                target,
                result,
            } => self.handle_like_toggled(discussion_id, target, result),
            ViewMessage::ReportSubmitted {
                discussion_id,
                result,
            } => self.handle_report_submitted(discussion_id, result),
            ViewMessage::ScrollDue {
                discussion_id,
                anchor,
            } => self.handle_scroll_due(discussion_id, anchor),
        }
    }
}
