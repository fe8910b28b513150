use tracing::debug;

use crate::api::ForumGateway;
use crate::error::GatewayResult;
use crate::models::{CreatedEntity, LikeTarget};

use super::handlers_discussion::log_failure;
use super::messages::{PageMode, PostKind};
use super::state::{Notice, NoticeKey, ViewEvent};
use super::DiscussionSession;

impl<G: ForumGateway> DiscussionSession<G> {
    fn is_current(&self, discussion_id: &str) -> bool {
        self.state.discussion_id() == Some(discussion_id)
    }

    pub(super) fn handle_post_created(
        &mut self,
        discussion_id: String,
        kind: PostKind,
        result: GatewayResult<CreatedEntity>,
    ) {
        self.state.sending = false;
        if !self.is_current(&discussion_id) {
            debug!(%discussion_id, "post created for a discussion no longer shown");
            return;
        }
        match result {
            Ok(created) => {
                // The server copy is authoritative: re-fetch instead of appending.
                self.state.pending_anchor = Some(created.slug);
                self.spawn_load_comments(PageMode::Refresh);
            }
            Err(err) if err.is_transport() => log_failure("create post", &err),
            Err(err) => {
                log_failure("create post", &err);
                let key = match kind {
                    PostKind::Comment => NoticeKey::CommentFailed,
                    PostKind::Reply => NoticeKey::ReplyFailed,
                };
                self.notify(Notice::error(key));
            }
        }
        self.changed();
    }

    pub(super) fn handle_like_toggled(
        &mut self,
        discussion_id: String,
        target: LikeTarget,
        result: GatewayResult<()>,
    ) {
        if !self.is_current(&discussion_id) {
            return;
        }
        match result {
            Ok(()) => match target {
                LikeTarget::Discussion => {
                    self.refresh_discussion();
                }
                LikeTarget::Comment(_) | LikeTarget::Reply(_) => {
                    self.refresh_comments();
                }
            },
            Err(err) if err.is_transport() => log_failure("toggle like", &err),
            Err(err) => {
                log_failure("toggle like", &err);
                self.notify(Notice::error(NoticeKey::LikeFailed));
            }
        }
    }

    pub(super) fn handle_report_submitted(&mut self, discussion_id: String, result: GatewayResult<()>) {
        if !self.is_current(&discussion_id) {
            return;
        }
        match result {
            Ok(()) => self.notify(Notice::success(NoticeKey::Reported)),
            Err(err) if err.is_transport() => log_failure("submit report", &err),
            Err(err) => {
                log_failure("submit report", &err);
                self.notify(Notice::error(NoticeKey::ReportFailed));
            }
        }
    }

    pub(super) fn handle_scroll_due(&mut self, discussion_id: String, anchor: String) {
        if self.is_current(&discussion_id) {
            self.emit(ViewEvent::ScrollTo(anchor));
        }
    }
}
