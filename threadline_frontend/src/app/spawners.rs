use tracing::debug;

use crate::api::ForumGateway;
use crate::models::{LikeInput, LikeTarget, NewComment, NewReply, Report, ReportKind};

use super::messages::PageMode;
use super::state::{Notice, NoticeKey};
use super::tasks;
use super::DiscussionSession;

impl<G: ForumGateway> DiscussionSession<G> {
    pub(super) fn spawn_load_settings(&mut self) {
        self.in_flight += 1;
        tasks::load_settings(self.gateway.clone(), self.tx.clone());
    }

    pub(super) fn spawn_load_discussion(&mut self, slug: String, refresh: bool) {
        self.in_flight += 1;
        tasks::load_discussion(self.gateway.clone(), self.tx.clone(), slug, refresh);
    }

    pub(super) fn spawn_record_view(&mut self, discussion_id: String, view: u64) {
        self.in_flight += 1;
        tasks::record_view(self.gateway.clone(), self.tx.clone(), discussion_id, view);
    }

    pub(super) fn spawn_load_comments(&mut self, mode: PageMode) {
        let Some(discussion_id) = self.state.discussion_id().map(str::to_string) else {
            return;
        };
        let limit = self.state.pagination.limit;
        let (page, limit) = match mode {
            PageMode::Initial => {
                self.state.pagination.set_page(1);
                (1, limit)
            }
            PageMode::Append => (self.state.pagination.advance(), limit),
            PageMode::Refresh => (1, self.state.pagination.loaded_span()),
        };
        self.comment_requests += 1;
        self.state.comments_loading = true;
        self.in_flight += 1;
        tasks::load_comments(
            self.gateway.clone(),
            self.tx.clone(),
            discussion_id,
            mode,
            page,
            limit,
        );
    }

    pub(super) fn schedule_scroll(&mut self, anchor: String) {
        let Some(discussion_id) = self.state.discussion_id().map(str::to_string) else {
            return;
        };
        self.in_flight += 1;
        tasks::schedule_scroll(self.tx.clone(), discussion_id, anchor, self.settle_delay);
    }

    /// Fetches the next comment page and appends it. Returns false when the
    /// affordance is not available.
    pub fn load_more(&mut self) -> bool {
        if !self.state.is_ready() || !self.state.has_more_comments() {
            return false;
        }
        self.spawn_load_comments(PageMode::Append);
        self.changed();
        true
    }

    pub fn refresh_discussion(&mut self) -> bool {
        match self.state.slug.clone() {
            Some(slug) if self.state.is_ready() => {
                self.spawn_load_discussion(slug, true);
                true
            }
            _ => false,
        }
    }

    pub fn refresh_comments(&mut self) -> bool {
        if !self.state.is_ready() {
            return false;
        }
        self.spawn_load_comments(PageMode::Refresh);
        true
    }

    pub fn submit_comment(&mut self, content: &str) -> bool {
        let Some((discussion_id, user_id)) = self.validate_post(content) else {
            return false;
        };
        let input = NewComment {
            comment: content.trim().to_string(),
            discussion_id,
            user_id,
        };
        self.state.sending = true;
        self.in_flight += 1;
        tasks::create_comment(self.gateway.clone(), self.tx.clone(), input);
        self.changed();
        true
    }

    /// Replies to the comment `comment_id`. Replies to replies are not
    /// possible, the parent must be a first-level comment.
    pub fn submit_reply(&mut self, comment_id: &str, content: &str) -> bool {
        let Some((discussion_id, user_id)) = self.validate_post(content) else {
            return false;
        };
        if self.state.comments.comment(comment_id).is_none() {
            debug!(comment_id, "reply target is not a loaded comment");
            return false;
        }
        let input = NewReply::new(
            content.trim().to_string(),
            discussion_id,
            user_id,
            comment_id.to_string(),
        );
        self.state.sending = true;
        self.in_flight += 1;
        tasks::create_reply(self.gateway.clone(), self.tx.clone(), input);
        self.changed();
        true
    }

    pub fn like_discussion(&mut self) -> bool {
        self.spawn_like(LikeTarget::Discussion)
    }

    pub fn like_comment(&mut self, comment_id: &str) -> bool {
        self.spawn_like(LikeTarget::Comment(comment_id.to_string()))
    }

    pub fn like_reply(&mut self, reply_id: &str) -> bool {
        self.spawn_like(LikeTarget::Reply(reply_id.to_string()))
    }

    pub fn report(&mut self, kind: ReportKind) -> bool {
        let Some(discussion) = self.state.discussion.as_ref() else {
            return false;
        };
        let report = Report {
            discussion_id: discussion.id.clone(),
            kind,
            slug: discussion.slug.clone(),
        };
        if !self.viewer.is_authenticated() {
            self.notify(Notice::error(NoticeKey::SignInRequired));
            return false;
        }
        self.in_flight += 1;
        tasks::submit_report(self.gateway.clone(), self.tx.clone(), report);
        true
    }

    fn spawn_like(&mut self, target: LikeTarget) -> bool {
        let Some(discussion_id) = self.state.discussion_id().map(str::to_string) else {
            return false;
        };
        let Some(user_id) = self.viewer.id().map(str::to_string) else {
            self.notify(Notice::error(NoticeKey::SignInRequired));
            return false;
        };
        let input = LikeInput::for_target(&target, user_id, discussion_id);
        self.in_flight += 1;
        tasks::toggle_like(self.gateway.clone(), self.tx.clone(), target, input);
        true
    }

    /// Blank content is rejected before anything goes over the wire.
    fn validate_post(&mut self, content: &str) -> Option<(String, String)> {
        if content.trim().is_empty() {
            self.notify(Notice::error(NoticeKey::CommentBlank));
            return None;
        }
        let discussion_id = self.state.discussion_id()?.to_string();
        let Some(user_id) = self.viewer.id().map(str::to_string) else {
            self.notify(Notice::error(NoticeKey::SignInRequired));
            return None;
        };
        Some((discussion_id, user_id))
    }
}
