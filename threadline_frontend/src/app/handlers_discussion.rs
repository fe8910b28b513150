use tracing::{debug, error, info, warn};

use crate::api::ForumGateway;
use crate::error::{GatewayError, GatewayResult};
use crate::models::{CommentsPage, Discussion, Settings};
use crate::moderation::BanWordFilter;

use super::messages::PageMode;
use super::state::{LoadState, Notice, NoticeKey};
use super::DiscussionSession;

impl<G: ForumGateway> DiscussionSession<G> {
    pub(super) fn handle_settings_loaded(&mut self, result: GatewayResult<Settings>) {
        match result {
            Ok(settings) => {
                let ban_words = settings.ban_words.as_deref().unwrap_or_default();
                self.filter = BanWordFilter::from_config(ban_words, self.ban_match);
                self.state.settings = settings;
                self.changed();
            }
            Err(err) => log_failure("load settings", &err),
        }
    }

    pub(super) fn handle_discussion_loaded(
        &mut self,
        slug: String,
        refresh: bool,
        result: GatewayResult<Discussion>,
    ) {
        if self.state.slug.as_deref() != Some(slug.as_str()) {
            debug!(%slug, "ignoring discussion for a view that moved on");
            return;
        }
        let discussion = match result {
            Ok(discussion) => discussion,
            Err(err) if refresh => {
                log_failure("refresh discussion", &err);
                return;
            }
            Err(err) if err.is_transport() => {
                error!(%slug, error = %err, "failed to load discussion");
                self.state.load_state = LoadState::Failed;
                self.changed();
                return;
            }
            Err(err) => {
                info!(%slug, error = %err, "discussion unavailable");
                self.state.load_state = LoadState::NotFound;
                self.notify(Notice::error(NoticeKey::DiscussionNotFound));
                self.changed();
                return;
            }
        };

        if refresh {
            // Out-of-order refreshes simply overwrite each other.
            self.state.discussion = Some(discussion);
            self.changed();
            return;
        }

        let discussion_id = discussion.id.clone();
        let next_view = discussion.view.saturating_add(1);
        self.state.discussion = Some(discussion);
        self.state.load_state = LoadState::Ready;
        self.changed();

        if discussion_id.is_empty() {
            warn!(%slug, "discussion arrived without an id, comments not loaded");
            return;
        }
        self.spawn_record_view(discussion_id, next_view);
        self.spawn_load_comments(PageMode::Initial);
    }

    pub(super) fn handle_view_recorded(&mut self, discussion_id: String, result: GatewayResult<()>) {
        match result {
            Ok(()) => debug!(%discussion_id, "view recorded"),
            Err(err) => warn!(%discussion_id, error = %err, "failed to record view"),
        }
    }

    pub(super) fn handle_comments_loaded(
        &mut self,
        discussion_id: String,
        mode: PageMode,
        page: u32,
        result: GatewayResult<CommentsPage>,
    ) {
        if self.state.discussion_id() != Some(discussion_id.as_str()) {
            debug!(%discussion_id, "ignoring comments for another discussion");
            return;
        }
        self.comment_requests = self.comment_requests.saturating_sub(1);
        self.state.comments_loading = self.comment_requests > 0;

        let loaded = match result {
            Ok(loaded) => loaded,
            Err(err) => {
                log_failure("load comments", &err);
                match mode {
                    // Rewind so the next "load more" asks for the failed page
                    // again. Later pages that did arrive are re-fetched and
                    // deduplicated on append.
                    PageMode::Append if self.state.pagination.page >= page => {
                        self.state.pagination.set_page(page.saturating_sub(1));
                    }
                    PageMode::Refresh => self.state.pending_anchor = None,
                    _ => {}
                }
                self.changed();
                return;
            }
        };

        let arrived = !loaded.data.is_empty();
        self.state.pagination.total = loaded.total;
        match mode {
            PageMode::Initial | PageMode::Refresh => self.state.comments.replace(loaded.data),
            PageMode::Append => {
                let added = self.state.comments.append(loaded.data);
                debug!(%discussion_id, added, "appended comment page");
            }
        }
        self.changed();

        match mode {
            PageMode::Initial if arrived => {
                if let Some(fragment) = self.state.fragment.clone() {
                    self.schedule_scroll(fragment);
                }
            }
            PageMode::Refresh => {
                if let Some(anchor) = self.state.pending_anchor.take() {
                    self.schedule_scroll(anchor);
                }
            }
            _ => {}
        }
    }
}

/// Transport problems are logged as errors, rejections as warnings.
pub(super) fn log_failure(action: &str, err: &GatewayError) {
    if err.is_transport() {
        error!(action, error = %err, "gateway call failed");
    } else {
        warn!(action, error = %err, "gateway call rejected");
    }
}
