use std::sync::Arc;
use std::time::Duration;

use flume::Sender;
use tracing::debug;

use crate::api::ForumGateway;
use crate::models::{LikeInput, LikeTarget, NewComment, NewReply, Report};

use super::messages::{PageMode, PostKind, ViewMessage};

// Each task runs one gateway call and reports back through the channel.
// A failed send only means the view went away first.

fn deliver(tx: &Sender<ViewMessage>, message: ViewMessage) {
    if tx.send(message).is_err() {
        debug!("view dropped before completion was delivered");
    }
}

pub fn load_settings<G: ForumGateway>(gateway: Arc<G>, tx: Sender<ViewMessage>) {
    tokio::spawn(async move {
        let result = gateway.get_settings().await;
        deliver(&tx, ViewMessage::SettingsLoaded(result));
    });
}

pub fn load_discussion<G: ForumGateway>(
    gateway: Arc<G>,
    tx: Sender<ViewMessage>,
    slug: String,
    refresh: bool,
) {
    tokio::spawn(async move {
        let result = gateway.get_discussion(&slug).await;
        deliver(
            &tx,
            ViewMessage::DiscussionLoaded {
                slug,
                refresh,
                result,
            },
        );
    });
}

pub fn record_view<G: ForumGateway>(
    gateway: Arc<G>,
    tx: Sender<ViewMessage>,
    discussion_id: String,
    view: u64,
) {
    tokio::spawn(async move {
        let result = gateway.update_discussion_views(&discussion_id, view).await;
        deliver(
            &tx,
            ViewMessage::ViewRecorded {
                discussion_id,
                result,
            },
        );
    });
}

pub fn load_comments<G: ForumGateway>(
    gateway: Arc<G>,
    tx: Sender<ViewMessage>,
    discussion_id: String,
    mode: PageMode,
    page: u32,
    limit: u32,
) {
    tokio::spawn(async move {
        let result = gateway.list_comments(&discussion_id, page, limit).await;
        deliver(
            &tx,
            ViewMessage::CommentsLoaded {
                discussion_id,
                mode,
                page,
                result,
            },
        );
    });
}

pub fn create_comment<G: ForumGateway>(gateway: Arc<G>, tx: Sender<ViewMessage>, input: NewComment) {
    tokio::spawn(async move {
        let result = gateway.create_comment(&input).await;
        deliver(
            &tx,
            ViewMessage::PostCreated {
                discussion_id: input.discussion_id,
                kind: PostKind::Comment,
                result,
            },
        );
    });
}

pub fn create_reply<G: ForumGateway>(gateway: Arc<G>, tx: Sender<ViewMessage>, input: NewReply) {
    tokio::spawn(async move {
        let result = gateway.create_reply(&input).await;
        deliver(
            &tx,
            ViewMessage::PostCreated {
                discussion_id: input.discussion_id,
                kind: PostKind::Reply,
                result,
            },
        );
    });
}

pub fn toggle_like<G: ForumGateway>(
    gateway: Arc<G>,
    tx: Sender<ViewMessage>,
    target: LikeTarget,
    input: LikeInput,
) {
    tokio::spawn(async move {
        let result = gateway.toggle_like(&target, &input).await;
        deliver(
            &tx,
            ViewMessage::LikeToggled {
                discussion_id: input.discussion_id,
                target,
                result,
            },
        );
    });
}

pub fn submit_report<G: ForumGateway>(gateway: Arc<G>, tx: Sender<ViewMessage>, report: Report) {
    tokio::spawn(async move {
        let result = gateway.submit_report(&report).await;
        deliver(
            &tx,
            ViewMessage::ReportSubmitted {
                discussion_id: report.discussion_id,
                result,
            },
        );
    });
}

pub fn schedule_scroll(tx: Sender<ViewMessage>, discussion_id: String, anchor: String, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        deliver(
            &tx,
            ViewMessage::ScrollDue {
                discussion_id,
                anchor,
            },
        );
    });
}
