//! Discussion view synchronizer.
//!
//! A [`DiscussionSession`] owns the state of one open discussion page. Every
//! gateway call runs as a spawned task that reports back with a
//! [`ViewMessage`](messages::ViewMessage); the session applies those
//! messages one at a time and tells its subscribers after each change.
//! There is no cancellation: completions that belong to a discussion the
//! session is no longer showing are dropped when they arrive.

use std::sync::Arc;
use std::time::Duration;

use flume::{Receiver, Sender};

use crate::api::ForumGateway;
use crate::config::ClientConfig;
use crate::moderation::{BanMatch, BanWordFilter};

mod handlers_discussion;
mod handlers_misc;
mod messages;
mod spawners;
mod state;
mod tasks;

#[cfg(test)]
mod tests;

use messages::ViewMessage;
pub use state::{DiscussionState, LoadState, Notice, NoticeKey, NoticeKind, ViewEvent, Viewer};

pub struct DiscussionSession<G: ForumGateway> {
    gateway: Arc<G>,
    tx: Sender<ViewMessage>,
    rx: Receiver<ViewMessage>,
    state: DiscussionState,
    viewer: Viewer,
    ban_match: BanMatch,
    filter: BanWordFilter,
    settle_delay: Duration,
    page_limit: u32,
    in_flight: usize,
    comment_requests: usize,
    subscribers: Vec<Sender<ViewEvent>>,
    closed: bool,
}

impl<G: ForumGateway> DiscussionSession<G> {
    /// Must be driven from inside a tokio runtime, gateway calls are spawned.
    pub fn new(gateway: Arc<G>, viewer: Viewer, config: &ClientConfig) -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            gateway,
            tx,
            rx,
            state: DiscussionState::new(config.page_limit),
            viewer,
            ban_match: config.ban_match,
            filter: BanWordFilter::default(),
            settle_delay: config.settle_delay,
            page_limit: config.page_limit,
            in_flight: 0,
            comment_requests: 0,
            subscribers: Vec::new(),
            closed: false,
        }
    }

    pub fn state(&self) -> &DiscussionState {
        &self.state
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn filter(&self) -> &BanWordFilter {
        &self.filter
    }

    /// Applies the site's ban-word list to text about to be displayed.
    pub fn redact(&self, text: &str) -> String {
        self.filter.redact(text)
    }

    /// Number of gateway calls and scheduled scrolls not yet applied.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn subscribe(&mut self) -> Receiver<ViewEvent> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Navigates to the discussion at `slug`. `fragment` is the URL hash the
    /// view should scroll to once comments are in.
    pub fn open(&mut self, slug: impl Into<String>, fragment: Option<String>) {
        let slug = slug.into();
        if slug.trim().is_empty() {
            return;
        }
        self.closed = false;
        self.comment_requests = 0;
        self.state = DiscussionState::new(self.page_limit);
        self.state.fragment = fragment
            .map(|raw| raw.trim_start_matches('#').to_string())
            .filter(|anchor| !anchor.is_empty());
        self.state.slug = Some(slug.clone());
        self.state.load_state = LoadState::Loading;
        self.spawn_load_settings();
        self.spawn_load_discussion(slug, false);
        self.changed();
    }

    /// Leaves the view. Calls still in flight complete but are ignored.
    pub fn close(&mut self) {
        self.closed = true;
        self.state = DiscussionState::new(self.page_limit);
        self.changed();
    }

    /// Applies every completion already waiting. Returns how many there were.
    pub fn process_messages(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.process_message(message);
            processed += 1;
        }
        processed
    }

    /// Waits for the next completion and applies it.
    pub async fn next_message(&mut self) -> bool {
        match self.rx.recv_async().await {
            Ok(message) => {
                self.process_message(message);
                true
            }
            Err(_) => false,
        }
    }

    /// Runs until nothing is in flight, including chained follow-ups.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            if !self.next_message().await {
                break;
            }
        }
    }

    fn emit(&mut self, event: ViewEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn notify(&mut self, notice: Notice) {
        self.emit(ViewEvent::Notice(notice));
    }

    fn changed(&mut self) {
        self.emit(ViewEvent::Changed);
    }
}
