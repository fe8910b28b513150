//! In-memory comment forest for one discussion view.
//!
//! Comments are kept in the order the API delivered them. Replies arrive
//! already nested on their parent comment, so the forest is never re-sorted
//! or re-parented here; appending a later page only adds comments whose id
//! has not been seen yet.

use std::collections::HashSet;

use crate::models::{Comment, Reply};

/// Drops repeated comment ids from a single batch, keeping arrival order.
pub fn build_page(raw: Vec<Comment>) -> Vec<Comment> {
    let mut page = CommentPage::default();
    page.append(raw);
    page.comments
}

#[derive(Debug, Clone, Default)]
pub struct CommentPage {
    comments: Vec<Comment>,
    seen: HashSet<String>,
}

/// One renderable row of the forest.
#[derive(Debug, Clone, Copy)]
pub enum ThreadEntry<'a> {
    Comment {
        /// 1-based position of the comment in the page.
        number: usize,
        comment: &'a Comment,
    },
    Reply {
        parent: &'a Comment,
        reply: &'a Reply,
    },
}

impl ThreadEntry<'_> {
    pub fn slug(&self) -> &str {
        match self {
            Self::Comment { comment, .. } => &comment.slug,
            Self::Reply { reply, .. } => &reply.slug,
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Self::Comment { .. } => 0,
            Self::Reply { .. } => 1,
        }
    }
}

impl CommentPage {
    pub fn from_comments(raw: Vec<Comment>) -> Self {
        let mut page = Self::default();
        page.append(raw);
        page
    }

    /// Appends unseen comments and returns how many were added.
    pub fn append(&mut self, batch: Vec<Comment>) -> usize {
        let before = self.comments.len();
        for comment in batch {
            if self.seen.insert(comment.id.clone()) {
                self.comments.push(comment);
            }
        }
        self.comments.len() - before
    }

    pub fn replace(&mut self, batch: Vec<Comment>) {
        self.comments.clear();
        self.seen.clear();
        self.append(batch);
    }

    pub fn clear(&mut self) {
        self.comments.clear();
        self.seen.clear();
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn comment(&self, comment_id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    pub fn reply(&self, reply_id: &str) -> Option<&Reply> {
        self.comments
            .iter()
            .flat_map(|c| c.replies.iter())
            .find(|r| r.id == reply_id)
    }

    /// Depth-first walk: each comment followed by its replies.
    pub fn entries(&self) -> impl Iterator<Item = ThreadEntry<'_>> {
        self.comments
            .iter()
            .enumerate()
            .flat_map(|(index, comment)| {
                std::iter::once(ThreadEntry::Comment {
                    number: index + 1,
                    comment,
                })
                .chain(
                    comment
                        .replies
                        .iter()
                        .map(move |reply| ThreadEntry::Reply { parent: comment, reply }),
                )
            })
    }

    /// Finds the entry anchored at `slug`, whether comment or reply.
    pub fn find_anchor(&self, slug: &str) -> Option<ThreadEntry<'_>> {
        self.entries().find(|entry| entry.slug() == slug)
    }
}
