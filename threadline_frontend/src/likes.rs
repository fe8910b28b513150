use std::collections::HashSet;

use crate::models::{Like, Profile};

/// True when `user_id` has liked the target. Anonymous viewers never have.
pub fn is_liked_by(likes: &[Like], user_id: Option<&str>) -> bool {
    let Some(user_id) = user_id.filter(|id| !id.is_empty()) else {
        return false;
    };
    likes.iter().any(|like| like.user_id == user_id)
}

/// Like records deduplicated by user, first record wins.
#[derive(Debug, Clone, Default)]
pub struct LikeSet<'a> {
    likes: Vec<&'a Like>,
}

impl<'a> LikeSet<'a> {
    pub fn new(likes: &'a [Like]) -> Self {
        let mut seen = HashSet::new();
        let likes = likes
            .iter()
            .filter(|like| seen.insert(like.user_id.as_str()))
            .collect();
        Self { likes }
    }

    pub fn len(&self) -> usize {
        self.likes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.likes.is_empty()
    }

    pub fn contains(&self, user_id: Option<&str>) -> bool {
        match user_id.filter(|id| !id.is_empty()) {
            Some(user_id) => self.likes.iter().any(|like| like.user_id == user_id),
            None => false,
        }
    }

    /// Profiles of everyone who liked, for the "who liked this" popover.
    pub fn likers(&self) -> impl Iterator<Item = &'a Profile> + '_ {
        self.likes.iter().filter_map(|like| like.profile.as_ref())
    }
}
