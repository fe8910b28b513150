use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_AVATAR: &str = "/images/avatar.png";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl Profile {
    /// Path of the avatar image relative to the site root.
    pub fn avatar_path(&self) -> String {
        match self.photo.as_deref() {
            Some(photo) if !photo.is_empty() => format!("/storage/{photo}"),
            _ => DEFAULT_AVATAR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub auth_required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub view: u64,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub likes: Vec<Like>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub profile: Option<Profile>,
}

impl Discussion {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.created_at.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub slug: String,
    pub comment: String,
    #[serde(default)]
    pub author: Profile,
    #[serde(default)]
    pub likes: Vec<Like>,
    #[serde(default)]
    pub replies: Vec<Reply>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Second-level response. Replies carry no nested replies of their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: String,
    pub slug: String,
    pub comment: String,
    pub reply_id: String,
    #[serde(default)]
    pub author: Profile,
    #[serde(default)]
    pub likes: Vec<Like>,
    #[serde(default)]
    pub created_at: Option<String>,
}

pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

/// Uniform `{success, data?, total?}` wrapper returned by every endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentsPage {
    pub data: Vec<Comment>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscussionsPage {
    pub data: Vec<Discussion>,
    pub total: u64,
}

/// Server-assigned identity of a freshly created comment or reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatedEntity {
    pub slug: String,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub ban_words: Option<String>,
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default)]
    pub site_description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub announcement_text: Option<String>,
    #[serde(default)]
    pub announcement_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub comment: String,
    pub discussion_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReply {
    pub comment: String,
    pub discussion_id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub reply_id: String,
}

impl NewReply {
    pub fn new(comment: String, discussion_id: String, user_id: String, reply_id: String) -> Self {
        Self {
            comment,
            discussion_id,
            user_id,
            kind: "reply".to_string(),
            reply_id,
        }
    }
}

/// Which entity a like toggle applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeTarget {
    Discussion,
    Comment(String),
    Reply(String),
}

impl LikeTarget {
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Discussion => "discussion",
            Self::Comment(_) => "comment",
            Self::Reply(_) => "reply",
        }
    }

    pub fn post_id(&self) -> Option<&str> {
        match self {
            Self::Discussion => None,
            Self::Comment(id) | Self::Reply(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeInput {
    pub user_id: String,
    pub discussion_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
}

impl LikeInput {
    pub fn for_target(target: &LikeTarget, user_id: String, discussion_id: String) -> Self {
        Self {
            user_id,
            discussion_id,
            post_id: target.post_id().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportKind {
    #[serde(rename = "Inappropiate content")]
    Inappropriate,
    #[serde(rename = "Fraud or Spam")]
    FraudOrSpam,
    #[serde(rename = "False information")]
    FalseInformation,
    #[serde(rename = "Nudity")]
    Nudity,
    #[serde(rename = "Hate speech")]
    HateSpeech,
    #[serde(rename = "Violence")]
    Violence,
    #[serde(rename = "Harassment")]
    Harassment,
    #[serde(rename = "Terrorism")]
    Terrorism,
    #[serde(rename = "Suicide or self injury")]
    SelfInjury,
    #[serde(rename = "Child abuse")]
    ChildAbuse,
}

impl ReportKind {
    pub const ALL: [ReportKind; 10] = [
        Self::Inappropriate,
        Self::FraudOrSpam,
        Self::FalseInformation,
        Self::Nudity,
        Self::HateSpeech,
        Self::Violence,
        Self::Harassment,
        Self::Terrorism,
        Self::SelfInjury,
        Self::ChildAbuse,
    ];

    /// Label sent on the wire and shown in the report menu.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Inappropriate => "Inappropiate content",
            Self::FraudOrSpam => "Fraud or Spam",
            Self::FalseInformation => "False information",
            Self::Nudity => "Nudity",
            Self::HateSpeech => "Hate speech",
            Self::Violence => "Violence",
            Self::Harassment => "Harassment",
            Self::Terrorism => "Terrorism",
            Self::SelfInjury => "Suicide or self injury",
            Self::ChildAbuse => "Child abuse",
        }
    }

    /// Short command-line friendly name.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Inappropriate => "inappropriate",
            Self::FraudOrSpam => "spam",
            Self::FalseInformation => "false-information",
            Self::Nudity => "nudity",
            Self::HateSpeech => "hate-speech",
            Self::Violence => "violence",
            Self::Harassment => "harassment",
            Self::Terrorism => "terrorism",
            Self::SelfInjury => "self-injury",
            Self::ChildAbuse => "child-abuse",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.key() == needle || kind.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown report category: {needle}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub discussion_id: String,
    #[serde(rename = "type")]
    pub kind: ReportKind,
    pub slug: String,
}
