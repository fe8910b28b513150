use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::models::{
    Comment, CommentsPage, CreatedEntity, Discussion, DiscussionsPage, Envelope, LikeInput, LikeTarget,
    NewComment, NewReply, Report, Settings,
};

/// Everything the discussion view needs from the forum API.
#[async_trait]
pub trait ForumGateway: Send + Sync + 'static {
    async fn get_discussion(&self, slug: &str) -> GatewayResult<Discussion>;

    async fn update_discussion_views(&self, discussion_id: &str, view: u64) -> GatewayResult<()>;

    async fn list_comments(
        &self,
        discussion_id: &str,
        page: u32,
        limit: u32,
    ) -> GatewayResult<CommentsPage>;

    async fn create_comment(&self, input: &NewComment) -> GatewayResult<CreatedEntity>;

    async fn create_reply(&self, input: &NewReply) -> GatewayResult<CreatedEntity>;

    async fn toggle_like(&self, target: &LikeTarget, input: &LikeInput) -> GatewayResult<()>;

    async fn submit_report(&self, report: &Report) -> GatewayResult<()>;

    async fn get_settings(&self) -> GatewayResult<Settings>;

    async fn list_popular(&self, page: u32, limit: u32) -> GatewayResult<DiscussionsPage>;
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> GatewayResult<Self> {
        let base_url = sanitize_base_url(config.api_url.clone())?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            base_url,
            api_key: config.api_key.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) -> GatewayResult<()> {
        self.base_url = sanitize_base_url(base_url.into())?;
        Ok(())
    }

    fn url(&self, segments: &[&str]) -> GatewayResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| GatewayError::InvalidUrl(format!("{}: {err}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, path = url.path(), "api request");
        let builder = self
            .client
            .request(method, url)
            .header("content-type", "application/json");
        match &self.api_key {
            Some(key) => builder.header("apikey", key),
            None => builder,
        }
    }

    /// Sends the request and unwraps the `{success, data}` envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        action: &'static str,
    ) -> GatewayResult<Envelope<T>> {
        let response = builder.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound {
                what: action.to_string(),
            });
        }
        let body = response.text().await?;
        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => return Err(GatewayError::Rejected { action }),
            Err(err) => return Err(err.into()),
        };
        if !envelope.success {
            return Err(GatewayError::Rejected { action });
        }
        Ok(envelope)
    }

    async fn send_ack(&self, builder: RequestBuilder, action: &'static str) -> GatewayResult<()> {
        self.send::<serde_json::Value>(builder, action).await.map(|_| ())
    }
}

fn require<T>(envelope: Envelope<T>, action: &'static str) -> GatewayResult<T> {
    envelope.data.ok_or(GatewayError::Rejected { action })
}

fn page_query(page: u32, limit: u32) -> [(&'static str, String); 2] {
    [("page", page.to_string()), ("limit", limit.to_string())]
}

#[async_trait]
impl ForumGateway for ApiClient {
    async fn get_discussion(&self, slug: &str) -> GatewayResult<Discussion> {
        let url = self.url(&["discussions", slug])?;
        let envelope = self
            .send::<Discussion>(self.request(Method::GET, url), "load discussion")
            .await
            .map_err(|err| match err {
                GatewayError::NotFound { .. } => GatewayError::NotFound {
                    what: format!("discussion {slug}"),
                },
                other => other,
            })?;
        envelope.data.ok_or_else(|| GatewayError::NotFound {
            what: format!("discussion {slug}"),
        })
    }

    async fn update_discussion_views(&self, discussion_id: &str, view: u64) -> GatewayResult<()> {
        let url = self.url(&["discussions", discussion_id])?;
        let builder = self.request(Method::PATCH, url).json(&json!({ "view": view }));
        self.send_ack(builder, "record view").await
    }

    async fn list_comments(
        &self,
        discussion_id: &str,
        page: u32,
        limit: u32,
    ) -> GatewayResult<CommentsPage> {
        let url = self.url(&["comments", discussion_id])?;
        let builder = self.request(Method::GET, url).query(&page_query(page, limit));
        let envelope = self.send::<Vec<Comment>>(builder, "load comments").await?;
        let total = envelope.total.unwrap_or_default();
        Ok(CommentsPage {
            data: envelope.data.unwrap_or_default(),
            total,
        })
    }

    async fn create_comment(&self, input: &NewComment) -> GatewayResult<CreatedEntity> {
        let url = self.url(&["comments"])?;
        let builder = self.request(Method::POST, url).json(input);
        require(self.send(builder, "create comment").await?, "create comment")
    }

    async fn create_reply(&self, input: &NewReply) -> GatewayResult<CreatedEntity> {
        let url = self.url(&["comments", "reply"])?;
        let builder = self.request(Method::POST, url).json(input);
        require(self.send(builder, "create reply").await?, "create reply")
    }

    async fn toggle_like(&self, target: &LikeTarget, input: &LikeInput) -> GatewayResult<()> {
        let url = self.url(&["likes", target.path_segment()])?;
        let builder = self.request(Method::POST, url).json(input);
        self.send_ack(builder, "toggle like").await
    }

    async fn submit_report(&self, report: &Report) -> GatewayResult<()> {
        let url = self.url(&["reports"])?;
        let builder = self.request(Method::POST, url).json(report);
        self.send_ack(builder, "submit report").await
    }

    async fn get_settings(&self) -> GatewayResult<Settings> {
        let url = self.url(&["settings"])?;
        let envelope = self
            .send::<Settings>(self.request(Method::GET, url), "load settings")
            .await?;
        Ok(envelope.data.unwrap_or_default())
    }

    async fn list_popular(&self, page: u32, limit: u32) -> GatewayResult<DiscussionsPage> {
        let url = self.url(&["popular"])?;
        let builder = self.request(Method::GET, url).query(&page_query(page, limit));
        let envelope = self.send::<Vec<Discussion>>(builder, "load popular discussions").await?;
        let total = envelope.total.unwrap_or_default();
        Ok(DiscussionsPage {
            data: envelope.data.unwrap_or_default(),
            total,
        })
    }
}

pub(crate) fn sanitize_base_url(mut base: String) -> GatewayResult<String> {
    base = base.trim().to_string();
    if !base.starts_with("http://") && !base.starts_with("https://") {
        base = format!("http://{base}");
    }
    // Remove trailing slash for consistency
    while base.ends_with('/') {
        base.pop();
    }
    // Validate once
    Url::parse(&base).map_err(|err| GatewayError::InvalidUrl(format!("{base}: {err}")))?;
    Ok(base)
}
