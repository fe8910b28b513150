use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use threadline_frontend::app::{LoadState, NoticeKind};
use threadline_frontend::listing::PopularDiscussions;
use threadline_frontend::models::ReportKind;
use threadline_frontend::telemetry;
use threadline_frontend::{ApiClient, ClientConfig, DiscussionSession, ViewEvent, Viewer};

mod render;

#[derive(Parser)]
#[command(author, version, about = "Read and take part in Threadline discussions")]
struct Args {
    /// TOML config file, defaults to ~/.threadline/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Overrides the API base URL from config and environment
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Act as this user id; anonymous when omitted
    #[arg(long, global = true)]
    user: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a discussion with its comment thread
    Show {
        slug: String,
        /// Comment or reply slug to jump to
        #[arg(long)]
        anchor: Option<String>,
        /// How many comment pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Post a top-level comment
    Comment { slug: String, text: String },
    /// Reply to a comment
    Reply {
        slug: String,
        /// Id of the comment being answered
        #[arg(long)]
        to: String,
        text: String,
    },
    /// Toggle a like on the discussion, a comment or a reply
    Like {
        slug: String,
        #[arg(long, conflicts_with = "reply")]
        comment: Option<String>,
        #[arg(long)]
        reply: Option<String>,
    },
    /// Report the discussion to moderators
    Report {
        slug: String,
        /// One of: inappropriate, spam, false-information, nudity, hate-speech,
        /// violence, harassment, terrorism, self-injury, child-abuse
        #[arg(long)]
        kind: ReportKind,
    },
    /// List popular discussions
    Popular {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    let args = Args::parse();

    let mut config = ClientConfig::load(args.config.as_deref())?;
    if let Some(url) = args.api_url.as_deref() {
        config.api_url = url.to_string();
    }
    let api = Arc::new(ApiClient::new(&config).context("failed to build API client")?);
    let viewer = args.user.map(Viewer::user).unwrap_or_default();
    tracing::debug!(api_url = %config.api_url, signed_in = viewer.is_authenticated(), "client ready");

    match args.command {
        Command::Popular { page } => popular(api, &config, page).await,
        Command::Show {
            slug,
            anchor,
            pages,
        } => {
            let mut view = OpenView::open(api, viewer, &config, slug, anchor).await?;
            for _ in 1..pages {
                if !view.session.load_more() {
                    break;
                }
                view.settle().await;
            }
            view.print();
            Ok(())
        }
        Command::Comment { slug, text } => {
            let mut view = OpenView::open(api, viewer, &config, slug, None).await?;
            let started = view.session.submit_comment(&text);
            view.finish(started).await
        }
        Command::Reply { slug, to, text } => {
            let mut view = OpenView::open(api, viewer, &config, slug, None).await?;
            let started = view.session.submit_reply(&to, &text);
            view.finish(started).await
        }
        Command::Like {
            slug,
            comment,
            reply,
        } => {
            let mut view = OpenView::open(api, viewer, &config, slug, None).await?;
            let started = match (comment, reply) {
                (Some(comment_id), _) => view.session.like_comment(&comment_id),
                (None, Some(reply_id)) => view.session.like_reply(&reply_id),
                (None, None) => view.session.like_discussion(),
            };
            view.finish(started).await
        }
        Command::Report { slug, kind } => {
            let mut view = OpenView::open(api, viewer, &config, slug, None).await?;
            let started = view.session.report(kind);
            view.finish(started).await
        }
    }
}

async fn popular(api: Arc<ApiClient>, config: &ClientConfig, page: u32) -> Result<()> {
    let mut listing = PopularDiscussions::new(api, config.page_limit);
    listing
        .set_page(page)
        .await
        .context("failed to load popular discussions")?;
    render::popular(&listing);
    Ok(())
}

/// A session that has finished its initial load, plus the events it produced.
struct OpenView {
    session: DiscussionSession<ApiClient>,
    events: flume::Receiver<ViewEvent>,
    anchor: Option<String>,
    failed: bool,
}

impl OpenView {
    async fn open(
        api: Arc<ApiClient>,
        viewer: Viewer,
        config: &ClientConfig,
        slug: String,
        fragment: Option<String>,
    ) -> Result<Self> {
        let mut session = DiscussionSession::new(api, viewer, config);
        let events = session.subscribe();
        session.open(slug.clone(), fragment);
        let mut view = Self {
            session,
            events,
            anchor: None,
            failed: false,
        };
        view.settle().await;

        let state = view.session.state();
        match state.load_state {
            LoadState::Ready => {}
            LoadState::NotFound => bail!("discussion {slug} not found"),
            _ => bail!("could not load discussion {slug}"),
        }
        if state.requires_login(view.session.viewer()) {
            bail!("discussion {slug} is only visible to signed-in users, pass --user");
        }
        Ok(view)
    }

    async fn settle(&mut self) {
        self.session.settle().await;
        self.drain();
    }

    fn drain(&mut self) {
        for event in self.events.try_iter() {
            match event {
                ViewEvent::Changed => {}
                ViewEvent::Notice(notice) => {
                    if notice.kind == NoticeKind::Error {
                        self.failed = true;
                    }
                    render::notice(&notice);
                }
                ViewEvent::ScrollTo(anchor) => self.anchor = Some(anchor),
            }
        }
    }

    fn print(&self) {
        render::discussion(&self.session, self.anchor.as_deref());
    }

    async fn finish(&mut self, started: bool) -> Result<()> {
        if !started {
            self.drain();
            bail!("nothing was sent");
        }
        self.settle().await;
        if self.failed {
            bail!("the server did not accept the request");
        }
        self.print();
        Ok(())
    }
}
