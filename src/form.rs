//! Single-page form runner.
//!
//! `GET /` serves the form, `POST /analyze` runs one analysis from the
//! submitted file and target vibe and serves the same page with the outcome.
//! Every failure is rendered as a banner; none of them stop the server.

use crate::analyzer::VibeAnalyzer;
use crate::client::VibeClient;
use crate::error::{ErrorKind, Result, VibeError};
use crate::image::{ImageFormat, ImageUpload};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag};
use std::net::SocketAddr;
use std::sync::Arc;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// What the page shows below the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing submitted yet.
    Idle,
    /// The model's text, rendered as Markdown.
    Success(String),
    /// Input was missing; no call was made.
    Warning(String),
    /// The call (or the upload) failed.
    Error(String),
}

impl Outcome {
    /// Maps an analysis result to what the page shows.
    pub fn from_result(result: Result<String>) -> Self {
        match result {
            Ok(text) => Self::Success(text),
            Err(e) if e.kind() == ErrorKind::MissingInput => Self::Warning(e.to_string()),
            Err(e) => Self::Error(e.to_string()),
        }
    }
}

/// Fields collected from one form submission.
#[derive(Debug, Default)]
pub struct Submission {
    /// The uploaded file, if one was chosen.
    pub image: Option<ImageUpload>,
    /// Target vibe text.
    pub target_vibe: String,
    /// Label of the button that triggered the run.
    pub action: Option<String>,
}

/// Builds the router for the form runner.
pub fn router<C>(analyzer: Arc<VibeAnalyzer<C>>) -> Router
where
    C: VibeClient + 'static,
{
    Router::new()
        .route("/", get(index::<C>))
        .route("/analyze", get(index::<C>).post(analyze::<C>))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(analyzer)
}

/// Binds `addr` and serves the form until the process is stopped.
pub async fn serve<C>(addr: SocketAddr, analyzer: Arc<VibeAnalyzer<C>>) -> Result<()>
where
    C: VibeClient + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve_on(listener, analyzer).await
}

/// Serves the form on an already bound listener.
pub async fn serve_on<C>(
    listener: tokio::net::TcpListener,
    analyzer: Arc<VibeAnalyzer<C>>,
) -> Result<()>
where
    C: VibeClient + 'static,
{
    tracing::info!(
        "form runner listening on http://{}",
        listener.local_addr()?
    );
    axum::serve(listener, router(analyzer)).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn index<C: VibeClient + 'static>(
    State(analyzer): State<Arc<VibeAnalyzer<C>>>,
) -> Html<String> {
    Html(render_page(&Outcome::Idle, "", analyzer.default_action()))
}

async fn analyze<C: VibeClient + 'static>(
    State(analyzer): State<Arc<VibeAnalyzer<C>>>,
    multipart: Multipart,
) -> (StatusCode, Html<String>) {
    let submission = match read_submission(multipart).await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("rejected form submission: {e}");
            let page = render_page(
                &Outcome::Error(e.to_string()),
                "",
                analyzer.default_action(),
            );
            return (StatusCode::BAD_REQUEST, Html(page));
        }
    };

    let result = analyzer
        .analyze(
            submission.image,
            &submission.target_vibe,
            submission.action.as_deref(),
        )
        .await;

    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(kind = ?e.kind(), "vibe analysis failed: {e}");
            status_for(e)
        }
    };

    let outcome = Outcome::from_result(result.map(|r| r.text));
    let page = render_page(
        &outcome,
        &submission.target_vibe,
        analyzer.default_action(),
    );
    (status, Html(page))
}

fn status_for(err: &VibeError) -> StatusCode {
    match err.kind() {
        ErrorKind::MissingInput => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::RemoteCallFailure => StatusCode::BAD_GATEWAY,
        ErrorKind::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Local => StatusCode::BAD_REQUEST,
    }
}

/// Reads the `image`, `target_vibe` and `action` fields.
///
/// A file input left empty arrives as a part with no bytes; that counts as
/// no image.
async fn read_submission(mut multipart: Multipart) -> Result<Submission> {
    let mut submission = Submission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| VibeError::InvalidRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let hint = upload_hint(field.content_type(), field.file_name());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| VibeError::InvalidRequest(e.body_text()))?;
                if !data.is_empty() {
                    submission.image = Some(ImageUpload::from_bytes(data.to_vec(), hint.as_deref())?);
                }
            }
            "target_vibe" => {
                submission.target_vibe = field
                    .text()
                    .await
                    .map_err(|e| VibeError::InvalidRequest(e.body_text()))?;
            }
            "action" => {
                let action = field
                    .text()
                    .await
                    .map_err(|e| VibeError::InvalidRequest(e.body_text()))?;
                submission.action = Some(action);
            }
            _ => {}
        }
    }

    Ok(submission)
}

/// Picks the declared media type, falling back to the file extension.
fn upload_hint(content_type: Option<&str>, file_name: Option<&str>) -> Option<String> {
    content_type
        .filter(|ct| ImageFormat::from_mime_type(ct).is_some())
        .map(str::to_string)
        .or_else(|| {
            file_name
                .and_then(|name| name.rsplit_once('.'))
                .map(|(_, ext)| ext.to_string())
        })
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders model Markdown to HTML.
///
/// Raw HTML in the text is shown escaped, and links or images with a
/// script-capable scheme point nowhere.
pub fn render_markdown(text: &str) -> String {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let events = Parser::new_ext(text, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::with_capacity(text.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut out, events);
    out
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let scheme = url.trim_start().to_ascii_lowercase();
    if ["javascript:", "vbscript:", "data:"]
        .iter()
        .any(|s| scheme.starts_with(s))
    {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

/// Renders the whole page for `outcome`, keeping the typed target vibe.
pub fn render_page(outcome: &Outcome, target_vibe: &str, action: &str) -> String {
    let section = match outcome {
        Outcome::Idle => String::new(),
        Outcome::Success(text) => format!(
            "<section class=\"result\"><h2>Result</h2><div id=\"result\">{}</div></section>",
            render_markdown(text)
        ),
        Outcome::Warning(msg) => format!(
            "<div class=\"banner warning\" role=\"status\">{}</div>",
            escape_html(msg)
        ),
        Outcome::Error(msg) => format!(
            "<div class=\"banner error\" role=\"alert\">Error: {}</div>",
            escape_html(msg)
        ),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>OMNI-VIBE</title>
<style>
body {{ font-family: system-ui, sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }}
label {{ display: block; margin-top: 1rem; font-weight: 600; }}
input[type=text] {{ width: 100%; padding: .5rem; }}
button {{ margin-top: 1rem; padding: .5rem 1.5rem; }}
.banner {{ margin-top: 1.5rem; padding: .75rem 1rem; border-radius: .25rem; }}
.warning {{ background: #fff4d6; border: 1px solid #e0b400; }}
.error {{ background: #fde2e2; border: 1px solid #d33; }}
#result pre {{ background: #f4f4f4; padding: .75rem; overflow-x: auto; }}
#result table {{ border-collapse: collapse; }}
#result th, #result td {{ border: 1px solid #ccc; padding: .25rem .5rem; }}
</style>
</head>
<body>
<h1>OMNI-VIBE Creative Director</h1>
<form method="post" action="/analyze" enctype="multipart/form-data">
<label for="image">Upload a sketch or photo</label>
<input id="image" name="image" type="file" accept="{accept}">
<label for="target_vibe">Target vibe</label>
<input id="target_vibe" name="target_vibe" type="text" placeholder="e.g. Industrial Luxury" value="{vibe}">
<button type="submit" name="action" value="{action}">{action}</button>
</form>
{section}
</body>
</html>
"#,
        accept = ImageFormat::accept_list(),
        vibe = escape_html(target_vibe),
        action = escape_html(action),
        section = section,
    )
}
