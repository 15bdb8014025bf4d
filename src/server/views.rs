//! Server-rendered pages: the document list and a single document.
//!
//! Markup is bare; styling and the rich-text editor live in
//! the browser bundle.

use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use std::fmt::Write;

use super::api::{parse_id, AppError, AppState};
use crate::types::Document;

pub async fn list_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
  let docs = state.store.list().await?;
  Ok(Html(render_list(&docs, Utc::now())))
}

pub async fn document_page(
  State(state): State<AppState>,
  Path(id): Path<String>,
) -> Result<Response, AppError> {
  let doc = match parse_id(&id) {
    Some(id) => state.store.get(id).await?,
    None => None,
  };
  Ok(match doc {
    Some(doc) => Html(render_document(&doc, state.autosave_ms)).into_response(),
    None => (
      StatusCode::NOT_FOUND,
      Html(layout("Not found", "<p>Document not found.</p><a href=\"/\">Back</a>")),
    )
      .into_response(),
  })
}

fn layout(title: &str, body: &str) -> String {
  format!(
    "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
    text(title),
    body
  )
}

const CREATE_FORM: &str = r#"<form method="post" action="/actions/create">
<label>Document title <input type="text" name="title" placeholder="Enter document title..." required></label>
<button type="submit">Create Document</button>
</form>"#;

pub fn render_list(docs: &[Document], now: DateTime<Utc>) -> String {
  let mut body = String::new();
  let noun = if docs.len() == 1 { "document" } else { "documents" };
  let _ = write!(
    body,
    "<header><h1>Notes</h1></header>\n<h2>Your Documents</h2>\n<p class=\"count\">{} {}</p>\n{}\n",
    docs.len(),
    noun,
    CREATE_FORM
  );

  if docs.is_empty() {
    body.push_str("<p>No documents yet</p>\n<p>Create your first document to get started</p>\n");
    return layout("Notes", &body);
  }

  body.push_str("<ul class=\"docs\">\n");
  for doc in docs {
    let id = doc.id.to_string();
    let _ = write!(
      body,
      "<li>\n<a href=\"/doc/{}\"><h3>{}</h3>\n<p>{}</p>\n<span>Created {}</span> <span>Updated {}</span></a>\n\
       <form method=\"post\" action=\"/actions/delete\"><input type=\"hidden\" name=\"id\" value=\"{}\"><button type=\"submit\">Delete</button></form>\n</li>\n",
      attr(&id),
      text(doc.display_title()),
      text(&doc.excerpt()),
      time_ago(doc.created_at, now),
      time_ago(doc.updated_at, now),
      attr(&id),
    );
  }
  body.push_str("</ul>");
  layout("Notes", &body)
}

pub fn render_document(doc: &Document, autosave_ms: u64) -> String {
  // Content is stored HTML and is rendered as such.
  let body = format!(
    "<header><a href=\"/\">Back</a>\n<h1>{}</h1></header>\n<article data-doc-id=\"{}\" data-autosave-ms=\"{}\">\n{}\n</article>",
    text(doc.display_title()),
    attr(&doc.id.to_string()),
    autosave_ms,
    doc.editor_content()
  );
  layout(doc.display_title(), &body)
}

/// Coarse relative time, e.g. "5 minutes ago".
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let secs = (now - then).num_seconds().max(0);
  let (n, unit) = match secs {
    0..=44 => return "less than a minute ago".to_string(),
    45..=3_599 => ((secs + 30) / 60, "minute"),
    3_600..=86_399 => ((secs + 1_800) / 3_600, "hour"),
    86_400..=2_591_999 => ((secs + 43_200) / 86_400, "day"),
    2_592_000..=31_535_999 => (secs / 2_592_000, "month"),
    _ => (secs / 31_536_000, "year"),
  };
  let n = n.max(1);
  if n == 1 {
    format!("1 {} ago", unit)
  } else {
    format!("{} {}s ago", n, unit)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;
  use uuid::Uuid;

  fn doc(title: &str, content: &str) -> Document {
    let now = Utc::now();
    Document {
      id: Uuid::new_v4(),
      title: title.into(),
      content: Some(content.into()),
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn test_time_ago() {
    let now = Utc::now();
    assert_eq!(time_ago(now, now), "less than a minute ago");
    assert_eq!(time_ago(now - Duration::seconds(60), now), "1 minute ago");
    assert_eq!(time_ago(now - Duration::minutes(5), now), "5 minutes ago");
    assert_eq!(time_ago(now - Duration::hours(3), now), "3 hours ago");
    assert_eq!(time_ago(now - Duration::days(2), now), "2 days ago");
    assert_eq!(time_ago(now - Duration::days(400), now), "1 year ago");
    // clock skew
    assert_eq!(time_ago(now + Duration::hours(1), now), "less than a minute ago");
  }

  #[test]
  fn test_list_escapes_titles() {
    let d = doc("<script>alert(1)</script>", "<p>x</p>");
    let html = render_list(&[d], Utc::now());
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
    assert!(html.contains("1 document<"));
  }

  #[test]
  fn test_list_empty_state() {
    let html = render_list(&[], Utc::now());
    assert!(html.contains("0 documents"));
    assert!(html.contains("No documents yet"));
    assert!(html.contains("action=\"/actions/create\""));
  }

  #[test]
  fn test_list_has_inline_delete() {
    let d = doc("Plan", "");
    let html = render_list(std::slice::from_ref(&d), Utc::now());
    assert!(html.contains(&format!("name=\"id\" value=\"{}\"", d.id)));
    assert!(html.contains("No content"));
  }

  #[test]
  fn test_document_renders_content_html() {
    let d = doc("Plan", "<p>Hi <b>there</b></p>");
    let html = render_document(&d, 1000);
    assert!(html.contains("<p>Hi <b>there</b></p>"));
    assert!(html.contains("data-autosave-ms=\"1000\""));
    assert!(html.contains("<h1>Plan</h1>"));
  }
}
