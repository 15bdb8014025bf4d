use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Initial editor content for documents that have none yet.
pub const PLACEHOLDER_CONTENT: &str = "<p>Start writing your document...</p>";

/// Display title for documents whose title is empty.
pub const UNTITLED: &str = "Untitled document";

/// Maximum number of characters shown in a list excerpt.
pub const EXCERPT_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
  pub id: Uuid,
  pub title: String,
  #[serde(default)]
  pub content: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Document {
  /// Title as shown to a reader, falling back to a placeholder when empty.
  pub fn display_title(&self) -> &str {
    if self.title.trim().is_empty() {
      UNTITLED
    } else {
      &self.title
    }
  }

  /// Content to seed an editor with.
  pub fn editor_content(&self) -> &str {
    match self.content.as_deref() {
      Some(c) if !c.is_empty() => c,
      _ => PLACEHOLDER_CONTENT,
    }
  }

  /// Plain-text preview used by the document list.
  pub fn excerpt(&self) -> String {
    match self.content.as_deref() {
      Some(c) if !c.is_empty() => {
        let mut text: String = strip_tags(c).chars().take(EXCERPT_LENGTH).collect();
        text.push_str("...");
        text
      }
      _ => "No content".to_string(),
    }
  }
}

/// Partial update: only the fields that are `Some` are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content: Option<String>,
}

impl DocumentPatch {
  pub fn title(title: impl Into<String>) -> Self {
    Self {
      title: Some(title.into()),
      content: None,
    }
  }

  pub fn content(content: impl Into<String>) -> Self {
    Self {
      title: None,
      content: Some(content.into()),
    }
  }

  pub fn both(title: impl Into<String>, content: impl Into<String>) -> Self {
    Self {
      title: Some(title.into()),
      content: Some(content.into()),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.title.is_none() && self.content.is_none()
  }
}

/// Remove anything between `<` and the next `>`. An unterminated tag swallows
/// the rest of the input.
fn strip_tags(html: &str) -> String {
  let mut out = String::with_capacity(html.len());
  let mut in_tag = false;
  for c in html.chars() {
    match c {
      '<' => in_tag = true,
      '>' if in_tag => in_tag = false,
      _ if !in_tag => out.push(c),
      _ => {}
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn doc(title: &str, content: Option<&str>) -> Document {
    let now = Utc::now();
    Document {
      id: Uuid::new_v4(),
      title: title.into(),
      content: content.map(Into::into),
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn test_excerpt_strips_markup() {
    let d = doc("Notes", Some("<p>Hello <b>world</b></p>"));
    assert_eq!(d.excerpt(), "Hello world...");
  }

  #[test]
  fn test_excerpt_truncates() {
    let long = format!("<p>{}</p>", "a".repeat(250));
    let d = doc("Notes", Some(&long));
    assert_eq!(d.excerpt(), format!("{}...", "a".repeat(EXCERPT_LENGTH)));
  }

  #[test]
  fn test_excerpt_without_content() {
    assert_eq!(doc("Notes", None).excerpt(), "No content");
    assert_eq!(doc("Notes", Some("")).excerpt(), "No content");
  }

  #[test]
  fn test_unterminated_tag() {
    assert_eq!(strip_tags("before<p class="), "before");
  }

  #[test]
  fn test_display_title_fallback() {
    assert_eq!(doc("", None).display_title(), UNTITLED);
    assert_eq!(doc("  ", None).display_title(), UNTITLED);
    assert_eq!(doc("Plan", None).display_title(), "Plan");
  }

  #[test]
  fn test_editor_content_placeholder() {
    assert_eq!(doc("x", None).editor_content(), PLACEHOLDER_CONTENT);
    assert_eq!(doc("x", Some("<p>Hi</p>")).editor_content(), "<p>Hi</p>");
  }

  #[test]
  fn test_json_uses_camel_case() {
    let d = doc("Plan", Some("<p>x</p>"));
    let v = serde_json::to_value(&d).unwrap();
    assert!(v.get("createdAt").is_some());
    assert!(v.get("updatedAt").is_some());
    assert!(v.get("created_at").is_none());
  }

  #[test]
  fn test_patch_deserialize_partial() {
    let p: DocumentPatch = serde_json::from_str(r#"{"content":"<p>Hi</p>"}"#).unwrap();
    assert_eq!(p, DocumentPatch::content("<p>Hi</p>"));
    let empty: DocumentPatch = serde_json::from_str("{}").unwrap();
    assert!(empty.is_empty());
  }
}
