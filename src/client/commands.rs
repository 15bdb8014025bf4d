use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use uuid::Uuid;

use super::ApiClient;
use crate::types::{Document, DocumentPatch};

#[derive(Parser)]
#[command(name = "scribble", about = "Scribble client", version)]
pub struct ClientArgs {
  #[arg(short = 'H', long, env = "SCRIBBLE_URL", default_value = "localhost:3000")]
  pub host: String,
  #[arg(long, default_value = "table")]
  pub format: OutputFormat,
  /// Request timeout in seconds (0 = transport default)
  #[arg(long, default_value_t = 0)]
  pub timeout: u64,
  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
  #[default]
  Table,
  Json,
}

#[derive(Subcommand)]
pub enum Commands {
  /// Check that the server is up
  Status,
  /// List documents
  List,
  /// Print one document
  Show { id: Uuid },
  /// Create a document
  Create {
    title: String,
    #[arg(long)]
    content: Option<String>,
  },
  /// Change a document's title
  Rename { id: Uuid, title: String },
  /// Replace a document's content, from an argument or a file
  Write {
    id: Uuid,
    content: Option<String>,
    #[arg(short, long, conflicts_with = "content")]
    file: Option<String>,
  },
  /// Delete a document
  Delete { id: Uuid },
  /// Edit a document interactively with autosave
  Edit {
    id: Uuid,
    /// Quiet period before an edit is saved
    #[arg(long, default_value_t = 1000)]
    quiet_ms: u64,
  },
}

pub async fn run_status(client: &ApiClient) -> Result<(), anyhow::Error> {
  client.health().await?;
  println!("Server running at {}", client.base_url());
  Ok(())
}

pub async fn run_list(client: &ApiClient, format: OutputFormat) -> Result<(), anyhow::Error> {
  let docs = client.list().await?;
  match format {
    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&docs)?),
    OutputFormat::Table => {
      if docs.is_empty() {
        println!("{}", "No documents yet".dimmed());
        return Ok(());
      }
      let mut table = Table::new();
      table
        .load_preset(UTF8_FULL)
        .set_header(vec!["id", "title", "excerpt", "updated"]);
      for doc in &docs {
        table.add_row(vec![
          doc.id.to_string(),
          doc.display_title().to_string(),
          doc.excerpt(),
          doc.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
      }
      println!("{table}");
    }
  }
  Ok(())
}

pub async fn run_show(
  client: &ApiClient,
  id: Uuid,
  format: OutputFormat,
) -> Result<(), anyhow::Error> {
  let doc = client
    .get(id)
    .await?
    .ok_or_else(|| anyhow::anyhow!("Document {} not found", id))?;
  print_doc(&doc, format)
}

pub async fn run_create(
  client: &ApiClient,
  title: &str,
  content: Option<&str>,
  format: OutputFormat,
) -> Result<(), anyhow::Error> {
  let doc = client.create(title, content).await?;
  print_doc(&doc, format)
}

pub async fn run_update(
  client: &ApiClient,
  id: Uuid,
  patch: DocumentPatch,
  format: OutputFormat,
) -> Result<(), anyhow::Error> {
  let doc = client
    .update(id, &patch)
    .await?
    .ok_or_else(|| anyhow::anyhow!("Document {} not found", id))?;
  print_doc(&doc, format)
}

pub async fn run_delete(client: &ApiClient, id: Uuid) -> Result<(), anyhow::Error> {
  if client.delete(id).await? {
    println!("Deleted {}", id);
    Ok(())
  } else {
    anyhow::bail!("Document {} not found", id)
  }
}

fn print_doc(doc: &Document, format: OutputFormat) -> Result<(), anyhow::Error> {
  match format {
    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(doc)?),
    OutputFormat::Table => {
      println!("{} {}", doc.display_title().bold(), doc.id.to_string().dimmed());
      println!(
        "{}",
        format!(
          "created {}  updated {}",
          doc.created_at.to_rfc3339(),
          doc.updated_at.to_rfc3339()
        )
        .dimmed()
      );
      println!("{}", doc.content.as_deref().unwrap_or_default());
    }
  }
  Ok(())
}
