use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use uuid::Uuid;

use super::ApiClient;
use crate::autosave::{AutosaveSession, SaveStatus};

/// Line-oriented editor for one document.
///
/// Plain lines are escaped and appended to the content as paragraphs; every
/// line is an edit and goes through the debounced autosave.
pub struct EditRepl {
  session: AutosaveSession,
  editor: DefaultEditor,
}

impl EditRepl {
  pub async fn open(client: ApiClient, id: Uuid, quiet_period: Duration) -> Result<Self, anyhow::Error> {
    let doc = client
      .get(id)
      .await?
      .ok_or_else(|| anyhow::anyhow!("Document {} not found", id))?;
    let session = AutosaveSession::with_quiet_period(doc, Arc::new(client), quiet_period);
    Ok(Self {
      session,
      editor: DefaultEditor::new()?,
    })
  }

  pub async fn run(&mut self) -> Result<(), anyhow::Error> {
    let doc = self.session.document();
    println!("Editing {} {}", doc.display_title().green().bold(), doc.id.to_string().dimmed());
    println!("Type {} for help\n", ":help".cyan());

    let mut status_rx = self.session.subscribe();
    let watcher = tokio::spawn(async move {
      while status_rx.changed().await.is_ok() {
        let status = *status_rx.borrow_and_update();
        print_status(status);
      }
    });

    loop {
      match self.editor.readline(&format!("{} ", "scribble>".green())) {
        Ok(line) => {
          let _ = self.editor.add_history_entry(line.as_str());
          if line.starts_with(':') {
            if !self.command(line.trim()).await {
              break;
            }
          } else {
            let para = paragraph(&line);
            self.session.edit(|draft| draft.content.push_str(&para));
          }
        }
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
        Err(e) => {
          eprintln!("Error: {:?}", e);
          break;
        }
      }
    }

    if let Some(Err(e)) = self.session.close().await {
      eprintln!("{}: {}", "Unsaved changes".red(), e);
    }
    watcher.abort();
    Ok(())
  }

  async fn command(&self, cmd: &str) -> bool {
    let (name, arg) = match cmd.split_once(' ') {
      Some((n, a)) => (n, a.trim()),
      None => (cmd, ""),
    };
    match name {
      ":help" => println!(
        "Commands: :title <text>, :clear, :show, :save, :status, :quit\nAny other line is appended as a paragraph."
      ),
      ":title" => self.session.set_title(arg),
      ":clear" => self.session.set_content(""),
      ":show" => {
        let draft = self.session.draft();
        println!("{}\n{}", draft.title.bold(), draft.content);
      }
      ":save" => match self.session.save_now().await {
        Ok(_) => {}
        Err(e) => eprintln!("{}: {}", "Save failed".red(), e),
      },
      ":status" => print_status(self.session.status()),
      ":quit" | ":exit" => return false,
      _ => eprintln!("Unknown command"),
    }
    true
  }
}

/// Typed text is plain text, so markup characters are escaped.
fn paragraph(line: &str) -> String {
  format!("<p>{}</p>", html_escape::encode_text(line))
}

fn print_status(status: SaveStatus) {
  let label = match status {
    SaveStatus::Idle => status.label().green(),
    SaveStatus::Pending | SaveStatus::Saving => status.label().yellow(),
    SaveStatus::Error => status.label().red(),
  };
  println!("[{}]", label);
}
