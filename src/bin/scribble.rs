use clap::Parser;
use scribble::client::{
  run_create, run_delete, run_list, run_show, run_status, run_update, ApiClient, ClientArgs,
  Commands, EditRepl,
};
use scribble::types::DocumentPatch;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
  let args = ClientArgs::parse();

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into()),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  let timeout = (args.timeout > 0).then(|| Duration::from_secs(args.timeout));
  let client = ApiClient::with_timeout(&args.host, timeout)?;

  match args.command {
    Commands::Status => run_status(&client).await,
    Commands::List => run_list(&client, args.format).await,
    Commands::Show { id } => run_show(&client, id, args.format).await,
    Commands::Create { title, content } => {
      run_create(&client, &title, content.as_deref(), args.format).await
    }
    Commands::Rename { id, title } => {
      run_update(&client, id, DocumentPatch::title(title), args.format).await
    }
    Commands::Write { id, content, file } => {
      let content = match (content, file) {
        (Some(c), _) => c,
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => anyhow::bail!("Provide content or --file"),
      };
      run_update(&client, id, DocumentPatch::content(content), args.format).await
    }
    Commands::Delete { id } => run_delete(&client, id).await,
    Commands::Edit { id, quiet_ms } => {
      EditRepl::open(client, id, Duration::from_millis(quiet_ms))
        .await?
        .run()
        .await
    }
  }
}
