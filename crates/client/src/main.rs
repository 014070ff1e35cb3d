//! `glafrica-listing` -- create and edit livestock listings from the shell.
//!
//! Builds the listing form from a JSON manifest, walks the four form steps
//! with validation, and submits through the admin API. Create-mode progress
//! is kept as a local draft so a failed run can be resumed.
//!
//! ```bash
//! glafrica-listing create goat.json
//! glafrica-listing create --resume goat.json
//! glafrica-listing edit 3f1d...-...-... changes.json
//! glafrica-listing draft show
//! ```
//!
//! # Environment variables
//!
//! | Variable                  | Required | Default                        | Description                  |
//! |---------------------------|----------|--------------------------------|------------------------------|
//! | `GLAFRICA_API_URL`        | no       | `http://localhost:8000/api/v1` | Backend base URL             |
//! | `GLAFRICA_API_TOKEN`      | no*      | --                             | Bearer access token          |
//! | `GLAFRICA_ADMIN_USERNAME` | no*      | --                             | Admin login when no token    |
//! | `GLAFRICA_ADMIN_PASSWORD` | no*      | --                             | Admin login when no token    |
//! | `GLAFRICA_DRAFT_DIR`      | no       | `.glafrica`                    | Draft directory              |
//! | `REQUEST_TIMEOUT_SECS`    | no       | `30`                           | HTTP timeout                 |
//! | `LOG_FORMAT`              | no       | `text`                         | `text` or `json`             |
//!
//! \* `create` and `edit` need either a token or username and password.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use glafrica_client::admin_api::AdminApiClient;
use glafrica_client::auth;
use glafrica_client::config::ClientConfig;
use glafrica_client::logging::{self, LogFormat};
use glafrica_client::manifest::ListingManifest;
use glafrica_core::draft::DraftStore;
use glafrica_core::form::FormState;
use glafrica_core::media::Rejection;
use glafrica_core::store::FileStore;
use glafrica_core::submission::{SubmissionError, SubmissionOrchestrator};
use glafrica_core::types::ListingId;
use glafrica_core::validation::FieldErrors;
use glafrica_core::wizard::FormStep;

#[derive(Parser)]
#[command(name = "glafrica-listing")]
#[command(version)]
#[command(about = "Create and edit livestock listings", long_about = None)]
struct Cli {
    /// Backend base URL, including `/api/v1`
    #[arg(long)]
    api_url: Option<String>,

    /// Bearer access token
    #[arg(long)]
    token: Option<String>,

    /// Directory for the saved draft
    #[arg(long)]
    draft_dir: Option<PathBuf>,

    /// Log format: text or json
    #[arg(long)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a listing from a manifest
    Create {
        /// Start from the saved draft; manifest fields override it
        #[arg(long)]
        resume: bool,
        manifest: PathBuf,
    },
    /// Edit a stored listing
    Edit {
        listing_id: ListingId,
        manifest: PathBuf,
    },
    /// Inspect or remove the saved draft
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },
}

#[derive(Subcommand)]
enum DraftAction {
    /// Print the saved draft as JSON
    Show,
    /// Delete the saved draft
    Clear,
}

impl Cli {
    fn apply(&self, config: &mut ClientConfig) {
        if let Some(url) = &self.api_url {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(token) = &self.token {
            config.api_token = Some(token.clone());
        }
        if let Some(dir) = &self.draft_dir {
            config.draft_dir = dir.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    cli.apply(&mut config);
    logging::init_tracing(config.log_format);

    match cli.command {
        Command::Create { resume, manifest } => create(&config, &manifest, resume).await,
        Command::Edit {
            listing_id,
            manifest,
        } => edit(&config, listing_id, &manifest).await,
        Command::Draft { action } => {
            tokio::task::spawn_blocking(move || draft(&config, action)).await?
        }
    }
}

async fn create(config: &ClientConfig, manifest_path: &Path, resume: bool) -> anyhow::Result<()> {
    let manifest = Arc::new(ListingManifest::load(manifest_path).await?);
    let form = FormState::new().with_drafts(draft_store(config));

    let fields = Arc::clone(&manifest);
    let (mut form, prepared) = on_blocking_pool(form, move |form| -> anyhow::Result<()> {
        if resume {
            if form.load_draft() {
                tracing::info!(step = form.step().number(), "Resumed saved draft");
            } else {
                tracing::warn!("No usable draft to resume, starting empty");
            }
        }

        fields.apply_fields(form)?;
        if let Err(e) = walk_steps(form) {
            form.save_draft();
            return Err(e);
        }
        Ok(())
    })
    .await?;
    prepared?;
    report_rejections(&manifest.apply_media(&mut form).await?);

    let orchestrator = connect(config).await?;
    submit(&orchestrator, &mut form).await?;
    Ok(())
}

async fn edit(config: &ClientConfig, id: ListingId, manifest_path: &Path) -> anyhow::Result<()> {
    let manifest = ListingManifest::load(manifest_path).await?;
    let orchestrator = connect(config).await?;

    let mut form = orchestrator
        .load_for_edit(id)
        .await
        .with_context(|| format!("Could not load listing {id}"))?;

    manifest.apply_fields(&mut form)?;
    walk_steps(&mut form)?;
    report_rejections(&manifest.apply_media(&mut form).await?);

    submit(&orchestrator, &mut form).await?;
    Ok(())
}

fn draft(config: &ClientConfig, action: DraftAction) -> anyhow::Result<()> {
    let drafts = draft_store(config);
    match action {
        DraftAction::Show => match drafts.load() {
            Some(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot)?),
            None => println!("No saved draft"),
        },
        DraftAction::Clear => {
            drafts.clear();
            println!("Draft cleared");
        }
    }
    Ok(())
}

// ---- helpers ----

fn draft_store(config: &ClientConfig) -> DraftStore {
    DraftStore::new(Arc::new(FileStore::new(&config.draft_dir)))
}

/// Run synchronous form work that may touch the file-backed draft store.
async fn on_blocking_pool<T, F>(mut form: FormState, work: F) -> anyhow::Result<(FormState, T)>
where
    F: FnOnce(&mut FormState) -> T + Send + 'static,
    T: Send + 'static,
{
    let joined = tokio::task::spawn_blocking(move || {
        let out = work(&mut form);
        (form, out)
    })
    .await?;
    Ok(joined)
}

async fn connect(config: &ClientConfig) -> anyhow::Result<SubmissionOrchestrator<AdminApiClient>> {
    let http = config.http_client()?;
    let token = auth::access_token(&http, config).await?;
    let api = AdminApiClient::with_client(http, config.api_url.clone()).with_token(token);
    Ok(SubmissionOrchestrator::new(api))
}

/// Validate every step from the first, stopping at the first invalid one.
fn walk_steps(form: &mut FormState) -> anyhow::Result<()> {
    form.go_to_step(FormStep::BasicInfo.number())?;
    while !form.step().is_last() {
        let step = form.step();
        if !form.next_step() {
            report_errors(form.errors());
            bail!("{step} has invalid fields");
        }
    }
    Ok(())
}

async fn submit(
    orchestrator: &SubmissionOrchestrator<AdminApiClient>,
    form: &mut FormState,
) -> anyhow::Result<ListingId> {
    match orchestrator.submit_with(form, |id| println!("{id}")).await {
        Ok(id) => Ok(id),
        Err(SubmissionError::Validation(errors)) => {
            report_errors(&errors);
            bail!("Listing is incomplete");
        }
        Err(e) => Err(e.into()),
    }
}

fn report_errors(errors: &FieldErrors) {
    for (field, message) in errors {
        eprintln!("  {field}: {message}");
    }
}

fn report_rejections(rejected: &[Rejection]) {
    for rejection in rejected {
        eprintln!("  skipped {rejection}");
    }
}

#[cfg(test)]
mod tests {
    use glafrica_core::form::FieldUpdate;

    use super::*;

    #[tokio::test]
    async fn draft_work_on_blocking_pool_returns_form() {
        let dir = tempfile::tempdir().unwrap();
        let drafts = DraftStore::new(Arc::new(FileStore::new(dir.path())));
        let mut form = FormState::new().with_drafts(drafts.clone());
        form.update(FieldUpdate::Name("Boer buck".into()));

        let (form, saved) = on_blocking_pool(form, |form| {
            form.save_draft();
            form.has_saved_draft()
        })
        .await
        .unwrap();

        assert!(saved);
        assert_eq!(form.fields().name, "Boer buck");
        assert_eq!(drafts.load().unwrap().data.name, "Boer buck");
    }
}
