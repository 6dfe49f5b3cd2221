mod commands;
mod config;
mod error;
mod store;

use std::future::Future;

use guidebook_core::{BlockStore, EditorSession, EventBus, Guide, SlugRegistry};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::commands::Outcome;
use crate::store::FileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience)
    let _ = dotenvy::dotenv();

    let config = config::AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;

    // Logs go to stderr; stdout is the console.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let drafts = FileStore::open(&config.drafts_dir)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open drafts directory: {e:#}"))?;

    let title = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let title = if title.trim().is_empty() {
        "Untitled guide".to_string()
    } else {
        title
    };
    let guide = Guide::new(title).map_err(|e| anyhow::anyhow!("Invalid guide title: {e}"))?;
    let guide_id = guide.id();

    let event_bus = EventBus::new(config.event_bus_capacity);
    spawn_event_log(&event_bus);

    let mut session = EditorSession::open(
        guide,
        BlockStore::new(),
        drafts.registry_for(guide_id),
        drafts.clone(),
        config.autosave.clone(),
        event_bus,
    );
    spawn_status_log(&session);

    tracing::info!(
        %guide_id,
        drafts_dir = %drafts.dir().display(),
        draft = %drafts.draft_path(guide_id).display(),
        autosave = config.autosave.enabled,
        "Starting guide editor"
    );
    println!("Editing '{}' ({guide_id}). Type 'help' for commands.", session.guide().title());

    run_console(
        &mut session,
        BufReader::new(tokio::io::stdin()),
        shutdown_signal(),
    )
    .await;

    tracing::info!("Editor shut down gracefully");
    Ok(())
}

/// Apply console commands from `input` until `quit`, end of input, a read
/// error or `shutdown`. Pending changes are saved before the session closes,
/// however the loop ends.
async fn run_console<R, I>(
    session: &mut EditorSession<R>,
    input: I,
    shutdown: impl Future<Output = ()>,
) where
    R: SlugRegistry,
    I: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            _ = &mut shutdown => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "failed to read console input");
                break;
            }
        };
        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("error: {e}");
                continue;
            }
        };
        match commands::execute(session, command).await {
            Ok(Outcome::Reply(reply)) => println!("{reply}"),
            Ok(Outcome::Quit) => break,
            Err(e) => println!("error: {e}"),
        }
    }

    let guide_id = session.guide_id();
    if session.autosave().is_dirty() && session.autosave().is_enabled() {
        match session.save_now().await {
            Ok(()) => tracing::info!(%guide_id, "Pending changes saved"),
            Err(e) => tracing::error!(%guide_id, error = %e, "Pending changes could not be saved"),
        }
    }
    session.close();
}

/// Mirror editor events into the log.
fn spawn_event_log(event_bus: &EventBus) {
    let mut events = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => tracing::debug!(event = %json, "editor event"),
                    Err(e) => tracing::warn!(error = %e, "unserializable editor event"),
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event log lagging");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Log every auto-save status change until the engine goes away.
fn spawn_status_log<R: SlugRegistry>(session: &EditorSession<R>) {
    let mut status = session.autosave().subscribe();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let state = status.borrow_and_update().clone();
            if let Some(summary) = state.summary() {
                tracing::info!(status = ?state.status, retry_count = state.retry_count, "{summary}");
            }
        }
    });
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received Ctrl+C, shutting down..."); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down..."); }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DraftSlugs;
    use guidebook_core::{AutoSaveConfig, GuideId};

    fn session_in(drafts: &FileStore) -> EditorSession<DraftSlugs> {
        let guide = Guide::new("Lake Cabin").unwrap();
        let registry = drafts.registry_for(guide.id());
        EditorSession::open(
            guide,
            BlockStore::new(),
            registry,
            drafts.clone(),
            AutoSaveConfig::default(),
            EventBus::default(),
        )
    }

    fn read_draft(drafts: &FileStore, guide_id: GuideId) -> serde_json::Value {
        let bytes = std::fs::read(drafts.draft_path(guide_id)).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unreadable_input_still_flushes_pending_edits() {
        let dir = tempfile::tempdir().unwrap();
        let drafts = FileStore::open(dir.path()).await.unwrap();
        let mut session = session_in(&drafts);
        let guide_id = session.guide_id();

        let input: &[u8] = b"add HERO\ntitle Seaside Cabin\n\xff\xfe\nremove 1\n";
        run_console(&mut session, input, std::future::pending()).await;

        let draft = read_draft(&drafts, guide_id);
        assert_eq!(draft["title"], "Seaside Cabin");
        assert_eq!(draft["blocks"].as_array().unwrap().len(), 1);
        assert!(!session.autosave().is_dirty());
        assert!(session.autosave().is_closed());
    }

    #[tokio::test]
    async fn end_of_input_flushes_pending_edits() {
        let dir = tempfile::tempdir().unwrap();
        let drafts = FileStore::open(dir.path()).await.unwrap();
        let mut session = session_in(&drafts);
        let guide_id = session.guide_id();

        let input: &[u8] = b"add NOTICE\nbogus\n\nadd MAP\n";
        run_console(&mut session, input, std::future::pending()).await;

        let draft = read_draft(&drafts, guide_id);
        assert_eq!(draft["blocks"][0]["type"], "NOTICE");
        assert_eq!(draft["blocks"][1]["type"], "MAP");
        assert!(session.autosave().is_closed());
    }
}
