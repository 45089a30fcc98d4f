use std::{
    env,
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use blockquiz::editor_api::{EditorSession, resolve_editor_api_addr, router};
use blockquiz::logging::{DEFAULT_FILTER, init_tracing};
use blockquiz::logic::BlockQuizLogic;
use blockquiz::question::QuestionBank;
use blockquiz::settings::SettingsStore;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(DEFAULT_FILTER);

    let settings = SettingsStore::from_env().load();
    let bank = match &settings.question_bank_path {
        Some(path) => QuestionBank::load_json_file(path)
            .with_context(|| format!("Failed to load question bank {}", path.display()))?,
        None => QuestionBank::builtin(),
    };
    let logic = BlockQuizLogic::new(settings.session_config(), bank);
    let app = router(Arc::new(Mutex::new(EditorSession::new(logic))));

    let addr = resolve_editor_api_addr(|k| env::var(k).ok());
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind editor api on {addr}"))?;
    tracing::info!("editor api listening on http://{addr}");

    axum::serve(listener, app)
        .await
        .context("Editor api server stopped")
}
