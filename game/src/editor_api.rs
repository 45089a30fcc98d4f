use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use engine::agent::{AgentCommand, AgentHost, AgentResponse};
use engine::editor::{
    EditorAction, EditorGrid, EditorManifest, EditorPaletteEntry, EditorSnapshot, EditorStat,
    EditorTimeline, FramesRequest, GridOrigin, SeekRequest, StepRequest,
};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};

use crate::logic::{BlockQuizInput, BlockQuizLogic};
use crate::piece_set::PIECE_SET_LEN;
use crate::session::{GameSession, Phase, PlacementAttempt};

pub const EDITOR_API_ADDR_ENV: &str = "BLOCKQUIZ_EDITOR_API_ADDR";
pub const EDITOR_API_PORT_ENV: &str = "BLOCKQUIZ_EDITOR_API_PORT";
pub const DEFAULT_EDITOR_API_PORT: u16 = 4000;
const MAX_LISTED_OPTIONS: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorApiError {
    #[error("unknown actionId: {0}")]
    UnknownActionId(String),
}

pub struct EditorSession {
    host: AgentHost<BlockQuizLogic>,
}

impl EditorSession {
    pub fn new(logic: BlockQuizLogic) -> Self {
        Self {
            host: AgentHost::new(logic),
        }
    }

    pub fn manifest(&self) -> EditorManifest {
        let mut actions = vec![action(
            "place:<slot>:<row>:<col>",
            "Place piece (fill in slot, row, col)",
        )];
        for index in 0..MAX_LISTED_OPTIONS {
            actions.push(action(
                &format!("answer:{index}"),
                &format!("Answer option {}", index + 1),
            ));
        }
        actions.push(action("tick:1000", "Wait 1s"));
        actions.push(action("newGame", "New Game"));
        actions.push(action("noop", "Noop"));
        EditorManifest {
            title: "BlockQuiz".to_string(),
            actions,
        }
    }

    pub fn timeline(&self) -> EditorTimeline {
        let runner = self.host.runner();
        let tm = runner.timemachine();
        EditorTimeline {
            frame: runner.frame(),
            history_len: runner.history().len(),
            can_rewind: tm.can_rewind(),
            can_forward: tm.can_forward(),
        }
    }

    pub fn state(&mut self) -> EditorSnapshot {
        self.respond(AgentCommand::GetState)
    }

    pub fn step(&mut self, action_id: &str) -> Result<EditorSnapshot, EditorApiError> {
        let input = action_from_id(action_id)
            .ok_or_else(|| EditorApiError::UnknownActionId(action_id.to_string()))?;
        Ok(self.respond(AgentCommand::Step(input)))
    }

    pub fn rewind(&mut self, frames: usize) -> EditorSnapshot {
        self.respond(AgentCommand::Rewind { frames })
    }

    pub fn forward(&mut self, frames: usize) -> EditorSnapshot {
        self.respond(AgentCommand::Forward { frames })
    }

    pub fn seek(&mut self, frame: usize) -> EditorSnapshot {
        self.respond(AgentCommand::Seek { frame })
    }

    pub fn reset(&mut self) -> EditorSnapshot {
        self.respond(AgentCommand::Reset)
    }

    fn respond(&mut self, command: AgentCommand<BlockQuizInput>) -> EditorSnapshot {
        let frame = match self.host.handle(command) {
            AgentResponse::State { frame, .. } | AgentResponse::History { frame, .. } => frame,
        };
        snapshot_from_state(frame, self.host.runner().state())
    }
}

fn action(id: &str, label: &str) -> EditorAction {
    EditorAction {
        id: id.to_string(),
        label: label.to_string(),
    }
}

/// Parses `place:<slot>:<row>:<col>`, `answer:<index>`, `tick:<ms>`,
/// `newGame` and `noop`.
pub fn action_from_id(id: &str) -> Option<BlockQuizInput> {
    match id {
        "newGame" => return Some(BlockQuizInput::NewGame),
        "noop" => return Some(BlockQuizInput::Noop),
        _ => {}
    }
    let mut parts = id.split(':');
    let kind = parts.next()?;
    let input = match kind {
        "place" => {
            let slot = parts.next()?.parse().ok()?;
            let row = parts.next()?.parse().ok()?;
            let col = parts.next()?.parse().ok()?;
            BlockQuizInput::Place(PlacementAttempt::new(slot, row, col))
        }
        "answer" => BlockQuizInput::Answer(parts.next()?.parse().ok()?),
        "tick" => BlockQuizInput::Tick(parts.next()?.parse().ok()?),
        _ => return None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(input)
}

pub fn snapshot_from_state(frame: usize, state: &GameSession) -> EditorSnapshot {
    let state_json = serde_json::to_value(state).unwrap_or_else(|err| {
        tracing::warn!(%err, "session state did not serialize");
        serde_json::Value::Null
    });

    let stats_counts = state.stats();
    let mut stats = vec![
        EditorStat::new("score", state.score()),
        EditorStat::new("phase", state.phase_kind()),
        EditorStat::new("difficulty", state.difficulty()),
        EditorStat::new("streak", state.streak().current),
        EditorStat::new("bestStreak", state.streak().best),
        EditorStat::new("linesCleared", stats_counts.lines_cleared),
        EditorStat::new("piecesPlaced", stats_counts.pieces_placed),
        EditorStat::new(
            "questionsCorrect",
            format!(
                "{}/{}",
                stats_counts.questions_correct, stats_counts.questions_answered
            ),
        ),
    ];
    for slot in 0..PIECE_SET_LEN {
        let label = state
            .pieces()
            .get(slot)
            .map(|shape| shape.label().to_string())
            .unwrap_or_else(|_| "-".to_string());
        stats.push(EditorStat::new(format!("slot{slot}"), label));
    }
    match state.phase() {
        Phase::AwaitingAnswer { question, timer } => {
            stats.push(EditorStat::new("question", &question.question));
            for (index, option) in question.options.iter().enumerate() {
                stats.push(EditorStat::new(format!("option{index}"), option));
            }
            if let Some(timer) = timer {
                stats.push(EditorStat::new(
                    "answerMsLeft",
                    timer.remaining().as_millis(),
                ));
            }
        }
        Phase::GameOver { reason } => {
            stats.push(EditorStat::new("gameOver", format!("{reason:?}")));
        }
        _ => {}
    }

    let grid = EditorGrid {
        origin: GridOrigin::TopLeft,
        cells: state.grid().to_u8_rows(),
        palette: Some(default_palette()),
    };

    EditorSnapshot {
        frame,
        state: state_json,
        stats,
        grid: Some(grid),
    }
}

fn default_palette() -> Vec<EditorPaletteEntry> {
    vec![
        EditorPaletteEntry {
            value: 0,
            rgba: [24, 24, 32, 255],
            label: Some("empty".to_string()),
        },
        EditorPaletteEntry {
            value: 1,
            rgba: [86, 156, 214, 255],
            label: Some("occupied".to_string()),
        },
    ]
}

pub type SharedEditorSession = Arc<Mutex<EditorSession>>;

pub fn resolve_editor_api_addr<F>(mut get_env: F) -> SocketAddr
where
    F: FnMut(&str) -> Option<String>,
{
    if let Some(addr) = get_env(EDITOR_API_ADDR_ENV).and_then(|v| v.parse().ok()) {
        return addr;
    }

    let port = get_env(EDITOR_API_PORT_ENV)
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(DEFAULT_EDITOR_API_PORT);
    SocketAddr::from(([127, 0, 0, 1], port))
}

pub fn router(session: SharedEditorSession) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/manifest", get(manifest))
        .route("/api/agent/state", get(agent_state))
        .route("/api/agent/timeline", get(agent_timeline))
        .route("/api/agent/step", post(agent_step))
        .route("/api/agent/rewind", post(agent_rewind))
        .route("/api/agent/forward", post(agent_forward))
        .route("/api/agent/seek", post(agent_seek))
        .route("/api/agent/reset", post(agent_reset))
        .with_state(session)
        .layer(cors)
}

fn lock(session: &SharedEditorSession) -> MutexGuard<'_, EditorSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn health() -> &'static str {
    "ok"
}

async fn manifest(State(session): State<SharedEditorSession>) -> Json<EditorManifest> {
    Json(lock(&session).manifest())
}

async fn agent_state(State(session): State<SharedEditorSession>) -> Json<EditorSnapshot> {
    Json(lock(&session).state())
}

async fn agent_timeline(State(session): State<SharedEditorSession>) -> Json<EditorTimeline> {
    Json(lock(&session).timeline())
}

async fn agent_step(
    State(session): State<SharedEditorSession>,
    Json(payload): Json<StepRequest>,
) -> Result<Json<EditorSnapshot>, (StatusCode, String)> {
    let snapshot = lock(&session).step(&payload.action_id);
    snapshot.map(Json).map_err(|err| {
        tracing::debug!(%err, "rejected editor step");
        (StatusCode::BAD_REQUEST, err.to_string())
    })
}

async fn agent_rewind(
    State(session): State<SharedEditorSession>,
    Json(payload): Json<FramesRequest>,
) -> Json<EditorSnapshot> {
    Json(lock(&session).rewind(payload.frames))
}

async fn agent_forward(
    State(session): State<SharedEditorSession>,
    Json(payload): Json<FramesRequest>,
) -> Json<EditorSnapshot> {
    Json(lock(&session).forward(payload.frames))
}

async fn agent_seek(
    State(session): State<SharedEditorSession>,
    Json(payload): Json<SeekRequest>,
) -> Json<EditorSnapshot> {
    Json(lock(&session).seek(payload.frame))
}

async fn agent_reset(State(session): State<SharedEditorSession>) -> Json<EditorSnapshot> {
    Json(lock(&session).reset())
}
