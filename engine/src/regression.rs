//! Engine-level regression testing helpers.
//!
//! These utilities help you:
//! - record a frame-by-frame `TimeMachine` (JSON) for a scripted input sequence,
//! - reload the recording, re-run the same inputs from its first state, and
//! - assert every re-simulated state hashes identically to the recorded one.
//!
//! State hashes are SHA-256 over the state's JSON encoding, so any field that
//! serializes participates in the comparison.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};

use crate::{GameLogic, HeadlessRunner, TimeMachine};

pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn state_sha256_hex<S: Serialize>(state: &S) -> io::Result<String> {
    let bytes =
        serde_json::to_vec(state).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

pub fn history_hashes<S: Serialize>(states: &[S]) -> io::Result<Vec<String>> {
    states.iter().map(state_sha256_hex).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateHashGolden {
    pub version: u32,
    pub name: String,
    pub hash_alg: String,
    /// One hash per recorded frame.
    pub hashes: Vec<String>,
}

impl StateHashGolden {
    pub fn new(name: impl Into<String>, hashes: Vec<String>) -> Self {
        Self {
            version: 1,
            name: name.into(),
            hash_alg: "sha256".to_string(),
            hashes,
        }
    }
}

pub fn load_golden_json(path: impl AsRef<Path>) -> io::Result<StateHashGolden> {
    let path = path.as_ref();
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("failed parsing golden json {}: {e}", path.display()),
        )
    })
}

pub fn save_golden_json(path: impl AsRef<Path>, golden: &StateHashGolden) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = fs::File::create(path)?;
    let mut writer = io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, golden)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writer.flush()?;
    Ok(())
}

pub fn assert_or_update_golden_json(
    path: impl AsRef<Path>,
    golden: &StateHashGolden,
    update: bool,
) -> io::Result<()> {
    let path = path.as_ref();
    let exists = path.exists();

    if update || !exists {
        save_golden_json(path, golden)?;
        if exists {
            tracing::info!(path = %path.display(), "updated golden");
        } else {
            tracing::info!(path = %path.display(), "wrote golden");
        }
        return Ok(());
    }

    let expected = load_golden_json(path)?;
    if expected.version != golden.version || expected.hash_alg != golden.hash_alg {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "golden metadata mismatch at {}:\nexpected: v{} alg={}\nactual:   v{} alg={}\n(hint: rerun with update enabled to rewrite)",
                path.display(),
                expected.version,
                expected.hash_alg,
                golden.version,
                golden.hash_alg,
            ),
        ));
    }

    compare_hashes(&expected.hashes, &golden.hashes).map_err(|detail| {
        io::Error::other(format!(
            "golden mismatch at {}: {detail}\n(hint: rerun with update enabled to rewrite)",
            path.display()
        ))
    })
}

fn compare_hashes(expected: &[String], actual: &[String]) -> Result<(), String> {
    if expected.len() != actual.len() {
        return Err(format!(
            "expected {} hashes, got {}",
            expected.len(),
            actual.len()
        ));
    }
    for (i, (a, b)) in expected.iter().zip(actual.iter()).enumerate() {
        if a != b {
            return Err(format!("frame {i}:\nexpected: {a}\nactual:   {b}"));
        }
    }
    Ok(())
}

/// A recorded history together with the inputs that produced it, so the run
/// can be re-simulated instead of only inspected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputRecording<S, I> {
    pub version: u32,
    pub inputs: Vec<I>,
    pub history: TimeMachine<S>,
}

impl<S, I> InputRecording<S, I>
where
    S: Serialize + DeserializeOwned + Clone,
    I: Serialize + DeserializeOwned + Clone,
{
    pub fn new(inputs: Vec<I>, history: TimeMachine<S>) -> Self {
        Self {
            version: 1,
            inputs,
            history,
        }
    }

    pub fn save_json_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = fs::File::create(path)?;
        let mut writer = io::BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writer.flush()?;
        tracing::debug!(path = %path.display(), inputs = self.inputs.len(), "saved recording");
        Ok(())
    }

    pub fn load_json_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = fs::File::open(path)?;
        let reader = io::BufReader::new(file);
        let recording: Self = serde_json::from_reader(reader).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed parsing recording json {}: {e}", path.display()),
            )
        })?;
        if recording.history.len() != recording.inputs.len() + 1 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "recording {} has {} inputs but {} states",
                    path.display(),
                    recording.inputs.len(),
                    recording.history.len()
                ),
            ));
        }
        Ok(recording)
    }

    /// Re-runs the inputs from the first recorded state and checks every
    /// resulting state against the recorded one. Returns the replayed runner.
    pub fn replay<G>(&self, game: G) -> io::Result<HeadlessRunner<G>>
    where
        G: GameLogic<State = S, Input = I>,
    {
        let first = self
            .history
            .state_at(0)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "empty recording"))?;
        let mut runner = HeadlessRunner::from_timemachine(game, TimeMachine::new(first));
        runner.run(self.inputs.iter().cloned());

        let recorded = history_hashes(self.history.history())?;
        let replayed = history_hashes(runner.history())?;
        compare_hashes(&recorded, &replayed).map_err(|detail| {
            io::Error::other(format!("replay diverged from recording: {detail}"))
        })?;
        Ok(runner)
    }
}

#[derive(Debug, Clone)]
pub struct RecordReplayArtifacts {
    pub state_json: PathBuf,
    pub hashes: Vec<String>,
}

/// Engine-level regression helper:
/// - run a scenario live and save its `TimeMachine` JSON recording
/// - load the recording and re-run the same inputs starting from its frame 0
/// - assert every re-simulated state hashes identically to the loaded one
pub fn record_then_replay_and_compare<G>(
    name: &str,
    out_dir: impl AsRef<Path>,
    game: G,
    inputs: Vec<G::Input>,
) -> io::Result<RecordReplayArtifacts>
where
    G: GameLogic + Clone,
    G::State: Serialize + DeserializeOwned + Clone,
    G::Input: Clone,
{
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)?;
    let state_json = out_dir.join(format!("{}.json", sanitize_filename(name)));

    let mut live_runner = HeadlessRunner::new(game.clone());
    live_runner.run(inputs.iter().cloned());
    live_runner.timemachine().save_json_file(&state_json)?;

    let loaded = TimeMachine::<G::State>::load_json_file(&state_json)?;
    let recorded = history_hashes(loaded.history())?;

    let first = loaded
        .state_at(0)
        .cloned()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "empty recording"))?;
    let mut replay_runner = HeadlessRunner::from_timemachine(game, TimeMachine::new(first));
    replay_runner.run(inputs);
    let replayed = history_hashes(replay_runner.history())?;

    compare_hashes(&recorded, &replayed).map_err(|detail| {
        io::Error::other(format!("replay of {name} diverged from recording: {detail}"))
    })?;

    Ok(RecordReplayArtifacts {
        state_json,
        hashes: recorded,
    })
}
