use crate::{GameLogic, HeadlessRunner};

/// Commands an external driver (HTTP editor, scripted agent) can issue
/// against a running game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentCommand<I> {
    Step(I),
    Reset,
    GetState,
    GetHistory,
    Rewind { frames: usize },
    Forward { frames: usize },
    Seek { frame: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentResponse<S> {
    State { frame: usize, state: S },
    History { frame: usize, history: Vec<S> },
}

pub struct AgentHost<G>
where
    G: GameLogic + Clone,
{
    game: G,
    runner: HeadlessRunner<G>,
}

impl<G> AgentHost<G>
where
    G: GameLogic + Clone,
    G::State: Clone,
{
    pub fn new(game: G) -> Self {
        let runner = HeadlessRunner::new(game.clone());
        Self { game, runner }
    }

    pub fn handle(&mut self, command: AgentCommand<G::Input>) -> AgentResponse<G::State> {
        match command {
            AgentCommand::Step(input) => {
                let frame = self.runner.step(input);
                self.current(frame)
            }
            AgentCommand::Reset => {
                self.runner = HeadlessRunner::new(self.game.clone());
                tracing::debug!("agent host reset");
                self.current(self.runner.frame())
            }
            AgentCommand::GetState => self.current(self.runner.frame()),
            AgentCommand::GetHistory => AgentResponse::History {
                frame: self.runner.frame(),
                history: self.runner.history().to_vec(),
            },
            AgentCommand::Rewind { frames } => {
                let frame = self.runner.rewind(frames);
                self.current(frame)
            }
            AgentCommand::Forward { frames } => {
                let frame = self.runner.forward(frames);
                self.current(frame)
            }
            AgentCommand::Seek { frame } => {
                let frame = self.runner.seek(frame);
                self.current(frame)
            }
        }
    }

    pub fn runner(&self) -> &HeadlessRunner<G> {
        &self.runner
    }

    fn current(&self, frame: usize) -> AgentResponse<G::State> {
        AgentResponse::State {
            frame,
            state: self.runner.state().clone(),
        }
    }
}
