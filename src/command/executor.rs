//! Command execution - applies user commands to the scheduler

use std::sync::Arc;

use crate::core::error::Result;
use crate::core::types::{AgentId, SpeedSetting};
use crate::entity::species::{ColorVariant, Species};
use crate::persistence::roster::RosterStore;
use crate::simulation::tick::Scheduler;

/// Result of some external task the pets react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalOutcome {
    Success,
    Failure,
}

/// Everything the outside world can ask of the simulation
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddAgent {
        species: Species,
        color: Option<ColorVariant>,
        name: Option<String>,
    },
    RemoveAgent(AgentId),
    RemoveAll,
    /// Hide saves the roster and suspends; show restores an empty population and resumes
    SetVisible(bool),
    ThrowBall,
    ExternalOutcome(ExternalOutcome),
    Hover(AgentId),
    Grab(AgentId),
    Drag { agent: AgentId, x: f32, y: f32 },
    Release { agent: AgentId, x: f32 },
    SetSpeed { agent: AgentId, speed: SpeedSetting },
}

/// What a command did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Added(AgentId),
    Removed(usize),
    BallThrown(u64),
    Visibility { visible: bool, restored: usize },
    Done,
}

/// Executes commands against a shared scheduler
pub struct CommandExecutor {
    scheduler: Arc<Scheduler>,
    store: Option<RosterStore>,
}

impl CommandExecutor {
    pub fn new(scheduler: Arc<Scheduler>, store: Option<RosterStore>) -> Self {
        Self { scheduler, store }
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn execute(&self, command: Command) -> Result<CommandOutcome> {
        tracing::debug!(?command, "executing command");
        let outcome = match command {
            Command::AddAgent {
                species,
                color,
                name,
            } => CommandOutcome::Added(self.scheduler.spawn_agent(species, color, name)?),
            Command::RemoveAgent(id) => {
                self.scheduler.remove_agent(id)?;
                CommandOutcome::Removed(1)
            }
            Command::RemoveAll => CommandOutcome::Removed(self.scheduler.remove_all()),
            Command::SetVisible(visible) => self.set_visible(visible),
            Command::ThrowBall => CommandOutcome::BallThrown(self.scheduler.throw_ball_random()),
            Command::ExternalOutcome(ExternalOutcome::Success) => {
                self.scheduler.celebrate();
                CommandOutcome::Done
            }
            Command::ExternalOutcome(ExternalOutcome::Failure) => {
                self.scheduler.commiserate();
                CommandOutcome::Done
            }
            Command::Hover(id) => {
                self.scheduler.hover(id)?;
                CommandOutcome::Done
            }
            Command::Grab(id) => {
                self.scheduler.grab(id)?;
                CommandOutcome::Done
            }
            Command::Drag { agent, x, y } => {
                self.scheduler.drag(agent, x, y)?;
                CommandOutcome::Done
            }
            Command::Release { agent, x } => {
                self.scheduler.release(agent, x)?;
                CommandOutcome::Done
            }
            Command::SetSpeed { agent, speed } => {
                self.scheduler.set_speed(agent, speed)?;
                CommandOutcome::Done
            }
        };
        Ok(outcome)
    }

    fn set_visible(&self, visible: bool) -> CommandOutcome {
        if !visible {
            self.save_roster();
            self.scheduler.set_suspended(true);
            return CommandOutcome::Visibility {
                visible,
                restored: 0,
            };
        }

        let mut restored = 0;
        if self.scheduler.agent_count() == 0 {
            if let Some(store) = &self.store {
                restored = self.scheduler.restore_roster(&store.load());
            }
        }
        self.scheduler.set_suspended(false);
        CommandOutcome::Visibility { visible, restored }
    }

    /// Save the roster, logging rather than failing
    fn save_roster(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.save(&self.scheduler.roster()) {
            tracing::warn!(path = %store.path().display(), error = %e, "failed to save roster");
        }
    }

    /// Persist the population before exit
    pub fn shutdown(&self) -> Result<()> {
        match &self.store {
            Some(store) => store.save(&self.scheduler.roster()),
            None => Ok(()),
        }
    }
}
