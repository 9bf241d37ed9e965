//! Execution controller: a command/event state machine around one [`Cpu`].
//!
//! [`Controller`] is synchronous; a host scheduler drives it by calling
//! [`Controller::handle`] for each command and [`Controller::tick`] on a
//! timer while a run is active. [`ControllerHandle`] runs the same state
//! machine on a worker thread behind bounded channels.

mod breakpoints;
mod config;
mod protocol;
mod worker;

pub use breakpoints::Breakpoints;
pub use config::{
    ControllerConfig, DEFAULT_CHANNEL_CAPACITY, DEFAULT_MAX_BATCH, DEFAULT_MAX_BREAKPOINTS,
    DEFAULT_TICK_INTERVAL,
};
pub use protocol::{Command, Event};
pub use worker::ControllerHandle;

use thiserror::Error;

use crate::{Cpu, FaultCode, StepOutcome};

const LOG_TARGET: &str = "micro4::controller";

/// Errors raised at the controller boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// The breakpoint set is full.
    #[error("breakpoint limit of {limit} reached")]
    BreakpointLimit {
        /// Configured capacity.
        limit: usize,
    },
    /// The worker thread is gone.
    #[error("controller worker disconnected")]
    Disconnected,
}

/// Bookkeeping for an active run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveRun {
    speed: u32,
    /// Set when the run starts; the first instruction ignores breakpoints.
    resuming: bool,
}

/// One controller session owning one core.
#[derive(Debug, Clone)]
pub struct Controller {
    config: ControllerConfig,
    cpu: Cpu,
    breakpoints: Breakpoints,
    run: Option<ActiveRun>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

impl Controller {
    /// Creates a session with a freshly initialized core.
    #[must_use]
    pub fn new(config: ControllerConfig) -> Self {
        let cpu = Cpu::new(config.cpu.clone());
        let breakpoints = Breakpoints::with_limit(config.max_breakpoints);
        Self {
            config,
            cpu,
            breakpoints,
            run: None,
        }
    }

    /// Initializes the core and announces readiness.
    pub fn boot(&mut self) -> Vec<Event> {
        self.cpu.init();
        self.run = None;
        vec![Event::Ready]
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Read-only view of the core.
    #[must_use]
    pub const fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// True while a run is active.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Instructions per tick of the active run, if any.
    #[must_use]
    pub fn run_batch(&self) -> Option<u32> {
        self.run.map(|run| self.config.batch_for_speed(run.speed))
    }

    /// Breakpoint addresses, ascending.
    #[must_use]
    pub fn breakpoints(&self) -> Vec<u8> {
        self.breakpoints.to_vec()
    }

    /// Processes one command and returns the events it produced.
    pub fn handle(&mut self, command: Command) -> Vec<Event> {
        match command {
            Command::LoadProgram { words, start } => {
                self.stop_run();
                self.cpu.reset();
                self.cpu.load_program(&words, start);
                vec![self.state_update()]
            }
            Command::Step => {
                self.stop_run();
                let outcome = self.cpu.step_outcome();
                vec![self.outcome_event(outcome)]
            }
            Command::Run { speed } => self.start_run(speed),
            Command::Stop => {
                self.stop_run();
                vec![self.state_update()]
            }
            Command::Reset => {
                self.stop_run();
                self.cpu.reset();
                vec![self.state_update()]
            }
            Command::GetState => vec![self.state_update()],
            Command::SetSpeed { speed } => {
                if let Some(run) = self.run.as_mut() {
                    run.speed = speed;
                    tracing::debug!(target: LOG_TARGET, speed, "run speed changed");
                }
                Vec::new()
            }
            Command::AddBreakpoint { address } => match self.breakpoints.add(address) {
                Ok(()) => vec![self.breakpoint_list()],
                Err(err) => vec![Event::Rejected {
                    message: err.to_string(),
                }],
            },
            Command::RemoveBreakpoint { address } => {
                self.breakpoints.remove(address);
                vec![self.breakpoint_list()]
            }
            Command::ClearBreakpoints => {
                self.breakpoints.clear();
                vec![self.breakpoint_list()]
            }
            Command::ListBreakpoints => vec![self.breakpoint_list()],
        }
    }

    /// Executes one batch of the active run. Returns no events when idle.
    pub fn tick(&mut self) -> Vec<Event> {
        let Some(run) = self.run else {
            return Vec::new();
        };
        let batch = self.config.batch_for_speed(run.speed);
        let mut resuming = run.resuming;

        for _ in 0..batch {
            let pc = self.cpu.pc();
            if !resuming && self.breakpoints.contains(pc) {
                self.stop_run();
                tracing::info!(target: LOG_TARGET, pc, "breakpoint hit");
                let state = self.cpu.snapshot();
                return vec![
                    Event::BreakpointHit {
                        address: pc,
                        state: state.clone(),
                    },
                    Event::StateUpdate { state },
                ];
            }
            resuming = false;

            let outcome = self.cpu.step_outcome();
            if outcome.is_terminal() {
                self.stop_run();
                return vec![self.outcome_event(outcome)];
            }
        }

        if let Some(active) = self.run.as_mut() {
            active.resuming = resuming;
        }
        vec![self.state_update()]
    }

    fn start_run(&mut self, speed: u32) -> Vec<Event> {
        if self.run.is_some() {
            return Vec::new();
        }
        if self.cpu.is_halted() {
            return vec![self.terminal_event()];
        }
        tracing::info!(target: LOG_TARGET, speed, pc = self.cpu.pc(), "run started");
        self.run = Some(ActiveRun {
            speed,
            resuming: true,
        });
        Vec::new()
    }

    fn stop_run(&mut self) {
        if self.run.take().is_some() {
            tracing::info!(
                target: LOG_TARGET,
                instructions = self.cpu.instruction_count(),
                "run stopped"
            );
        }
    }

    fn outcome_event(&self, outcome: StepOutcome) -> Event {
        match outcome {
            StepOutcome::Retired { .. } => self.state_update(),
            StepOutcome::Halted { .. } | StepOutcome::Fault { .. } | StepOutcome::Idle => {
                self.terminal_event()
            }
        }
    }

    fn terminal_event(&self) -> Event {
        let state = self.cpu.snapshot();
        match self.cpu.fault() {
            Some(cause) => error_event(cause, state),
            None if state.halted => Event::Halted { state },
            None => Event::StateUpdate { state },
        }
    }

    fn state_update(&self) -> Event {
        Event::StateUpdate {
            state: self.cpu.snapshot(),
        }
    }

    fn breakpoint_list(&self) -> Event {
        Event::Breakpoints {
            addresses: self.breakpoints.to_vec(),
        }
    }
}

fn error_event(cause: FaultCode, state: crate::CpuSnapshot) -> Event {
    Event::Error {
        message: cause.to_string(),
        address: cause.faulting_pc(),
        state,
    }
}
