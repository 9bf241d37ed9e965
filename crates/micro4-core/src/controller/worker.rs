use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::{Command, Controller, ControllerConfig, ControllerError, Event, LOG_TARGET};

/// A [`Controller`] running on a dedicated worker thread.
///
/// Commands and events travel over bounded FIFO channels. The worker blocks
/// on the command channel while idle and wakes every `tick_interval` while a
/// run is active. A due tick is never postponed by queued commands. Dropping the handle closes both channels and joins the
/// thread.
pub struct ControllerHandle {
    commands: Option<SyncSender<Command>>,
    events: Option<Receiver<Event>>,
    join_handle: Option<JoinHandle<()>>,
}

impl ControllerHandle {
    /// Spawns the worker. Its first event is [`Event::Ready`].
    #[must_use]
    pub fn spawn(config: ControllerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::sync_channel(config.command_capacity);
        let (event_tx, event_rx) = mpsc::sync_channel(config.event_capacity);

        let join_handle = std::thread::spawn(move || worker_main(config, &command_rx, &event_tx));
        Self {
            commands: Some(command_tx),
            events: Some(event_rx),
            join_handle: Some(join_handle),
        }
    }

    /// Queues a command, blocking while the command channel is full.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Disconnected`] when the worker has exited.
    pub fn send(&self, command: Command) -> Result<(), ControllerError> {
        self.commands
            .as_ref()
            .ok_or(ControllerError::Disconnected)?
            .send(command)
            .map_err(|_| ControllerError::Disconnected)
    }

    /// Waits for the next event.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Disconnected`] when the worker has exited
    /// and every event has been drained.
    pub fn recv(&self) -> Result<Event, ControllerError> {
        self.receiver()?
            .recv()
            .map_err(|_| ControllerError::Disconnected)
    }

    /// Waits up to `timeout` for the next event; `Ok(None)` on timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Disconnected`] when the worker has exited
    /// and every event has been drained.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Event>, ControllerError> {
        match self.receiver()?.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(ControllerError::Disconnected),
        }
    }

    /// Returns an already-queued event without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Disconnected`] when the worker has exited
    /// and every event has been drained.
    pub fn try_recv(&self) -> Result<Option<Event>, ControllerError> {
        match self.receiver()?.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ControllerError::Disconnected),
        }
    }

    fn receiver(&self) -> Result<&Receiver<Event>, ControllerError> {
        self.events.as_ref().ok_or(ControllerError::Disconnected)
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        // Closing both channels unblocks the worker whether it waits on a
        // command or on a full event channel.
        drop(self.commands.take());
        drop(self.events.take());
        if let Some(join_handle) = self.join_handle.take() {
            let _ = join_handle.join();
        }
    }
}

fn worker_main(config: ControllerConfig, commands: &Receiver<Command>, events: &SyncSender<Event>) {
    let tick_interval = config.tick_interval;
    let mut controller = Controller::new(config);
    if !emit(events, controller.boot()) {
        return;
    }

    let mut next_tick = Instant::now();
    loop {
        let was_running = controller.is_running();
        let produced = if was_running {
            let wait = next_tick.saturating_duration_since(Instant::now());
            match commands.recv_timeout(wait) {
                Ok(command) => {
                    let mut produced = controller.handle(command);
                    if controller.is_running() && Instant::now() >= next_tick {
                        next_tick = Instant::now() + tick_interval;
                        produced.extend(controller.tick());
                    }
                    produced
                }
                Err(RecvTimeoutError::Timeout) => {
                    next_tick = Instant::now() + tick_interval;
                    controller.tick()
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match commands.recv() {
                Ok(command) => controller.handle(command),
                Err(_) => break,
            }
        };

        if !was_running && controller.is_running() {
            next_tick = Instant::now();
        }
        if !emit(events, produced) {
            break;
        }
    }
    tracing::debug!(target: LOG_TARGET, "controller worker exiting");
}

fn emit(events: &SyncSender<Event>, produced: Vec<Event>) -> bool {
    produced.into_iter().all(|event| events.send(event).is_ok())
}
