use crate::config::tick_interval;
use crate::consumer::HitPointConsumer;
use crate::error::{RaySyncError, Result};
use crate::events::RaySyncEvent;
use crate::scene::Sensor;
use crate::world::{RaySyncWorld, TickOutcome};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError, bounded};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Events buffered between two [`RaySyncEngine::poll_events`] calls by default.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Lifecycle of the continuous fire-and-consume loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No continuous session
    Idle,
    /// Session requested and sensors registered; the loop is about to launch
    Armed,
    /// Tick loop active
    Running,
    /// Stop requested; the loop exits at the next tick boundary
    Stopping,
}

/// Drives a [`RaySyncWorld`] at a fixed tick rate on a background thread.
///
/// Each tick locks the world, syncs pending changes, fires the sensors if anything
/// changed since the last fire, hands the points to the consumer and releases the
/// engine's buffer, then waits for the next tick. Host code can keep issuing
/// single-shot queries through [`lock_world`](Self::lock_world); they are serialised
/// against ticks by the same lock.
///
/// A failing tick, including one whose consumer panicked, is reported as
/// [`RaySyncEvent::TickFailed`] and the loop carries on. Only [`stop`](Self::stop)
/// ends a session.
///
/// Events queue in a bounded channel. Once it is full, new events are dropped until
/// the host drains it with [`poll_events`](Self::poll_events).
pub struct RaySyncEngine {
    world: Arc<Mutex<RaySyncWorld>>,
    target_rate: f32,
    state: SessionState,
    session_id: Option<Uuid>,
    stop_sender: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
    event_sender: Sender<RaySyncEvent>,
    event_receiver: Receiver<RaySyncEvent>,
}

impl RaySyncEngine {
    /// Takes ownership of `world`. The tick rate comes from its descriptor.
    pub fn new(world: RaySyncWorld) -> Self {
        Self::with_event_capacity(world, DEFAULT_EVENT_CAPACITY)
    }

    /// Like [`new`](Self::new), buffering at most `capacity` undrained events.
    pub fn with_event_capacity(world: RaySyncWorld, capacity: usize) -> Self {
        let target_rate = world.desc().target_rate;
        let (event_sender, event_receiver) = bounded(capacity.max(1));
        Self {
            world: Arc::new(Mutex::new(world)),
            target_rate,
            state: SessionState::Idle,
            session_id: None,
            stop_sender: None,
            worker: None,
            event_sender,
            event_receiver,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Id of the current session, if one is active.
    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn target_rate(&self) -> f32 {
        self.target_rate
    }

    /// Locks the world for single-shot queries or scene changes.
    ///
    /// Blocks while a tick is in progress.
    pub fn lock_world(&self) -> Result<MutexGuard<'_, RaySyncWorld>> {
        Ok(lock_recovering(&self.world))
    }

    /// Starts the continuous loop with `sensors`, delivering hit points to
    /// `consumer` on every tick that fires.
    ///
    /// # Errors
    ///
    /// - [`RaySyncError::SessionActive`] if a session is already armed or running;
    ///   the running session is left untouched
    /// - [`RaySyncError::NoSensors`] if `sensors` is empty
    /// - [`RaySyncError::NoTargets`] if the world has no registered objects
    pub fn start_continuous<C>(&mut self, sensors: Vec<Arc<Sensor>>, consumer: C) -> Result<()>
    where
        C: HitPointConsumer + 'static,
    {
        if self.state != SessionState::Idle {
            log::warn!(
                "Ignoring start request: continuous session already {:?}",
                self.state
            );
            return Err(RaySyncError::SessionActive(self.state));
        }
        if sensors.is_empty() {
            log::warn!("Cannot start continuous session without sensors");
            return Err(RaySyncError::NoSensors);
        }

        {
            let mut world = self.lock_world()?;
            if !world.is_initialized() {
                log::warn!("Cannot start continuous session: no targets registered");
                return Err(RaySyncError::NoTargets);
            }
            world.set_sensors(sensors)?;
        }

        let session_id = Uuid::new_v4();
        self.session_id = Some(session_id);
        self.transition(SessionState::Armed);

        let (stop_sender, stop_receiver) = bounded(1);
        let world = self.world.clone();
        let events = self.event_sender.clone();
        let interval = tick_interval(self.target_rate);
        let consumer: Box<dyn HitPointConsumer> = Box::new(consumer);

        let spawned = thread::Builder::new()
            .name("raysync-tick".into())
            .spawn(move || run_ticks(world, consumer, interval, stop_receiver, events, session_id));

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                self.stop_sender = Some(stop_sender);
                self.transition(SessionState::Running);
                log::info!(
                    "Continuous session {} running at {}",
                    session_id,
                    match interval {
                        Some(interval) => format!("{:?} per tick", interval),
                        None => "uncapped rate".to_string(),
                    }
                );
                Ok(())
            }
            Err(e) => {
                self.transition(SessionState::Idle);
                self.session_id = None;
                Err(RaySyncError::Engine(format!(
                    "Failed to spawn tick thread: {}",
                    e
                )))
            }
        }
    }

    /// Stops the continuous loop and waits for the in-flight tick to finish.
    ///
    /// Does nothing when no session is active.
    pub fn stop(&mut self) {
        if self.state == SessionState::Idle {
            return;
        }

        self.transition(SessionState::Stopping);
        if let Some(stop_sender) = self.stop_sender.take() {
            let _ = stop_sender.try_send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Tick thread panicked");
            }
        }

        self.transition(SessionState::Idle);
        self.session_id = None;
    }

    /// Forwards elapsed wall time to the engine.
    pub fn advance_time(&self, seconds: f32) -> Result<()> {
        self.lock_world()?.advance_time(seconds);
        Ok(())
    }

    /// Drains every event emitted since the last call.
    pub fn poll_events(&self) -> Vec<RaySyncEvent> {
        self.event_receiver.try_iter().collect()
    }

    fn transition(&mut self, new: SessionState) {
        let old = self.state;
        if old == new {
            return;
        }
        self.state = new;
        log::debug!("Session state {:?} -> {:?}", old, new);

        if let Some(session_id) = self.session_id {
            emit(
                &self.event_sender,
                RaySyncEvent::SessionStateChanged {
                    session_id,
                    old,
                    new,
                },
            );
        }
    }
}

impl Drop for RaySyncEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Locks the world, taking it over from a tick that panicked while holding it.
fn lock_recovering(world: &Mutex<RaySyncWorld>) -> MutexGuard<'_, RaySyncWorld> {
    world.lock().unwrap_or_else(|poisoned| {
        log::warn!("Recovering world lock poisoned by a panicking tick");
        world.clear_poison();
        PoisonError::into_inner(poisoned)
    })
}

fn emit(events: &Sender<RaySyncEvent>, event: RaySyncEvent) {
    if let Err(TrySendError::Full(event)) = events.try_send(event) {
        log::debug!("Event queue full, dropping {:?}", event);
    }
}

/// Body of the tick thread. Returns once a stop signal arrives.
fn run_ticks(
    world: Arc<Mutex<RaySyncWorld>>,
    mut consumer: Box<dyn HitPointConsumer>,
    interval: Option<Duration>,
    stop: Receiver<()>,
    events: Sender<RaySyncEvent>,
    session_id: Uuid,
) {
    loop {
        match stop.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        let started = Instant::now();
        let outcome = lock_recovering(&world).tick(consumer.as_mut());

        match outcome {
            Ok(TickOutcome::Fired { count }) => emit(
                &events,
                RaySyncEvent::HitPointsDelivered {
                    session_id,
                    count,
                    tick_duration: started.elapsed(),
                },
            ),
            Ok(TickOutcome::Skipped) => {}
            Err(e) => {
                log::error!("Tick failed: {}", e);
                emit(
                    &events,
                    RaySyncEvent::TickFailed {
                        session_id,
                        error: e.to_string(),
                    },
                );
            }
        }

        match interval {
            Some(interval) => {
                let remaining = interval.saturating_sub(started.elapsed());
                match stop.recv_timeout(remaining) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }
            None => thread::yield_now(),
        }
    }

    log::debug!("Tick thread for session {} exiting", session_id);
}
