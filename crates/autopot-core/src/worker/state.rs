use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::chain::{AddressResolver, ResolvedAddress};
use crate::config::{WorkerConfig, timing};
use crate::error::{Error, Result};
use crate::focus::FocusGate;
use crate::gauge::{GaugeLearner, GaugeReading, GaugeState};
use crate::notify::RateLimitedNotifier;
use crate::process::{ProcessInfo, ProcessProvider, ReadMemory};
use crate::trigger::TriggerController;
use crate::worker::{Collaborators, ControlSignals, StatusEvent, StatusKind};

pub(crate) const STATUS_OFF: &str = "Auto Potion: OFF";
pub(crate) const STATUS_ON: &str = "Auto Potion: ON";
pub(crate) const STATUS_SEARCHING: &str = "Searching for process...";
pub(crate) const STATUS_WAITING_PROCESS: &str = "Waiting for process...";
pub(crate) const STATUS_PROCESS_FOUND: &str = "Process found.";
pub(crate) const STATUS_DETERMINING_MAX: &str = "Determining Max HP...";
pub(crate) const STATUS_PAUSED: &str = "PAUSED (Game not focused)";

const PROCESS_LOST: &str = "Process lost during address search";

/// Externally visible worker phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum WorkerPhase {
    Disabled,
    AttachingProcess,
    ResolvingAddress,
    Monitoring,
    /// Monitoring while the game window is not focused
    Paused,
}

/// An attached process with a resolved HP address.
struct Session<T> {
    process: T,
    address: ResolvedAddress,
    last_resolve: Instant,
}

/// Resolved but still waiting for a positive first reading.
struct Pending {
    address: ResolvedAddress,
    resolved_at: Instant,
}

enum Phase<T> {
    Disabled,
    Attaching,
    Resolving {
        process: T,
        pending: Option<Pending>,
    },
    Monitoring(Session<T>),
}

/// The auto-potion engine.
///
/// Each [`step`](Self::step) handles pending signals and then advances the
/// current phase by one action (one attach attempt, one resolve attempt or one
/// poll), including the wait that follows it. Waits are chunked so reset,
/// disable and shutdown are noticed within one chunk.
pub struct WorkerStateMachine<P: ProcessProvider> {
    config: WorkerConfig,
    provider: P,
    signals: Arc<ControlSignals>,
    collaborators: Collaborators,

    phase: Phase<P::Process>,
    gauge: GaugeState,
    learner: GaugeLearner,
    resolver: AddressResolver,
    trigger: TriggerController,
    focus: FocusGate,
    attach_notifier: RateLimitedNotifier,

    last_status: Option<(String, StatusKind)>,
    last_off_status: Option<Instant>,
    process_found_logged: bool,
    fatal: bool,
}

impl<P: ProcessProvider> WorkerStateMachine<P> {
    pub fn new(
        config: WorkerConfig,
        provider: P,
        signals: Arc<ControlSignals>,
        collaborators: Collaborators,
    ) -> Self {
        let learner = GaugeLearner::new(
            config.quick_stable,
            config.required_stable,
            config.threshold_pct,
        );
        let trigger = TriggerController::new(config.potion_key.clone(), config.cooldown);
        let focus = FocusGate::new(config.window_title.clone());

        Self {
            config,
            provider,
            signals,
            collaborators,
            phase: Phase::Disabled,
            gauge: GaugeState::default(),
            learner,
            resolver: AddressResolver::new(),
            trigger,
            focus,
            attach_notifier: RateLimitedNotifier::new(timing::NOTIFIER_COOLDOWN),
            last_status: None,
            last_off_status: None,
            process_found_logged: false,
            fatal: false,
        }
    }

    pub fn phase(&self) -> WorkerPhase {
        match &self.phase {
            Phase::Disabled => WorkerPhase::Disabled,
            Phase::Attaching => WorkerPhase::AttachingProcess,
            Phase::Resolving { .. } => WorkerPhase::ResolvingAddress,
            Phase::Monitoring(_) if !self.focus.is_focused() => WorkerPhase::Paused,
            Phase::Monitoring(_) => WorkerPhase::Monitoring,
        }
    }

    pub fn gauge(&self) -> &GaugeState {
        &self.gauge
    }

    /// Address currently being monitored.
    pub fn hp_address(&self) -> Option<u64> {
        match &self.phase {
            Phase::Monitoring(session) => Some(session.address.address),
            _ => None,
        }
    }

    /// Whether the worker stopped because its observer went away.
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    /// Run until shutdown.
    ///
    /// Returns `Err(ObserverSinkFailure)` if the observer went away.
    pub fn run(mut self) -> Result<()> {
        info!("Worker thread started");
        while self.step() {}
        info!("Worker thread stopped");

        if self.fatal {
            Err(Error::ObserverSinkFailure)
        } else {
            Ok(())
        }
    }

    /// Advance by one action. Returns `false` once the worker must stop.
    pub fn step(&mut self) -> bool {
        if !self.running() {
            return false;
        }

        if self.signals.take_reset() {
            info!("Reset requested, clearing session");
            self.clear_session();
            self.phase = Phase::Disabled;
            return self.running();
        }

        if !self.signals.is_enabled() {
            self.step_disabled();
            return self.running();
        }

        match std::mem::replace(&mut self.phase, Phase::Disabled) {
            Phase::Disabled => {
                info!("Auto potion enabled");
                self.last_off_status = None;
                self.clear_session();
                self.emit_status(STATUS_SEARCHING, StatusKind::Waiting);
                self.phase = Phase::Attaching;
            }
            Phase::Attaching => self.step_attaching(),
            Phase::Resolving { process, pending } => self.step_resolving(process, pending),
            Phase::Monitoring(session) => self.step_monitoring(session),
        }

        self.running()
    }

    fn running(&self) -> bool {
        !self.fatal && !self.signals.is_shutting_down()
    }

    fn step_disabled(&mut self) {
        if !matches!(self.phase, Phase::Disabled) {
            info!("Auto potion disabled");
            self.clear_session();
            self.phase = Phase::Disabled;
            self.last_off_status = None;
        }

        let now = self.collaborators.clock.now();
        let refresh_due = self
            .last_off_status
            .is_none_or(|last| now.saturating_duration_since(last) >= timing::OFF_STATUS_REFRESH);
        if refresh_due {
            self.force_status(STATUS_OFF, StatusKind::Off);
            self.last_off_status = Some(now);
        }

        self.wait_while(timing::DISABLED_PAUSE, false);
    }

    fn step_attaching(&mut self) {
        match self.provider.attach(&self.config.process_name) {
            Ok(process) => {
                if self.process_found_logged {
                    debug!(
                        "Game process '{}' found (pid {})",
                        self.config.process_name,
                        process.pid()
                    );
                } else {
                    info!(
                        "Game process '{}' found (pid {})",
                        self.config.process_name,
                        process.pid()
                    );
                    self.process_found_logged = true;
                }
                self.attach_notifier.clear();
                self.emit_status(STATUS_PROCESS_FOUND, StatusKind::Waiting);
                self.phase = Phase::Resolving {
                    process,
                    pending: None,
                };
            }
            Err(e) => {
                let message = e.to_string();
                let now = self.collaborators.clock.now();
                if self.attach_notifier.should_emit(&message, now) {
                    match e {
                        Error::ProcessNotFound(_) => debug!("{}", message),
                        _ => warn!("Error during process search: {}", message),
                    }
                }
                self.emit_status(STATUS_WAITING_PROCESS, StatusKind::Waiting);
                self.phase = Phase::Attaching;
                self.wait(self.config.process_wait);
            }
        }
    }

    fn step_resolving(&mut self, process: P::Process, pending: Option<Pending>) {
        let now = self.collaborators.clock.now();

        // A held address is re-walked on the monitoring cadence; the structures
        // can move while HP still reads zero.
        let pending = pending.filter(|p| {
            now.saturating_duration_since(p.resolved_at) < timing::RERESOLVE_INTERVAL
        });
        let (address, resolved_at) = match pending {
            Some(pending) => (pending.address, pending.resolved_at),
            None => match self.resolver.resolve(&process, &self.config.chain, now) {
                Ok(address) => {
                    debug!("HP address found: 0x{:X}", address.address);
                    (address, now)
                }
                Err(Error::ModuleNotFound(_)) => {
                    // Alive means the module is still loading; attach again after the wait
                    if !process.is_alive()
                        && self.attach_notifier.should_emit(PROCESS_LOST, now)
                    {
                        info!("{}", PROCESS_LOST);
                    }
                    drop(process);
                    self.phase = Phase::Attaching;
                    self.wait(self.config.memory_wait);
                    return;
                }
                Err(_) => {
                    self.phase = Phase::Resolving {
                        process,
                        pending: None,
                    };
                    self.wait(self.config.memory_wait);
                    return;
                }
            },
        };

        let value = match process.read_f32(address.address) {
            Ok(value) => value,
            Err(e) => {
                warn!("HP address found, error reading initial HP: {}", e);
                self.phase = Phase::Resolving {
                    process,
                    pending: None,
                };
                self.wait(self.config.memory_wait);
                return;
            }
        };

        let Some(update) = self.learner.seed(value, &mut self.gauge) else {
            debug!("HP address found, waiting for a positive HP value (read {})", value);
            self.phase = Phase::Resolving {
                process,
                pending: Some(Pending {
                    address,
                    resolved_at,
                }),
            };
            self.wait(self.config.memory_wait);
            return;
        };

        info!(
            "Monitoring HP at 0x{:X}: max {:.0}, threshold {:.0}",
            address.address, update.max, update.threshold
        );
        self.emit_status(STATUS_ON, StatusKind::On);
        self.emit(StatusEvent::HpChanged {
            current: value,
            max: Some(update.max),
        });
        self.emit(StatusEvent::ThresholdChanged {
            value: Some(update.threshold),
        });
        self.phase = Phase::Monitoring(Session {
            process,
            address,
            last_resolve: resolved_at,
        });
    }

    fn step_monitoring(&mut self, mut session: Session<P::Process>) {
        // Paused: no memory access at all until focus returns
        let focus = self
            .focus
            .check_focus(&*self.collaborators.window, &mut self.gauge);
        if !focus.focused {
            self.emit_status(STATUS_PAUSED, StatusKind::Paused);
            self.phase = Phase::Monitoring(session);
            self.wait(self.config.poll_interval);
            return;
        }

        let now = self.collaborators.clock.now();
        if now.saturating_duration_since(session.last_resolve) >= timing::RERESOLVE_INTERVAL {
            match self
                .resolver
                .resolve(&session.process, &self.config.chain, now)
            {
                Ok(address) => {
                    if address.address != session.address.address {
                        debug!(
                            "HP address changed: 0x{:X} -> 0x{:X}",
                            session.address.address, address.address
                        );
                    }
                    session.address = address;
                    session.last_resolve = now;
                }
                Err(e) => return self.recover(e),
            }
        }

        let value = match session.process.read_f32(session.address.address) {
            Ok(value) => value,
            Err(e) => return self.recover(e),
        };
        let now = self.collaborators.clock.now();

        if let Some(update) = self
            .learner
            .observe(&GaugeReading::new(value, now), &mut self.gauge)
        {
            info!(
                "Max HP updated: {} -> {:.0} (threshold {:.0})",
                update
                    .previous
                    .map_or_else(|| "unknown".to_string(), |m| format!("{:.0}", m)),
                update.max,
                update.threshold
            );
        }

        match self.gauge.current_max {
            Some(_) => self.emit_status(STATUS_ON, StatusKind::On),
            None => self.emit_status(STATUS_DETERMINING_MAX, StatusKind::Waiting),
        }
        self.emit(StatusEvent::HpChanged {
            current: value,
            max: self.gauge.current_max,
        });
        self.emit(StatusEvent::ThresholdChanged {
            value: self.gauge.threshold,
        });

        if self.running()
            && self.trigger.maybe_trigger(
                &*self.collaborators.input,
                value,
                &self.gauge,
                now,
            )
        {
            self.gauge.triggered = true;
            self.emit(StatusEvent::PotionLogged {
                value,
                max: self.gauge.current_max,
            });
        }

        self.phase = Phase::Monitoring(session);
        self.wait(self.config.poll_interval);
    }

    /// Discard the session after a monitoring error and search again.
    fn recover(&mut self, e: Error) {
        if self.signals.is_shutting_down() {
            return;
        }
        let prefix = match e {
            Error::MemoryReadFailed { .. } => "Process/Memory Error",
            _ => "Error",
        };
        warn!("{}: {}. Restarting search...", prefix, e);
        self.emit_status(&format!("{}. Restarting search...", prefix), StatusKind::Error);

        self.clear_session();
        self.phase = Phase::Attaching;
        if self.wait(timing::RECOVERY_PAUSE) {
            self.emit_status(STATUS_SEARCHING, StatusKind::Waiting);
        }
    }

    /// Drop everything learned about the current process.
    fn clear_session(&mut self) {
        self.gauge.reset();
        self.focus.reset();
        self.resolver.reset();
        self.phase = Phase::Disabled;
    }

    /// Sleep up to `duration` in small chunks while enabled.
    ///
    /// Returns `false` early on shutdown, a pending reset, or when disabled; the
    /// next step handles the signal.
    fn wait(&self, duration: Duration) -> bool {
        self.wait_while(duration, true)
    }

    /// Sleep up to `duration` in small chunks for as long as the enabled flag
    /// stays at `enabled`.
    fn wait_while(&self, duration: Duration, enabled: bool) -> bool {
        let clock = &self.collaborators.clock;
        let start = clock.now();
        loop {
            if !self.running()
                || self.signals.reset_pending()
                || self.signals.is_enabled() != enabled
            {
                return false;
            }
            let elapsed = clock.now().saturating_duration_since(start);
            if elapsed >= duration {
                return true;
            }
            clock.sleep(timing::WAIT_CHUNK.min(duration - elapsed));
        }
    }

    fn emit_status(&mut self, text: &str, kind: StatusKind) {
        let unchanged = self
            .last_status
            .as_ref()
            .is_some_and(|(last_text, last_kind)| last_text == text && *last_kind == kind);
        if !unchanged {
            self.force_status(text, kind);
        }
    }

    fn force_status(&mut self, text: &str, kind: StatusKind) {
        if self.emit(StatusEvent::StatusChanged {
            text: text.to_string(),
            kind,
        }) {
            self.last_status = Some((text.to_string(), kind));
        }
    }

    /// Send one event. Nothing is sent once shutdown was requested; a closed
    /// sink stops the worker.
    fn emit(&mut self, event: StatusEvent) -> bool {
        if !self.running() {
            return false;
        }
        match self.collaborators.sink.emit(event) {
            Ok(()) => true,
            Err(e) => {
                error!("{}, stopping worker", e);
                self.fatal = true;
                self.signals.request_shutdown();
                false
            }
        }
    }
}
