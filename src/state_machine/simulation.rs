//! The fleet-wide play/pause/progress state machine.

use std::time::{Duration, Instant};

use tracing::debug;

use super::StateMachine;
use super::wrappers::input::SystemInput;

pub const MIN_SPEED: u8 = 1;
pub const MAX_SPEED: u8 = 10;

/// Flight-clock length of a full traversal at 1x speed.
pub const DEFAULT_FLIGHT_DURATION: Duration = Duration::from_secs(600);

/// Run state shared by every drone in the fleet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationState {
    pub is_running: bool,
    /// Advancement multiplier, always within [`MIN_SPEED`]..=[`MAX_SPEED`].
    pub speed_multiplier: u8,
    /// Fraction of the path traversed, always within `0.0..=1.0`.
    pub progress: f64,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self {
            is_running: false,
            speed_multiplier: MIN_SPEED,
            progress: 0.0,
        }
    }
}

/// Pure simulation controller.
///
/// Out of range input is clamped, never rejected. The machine has no notion of drones: whether a
/// path is long enough to fly is checked by the caller before toggling.
#[derive(Debug)]
pub struct SimulationMachine {
    state: SimulationState,
    flight_duration: Duration,
    pending_state: bool,
    pending_completed: bool,
}

impl SimulationMachine {
    pub fn new(flight_duration: Duration) -> Self {
        Self {
            state: SimulationState::default(),
            flight_duration,
            pending_state: false,
            pending_completed: false,
        }
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn progress(&self) -> f64 {
        self.state.progress
    }

    pub fn flight_duration(&self) -> Duration {
        self.flight_duration
    }

    /// Flight-clock time corresponding to the current progress.
    pub fn flight_time(&self) -> Duration {
        self.flight_duration.mul_f64(self.state.progress)
    }

    fn update(&mut self, next: SimulationState) {
        if next != self.state {
            self.state = next;
            self.pending_state = true;
        }
    }

    fn toggle(&mut self) {
        let mut next = self.state;
        next.is_running = !next.is_running;

        // Starting a finished run replays it from the beginning.
        if next.is_running && next.progress >= 1.0 {
            next.progress = 0.0;
        }

        debug!(running = next.is_running, "Simulation toggled");
        self.update(next);
    }

    fn set_speed(&mut self, speed: i64) {
        let speed = speed.clamp(i64::from(MIN_SPEED), i64::from(MAX_SPEED)) as u8;
        self.update(SimulationState {
            speed_multiplier: speed,
            ..self.state
        });
    }

    fn set_progress(&mut self, progress: f64) {
        self.update(SimulationState {
            progress: clamp_progress(progress),
            ..self.state
        });
    }

    fn reset(&mut self) {
        self.update(SimulationState {
            is_running: false,
            progress: 0.0,
            ..self.state
        });
    }

    fn tick(&mut self, elapsed: Duration) {
        if !self.state.is_running {
            return;
        }

        let total = self.flight_duration.as_secs_f64();
        let advance = if total > 0.0 {
            elapsed.as_secs_f64() * f64::from(self.state.speed_multiplier) / total
        } else {
            1.0
        };

        let mut next = self.state;
        next.progress = clamp_progress(next.progress + advance);
        if next.progress >= 1.0 {
            next.is_running = false;
            self.pending_completed = true;
            debug!("Simulation completed");
        }
        self.update(next);
    }

    fn poll_state(&mut self) -> Option<SimulationState> {
        std::mem::take(&mut self.pending_state).then_some(self.state)
    }

    fn poll_completed(&mut self) -> bool {
        std::mem::take(&mut self.pending_completed)
    }
}

impl Default for SimulationMachine {
    fn default() -> Self {
        Self::new(DEFAULT_FLIGHT_DURATION)
    }
}

/// Clamp to `0.0..=1.0`, mapping NaN to `0.0`.
pub fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}

/// Format a flight-clock duration as `m:ss`.
pub fn format_flight_time(time: Duration) -> String {
    let total = time.as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationInput {
    Toggle,
    SetSpeed(i64),
    SetProgress(f64),
    Reset,
    /// Wall-clock time elapsed since the previous tick, at 1x speed.
    Tick(Duration),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationOutput {
    StateChanged(SimulationState),
    /// Progress reached the end of the path and the run stopped itself.
    Completed,
}

impl StateMachine for SimulationMachine {
    type Input = SimulationInput;
    type Output = SimulationOutput;

    fn process_input(&mut self, input: Self::Input) {
        match input {
            SimulationInput::Toggle => self.toggle(),
            SimulationInput::SetSpeed(speed) => self.set_speed(speed),
            SimulationInput::SetProgress(progress) => self.set_progress(progress),
            SimulationInput::Reset => self.reset(),
            SimulationInput::Tick(elapsed) => self.tick(elapsed),
        }
    }

    fn poll_output(&mut self) -> Option<Self::Output> {
        if let Some(state) = self.poll_state() {
            return Some(SimulationOutput::StateChanged(state));
        }

        if self.poll_completed() {
            return Some(SimulationOutput::Completed);
        }

        None
    }
}

/// Runner that turns [`Instant`]s into [`SimulationInput::Tick`]s for the wrapped machine.
///
/// Time spent paused is not counted: the clock only measures between instants observed while the
/// machine is running.
#[derive(Debug, Default)]
pub struct SimulationClock {
    machine: SimulationMachine,
    last_instant: Option<Instant>,
}

impl SimulationClock {
    pub fn new(machine: SimulationMachine) -> Self {
        Self {
            machine,
            last_instant: None,
        }
    }

    pub fn machine(&self) -> &SimulationMachine {
        &self.machine
    }

    fn observe(&mut self, now: Instant) {
        if !self.machine.is_running() {
            self.last_instant = None;
            return;
        }

        if let Some(last) = self.last_instant {
            let elapsed = now.saturating_duration_since(last);
            self.machine.process_input(SimulationInput::Tick(elapsed));
        }

        self.last_instant = self.machine.is_running().then_some(now);
    }
}

impl StateMachine for SimulationClock {
    type Input = SystemInput<SimulationInput, Instant>;
    type Output = SimulationOutput;

    fn process_input(&mut self, input: Self::Input) {
        match input {
            SystemInput::Input(input) => {
                if matches!(input, SimulationInput::Reset) {
                    self.last_instant = None;
                }
                self.machine.process_input(input);
            }
            SystemInput::System(now) => self.observe(now),
        }
    }

    fn poll_output(&mut self) -> Option<Self::Output> {
        self.machine.poll_output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_machine() -> SimulationMachine {
        let mut machine = SimulationMachine::new(Duration::from_secs(100));
        machine.process_input(SimulationInput::Toggle);
        machine
    }

    #[test]
    fn test_initial_state() {
        let machine = SimulationMachine::default();
        assert_eq!(machine.state(), SimulationState::default());
        assert!(!machine.is_running());
        assert_eq!(machine.state().speed_multiplier, 1);
        assert_eq!(machine.progress(), 0.0);
        assert_eq!(machine.flight_duration(), DEFAULT_FLIGHT_DURATION);
    }

    #[test]
    fn test_toggle_flips_running() {
        let mut machine = SimulationMachine::default();
        machine.process_input(SimulationInput::Toggle);
        assert!(machine.is_running());
        machine.process_input(SimulationInput::Toggle);
        assert!(!machine.is_running());
    }

    #[test]
    fn test_progress_is_clamped() {
        let mut machine = SimulationMachine::default();
        for (input, expected) in [
            (-0.5, 0.0),
            (0.25, 0.25),
            (1.0, 1.0),
            (7.0, 1.0),
            (f64::NAN, 0.0),
            (f64::INFINITY, 1.0),
        ] {
            machine.process_input(SimulationInput::SetProgress(input));
            assert_eq!(machine.progress(), expected, "input {input}");
        }
    }

    #[test]
    fn test_speed_is_clamped() {
        let mut machine = SimulationMachine::default();
        machine.process_input(SimulationInput::SetSpeed(0));
        assert_eq!(machine.state().speed_multiplier, 1);
        machine.process_input(SimulationInput::SetSpeed(42));
        assert_eq!(machine.state().speed_multiplier, 10);
        machine.process_input(SimulationInput::SetSpeed(4));
        assert_eq!(machine.state().speed_multiplier, 4);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut machine = running_machine();
        machine.process_input(SimulationInput::SetSpeed(3));
        machine.process_input(SimulationInput::SetProgress(0.6));

        machine.process_input(SimulationInput::Reset);
        let once = machine.state();
        machine.process_input(SimulationInput::Reset);

        assert_eq!(machine.state(), once);
        assert!(!once.is_running);
        assert_eq!(once.progress, 0.0);
        assert_eq!(once.speed_multiplier, 3);
    }

    #[test]
    fn test_tick_ignored_while_stopped() {
        let mut machine = SimulationMachine::new(Duration::from_secs(100));
        machine.process_input(SimulationInput::Tick(Duration::from_secs(10)));
        assert_eq!(machine.progress(), 0.0);
    }

    #[test]
    fn test_tick_scales_with_speed() {
        let mut machine = running_machine();
        machine.process_input(SimulationInput::Tick(Duration::from_secs(10)));
        assert!((machine.progress() - 0.1).abs() < 1e-9);

        machine.process_input(SimulationInput::SetSpeed(3));
        machine.process_input(SimulationInput::Tick(Duration::from_secs(10)));
        assert!((machine.progress() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_tick_completes_run() {
        let mut machine = running_machine();
        let _ = std::iter::from_fn(|| machine.poll_output()).count();

        machine.process_input(SimulationInput::Tick(Duration::from_secs(500)));
        assert_eq!(machine.progress(), 1.0);
        assert!(!machine.is_running());

        let outputs: Vec<_> = std::iter::from_fn(|| machine.poll_output()).collect();
        assert_eq!(outputs.len(), 2);
        assert!(matches!(outputs[0], SimulationOutput::StateChanged(s) if s.progress == 1.0));
        assert_eq!(outputs[1], SimulationOutput::Completed);
    }

    #[test]
    fn test_restart_after_completion_rewinds() {
        let mut machine = running_machine();
        machine.process_input(SimulationInput::Tick(Duration::from_secs(100)));
        assert!(!machine.is_running());

        machine.process_input(SimulationInput::Toggle);
        assert!(machine.is_running());
        assert_eq!(machine.progress(), 0.0);
    }

    #[test]
    fn test_poll_reports_changes_once() {
        let mut machine = SimulationMachine::default();
        assert!(machine.poll_output().is_none());

        machine.process_input(SimulationInput::SetProgress(0.5));
        machine.process_input(SimulationInput::SetProgress(0.7));
        assert!(matches!(
            machine.poll_output(),
            Some(SimulationOutput::StateChanged(s)) if s.progress == 0.7
        ));
        assert!(machine.poll_output().is_none());

        // Setting the same value again is not a change.
        machine.process_input(SimulationInput::SetProgress(0.7));
        assert!(machine.poll_output().is_none());
    }

    #[test]
    fn test_flight_time_formatting() {
        let mut machine = SimulationMachine::default();
        machine.process_input(SimulationInput::SetProgress(0.5));
        assert_eq!(machine.flight_time(), Duration::from_secs(300));
        assert_eq!(format_flight_time(machine.flight_time()), "5:00");
        assert_eq!(format_flight_time(Duration::from_secs(65)), "1:05");
        assert_eq!(format_flight_time(Duration::ZERO), "0:00");
    }

    #[test]
    fn test_clock_measures_only_running_time() {
        let start = Instant::now();
        let mut clock = SimulationClock::new(SimulationMachine::new(Duration::from_secs(100)));

        // Paused: instants are ignored.
        clock.process_input(SystemInput::System(start));
        clock.process_input(SystemInput::System(start + Duration::from_secs(50)));
        assert_eq!(clock.machine().progress(), 0.0);

        clock.process_input(SystemInput::Input(SimulationInput::Toggle));
        clock.process_input(SystemInput::System(start + Duration::from_secs(60)));
        clock.process_input(SystemInput::System(start + Duration::from_secs(70)));
        assert!((clock.machine().progress() - 0.1).abs() < 1e-9);

        clock.process_input(SystemInput::Input(SimulationInput::Toggle));
        clock.process_input(SystemInput::System(start + Duration::from_secs(90)));
        clock.process_input(SystemInput::Input(SimulationInput::Toggle));
        clock.process_input(SystemInput::System(start + Duration::from_secs(95)));
        assert!((clock.machine().progress() - 0.1).abs() < 1e-9);
    }
}
