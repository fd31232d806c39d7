pub mod simulation;
pub mod wrappers;

/// The [`StateMachine`] trait provides calling semantics and indicates the upholding of invariants
/// that guarantee deterministic behavior.
///
/// # Functionality
/// A state machine consumes [`Input`](StateMachine::Input) values and is polled for
/// [`Output`](StateMachine::Output) values. Both are usually enums with one variant per kind of
/// event; the implementor maps variants onto its inherent methods in
/// [`process_input`](StateMachine::process_input) and [`poll_output`](StateMachine::poll_output)
/// so the inherent impl can stay focused on the actual logic.
///
/// # Invariants
/// Implementors must be pure: the same sequence of inputs always produces the same sequence of
/// outputs.
///
/// ## No Interior Mutability
/// All state is either immutable or mutated through `&mut self`. No [`std::cell`] containers, no
/// [`std::sync`] locks, no reference counted pointers.
///
/// ## No IO
/// No file, network or terminal access.
///
/// ### No System Time
/// Reading [`std::time::Instant::now`] or [`std::time::SystemTime`] makes two otherwise identical
/// runs diverge. Elapsed time must arrive as input, e.g. a `Tick(Duration)` variant.
///
/// ### No System RNG
/// Randomness, if needed, comes from a PRNG seeded through input.
///
/// ## No Concurrency, No Async, No Blocking
/// The machine never spawns threads or tasks, never awaits and never waits on anything. This keeps
/// it usable from synchronous callers and async tasks alike.
///
/// # Side Effects
/// Logging is allowed as long as the machine's logic never depends on it.
///
/// # Handling Time via Injection
/// A runner that wraps the machine performs the impure calls (reading the clock) and feeds the
/// results in as input. See the [`wrappers`] module for [`SystemInput`](wrappers::input::SystemInput),
/// which lets a runner accept either regular input or a system resource such as an
/// [`Instant`](std::time::Instant).
///
/// # Example
/// ```ignore
/// let mut machine = SimulationMachine::new(Duration::from_secs(600));
///
/// machine.process_input(SimulationInput::Toggle);
/// machine.process_input(SimulationInput::Tick(Duration::from_secs(60)));
///
/// while let Some(output) = machine.poll_output() {
///     match output {
///         SimulationOutput::StateChanged(state) => println!("progress {}", state.progress),
///         SimulationOutput::Completed => println!("done"),
///     }
/// }
/// ```
pub trait StateMachine {
    /// The type of input that is [processed](StateMachine::process_input) by the state machine.
    type Input;
    /// The type of output that is [polled](StateMachine::poll_output) from the state machine.
    type Output;

    /// Process the provided `input` into the state machine.
    fn process_input(&mut self, input: Self::Input);

    /// Poll the state machine for output, returning the first available output if present.
    fn poll_output(&mut self) -> Option<Self::Output>;
}
