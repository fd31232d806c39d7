use std::time::Instant;

/// The [`SystemResource`] trait indicates that a type is a resource inherently provided by the
/// system context of the application, such as the current time.
///
/// Runners call [`generate`](SystemResource::generate) and pass the result to a machine through
/// [`SystemInput::System`], keeping the machine itself free of system access.
pub trait SystemResource {
    /// Produce an instance of this resource from the implicit global system context.
    fn generate() -> Self;
}

impl SystemResource for Instant {
    fn generate() -> Self {
        Instant::now()
    }
}

/// A [`StateMachine`](crate::state_machine::StateMachine) input wrapper that carries either the
/// machine's own input `I` or a [`SystemResource`] `S`.
#[derive(Debug, Clone, PartialEq)]
pub enum SystemInput<I, S> {
    Input(I),
    System(S),
}

impl<I, S: SystemResource> SystemInput<I, S> {
    /// Wrap a freshly generated system resource.
    pub fn system() -> Self {
        SystemInput::System(S::generate())
    }
}
