//! Wrappers for [`StateMachine`](super::StateMachine) runners that inject system resources, such
//! as the current time, into a pure machine as ordinary input.

pub mod input;
