/// Renderer bridge that records events and state updates.
pub mod bridge;
/// Manually advanced clock.
pub mod clock;
/// Executor that runs tasks inline.
pub mod executor;
/// Native facade that records calls.
pub mod facade;
/// Tree harness for integration tests.
pub mod harness;
