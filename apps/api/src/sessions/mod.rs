// Voice sessions: one live call per candidate, driven by relayed voice-SDK
// events, ending in exactly one feedback dispatch.

pub mod agent;
pub mod assistant;
pub mod context;
pub mod controller;
pub mod handlers;
pub mod registry;
pub mod sink;
pub mod transcript;

#[cfg(test)]
pub(crate) mod testing;
