//! # flash-fsm
//! Host-side simulation of traffic signals running on the flash-fsm engine.
//!
//! Every signal instance shares one [`TransitionGraph`](flash_fsm_core::TransitionGraph);
//! only the per-crossing data differs. The [`sim`] module builds that graph,
//! parses [`SimConfig`] and drives the instances on tokio.

pub use flash_fsm_core;

pub mod sim;

pub use sim::{ConfigError, Crossing, Input, SimConfig, SimReport, Signal, TokioClock};
