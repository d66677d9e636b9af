// Copyright 2025 0xjcf
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg_attr(not(feature = "std"), no_std)]

//! # flash-fsm
//! Packed, read-only string tables and cooperative, table-driven finite-state
//! machines for microcontroller firmware.
//!
//! A [`TransitionGraph`] is built once with a [`GraphBuilder`] and shared by any
//! number of [`ExecutionContext`]s. Each context owns the per-instance data that
//! its callbacks receive through a [`Scope`], so one set of plain `fn` callbacks
//! serves every instance of a machine.

// Lets the derive output (`::flash_fsm_core::...`) resolve inside this crate too.
extern crate self as flash_fsm_core;

#[macro_use]
mod trace;

pub mod clock;
pub mod context;
#[cfg(feature = "diagram")]
pub mod diagram;
pub mod graph;
pub mod labels;
pub mod machine;
pub mod memory;
pub mod strings;
#[cfg(feature = "async")]
pub mod timer;

pub use clock::{Clock, ManualClock, Millis};
pub use context::{Cause, ExecutionContext, Scope, StepReport, Transition, TriggerOutcome};
pub use flash_fsm_macro::{States, Triggers};
pub use graph::{
    ActionFn, EnterFn, ExitFn, GraphBuilder, GraphError, StateDef, StateId, StepFn,
    TransitionGraph, TriggerId,
};
pub use labels::{LabelKind, LabelTable, Labels};
pub use machine::Machine;
pub use memory::{ProgMem, ReadOnlyMemory};
pub use strings::{FlashStr, PackedStringTable, StringHandle, StringTable, TableError};

pub mod prelude {
    pub use crate::{
        Clock, ExecutionContext, GraphBuilder, Labels, Machine, Millis, Scope, StateDef,
        StateId, StateMachine, States, StringTable, Tick, TransitionGraph, TriggerId, Triggers,
    };
}

#[doc(hidden)]
pub mod __private {
    pub use critical_section;
    pub use static_cell::StaticCell;
}

/// The runtime surface a firmware loop needs from a running machine.
pub trait StateMachine {
    type Data;

    /// Applies `trigger` now (`immediate`) or queues it for the next step.
    fn trigger(&mut self, trigger: TriggerId, immediate: bool) -> TriggerOutcome;
    /// Runs one cooperative tick.
    fn step(&mut self) -> StepReport;
    fn state(&self) -> StateId;
    fn data(&self) -> &Self::Data;
    fn data_mut(&mut self) -> &mut Self::Data;
}

/// Object-safe view of a machine that can be ticked, used to drive
/// heterogeneous machines from one loop.
pub trait Tick {
    fn tick(&mut self) -> StepReport;
}

impl<M: StateMachine + ?Sized> Tick for M {
    fn tick(&mut self) -> StepReport {
        self.step()
    }
}
