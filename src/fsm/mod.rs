//! Function-pointer session state machine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌───────────────┬───────────┬──────────┬─────────────────┐  │
//! │  │ StateId       │ on_enter  │ on_exit  │ on_event        │  │
//! │  ├───────────────┼───────────┼──────────┼─────────────────┤  │
//! │  │ Idle          │ fn(ctx)   │ –        │ fn(ctx, ev)->?  │  │
//! │  │ Connected     │ –         │ –        │ fn(ctx, ev)->?  │  │
//! │  │ ReceivingData │ –         │ fn(ctx)  │ fn(ctx, ev)->?  │  │
//! │  │ SendingData   │ –         │ fn(ctx)  │ fn(ctx, ev)->?  │  │
//! │  └───────────────┴───────────┴──────────┴─────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each transport event is dispatched to `on_event` for the **current**
//! state.  If it returns `Some(next_id)`, the engine runs `on_exit` for
//! the current state, then `on_enter` for the next, and reports the new
//! status.  All functions receive `&mut SessionContext`, which owns the
//! transfer buffers and the action/report outboxes.

pub mod context;
pub mod states;

use context::SessionContext;
use log::info;

use crate::app::events::SessionEvent;
use crate::events::LinkEvent;
use crate::protocol::profile::Status;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all session states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    /// No central connected.
    Idle = 0,
    /// Central connected, no transfer active.
    Connected = 1,
    /// Accumulating an inbound envelope.
    ReceivingData = 2,
    /// Emitting an outbound envelope under flow control.
    SendingData = 3,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert an index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `Idle` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Connected,
            2 => Self::ReceivingData,
            3 => Self::SendingData,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Idle
            }
        }
    }

    /// Observer status shown while in this state.
    pub fn status(self) -> Status {
        match self {
            Self::Idle => Status::Disconnected,
            Self::Connected => Status::Connected,
            Self::ReceivingData => Status::ReceivingData,
            Self::SendingData => Status::SendingData,
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut SessionContext);

/// Signature for the per-event handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateEventFn = fn(&mut SessionContext, &LinkEvent) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single session state.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_event: StateEventFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The session state machine engine.
///
/// Not `Sync`: events must reach it one at a time (see [`crate::events`]).
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Events dispatched since construction.
    event_count: u64,
    /// Event count at which the current state was entered.
    state_entry_event: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            event_count: 0,
            state_entry_event: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    pub fn start(&mut self, ctx: &mut SessionContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Dispatch one transport event to the current state's handler and
    /// perform the transition it requests.
    pub fn dispatch(&mut self, event: &LinkEvent, ctx: &mut SessionContext) {
        self.event_count += 1;

        let next = (self.table[self.current].on_event)(ctx, event);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Force an immediate transition (used by the server after a receive
    /// completes, and on stop).
    pub fn force_transition(&mut self, next: StateId, ctx: &mut SessionContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    /// How many events the FSM has handled in the current state.
    pub fn events_in_current_state(&self) -> u64 {
        self.event_count - self.state_entry_event
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut SessionContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_event = self.event_count;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }

        ctx.report(SessionEvent::Status(next_id.status()));
    }
}
