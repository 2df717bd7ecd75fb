//! PinPod lifecycle reconciliation controller.
//! Host-driven: no I/O; host passes events and receives actions.

pub mod controller;
pub mod event;
pub mod ffi;
pub mod state;

pub use controller::{Controller, ControllerConfig, Snapshot};
pub use event::{Action, ActionKind, Input, Outcome};
pub use state::{
    AppState, BlockId, ErrorReport, NodeState, ParseError, PreparedDir, SummaryCounters,
    ThreadConfig, ThreadId,
};

/// Version of the JSON shapes exchanged over the C ABI.
pub const ABI_VERSION: u8 = 1;
