//! # Chisel Core
//!
//! Foundation types shared by every layer of the Chisel command engine:
//!
//! - **Event System**: Read-only, type-erased events ([`Event`], [`BoxedEvent`])
//! - **Argument Values**: Typed values bound by argument cutters ([`ArgValue`], [`Arguments`])
//! - **Outcome Records**: Per-command evaluation results ([`HandlingStatus`])
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌────────────────┐
//! │ BoxedEvent  │────▶│  Command   │────▶│ HandlingStatus │
//! │ (snapshot)  │     │  filters   │     │   (record)     │
//! └─────────────┘     └────────────┘     └────────────────┘
//! ```

pub mod error;
pub mod event;
pub mod status;
pub mod value;

pub use error::{ArgumentError, ArgumentResult};
pub use event::{BoxedEvent, Event, EventContext, MESSAGE_EDIT, MESSAGE_NEW, TextEvent};
pub use status::{Decision, FilterResponse, HandlingStatus, StatusBuilder};
pub use value::{ArgValue, Arguments, FromArgValue};
