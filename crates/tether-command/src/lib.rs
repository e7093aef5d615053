#![forbid(unsafe_code)]

//! Observable, cancellable, asynchronous command objects for data-bound UIs.
//!
//! A [`Command`] is one invocable, cancellable operation whose run state is
//! itself bindable: UI elements subscribe to the command's change hub and
//! re-query `can_execute`, `is_executing`, `is_cancellation_requested`, and
//! the fault slot as signals arrive.
//!
//! - [`AsyncCommand`] owns the run/cancel/fault lifecycle for one
//!   asynchronous body and guards against re-entrant invocation.
//! - [`CancelCommand`] wraps another command; its whole behavior is
//!   requesting cancellation of the target, and its eligibility tracks the
//!   target's run state.
//! - [`TypedCommand`] narrows the untyped invocation parameter to a concrete
//!   type before delegating.
//!
//! Commands are single-threaded shared handles (`Rc` interiors, `!Send`
//! futures); UI glue drives them on its local task set or event loop.

pub mod cancel;
pub mod command;
pub mod error;
pub mod machine;
pub mod typed;

pub use cancel::CancelCommand;
pub use command::{
    CAN_EXECUTE, Command, CommandFuture, CommandParam, IS_CANCELLATION_REQUESTED, IS_EXECUTING,
    IS_FAULTED, LAST_FAULT,
};
pub use error::CommandError;
pub use machine::AsyncCommand;
pub use typed::TypedCommand;

pub use tether_bind::{BindError, Bindable, Subscription};
