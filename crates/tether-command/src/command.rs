#![forbid(unsafe_code)]

//! The public command contract and its observable property names.

use std::any::Any;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use tether_bind::Bindable;

use crate::error::CommandError;

/// Eligibility: true exactly while the command may be invoked.
pub const CAN_EXECUTE: &str = "can_execute";
/// True while an invocation is active.
pub const IS_EXECUTING: &str = "is_executing";
/// True while an invocation is active and cancellation has been requested.
pub const IS_CANCELLATION_REQUESTED: &str = "is_cancellation_requested";
/// True while the fault slot is occupied (dependent of [`LAST_FAULT`]).
pub const IS_FAULTED: &str = "is_faulted";
/// The fault slot itself.
pub const LAST_FAULT: &str = "last_fault";

/// Untyped invocation parameter.
///
/// Shared ownership keeps detached invocation futures `'static`; the typed
/// layer narrows it with `downcast`.
pub type CommandParam = Rc<dyn Any>;

/// Future returned by command invocation.
///
/// Commands are single-threaded, so the future is `!Send`; UI glue drives it
/// on its local task set or event loop.
pub type CommandFuture = LocalBoxFuture<'static, Result<(), CommandError>>;

/// An invocable, cancellable, observable operation.
///
/// The contract UI glue binds to: query [`can_execute`](Command::can_execute)
/// before invoking, drive the future returned by
/// [`execute`](Command::execute), and subscribe to
/// [`changes`](Command::changes) to re-query state as signals arrive.
pub trait Command {
    /// Whether the command may be invoked right now.
    fn can_execute(&self, parameter: Option<&dyn Any>) -> bool;

    /// Invoke the command.
    ///
    /// The outcome (success, [`CommandError::Cancelled`], or a fault)
    /// reaches the caller unmodified.
    fn execute(&self, parameter: Option<CommandParam>) -> CommandFuture;

    /// The change hub bindings subscribe to.
    fn changes(&self) -> &Bindable;
}
