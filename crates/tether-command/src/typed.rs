#![forbid(unsafe_code)]

//! Typed-parameter convenience layer.
//!
//! UI frameworks hand commands an untyped parameter; [`TypedCommand`]
//! narrows it to a declared type before consulting the typed eligibility
//! hook or the body. The hooks are private captures, so they cannot be
//! reached without the narrowing check, and the wrapped machine keeps
//! enforcing the "not currently running" condition.

use std::any::{Any, type_name};
use std::future::Future;
use std::marker::PhantomData;
use std::rc::Rc;

use tether_bind::Bindable;
use tokio_util::sync::CancellationToken;

use crate::command::{Command, CommandFuture, CommandParam};
use crate::error::CommandError;
use crate::machine::AsyncCommand;

/// A command whose parameter is narrowed to `T` before delegation.
///
/// `can_execute` is false when the parameter is absent or not a `T`;
/// otherwise the typed hook decides, conjoined with the machine's Idle
/// check. Cloning yields a new handle to the same command state.
pub struct TypedCommand<T: 'static> {
    raw: AsyncCommand,
    _parameter: PhantomData<fn(T)>,
}

impl<T: 'static> Clone for TypedCommand<T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            _parameter: PhantomData,
        }
    }
}

impl<T: 'static> std::fmt::Debug for TypedCommand<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedCommand")
            .field("parameter_type", &type_name::<T>())
            .field("is_executing", &self.raw.is_executing())
            .finish_non_exhaustive()
    }
}

impl<T: 'static> TypedCommand<T> {
    /// Create a typed command from its execution body; every well-typed
    /// parameter is eligible.
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: Fn(Rc<T>, CancellationToken) -> Fut + 'static,
        Fut: Future<Output = Result<(), CommandError>> + 'static,
    {
        Self::with_eligibility(|_| true, body)
    }

    /// Create a typed command with a typed eligibility hook.
    ///
    /// The hook only ever sees parameters that narrowed to `T`.
    pub fn with_eligibility<E, F, Fut>(eligible: E, body: F) -> Self
    where
        E: Fn(&T) -> bool + 'static,
        F: Fn(Rc<T>, CancellationToken) -> Fut + 'static,
        Fut: Future<Output = Result<(), CommandError>> + 'static,
    {
        let raw = AsyncCommand::with_eligibility(
            move |parameter: Option<&dyn Any>| {
                // Absent or foreign-typed parameters are ineligible before
                // the typed hook is consulted.
                parameter
                    .and_then(<dyn Any>::downcast_ref::<T>)
                    .is_some_and(&eligible)
            },
            move |parameter: Option<CommandParam>, token: CancellationToken| {
                // Unreachable with a wrong type through can_execute-gated
                // invocation; re-narrowed defensively for direct callers.
                let narrowed = parameter.and_then(|p| p.downcast::<T>().ok());
                let invocation = narrowed.map(|value| body(value, token));
                async move {
                    match invocation {
                        Some(invocation) => invocation.await,
                        None => Err(CommandError::ParameterMismatch {
                            expected: type_name::<T>(),
                        }),
                    }
                }
            },
        );
        Self {
            raw,
            _parameter: PhantomData,
        }
    }

    /// Invoke with a typed parameter.
    pub fn execute_typed(&self, value: T) -> CommandFuture {
        let parameter: CommandParam = Rc::new(value);
        self.raw.execute_linked(Some(parameter), None)
    }

    /// The wrapped state machine (for cancellation delegation and state
    /// queries).
    #[must_use]
    pub fn as_untyped(&self) -> &AsyncCommand {
        &self.raw
    }
}

impl<T: 'static> Command for TypedCommand<T> {
    fn can_execute(&self, parameter: Option<&dyn Any>) -> bool {
        self.raw.can_execute(parameter)
    }

    fn execute(&self, parameter: Option<CommandParam>) -> CommandFuture {
        self.raw.execute_linked(parameter, None)
    }

    fn changes(&self) -> &Bindable {
        self.raw.changes()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
