#![forbid(unsafe_code)]

//! Command execution state machine.
//!
//! # Design
//!
//! [`AsyncCommand`] owns the run/cancel/fault lifecycle for one asynchronous
//! operation. It is a cheaply-cloneable shared handle: every clone points at
//! the same interior state, so UI glue, the execution body, and a
//! [`CancelCommand`](crate::CancelCommand) can all hold one.
//!
//! The execution body and the optional eligibility hook are injected at
//! construction. The public [`can_execute`](AsyncCommand::can_execute)
//! always conjoins "not currently running" with the hook; the hook is a
//! private capture, so no caller can consult it without the base condition.
//!
//! States: **Idle** (no run token) → **Running** (token present) →
//! **Running-Cancelling** (token cancelled) → back to **Idle** when the body
//! completes by any path. Completion includes the caller dropping the
//! invocation future mid-await: an RAII run guard restores Idle and re-emits
//! the `is_executing` signal from its `Drop` impl.
//!
//! # Invariants
//!
//! 1. At most one invocation is active per command; a second `execute` while
//!    Running fails with [`CommandError::AlreadyExecuting`].
//! 2. `is_executing` and `is_cancellation_requested` are always consistent
//!    with the presence and cancelled state of the run token.
//! 3. The `is_executing` signal is emitted strictly before the body starts
//!    and strictly after it finishes, on every completion path.
//! 4. The fault slot is written only by the detached invocation path, and
//!    strictly before its change signal.
//!
//! # Failure Modes
//!
//! - **Body ignores the token**: cancellation is cooperative; a body that
//!   never checks its token runs to completion normally.
//! - **Listener panics during a signal**: the panic unwinds through the
//!   raising call; the run guard still restores Idle.

use std::any::Any;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use tether_bind::Bindable;
use tokio_util::sync::CancellationToken;

use crate::command::{
    CAN_EXECUTE, Command, CommandFuture, CommandParam, IS_CANCELLATION_REQUESTED, IS_EXECUTING,
    IS_FAULTED, LAST_FAULT,
};
use crate::error::CommandError;

type EligibilityFn = dyn Fn(Option<&dyn Any>) -> bool;
type BodyFn = dyn Fn(Option<CommandParam>, CancellationToken) -> CommandFuture;

/// Shared interior for [`AsyncCommand`].
struct Inner {
    changes: Bindable,
    /// Run token: present exactly while an invocation is active. Exclusively
    /// owned by that invocation; `cancel()` only clones the handle long
    /// enough to request cancellation.
    run: RefCell<Option<CancellationToken>>,
    /// Most recent unhandled error from the detached invocation path.
    last_fault: RefCell<Option<CommandError>>,
    /// Extra eligibility condition, conjoined with "not currently running".
    eligible: Option<Box<EligibilityFn>>,
    /// The execution body.
    body: Box<BodyFn>,
}

impl Inner {
    fn notify(&self, property: &'static str) {
        // Property names are compile-time constants; the only failure mode
        // of raise() (an empty name) cannot occur.
        let _ = self.changes.raise(property);
    }
}

/// Clears the run token and re-emits `is_executing` when the invocation
/// ends, whether the body returned or the caller dropped the future.
struct RunGuard {
    inner: Rc<Inner>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.inner.run.borrow_mut().take();
        self.inner.notify(IS_EXECUTING);
    }
}

/// One invocable, cancellable, observable asynchronous operation.
///
/// Cloning yields a new handle to the **same** command state.
pub struct AsyncCommand {
    inner: Rc<Inner>,
}

impl Clone for AsyncCommand {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for AsyncCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncCommand")
            .field("is_executing", &self.is_executing())
            .field("is_cancellation_requested", &self.is_cancellation_requested())
            .field("is_faulted", &self.is_faulted())
            .finish_non_exhaustive()
    }
}

impl AsyncCommand {
    /// Create a command from its execution body.
    ///
    /// The body receives the invocation parameter and the run token; it is
    /// expected to check the token at its own suspension points and unwind
    /// with [`CommandError::Cancelled`] when cancellation is requested.
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: Fn(Option<CommandParam>, CancellationToken) -> Fut + 'static,
        Fut: Future<Output = Result<(), CommandError>> + 'static,
    {
        Self::build(None, body)
    }

    /// Create a command with an extra eligibility condition.
    ///
    /// The public [`can_execute`](Self::can_execute) conjoins the hook with
    /// the base "not currently running" condition; the hook alone is never
    /// reachable from outside.
    pub fn with_eligibility<E, F, Fut>(eligible: E, body: F) -> Self
    where
        E: Fn(Option<&dyn Any>) -> bool + 'static,
        F: Fn(Option<CommandParam>, CancellationToken) -> Fut + 'static,
        Fut: Future<Output = Result<(), CommandError>> + 'static,
    {
        let eligible: Box<EligibilityFn> = Box::new(eligible);
        Self::build(Some(eligible), body)
    }

    fn build<F, Fut>(eligible: Option<Box<EligibilityFn>>, body: F) -> Self
    where
        F: Fn(Option<CommandParam>, CancellationToken) -> Fut + 'static,
        Fut: Future<Output = Result<(), CommandError>> + 'static,
    {
        let changes = Bindable::new();
        // Names are compile-time constants; registration cannot fail.
        let _ = changes.register_dependent(IS_EXECUTING, CAN_EXECUTE);
        let _ = changes.register_dependent(LAST_FAULT, IS_FAULTED);
        Self {
            inner: Rc::new(Inner {
                changes,
                run: RefCell::new(None),
                last_fault: RefCell::new(None),
                eligible,
                body: Box::new(move |parameter, token| -> CommandFuture {
                    Box::pin(body(parameter, token))
                }),
            }),
        }
    }

    /// Whether the command may be invoked right now: Idle, and the
    /// eligibility hook (when present) accepts the parameter.
    #[must_use]
    pub fn can_execute(&self, parameter: Option<&dyn Any>) -> bool {
        if self.is_executing() {
            return false;
        }
        match &self.inner.eligible {
            Some(hook) => hook(parameter),
            None => true,
        }
    }

    /// True while an invocation is active.
    #[must_use]
    pub fn is_executing(&self) -> bool {
        self.inner.run.borrow().is_some()
    }

    /// True while an invocation is active and cancellation has been
    /// requested, through [`cancel()`](Self::cancel) or through the
    /// caller's linked signal.
    #[must_use]
    pub fn is_cancellation_requested(&self) -> bool {
        self.inner
            .run
            .borrow()
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// True while the fault slot is occupied.
    #[must_use]
    pub fn is_faulted(&self) -> bool {
        self.inner.last_fault.borrow().is_some()
    }

    /// The most recent unhandled error from a detached invocation, if any.
    #[must_use]
    pub fn last_fault(&self) -> Option<CommandError> {
        self.inner.last_fault.borrow().clone()
    }

    /// The change hub bindings subscribe to.
    #[must_use]
    pub fn changes(&self) -> &Bindable {
        &self.inner.changes
    }

    /// Request cancellation of the active invocation.
    ///
    /// No-op while Idle (no signal). While Running and not yet cancelling:
    /// cancels the run token and emits exactly one
    /// `is_cancellation_requested` signal. Returns immediately; honoring the
    /// request is the body's responsibility.
    pub fn cancel(&self) {
        let token = self.inner.run.borrow().clone();
        let Some(token) = token else { return };
        if token.is_cancelled() {
            return;
        }
        token.cancel();
        tracing::debug!(message = "command.cancel_requested");
        self.inner.notify(IS_CANCELLATION_REQUESTED);
    }

    /// Empty the fault slot, signalling `last_fault` (and its dependent
    /// `is_faulted`) only when the slot was occupied.
    pub fn clear_fault(&self) {
        let had_fault = self.inner.last_fault.borrow_mut().take().is_some();
        if had_fault {
            self.inner.notify(LAST_FAULT);
        }
    }

    /// Invoke the command, linking the run token to an optional external
    /// cancellation signal.
    ///
    /// The run token is a child of `signal` when one is supplied, so either
    /// the caller's signal or [`cancel()`](Self::cancel) can request
    /// cancellation; an external request flips `is_cancellation_requested`
    /// but emits no signal of its own.
    pub fn execute_linked(
        &self,
        parameter: Option<CommandParam>,
        signal: Option<&CancellationToken>,
    ) -> CommandFuture {
        let this = self.clone();
        let signal = signal.cloned();
        Box::pin(this.invoke(parameter, signal))
    }

    /// Invoke the command with no return channel.
    ///
    /// The returned future resolves to `()` whatever the outcome:
    /// cancellation is an expected, silent result for this entry point, and
    /// any other error is recorded into the observable fault slot instead of
    /// propagated. Intended for UI glue that reacts to an event and cannot
    /// await a result.
    pub fn execute_detached(&self, parameter: Option<CommandParam>) -> LocalBoxFuture<'static, ()> {
        let this = self.clone();
        Box::pin(async move {
            match this.clone().invoke(parameter, None).await {
                Ok(()) => {}
                Err(err) if err.is_cancelled() => {
                    tracing::trace!(message = "command.detached_cancelled");
                }
                Err(err) => this.record_fault(err),
            }
        })
    }

    /// The execution core shared by every invocation path.
    async fn invoke(
        self,
        parameter: Option<CommandParam>,
        external: Option<CancellationToken>,
    ) -> Result<(), CommandError> {
        let token = external.map_or_else(CancellationToken::new, |signal| signal.child_token());
        {
            let mut run = self.inner.run.borrow_mut();
            if run.is_some() {
                return Err(CommandError::AlreadyExecuting);
            }
            *run = Some(token.clone());
        }
        self.clear_fault();
        self.inner.notify(IS_EXECUTING);
        tracing::debug!(message = "command.execute_started");

        // Restores Idle and re-emits `is_executing` on every exit path,
        // including this future being dropped at an await point.
        let _guard = RunGuard {
            inner: Rc::clone(&self.inner),
        };
        let outcome = (self.inner.body)(parameter, token).await;
        match &outcome {
            Ok(()) => tracing::debug!(message = "command.execute_finished"),
            Err(err) if err.is_cancelled() => {
                tracing::debug!(message = "command.execute_cancelled");
            }
            Err(err) => tracing::debug!(message = "command.execute_faulted", error = %err),
        }
        outcome
    }

    fn record_fault(&self, fault: CommandError) {
        tracing::debug!(message = "command.fault_recorded", error = %fault);
        // The slot is written before the signal so synchronous listeners
        // observe the new fault.
        *self.inner.last_fault.borrow_mut() = Some(fault);
        self.inner.notify(LAST_FAULT);
    }
}

impl Command for AsyncCommand {
    fn can_execute(&self, parameter: Option<&dyn Any>) -> bool {
        AsyncCommand::can_execute(self, parameter)
    }

    fn execute(&self, parameter: Option<CommandParam>) -> CommandFuture {
        self.execute_linked(parameter, None)
    }

    fn changes(&self) -> &Bindable {
        AsyncCommand::changes(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
