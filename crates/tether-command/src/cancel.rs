#![forbid(unsafe_code)]

//! Cancellation delegation: a command whose entire behavior is requesting
//! cancellation of another command.
//!
//! A UI typically binds a "Cancel" button to a [`CancelCommand`] wrapping the
//! long-running command next to it: the button enables exactly while the
//! target runs and is not already cancelling, without the button knowing
//! anything about the target's body.

use std::any::Any;
use std::rc::Rc;

use futures::future;
use tether_bind::{Bindable, Subscription};

use crate::command::{
    CAN_EXECUTE, Command, CommandFuture, CommandParam, IS_CANCELLATION_REQUESTED, IS_EXECUTING,
};
use crate::machine::AsyncCommand;

struct Inner {
    changes: Rc<Bindable>,
    target: AsyncCommand,
    /// Keeps the eligibility re-binding alive for the command's lifetime.
    _watch: Subscription,
}

/// A command that cancels one target command.
///
/// Holds a shared handle to the target, fixed at construction; it has no
/// state of its own beyond that reference.
pub struct CancelCommand {
    inner: Rc<Inner>,
}

impl Clone for CancelCommand {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for CancelCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelCommand")
            .field("can_execute", &self.can_execute())
            .finish_non_exhaustive()
    }
}

impl CancelCommand {
    /// Wrap `target`.
    ///
    /// Subscribes once to the target's change hub with a narrow binding:
    /// only the two properties eligibility derives from re-raise this
    /// command's own `can_execute` signal.
    #[must_use]
    pub fn new(target: &AsyncCommand) -> Self {
        let changes = Rc::new(Bindable::new());
        let watch = {
            let changes = Rc::clone(&changes);
            target.changes().subscribe(move |name| {
                if name == IS_EXECUTING || name == IS_CANCELLATION_REQUESTED {
                    // Own name is a compile-time constant; raise cannot fail.
                    let _ = changes.raise(CAN_EXECUTE);
                }
            })
        };
        Self {
            inner: Rc::new(Inner {
                changes,
                target: target.clone(),
                _watch: watch,
            }),
        }
    }

    /// Eligible exactly while the target runs and is not yet cancelling.
    #[must_use]
    pub fn can_execute(&self) -> bool {
        self.inner.target.is_executing() && !self.inner.target.is_cancellation_requested()
    }
}

impl Command for CancelCommand {
    fn can_execute(&self, _parameter: Option<&dyn Any>) -> bool {
        CancelCommand::can_execute(self)
    }

    /// Requests cancellation on the target eagerly; the returned future is
    /// already complete. Invoking while ineligible is guarded by
    /// `can_execute`, not rejected here.
    fn execute(&self, _parameter: Option<CommandParam>) -> CommandFuture {
        self.inner.target.cancel();
        Box::pin(future::ready(Ok(())))
    }

    fn changes(&self) -> &Bindable {
        &self.inner.changes
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::CommandError;

    fn count_eligibility_signals(command: &CancelCommand) -> (Rc<RefCell<usize>>, Subscription) {
        let hits = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&hits);
        let sub = command.changes().subscribe(move |name| {
            if name == CAN_EXECUTE {
                *sink.borrow_mut() += 1;
            }
        });
        (hits, sub)
    }

    #[tokio::test]
    async fn ineligible_while_target_is_idle() {
        let target = AsyncCommand::new(|_parameter, _token| async { Ok(()) });
        let cancel = CancelCommand::new(&target);
        assert!(!cancel.can_execute());
        assert!(!Command::can_execute(&cancel, None));
    }

    #[tokio::test]
    async fn eligibility_follows_the_target_with_one_signal_per_transition() {
        let target = AsyncCommand::new(|_parameter, token| async move {
            token.cancelled().await;
            Err(CommandError::Cancelled)
        });
        let cancel = CancelCommand::new(&target);
        let (hits, _sub) = count_eligibility_signals(&cancel);

        futures::join!(
            async {
                let err = target.execute_linked(None, None).await.unwrap_err();
                assert!(err.is_cancelled());
            },
            async {
                // Target started: one transition, one signal.
                assert!(cancel.can_execute());
                assert_eq!(*hits.borrow(), 1);

                // Cancellation requested: eligibility drops, one signal.
                Command::execute(&cancel, None).await.unwrap();
                assert!(!cancel.can_execute());
                assert_eq!(*hits.borrow(), 2);
            },
        );

        // Target finished: one more signal, still ineligible.
        assert!(!cancel.can_execute());
        assert_eq!(*hits.borrow(), 3);
    }

    #[tokio::test]
    async fn execute_requests_cancellation_on_the_target() {
        let target = AsyncCommand::new(|_parameter, token| async move {
            token.cancelled().await;
            Err(CommandError::Cancelled)
        });
        let cancel = CancelCommand::new(&target);

        futures::join!(
            async {
                let err = target.execute_linked(None, None).await.unwrap_err();
                assert!(err.is_cancelled());
            },
            async {
                Command::execute(&cancel, None).await.unwrap();
                assert!(target.is_cancellation_requested());
            },
        );
    }

    #[tokio::test]
    async fn execute_while_ineligible_completes_without_effect() {
        let target = AsyncCommand::new(|_parameter, _token| async { Ok(()) });
        let cancel = CancelCommand::new(&target);

        // Guarded by can_execute in real bindings; calling anyway is benign.
        Command::execute(&cancel, None).await.unwrap();
        assert!(!target.is_cancellation_requested());
        assert!(!target.is_executing());
    }
}
