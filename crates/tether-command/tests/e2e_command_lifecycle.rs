//! End-to-end command lifecycle scenarios, driven the way UI glue would
//! drive them: query eligibility, invoke, cancel from a second command, and
//! observe state through change signals only.

use std::cell::RefCell;
use std::rc::Rc;

use tether_command::{
    AsyncCommand, CancelCommand, Command, CommandError, CommandParam, IS_FAULTED, TypedCommand,
};
use tokio::sync::oneshot;

#[tokio::test]
async fn cancelled_run_returns_to_idle_without_a_fault() {
    // Body waits on an external gate, then honors its token.
    let (gate_tx, gate_rx) = oneshot::channel::<()>();
    let gate = Rc::new(RefCell::new(Some(gate_rx)));
    let command = AsyncCommand::new(move |_parameter, token| {
        let gate = Rc::clone(&gate);
        async move {
            let gate_rx = gate.borrow_mut().take().expect("single run");
            let _ = gate_rx.await;
            if token.is_cancelled() {
                return Err(CommandError::Cancelled);
            }
            Ok(())
        }
    });

    futures::join!(
        async {
            let err = command.execute(None).await.unwrap_err();
            assert!(err.is_cancelled());
        },
        async {
            assert!(command.is_executing());
            command.cancel();
            // Still running, now cancelling.
            assert!(command.is_executing());
            assert!(command.is_cancellation_requested());
            gate_tx.send(()).unwrap();
        },
    );

    assert!(!command.is_executing());
    assert!(!command.is_faulted());
    assert!(command.last_fault().is_none());
    assert!(command.can_execute(None));
}

#[tokio::test]
async fn search_screen_flow() {
    // A "search" command with a non-empty-query condition and a cancel
    // button bound next to it.
    let results = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&results);
    let search = TypedCommand::<String>::with_eligibility(
        |query| !query.is_empty(),
        move |query, token| {
            let sink = Rc::clone(&sink);
            async move {
                tokio::task::yield_now().await;
                if token.is_cancelled() {
                    return Err(CommandError::Cancelled);
                }
                sink.borrow_mut().push((*query).clone());
                Ok(())
            }
        },
    );
    let cancel_button = CancelCommand::new(search.as_untyped());

    // Enablement before anything runs.
    let query: CommandParam = Rc::new(String::from("rust"));
    assert!(search.can_execute(Some(&*query)));
    let empty: CommandParam = Rc::new(String::new());
    assert!(!search.can_execute(Some(&*empty)));
    assert!(!cancel_button.can_execute());

    // A run that completes.
    search.execute_typed(String::from("rust")).await.unwrap();
    assert_eq!(*results.borrow(), vec!["rust"]);

    // A run cancelled from the button mid-flight.
    futures::join!(
        async {
            let err = search
                .execute_typed(String::from("slow query"))
                .await
                .unwrap_err();
            assert!(err.is_cancelled());
        },
        async {
            assert!(cancel_button.can_execute());
            Command::execute(&cancel_button, None).await.unwrap();
            assert!(!cancel_button.can_execute());
        },
    );
    assert_eq!(*results.borrow(), vec!["rust"]);
}

#[tokio::test]
async fn detached_ui_invocations_surface_faults_observably() {
    let command = AsyncCommand::new(|_parameter, _token| async {
        Err(CommandError::fault(std::io::Error::other(
            "backend unreachable",
        )))
    });

    // What a fault banner bound to the command would display.
    let banner = Rc::new(RefCell::new(None::<String>));
    let sink = Rc::clone(&banner);
    let command_for_listener = command.clone();
    let _sub = command.changes().subscribe(move |name| {
        if name == IS_FAULTED {
            *sink.borrow_mut() = command_for_listener
                .last_fault()
                .map(|fault| fault.to_string());
        }
    });

    command.execute_detached(None).await;
    assert!(command.is_faulted());
    assert!(
        banner
            .borrow()
            .as_deref()
            .unwrap_or_default()
            .contains("backend unreachable")
    );

    // Dismissing the banner.
    command.clear_fault();
    assert_eq!(*banner.borrow(), None);
    assert!(!command.is_faulted());
}
