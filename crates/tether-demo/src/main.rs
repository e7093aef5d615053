#![forbid(unsafe_code)]

//! Console walkthrough: a cancellable "report build" command driven the way
//! a UI would drive it, with change signals printed as they arrive.
//!
//! Run with: cargo run -p tether-demo

use std::error::Error;
use std::time::Duration;

use tether_command::{AsyncCommand, CancelCommand, Command, CommandError};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let local = tokio::task::LocalSet::new();
    local.run_until(run()).await
}

async fn run() -> Result<(), Box<dyn Error>> {
    let build = AsyncCommand::new(|_parameter, token| async move {
        for step in ["collect", "aggregate", "render", "publish"] {
            if token.is_cancelled() {
                return Err(CommandError::Cancelled);
            }
            println!("build: {step}");
            tokio::time::sleep(Duration::from_millis(120)).await;
        }
        Ok(())
    });
    let cancel_button = CancelCommand::new(&build);

    let _status = build
        .changes()
        .subscribe(|name| println!("  signal: {name}"));

    println!("-- first run, left alone --");
    build.execute(None).await?;

    println!("-- second run, cancelled mid-flight --");
    let running = tokio::task::spawn_local(build.execute(None));
    tokio::time::sleep(Duration::from_millis(200)).await;
    if cancel_button.can_execute() {
        cancel_button.execute(None).await?;
    }
    match running.await? {
        Ok(()) => println!("build finished before the cancel landed"),
        Err(err) if err.is_cancelled() => println!("build cancelled as requested"),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}
