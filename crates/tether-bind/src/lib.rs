#![forbid(unsafe_code)]

//! Change notification substrate: property change signals, subscriptions,
//! and dependent-property propagation.

pub mod error;
pub mod hub;

pub use error::BindError;
pub use hub::{Bindable, Subscription};
