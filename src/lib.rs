#[macro_use] extern crate derivative;
#[macro_use] extern crate log;

mod config;
mod error;
mod message;
mod shared;
mod state;

pub mod internal;
pub mod socket;
pub mod thread;
pub mod transport;

pub use crate::config::Config;
pub use crate::error::Error;
pub use crate::message::{Notification, Vote};
pub use crate::shared::Shared;
pub use crate::state::{Outcome, Tally, DEFAULT_OPTIONS};
