#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod checks;
pub mod config;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod event;
pub mod image;
pub mod notify;
pub mod probe;
#[doc(hidden)]
pub mod process;
pub mod queue;
pub mod registry;
pub mod report;

pub use config::Config;
pub use engine::{Decision, Engine, Verdict};
pub use error::ImageCheckError;
