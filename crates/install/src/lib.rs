#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Content package installation for hafiz
//!
//! An install moves through `Idle → Downloading → Extracting → Committing →
//! Installed`, ending in `Failed` or `Cancelled` otherwise. The archive is
//! streamed to a temp file, extracted in two passes into a per-attempt
//! staging directory and renamed into the content store in one step, so a
//! package namespace is never seen half-written.
//!
//! At most one install or uninstall runs per package id; a second request
//! for a busy id is rejected with `AlreadyInProgress`.

mod hooks;
mod inflight;
mod installer;
mod staging;

pub use hooks::InstallHook;
pub use inflight::InFlight;
pub use installer::Installer;
pub use staging::{verify_expected_entries, PassStats};
