#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the hafiz content installer
//!
//! This crate provides the values that flow between the transfer manager,
//! the archive codec, the content store and the installer: package
//! identity and descriptors, transfer bookkeeping, install phases and the
//! terminal install result.

pub mod package;
pub mod reports;
pub mod state;
pub mod transfer;

// Re-export commonly used types
pub use hafiz_errors::ErrorKind;
pub use hafiz_hash::Hash;
pub use package::{PackageDescriptor, PackageId};
pub use reports::{InstallFailure, InstallResult, InstallStatus};
pub use state::{InstallPhase, StagingPass};
pub use transfer::TransferState;
