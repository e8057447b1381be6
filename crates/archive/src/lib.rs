#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! ZIP decoding for content packages
//!
//! [`decode`] turns the bytes of a whole archive into a lazy, finite,
//! non-restartable sequence of [`ArchiveEntry`] values in archive order.
//! Entry names are normalized into [`EntryPath`]s up front: anything that
//! could point outside the extraction root is rejected before a caller ever
//! sees it. Consumers that need two passes call [`decode`] twice.

mod decode;
mod entry;
mod path;

pub use decode::{decode, decode_with_options, ArchiveEntries, DecodeOptions};
pub use entry::ArchiveEntry;
pub use path::EntryPath;

pub use hafiz_errors::ArchiveError;
