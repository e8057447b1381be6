//! Hook points in the install lifecycle
//!
//! Hooks run on the installer's task between steps. Returning an error
//! fails the attempt exactly like a real failure at that point would,
//! including cleanup, which makes them useful for policy checks and for
//! exercising the failure paths.

use hafiz_errors::Error;
use hafiz_types::{PackageId, StagingPass};
use std::path::Path;

pub trait InstallHook: Send + Sync {
    /// Name of this hook for logs
    fn name(&self) -> &'static str;

    /// Called once the archive is on disk, before decoding starts
    fn before_extract(&self, _package: &PackageId, _archive: &Path) -> Result<(), Error> {
        Ok(())
    }

    /// Called after each staging pass completes
    fn after_pass(
        &self,
        _package: &PackageId,
        _pass: StagingPass,
        _staging: &Path,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Called with the fully staged tree, right before the commit rename
    fn before_commit(&self, _package: &PackageId, _staging: &Path) -> Result<(), Error> {
        Ok(())
    }
}
