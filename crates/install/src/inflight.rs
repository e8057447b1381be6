//! Per-package exclusivity and phase tracking

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use hafiz_errors::{Error, InstallError};
use hafiz_events::{AppEvent, EventEmitter, EventSender, InstallEvent};
use hafiz_types::{InstallPhase, PackageId};
use std::sync::Arc;

/// Registry of packages with an install or uninstall in flight
#[derive(Clone, Debug, Default)]
pub struct InFlight {
    phases: Arc<DashMap<PackageId, InstallPhase>>,
}

impl InFlight {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a package id for one attempt.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::AlreadyInProgress`] if the id is claimed.
    pub fn claim(
        &self,
        package: &PackageId,
        event_sender: Option<EventSender>,
    ) -> Result<InFlightGuard, Error> {
        match self.phases.entry(package.clone()) {
            Entry::Occupied(_) => Err(InstallError::AlreadyInProgress {
                package: package.to_string(),
            }
            .into()),
            Entry::Vacant(slot) => {
                slot.insert(InstallPhase::Idle);
                Ok(InFlightGuard {
                    phases: Arc::clone(&self.phases),
                    package: package.clone(),
                    phase: InstallPhase::Idle,
                    event_sender,
                })
            }
        }
    }

    /// Current phase of an in-flight attempt
    #[must_use]
    pub fn phase(&self, package: &PackageId) -> Option<InstallPhase> {
        self.phases.get(package).map(|phase| *phase)
    }

    #[must_use]
    pub fn is_busy(&self, package: &PackageId) -> bool {
        self.phases.contains_key(package)
    }

    /// Snapshot of everything in flight
    #[must_use]
    pub fn snapshot(&self) -> Vec<(PackageId, InstallPhase)> {
        let mut entries: Vec<_> = self
            .phases
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

/// Releases the claim on drop
#[derive(Debug)]
pub struct InFlightGuard {
    phases: Arc<DashMap<PackageId, InstallPhase>>,
    package: PackageId,
    phase: InstallPhase,
    event_sender: Option<EventSender>,
}

impl EventEmitter for InFlightGuard {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl InFlightGuard {
    #[must_use]
    pub fn phase(&self) -> InstallPhase {
        self.phase
    }

    /// Move the attempt to `to`, refusing transitions the machine doesn't allow
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::InvalidTransition`] for a disallowed move.
    pub fn transition(&mut self, to: InstallPhase) -> Result<(), Error> {
        let from = self.phase;
        if !from.can_transition_to(to) {
            return Err(InstallError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            }
            .into());
        }

        self.phase = to;
        self.phases.insert(self.package.clone(), to);
        tracing::debug!(package = %self.package, %from, %to, "install phase changed");
        self.emit(AppEvent::Install(InstallEvent::PhaseChanged {
            package: self.package.to_string(),
            from,
            to,
        }));
        Ok(())
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.phases.remove(&self.package);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hafiz_errors::ErrorKind;

    fn quran() -> PackageId {
        PackageId::new("quran").unwrap()
    }

    #[test]
    fn test_second_claim_is_rejected() {
        let inflight = InFlight::new();
        let guard = inflight.claim(&quran(), None).unwrap();

        let err = inflight.claim(&quran(), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyInProgress);

        let hadith = PackageId::new("hadith").unwrap();
        assert!(inflight.claim(&hadith, None).is_ok());

        drop(guard);
        assert!(!inflight.is_busy(&quran()));
        assert!(inflight.claim(&quran(), None).is_ok());
    }

    #[test]
    fn test_transitions_are_validated_and_published() {
        let (tx, mut rx) = hafiz_events::channel();
        let inflight = InFlight::new();
        let mut guard = inflight.claim(&quran(), Some(tx)).unwrap();

        guard.transition(InstallPhase::Downloading).unwrap();
        assert_eq!(inflight.phase(&quran()), Some(InstallPhase::Downloading));
        assert!(guard.transition(InstallPhase::Installed).is_err());
        assert_eq!(guard.phase(), InstallPhase::Downloading);

        match rx.try_recv().unwrap() {
            AppEvent::Install(InstallEvent::PhaseChanged { from, to, .. }) => {
                assert_eq!(from, InstallPhase::Idle);
                assert_eq!(to, InstallPhase::Downloading);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let inflight = InFlight::new();
        let _a = inflight.claim(&quran(), None).unwrap();
        let _b = inflight.claim(&PackageId::new("dua").unwrap(), None).unwrap();
        let ids: Vec<String> = inflight
            .snapshot()
            .into_iter()
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(ids, ["dua", "quran"]);
    }
}
