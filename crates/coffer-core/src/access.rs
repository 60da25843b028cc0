//! Administrator roles and the pause circuit breaker.

use crate::error::CoreError;
use crate::journal::EventJournal;
use coffer_types::{Address, Event};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Administrative identity set shared by all components.
#[derive(Debug)]
pub struct AccessControl {
    admins: RwLock<BTreeSet<Address>>,
    paused: AtomicBool,
    journal: Arc<EventJournal>,
}

impl AccessControl {
    /// Create with an initial, non-empty admin set.
    pub fn new(
        admins: impl IntoIterator<Item = Address>,
        journal: Arc<EventJournal>,
    ) -> Result<Self, CoreError> {
        let admins: BTreeSet<Address> = admins.into_iter().filter(|a| !a.is_zero()).collect();
        if admins.is_empty() {
            return Err(CoreError::InvalidConfig(
                "At least one non-zero administrator is required".to_string(),
            ));
        }

        Ok(Self {
            admins: RwLock::new(admins),
            paused: AtomicBool::new(false),
            journal,
        })
    }

    pub fn is_admin(&self, account: &Address) -> bool {
        self.admins.read().contains(account)
    }

    pub fn admins(&self) -> Vec<Address> {
        self.admins.read().iter().copied().collect()
    }

    /// Fail with `Unauthorized` unless `caller` is an administrator.
    pub fn ensure_admin(&self, caller: &Address, action: &str) -> Result<(), CoreError> {
        if self.is_admin(caller) {
            return Ok(());
        }
        tracing::warn!(caller = %caller, action, "Rejected non-admin call");
        Err(CoreError::Unauthorized {
            caller: *caller,
            action: action.to_string(),
        })
    }

    pub fn grant_admin(&self, account: Address, caller: Address) -> Result<(), CoreError> {
        self.ensure_admin(&caller, "grant admin")?;
        if account.is_zero() {
            return Err(CoreError::InvalidConfig("Zero address cannot be an administrator".into()));
        }

        if self.admins.write().insert(account) {
            self.journal.emit(Event::AdminGranted {
                account,
                granted_by: caller,
            });
        }
        Ok(())
    }

    pub fn revoke_admin(&self, account: Address, caller: Address) -> Result<(), CoreError> {
        self.ensure_admin(&caller, "revoke admin")?;

        let removed = {
            let mut admins = self.admins.write();
            if admins.len() == 1 && admins.contains(&account) {
                return Err(CoreError::LastAdmin(account));
            }
            admins.remove(&account)
        };

        if removed {
            self.journal.emit(Event::AdminRevoked {
                account,
                revoked_by: caller,
            });
        }
        Ok(())
    }

    /// Engage the circuit breaker. Idempotent.
    pub fn pause(&self, caller: Address) -> Result<(), CoreError> {
        self.ensure_admin(&caller, "pause")?;
        if !self.paused.swap(true, Ordering::SeqCst) {
            self.journal.emit(Event::Paused { by: caller });
        }
        Ok(())
    }

    pub fn unpause(&self, caller: Address) -> Result<(), CoreError> {
        self.ensure_admin(&caller, "unpause")?;
        if self.paused.swap(false, Ordering::SeqCst) {
            self.journal.emit(Event::Unpaused { by: caller });
        }
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Fail with `Paused` while the circuit breaker is engaged.
    pub fn ensure_running(&self, action: &'static str) -> Result<(), CoreError> {
        if self.is_paused() {
            return Err(CoreError::Paused { action });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use coffer_types::EventKind;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    fn setup() -> (AccessControl, Arc<EventJournal>) {
        let journal = Arc::new(EventJournal::new(Arc::new(ManualClock::new(0))));
        let access = AccessControl::new([addr(1)], journal.clone()).unwrap();
        (access, journal)
    }

    #[test]
    fn test_requires_an_admin() {
        let journal = Arc::new(EventJournal::new(Arc::new(ManualClock::new(0))));
        assert!(AccessControl::new(Vec::<Address>::new(), journal.clone()).is_err());
        assert!(AccessControl::new([Address::ZERO], journal).is_err());
    }

    #[test]
    fn test_grant_and_revoke() {
        let (access, journal) = setup();

        assert!(access.grant_admin(addr(3), addr(2)).is_err());
        access.grant_admin(addr(2), addr(1)).unwrap();
        assert!(access.is_admin(&addr(2)));

        access.revoke_admin(addr(1), addr(2)).unwrap();
        assert_eq!(access.admins(), vec![addr(2)]);
        assert_eq!(access.revoke_admin(addr(2), addr(2)), Err(CoreError::LastAdmin(addr(2))));

        assert_eq!(journal.count_of(EventKind::AdminGranted), 1);
        assert_eq!(journal.count_of(EventKind::AdminRevoked), 1);
    }

    #[test]
    fn test_pause_circuit_breaker() {
        let (access, journal) = setup();

        assert!(access.ensure_running("deposit").is_ok());
        assert!(access.pause(addr(9)).is_err());

        access.pause(addr(1)).unwrap();
        access.pause(addr(1)).unwrap();
        assert_eq!(
            access.ensure_running("deposit"),
            Err(CoreError::Paused { action: "deposit" })
        );
        assert_eq!(journal.count_of(EventKind::Paused), 1);

        access.unpause(addr(1)).unwrap();
        assert!(access.ensure_running("deposit").is_ok());
    }
}
