//! Wiring for a complete treasury.

use crate::coordinator::ExecutionCoordinator;
use crate::error::ExecutionError;
use coffer_core::{AccessControl, Clock, CofferConfig, EventJournal, MembershipGate};
use coffer_governance::{GovernanceEngine, GovernanceParams};
use coffer_ledger::{TreasuryLedger, ValueTransfer};
use coffer_types::Address;
use std::path::Path;
use std::sync::Arc;

/// Seed for the coordinator identity when the configuration names none.
pub const COORDINATOR_SEED: &[u8] = b"coffer/execution-coordinator";

/// A ledger, a governance engine and the coordinator between them, sharing
/// one journal, clock and administrator set.
#[derive(Debug)]
pub struct Coffer {
    config: CofferConfig,
    journal: Arc<EventJournal>,
    access: Arc<AccessControl>,
    ledger: Arc<TreasuryLedger>,
    governance: Arc<GovernanceEngine>,
    coordinator: Arc<ExecutionCoordinator>,
}

impl Coffer {
    /// Build every component from `config` and register the coordinator as
    /// executor on both the ledger and the engine.
    pub fn new(
        config: CofferConfig,
        gate: Arc<dyn MembershipGate>,
        transfer: Arc<dyn ValueTransfer>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ExecutionError> {
        config
            .validate()
            .map_err(|e| ExecutionError::InvalidConfig(e.to_string()))?;

        let journal = Arc::new(EventJournal::new(clock.clone()));
        let access = Arc::new(AccessControl::new(config.admins.iter().copied(), journal.clone())?);
        let admin = access
            .admins()
            .first()
            .copied()
            .ok_or_else(|| ExecutionError::InvalidConfig("No administrator".into()))?;

        let ledger = Arc::new(TreasuryLedger::new(
            access.clone(),
            gate.clone(),
            transfer,
            journal.clone(),
        ));
        let governance = Arc::new(GovernanceEngine::new(
            GovernanceParams::from(&config.governance),
            access.clone(),
            gate,
            clock.clone(),
            journal.clone(),
        )?);

        let address = config
            .treasury
            .executor
            .unwrap_or_else(|| Address::derive(COORDINATOR_SEED));
        let coordinator = Arc::new(ExecutionCoordinator::new(
            address,
            ledger.clone(),
            governance.clone(),
            access.clone(),
            clock,
            journal.clone(),
        ));

        ledger.set_executor(address, admin)?;
        governance.set_executor(address, admin)?;

        tracing::info!(
            coordinator = %address,
            admins = config.admins.len(),
            quorum_bps = config.governance.quorum_bps,
            voting_duration_secs = config.governance.voting_duration_secs,
            "Coffer initialized"
        );

        Ok(Self {
            config,
            journal,
            access,
            ledger,
            governance,
            coordinator,
        })
    }

    /// Load a TOML configuration file and build from it.
    pub fn from_config_file(
        path: &Path,
        gate: Arc<dyn MembershipGate>,
        transfer: Arc<dyn ValueTransfer>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let config = CofferConfig::from_file(path)?;
        Ok(Self::new(config, gate, transfer, clock)?)
    }

    pub fn config(&self) -> &CofferConfig {
        &self.config
    }

    pub fn journal(&self) -> &Arc<EventJournal> {
        &self.journal
    }

    pub fn access(&self) -> &Arc<AccessControl> {
        &self.access
    }

    pub fn ledger(&self) -> &Arc<TreasuryLedger> {
        &self.ledger
    }

    pub fn governance(&self) -> &Arc<GovernanceEngine> {
        &self.governance
    }

    pub fn coordinator(&self) -> &Arc<ExecutionCoordinator> {
        &self.coordinator
    }
}
