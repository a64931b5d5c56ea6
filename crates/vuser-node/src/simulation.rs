//! In-process Proof-of-Proposal simulation.
//!
//! A [`Simulation`] owns every piece of ledger state (chain, proposal pool,
//! eligibility window, coalition, sidechains and wallet approvals) and drives
//! them through rounds:
//!
//! ```text
//! begin_round → submit (every eligible participant) → select_primary
//!     → [offline? fallback] → settle fees → generate → append
//!     → distribute_reward → mark_committed
//! ```
//!
//! The demos at the end exercise sidechain anchoring, fee sponsorship and
//! VEP2 wallet approvals against the same state.

use std::thread;
use std::time::Duration;

use num_bigint::BigUint;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use vuser_chain::{
    Blockchain, ChainError, EligibilityPool, LedgerConfig, LedgerEntry, Proposal, ProposalPool,
    SidechainHeader, SidechainRegistry,
};
use vuser_crypto::Hash256;
use vuser_treasury::{
    distribute_reward, process_transaction_fee, set_publisher, ApprovalRegistry, Coalition,
    FeeOutcome, RewardDistribution, TreasuryError,
};

use crate::genesis::{genesis_entry, TREASURY_ADDRESS};

/// Errors raised while driving the simulation.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// Rejected configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Ledger error.
    #[error("Ledger error: {0}")]
    Chain(#[from] ChainError),

    /// Treasury error.
    #[error("Treasury error: {0}")]
    Treasury(#[from] TreasuryError),
}

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimulationError>;

/// Knobs for a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of rounds to run.
    pub rounds: u64,
    /// Number of participating miners.
    pub participants: usize,
    /// Pause between rounds.
    pub round_delay: Duration,
    /// Chance, in percent, that the primary is treated as offline.
    pub fallback_percent: u8,
    /// Treasury balance at initialization.
    pub initial_treasury: u64,
    /// Seed for election and fallback draws. Without one, primaries are
    /// elected with a clock-seeded RNG each round.
    pub seed: Option<u64>,
    /// Economic parameters.
    pub ledger: LedgerConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rounds: 5,
            participants: 5,
            round_delay: Duration::from_millis(100),
            fallback_percent: 20,
            initial_treasury: 1_000,
            seed: None,
            ledger: LedgerConfig::default(),
        }
    }
}

impl SimulationConfig {
    fn validate(&self) -> Result<()> {
        if self.participants == 0 {
            return Err(SimulationError::InvalidConfig(
                "at least one participant is required".to_string(),
            ));
        }
        if self.fallback_percent > 100 {
            return Err(SimulationError::InvalidConfig(format!(
                "fallback probability {}% is above 100%",
                self.fallback_percent
            )));
        }
        Ok(())
    }
}

/// What happened in one round.
#[derive(Debug, Clone, Serialize)]
pub struct RoundReport {
    /// Zero-based round number.
    pub round: u64,
    /// Randomly elected primary.
    pub primary: String,
    /// Miner whose proposal became the block.
    pub active: String,
    /// Whether the primary was treated as offline.
    pub fallback_used: bool,
    /// Index of the committed block.
    pub block_index: u64,
    /// Hash of the committed block.
    pub block_hash: Hash256,
    /// Reward split for the block.
    pub reward: RewardDistribution,
}

/// Outcome of the sidechain anchoring demo.
#[derive(Debug, Clone, Serialize)]
pub struct SidechainDemoReport {
    /// Header summarizing the sidechain.
    pub header: SidechainHeader,
    /// Whether the header verified against the sidechain.
    pub verified: bool,
    /// Main-chain block the header was anchored in.
    pub anchor_block: u64,
}

/// Outcome of the coalition sponsorship demo.
#[derive(Debug, Clone, Serialize)]
pub struct CoalitionDemoReport {
    /// Fee settlement while the publisher was approved.
    pub approved: FeeOutcome,
    /// Fee settlement after the publisher was revoked.
    pub revoked: FeeOutcome,
    /// Treasury balance at the end.
    pub treasury_balance: BigUint,
}

/// Outcome of the VEP2 approval demo.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalDemoReport {
    /// Wallet that was approved.
    pub wallet: String,
    /// Token issued.
    pub token: Hash256,
    /// Whether the funded action was authorized before revocation.
    pub authorized_before_revoke: bool,
    /// Whether it was authorized after revocation.
    pub authorized_after_revoke: bool,
}

/// Owned state of a running simulation.
pub struct Simulation {
    config: SimulationConfig,
    participants: Vec<String>,
    chain: Blockchain,
    pool: ProposalPool,
    eligibility: EligibilityPool,
    coalition: Coalition,
    sidechains: SidechainRegistry,
    approvals: ApprovalRegistry,
    rng: ChaCha20Rng,
    rounds_run: u64,
}

impl Simulation {
    /// Build the genesis chain and open the treasury.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidConfig`] for a config with no
    /// participants or a fallback probability above 100%.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let chain = Blockchain::new(vec![genesis_entry()]);
        let participants: Vec<String> = (1..=config.participants)
            .map(|i| format!("Address{}", i))
            .collect();

        // Participants join by announcing themselves; with a window smaller
        // than the participant list the earliest joiners are evicted.
        let mut eligibility = EligibilityPool::new(config.ledger.eligibility_window);
        eligibility.observe_entries(&chain.genesis().entries);
        for participant in &participants {
            eligibility.observe(participant);
        }

        let mut coalition = Coalition::new();
        coalition.initialize(BigUint::from(config.initial_treasury))?;

        let rng = match config.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };

        Ok(Self {
            config,
            participants,
            chain,
            pool: ProposalPool::new(),
            eligibility,
            coalition,
            sidechains: SidechainRegistry::new(),
            approvals: ApprovalRegistry::new(),
            rng,
            rounds_run: 0,
        })
    }

    /// Run every configured round, pausing between them.
    ///
    /// # Errors
    ///
    /// Stops at the first round that fails.
    pub fn run(&mut self) -> Result<Vec<RoundReport>> {
        let mut reports = Vec::new();
        for _ in 0..self.config.rounds {
            reports.push(self.run_round()?);
            if !self.config.round_delay.is_zero() {
                thread::sleep(self.config.round_delay);
            }
        }
        Ok(reports)
    }

    /// Run a single round.
    ///
    /// # Errors
    ///
    /// Propagates election, append and reward errors.
    pub fn run_round(&mut self) -> Result<RoundReport> {
        let round = self.rounds_run;
        self.pool.begin_round();

        for participant in &self.participants {
            let claim = LedgerEntry::new(
                participant.clone(),
                TREASURY_ADDRESS,
                10u32,
                round,
                format!("Reward Claim {}", round),
            );
            match self
                .pool
                .submit_eligible(&self.eligibility, participant.clone(), vec![claim])
            {
                Ok(()) => {}
                Err(ChainError::NotEligible(miner)) => {
                    debug!(round, %miner, "Skipping miner outside the eligibility window");
                }
                Err(error) => return Err(error.into()),
            }
        }
        debug!(round, pool_size = self.pool.len(), "Proposals collected");

        let primary = match self.config.seed {
            Some(_) => self.pool.select_primary(&mut self.rng)?,
            None => self.pool.select_primary_reseeded()?,
        };

        let fallback_used = self.rng.gen_range(0..100u8) < self.config.fallback_percent;
        let active: Proposal = if fallback_used {
            warn!(round, miner = %primary.miner_address, "Primary miner offline, using fallback");
            self.pool.fallback(&primary)?
        } else {
            primary.clone()
        };

        let mut entries = active.entries;
        for entry in &mut entries {
            process_transaction_fee(entry, &mut self.coalition, &self.config.ledger.fees)?;
        }

        let candidate = self
            .chain
            .generate_next(entries, active.miner_address.clone(), Vec::new());
        let block = self.chain.append(candidate)?.clone();
        self.eligibility.observe_entries(&block.entries);

        let reward = distribute_reward(
            &mut self.coalition,
            &block.validator,
            &block.entries,
            &self.config.ledger,
        )?;
        self.pool.mark_committed()?;
        self.rounds_run += 1;

        info!(
            round,
            index = block.index,
            hash = %block.hash,
            validator = %block.validator,
            eligible = self.eligibility.len(),
            "Round committed"
        );

        Ok(RoundReport {
            round,
            primary: primary.miner_address,
            active: active.miner_address,
            fallback_used,
            block_index: block.index,
            block_hash: block.hash,
            reward,
        })
    }

    /// Batch micro-payments on a sidechain and anchor a header over it into
    /// the next main-chain block.
    ///
    /// # Errors
    ///
    /// Propagates sidechain and append errors.
    pub fn sidechain_demo(&mut self) -> Result<SidechainDemoReport> {
        let sidechain = self.sidechains.create("micro-payments", "Micro Payments")?;
        for batch in 0..3u64 {
            let entries = (0..2u64)
                .map(|n| {
                    LedgerEntry::new(
                        format!("Reader{}", n),
                        "Publisher1",
                        1u32,
                        batch * 2 + n,
                        "micro-tip",
                    )
                })
                .collect();
            sidechain.append_block(entries, "sidechain-validator");
        }

        let end = sidechain.block_count() as u64 - 1;
        let header = sidechain.generate_header(0, end)?;
        let verified = self.sidechains.verify_header(&header);
        info!(
            sidechain = %header.sidechain_id,
            range = %header.block_range,
            entries = header.entry_count,
            root = %header.merkle_root,
            verified,
            "Sidechain header generated"
        );

        let anchor_validator = self.participants[0].clone();
        let candidate = self
            .chain
            .generate_next(Vec::new(), anchor_validator, vec![header.clone()]);
        let anchor_block = self.chain.append(candidate)?.index;

        Ok(SidechainDemoReport {
            header,
            verified,
            anchor_block,
        })
    }

    /// Sponsor a fee for an approved publisher, revoke it, and show the
    /// next fee falling back to the sender.
    ///
    /// # Errors
    ///
    /// Propagates treasury errors.
    pub fn coalition_demo(&mut self) -> Result<CoalitionDemoReport> {
        let publisher = "Publisher1";
        self.coalition.approve_publisher(publisher, "Vuser News");

        let mut first = LedgerEntry::new("Reader1", publisher, 0u32, 0, "article view");
        set_publisher(&mut first, publisher, &self.coalition)?;
        let approved =
            process_transaction_fee(&mut first, &mut self.coalition, &self.config.ledger.fees)?;

        self.coalition.revoke_publisher(publisher);

        let mut second = LedgerEntry::new("Reader1", publisher, 0u32, 1, "article view");
        set_publisher(&mut second, publisher, &self.coalition)?;
        let revoked =
            process_transaction_fee(&mut second, &mut self.coalition, &self.config.ledger.fees)?;

        let treasury_balance = self.coalition.balance()?.clone();
        info!(
            sponsored = approved.is_sponsored(),
            sponsored_after_revoke = revoked.is_sponsored(),
            balance = %treasury_balance,
            "Coalition demo finished"
        );

        Ok(CoalitionDemoReport {
            approved,
            revoked,
            treasury_balance,
        })
    }

    /// Approve a wallet, authorize a funded action with its token, revoke,
    /// and show the same token being refused.
    pub fn approval_demo(&mut self) -> ApprovalDemoReport {
        let wallet = self.participants[0].clone();
        let token = self.approvals.approve(&wallet);

        let funded = LedgerEntry::new(
            wallet.clone(),
            "Service",
            0u32,
            1,
            format!("Approval:{}", token),
        );
        let presented = token.to_hex();
        let authorized_before_revoke = self.approvals.is_approved_hex(&wallet, &presented);
        info!(%wallet, entry = %funded.id(), authorized = authorized_before_revoke, "Funded action attempted");

        self.approvals.revoke(&wallet);
        let authorized_after_revoke = self.approvals.is_approved_hex(&wallet, &presented);
        info!(%wallet, authorized = authorized_after_revoke, "Funded action retried after revocation");

        ApprovalDemoReport {
            wallet,
            token,
            authorized_before_revoke,
            authorized_after_revoke,
        }
    }

    /// The main chain.
    pub fn chain(&self) -> &Blockchain {
        &self.chain
    }

    /// Coalition state.
    pub fn coalition(&self) -> &Coalition {
        &self.coalition
    }

    /// Participant addresses.
    pub fn participants(&self) -> &[String] {
        &self.participants
    }
}
