//! Proof-of-Proposal leader election.
//!
//! Each round, miners submit [`Proposal`]s into a [`ProposalPool`]. A
//! primary is chosen uniformly at random; if the driver treats the primary
//! as unavailable it asks for the deterministic fallback, which is simply the
//! next proposal in submission order (wrapping around).
//!
//! ## Round Phases
//!
//! ```text
//! Empty ──submit──▶ Collecting ──select_primary──▶ Elected ──mark_committed──▶ Committed
//!   ▲                                                                              │
//!   └───────────────────────────────── begin_round ◀───────────────────────────────┘
//! ```
//!
//! ## Randomness
//!
//! Primary selection takes the RNG as a parameter. Production callers use
//! [`ProposalPool::select_primary_reseeded`], which seeds a fresh ChaCha20
//! RNG from the clock on every call; tests pass a seeded RNG and get exact
//! outcomes. Selection is therefore not reproducible across observers and is
//! not a substitute for agreement between nodes. Fallback is reproducible by
//! anyone holding the same pool snapshot.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DEFAULT_ELIGIBILITY_WINDOW;
use crate::entry::LedgerEntry;
use crate::{ChainError, Result};

/// A miner's candidate entry set for the current round.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Proposal {
    /// Address of the submitting miner.
    pub miner_address: String,
    /// Entries the miner proposes to commit.
    pub entries: Vec<LedgerEntry>,
}

impl Proposal {
    /// Create a proposal.
    pub fn new(miner_address: impl Into<String>, entries: Vec<LedgerEntry>) -> Self {
        Self {
            miner_address: miner_address.into(),
            entries,
        }
    }
}

/// Where a round currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RoundPhase {
    /// No proposals yet.
    #[default]
    Empty,
    /// Proposals are being submitted.
    Collecting,
    /// A primary has been elected.
    Elected,
    /// The round's block was committed.
    Committed,
}

impl std::fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundPhase::Empty => write!(f, "empty"),
            RoundPhase::Collecting => write!(f, "collecting"),
            RoundPhase::Elected => write!(f, "elected"),
            RoundPhase::Committed => write!(f, "committed"),
        }
    }
}

// ============================================================================
// Proposal Pool
// ============================================================================

/// Proposals submitted for the current round, in submission order.
#[derive(Debug, Default, Clone)]
pub struct ProposalPool {
    proposals: Vec<Proposal>,
    phase: RoundPhase,
    round: u64,
}

impl ProposalPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new round: drop all proposals and return to `Empty`.
    pub fn begin_round(&mut self) {
        self.proposals.clear();
        self.phase = RoundPhase::Empty;
        self.round += 1;
        debug!(round = self.round, "Proposal pool reset");
    }

    /// Add a proposal. Entries are not validated here; they are checked when
    /// the winning proposal becomes a block and is appended.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::RoundPhase`] once a primary has been elected.
    pub fn submit(
        &mut self,
        miner_address: impl Into<String>,
        entries: Vec<LedgerEntry>,
    ) -> Result<()> {
        if !matches!(self.phase, RoundPhase::Empty | RoundPhase::Collecting) {
            return Err(ChainError::RoundPhase {
                expected: RoundPhase::Collecting,
                actual: self.phase,
            });
        }
        let proposal = Proposal::new(miner_address, entries);
        debug!(
            round = self.round,
            miner = %proposal.miner_address,
            entries = proposal.entries.len(),
            "Proposal submitted"
        );
        self.proposals.push(proposal);
        self.phase = RoundPhase::Collecting;
        Ok(())
    }

    /// Add a proposal only if the miner is inside the eligibility window.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::NotEligible`] if the miner has not sent an entry
    /// recently enough, and the same errors as [`ProposalPool::submit`].
    pub fn submit_eligible(
        &mut self,
        eligibility: &EligibilityPool,
        miner_address: impl Into<String>,
        entries: Vec<LedgerEntry>,
    ) -> Result<()> {
        let miner_address = miner_address.into();
        if !eligibility.is_eligible(&miner_address) {
            return Err(ChainError::NotEligible(miner_address));
        }
        self.submit(miner_address, entries)
    }

    /// Pick the primary proposer uniformly at random using `rng`.
    ///
    /// Drawing again while `Elected` replaces the previous pick.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::EmptyPool`] if no proposals were submitted and
    /// [`ChainError::RoundPhase`] once the round is committed.
    pub fn select_primary<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Proposal> {
        if self.phase == RoundPhase::Committed {
            return Err(ChainError::RoundPhase {
                expected: RoundPhase::Collecting,
                actual: self.phase,
            });
        }
        if self.proposals.is_empty() {
            return Err(ChainError::EmptyPool);
        }

        let winner = self.proposals[rng.gen_range(0..self.proposals.len())].clone();
        self.phase = RoundPhase::Elected;
        info!(
            round = self.round,
            miner = %winner.miner_address,
            pool_size = self.proposals.len(),
            "Primary proposer elected"
        );
        Ok(winner)
    }

    /// Pick the primary with an RNG freshly seeded from the clock.
    ///
    /// # Errors
    ///
    /// Same as [`ProposalPool::select_primary`].
    pub fn select_primary_reseeded(&mut self) -> Result<Proposal> {
        let mut rng = ChaCha20Rng::seed_from_u64(clock_seed());
        self.select_primary(&mut rng)
    }

    /// The proposal after `primary` in submission order, wrapping to the
    /// first. If `primary` is not in the pool, the first proposal is returned.
    ///
    /// Matching is by miner address; with duplicate submissions from one
    /// miner, the first occurrence counts.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::EmptyPool`] if no proposals were submitted.
    pub fn fallback(&self, primary: &Proposal) -> Result<Proposal> {
        if self.proposals.is_empty() {
            return Err(ChainError::EmptyPool);
        }

        let next = match self
            .proposals
            .iter()
            .position(|p| p.miner_address == primary.miner_address)
        {
            Some(position) => (position + 1) % self.proposals.len(),
            None => 0,
        };

        let chosen = self.proposals[next].clone();
        info!(
            round = self.round,
            primary = %primary.miner_address,
            fallback = %chosen.miner_address,
            "Fallback proposer selected"
        );
        Ok(chosen)
    }

    /// Record that the elected proposal's block was committed.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::RoundPhase`] unless the pool is `Elected`.
    pub fn mark_committed(&mut self) -> Result<()> {
        if self.phase != RoundPhase::Elected {
            return Err(ChainError::RoundPhase {
                expected: RoundPhase::Elected,
                actual: self.phase,
            });
        }
        self.phase = RoundPhase::Committed;
        Ok(())
    }

    /// Current round phase.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Number of rounds started.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Proposals in submission order.
    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    /// Number of proposals.
    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }
}

fn clock_seed() -> u64 {
    let now = chrono::Utc::now();
    let nanos = now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp_micros());
    nanos as u64
}

// ============================================================================
// Eligibility (Proof-of-Participation window)
// ============================================================================

/// The most recent unique entry senders, oldest first.
///
/// Re-observing an address moves it to the most recent position. When the
/// window is full the oldest address is evicted.
#[derive(Debug, Clone)]
pub struct EligibilityPool {
    recent: VecDeque<String>,
    capacity: usize,
}

impl Default for EligibilityPool {
    fn default() -> Self {
        Self::new(DEFAULT_ELIGIBILITY_WINDOW)
    }
}

impl EligibilityPool {
    /// Create a window holding at most `capacity` addresses.
    pub fn new(capacity: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record that `address` sent an entry.
    pub fn observe(&mut self, address: &str) {
        if let Some(position) = self.recent.iter().position(|a| a == address) {
            self.recent.remove(position);
        }
        self.recent.push_back(address.to_string());
        while self.recent.len() > self.capacity {
            self.recent.pop_front();
        }
    }

    /// Record every sender in `entries`.
    pub fn observe_entries<'a>(&mut self, entries: impl IntoIterator<Item = &'a LedgerEntry>) {
        for entry in entries {
            self.observe(entry.sender());
        }
    }

    /// Whether `address` is inside the window.
    pub fn is_eligible(&self, address: &str) -> bool {
        self.recent.iter().any(|a| a == address)
    }

    /// Eligible addresses, oldest first.
    pub fn eligible(&self) -> impl Iterator<Item = &str> {
        self.recent.iter().map(String::as_str)
    }

    /// Number of eligible addresses.
    pub fn len(&self) -> usize {
        self.recent.len()
    }

    /// Whether nobody is eligible.
    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}
