//! Bank Registry
//!
//! Reference-counted table of mounted banks and the event-name index built
//! from them.
//!
//! ## Invariants
//!
//! - A bank name is in the reference table iff it is mounted. Counts are
//!   always >= 1 while present.
//! - The last unmount of a bank removes every definition tagged with that
//!   bank from every variant group, and drops groups that become empty.
//! - Indexed definitions are shared immutably (`Arc`); their name and bank
//!   tag never change after indexing.

use std::collections::HashMap;
use std::sync::Arc;

use cf_core::{CfError, CfResult};

use crate::event::{EventBank, EventDefinition};

// ═══════════════════════════════════════════════════════════════════════════════
// BANK SOURCE (loader boundary)
// ═══════════════════════════════════════════════════════════════════════════════

/// Produces bank data by name
///
/// The registry never parses anything itself; a source hands it an
/// already-deserialized [`EventBank`].
pub trait BankSource: Send {
    fn load_bank(&mut self, bank_name: &str) -> CfResult<EventBank>;
}

/// Bank source backed by banks held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryBankSource {
    banks: HashMap<String, EventBank>,
}

impl MemoryBankSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bank under its own name
    pub fn with_bank(mut self, bank: EventBank) -> Self {
        self.insert(bank);
        self
    }

    /// Add or replace a bank under its own name
    pub fn insert(&mut self, bank: EventBank) {
        self.banks.insert(bank.name.clone(), bank);
    }

    pub fn contains(&self, bank_name: &str) -> bool {
        self.banks.contains_key(bank_name)
    }
}

impl BankSource for MemoryBankSource {
    fn load_bank(&mut self, bank_name: &str) -> CfResult<EventBank> {
        self.banks
            .get(bank_name)
            .cloned()
            .ok_or_else(|| CfError::BankUnavailable {
                bank: bank_name.to_string(),
                reason: "not registered with memory source".to_string(),
            })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTCOMES
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a mount request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankLoad {
    /// First reference: the bank's events were indexed
    Loaded { events: usize },
    /// Already mounted: only the reference count moved
    AlreadyMounted { ref_count: u32 },
    /// The source could not produce the bank. The reference is still
    /// recorded so a matching unmount balances it.
    Unavailable { reason: String },
}

/// Result of an unmount request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankUnload {
    /// The bank was not mounted; nothing changed
    NotMounted,
    /// References remain; nothing was purged
    Released { ref_count: u32 },
    /// Last reference dropped; this many definitions left the index
    Purged { events: usize },
}

// ═══════════════════════════════════════════════════════════════════════════════
// BANK REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Mounted banks and the name → variant-group index
#[derive(Debug, Default)]
pub struct BankRegistry {
    /// Bank name → reference count (always >= 1)
    ref_counts: HashMap<String, u32>,
    /// Event name → variants in load order
    index: HashMap<String, Vec<Arc<EventDefinition>>>,
}

impl BankRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a bank
    ///
    /// `fetch` is only called for the first reference; re-mounting an
    /// already mounted bank never re-indexes it.
    pub fn load<F>(&mut self, bank_name: &str, fetch: F) -> BankLoad
    where
        F: FnOnce(&str) -> CfResult<EventBank>,
    {
        if let Some(count) = self.ref_counts.get_mut(bank_name) {
            *count += 1;
            return BankLoad::AlreadyMounted { ref_count: *count };
        }

        self.ref_counts.insert(bank_name.to_string(), 1);

        match fetch(bank_name) {
            Ok(bank) => {
                let events = self.index_bank(bank_name, bank);
                BankLoad::Loaded { events }
            }
            Err(err) => {
                log::warn!("Failed to load audio bank '{}': {}", bank_name, err);
                BankLoad::Unavailable {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Mount a bank whose data is already at hand
    pub fn load_bank(&mut self, bank: EventBank) -> BankLoad {
        let name = bank.name.clone();
        self.load(&name, move |_| Ok(bank))
    }

    fn index_bank(&mut self, bank_name: &str, bank: EventBank) -> usize {
        let count = bank.events.len();
        for definition in bank.events {
            let definition = Arc::new(definition.tagged(bank_name));
            self.index
                .entry(definition.event_name.clone())
                .or_default()
                .push(definition);
        }
        count
    }

    /// Drop one reference to a bank, purging it on the last one
    pub fn unload(&mut self, bank_name: &str) -> BankUnload {
        let Some(count) = self.ref_counts.get_mut(bank_name) else {
            return BankUnload::NotMounted;
        };

        if *count > 1 {
            *count -= 1;
            return BankUnload::Released { ref_count: *count };
        }

        self.ref_counts.remove(bank_name);
        let events = self.purge(bank_name);
        log::info!("Unloaded audio bank '{}' ({} events)", bank_name, events);
        BankUnload::Purged { events }
    }

    fn purge(&mut self, bank_name: &str) -> usize {
        let mut removed = 0;
        self.index.retain(|_, variants| {
            let before = variants.len();
            variants.retain(|d| d.bank_name() != Some(bank_name));
            removed += before - variants.len();
            !variants.is_empty()
        });
        removed
    }

    /// Exact lookup of a variant group (empty if the name is unknown)
    pub fn variants(&self, event_name: &str) -> &[Arc<EventDefinition>] {
        self.index
            .get(event_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any mounted bank defines this exact name
    pub fn contains_event(&self, event_name: &str) -> bool {
        self.index.contains_key(event_name)
    }

    pub fn variant_count(&self, event_name: &str) -> usize {
        self.variants(event_name).len()
    }

    /// All indexed event names (unordered)
    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    pub fn event_count(&self) -> usize {
        self.index.values().map(Vec::len).sum()
    }

    pub fn is_mounted(&self, bank_name: &str) -> bool {
        self.ref_counts.contains_key(bank_name)
    }

    /// Current reference count (0 when not mounted)
    pub fn ref_count(&self, bank_name: &str) -> u32 {
        self.ref_counts.get(bank_name).copied().unwrap_or(0)
    }

    /// Mounted banks with their reference counts, sorted by name
    pub fn mounted_banks(&self) -> Vec<(&str, u32)> {
        let mut banks: Vec<_> = self
            .ref_counts
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        banks.sort_unstable_by(|a, b| a.0.cmp(b.0));
        banks
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
