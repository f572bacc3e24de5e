// File: finger.rs
//
// The purpose of this file is to build a node's finger table once, at
// boot, from the sorted ring. The table is never mutated afterward:
// membership is static for the lifetime of the process.

use crate::hash::{modulus, Key};
use crate::ring::{Ring, RingNode};

/// One entry of a finger table: `start` is the key this entry answers
/// for, `successor` is the ring member that owns it.
#[derive(Debug, Clone)]
pub struct FingerEntry {
    pub start: Key,
    pub successor: RingNode,
}

/// An owner's routing table: M entries, entry i answers for
/// `(owner.hash + 2^i) mod 2^M`. Built once and never mutated.
pub struct FingerTable {
    pub entries: Vec<FingerEntry>,
}

impl FingerTable {
    /// Builds the finger table for `owner` given the sorted `ring` and
    /// ring width `bits`. Entry 0's successor is `owner`'s immediate
    /// successor. Small rings relative to `bits` produce duplicate
    /// successors across entries; that is expected, not an error.
    pub fn build(owner: &RingNode, ring: &Ring, bits: u32) -> FingerTable {
        let m = modulus(bits);
        let mut entries = Vec::with_capacity(bits as usize);

        for i in 0..bits {
            let offset = 1u128 << i;
            let start = (((owner.hash as u128) + offset) % m) as Key;
            let successor = ring.successor_of(start).clone();
            entries.push(FingerEntry { start, successor });
        }

        FingerTable { entries }
    }

    /// The immediate successor (entry 0's target).
    pub fn immediate_successor(&self) -> &RingNode {
        &self.entries[0].successor
    }

    /// The distinct successors named anywhere in the table, in the
    /// order their first occurrence appears. Used to dial exactly one
    /// outbound connection per distinct peer.
    pub fn distinct_successors(&self) -> Vec<&RingNode> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for entry in &self.entries {
            if seen.insert(entry.successor.id.clone()) {
                out.push(&entry.successor);
            }
        }
        out
    }
}
