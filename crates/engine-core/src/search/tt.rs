//! Transposition table.
//!
//! Direct-mapped clusters of two 16-byte entries. The main entry is kept
//! as long as it is deep and fresh; everything else spills into the
//! auxiliary entry, which is always replaceable. Mate scores are stored
//! ply-relative so a mate found at one ply reads back correctly at
//! another.

use crate::types::{Move, Value};

use super::{is_mate_value, MATE, MAX_DEPTH};

/// Entry kind bits: bit 0 marks a PV node, bits 1-2 carry the bound.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum EntryKind {
    Exact = 0b010,
    Beta = 0b100,
    Alpha = 0b110,
}

pub const KIND_PV_BIT: u8 = 0b001;
const BOUND_MASK: u8 = 0b110;

#[derive(Clone, Copy, Default)]
pub struct TableEntry {
    pub hash: u64,
    /// The best move's identity bits.
    pub mv: u16,
    pub value: i16,
    /// The move count of the game when the entry was written.
    pub age: u16,
    pub depth: u8,
    /// 0 means a never-used slot.
    pub kind: u8,
}

impl TableEntry {
    #[inline]
    pub fn is_pv_node(&self) -> bool {
        self.kind & KIND_PV_BIT != 0
    }

    #[inline]
    pub fn bound(&self) -> u8 {
        self.kind & BOUND_MASK
    }

    #[inline]
    pub fn table_move(&self) -> Move {
        Move::from_data(self.mv)
    }

    /// The stored value with mate distances shifted back to `ply`.
    pub fn value_at(&self, ply: i32) -> Value {
        let mut value = self.value as Value;
        if is_mate_value(value) {
            if value > MATE - 2 * MAX_DEPTH {
                value -= ply;
            } else if value < -MATE + 2 * MAX_DEPTH {
                value += ply;
            }
        }
        value
    }
}

#[derive(Clone, Copy, Default)]
struct Cluster {
    main: TableEntry,
    aux: TableEntry,
}

pub struct TranspositionTable {
    clusters: Vec<Cluster>,
    root_age: u16,
}

impl TranspositionTable {
    /// Default byte budget: 64 MiB.
    pub const DEFAULT_SIZE: usize = 64 * 1024 * 1024;

    pub fn new(bytes: usize) -> TranspositionTable {
        let count = (bytes / std::mem::size_of::<Cluster>()).max(1);
        log::debug!(
            "transposition table: {count} clusters, {} MiB",
            count * std::mem::size_of::<Cluster>() / (1024 * 1024)
        );
        TranspositionTable {
            clusters: vec![Cluster::default(); count],
            root_age: 0,
        }
    }

    pub fn clear(&mut self) {
        self.clusters.fill(Cluster::default());
    }

    /// Entries written at or before this age become fair game.
    pub fn set_root_age(&mut self, age: u16) {
        self.root_age = age;
    }

    #[inline]
    fn cluster_index(&self, hash: u64) -> usize {
        (hash % self.clusters.len() as u64) as usize
    }

    /// Looks the position up, main entry first.
    pub fn probe(&self, hash: u64) -> Option<&TableEntry> {
        let cluster = &self.clusters[self.cluster_index(hash)];
        if cluster.main.hash == hash {
            Some(&cluster.main)
        } else if cluster.aux.hash == hash {
            Some(&cluster.aux)
        } else {
            None
        }
    }

    /// Records a search result. The main slot is taken when it is empty,
    /// aged out, shallower, or matched in depth by an entry of at least
    /// equal PV status and a tighter bound; otherwise the auxiliary slot
    /// is overwritten unless it would duplicate the main one.
    pub fn record(
        &mut self,
        kind: u8,
        hash: u64,
        mv: u16,
        value: Value,
        age: u16,
        depth: u8,
        ply: i32,
    ) {
        let root_age = self.root_age;
        let index = self.cluster_index(hash);
        let cluster = &mut self.clusters[index];
        let main = &mut cluster.main;

        let replace_main = main.kind == 0
            || main.age <= root_age
            || depth > main.depth
            || (depth == main.depth
                && (kind & KIND_PV_BIT) >= (main.kind & KIND_PV_BIT)
                && (kind & BOUND_MASK) <= main.bound());

        if replace_main {
            // Mate scores become ply-relative on the way in.
            let mut value = value;
            if is_mate_value(value) {
                if value > MATE - 2 * MAX_DEPTH {
                    value += ply;
                } else {
                    value -= ply;
                }
            }

            *main = TableEntry {
                hash,
                mv,
                value: value as i16,
                age,
                depth,
                kind,
            };
        } else if main.hash != hash {
            cluster.aux = TableEntry {
                hash,
                mv,
                value: value as i16,
                age,
                depth,
                kind,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Square;

    fn kind(k: EntryKind, pv: bool) -> u8 {
        k as u8 | if pv { KIND_PV_BIT } else { 0 }
    }

    #[test]
    fn probe_misses_on_empty_table() {
        let tt = TranspositionTable::new(1024 * 1024);
        assert!(tt.probe(0xdeadbeef).is_none());
    }

    #[test]
    fn record_then_probe() {
        let mut tt = TranspositionTable::new(1024 * 1024);
        let mv = Move::new(Square::E2, Square::E4);
        tt.record(kind(EntryKind::Exact, true), 42, mv.data(), 123, 7, 5, 0);

        let entry = tt.probe(42).expect("entry should be found");
        assert_eq!(entry.table_move(), mv);
        assert_eq!(entry.value_at(0), 123);
        assert_eq!(entry.depth, 5);
        assert!(entry.is_pv_node());
        assert_eq!(entry.bound(), EntryKind::Exact as u8);
    }

    #[test]
    fn shallower_write_spills_to_aux() {
        let mut tt = TranspositionTable::new(1024 * 1024);
        tt.set_root_age(0);
        tt.record(kind(EntryKind::Exact, true), 100, 1, 10, 5, 9, 0);
        // A different position mapping into the same cluster would need the
        // same modulus; write the same hash shallower instead and check the
        // main entry survives.
        tt.record(kind(EntryKind::Beta, false), 100, 2, 20, 5, 3, 0);

        let entry = tt.probe(100).unwrap();
        assert_eq!(entry.depth, 9);
        assert_eq!(entry.mv, 1);
    }

    #[test]
    fn aged_entries_are_replaced() {
        let mut tt = TranspositionTable::new(1024 * 1024);
        tt.record(kind(EntryKind::Exact, true), 7, 1, 10, 3, 20, 0);
        // A new search with a later root age may take the slot even at
        // lower depth.
        tt.set_root_age(5);
        tt.record(kind(EntryKind::Beta, false), 7, 2, -5, 6, 2, 0);

        let entry = tt.probe(7).unwrap();
        assert_eq!(entry.depth, 2);
        assert_eq!(entry.mv, 2);
    }

    #[test]
    fn mate_values_shift_with_ply() {
        let mut tt = TranspositionTable::new(1024 * 1024);
        // A mate-in-3-plies score found at ply 4.
        let found = MATE - 7;
        tt.record(kind(EntryKind::Exact, true), 99, 0, found, 1, 10, 4);

        // Read back at a different ply: the distance from the new node is
        // preserved.
        let entry = tt.probe(99).unwrap();
        assert_eq!(entry.value_at(4), found);
        assert_eq!(entry.value_at(6), found - 2);
        assert_eq!(entry.value_at(2), found + 2);

        // Getting-mated scores shift the other way.
        let mut tt = TranspositionTable::new(1024 * 1024);
        let mated = -MATE + 9;
        tt.record(kind(EntryKind::Exact, true), 99, 0, mated, 1, 10, 4);
        let entry = tt.probe(99).unwrap();
        assert_eq!(entry.value_at(4), mated);
        assert_eq!(entry.value_at(7), mated + 3);
    }
}
