// File: router.rs
//
// The purpose of this file is to decide, from the local node's
// perspective, who owns a given key: the local node, or which finger
// successor to forward to. It also owns the persistent outbound DEALER
// connection to each distinct finger successor.

use crate::finger::FingerTable;
use crate::hash::{in_range, Key};
use crate::ring::RingNode;
use std::collections::HashMap;

/// The outcome of resolving a key against the local node's view of the
/// ring: either this node owns it, or it should be forwarded on.
pub enum Resolution<'a> {
    Local,
    Forward(&'a RingNode),
}

/// Decides ownership of keys and holds the persistent outbound sockets
/// to each distinct finger successor. The finger table is immutable
/// after construction; this struct never re-resolves it.
pub struct ChordRouter {
    pub owner: RingNode,
    pub table: FingerTable,
    pub bits: u32,
    dealers: HashMap<String, zmq::Socket>,
}

impl ChordRouter {
    pub fn new(owner: RingNode, table: FingerTable, bits: u32) -> ChordRouter {
        ChordRouter {
            owner,
            table,
            bits,
            dealers: HashMap::new(),
        }
    }

    /// Dials one outbound DEALER connection per distinct finger
    /// successor (deduplicated by id), tagged with `identity` so the
    /// peer's ROUTER can address replies back to us. A no-op for
    /// successors equal to the owner (ring of one, or a successor that
    /// happens to be self).
    pub fn connect_dealers(&mut self, ctx: &zmq::Context, identity: &str) -> Result<(), zmq::Error> {
        for successor in self.table.distinct_successors() {
            if successor.id == self.owner.id {
                continue;
            }
            if self.dealers.contains_key(&successor.id) {
                continue;
            }
            let socket = ctx.socket(zmq::DEALER)?;
            socket.set_identity(identity.as_bytes())?;
            let conn_str = format!("tcp://{}:{}", successor.ip, successor.port);
            socket.connect(&conn_str)?;
            self.dealers.insert(successor.id.clone(), socket);
        }
        Ok(())
    }

    /// The outbound socket to `id`, if a dealer was dialed for it.
    pub fn dealer_for(&self, id: &str) -> Option<&zmq::Socket> {
        self.dealers.get(id)
    }

    /// All dealer sockets, for registering with a poller.
    pub fn dealers(&self) -> impl Iterator<Item = (&String, &zmq::Socket)> {
        self.dealers.iter()
    }

    /// Resolves `key` against the local node's finger table, per §4.4:
    /// exact match or ring-of-one resolves locally; a key in
    /// `(owner, successor]` forwards to the immediate successor;
    /// otherwise the closest preceding finger is used. `Resolution::Local`
    /// is reserved for true ownership — callers must be able to trust it
    /// without re-deriving anything, so the closest-preceding-finger
    /// fallback (§9: no finger qualifies) resolves here to
    /// `Forward(finger[0].successor)` rather than leaking back as
    /// `Local` for the caller to reinterpret.
    pub fn find_successor(&self, key: Key) -> Resolution<'_> {
        if key == self.owner.hash {
            return Resolution::Local;
        }

        let immediate = self.table.immediate_successor();
        if immediate.id == self.owner.id {
            // ring of one
            return Resolution::Local;
        }

        if in_range(key, self.owner.hash, immediate.hash, true) {
            return Resolution::Forward(immediate);
        }

        match self.closest_preceding_finger(key) {
            Some(node) => Resolution::Forward(node),
            None => Resolution::Forward(immediate),
        }
    }

    /// Scans the finger table from the far end down to entry 0,
    /// returning the first successor strictly between `owner` and
    /// `key` in ring order. Per §4.4/§9, when none qualifies
    /// `find_successor` forwards to entry 0's successor itself rather
    /// than treating this as ownership.
    fn closest_preceding_finger(&self, key: Key) -> Option<&RingNode> {
        for entry in self.table.entries.iter().rev() {
            if in_range(entry.successor.hash, self.owner.hash, key, false) {
                return Some(&entry.successor);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::Ring;
    use std::fs;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn ring_of(hashes: &[(&str, u64)]) -> Ring {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let mut dir = std::env::temp_dir();
        dir.push(format!("chordcast-router-test-{}-{}", std::process::id(), n));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dht.json");
        let entries: Vec<String> = hashes
            .iter()
            .map(|(id, hash)| {
                format!(
                    r#"{{"id": "{}", "hash": {}, "IP": "10.0.0.1", "port": 5555, "host": "h"}}"#,
                    id, hash
                )
            })
            .collect();
        fs::write(&path, format!(r#"{{"dht": [{}]}}"#, entries.join(","))).unwrap();
        Ring::load(path.to_str().unwrap()).unwrap()
    }

    fn router_for(ring: &Ring, id: &str, bits: u32) -> ChordRouter {
        let owner = ring.find(id).unwrap().clone();
        let table = FingerTable::build(&owner, ring, bits);
        ChordRouter::new(owner, table, bits)
    }

    #[test]
    fn ring_of_one_resolves_locally() {
        let ring = ring_of(&[("a", 42)]);
        let router = router_for(&ring, "a", 8);
        assert!(matches!(
            router.find_successor(crate::hash::hash(8, "PUBLISHER")),
            Resolution::Local
        ));
    }

    #[test]
    fn exact_key_match_resolves_locally() {
        let ring = ring_of(&[("a", 10), ("b", 100), ("c", 200)]);
        let router = router_for(&ring, "b", 8);
        assert!(matches!(router.find_successor(100), Resolution::Local));
    }

    #[test]
    fn key_in_range_forwards_to_immediate_successor() {
        let ring = ring_of(&[("a", 10), ("b", 100), ("c", 200)]);
        let router = router_for(&ring, "a", 8);
        match router.find_successor(50) {
            Resolution::Forward(node) => assert_eq!(node.id, "b"),
            Resolution::Local => panic!("expected forward"),
        }
    }

    #[test]
    fn owner_at_200_routes_150_via_closest_preceding_finger() {
        // seed scenario 2: ring {10, 100, 200}; K=150 owned by 200.
        // starting from node 10, resolution should head toward 200
        // without landing locally at 10.
        let ring = ring_of(&[("a", 10), ("b", 100), ("c", 200)]);
        let router = router_for(&ring, "a", 8);
        match router.find_successor(150) {
            Resolution::Forward(node) => assert_ne!(node.id, "a"),
            Resolution::Local => panic!("node a does not own key 150"),
        }
    }

    #[test]
    fn routing_converges_within_log_n_plus_one_hops() {
        let ring = ring_of(&[("a", 10), ("b", 100), ("c", 200)]);
        let key = 150u64;
        let max_hops = (3f64.log2().ceil() as usize) + 1;

        let mut current = "a".to_string();
        let mut hops = 0;
        loop {
            let router = router_for(&ring, &current, 8);
            match router.find_successor(key) {
                Resolution::Local => break,
                Resolution::Forward(node) => {
                    assert_ne!(node.id, current, "must make forward progress");
                    current = node.id.clone();
                }
            }
            hops += 1;
            assert!(hops <= max_hops, "exceeded convergence bound");
        }
        assert_eq!(current, "c");
    }
}
