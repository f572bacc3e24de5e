// File: ring.rs
//
// The purpose of this file is to load the static ring manifest (the
// "dht" database of ring members) and produce a hash-sorted view of it,
// plus an index from node id to node for local self-lookup.

use crate::error::ConfigError;
use crate::hash::Key;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

/// One member of the static Chord ring, as loaded from the manifest.
/// Immutable for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RingNode {
    pub id: String,
    pub hash: Key,
    #[serde(rename = "IP")]
    pub ip: String,
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    dht: Vec<RingNode>,
}

/// The sorted ring plus an id index, loaded once at process start.
pub struct Ring {
    /// Ascending by hash; Chord routing relies on this order.
    pub nodes: Vec<RingNode>,
    by_id: HashMap<String, usize>,
}

impl Ring {
    /// Loads `path`, sorts its `dht` array by hash, and indexes by id.
    /// Fails if the file is missing, malformed, or contains a hash
    /// collision between two distinct nodes.
    pub fn load(path: &str) -> Result<Ring, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::ManifestIo {
            path: path.to_string(),
            source,
        })?;
        let manifest: Manifest =
            serde_json::from_str(&text).map_err(|source| ConfigError::ManifestJson {
                path: path.to_string(),
                source,
            })?;

        let mut nodes = manifest.dht;
        nodes.sort_by_key(|n| n.hash);

        for pair in nodes.windows(2) {
            if pair[0].hash == pair[1].hash {
                return Err(ConfigError::HashCollision {
                    hash: pair[0].hash,
                    a: pair[0].id.clone(),
                    b: pair[1].id.clone(),
                });
            }
        }

        let by_id = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();

        Ok(Ring { nodes, by_id })
    }

    /// Looks up the ring member with the given id, if present.
    pub fn find(&self, id: &str) -> Option<&RingNode> {
        self.by_id.get(id).map(|&i| &self.nodes[i])
    }

    /// The number of members in the ring.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The successor of `key`: the node with the smallest hash >= key,
    /// wrapping to the first node if none qualifies.
    pub fn successor_of(&self, key: Key) -> &RingNode {
        self.nodes
            .iter()
            .find(|n| n.hash >= key)
            .unwrap_or(&self.nodes[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_manifest(dir: &std::path::Path, body: &str) -> String {
        let path = dir.join("dht.json");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn loads_and_sorts_by_hash() {
        let dir = tempdir();
        let path = write_manifest(
            &dir,
            r#"{"dht": [
                {"id": "c", "hash": 200, "IP": "10.0.0.3", "port": 5558, "host": "h3"},
                {"id": "a", "hash": 10, "IP": "10.0.0.1", "port": 5556, "host": "h1"},
                {"id": "b", "hash": 100, "IP": "10.0.0.2", "port": 5557, "host": "h2"}
            ]}"#,
        );
        let ring = Ring::load(&path).unwrap();
        let hashes: Vec<Key> = ring.nodes.iter().map(|n| n.hash).collect();
        assert_eq!(hashes, vec![10, 100, 200]);
        assert_eq!(ring.find("b").unwrap().hash, 100);
        assert!(ring.find("nonexistent").is_none());
    }

    #[test]
    fn rejects_hash_collisions() {
        let dir = tempdir();
        let path = write_manifest(
            &dir,
            r#"{"dht": [
                {"id": "a", "hash": 10, "IP": "10.0.0.1", "port": 5556, "host": "h1"},
                {"id": "b", "hash": 10, "IP": "10.0.0.2", "port": 5557, "host": "h2"}
            ]}"#,
        );
        assert!(matches!(
            Ring::load(&path),
            Err(ConfigError::HashCollision { .. })
        ));
    }

    #[test]
    fn successor_of_wraps_at_ring_origin() {
        let dir = tempdir();
        let path = write_manifest(
            &dir,
            r#"{"dht": [
                {"id": "a", "hash": 10, "IP": "10.0.0.1", "port": 5556, "host": "h1"},
                {"id": "b", "hash": 100, "IP": "10.0.0.2", "port": 5557, "host": "h2"},
                {"id": "c", "hash": 200, "IP": "10.0.0.3", "port": 5558, "host": "h3"}
            ]}"#,
        );
        let ring = Ring::load(&path).unwrap();
        assert_eq!(ring.successor_of(150).id, "c");
        assert_eq!(ring.successor_of(250).id, "a"); // wraps
        assert_eq!(ring.successor_of(10).id, "a");
    }

    fn tempdir() -> std::path::PathBuf {
        use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, AtomicOrdering::SeqCst);
        let mut dir = std::env::temp_dir();
        dir.push(format!("chordcast-ring-test-{}-{}", std::process::id(), n));
        fs::create_dir_all(&dir).unwrap();
        dir
    }
}
