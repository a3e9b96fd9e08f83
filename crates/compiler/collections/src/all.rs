use std::hash::BuildHasherDefault;

use wyhash::WyHash;

pub type BuildHasher = BuildHasherDefault<WyHash>;

// Versions of HashMap and HashSet
// which use the WyHash hasher instead of the default SipHash hasher.
pub type MutMap<K, V> = std::collections::HashMap<K, V, BuildHasher>;

pub type MutSet<K> = std::collections::HashSet<K, BuildHasher>;

/// Persistent maps, used for lexical scopes that are cloned at every binder.
pub type ImMap<K, V> = im_rc::hashmap::HashMap<K, V, BuildHasher>;
