//! Versioned identities for storage locations within one method analysis.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::signature::JavaType;

/// One assignment-version of a storage location.
///
/// Identity is `(location, version)`; the type key only tags the identity with
/// the type it was inferred at.
#[derive(Clone, Debug)]
pub struct SsaIdent<K> {
    location: K,
    version: u32,
    type_key: Option<JavaType>,
}

impl<K> SsaIdent<K> {
    pub fn new(location: K, version: u32, type_key: Option<JavaType>) -> Self {
        Self {
            location,
            version,
            type_key,
        }
    }

    pub fn location(&self) -> &K {
        &self.location
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn type_key(&self) -> Option<&JavaType> {
        self.type_key.as_ref()
    }
}

impl<K: PartialEq> PartialEq for SsaIdent<K> {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location && self.version == other.version
    }
}

impl<K: Eq> Eq for SsaIdent<K> {}

impl<K: Hash> Hash for SsaIdent<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.location.hash(state);
        self.version.hash(state);
    }
}

impl<K: Ord> PartialOrd for SsaIdent<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> Ord for SsaIdent<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.location
            .cmp(&other.location)
            .then(self.version.cmp(&other.version))
    }
}

impl<K: fmt::Display> fmt::Display for SsaIdent<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.location, self.version)
    }
}

type TypeKeyFn<K> = Box<dyn Fn(&K) -> Option<JavaType> + Send + Sync>;

/// Hands out increasing versions per location, starting at 0.
///
/// Create one per method analysis and drop it afterwards.
pub struct SsaIdentifierFactory<K> {
    next_ident_for: HashMap<K, u32>,
    type_key_fn: Option<TypeKeyFn<K>>,
}

impl<K> Default for SsaIdentifierFactory<K> {
    fn default() -> Self {
        Self {
            next_ident_for: HashMap::new(),
            type_key_fn: None,
        }
    }
}

impl<K> fmt::Debug for SsaIdentifierFactory<K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsaIdentifierFactory")
            .field("next_ident_for", &self.next_ident_for)
            .field("type_key_fn", &self.type_key_fn.is_some())
            .finish()
    }
}

impl<K: Eq + Hash + Clone> SsaIdentifierFactory<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag every identity with the type key computed for its location.
    pub fn with_type_key(f: impl Fn(&K) -> Option<JavaType> + Send + Sync + 'static) -> Self {
        Self {
            next_ident_for: HashMap::new(),
            type_key_fn: Some(Box::new(f)),
        }
    }

    /// A fresh identity for `location`.
    pub fn ident(&mut self, location: &K) -> SsaIdent<K> {
        let counter = self.next_ident_for.entry(location.clone()).or_insert(0);
        let version = *counter;
        *counter += 1;
        let type_key = self.type_key_fn.as_ref().and_then(|f| f(location));
        SsaIdent::new(location.clone(), version, type_key)
    }

    /// Number of identities handed out for `location` so far.
    pub fn allocated(&self, location: &K) -> u32 {
        self.next_ident_for.get(location).copied().unwrap_or(0)
    }
}

/// The identity live for each location at one program point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SsaIdentifiers<K: Ord> {
    idents: BTreeMap<K, SsaIdent<K>>,
}

impl<K: Ord> Default for SsaIdentifiers<K> {
    fn default() -> Self {
        Self {
            idents: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> SsaIdentifiers<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `ident` the live identity of its location.
    pub fn set(&mut self, ident: SsaIdent<K>) {
        self.idents.insert(ident.location.clone(), ident);
    }

    pub fn get(&self, location: &K) -> Option<&SsaIdent<K>> {
        self.idents.get(location)
    }

    pub fn version_of(&self, location: &K) -> Option<u32> {
        self.get(location).map(SsaIdent::version)
    }

    /// Whether `location` holds the same version here as in `other`.
    pub fn same_version(&self, other: &SsaIdentifiers<K>, location: &K) -> bool {
        self.version_of(location) == other.version_of(location)
    }

    pub fn len(&self) -> usize {
        self.idents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SsaIdent<K>> {
        self.idents.values()
    }
}

impl<K: Ord + Clone> FromIterator<SsaIdent<K>> for SsaIdentifiers<K> {
    fn from_iter<I: IntoIterator<Item = SsaIdent<K>>>(iter: I) -> Self {
        let mut out = Self::new();
        for ident in iter {
            out.set(ident);
        }
        out
    }
}
