//! Object identity bookkeeping for graph-preserving transformations.
//!
//! Serialization walks an object graph in which the same node may be
//! reachable through several owners. [`ObjectIdCache`] assigns each distinct
//! node a stable [`ObjectId`] keyed on its address and concrete type, so a
//! node shared between owners is emitted once and referenced everywhere
//! else. [`ObjectTable`] is the mirror image for deserialization: it maps
//! ids back to rebuilt values and tracks which ids are still being rebuilt,
//! which is how reference cycles in a document are caught.

use core::fmt;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::str::FromStr;

// -----------------------------------------------------------------------------
// ObjectId
// -----------------------------------------------------------------------------

/// Identifier of one node within a single transformation run.
///
/// Ids are only meaningful relative to the run (or document) that produced
/// them. The root object of a document always carries [`ObjectId::ORIGIN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    /// The id assigned to the first node seen, by convention the root.
    pub const ORIGIN: ObjectId = ObjectId(1);
}

impl fmt::Display for ObjectId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ObjectId {
    type Err = ReferenceError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.parse::<u64>() {
            Ok(raw) if raw > 0 => Ok(ObjectId(raw)),
            _ => Err(ReferenceError::InvalidId {
                text: text.to_string(),
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// ObjectIdCache
// -----------------------------------------------------------------------------

/// Result of interning a node in an [`ObjectIdCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interned {
    /// The id now associated with the node.
    pub id: ObjectId,
    /// `true` when this call created the association, `false` when the node
    /// had been interned before.
    pub first_seen: bool,
}

/// Assigns ids to object graph nodes by identity, not by value.
///
/// Two nodes receive the same id exactly when they are the same allocation
/// viewed as the same concrete type. Keying on the type as well as the
/// address keeps a struct apart from its own first field, which share an
/// address but are different nodes.
///
/// # Examples
///
/// ```
/// use ogx_engine::{ObjectId, ObjectIdCache};
///
/// let first = String::from("a");
/// let second = String::from("b");
///
/// let mut cache = ObjectIdCache::new();
/// assert_eq!(cache.intern(&first).id, ObjectId::ORIGIN);
/// assert!(!cache.intern(&first).first_seen);
/// assert!(cache.intern(&second).first_seen);
/// ```
#[derive(Debug, Default)]
pub struct ObjectIdCache {
    table: HashMap<(usize, TypeId), ObjectId>,
    next: u64,
}

impl ObjectIdCache {
    /// Creates an empty cache; the first interned node gets
    /// [`ObjectId::ORIGIN`].
    #[inline]
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            next: 1,
        }
    }

    /// Returns the id for `node`, assigning a fresh one on first sight.
    pub fn intern(&mut self, node: &dyn Any) -> Interned {
        let address = std::ptr::from_ref(node).cast::<()>() as usize;
        let key = (address, node.type_id());

        if let Some(&id) = self.table.get(&key) {
            return Interned {
                id,
                first_seen: false,
            };
        }

        let id = ObjectId(self.next);
        self.next += 1;
        self.table.insert(key, id);
        log::trace!("assigned id {id} to instance at {address:#x}");
        Interned {
            id,
            first_seen: true,
        }
    }

    /// Number of distinct nodes interned so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// `true` when no node has been interned yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

// -----------------------------------------------------------------------------
// ObjectTable
// -----------------------------------------------------------------------------

/// Rebuilt values indexed by id, with in-progress tracking.
///
/// Deserialization rebuilds a node's referenced objects before the node
/// itself. [`ObjectTable::begin`] marks an id as under construction and
/// [`ObjectTable::finish`] stores the completed value; a resolve hitting an
/// id that is still under construction means the document references itself
/// cyclically and cannot be rebuilt.
#[derive(Default)]
pub struct ObjectTable {
    values: HashMap<ObjectId, Rc<dyn Any>>,
    in_progress: HashSet<ObjectId>,
    consumed: HashSet<ObjectId>,
}

impl fmt::Debug for ObjectTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectTable")
            .field("finished", &self.values.len())
            .field("in_progress", &self.in_progress.len())
            .field("consumed", &self.consumed.len())
            .finish()
    }
}

impl ObjectTable {
    /// Creates an empty table.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as under construction.
    ///
    /// Rejects ids that are already being built or already finished; either
    /// would mean the same definition is processed twice. An id whose value
    /// was already [released](ObjectTable::release) cannot be rebuilt either:
    /// the value is gone into its single owner, so a second consumer holds
    /// an aliasing reference the document must not contain.
    pub fn begin(&mut self, id: ObjectId) -> Result<(), ReferenceError> {
        if self.consumed.contains(&id) {
            return Err(ReferenceError::AlreadyConsumed { id });
        }
        if self.values.contains_key(&id) || !self.in_progress.insert(id) {
            return Err(ReferenceError::DuplicateDefinition { id });
        }
        Ok(())
    }

    /// Stores the completed value for `id` and clears its in-progress mark.
    pub fn finish(&mut self, id: ObjectId, value: Rc<dyn Any>) {
        self.in_progress.remove(&id);
        self.values.insert(id, value);
    }

    /// Looks up an already finished value.
    #[inline]
    pub fn get(&self, id: ObjectId) -> Option<&Rc<dyn Any>> {
        self.values.get(&id)
    }

    /// Drops the table's handle on a finished value.
    ///
    /// Used when a resolved value is consumed by exactly one owner; the
    /// table's handle would otherwise keep the value shared and block the
    /// move into the rebuilt parent. The id is recorded as consumed, so any
    /// later reference to it fails instead of rebuilding a second copy.
    pub fn release(&mut self, id: ObjectId) -> Option<Rc<dyn Any>> {
        let value = self.values.remove(&id);
        if value.is_some() {
            self.consumed.insert(id);
        }
        value
    }

    /// `true` while `id` has been begun but not finished.
    #[inline]
    pub fn is_in_progress(&self, id: ObjectId) -> bool {
        self.in_progress.contains(&id)
    }

    /// Resolves `id` to its finished value.
    ///
    /// An id that is still under construction is reported as a cycle, an id
    /// already moved into its owner as consumed, and an id never begun as a
    /// dangling reference.
    pub fn resolve(&self, id: ObjectId) -> Result<&Rc<dyn Any>, ReferenceError> {
        if self.is_in_progress(id) {
            return Err(ReferenceError::CyclicReference { id });
        }
        if self.consumed.contains(&id) {
            return Err(ReferenceError::AlreadyConsumed { id });
        }
        self.values
            .get(&id)
            .ok_or(ReferenceError::Dangling { id })
    }
}

// -----------------------------------------------------------------------------
// ReferenceError
// -----------------------------------------------------------------------------

/// Errors raised while resolving object references.
#[derive(Debug, PartialEq, Eq)]
pub enum ReferenceError {
    /// A reference names an id that no definition provides.
    Dangling { id: ObjectId },
    /// A reference leads back to a node that is still being rebuilt.
    CyclicReference { id: ObjectId },
    /// The same id is defined more than once.
    DuplicateDefinition { id: ObjectId },
    /// A reference names an id whose value was already moved into its owner.
    AlreadyConsumed { id: ObjectId },
    /// An id attribute does not hold a positive integer.
    InvalidId { text: String },
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dangling { id } => {
                write!(f, "reference to object `{id}` has no matching definition")
            }
            Self::CyclicReference { id } => {
                write!(f, "object `{id}` is referenced while still being rebuilt")
            }
            Self::DuplicateDefinition { id } => {
                write!(f, "object `{id}` is defined more than once")
            }
            Self::AlreadyConsumed { id } => {
                write!(
                    f,
                    "object `{id}` was already moved into an owning reference"
                )
            }
            Self::InvalidId { text } => {
                write!(f, "`{text}` is not a valid object id")
            }
        }
    }
}

impl core::error::Error for ReferenceError {}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::rc::Rc;

    use super::{ObjectId, ObjectIdCache, ObjectTable, ReferenceError};

    #[test]
    fn interning_is_by_identity() {
        let a = String::from("same");
        let b = String::from("same");

        let mut cache = ObjectIdCache::new();
        let first = cache.intern(&a);
        let second = cache.intern(&b);
        assert_ne!(first.id, second.id);
        assert_eq!(cache.intern(&a).id, first.id);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn struct_and_first_field_get_distinct_ids() {
        struct Holder {
            inner: u32,
        }

        let holder = Holder { inner: 7 };
        let mut cache = ObjectIdCache::new();
        let outer = cache.intern(&holder);
        let inner = cache.intern(&holder.inner);
        assert_ne!(outer.id, inner.id);
    }

    #[test]
    fn first_node_gets_the_origin_id() {
        let node = 42_u32;
        let mut cache = ObjectIdCache::new();
        assert_eq!(cache.intern(&node).id, ObjectId::ORIGIN);
    }

    #[test]
    fn id_parsing_rejects_garbage() {
        assert_eq!("3".parse::<ObjectId>().unwrap().to_string(), "3");
        assert!("0".parse::<ObjectId>().is_err());
        assert!("-1".parse::<ObjectId>().is_err());
        assert!("x".parse::<ObjectId>().is_err());
    }

    #[test]
    fn table_resolves_finished_values() {
        let mut table = ObjectTable::new();
        table.begin(ObjectId::ORIGIN).unwrap();
        table.finish(ObjectId::ORIGIN, Rc::new(5_u32) as Rc<dyn Any>);

        let value = table.resolve(ObjectId::ORIGIN).unwrap();
        assert_eq!(value.downcast_ref::<u32>(), Some(&5));
    }

    #[test]
    fn release_leaves_the_value_solely_owned() {
        let mut table = ObjectTable::new();
        table.begin(ObjectId::ORIGIN).unwrap();

        let value = Rc::new(5_u32) as Rc<dyn Any>;
        table.finish(ObjectId::ORIGIN, value.clone());
        assert_eq!(Rc::strong_count(&value), 2);

        table.release(ObjectId::ORIGIN).unwrap();
        assert_eq!(Rc::strong_count(&value), 1);
        assert!(table.get(ObjectId::ORIGIN).is_none());
    }

    #[test]
    fn released_ids_cannot_be_rebuilt_or_resolved() {
        let mut table = ObjectTable::new();
        table.begin(ObjectId::ORIGIN).unwrap();
        table.finish(ObjectId::ORIGIN, Rc::new(5_u32) as Rc<dyn Any>);
        table.release(ObjectId::ORIGIN).unwrap();

        assert_eq!(
            table.begin(ObjectId::ORIGIN),
            Err(ReferenceError::AlreadyConsumed { id: ObjectId::ORIGIN })
        );
        assert!(matches!(
            table.resolve(ObjectId::ORIGIN),
            Err(ReferenceError::AlreadyConsumed { id: ObjectId::ORIGIN })
        ));
    }

    #[test]
    fn resolving_an_unfinished_id_is_a_cycle() {
        let mut table = ObjectTable::new();
        table.begin(ObjectId::ORIGIN).unwrap();
        assert!(matches!(
            table.resolve(ObjectId::ORIGIN),
            Err(ReferenceError::CyclicReference { id: ObjectId::ORIGIN })
        ));
    }

    #[test]
    fn resolving_an_unknown_id_is_dangling() {
        let table = ObjectTable::new();
        assert!(matches!(
            table.resolve(ObjectId::ORIGIN),
            Err(ReferenceError::Dangling { id: ObjectId::ORIGIN })
        ));
    }

    #[test]
    fn beginning_an_id_twice_is_rejected() {
        let mut table = ObjectTable::new();
        table.begin(ObjectId::ORIGIN).unwrap();
        assert_eq!(
            table.begin(ObjectId::ORIGIN),
            Err(ReferenceError::DuplicateDefinition { id: ObjectId::ORIGIN })
        );
    }
}
