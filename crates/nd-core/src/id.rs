use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for entity IDs: fast comparisons, low memory.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// An opaque, interned identifier for nodes, groups, connections, ports and
/// elements. Internally a `Spur` index: 4 bytes, Copy, Eq, Hash in O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(Spur);

impl Id {
    /// Intern a string as an Id, or return the existing one.
    pub fn intern(s: &str) -> Self {
        Id(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &'static str {
        INTERNER.resolve(&self.0)
    }

    /// Port identity is derived, never random: `{nodeId}-{portName}`.
    ///
    /// Import and paste rely on being able to strip the node prefix back off
    /// (see [`Id::port_name`]), so every port id must be built through here.
    pub fn port(node: Id, name: &str) -> Self {
        Self::intern(&format!("{}-{name}", node.as_str()))
    }

    /// Element identity: `{nodeId}-e{seq}` with `seq` drawn from the scene's
    /// monotonic element counter.
    pub fn element(node: Id, seq: u64) -> Self {
        Self::intern(&format!("{}-e{seq}", node.as_str()))
    }

    /// Recover the port name from a port id owned by `node`.
    /// Returns `None` if the id was not derived from that node.
    pub fn port_name(self, node: Id) -> Option<&'static str> {
        self.as_str()
            .strip_prefix(node.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.as_str())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Id::intern(&s))
    }
}

// ─── Generators ──────────────────────────────────────────────────────────

/// Source of fresh entity identities.
///
/// Everything that mints node, group or connection ids goes through this
/// trait so tests can swap in [`SequentialIds`] and get stable output.
pub trait IdGenerator {
    fn next_id(&mut self) -> Id;
}

/// Random identities (UUID v4, simple form).
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> Id {
        let uuid = uuid::Uuid::new_v4();
        Id::intern(&uuid.simple().to_string())
    }
}

/// Deterministic identities `{prefix}{n}` counting up from 1.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> Id {
        let n = self.next;
        self.next += 1;
        Id::intern(&format!("{}{n}", self.prefix))
    }
}
