use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Every node name the process has seen, shared across threads.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Monotonic counter shared by every fresh ID, regardless of prefix.
static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Handle to a node name held in `INTERNER`.
///
/// Two handles compare equal exactly when their names do. Serialized as the
/// plain name.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

impl NodeId {
    /// Handle for `s`; repeated calls with the same name yield the same handle.
    pub fn intern(s: &str) -> Self {
        NodeId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Generate a process-unique ID with a kind prefix (e.g. `container_3`).
    ///
    /// Candidates that were already interned (hand-built documents, bridge
    /// input) are skipped, so a fresh ID never aliases one seen before.
    pub fn with_prefix(prefix: &str) -> Self {
        loop {
            let n = COUNTER.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("{prefix}_{n}");
            if INTERNER.get(&candidate).is_none() {
                return Self::intern(&candidate);
            }
        }
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeId").field(&self.as_str()).finish()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.as_str())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = NodeId::intern("hero_frame");
        let b = NodeId::intern("hero_frame");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "hero_frame");
    }

    #[test]
    fn display_marks_ids_and_debug_names_the_type() {
        let id = NodeId::intern("nav_bar");
        assert_eq!(id.to_string(), "@nav_bar");
        assert_eq!(format!("{id:?}"), "NodeId(\"nav_bar\")");
    }

    #[test]
    fn prefixed_ids_are_unique() {
        let a = NodeId::with_prefix("button");
        let b = NodeId::with_prefix("button");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("button_"));
    }

    #[test]
    fn prefixed_ids_skip_taken_names() {
        // Reserve the next few candidates by hand; none of them may be handed out.
        let next = COUNTER.load(Ordering::Relaxed);
        let taken: Vec<NodeId> = (next..next + 4)
            .map(|n| NodeId::intern(&format!("chart_{n}")))
            .collect();
        let fresh = NodeId::with_prefix("chart");
        assert!(!taken.contains(&fresh));
    }
}
