//! Filesystem change events and the qualifying filter

use notify::event::{EventKind, ModifyKind};
use std::fmt;
use std::ops::BitOr;
use std::path::PathBuf;

/// Bitmask of filesystem operation flags carried by one notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Op(u8);

impl Op {
    pub const NONE: Op = Op(0);
    pub const CREATE: Op = Op(1 << 0);
    pub const WRITE: Op = Op(1 << 1);
    pub const REMOVE: Op = Op(1 << 2);
    pub const RENAME: Op = Op(1 << 3);
    pub const CHMOD: Op = Op(1 << 4);

    /// The combined signal that qualifies an event for classification.
    ///
    /// Both flags must be present in a single notification. Plain writes,
    /// plain creates, renames and removals do not qualify; that suppression
    /// is what keeps the application's own remove-then-create writes from
    /// looping back as notifications, and consumers depend on it.
    pub const QUALIFYING: Op = Op(Self::CREATE.0 | Self::WRITE.0);

    /// True when every flag in `other` is also set in `self`
    pub fn contains(self, other: Op) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Op {
    type Output = Op;

    fn bitor(self, rhs: Op) -> Op {
        Op(self.0 | rhs.0)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        for (flag, name) in [
            (Op::CREATE, "create"),
            (Op::WRITE, "write"),
            (Op::REMOVE, "remove"),
            (Op::RENAME, "rename"),
            (Op::CHMOD, "chmod"),
        ] {
            if self.contains(flag) {
                names.push(name);
            }
        }
        write!(f, "{}", names.join("|"))
    }
}

/// One filesystem change notification for one path
///
/// Transient value: produced by the platform layer, consumed by the watch
/// loop, and discarded.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub ops: Op,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, ops: Op) -> Self {
        Self {
            path: path.into(),
            ops,
        }
    }

    /// Whether this event carries the combined write+create signal
    pub fn qualifies(&self) -> bool {
        self.ops.contains(Op::QUALIFYING)
    }

    /// Split a raw `notify` event into one `ChangeEvent` per affected path
    pub fn from_notify(event: &notify::Event) -> Vec<ChangeEvent> {
        let ops = op_from_kind(&event.kind);
        event
            .paths
            .iter()
            .map(|path| ChangeEvent::new(path.clone(), ops))
            .collect()
    }
}

/// Map a `notify` event kind onto the operation bitmask
fn op_from_kind(kind: &EventKind) -> Op {
    match kind {
        EventKind::Create(_) => Op::CREATE,
        EventKind::Modify(ModifyKind::Name(_)) => Op::RENAME,
        EventKind::Modify(ModifyKind::Metadata(_)) => Op::CHMOD,
        EventKind::Modify(_) => Op::WRITE,
        EventKind::Remove(_) => Op::REMOVE,
        _ => Op::NONE,
    }
}
