use std::fmt;

/// Channel identifier carried by every message.
///
/// Values from [`Tag::RESERVED_BASE`] upward belong to the mesh itself
/// (broadcast and abort traffic); applications pick tags below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u32);

impl Tag {
    pub const RESERVED_BASE: u32 = u32::MAX - 15;

    pub const BROADCAST: Tag = Tag(u32::MAX);
    pub const BARRIER_ARRIVE: Tag = Tag(u32::MAX - 1);
    pub const BARRIER_RELEASE: Tag = Tag(u32::MAX - 2);
    pub const ABORT: Tag = Tag(u32::MAX - 3);

    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn is_reserved(self) -> bool {
        self.0 >= Self::RESERVED_BASE
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Tag::BROADCAST => write!(f, "tag BROADCAST"),
            Tag::BARRIER_ARRIVE => write!(f, "tag BARRIER_ARRIVE"),
            Tag::BARRIER_RELEASE => write!(f, "tag BARRIER_RELEASE"),
            Tag::ABORT => write!(f, "tag ABORT"),
            Tag(id) => write!(f, "tag {}", id),
        }
    }
}
