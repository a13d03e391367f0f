//! Boolean entity flags.

bitflags::bitflags! {
    /// Boolean state attached to nodes, elements and conditions.
    ///
    /// Flags are attached to entity instances; a full mesh replacement
    /// destroys them, which is why the remeshing pipeline snapshots them
    /// into a temporary sub-mesh before the replacement and restores them
    /// afterwards.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EntityFlags: u32 {
        /// Entity must not be moved or coarsened away by the remesher.
        const BLOCKED = 0b0000_0001;
        /// Entity is scheduled for removal.
        const TO_ERASE = 0b0000_0010;
        /// Node lies on a free surface.
        const FREE_SURFACE = 0b0000_0100;
        /// Node belongs to an inlet boundary.
        const INLET = 0b0000_1000;
        /// Node belongs to an outlet boundary.
        const OUTLET = 0b0001_0000;
        /// Entity belongs to a structural region.
        const STRUCTURE = 0b0010_0000;
        /// Entity lies on a domain interface.
        const INTERFACE = 0b0100_0000;
        /// Scratch marker for traversal algorithms.
        const VISITED = 0b1000_0000;
    }
}

/// Flags that survive a remeshing pass via the flag snapshot.
///
/// `TO_ERASE` and `VISITED` are transient bookkeeping and are deliberately
/// not persisted.
pub const PERSISTENT_FLAGS: &[(&str, EntityFlags)] = &[
    ("BLOCKED", EntityFlags::BLOCKED),
    ("FREE_SURFACE", EntityFlags::FREE_SURFACE),
    ("INLET", EntityFlags::INLET),
    ("OUTLET", EntityFlags::OUTLET),
    ("STRUCTURE", EntityFlags::STRUCTURE),
    ("INTERFACE", EntityFlags::INTERFACE),
];

/// Look up a persistent flag by its snapshot name.
#[must_use]
pub fn flag_by_name(name: &str) -> Option<EntityFlags> {
    PERSISTENT_FLAGS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, f)| *f)
}
