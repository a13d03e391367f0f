//! Elements, conditions and shared properties.

use crate::field::FieldFrame;
use crate::flags::EntityFlags;
use crate::geometry::Geometry;
use crate::{EntityId, PropertiesId};

/// Shared material/section data referenced by elements and conditions.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    id: PropertiesId,
    /// Named material values.
    pub values: FieldFrame,
}

impl Properties {
    /// Create empty properties with an Id.
    #[must_use]
    pub fn new(id: PropertiesId) -> Self {
        Self {
            id,
            values: FieldFrame::new(),
        }
    }

    /// Properties Id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> PropertiesId {
        self.id
    }
}

/// A domain (volume/area) entity.
#[derive(Debug, Clone)]
pub struct Element {
    id: EntityId,
    /// Node connectivity.
    pub geometry: Geometry,
    /// Referenced shared properties.
    pub properties: PropertiesId,
    /// Boolean state.
    pub flags: EntityFlags,
    /// Element-local state (constitutive/integration data).
    pub data: FieldFrame,
}

/// A boundary entity of lower topological dimension than the elements.
#[derive(Debug, Clone)]
pub struct Condition {
    id: EntityId,
    /// Node connectivity.
    pub geometry: Geometry,
    /// Referenced shared properties.
    pub properties: PropertiesId,
    /// Boolean state.
    pub flags: EntityFlags,
    /// Condition-local state.
    pub data: FieldFrame,
}

macro_rules! entity_impl {
    ($ty:ident) => {
        impl $ty {
            /// Create an entity from its geometry and properties reference.
            #[must_use]
            pub fn new(id: EntityId, geometry: Geometry, properties: PropertiesId) -> Self {
                Self {
                    id,
                    geometry,
                    properties,
                    flags: EntityFlags::default(),
                    data: FieldFrame::new(),
                }
            }

            /// Entity Id.
            #[inline]
            #[must_use]
            pub const fn id(&self) -> EntityId {
                self.id
            }

            /// Overwrite the entity Id.
            #[inline]
            pub fn set_id(&mut self, id: EntityId) {
                self.id = id;
            }

            /// Whether a flag is set.
            #[inline]
            #[must_use]
            pub const fn is(&self, flag: EntityFlags) -> bool {
                self.flags.contains(flag)
            }

            /// Set or clear a flag.
            #[inline]
            pub fn set_flag(&mut self, flag: EntityFlags, value: bool) {
                self.flags.set(flag, value);
            }

            /// Reset the entity-local state.
            pub fn initialize(&mut self) {
                self.data.clear();
            }

            /// Zero every local value whose slot is not already present.
            ///
            /// Used after a mesh replacement to give new entities the same
            /// value layout the old entities had, without overwriting data
            /// an interpolation pass already wrote.
            pub fn zero_missing_data(&mut self, template: &FieldFrame) {
                for (name, value) in template {
                    self.data
                        .entry(name.clone())
                        .or_insert_with(|| value.zeroed());
                }
            }
        }
    };
}

entity_impl!(Element);
entity_impl!(Condition);
