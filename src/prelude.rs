//! Everything consumers normally need, for wildcard importing.

pub use crate::descriptor::{ElementType, MalformedDescriptor, MethodDescriptor, TypeDescriptor};
pub use crate::format::{CompactSrgMappingsFormat, MappingParseError, SrgMappingsFormat};
pub use crate::mappings::{FrozenMappings, SimpleMappings};
pub use crate::mutator::{FieldMutator, MethodMutator};
pub use crate::refs::{ClassRef, FieldRef, MethodRef};
