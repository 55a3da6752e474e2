//! A library for working with symbol mappings between two naming schemes of
//! compiled code, like the obfuscation mappings minecraft tooling trades in.
//!
//! A mapping renames classes, fields and methods. Mappings are immutable
//! once frozen: the engine operations derive new mappings instead of
//! editing in place, which keeps a mapping safe to share between
//! independent derivations.
//! - [`FrozenMappings::inverted`] swaps the two naming schemes.
//! - [`FrozenMappings::identity`] keeps the symbols but severs the renames.
//! - [`FrozenMappings::transform`] rewrites both sides through caller
//!   supplied renaming functions.
//! - [`FrozenMappings::filter`] restricts a mapping to the symbols another
//!   mapping also renames.
//! - [`FrozenMappings::chain`] composes two mappings end to end.
//!
//! Every derivation keeps the class references embedded in field and method
//! descriptors consistent with the class table, so renaming a class renames
//! it everywhere it is mentioned.
extern crate failure;
extern crate failure_derive;
extern crate indexmap;
extern crate itertools;
extern crate log;
extern crate serde;
#[cfg(test)]
extern crate serde_json;

mod descriptor;
mod mappings;
mod mutator;
mod refs;

pub mod format;
pub mod prelude;

pub use self::descriptor::{ElementType, MalformedDescriptor, MethodDescriptor, TypeDescriptor};
pub use self::mappings::{FrozenMappings, SimpleMappings};
pub use self::mutator::{FieldMutator, MethodMutator};
pub use self::refs::{ClassRef, FieldRef, MethodRef};
