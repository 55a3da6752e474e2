//! The mapping container and the operations that derive new mappings.
//!
//! A [`FrozenMappings`] is an immutable set of class, field and method
//! renames keyed by the original side. Every operation returns a freshly
//! built container and leaves the receiver untouched, so a container can be
//! shared read-only between independent derivations without coordination.
//!
//! Both sides of an entry carry their descriptors expressed in their own
//! side's naming. The engine re-derives embedded descriptors from the class
//! table whenever a derivation could move a class name, so a rename of a
//! class is always reflected inside the descriptors that mention it.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use failure::Error;
use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::descriptor::{MethodDescriptor, TypeDescriptor};
use crate::format::SrgMappingsFormat;
use crate::mutator::{FieldMutator, MethodMutator};
use crate::refs::{split_member, ClassRef, FieldRef, MethodRef};

/// An immutable mapping from one naming scheme to another.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FrozenMappings {
    classes: IndexMap<ClassRef, ClassRef>,
    fields: IndexMap<FieldRef, FieldRef>,
    methods: IndexMap<MethodRef, MethodRef>,
}
impl FrozenMappings {
    pub fn classes<'a>(&'a self) -> impl Iterator<Item = (&'a ClassRef, &'a ClassRef)> + 'a {
        self.classes.iter()
    }
    pub fn fields<'a>(&'a self) -> impl Iterator<Item = (&'a FieldRef, &'a FieldRef)> + 'a {
        self.fields.iter()
    }
    pub fn methods<'a>(&'a self) -> impl Iterator<Item = (&'a MethodRef, &'a MethodRef)> + 'a {
        self.methods.iter()
    }
    #[inline]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
    #[inline]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
    #[inline]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.fields.is_empty() && self.methods.is_empty()
    }
    #[inline]
    pub fn get_remapped_class(&self, original: &ClassRef) -> Option<&ClassRef> {
        self.classes.get(original)
    }
    #[inline]
    pub fn get_remapped_field(&self, original: &FieldRef) -> Option<&FieldRef> {
        self.fields.get(original)
    }
    #[inline]
    pub fn get_remapped_method(&self, original: &MethodRef) -> Option<&MethodRef> {
        self.methods.get(original)
    }
    /// Renames a class through this mapping, leaving unmapped classes unchanged.
    pub fn remap_class(&self, class: &ClassRef) -> ClassRef {
        match self.classes.get(class) {
            Some(renamed) => renamed.clone(),
            None => class.clone(),
        }
    }
    /// Renames a field through this mapping. A field without its own entry
    /// still has its owner and descriptor renamed through the class table.
    pub fn remap_field(&self, field: &FieldRef) -> FieldRef {
        match self.fields.get(field) {
            Some(renamed) => renamed.clone(),
            None => remap_field_structure(field, &self.classes),
        }
    }
    /// Renames a method through this mapping. A method without its own entry
    /// still has its owner and descriptor renamed through the class table.
    pub fn remap_method(&self, method: &MethodRef) -> MethodRef {
        match self.methods.get(method) {
            Some(renamed) => renamed.clone(),
            None => remap_method_structure(method, &self.classes),
        }
    }

    /// Returns a mapping whose renamed side equals its original side,
    /// preserving which symbols exist but severing the renames.
    pub fn identity(&self) -> FrozenMappings {
        FrozenMappings {
            classes: self
                .classes
                .keys()
                .map(|original| (original.clone(), original.clone()))
                .collect(),
            fields: self
                .fields
                .keys()
                .map(|original| (original.clone(), original.clone()))
                .collect(),
            methods: self
                .methods
                .keys()
                .map(|original| (original.clone(), original.clone()))
                .collect(),
        }
    }
    /// Returns the reversed mapping, swapping the original and renamed sides.
    ///
    /// Embedded descriptors on what becomes the new original side are
    /// re-expressed through the class table; classes the table doesn't cover
    /// are left as-is. If two entries rename to the same symbol the later
    /// entry wins on the reversed side.
    pub fn inverted(&self) -> FrozenMappings {
        let classes: IndexMap<ClassRef, ClassRef> = self
            .classes
            .iter()
            .map(|(original, renamed)| (renamed.clone(), original.clone()))
            .collect();
        let mut fields = IndexMap::with_capacity(self.fields.len());
        for (original, renamed) in &self.fields {
            let mut mutator = FieldMutator::new(renamed);
            if let Some(descriptor) = original.descriptor.as_ref() {
                let remapped = Some(remap_type(descriptor, &self.classes));
                if remapped != renamed.descriptor {
                    mutator.set_descriptor(remapped);
                }
            }
            fields.insert(mutator.get().into_owned(), original.clone());
        }
        let mut methods = IndexMap::with_capacity(self.methods.len());
        for (original, renamed) in &self.methods {
            let remapped = remap_signature(&original.descriptor, &self.classes);
            let mut mutator = MethodMutator::new(renamed);
            if remapped != renamed.descriptor {
                mutator.set_descriptor(remapped);
            }
            methods.insert(mutator.get().into_owned(), original.clone());
        }
        FrozenMappings { classes, fields, methods }
    }
    /// Rewrites both sides of every entry through the given renaming
    /// functions: `input` for the original side, `output` for the renamed
    /// side. The functions receive the qualified name of each symbol
    /// (`owner/member` for members) and of every class embedded in a
    /// descriptor, so descriptors stay consistent with the class renames
    /// performed in the same pass.
    pub fn transform<I, O>(&self, mut input: I, mut output: O) -> FrozenMappings
    where
        I: FnMut(&str) -> String,
        O: FnMut(&str) -> String,
    {
        let mut result = SimpleMappings::default();
        for (original, renamed) in &self.classes {
            result.set_class_name(
                ClassRef::new(input(&original.name)),
                ClassRef::new(output(&renamed.name)),
            );
        }
        for (original, renamed) in &self.fields {
            result.set_field_name(
                transform_field(original, &mut input),
                transform_field(renamed, &mut output),
            );
        }
        for (original, renamed) in &self.methods {
            result.set_method_name(
                transform_method(original, &mut input),
                transform_method(renamed, &mut output),
            );
        }
        result.frozen()
    }
    /// Rewrites the packages of the renamed side. The function receives each
    /// package name (possibly empty) and returns the replacement, or `None`
    /// to keep the package. The original side is untouched.
    pub fn transform_packages<F>(&self, mut func: F) -> FrozenMappings
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut result = SimpleMappings::default();
        for (original, renamed) in &self.classes {
            result.set_class_name(original.clone(), relocate_class(renamed, &mut func));
        }
        for (original, renamed) in &self.fields {
            let mut mutator = FieldMutator::new(renamed);
            let owner = relocate_class(&renamed.owner, &mut func);
            if owner != renamed.owner {
                mutator.set_owner(owner);
            }
            if let Some(descriptor) = renamed.descriptor.as_ref() {
                let relocated = relocate_type(descriptor, &mut func);
                if Some(&relocated) != renamed.descriptor.as_ref() {
                    mutator.set_descriptor(Some(relocated));
                }
            }
            result.set_field_name(original.clone(), mutator.get().into_owned());
        }
        for (original, renamed) in &self.methods {
            let mut mutator = MethodMutator::new(renamed);
            let owner = relocate_class(&renamed.owner, &mut func);
            if owner != renamed.owner {
                mutator.set_owner(owner);
            }
            let relocated = renamed
                .descriptor
                .map_types(|descriptor| relocate_type(descriptor, &mut func));
            if relocated != renamed.descriptor {
                mutator.set_descriptor(relocated);
            }
            result.set_method_name(original.clone(), mutator.get().into_owned());
        }
        result.frozen()
    }
    /// Keeps only the entries whose original symbol is also an original
    /// symbol in `other`, independently for each kind.
    pub fn filter(&self, other: &FrozenMappings) -> FrozenMappings {
        FrozenMappings {
            classes: self
                .classes
                .iter()
                .filter(|&(original, _)| other.classes.contains_key(original))
                .map(|(original, renamed)| (original.clone(), renamed.clone()))
                .collect(),
            fields: self
                .fields
                .iter()
                .filter(|&(original, _)| other.fields.contains_key(original))
                .map(|(original, renamed)| (original.clone(), renamed.clone()))
                .collect(),
            methods: self
                .methods
                .iter()
                .filter(|&(original, _)| other.methods.contains_key(original))
                .map(|(original, renamed)| (original.clone(), renamed.clone()))
                .collect(),
        }
    }
    /// Composes this mapping with `other`, renaming this mapping's renamed
    /// side through it. Entries of `other` that this mapping doesn't reach
    /// are pulled back through the inverse class table and appended.
    pub fn chain(&self, other: &FrozenMappings) -> FrozenMappings {
        let inverse_classes: IndexMap<ClassRef, ClassRef> = self
            .classes
            .iter()
            .map(|(original, renamed)| (renamed.clone(), original.clone()))
            .collect();
        let mut classes = IndexMap::with_capacity(self.classes.len() + other.classes.len());
        for (original, renamed) in &self.classes {
            classes.insert(original.clone(), other.remap_class(renamed));
        }
        for (original, renamed) in &other.classes {
            if !inverse_classes.contains_key(original) {
                classes
                    .entry(original.clone())
                    .or_insert_with(|| renamed.clone());
            }
        }
        let mut fields = IndexMap::with_capacity(self.fields.len() + other.fields.len());
        for (original, renamed) in &self.fields {
            fields.insert(original.clone(), other.remap_field(renamed));
        }
        let field_targets: IndexSet<&FieldRef> = self.fields.values().collect();
        for (original, renamed) in &other.fields {
            if field_targets.contains(original) {
                continue;
            }
            let pulled = remap_field_structure(original, &inverse_classes);
            fields.entry(pulled).or_insert_with(|| renamed.clone());
        }
        let mut methods = IndexMap::with_capacity(self.methods.len() + other.methods.len());
        for (original, renamed) in &self.methods {
            methods.insert(original.clone(), other.remap_method(renamed));
        }
        let method_targets: IndexSet<&MethodRef> = self.methods.values().collect();
        for (original, renamed) in &other.methods {
            if method_targets.contains(original) {
                continue;
            }
            let pulled = remap_method_structure(original, &inverse_classes);
            methods.entry(pulled).or_insert_with(|| renamed.clone());
        }
        FrozenMappings { classes, fields, methods }
    }
    /// Clones the tables back into a builder for retain/clear style edits.
    pub fn rebuild(&self) -> SimpleMappings {
        SimpleMappings {
            classes: self.classes.clone(),
            fields: self.fields.clone(),
            methods: self.methods.clone(),
        }
    }

    /// Reads a mapping from a file in the srg format.
    pub fn load(path: &Path) -> Result<FrozenMappings, Error> {
        let mappings = SrgMappingsFormat::parse_stream(BufReader::new(File::open(path)?))?;
        debug!(
            "Loaded {} classes, {} fields and {} methods from {}",
            mappings.class_count(),
            mappings.field_count(),
            mappings.method_count(),
            path.display()
        );
        Ok(mappings)
    }
    /// Writes this mapping to a file in the srg format.
    pub fn write(&self, path: &Path) -> Result<(), Error> {
        SrgMappingsFormat::write(self, BufWriter::new(File::create(path)?))
    }
}

/// A mutable builder for [`FrozenMappings`].
#[derive(Clone, Debug, Default)]
pub struct SimpleMappings {
    classes: IndexMap<ClassRef, ClassRef>,
    fields: IndexMap<FieldRef, FieldRef>,
    methods: IndexMap<MethodRef, MethodRef>,
}
impl SimpleMappings {
    #[inline]
    pub fn set_class_name(&mut self, original: ClassRef, renamed: ClassRef) {
        self.classes.insert(original, renamed);
    }
    #[inline]
    pub fn set_field_name(&mut self, original: FieldRef, renamed: FieldRef) {
        self.fields.insert(original, renamed);
    }
    #[inline]
    pub fn set_method_name(&mut self, original: MethodRef, renamed: MethodRef) {
        self.methods.insert(original, renamed);
    }
    pub fn retain_classes<F>(&mut self, mut func: F)
    where
        F: FnMut(&ClassRef, &ClassRef) -> bool,
    {
        self.classes.retain(|original, renamed| func(original, renamed));
    }
    pub fn retain_fields<F>(&mut self, mut func: F)
    where
        F: FnMut(&FieldRef, &FieldRef) -> bool,
    {
        self.fields.retain(|original, renamed| func(original, renamed));
    }
    pub fn retain_methods<F>(&mut self, mut func: F)
    where
        F: FnMut(&MethodRef, &MethodRef) -> bool,
    {
        self.methods.retain(|original, renamed| func(original, renamed));
    }
    #[inline]
    pub fn clear_classes(&mut self) {
        self.classes.clear();
    }
    #[inline]
    pub fn clear_fields(&mut self) {
        self.fields.clear();
    }
    #[inline]
    pub fn clear_methods(&mut self) {
        self.methods.clear();
    }
    #[inline]
    pub fn frozen(self) -> FrozenMappings {
        FrozenMappings {
            classes: self.classes,
            fields: self.fields,
            methods: self.methods,
        }
    }
}

fn remap_type(
    descriptor: &TypeDescriptor,
    classes: &IndexMap<ClassRef, ClassRef>,
) -> TypeDescriptor {
    match descriptor.class_type() {
        Some(class_type) => match classes.get(class_type) {
            Some(renamed) => descriptor.with_class_type(renamed.clone()),
            // Not covered by the rename, e.g. an external library class
            None => descriptor.clone(),
        },
        None => descriptor.clone(),
    }
}
fn remap_signature(
    descriptor: &MethodDescriptor,
    classes: &IndexMap<ClassRef, ClassRef>,
) -> MethodDescriptor {
    descriptor.map_types(|descriptor| remap_type(descriptor, classes))
}
fn remap_field_structure(
    field: &FieldRef,
    classes: &IndexMap<ClassRef, ClassRef>,
) -> FieldRef {
    let mut mutator = FieldMutator::new(field);
    if let Some(owner) = classes.get(&field.owner) {
        mutator.set_owner(owner.clone());
    }
    if let Some(descriptor) = field.descriptor.as_ref() {
        let remapped = remap_type(descriptor, classes);
        if Some(&remapped) != field.descriptor.as_ref() {
            mutator.set_descriptor(Some(remapped));
        }
    }
    mutator.get().into_owned()
}
fn remap_method_structure(
    method: &MethodRef,
    classes: &IndexMap<ClassRef, ClassRef>,
) -> MethodRef {
    let mut mutator = MethodMutator::new(method);
    if let Some(owner) = classes.get(&method.owner) {
        mutator.set_owner(owner.clone());
    }
    let remapped = remap_signature(&method.descriptor, classes);
    if remapped != method.descriptor {
        mutator.set_descriptor(remapped);
    }
    mutator.get().into_owned()
}

fn transform_type<F>(descriptor: &TypeDescriptor, func: &mut F) -> TypeDescriptor
where
    F: FnMut(&str) -> String,
{
    match descriptor.class_type() {
        Some(class_type) => descriptor.with_class_type(ClassRef::new(func(&class_type.name))),
        None => descriptor.clone(),
    }
}
fn transform_field<F>(field: &FieldRef, func: &mut F) -> FieldRef
where
    F: FnMut(&str) -> String,
{
    let qualified = func(&field.qualified_name());
    let (owner, name) = split_member(&qualified)
        .unwrap_or_else(|| panic!("Member {:?} has no declaring class", qualified));
    let descriptor = field
        .descriptor
        .as_ref()
        .map(|descriptor| transform_type(descriptor, func));
    FieldRef::new(ClassRef::new(owner), name, descriptor)
}
fn transform_method<F>(method: &MethodRef, func: &mut F) -> MethodRef
where
    F: FnMut(&str) -> String,
{
    let qualified = func(&method.qualified_name());
    let descriptor = method
        .descriptor
        .map_types(|descriptor| transform_type(descriptor, func));
    let (owner, name) = split_member(&qualified)
        .unwrap_or_else(|| panic!("Member {:?} has no declaring class", qualified));
    MethodRef::new(ClassRef::new(owner), name, descriptor)
}

fn relocate_class<F>(class: &ClassRef, func: &mut F) -> ClassRef
where
    F: FnMut(&str) -> Option<String>,
{
    match func(class.package_name()) {
        Some(package) => class.with_package(&package),
        None => class.clone(),
    }
}
fn relocate_type<F>(descriptor: &TypeDescriptor, func: &mut F) -> TypeDescriptor
where
    F: FnMut(&str) -> Option<String>,
{
    match descriptor.class_type() {
        Some(class_type) => {
            let relocated = relocate_class(class_type, func);
            if relocated != *class_type {
                descriptor.with_class_type(relocated)
            } else {
                descriptor.clone()
            }
        }
        None => descriptor.clone(),
    }
}
