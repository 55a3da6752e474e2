//! Copy-on-write editing for field and method references.
//!
//! A mutator borrows one immutable reference and records tentative edits.
//! `get()` hands back the borrowed original when nothing was touched,
//! so the common "no rename applies" path allocates nothing.

use std::borrow::Cow;

use crate::descriptor::{MethodDescriptor, TypeDescriptor};
use crate::refs::{ClassRef, FieldRef, MethodRef};

pub struct FieldMutator<'a> {
    original: &'a FieldRef,
    owner: Option<ClassRef>,
    name: Option<String>,
    descriptor: Option<Option<TypeDescriptor>>,
}
impl<'a> FieldMutator<'a> {
    #[inline]
    pub fn new(original: &'a FieldRef) -> FieldMutator<'a> {
        FieldMutator {
            original,
            owner: None,
            name: None,
            descriptor: None,
        }
    }
    #[inline]
    pub fn set_owner(&mut self, owner: ClassRef) {
        self.owner = Some(owner);
    }
    #[inline]
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = Some(name.into());
    }
    #[inline]
    pub fn set_descriptor(&mut self, descriptor: Option<TypeDescriptor>) {
        self.descriptor = Some(descriptor);
    }
    #[inline]
    pub fn is_modified(&self) -> bool {
        self.owner.is_some() || self.name.is_some() || self.descriptor.is_some()
    }
    /// Returns the edited field, or the borrowed original if no setter fired.
    pub fn get(self) -> Cow<'a, FieldRef> {
        if !self.is_modified() {
            return Cow::Borrowed(self.original);
        }
        let FieldMutator { original, owner, name, descriptor } = self;
        Cow::Owned(FieldRef::new(
            owner.unwrap_or_else(|| original.owner.clone()),
            name.unwrap_or_else(|| original.name.clone()),
            descriptor.unwrap_or_else(|| original.descriptor.clone()),
        ))
    }
}

pub struct MethodMutator<'a> {
    original: &'a MethodRef,
    owner: Option<ClassRef>,
    name: Option<String>,
    descriptor: Option<MethodDescriptor>,
}
impl<'a> MethodMutator<'a> {
    #[inline]
    pub fn new(original: &'a MethodRef) -> MethodMutator<'a> {
        MethodMutator {
            original,
            owner: None,
            name: None,
            descriptor: None,
        }
    }
    #[inline]
    pub fn set_owner(&mut self, owner: ClassRef) {
        self.owner = Some(owner);
    }
    #[inline]
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = Some(name.into());
    }
    #[inline]
    pub fn set_descriptor(&mut self, descriptor: MethodDescriptor) {
        self.descriptor = Some(descriptor);
    }
    #[inline]
    pub fn is_modified(&self) -> bool {
        self.owner.is_some() || self.name.is_some() || self.descriptor.is_some()
    }
    /// Returns the edited method, or the borrowed original if no setter fired.
    pub fn get(self) -> Cow<'a, MethodRef> {
        if !self.is_modified() {
            return Cow::Borrowed(self.original);
        }
        let MethodMutator { original, owner, name, descriptor } = self;
        Cow::Owned(MethodRef::new(
            owner.unwrap_or_else(|| original.owner.clone()),
            name.unwrap_or_else(|| original.name.clone()),
            descriptor.unwrap_or_else(|| original.descriptor.clone()),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn untouched_field_is_borrowed() {
        let field = FieldRef::new(ClassRef::new("com/foo/Bar"), "value", None);
        let mutator = FieldMutator::new(&field);
        assert!(!mutator.is_modified());
        match mutator.get() {
            Cow::Borrowed(original) => assert_eq!(original, &field),
            Cow::Owned(_) => panic!("Expected the borrowed original"),
        }
    }
    #[test]
    fn edited_field_is_rebuilt() {
        let field = FieldRef::new(
            ClassRef::new("com/foo/Bar"),
            "value",
            Some("I".parse().unwrap()),
        );
        let mut mutator = FieldMutator::new(&field);
        mutator.set_name("renamed");
        assert!(mutator.is_modified());
        let edited = mutator.get().into_owned();
        assert_eq!(edited.name, "renamed");
        assert_eq!(edited.owner, field.owner);
        assert_eq!(edited.descriptor, field.descriptor);
    }
    #[test]
    fn edited_method_is_rebuilt() {
        let method = MethodRef::new(
            ClassRef::new("com/foo/Bar"),
            "run",
            "()V".parse().unwrap(),
        );
        let mut mutator = MethodMutator::new(&method);
        mutator.set_owner(ClassRef::new("com/foo/Baz"));
        let edited = mutator.get().into_owned();
        assert_eq!(edited.owner, ClassRef::new("com/foo/Baz"));
        assert_eq!(edited.name, "run");
    }
    #[test]
    fn untouched_method_is_borrowed() {
        let method = MethodRef::new(
            ClassRef::new("com/foo/Bar"),
            "run",
            "()V".parse().unwrap(),
        );
        match MethodMutator::new(&method).get() {
            Cow::Borrowed(original) => assert_eq!(original, &method),
            Cow::Owned(_) => panic!("Expected the borrowed original"),
        }
    }
}
