use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};

use crate::descriptor::{MethodDescriptor, TypeDescriptor};

/// A fully qualified, slash separated class name like `java/lang/String`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ClassRef {
    pub name: String,
}
impl ClassRef {
    pub fn new<S: Into<String>>(name: S) -> ClassRef {
        let name = name.into();
        assert!(!name.is_empty(), "Class name must not be empty");
        ClassRef { name }
    }
    pub fn simple_name(&self) -> &str {
        match self.name.rfind('/') {
            Some(index) => &self.name[index + 1..],
            None => &self.name,
        }
    }
    pub fn package_name(&self) -> &str {
        match self.name.rfind('/') {
            Some(index) => &self.name[..index],
            None => "",
        }
    }
    /// Returns the same simple name relocated into `package`,
    /// which may be empty for the default package.
    pub fn with_package(&self, package: &str) -> ClassRef {
        if package.is_empty() {
            ClassRef::new(self.simple_name())
        } else {
            ClassRef::new(format!("{}/{}", package, self.simple_name()))
        }
    }
}
impl Display for ClassRef {
    #[inline]
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.name)
    }
}
impl Serialize for ClassRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.name)
    }
}
impl<'de> Deserialize<'de> for ClassRef {
    fn deserialize<D>(deserializer: D) -> Result<ClassRef, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ClassRefVisitor;
        impl<'de> Visitor<'de> for ClassRefVisitor {
            type Value = ClassRef;

            fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
                formatter.write_str("a qualified class name")
            }

            fn visit_str<E>(self, value: &str) -> Result<ClassRef, E>
            where
                E: de::Error,
            {
                if value.is_empty() {
                    return Err(E::custom("empty class name"));
                }
                Ok(ClassRef::new(value))
            }
        }
        deserializer.deserialize_str(ClassRefVisitor)
    }
}

/// A field, identified by its declaring class and simple name.
///
/// The type descriptor is carried along when known (extended mapping
/// formats include it) but is not part of the field's identity,
/// since fields can't be overloaded by type.
#[derive(Clone, Debug)]
pub struct FieldRef {
    pub owner: ClassRef,
    pub name: String,
    pub descriptor: Option<TypeDescriptor>,
}
impl FieldRef {
    pub fn new<S: Into<String>>(
        owner: ClassRef,
        name: S,
        descriptor: Option<TypeDescriptor>,
    ) -> FieldRef {
        let name = name.into();
        assert!(!name.is_empty(), "Field name must not be empty");
        FieldRef { owner, name, descriptor }
    }
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.owner.name, self.name)
    }
}
impl PartialEq for FieldRef {
    fn eq(&self, other: &FieldRef) -> bool {
        self.owner == other.owner && self.name == other.name
    }
}
impl Eq for FieldRef {}
impl Hash for FieldRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.name.hash(state);
    }
}
impl Display for FieldRef {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A method, identified by its declaring class, simple name and descriptor.
/// Overloads sharing a name are distinct references.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MethodRef {
    pub owner: ClassRef,
    pub name: String,
    pub descriptor: MethodDescriptor,
}
impl MethodRef {
    pub fn new<S: Into<String>>(
        owner: ClassRef,
        name: S,
        descriptor: MethodDescriptor,
    ) -> MethodRef {
        let name = name.into();
        assert!(!name.is_empty(), "Method name must not be empty");
        MethodRef { owner, name, descriptor }
    }
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.owner.name, self.name)
    }
}
impl Display for MethodRef {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Splits a member-qualified name into its declaring class and simple name.
pub(crate) fn split_member(qualified: &str) -> Option<(&str, &str)> {
    let index = qualified.rfind('/')?;
    if index == 0 || index + 1 == qualified.len() {
        return None;
    }
    Some((&qualified[..index], &qualified[index + 1..]))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn class_names() {
        let class = ClassRef::new("com/foo/Bar");
        assert_eq!(class.simple_name(), "Bar");
        assert_eq!(class.package_name(), "com/foo");
        let unpackaged = ClassRef::new("Entity");
        assert_eq!(unpackaged.simple_name(), "Entity");
        assert_eq!(unpackaged.package_name(), "");
    }
    #[test]
    fn relocate_package() {
        let class = ClassRef::new("Entity");
        assert_eq!(
            class.with_package("net/minecraft/server"),
            ClassRef::new("net/minecraft/server/Entity")
        );
        let packaged = ClassRef::new("com/foo/Bar");
        assert_eq!(packaged.with_package(""), ClassRef::new("Bar"));
    }
    #[test]
    fn field_identity_ignores_descriptor() {
        let owner = ClassRef::new("com/foo/Bar");
        let typed = FieldRef::new(
            owner.clone(),
            "value",
            Some("I".parse().unwrap()),
        );
        let untyped = FieldRef::new(owner, "value", None);
        assert_eq!(typed, untyped);
        assert_eq!(typed.qualified_name(), "com/foo/Bar/value");
    }
    #[test]
    fn method_identity_includes_descriptor() {
        let owner = ClassRef::new("com/foo/Bar");
        let first = MethodRef::new(owner.clone(), "run", "()V".parse().unwrap());
        let second = MethodRef::new(owner, "run", "(I)V".parse().unwrap());
        assert_ne!(first, second);
    }
    #[test]
    fn split_members() {
        assert_eq!(split_member("com/foo/Bar/value"), Some(("com/foo/Bar", "value")));
        assert_eq!(split_member("Bar/value"), Some(("Bar", "value")));
        assert_eq!(split_member("value"), None);
        assert_eq!(split_member("/value"), None);
        assert_eq!(split_member("Bar/"), None);
    }
}
