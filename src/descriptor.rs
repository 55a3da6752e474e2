use std::fmt::{self, Display, Formatter, Write};
use std::str::FromStr;

use failure_derive::Fail;
use itertools::Itertools;
use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};

use crate::refs::ClassRef;

#[derive(Debug, Fail)]
pub enum MalformedDescriptor {
    #[fail(display = "Unknown type code {:?}", _0)]
    UnknownCode(char),
    #[fail(display = "Unterminated object type {:?}", _0)]
    UnterminatedObject(String),
    #[fail(display = "Empty class name in descriptor {:?}", _0)]
    EmptyClassName(String),
    #[fail(display = "Unexpected void type in {:?}", _0)]
    UnexpectedVoid(String),
    #[fail(display = "Truncated descriptor {:?}", _0)]
    Truncated(String),
    #[fail(display = "Trailing text in descriptor {:?}", _0)]
    Trailing(String),
    #[fail(display = "Missing parameter list in {:?}", _0)]
    MissingParameters(String),
}

/// The element of a type descriptor, before any array dimensions are applied.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum ElementType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
    Object(ClassRef),
}

/// A field type in the descriptor grammar, like `I` or `[[Ljava/lang/String;`.
///
/// Immutable once constructed; cloning gives the defensive copy
/// mapping derivations rely on.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TypeDescriptor {
    element: ElementType,
    array_depth: usize,
}
impl TypeDescriptor {
    #[inline]
    pub fn new(element: ElementType, array_depth: usize) -> TypeDescriptor {
        // Void is only legal as a bare return type
        assert!(
            array_depth == 0 || element != ElementType::Void,
            "Void can't be an array"
        );
        TypeDescriptor { element, array_depth }
    }
    #[inline]
    pub fn element(&self) -> &ElementType {
        &self.element
    }
    #[inline]
    pub fn array_depth(&self) -> usize {
        self.array_depth
    }
    #[inline]
    pub fn is_void(&self) -> bool {
        self.element == ElementType::Void
    }
    #[inline]
    pub fn class_type(&self) -> Option<&ClassRef> {
        match self.element {
            ElementType::Object(ref class_type) => Some(class_type),
            _ => None,
        }
    }
    /// Substitutes the embedded class reference,
    /// returning an identical descriptor for non-object types.
    pub fn with_class_type(&self, class_type: ClassRef) -> TypeDescriptor {
        match self.element {
            ElementType::Object(_) => TypeDescriptor {
                element: ElementType::Object(class_type),
                array_depth: self.array_depth,
            },
            _ => self.clone(),
        }
    }
    /// Parses a single type descriptor starting at `offset`,
    /// returning the descriptor and the offset one past its end.
    pub fn parse_at(
        text: &str,
        offset: usize,
    ) -> Result<(TypeDescriptor, usize), MalformedDescriptor> {
        let bytes = text.as_bytes();
        let mut index = offset;
        let mut array_depth = 0;
        while bytes.get(index) == Some(&b'[') {
            array_depth += 1;
            index += 1;
        }
        let code = match bytes.get(index) {
            Some(&code) => code,
            None => return Err(MalformedDescriptor::Truncated(text[offset..].into())),
        };
        let (element, end) = match code {
            b'Z' => (ElementType::Boolean, index + 1),
            b'B' => (ElementType::Byte, index + 1),
            b'C' => (ElementType::Char, index + 1),
            b'S' => (ElementType::Short, index + 1),
            b'I' => (ElementType::Int, index + 1),
            b'J' => (ElementType::Long, index + 1),
            b'F' => (ElementType::Float, index + 1),
            b'D' => (ElementType::Double, index + 1),
            b'V' => (ElementType::Void, index + 1),
            b'L' => {
                let semicolon = match text[index..].find(';') {
                    Some(position) => index + position,
                    None => {
                        return Err(MalformedDescriptor::UnterminatedObject(text[index..].into()))
                    }
                };
                if semicolon == index + 1 {
                    return Err(MalformedDescriptor::EmptyClassName(text[index..].into()));
                }
                let class_type = ClassRef::new(&text[index + 1..semicolon]);
                (ElementType::Object(class_type), semicolon + 1)
            }
            _ => {
                let code = text[index..].chars().next().unwrap();
                return Err(MalformedDescriptor::UnknownCode(code));
            }
        };
        if array_depth > 0 && element == ElementType::Void {
            return Err(MalformedDescriptor::UnexpectedVoid(text[offset..end].into()));
        }
        Ok((TypeDescriptor { element, array_depth }, end))
    }
}
impl FromStr for TypeDescriptor {
    type Err = MalformedDescriptor;

    fn from_str(s: &str) -> Result<TypeDescriptor, MalformedDescriptor> {
        let (descriptor, end) = TypeDescriptor::parse_at(s, 0)?;
        if end != s.len() {
            return Err(MalformedDescriptor::Trailing(s.into()));
        }
        Ok(descriptor)
    }
}
impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for _ in 0..self.array_depth {
            f.write_char('[')?;
        }
        match self.element {
            ElementType::Boolean => f.write_char('Z'),
            ElementType::Byte => f.write_char('B'),
            ElementType::Char => f.write_char('C'),
            ElementType::Short => f.write_char('S'),
            ElementType::Int => f.write_char('I'),
            ElementType::Long => f.write_char('J'),
            ElementType::Float => f.write_char('F'),
            ElementType::Double => f.write_char('D'),
            ElementType::Void => f.write_char('V'),
            ElementType::Object(ref class_type) => write!(f, "L{};", class_type),
        }
    }
}
impl Serialize for TypeDescriptor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}", self))
    }
}
impl<'de> Deserialize<'de> for TypeDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<TypeDescriptor, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DescriptorVisitor;
        impl<'de> Visitor<'de> for DescriptorVisitor {
            type Value = TypeDescriptor;

            fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
                formatter.write_str("a type descriptor")
            }

            #[inline]
            fn visit_str<E>(self, value: &str) -> Result<TypeDescriptor, E>
            where
                E: de::Error,
            {
                value.parse().map_err(E::custom)
            }
        }
        deserializer.deserialize_str(DescriptorVisitor)
    }
}

/// A method signature in the descriptor grammar, like `(IJ)Ljava/lang/Object;`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MethodDescriptor {
    parameters: Vec<TypeDescriptor>,
    return_type: TypeDescriptor,
}
impl MethodDescriptor {
    pub fn new(parameters: Vec<TypeDescriptor>, return_type: TypeDescriptor) -> MethodDescriptor {
        for parameter in &parameters {
            assert!(!parameter.is_void(), "Void parameter");
        }
        MethodDescriptor { parameters, return_type }
    }
    #[inline]
    pub fn parameters(&self) -> &[TypeDescriptor] {
        &self.parameters
    }
    #[inline]
    pub fn return_type(&self) -> &TypeDescriptor {
        &self.return_type
    }
    /// Rebuilds the descriptor by running every parameter and the return type
    /// through `func`.
    pub fn map_types<F>(&self, mut func: F) -> MethodDescriptor
    where
        F: FnMut(&TypeDescriptor) -> TypeDescriptor,
    {
        MethodDescriptor {
            parameters: self
                .parameters
                .iter()
                .map(|descriptor| func(descriptor))
                .collect(),
            return_type: func(&self.return_type),
        }
    }
}
impl FromStr for MethodDescriptor {
    type Err = MalformedDescriptor;

    fn from_str(s: &str) -> Result<MethodDescriptor, MalformedDescriptor> {
        if !s.starts_with('(') {
            return Err(MalformedDescriptor::MissingParameters(s.into()));
        }
        let mut parameters = Vec::new();
        let mut offset = 1;
        loop {
            match s.as_bytes().get(offset) {
                None => return Err(MalformedDescriptor::Truncated(s.into())),
                Some(b')') => {
                    offset += 1;
                    break;
                }
                Some(_) => {
                    let (descriptor, end) = TypeDescriptor::parse_at(s, offset)?;
                    if descriptor.is_void() {
                        return Err(MalformedDescriptor::UnexpectedVoid(s.into()));
                    }
                    parameters.push(descriptor);
                    offset = end;
                }
            }
        }
        let (return_type, end) = TypeDescriptor::parse_at(s, offset)?;
        if end != s.len() {
            return Err(MalformedDescriptor::Trailing(s.into()));
        }
        Ok(MethodDescriptor { parameters, return_type })
    }
}
impl Display for MethodDescriptor {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "({}){}", self.parameters.iter().join(""), self.return_type)
    }
}
impl Serialize for MethodDescriptor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}", self))
    }
}
impl<'de> Deserialize<'de> for MethodDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<MethodDescriptor, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DescriptorVisitor;
        impl<'de> Visitor<'de> for DescriptorVisitor {
            type Value = MethodDescriptor;

            fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
                formatter.write_str("a method descriptor")
            }

            #[inline]
            fn visit_str<E>(self, value: &str) -> Result<MethodDescriptor, E>
            where
                E: de::Error,
            {
                value.parse().map_err(E::custom)
            }
        }
        deserializer.deserialize_str(DescriptorVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_primitives() {
        assert_eq!(
            "I".parse::<TypeDescriptor>().unwrap(),
            TypeDescriptor::new(ElementType::Int, 0)
        );
        assert_eq!(
            "J".parse::<TypeDescriptor>().unwrap(),
            TypeDescriptor::new(ElementType::Long, 0)
        );
        assert_eq!(
            "[[Z".parse::<TypeDescriptor>().unwrap(),
            TypeDescriptor::new(ElementType::Boolean, 2)
        );
        assert_eq!(
            "V".parse::<TypeDescriptor>().unwrap(),
            TypeDescriptor::new(ElementType::Void, 0)
        );
    }
    #[test]
    fn parse_object_array() {
        let descriptor = "[[Ljava/lang/String;".parse::<TypeDescriptor>().unwrap();
        assert_eq!(descriptor.array_depth(), 2);
        assert_eq!(descriptor.class_type(), Some(&ClassRef::new("java/lang/String")));
        assert_eq!(format!("{}", descriptor), "[[Ljava/lang/String;");
    }
    #[test]
    fn display_roundtrip() {
        for text in &[
            "Z", "B", "C", "S", "I", "J", "F", "D", "V",
            "Lcom/foo/Bar;", "[I", "[Lcom/foo/Bar;", "[[[Ljava/lang/String;",
        ] {
            let descriptor = text.parse::<TypeDescriptor>().unwrap();
            assert_eq!(format!("{}", descriptor), *text);
        }
    }
    #[test]
    fn malformed_types() {
        assert!(match "Lfoo".parse::<TypeDescriptor>() {
            Err(MalformedDescriptor::UnterminatedObject(_)) => true,
            _ => false,
        });
        assert!("Q".parse::<TypeDescriptor>().is_err());
        assert!("[V".parse::<TypeDescriptor>().is_err());
        assert!("II".parse::<TypeDescriptor>().is_err());
        assert!("L;".parse::<TypeDescriptor>().is_err());
        assert!("".parse::<TypeDescriptor>().is_err());
    }
    #[test]
    fn parse_method() {
        let descriptor = "(IDLjava/lang/Thread;)Ljava/lang/Object;"
            .parse::<MethodDescriptor>()
            .unwrap();
        assert_eq!(descriptor.parameters().len(), 3);
        assert_eq!(
            descriptor.parameters()[2].class_type(),
            Some(&ClassRef::new("java/lang/Thread"))
        );
        assert_eq!(
            descriptor.return_type().class_type(),
            Some(&ClassRef::new("java/lang/Object"))
        );
        assert_eq!(
            format!("{}", descriptor),
            "(IDLjava/lang/Thread;)Ljava/lang/Object;"
        );
    }
    #[test]
    fn parse_empty_method() {
        let descriptor = "()V".parse::<MethodDescriptor>().unwrap();
        assert!(descriptor.parameters().is_empty());
        assert!(descriptor.return_type().is_void());
        assert_eq!(format!("{}", descriptor), "()V");
    }
    #[test]
    fn malformed_methods() {
        assert!(match "(V)V".parse::<MethodDescriptor>() {
            Err(MalformedDescriptor::UnexpectedVoid(_)) => true,
            _ => false,
        });
        assert!("(I".parse::<MethodDescriptor>().is_err());
        assert!("IV".parse::<MethodDescriptor>().is_err());
        assert!("()VV".parse::<MethodDescriptor>().is_err());
        assert!("()".parse::<MethodDescriptor>().is_err());
    }
    #[test]
    fn replace_class_type() {
        let descriptor = "[Lcom/foo/Old;".parse::<TypeDescriptor>().unwrap();
        let renamed = descriptor.with_class_type(ClassRef::new("com/foo/New"));
        assert_eq!(format!("{}", renamed), "[Lcom/foo/New;");
        let primitive = "[I".parse::<TypeDescriptor>().unwrap();
        assert_eq!(primitive.with_class_type(ClassRef::new("com/foo/New")), primitive);
    }
    #[test]
    fn serialize_descriptors() {
        let descriptor = "[Ljava/lang/String;".parse::<TypeDescriptor>().unwrap();
        assert_eq!(
            ::serde_json::to_string(&descriptor).unwrap(),
            "\"[Ljava/lang/String;\""
        );
        let parsed: TypeDescriptor =
            ::serde_json::from_str("\"[Ljava/lang/String;\"").unwrap();
        assert_eq!(parsed, descriptor);
        let signature = "(IJ)V".parse::<MethodDescriptor>().unwrap();
        let parsed: MethodDescriptor = ::serde_json::from_str("\"(IJ)V\"").unwrap();
        assert_eq!(parsed, signature);
    }
}
