//! Textual mapping formats.
//!
//! [`SrgMappingsFormat`] is the tagged line format:
//! `CL:` lines rename classes, `FD:` lines rename fields (optionally
//! carrying both sides' type descriptors) and `MD:` lines rename methods.
//! [`CompactSrgMappingsFormat`] is the untagged compact flavor whose member
//! records rename only the member, leaving owners and descriptors in the
//! source naming until a class mapping is chained on.

use std::io::{BufRead, Write};

use failure::Error;
use failure_derive::Fail;
use log::{trace, warn};

use crate::descriptor::{MalformedDescriptor, MethodDescriptor, TypeDescriptor};
use crate::mappings::{FrozenMappings, SimpleMappings};
use crate::refs::{split_member, ClassRef, FieldRef, MethodRef};

#[derive(Debug, Fail)]
pub enum MappingParseError {
    #[fail(display = "Invalid mapping on line {}: {:?}", line, text)]
    InvalidLine { line: usize, text: String },
    #[fail(display = "Invalid descriptor on line {}: {}", line, cause)]
    InvalidDescriptor {
        line: usize,
        #[cause]
        cause: MalformedDescriptor,
    },
}

pub struct SrgMappingsFormat;
impl SrgMappingsFormat {
    pub fn parse_text(text: &str) -> Result<FrozenMappings, Error> {
        let mut builder = SimpleMappings::default();
        for (index, line) in text.lines().enumerate() {
            parse_srg_line(&mut builder, line, index + 1)?;
        }
        Ok(finish(builder))
    }
    pub fn parse_stream<R: BufRead>(reader: R) -> Result<FrozenMappings, Error> {
        let mut builder = SimpleMappings::default();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            parse_srg_line(&mut builder, &line, index + 1)?;
        }
        Ok(finish(builder))
    }
    /// Writes classes, then fields, then methods, each in table order.
    pub fn write<W: Write>(mappings: &FrozenMappings, mut writer: W) -> Result<(), Error> {
        for (original, renamed) in mappings.classes() {
            writeln!(writer, "CL: {} {}", original, renamed)?;
        }
        for (original, renamed) in mappings.fields() {
            match (original.descriptor.as_ref(), renamed.descriptor.as_ref()) {
                (Some(original_type), Some(renamed_type)) => writeln!(
                    writer,
                    "FD: {} {} {} {}",
                    original, original_type, renamed, renamed_type
                )?,
                _ => writeln!(writer, "FD: {} {}", original, renamed)?,
            }
        }
        for (original, renamed) in mappings.methods() {
            writeln!(
                writer,
                "MD: {} {} {} {}",
                original, original.descriptor, renamed, renamed.descriptor
            )?;
        }
        Ok(())
    }
}

pub struct CompactSrgMappingsFormat;
impl CompactSrgMappingsFormat {
    pub fn parse_text(text: &str) -> Result<FrozenMappings, Error> {
        let mut builder = SimpleMappings::default();
        for (index, line) in text.lines().enumerate() {
            parse_compact_line(&mut builder, line, index + 1)?;
        }
        Ok(finish(builder))
    }
    pub fn parse_stream<R: BufRead>(reader: R) -> Result<FrozenMappings, Error> {
        let mut builder = SimpleMappings::default();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            parse_compact_line(&mut builder, &line, index + 1)?;
        }
        Ok(finish(builder))
    }
    pub fn write<W: Write>(mappings: &FrozenMappings, mut writer: W) -> Result<(), Error> {
        for (original, renamed) in mappings.classes() {
            writeln!(writer, "{} {}", original, renamed)?;
        }
        for (original, renamed) in mappings.fields() {
            writeln!(writer, "{} {} {}", original.owner, original.name, renamed.name)?;
        }
        for (original, renamed) in mappings.methods() {
            writeln!(
                writer,
                "{} {} {} {}",
                original.owner, original.name, original.descriptor, renamed.name
            )?;
        }
        Ok(())
    }
}

fn finish(builder: SimpleMappings) -> FrozenMappings {
    let mappings = builder.frozen();
    trace!(
        "Parsed {} classes, {} fields and {} methods",
        mappings.class_count(),
        mappings.field_count(),
        mappings.method_count()
    );
    mappings
}

fn parse_srg_line(
    builder: &mut SimpleMappings,
    line: &str,
    number: usize,
) -> Result<(), MappingParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(());
    }
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let invalid_line = || MappingParseError::InvalidLine {
        line: number,
        text: line.into(),
    };
    match tokens[0] {
        // Package records aren't part of the mapping model
        "PK:" => warn!("Ignoring package mapping on line {}: {}", number, trimmed),
        "CL:" if tokens.len() == 3 => {
            builder.set_class_name(ClassRef::new(tokens[1]), ClassRef::new(tokens[2]));
        }
        "FD:" if tokens.len() == 3 => {
            let (original_owner, original_name) =
                split_member(tokens[1]).ok_or_else(invalid_line)?;
            let (renamed_owner, renamed_name) =
                split_member(tokens[2]).ok_or_else(invalid_line)?;
            builder.set_field_name(
                FieldRef::new(ClassRef::new(original_owner), original_name, None),
                FieldRef::new(ClassRef::new(renamed_owner), renamed_name, None),
            );
        }
        "FD:" if tokens.len() == 5 => {
            let (original_owner, original_name) =
                split_member(tokens[1]).ok_or_else(invalid_line)?;
            let (renamed_owner, renamed_name) =
                split_member(tokens[3]).ok_or_else(invalid_line)?;
            builder.set_field_name(
                FieldRef::new(
                    ClassRef::new(original_owner),
                    original_name,
                    Some(parse_type(tokens[2], number)?),
                ),
                FieldRef::new(
                    ClassRef::new(renamed_owner),
                    renamed_name,
                    Some(parse_type(tokens[4], number)?),
                ),
            );
        }
        "MD:" if tokens.len() == 5 => {
            let (original_owner, original_name) =
                split_member(tokens[1]).ok_or_else(invalid_line)?;
            let (renamed_owner, renamed_name) =
                split_member(tokens[3]).ok_or_else(invalid_line)?;
            builder.set_method_name(
                MethodRef::new(
                    ClassRef::new(original_owner),
                    original_name,
                    parse_signature(tokens[2], number)?,
                ),
                MethodRef::new(
                    ClassRef::new(renamed_owner),
                    renamed_name,
                    parse_signature(tokens[4], number)?,
                ),
            );
        }
        _ => return Err(invalid_line()),
    }
    Ok(())
}

fn parse_compact_line(
    builder: &mut SimpleMappings,
    line: &str,
    number: usize,
) -> Result<(), MappingParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(());
    }
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    match tokens.len() {
        2 => builder.set_class_name(ClassRef::new(tokens[0]), ClassRef::new(tokens[1])),
        3 => {
            let owner = ClassRef::new(tokens[0]);
            builder.set_field_name(
                FieldRef::new(owner.clone(), tokens[1], None),
                FieldRef::new(owner, tokens[2], None),
            );
        }
        4 => {
            let owner = ClassRef::new(tokens[0]);
            let descriptor = parse_signature(tokens[2], number)?;
            builder.set_method_name(
                MethodRef::new(owner.clone(), tokens[1], descriptor.clone()),
                MethodRef::new(owner, tokens[3], descriptor),
            );
        }
        _ => {
            return Err(MappingParseError::InvalidLine {
                line: number,
                text: line.into(),
            })
        }
    }
    Ok(())
}

fn parse_type(token: &str, line: usize) -> Result<TypeDescriptor, MappingParseError> {
    token
        .parse()
        .map_err(|cause| MappingParseError::InvalidDescriptor { line, cause })
}
fn parse_signature(token: &str, line: usize) -> Result<MethodDescriptor, MappingParseError> {
    token
        .parse()
        .map_err(|cause| MappingParseError::InvalidDescriptor { line, cause })
}

#[cfg(test)]
mod test {
    use super::*;

    const SAMPLE: &str = "\
# A mapping with one of everything
CL: com/foo/Old com/foo/New
FD: com/foo/Old/value Lcom/foo/Old; com/foo/New/value Lcom/foo/New;
MD: com/foo/Old/run (Lcom/foo/Old;I)V com/foo/New/go (Lcom/foo/New;I)V

PK: ./ net/minecraft/server
FD: com/foo/Old/plain com/foo/New/plain
";

    #[test]
    fn parse_srg() {
        let mappings = SrgMappingsFormat::parse_text(SAMPLE).unwrap();
        assert_eq!(mappings.class_count(), 1);
        assert_eq!(mappings.field_count(), 2);
        assert_eq!(mappings.method_count(), 1);
        assert_eq!(
            mappings.get_remapped_class(&ClassRef::new("com/foo/Old")),
            Some(&ClassRef::new("com/foo/New"))
        );
        let (original, renamed) = mappings.fields().next().unwrap();
        assert_eq!(original.qualified_name(), "com/foo/Old/value");
        assert_eq!(original.descriptor, Some("Lcom/foo/Old;".parse().unwrap()));
        assert_eq!(renamed.descriptor, Some("Lcom/foo/New;".parse().unwrap()));
        let (original, renamed) = mappings.fields().nth(1).unwrap();
        assert_eq!(original.name, "plain");
        assert_eq!(original.descriptor, None);
        assert_eq!(renamed.descriptor, None);
        let (original, renamed) = mappings.methods().next().unwrap();
        assert_eq!(original.name, "run");
        assert_eq!(renamed.name, "go");
        assert_eq!(format!("{}", renamed.descriptor), "(Lcom/foo/New;I)V");
    }
    #[test]
    fn srg_roundtrip() {
        let mappings = SrgMappingsFormat::parse_text(SAMPLE).unwrap();
        let mut buffer = Vec::new();
        SrgMappingsFormat::write(&mappings, &mut buffer).unwrap();
        let written = String::from_utf8(buffer).unwrap();
        let reparsed = SrgMappingsFormat::parse_text(&written).unwrap();
        assert_eq!(reparsed, mappings);
        // Writing is deterministic
        let mut again = Vec::new();
        SrgMappingsFormat::write(&reparsed, &mut again).unwrap();
        assert_eq!(String::from_utf8(again).unwrap(), written);
    }
    #[test]
    fn invalid_srg_lines() {
        assert!(SrgMappingsFormat::parse_text("CL: onlyone").is_err());
        assert!(SrgMappingsFormat::parse_text("XX: a b").is_err());
        assert!(SrgMappingsFormat::parse_text("FD: nomember other/thing").is_err());
        assert!(SrgMappingsFormat::parse_text(
            "MD: com/foo/Old/run (Lbroken com/foo/New/go (I)V"
        )
        .is_err());
    }
    #[test]
    fn parse_stream_matches_text() {
        let streamed = SrgMappingsFormat::parse_stream(SAMPLE.as_bytes()).unwrap();
        let parsed = SrgMappingsFormat::parse_text(SAMPLE).unwrap();
        assert_eq!(streamed, parsed);
    }
    #[test]
    fn parse_compact() {
        let text = "\
a Entity
a b health
a c (La;)V tick
";
        let mappings = CompactSrgMappingsFormat::parse_text(text).unwrap();
        assert_eq!(
            mappings.get_remapped_class(&ClassRef::new("a")),
            Some(&ClassRef::new("Entity"))
        );
        let (original, renamed) = mappings.fields().next().unwrap();
        // Member records only rename the member itself
        assert_eq!(original.owner, renamed.owner);
        assert_eq!(renamed.name, "health");
        let (original, renamed) = mappings.methods().next().unwrap();
        assert_eq!(original.descriptor, renamed.descriptor);
        assert_eq!(renamed.name, "tick");
    }
    #[test]
    fn compact_roundtrip() {
        let text = "a Entity\na b health\na c (La;)V tick\n";
        let mappings = CompactSrgMappingsFormat::parse_text(text).unwrap();
        let mut buffer = Vec::new();
        CompactSrgMappingsFormat::write(&mappings, &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), text);
    }
    #[test]
    fn invalid_compact_lines() {
        assert!(CompactSrgMappingsFormat::parse_text("toofew").is_err());
        assert!(CompactSrgMappingsFormat::parse_text("a b c d e").is_err());
        assert!(CompactSrgMappingsFormat::parse_text("a b (Lbroken c").is_err());
    }
}
