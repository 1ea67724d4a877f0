// crates/kryon-core/src/krb.rs
//
// The KRB binary container loader (§4.1-§4.2). Big-endian, bounds-checked
// throughout: every read goes through `KrbCursor`, which returns
// `KryonError::MalformedContainer` on truncation instead of panicking.
// The loader only assembles a neutral `KrbDocument` — turning that into a
// live `ElementTree`/`VariableRegistry`/component registry is
// `kryon-runtime::Runtime::load`'s job, since this crate doesn't own the
// live tree.

use crate::{
    ComponentDefinition, ComponentParam, ComponentStateVar, ElementType, EventType, KryonError, PropertyRegistry, PropertyValue, Result,
    TemplateSegment,
};
use glam::Vec4;

pub const MAGIC: [u8; 4] = *b"KRYN";
const VARS_MAGIC: [u8; 4] = *b"VARS";
const FUNC_MAGIC: [u8; 4] = *b"FUNC";
const COMP_MAGIC: [u8; 4] = *b"COMP";

#[derive(Debug, Clone, Copy)]
pub struct KrbHeader {
    pub version_major: u16,
    pub version_minor: u16,
    pub version_patch: u16,
    pub flags: u16,
    pub string_count: u16,
    pub element_count: u16,
    pub variable_count: u16,
    pub script_count: u16,
    pub component_count: u16,
    /// Total container size in bytes, as declared by the producer.
    pub total_size: u32,
    /// Checksum over the body, and its paired reserved word (§4.1's
    /// "three 32-bit size/checksum fields") — read and carried, not
    /// verified: this loader has no reference checksum algorithm to
    /// check them against.
    pub checksum: u32,
    pub checksum_reserved: u32,
    /// 0 = stored uncompressed, the only value this loader accepts.
    pub compression: u8,
    pub uncompressed_size: u32,
    pub string_table_offset: u32,
    pub element_tree_offset: u32,
    pub variables_offset: u32,
    pub scripts_offset: u32,
    pub components_offset: u32,
    pub reserved: [u8; 8],
}

/// A single parsed element record, still shaped as a tree of owned
/// children rather than arena ids — `Runtime::load` walks this to build
/// the live `ElementTree`.
#[derive(Debug, Clone)]
pub struct KrbElement {
    pub element_type: ElementType,
    pub user_id: Option<String>,
    pub classes: Vec<String>,
    pub properties: Vec<(String, PropertyValue)>,
    pub event_handlers: Vec<(EventType, String)>,
    pub children: Vec<KrbElement>,
}

#[derive(Debug, Clone)]
pub struct KrbVariable {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct KrbScript {
    pub name: String,
    pub language: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct KrbComponent {
    pub definition: ComponentDefinition,
    pub template: KrbElement,
}

#[derive(Debug, Clone)]
pub struct KrbDocument {
    pub header: KrbHeader,
    pub root: KrbElement,
    pub variables: Vec<KrbVariable>,
    pub scripts: Vec<KrbScript>,
    pub components: Vec<KrbComponent>,
}

struct KrbCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> KrbCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    fn seek(&mut self, offset: usize) {
        self.position = offset;
    }

    fn need(&self, len: usize) -> Result<()> {
        if self.position + len > self.data.len() {
            return Err(KryonError::MalformedContainer(format!(
                "unexpected end of data at offset {} (need {len} more bytes, have {})",
                self.position,
                self.data.len() - self.position.min(self.data.len())
            )));
        }
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.need(1)?;
        let v = self.data[self.position];
        self.position += 1;
        Ok(v)
    }

    fn read_u16(&mut self) -> Result<u16> {
        self.need(2)?;
        let v = u16::from_be_bytes([self.data[self.position], self.data[self.position + 1]]);
        self.position += 2;
        Ok(v)
    }

    fn read_u32(&mut self) -> Result<u32> {
        self.need(4)?;
        let v = u32::from_be_bytes([
            self.data[self.position],
            self.data[self.position + 1],
            self.data[self.position + 2],
            self.data[self.position + 3],
        ]);
        self.position += 4;
        Ok(v)
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.need(8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.data[self.position..self.position + 8]);
        self.position += 8;
        Ok(i64::from_be_bytes(bytes))
    }

    fn read_f64(&mut self) -> Result<f64> {
        self.need(8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.data[self.position..self.position + 8]);
        self.position += 8;
        Ok(f64::from_be_bytes(bytes))
    }

    fn read_color(&mut self) -> Result<Vec4> {
        let r = self.read_u8()? as f32 / 255.0;
        let g = self.read_u8()? as f32 / 255.0;
        let b = self.read_u8()? as f32 / 255.0;
        let a = self.read_u8()? as f32 / 255.0;
        Ok(Vec4::new(r, g, b, a))
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.need(len)?;
        let slice = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    fn read_magic(&mut self, expected: [u8; 4]) -> Result<()> {
        let got = self.read_bytes(4)?;
        if got != expected {
            return Err(KryonError::MalformedContainer(format!(
                "expected section magic {:?}, found {:?}",
                String::from_utf8_lossy(&expected),
                String::from_utf8_lossy(got)
            )));
        }
        Ok(())
    }
}

/// 1-indexed: index 0 is reserved as the empty string so "no value" can be
/// expressed as index 0 without an `Option` at every call site.
struct StringTable(Vec<String>);

impl StringTable {
    fn get(&self, index: u16) -> Result<&str> {
        if index == 0 {
            return Ok("");
        }
        self.0
            .get(index as usize - 1)
            .map(|s| s.as_str())
            .ok_or_else(|| KryonError::MalformedContainer(format!("string table index {index} out of range")))
    }

    fn get_opt(&self, index: u16) -> Result<Option<String>> {
        if index == 0 {
            Ok(None)
        } else {
            self.get(index).map(|s| Some(s.to_string()))
        }
    }
}

pub fn parse(data: &[u8]) -> Result<KrbDocument> {
    let mut cursor = KrbCursor::new(data);
    cursor.read_magic(MAGIC)?;
    let header = parse_header(&mut cursor)?;
    if header.version_major > 1 {
        return Err(KryonError::UnsupportedVersion(header.version_major));
    }

    let strings = parse_string_table(data, &header)?;
    let registry = PropertyRegistry::new();

    cursor.seek(header.element_tree_offset as usize);
    let root = parse_element(&mut cursor, &strings, &registry)?;

    let variables = parse_variables(data, &header, &strings)?;
    let scripts = parse_scripts(data, &header, &strings)?;
    let components = parse_components(data, &header, &strings, &registry)?;

    Ok(KrbDocument {
        header,
        root,
        variables,
        scripts,
        components,
    })
}

fn parse_header(cursor: &mut KrbCursor) -> Result<KrbHeader> {
    let version_major = cursor.read_u16()?;
    let version_minor = cursor.read_u16()?;
    let version_patch = cursor.read_u16()?;
    let flags = cursor.read_u16()?;
    let string_count = cursor.read_u16()?;
    let element_count = cursor.read_u16()?;
    let variable_count = cursor.read_u16()?;
    let script_count = cursor.read_u16()?;
    let component_count = cursor.read_u16()?;
    let total_size = cursor.read_u32()?;
    let checksum = cursor.read_u32()?;
    let checksum_reserved = cursor.read_u32()?;
    let compression = cursor.read_u8()?;
    let uncompressed_size = cursor.read_u32()?;
    let string_table_offset = cursor.read_u32()?;
    let element_tree_offset = cursor.read_u32()?;
    let variables_offset = cursor.read_u32()?;
    let scripts_offset = cursor.read_u32()?;
    let components_offset = cursor.read_u32()?;
    let mut reserved = [0u8; 8];
    reserved.copy_from_slice(cursor.read_bytes(8)?);

    if compression != 0 {
        return Err(KryonError::MalformedContainer(format!(
            "unsupported compression mode {compression}: this loader only reads uncompressed containers"
        )));
    }

    Ok(KrbHeader {
        version_major,
        version_minor,
        version_patch,
        flags,
        string_count,
        element_count,
        variable_count,
        script_count,
        component_count,
        total_size,
        checksum,
        checksum_reserved,
        compression,
        uncompressed_size,
        string_table_offset,
        element_tree_offset,
        variables_offset,
        scripts_offset,
        components_offset,
        reserved,
    })
}

fn parse_string_table(data: &[u8], header: &KrbHeader) -> Result<StringTable> {
    let mut cursor = KrbCursor::new(data);
    cursor.seek(header.string_table_offset as usize);
    let mut strings = Vec::with_capacity(header.string_count as usize);
    for _ in 0..header.string_count {
        let len = cursor.read_u16()? as usize;
        let bytes = cursor.read_bytes(len)?;
        strings.push(String::from_utf8_lossy(bytes).into_owned());
    }
    Ok(StringTable(strings))
}

/// Decode a self-describing `(tag, payload)` value, the format used only
/// within the variables section (§4.1) — every other property value is
/// decoded by [`parse_property_value_of_type`] against the mapping's
/// declared type instead.
fn parse_property_value(cursor: &mut KrbCursor, strings: &StringTable, tag: u8) -> Result<PropertyValue> {
    use crate::PropertyValueType as T;
    let ty = T::from_tag(tag).ok_or_else(|| KryonError::MalformedContainer(format!("unknown property value tag 0x{tag:02X}")))?;
    parse_property_value_of_type(cursor, strings, ty)
}

/// Decode a property value whose shape is already known (from the
/// property-hex -> type mapping), with no leading self-describing tag on
/// the wire — the format mandated for element property records (§3, §4.1).
fn parse_property_value_of_type(cursor: &mut KrbCursor, strings: &StringTable, ty: crate::PropertyValueType) -> Result<PropertyValue> {
    use crate::PropertyValueType as T;
    Ok(match ty {
        T::String => PropertyValue::String(strings.get(cursor.read_u16()?)?.to_string()),
        T::Int => PropertyValue::Int(cursor.read_i64()?),
        T::Float => PropertyValue::Float(cursor.read_f64()?),
        T::Bool => PropertyValue::Bool(cursor.read_u8()? != 0),
        T::Color => PropertyValue::Color(cursor.read_color()?),
        T::Function => PropertyValue::Function(strings.get(cursor.read_u16()?)?.to_string()),
        T::Reference => PropertyValue::Reference {
            binding_path: strings.get(cursor.read_u16()?)?.to_string(),
        },
        T::Template => {
            let segment_count = cursor.read_u16()?;
            let mut segments = Vec::with_capacity(segment_count as usize);
            for _ in 0..segment_count {
                let kind = cursor.read_u8()?;
                let text = strings.get(cursor.read_u16()?)?.to_string();
                segments.push(if kind == 0 {
                    TemplateSegment::Literal(text)
                } else {
                    TemplateSegment::Variable(text)
                });
            }
            PropertyValue::Template(segments)
        }
        T::Array => {
            let count = cursor.read_u16()?;
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                items.push(strings.get(cursor.read_u16()?)?.to_string());
            }
            PropertyValue::Array(items)
        }
        T::AstExpression => {
            let raw = strings.get(cursor.read_u16()?)?;
            PropertyValue::AstExpression(crate::AstExpr::Lit(crate::AstValue::String(raw.to_string())))
        }
    })
}

fn event_type_from_tag(tag: u8) -> Option<EventType> {
    Some(match tag {
        0x01 => EventType::Click,
        0x02 => EventType::Hover,
        0x03 => EventType::Focus,
        0x04 => EventType::Blur,
        0x05 => EventType::Change,
        0x06 => EventType::Submit,
        0x07 => EventType::MouseDown,
        0x08 => EventType::MouseUp,
        0x09 => EventType::MouseMove,
        0x0A => EventType::TextInput,
        0x0B => EventType::KeyDown,
        0x0C => EventType::KeyUp,
        0x0D => EventType::WindowFocus,
        0x0E => EventType::WindowResize,
        _ => return None,
    })
}

fn parse_element(cursor: &mut KrbCursor, strings: &StringTable, registry: &PropertyRegistry) -> Result<KrbElement> {
    let type_hex = cursor.read_u16()?;
    let element_type = ElementType::from(type_hex);

    let user_id = strings.get_opt(cursor.read_u16()?)?;

    let class_count = cursor.read_u8()?;
    let mut classes = Vec::with_capacity(class_count as usize);
    for _ in 0..class_count {
        classes.push(strings.get(cursor.read_u16()?)?.to_string());
    }

    // §4.1: property records are `(property-hex, value-payload)`; the
    // payload's shape comes from the property's mapping, not a
    // self-describing tag on the wire (that tagged form is reserved for
    // the variables section).
    let property_count = cursor.read_u16()?;
    let mut properties = Vec::with_capacity(property_count as usize);
    for _ in 0..property_count {
        let hex = cursor.read_u16()?;
        let mapping = registry
            .by_hex(hex)
            .ok_or_else(|| KryonError::MalformedContainer(format!("unknown property hex 0x{hex:04X}")))?;
        let value = parse_property_value_of_type(cursor, strings, mapping.value_type)?;
        properties.push((mapping.canonical_name.to_string(), value));
    }

    let event_count = cursor.read_u8()?;
    let mut event_handlers = Vec::with_capacity(event_count as usize);
    for _ in 0..event_count {
        let event_tag = cursor.read_u8()?;
        let handler_name = strings.get(cursor.read_u16()?)?.to_string();
        if let Some(event_type) = event_type_from_tag(event_tag) {
            event_handlers.push((event_type, handler_name));
        }
    }

    let child_count = cursor.read_u16()?;
    let mut children = Vec::with_capacity(child_count as usize);
    for _ in 0..child_count {
        children.push(parse_element(cursor, strings, registry)?);
    }

    Ok(KrbElement {
        element_type,
        user_id,
        classes,
        properties,
        event_handlers,
        children,
    })
}

fn parse_variables(data: &[u8], header: &KrbHeader, strings: &StringTable) -> Result<Vec<KrbVariable>> {
    if header.variable_count == 0 {
        return Ok(Vec::new());
    }
    let mut cursor = KrbCursor::new(data);
    cursor.seek(header.variables_offset as usize);
    cursor.read_magic(VARS_MAGIC)?;

    let mut variables = Vec::with_capacity(header.variable_count as usize);
    for _ in 0..header.variable_count {
        let name = strings.get(cursor.read_u16()?)?.to_string();
        let tag = cursor.read_u8()?;
        let value = parse_property_value(&mut cursor, strings, tag)?;
        let value = match value {
            PropertyValue::String(s) => s,
            PropertyValue::Int(i) => i.to_string(),
            PropertyValue::Float(f) => f.to_string(),
            PropertyValue::Bool(b) => b.to_string(),
            other => format!("{other:?}"),
        };
        variables.push(KrbVariable { name, value });
    }
    Ok(variables)
}

fn parse_scripts(data: &[u8], header: &KrbHeader, strings: &StringTable) -> Result<Vec<KrbScript>> {
    if header.script_count == 0 {
        return Ok(Vec::new());
    }
    let mut cursor = KrbCursor::new(data);
    cursor.seek(header.scripts_offset as usize);
    cursor.read_magic(FUNC_MAGIC)?;

    let mut scripts = Vec::with_capacity(header.script_count as usize);
    for _ in 0..header.script_count {
        let name = strings.get(cursor.read_u16()?)?.to_string();
        let language = strings.get(cursor.read_u16()?)?.to_string();
        let hex_len = cursor.read_u32()? as usize;
        let hex_bytes = cursor.read_bytes(hex_len)?;
        let hex_str = std::str::from_utf8(hex_bytes)
            .map_err(|e| KryonError::MalformedContainer(format!("script '{name}' code is not valid UTF-8 hex: {e}")))?;
        let code = decode_hex(hex_str)
            .ok_or_else(|| KryonError::MalformedContainer(format!("script '{name}' has malformed hex payload")))?;
        scripts.push(KrbScript { name, language, code });
    }
    Ok(scripts)
}

fn decode_hex(s: &str) -> Option<String> {
    if s.len() % 2 != 0 {
        return None;
    }
    let mut bytes = Vec::with_capacity(s.len() / 2);
    let chars: Vec<char> = s.chars().collect();
    for pair in chars.chunks(2) {
        let byte_str: String = pair.iter().collect();
        bytes.push(u8::from_str_radix(&byte_str, 16).ok()?);
    }
    String::from_utf8(bytes).ok()
}

fn parse_components(data: &[u8], header: &KrbHeader, strings: &StringTable, registry: &PropertyRegistry) -> Result<Vec<KrbComponent>> {
    if header.component_count == 0 {
        return Ok(Vec::new());
    }
    let mut cursor = KrbCursor::new(data);
    cursor.seek(header.components_offset as usize);
    cursor.read_magic(COMP_MAGIC)?;

    let mut components = Vec::with_capacity(header.component_count as usize);
    for _ in 0..header.component_count {
        let name = strings.get(cursor.read_u16()?)?.to_string();
        let mut definition = ComponentDefinition::new(name);

        let param_count = cursor.read_u8()?;
        for _ in 0..param_count {
            let name = strings.get(cursor.read_u16()?)?.to_string();
            let default = strings.get_opt(cursor.read_u16()?)?;
            definition.params.push(ComponentParam { name, default });
        }

        let state_count = cursor.read_u8()?;
        for _ in 0..state_count {
            let name = strings.get(cursor.read_u16()?)?.to_string();
            let type_name = strings.get(cursor.read_u16()?)?.to_string();
            let default = strings.get(cursor.read_u16()?)?.to_string();
            definition.state_vars.push(ComponentStateVar { name, type_name, default });
        }

        let template = parse_element(&mut cursor, strings, registry)?;
        components.push(KrbComponent { definition, template });
    }
    Ok(components)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-assembles the smallest legal KRB buffer: header, one-entry
    /// string table, and a single childless `App` element. No variables,
    /// scripts, or components.
    fn minimal_document_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);

        // 9 u16 fields + 3 u32 size/checksum fields + (1 u8 + 1 u32)
        // compression/uncompressed-size + 5 u32 offsets + 8-byte reserved.
        let header_len = 2 * 9 + 4 * 3 + (1 + 4) + 4 * 5 + 8;
        let string_table_offset = 4 + header_len;

        buf.extend_from_slice(&1u16.to_be_bytes()); // version_major
        buf.extend_from_slice(&0u16.to_be_bytes()); // version_minor
        buf.extend_from_slice(&0u16.to_be_bytes()); // version_patch
        buf.extend_from_slice(&0u16.to_be_bytes()); // flags
        buf.extend_from_slice(&1u16.to_be_bytes()); // string_count
        buf.extend_from_slice(&1u16.to_be_bytes()); // element_count
        buf.extend_from_slice(&0u16.to_be_bytes()); // variable_count
        buf.extend_from_slice(&0u16.to_be_bytes()); // script_count
        buf.extend_from_slice(&0u16.to_be_bytes()); // component_count
        buf.extend_from_slice(&0u32.to_be_bytes()); // total_size (unchecked)
        buf.extend_from_slice(&0u32.to_be_bytes()); // checksum (unchecked)
        buf.extend_from_slice(&0u32.to_be_bytes()); // checksum_reserved (unchecked)
        buf.push(0); // compression: 0 = uncompressed
        buf.extend_from_slice(&0u32.to_be_bytes()); // uncompressed_size (unchecked)

        let strings_start = string_table_offset as u32;
        // string table: one entry "root"
        let mut string_table = Vec::new();
        string_table.extend_from_slice(&4u16.to_be_bytes());
        string_table.extend_from_slice(b"root");

        let element_tree_offset = strings_start + string_table.len() as u32;
        // element: type=App(0x0000), user_id_index=1 ("root"), 0 classes,
        // 0 properties, 0 events, 0 children
        let mut element = Vec::new();
        element.extend_from_slice(&0x0000u16.to_be_bytes());
        element.extend_from_slice(&1u16.to_be_bytes());
        element.push(0); // class_count
        element.extend_from_slice(&0u16.to_be_bytes()); // property_count
        element.push(0); // event_count
        element.extend_from_slice(&0u16.to_be_bytes()); // child_count

        buf.extend_from_slice(&strings_start.to_be_bytes());
        buf.extend_from_slice(&element_tree_offset.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes()); // variables_offset (unused)
        buf.extend_from_slice(&0u32.to_be_bytes()); // scripts_offset (unused)
        buf.extend_from_slice(&0u32.to_be_bytes()); // components_offset (unused)
        buf.extend_from_slice(&[0u8; 8]); // reserved

        buf.extend_from_slice(&string_table);
        buf.extend_from_slice(&element);
        buf
    }

    #[test]
    fn parses_minimal_document() {
        let bytes = minimal_document_bytes();
        let doc = parse(&bytes).expect("minimal document should parse");
        assert_eq!(doc.root.element_type, ElementType::App);
        assert_eq!(doc.root.user_id.as_deref(), Some("root"));
        assert!(doc.root.children.is_empty());
        assert!(doc.variables.is_empty());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = minimal_document_bytes();
        bytes[0] = b'X';
        assert!(parse(&bytes).is_err());
    }

    #[test]
    fn truncated_buffer_errors_instead_of_panicking() {
        let bytes = minimal_document_bytes();
        let truncated = &bytes[..bytes.len() - 10];
        assert!(parse(truncated).is_err());
    }

    /// An element property record is `(property-hex, value-payload)` with
    /// no self-describing tag; the payload's shape comes from the
    /// property-registry mapping for that hex (§3, §4.1).
    #[test]
    fn element_property_decodes_via_hex_mapping() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);

        let header_len = 2 * 9 + 4 * 3 + (1 + 4) + 4 * 5 + 8;
        let string_table_offset = 4 + header_len;

        buf.extend_from_slice(&1u16.to_be_bytes()); // version_major
        buf.extend_from_slice(&0u16.to_be_bytes()); // version_minor
        buf.extend_from_slice(&0u16.to_be_bytes()); // version_patch
        buf.extend_from_slice(&0u16.to_be_bytes()); // flags
        buf.extend_from_slice(&2u16.to_be_bytes()); // string_count
        buf.extend_from_slice(&1u16.to_be_bytes()); // element_count
        buf.extend_from_slice(&0u16.to_be_bytes()); // variable_count
        buf.extend_from_slice(&0u16.to_be_bytes()); // script_count
        buf.extend_from_slice(&0u16.to_be_bytes()); // component_count
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.push(0); // compression
        buf.extend_from_slice(&0u32.to_be_bytes());

        let strings_start = string_table_offset as u32;
        let mut string_table = Vec::new();
        string_table.extend_from_slice(&4u16.to_be_bytes());
        string_table.extend_from_slice(b"root");
        string_table.extend_from_slice(&5u16.to_be_bytes());
        string_table.extend_from_slice(b"hello");

        let element_tree_offset = strings_start + string_table.len() as u32;
        // element: type=Text(0x0002), user_id="root", 0 classes, one
        // property (hex 0x08 "text", String-typed) -> string index 2
        // ("hello"), 0 events, 0 children.
        let mut element = Vec::new();
        element.extend_from_slice(&0x0002u16.to_be_bytes());
        element.extend_from_slice(&1u16.to_be_bytes());
        element.push(0); // class_count
        element.extend_from_slice(&1u16.to_be_bytes()); // property_count
        element.extend_from_slice(&0x0008u16.to_be_bytes()); // property hex
        element.extend_from_slice(&2u16.to_be_bytes()); // string index for value
        element.push(0); // event_count
        element.extend_from_slice(&0u16.to_be_bytes()); // child_count

        buf.extend_from_slice(&strings_start.to_be_bytes());
        buf.extend_from_slice(&element_tree_offset.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&[0u8; 8]);

        buf.extend_from_slice(&string_table);
        buf.extend_from_slice(&element);

        let doc = parse(&buf).expect("document with one mapped property should parse");
        assert_eq!(doc.root.properties.len(), 1);
        let (name, value) = &doc.root.properties[0];
        assert_eq!(name, "text");
        assert_eq!(value.as_string(), Some("hello"));
    }

    #[test]
    fn unknown_property_hex_errors() {
        let mut buf = minimal_document_bytes();
        // Flip the minimal document's element to declare one property with
        // an unmapped hex, which must be rejected rather than guessed at.
        let element_tree_offset = {
            let mut cursor = KrbCursor::new(&buf);
            cursor.read_magic(MAGIC).unwrap();
            parse_header(&mut cursor).unwrap().element_tree_offset as usize
        };
        // property_count sits right after type_hex(2) + user_id(2) + class_count(1).
        let property_count_offset = element_tree_offset + 5;
        buf[property_count_offset..property_count_offset + 2].copy_from_slice(&1u16.to_be_bytes());
        buf.splice(
            property_count_offset + 2..property_count_offset + 2,
            0xFFFFu16.to_be_bytes(),
        );
        assert!(parse(&buf).is_err());
    }

    #[test]
    fn nonzero_compression_is_rejected() {
        let mut bytes = minimal_document_bytes();
        // compression byte sits after magic(4) + 9 u16 fields(18) + 3 u32 fields(12).
        let compression_offset = 4 + 18 + 12;
        bytes[compression_offset] = 1;
        assert!(parse(&bytes).is_err());
    }
}
