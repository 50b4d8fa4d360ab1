use indexmap::IndexMap;

use super::{Fingerprints, OffsetKind, PointerWidth, VersionEntry, VersionId};
use crate::error::SchemaError;
use crate::markup::RawNode;

type SchemaResult<T> = Result<T, SchemaError>;

const VERSION_TAG: &str = "version";

/// Turn the children of the document root into typed version entries.
///
/// Every child must be a `<version>` element; entries keep document order.
pub fn build(root: &RawNode) -> SchemaResult<Vec<VersionEntry>> {
    let mut entries = Vec::with_capacity(root.children.len());
    for (index, node) in root.children.iter().enumerate() {
        if node.tag != VERSION_TAG {
            return Err(SchemaError::UnexpectedElement { tag: node.tag.clone() });
        }
        entries.push(build_version(node, index)?);
    }
    Ok(entries)
}

/// Where an attribute is being read from, for error messages.
struct Site<'a> {
    version: &'a str,
    element: &'a str,
}

impl<'a> Site<'a> {
    fn required<'n>(&self, node: &'n RawNode, attribute: &'static str) -> SchemaResult<&'n str> {
        match node.attribute(attribute) {
            None => Err(SchemaError::MissingAttribute {
                version: self.version.to_string(),
                element: self.element.to_string(),
                attribute,
            }),
            Some(value) if value.trim().is_empty() => {
                Err(self.invalid(attribute, value, "must not be empty"))
            }
            Some(value) => Ok(value.trim()),
        }
    }

    fn invalid(&self, attribute: &'static str, value: &str, reason: &str) -> SchemaError {
        SchemaError::InvalidAttribute {
            version: self.version.to_string(),
            element: self.element.to_string(),
            attribute,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn number(&self, attribute: &'static str, value: &str, max: u64, bits: u32) -> SchemaResult<u64> {
        let parsed = parse_unsigned(value).and_then(|n| {
            if n > max {
                Err(format!("exceeds the {bits}-bit range"))
            } else {
                Ok(n)
            }
        });
        parsed.map_err(|reason| SchemaError::InvalidNumber {
            version: self.version.to_string(),
            element: self.element.to_string(),
            attribute,
            value: value.to_string(),
            reason,
        })
    }

    /// Read a required address/offset attribute bounded by the pointer width.
    fn address(&self, node: &RawNode, attribute: &'static str, width: PointerWidth) -> SchemaResult<u64> {
        let raw = self.required(node, attribute)?;
        self.number(attribute, raw, width.max_value(), width.bits())
    }

    fn unknown_child(&self, child: &RawNode) -> SchemaError {
        SchemaError::UnknownElement { version: self.version.to_string(), tag: child.tag.clone() }
    }
}

/// Parse `0x`-prefixed hexadecimal or plain decimal.
fn parse_unsigned(text: &str) -> Result<u64, String> {
    let text = text.trim();
    let (digits, radix) = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (text, 10),
    };
    if digits.is_empty() {
        return Err("no digits".to_string());
    }
    if !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(if radix == 16 {
            "not a hexadecimal literal".to_string()
        } else {
            "not a decimal or 0x-prefixed hexadecimal literal".to_string()
        });
    }
    u64::from_str_radix(digits, radix).map_err(|_| "does not fit in 64 bits".to_string())
}

fn build_version(node: &RawNode, index: usize) -> SchemaResult<VersionEntry> {
    // Unnamed versions are reported by their position in the document.
    let fallback = format!("#{}", index + 1);
    let label = Site { version: &fallback, element: VERSION_TAG }.required(node, "name")?;
    let site = Site { version: label, element: VERSION_TAG };

    let platform = site.required(node, "platform")?;
    let width = match node.attribute("bits") {
        Some(bits) => PointerWidth::from_bits(bits)
            .ok_or_else(|| site.invalid("bits", bits, "expected 32 or 64"))?,
        None => PointerWidth::for_platform(platform),
    };
    let inherits_from = match node.attribute("inherits-from") {
        Some(_) => Some(site.required(node, "inherits-from")?.to_string()),
        None => None,
    };

    let sha256 = match node.attribute("sha256") {
        Some(_) => {
            let digest = site.required(node, "sha256")?;
            if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(site.invalid("sha256", digest, "expected 64 hex digits"));
            }
            Some(digest.to_ascii_lowercase())
        }
        None => None,
    };
    let pe_timestamp = match node.attribute("pe-timestamp") {
        Some(raw) => Some(site.number("pe-timestamp", raw, u64::from(u32::MAX), 32)? as u32),
        None => None,
    };

    let declarations = node
        .children
        .iter()
        .map(|child| build_offset(child, label, width))
        .collect::<SchemaResult<Vec<_>>>()?;

    Ok(VersionEntry {
        id: VersionId::new(platform, label),
        width,
        inherits_from,
        fingerprints: Fingerprints { sha256, pe_timestamp },
        declarations,
    })
}

fn build_offset(node: &RawNode, version: &str, width: PointerWidth) -> SchemaResult<OffsetKind> {
    let site = Site { version, element: node.tag.as_str() };
    match node.tag.as_str() {
        "global" => Ok(OffsetKind::GlobalAddress {
            name: site.required(node, "name")?.to_string(),
            address: site.address(node, "address", width)?,
        }),
        "function" => Ok(OffsetKind::FunctionAddress {
            name: site.required(node, "name")?.to_string(),
            address: site.address(node, "address", width)?,
        }),
        "vtable" => {
            let class = site.required(node, "class")?.to_string();
            let address = site.address(node, "address", width)?;
            let mut methods = Vec::with_capacity(node.children.len());
            for child in &node.children {
                if child.tag != "method" {
                    return Err(site.unknown_child(child));
                }
                let method_site = Site { version, element: "method" };
                methods.push(method_site.required(child, "name")?.to_string());
            }
            Ok(OffsetKind::VTable { class, address, methods })
        }
        "class" => {
            let name = site.required(node, "name")?.to_string();
            let vtable = match node.attribute("vtable") {
                Some(_) => Some(site.address(node, "vtable", width)?),
                None => None,
            };
            let mut fields = IndexMap::with_capacity(node.children.len());
            for child in &node.children {
                if child.tag != "field" {
                    return Err(site.unknown_child(child));
                }
                let field_site = Site { version, element: "field" };
                let field = field_site.required(child, "name")?.to_string();
                let offset = field_site.address(child, "offset", width)?;
                if fields.contains_key(&field) {
                    return Err(SchemaError::DuplicateField {
                        version: version.to_string(),
                        class: name,
                        field,
                    });
                }
                fields.insert(field, offset);
            }
            Ok(OffsetKind::ClassLayout { name, vtable, fields })
        }
        _ => Err(site.unknown_child(node)),
    }
}
