//! XHTML serialization of an [`ArenaDom`].
//!
//! Output is well-formed XML: void elements are self-closed, text and
//! attribute values are escaped, and empty foreign elements (SVG, MathML)
//! use the short form.

use html5ever::{QualName, ns};
use quick_xml::escape::{escape, partial_escape};

use super::arena::{ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId, Attribute};

/// Elements that never have content.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements html5ever tokenizes as raw text (with scripting enabled), so
/// their text content is written unescaped.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "noscript", "plaintext",
];

/// Serialize the whole document.
pub fn serialize(dom: &ArenaDom) -> String {
    serialize_node(dom, dom.document())
}

/// Serialize a node and its descendants.
pub fn serialize_node(dom: &ArenaDom, id: ArenaNodeId) -> String {
    let mut out = String::new();
    write_node(dom, id, false, &mut out);
    out
}

fn write_node(dom: &ArenaDom, id: ArenaNodeId, raw_text: bool, out: &mut String) {
    let Some(node) = dom.get(id) else {
        return;
    };

    match &node.data {
        ArenaNodeData::Document => {
            for child in dom.children(id) {
                write_node(dom, child, false, out);
            }
        }
        ArenaNodeData::Doctype {
            name,
            public_id,
            system_id,
        } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            if !public_id.is_empty() {
                out.push_str(" PUBLIC \"");
                out.push_str(public_id);
                out.push('"');
                if !system_id.is_empty() {
                    out.push_str(" \"");
                    out.push_str(system_id);
                    out.push('"');
                }
            } else if !system_id.is_empty() {
                out.push_str(" SYSTEM \"");
                out.push_str(system_id);
                out.push('"');
            }
            out.push_str(">\n");
        }
        ArenaNodeData::Comment(text) => {
            if let Some(pi) = processing_instruction(text) {
                out.push('<');
                out.push_str(pi);
                out.push_str(">\n");
            } else {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
        ArenaNodeData::Text(text) => {
            if raw_text {
                out.push_str(text);
            } else {
                out.push_str(&partial_escape(text.as_str()));
            }
        }
        ArenaNodeData::Element { name, attrs } => {
            let tag = name.local.as_ref();
            out.push('<');
            out.push_str(tag);
            for (attr_name, uri) in namespace_declarations(dom, node, name, attrs) {
                out.push(' ');
                out.push_str(&attr_name);
                out.push_str("=\"");
                out.push_str(&escape(uri));
                out.push('"');
            }
            for attr in attrs {
                out.push(' ');
                if let Some(prefix) = &attr.name.prefix {
                    out.push_str(prefix);
                    out.push(':');
                }
                out.push_str(&attr.name.local);
                out.push_str("=\"");
                out.push_str(&escape(attr.value.as_str()));
                out.push('"');
            }

            let is_html = name.ns == ns!(html);
            let has_children = node.first_child.is_some();

            if !has_children && (!is_html || VOID_ELEMENTS.contains(&tag)) {
                out.push_str("/>");
                return;
            }

            out.push('>');
            let raw = is_html && RAW_TEXT_ELEMENTS.contains(&tag);
            for child in dom.children(id) {
                write_node(dom, child, raw, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

/// Namespace declarations an element needs to be namespace-well-formed.
///
/// An element whose namespace differs from its parent element's (an `<svg>`
/// or `<math>` root, or HTML inside `<foreignObject>`) declares its default
/// namespace. Prefixed attributes such as `xlink:href` declare their prefix.
/// Declarations already present in the source are not repeated.
fn namespace_declarations<'a>(
    dom: &ArenaDom,
    node: &ArenaNode,
    name: &'a QualName,
    attrs: &'a [Attribute],
) -> Vec<(String, &'a str)> {
    let written: Vec<String> = attrs.iter().map(attribute_name).collect();
    let is_declared = |decl: &str| written.iter().any(|w| w == decl);

    let mut declarations: Vec<(String, &'a str)> = Vec::new();

    let parent_ns = dom.get(node.parent).and_then(|p| match &p.data {
        ArenaNodeData::Element { name, .. } => Some(name.ns.clone()),
        _ => None,
    });
    let is_namespace_root = match parent_ns {
        Some(parent_ns) => parent_ns != name.ns,
        None => name.ns != ns!(html),
    };
    if is_namespace_root && !name.ns.is_empty() && !is_declared("xmlns") {
        declarations.push(("xmlns".to_string(), name.ns.as_ref()));
    }

    for attr in attrs {
        let Some(prefix) = attr.name.prefix.as_deref() else {
            continue;
        };
        if matches!(prefix, "xml" | "xmlns") {
            continue;
        }
        let decl = format!("xmlns:{prefix}");
        if !is_declared(&decl) && !declarations.iter().any(|(d, _)| *d == decl) {
            declarations.push((decl, attr.name.ns.as_ref()));
        }
    }

    declarations
}

/// The attribute's name as written, `prefix:local` or `local`.
fn attribute_name(attr: &Attribute) -> String {
    match &attr.name.prefix {
        Some(prefix) => format!("{prefix}:{}", attr.name.local),
        None => attr.name.local.to_string(),
    }
}

/// html5ever reports `<?xml ...?>` as a bogus comment `?xml ...?`.
pub(crate) fn processing_instruction(text: &str) -> Option<&str> {
    if text.len() >= 2 && text.starts_with('?') && text.ends_with('?') {
        Some(text)
    } else {
        None
    }
}
