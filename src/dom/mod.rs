//! HTML parsing into an editable arena DOM and XHTML serialization.
//!
//! # Example
//!
//! ```
//! use folio::dom::{parse_html, serialize};
//!
//! let mut dom = parse_html(r#"<p><a href="ch2.html#s1">Next</a></p>"#);
//! let a = dom.find_by_tag("a").unwrap();
//! dom.set_attr(a, "href", "#s1");
//!
//! assert!(serialize(&dom).contains(r##"<a href="#s1">Next</a>"##));
//! ```

mod arena;
mod serialize;
mod tree_sink;

pub use arena::{ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId, Attribute};
pub use serialize::{serialize, serialize_node};
pub(crate) use serialize::processing_instruction;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use tree_sink::ArenaSink;

/// Parse an HTML document into an [`ArenaDom`].
///
/// Never fails: malformed markup is repaired the way browsers repair it.
pub fn parse_html(html: &str) -> ArenaDom {
    let sink = ArenaSink::new();
    let result = parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes());
    result.into_dom()
}
