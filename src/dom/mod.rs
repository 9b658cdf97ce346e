//! In-memory HTML documents
//!
//! A page is parsed with html5ever into a flat node arena that keeps comments
//! and text nodes where the browser's tree builder puts them, so trace comments
//! can be located relative to the elements they annotate.

pub mod node;
pub mod parse;
pub mod select;
pub mod serialize;

pub use node::{Document, NodeData, NodeId};
pub use parse::parse_html;
pub use select::{select_first, Selector};
pub use serialize::to_html;
