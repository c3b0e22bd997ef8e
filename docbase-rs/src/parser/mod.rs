//! Parsers for front matter and document bodies.

pub mod frontmatter;
pub mod heading;
pub mod value;

pub use frontmatter::{
    decode, encode, replace_body, split_front_matter, update, update_text, Decoded,
    FrontMatterSplit, DELIMITER,
};
pub use heading::first_h1;
pub use value::{validate_key, FrontMatter, FrontMatterPatch, Scalar, Value};
