//! docbase - a schema-aware document store over a tree of Markdown files.
//!
//! # Overview
//!
//! A workspace is a directory of Markdown documents with flat front matter.
//! docbase provides:
//! - Sandboxed file operations confined to the workspace root
//! - A formatting-preserving front-matter codec
//! - Per-directory schemas (`schema.json`) with typed fields and defaults
//! - Directory metadata (`index.md`) and a browsable tree
//! - Relations between documents in different directories
//! - An archive convention (`_` directories) with archive and restore
//! - Health checks of documents against their schemas
//!
//! # Example
//!
//! ```no_run
//! use docbase::{DocumentUpdate, FrontMatterPatch, Workspace};
//!
//! let workspace = Workspace::new("/path/to/docs").unwrap();
//!
//! // Create a draft seeded from the directory schema
//! let created = workspace.create_document("products/app/pages").unwrap();
//!
//! // Set its title, leaving the body untouched
//! let patch = FrontMatterPatch::new().set("title", "Home").unwrap();
//! let doc = workspace
//!     .update_document(&created.path, &DocumentUpdate::patch(patch))
//!     .unwrap();
//! println!("{} -> {}", doc.path.display(), doc.title);
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod health;
pub mod index;
pub mod parser;
pub mod relation;
pub mod schema;
pub mod store;
pub mod workspace;

// Re-export main types at crate root
pub use archive::{ArchiveManager, is_archived};
pub use config::Config;
pub use document::Document;
pub use error::{DocError, Result};
pub use index::{DirectoryIndex, DirectoryMeta, FileNode};
pub use parser::{FrontMatter, FrontMatterPatch, Scalar, Value};
pub use relation::{Relation, RelationEntry, RelationResolver};
pub use schema::{FieldDescriptor, FieldType, Schema};
pub use store::FileStore;
pub use workspace::{
    ArchiveOutcome, CreatedDocument, DirectoryView, DocumentUpdate, FieldRelation, Workspace,
};
