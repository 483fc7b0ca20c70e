//! ECMA-335 metadata: tables, heaps, signatures, the resolution graph and method bodies.
//!
//! # Key Components
//!
//! - [`token`] - Table kind and row id packed into one `u32`
//! - [`tables`] - Table kinds, coded indices, raw rows and their row codecs
//! - [`streams`] - The `#Strings`, `#Blob`, `#GUID` and `#US` heaps
//! - [`signatures`] - Type signature trees, their parser and writer
//! - [`generic`] - Generic contexts and instantiation of signature trees
//! - [`graph`] - Lazily materialized, identity preserving member graph
//! - [`method`] - Method body headers, exception handlers and instruction-level bodies
//!
//! # Examples
//!
//! ```rust
//! use cilgraph::metadata::{
//!     graph::{ModuleGraph, TypeReference},
//!     streams::Heaps,
//!     tables::{MetadataTables, TypeRefRaw},
//! };
//!
//! let mut heaps = Heaps::new();
//! let name = heaps.strings.append("Object")?;
//! let namespace = heaps.strings.append("System")?;
//!
//! let mut tables = MetadataTables::new();
//! let token = tables.type_ref.push(TypeRefRaw {
//!     type_name: name,
//!     type_namespace: namespace,
//!     ..Default::default()
//! });
//!
//! let graph = ModuleGraph::new(tables, heaps);
//! let object = graph.get::<TypeReference>(token).expect("row exists");
//! assert_eq!(object.full_name(&graph)?, "System.Object");
//! # Ok::<(), cilgraph::Error>(())
//! ```

pub mod generic;
pub mod graph;
pub mod method;
pub mod signatures;
pub mod streams;
pub mod tables;
pub mod token;
