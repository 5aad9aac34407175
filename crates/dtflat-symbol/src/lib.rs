//! dtflat Symbol System
//!
//! The global `/__symbols__` table: label → absolute node path.
//!
//! # Overview
//!
//! - **SymbolEntry**: One label bound to a path
//! - **SymbolTableSynthesizer**: Stages the table when a tree lacks one
//! - **SymbolTable**: Read view resolving labels to nodes
//! - **SymbolValidator**: Rejects malformed or duplicate entries
//!
//! # Example
//!
//! ```rust
//! use dtflat_symbol::{SymbolEntry, SymbolTable, SymbolTableSynthesizer};
//! use dtflat_tree::{NodeSnapshot, TreeSnapshot};
//!
//! let mut tree = TreeSnapshot::new(
//!     NodeSnapshot::new("").with_child(NodeSnapshot::new("soc@0")),
//! )
//! .build()
//! .unwrap();
//!
//! let symbols = [SymbolEntry::new("soc", "/soc@0")];
//! let mut cs = SymbolTableSynthesizer::new()
//!     .ensure_symbols(&tree, &symbols)
//!     .unwrap();
//! cs.commit(&mut tree).unwrap();
//!
//! let table = SymbolTable::read(&tree).unwrap();
//! assert!(table.resolve(&tree, "soc").is_some());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod symbol;
mod synthesizer;
mod validation;

// Re-exports
pub use symbol::{find_symbols_node, SymbolEntry, SymbolTable, SYMBOLS_NODE};
pub use synthesizer::{SymbolError, SymbolTableSynthesizer, SYMBOLS_CHANGESET};
pub use validation::{SymbolValidator, ValidationError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
