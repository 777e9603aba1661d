//! Semantic model over one document
//!
//! Binds names to [`Symbol`]s and folds constants. The model only knows the
//! document it was built from plus a [`ReferenceCatalog`] describing the
//! referenced library; names it cannot bind resolve to `None`, which rules
//! treat as "not applicable".

mod catalog;
mod constant;
mod model;

pub use catalog::{ReferenceCatalog, ReferenceMethod, ReferenceType};
pub use constant::ConstantValue;
pub use model::{SemanticModel, Symbol, SymbolKind};
