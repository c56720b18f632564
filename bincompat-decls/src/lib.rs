//! Declaration ingestion utilities.
//!
//! Declarations come from an external extraction step. Loading is tolerant: a
//! file that cannot be read or parsed is reported alongside the others instead
//! of failing the whole run, so unrelated shapes can still be planned.

mod load;

pub use load::{DeclLoadError, LoadedDecls, load_decls};
