//! Order-preserving encoding primitives.
//!
//! Every index key codec is built from the transforms in [`sortable`]: they
//! turn integers, floats, and byte strings into big-endian byte forms whose
//! lexicographic order equals the natural order of the original values.

pub mod sortable;
