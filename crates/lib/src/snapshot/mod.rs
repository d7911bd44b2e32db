//! The plain-value side of a document: snapshot values, paths into them,
//! path-addressed patches, and the structural diff that produces patches
//! from two snapshots.

pub mod diff;
mod patch;
mod path;
mod value;

pub use diff::{diff, diff_with};
pub use patch::{Patch, PatchOp};
pub use path::{PathStep, TextPathSet, render_path, wildcard_path};
pub use value::Value;
