//! Policies for the search
//!
//! - Selection policies: which existing child a playout revisits
//! - Backup modes: how child values roll up into their parent

pub mod backpropagation;
pub mod selection;

pub use backpropagation::BackupMode;
pub use selection::{SelectionPolicy, UcbPolicy};
