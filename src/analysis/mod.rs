//! Queries over a loaded event set
//!
//! Filtering, grouped counts and reception-to-pass sequences.

pub mod counts;
pub mod filter;
pub mod sequence;

pub use counts::{CountRow, CountTable, GroupBy};
pub use filter::{FilterSpec, Selection, TimeWindow, Zone};
pub use sequence::{count_sequences, SequenceCount, SequenceQuery};
