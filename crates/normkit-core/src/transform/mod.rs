//! Row-level transform primitives applied while building an entity's table
//! (spec §4.2).

pub mod dedup;
pub mod empty;
pub mod subset;
pub mod unpivot;

pub use dedup::drop_duplicates;
pub use empty::drop_empty_rows;
pub use subset::{renumber_surrogate_id, subset_with_surrogate_id};
pub use unpivot::{unpivot, UnpivotOutcome};
