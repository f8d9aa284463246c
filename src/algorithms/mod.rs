//! Algorithms built on the partitioners.
//!
//! Every algorithm is a sequential/parallel [`Algorithm`](crate::Algorithm)
//! pair plus a free function taking the policy first. Input data is anything
//! convertible into a [`SharedSlice`](crate::SharedSlice), so chunk closures can
//! outlive the call when the policy defers.

pub mod find;
pub mod for_each;
pub mod includes;
pub mod predicates;
pub mod reduce;
pub mod scan;

pub use self::find::{find, find_end, find_first_of, find_if, find_if_not, mismatch, try_find_if};
pub use self::for_each::for_each;
pub use self::includes::includes;
pub use self::predicates::{all_of, any_of, count_if, none_of};
pub use self::reduce::{reduce, sort, transform_reduce};
pub use self::scan::{exclusive_scan, inclusive_scan};
