//! Reader-side helpers
//!
//! The reader itself lives outside this crate; what it needs from here is
//! a way to tell whether buffered input forms complete expressions.

mod balance;

pub use balance::Balance;
