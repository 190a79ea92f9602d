/*!
# IO utilities

Loading and saving of trivia pools.
!*/
pub mod pool;

pub use pool::{Pool, PoolItem, Stats};
