/*! Post-processing

Tools operating on already generated trivia data rather than on harvested records.
!*/
pub mod check;

pub use check::check;
