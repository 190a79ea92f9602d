//! Filtering traits.
//!
//! Both traits return `true` when the item should be *kept*.

/// immutable, pure filter (2 successive equal inputs -> 2 equal outputs)
pub trait Filter<T>: Default {
    fn detect(&self, item: T) -> bool;
}

/// mutable filter (that holds state).
///
/// The method name differs from [Filter::detect] so that a type can implement both
/// without ambiguous calls. A stateful filter usually records what it has already seen,
/// so feeding it the same item twice may give two different answers.
pub trait FilterMut<T>: Default {
    fn detect_mut(&mut self, item: T) -> bool;
}
