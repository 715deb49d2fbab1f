pub mod combiner;
pub mod error;
pub mod evaluator;
pub mod predicate;
