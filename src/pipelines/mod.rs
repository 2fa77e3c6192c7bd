pub mod virsequel;
pub mod batch;
