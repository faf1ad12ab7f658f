//! CLI command implementations

mod catalog;
mod initial;
mod input;
mod normalize;
mod offset;
mod step;

pub use catalog::catalog;
pub use initial::initial;
pub use normalize::normalize;
pub use offset::offset;
pub use step::step;
