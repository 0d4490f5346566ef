//! Custom request extractors

mod bearer;

pub use bearer::MaybeBearer;
