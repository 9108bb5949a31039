//! Infrastructure implementations of the domain seams

pub mod embedding;
pub mod logging;
pub mod semantic;
pub mod services;
pub mod store;
