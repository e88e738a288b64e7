//! Writers that export the annotation model to interchange formats.
//!
//! Currently one target: the Darwin JSON layout ([`darwin`]).

pub mod darwin;
