//! Flutter bridge crate for the medicine reminder core.

pub mod api;
