//! Live adapters for real external interactions.

pub mod clock;
pub mod http;
pub mod id_gen;
pub mod json_file;
