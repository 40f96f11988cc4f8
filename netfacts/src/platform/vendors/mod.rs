//! Built-in platform definitions.

pub mod ocnos;
