//! Bit manipulation utilities shared by the Strata codecs.
//!
//! - [`bitcast`]: same-width reinterpretation between signed and unsigned views
//! - [`varint`]: unsigned LEB128 variable-length integers
//! - [`bitstream`]: MSB-first bit writer and a register-based bit reader

pub mod bitcast;
pub mod bitstream;
pub mod varint;
