//! Block encodings for fixed-width column values.
//!
//! Integer, timestamp and floating point blocks are encoded into a byte stream
//! whose first byte carries the encoding tag in its high nibble. Decoding is
//! only possible through the matching decoder in [`codecs`].

pub mod analyze;
pub mod bitpack;
pub mod codecs;
pub mod dictionary;
pub mod kernels;
pub mod value;
pub mod zigzag;

pub use analyze::{Analysis, Shape, analyze};
pub use dictionary::{Dictionary, build_dictionary};
pub use kernels::{KernelLevel, Kernels};
pub use value::{DictionaryValue, FloatValue, IntegerValue};
