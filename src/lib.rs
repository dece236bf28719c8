#[cfg(feature = "afl")]
pub use afl::fuzz as afl_fuzz;
#[cfg(feature = "honggfuzz")]
pub use honggfuzz::fuzz as honggfuzz_fuzz;

pub mod config;
pub mod encode;
pub mod error;
pub mod harness;
pub mod record;

pub use encode::{decode_line, serialize, DecodedRecord};
pub use error::{HarnessError, HarnessResult};
pub use record::{Field, ParsedUrlRecord};
