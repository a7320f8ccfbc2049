//! Gateway implementations.
//!
//! Only an in-process simulation is shipped; live venues plug in by
//! implementing [`rotation_core::traits::Gateway`].

mod paper;

pub use paper::PaperGateway;
