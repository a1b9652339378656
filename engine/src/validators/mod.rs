//! Validators (C4, §4.4): per-language build/typecheck drivers, run
//! concurrently, aggregated under the polyglot rule.

mod aggregate;
mod error;
mod go;
mod java;
mod javascript;
mod python;
mod runner;
mod rust_lang;
mod types;
mod typescript;

pub use aggregate::{run_all, to_build_errors, AggregateResult, NO_LANGUAGE_THRESHOLD};
pub use error::ValidatorError;
pub use types::{Language, ValidatorResult};
