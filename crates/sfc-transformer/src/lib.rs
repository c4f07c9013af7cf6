//! Turns the script blocks of a Vue single-file component into a plain
//! TypeScript module that a type-checker can emit declarations for.
//!
//! Template and style blocks never contribute to the emitted type surface.
//! `<script setup>` components get a synthesized default export describing
//! their props and emits.
//!
//! # Example
//!
//! ```
//! use sfc_transformer::{compile_script, CompileOptions};
//!
//! let descriptor = sfc_parser::parse("<template><p/></template>").unwrap();
//! let script = compile_script(&descriptor, &CompileOptions::default()).unwrap();
//! assert_eq!(script.code, sfc_transformer::DEFAULT_COMPONENT);
//! assert_eq!(script.lang, "ts");
//! ```

mod error;
mod macros;
mod script;

pub use error::CompileError;
pub use script::{compile_script, CompileOptions, CompiledScript, DEFAULT_COMPONENT};
