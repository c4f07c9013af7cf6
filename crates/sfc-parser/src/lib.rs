//! Block-level parser for Vue single-file components.
//!
//! Only the top-level structure is parsed: `<template>`, `<script>`,
//! `<script setup>`, `<style>` and custom blocks, with their attributes and
//! raw content. Block content is never interpreted here.
//!
//! # Example
//!
//! ```
//! use sfc_parser::parse;
//!
//! let source = r#"
//! <script setup lang="ts">
//! const props = defineProps<{ msg: string }>();
//! </script>
//!
//! <template>
//!   <h1>{{ msg }}</h1>
//! </template>
//! "#;
//!
//! let descriptor = parse(source).unwrap();
//! assert_eq!(descriptor.script_lang(), Some("ts"));
//! ```

mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::{AttrValue, SfcAttribute, SfcBlock, SfcDescriptor};
pub use error::{SfcError, SfcErrorKind};
pub use lexer::{Lexer, Token, TokenKind};
pub use text_edit::Span;

/// Parses a component source into its blocks.
///
/// Malformed block structure is an error; there is no partial result.
pub fn parse(source: &str) -> Result<SfcDescriptor, SfcError> {
    parser::Parser::new(source).parse()
}
