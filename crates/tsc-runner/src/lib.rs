//! Type-checking and per-file declaration emission.
//!
//! A build hands every source file of the project to a [`DeclarationEmitter`]
//! as one [`EmitRequest`]. The emitter either writes a declaration tree that
//! mirrors the sources under the output directory, or fails with the
//! checker's diagnostics and writes nothing.
//!
//! Three checkers are supported: `tsc` and `tsgo` run as child processes
//! against an overlay tsconfig, while the isolated emitter rewrites sources
//! in-process and needs every exported value to carry its own type.
//!
//! # Example
//!
//! ```ignore
//! use tsc_runner::{CheckUnit, CheckerKind, DeclarationEmitter, EmitRequest, EmitStrategy};
//! use camino::Utf8Path;
//!
//! #[tokio::main]
//! async fn main() {
//!     let root = Utf8Path::new("/path/to/project");
//!     let strategy = EmitStrategy::for_checker(CheckerKind::Tsc, root).unwrap();
//!
//!     let mut request = EmitRequest::new(
//!         root,
//!         root.join("tsconfig.json"),
//!         root.join("dist/.temp/dts"),
//!         root.join("dist/.temp"),
//!     );
//!     request.units.push(CheckUnit::on_disk(root.join("src/index.ts")));
//!
//!     let report = strategy.emit(&request).await.unwrap();
//!     for file in report.files {
//!         println!("{file}");
//!     }
//! }
//! ```

mod diagnostic;
mod emitter;
mod error;
mod isolated;
mod process;
mod scratch;
mod unit;

pub use diagnostic::{parse_output, Diagnostic, DiagnosticSeverity};
pub use emitter::{CheckerKind, DeclarationEmitter, EmitReport, EmitRequest, EmitStrategy};
pub use error::TscError;
pub use isolated::{
    emit_declaration, IsolatedEmitter, Issue, CANNOT_INFER, MISSING_ANNOTATION, SYNTAX_ERROR,
    UNSUPPORTED,
};
pub use process::{find_binary, ProcessEmitter};
pub use scratch::ScratchDir;
pub use unit::{declaration_file_name, CheckUnit, UnitContent};
