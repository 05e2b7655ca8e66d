//! # Qsol - boolean and proximity query compiler
//!
//! Qsol compiles human-typed search queries into an explicit, serializable
//! query tree that a full-text engine can execute. The language mixes AND,
//! OR, AND-NOT and proximity operators with configurable precedence and
//! spellings, field searches, date expressions, wildcards, fuzzy terms,
//! quoted phrases with slop and boosted terms.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`config`] - Operator precedence, replacement tables, field settings
//! - [`analysis`] - Text analyzers that turn literals into index terms
//! - [`query`] - Lexer, grammar, rewrite pass, builders and the query algebra
//! - [`error`] - Typed compile errors
//! - [`output`] - Terminal rendering for the `qsol` binary
//!
//! A compile runs in two passes. The input is parsed, rewritten into
//! canonical text (default operators, find/replace, zero padding), parsed
//! again, and only then built into a [`QueryNode`]. Proximity operators are
//! handed to a distribution engine that pushes nearness down through the
//! boolean structure of both operands.
//!
//! ## Quick Start
//!
//! ```
//! use qsol::{Configuration, OperatorKind, QueryCompiler};
//!
//! let mut config = Configuration::default();
//! config
//!     .add_operator(OperatorKind::And, "AND")
//!     .add_operator(OperatorKind::Or, "OR");
//!
//! let compiler = QueryCompiler::new(config).unwrap();
//! let compiled = compiler.compile("body", "mark AND dog OR cat").unwrap();
//! assert_eq!(compiled.query().to_string(), "(+body:mark +body:dog) body:cat");
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod output;
pub mod query;

pub use analysis::{AnalyzedToken, Analyzer, StandardAnalyzer, SynonymAnalyzer, WhitespaceAnalyzer};
pub use config::{Configuration, DateLocale, DefaultOperator, FindReplace, OperatorKind, RegexRule};
pub use error::{CompileError, Result};
pub use query::{Compiled, QueryCompiler, QueryNode, compile_query};
