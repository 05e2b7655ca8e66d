pub mod compiler;
pub mod date;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod proximity;
pub mod rewrite;
pub mod suggest;
pub mod token;

pub use compiler::{Compiled, QueryCompiler, compile_query};
pub use date::{DateParser, DefaultDateParser};
pub use node::QueryNode;
pub use parser::{Grammar, Search};
// Re-exports for public API
#[allow(unused_imports)]
pub use proximity::{Clause, Distributable, Occur};
#[allow(unused_imports)]
pub use suggest::{SpellChecker, SuggestionBuilder, WordListSpellChecker};
#[allow(unused_imports)]
pub use token::{ProxOperator, ProxUnit};
