//! Compile entry point and the boolean/field builder.
//!
//! A compile runs the whole pipeline: parse the input with disabled operators
//! treated as text, rewrite it into canonical text, parse that again with
//! every operator live, then build the [`QueryNode`] tree. All state lives in
//! the call, so one [`QueryCompiler`] can be shared across threads.

use crate::analysis::{Analyzer, StandardAnalyzer};
use crate::config::{Configuration, DefaultOperator, OperatorKind};
use crate::error::{CompileError, Result};
use crate::query::date::{DateParser, DefaultDateParser};
use crate::query::lexer::SearchKind;
use crate::query::node::QueryNode;
use crate::query::parser::{BasicSearch, Check, FieldSearch, Grammar, Operand, SearchToken, Unit};
use crate::query::proximity::ProximityBuilder;
use crate::query::rewrite::{CompiledRule, Rewriter};
use crate::query::suggest::SpellChecker;
use crate::query::token;
use std::sync::Arc;
use tracing::{debug, trace};

/// Result of one compile
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    query: QueryNode,
    rewritten: String,
    suggested_search: Option<String>,
}

impl Compiled {
    pub fn query(&self) -> &QueryNode {
        &self.query
    }

    pub fn into_query(self) -> QueryNode {
        self.query
    }

    /// Canonical query text produced by the rewrite pass
    pub fn rewritten(&self) -> &str {
        &self.rewritten
    }

    /// Spelling-corrected query, when a spell checker is attached and at
    /// least one term was corrected
    pub fn suggested_search(&self) -> Option<&str> {
        self.suggested_search.as_deref()
    }
}

/// Compiles Qsol query text against a fixed configuration
#[derive(Clone)]
pub struct QueryCompiler {
    config: Configuration,
    rules: Vec<CompiledRule>,
    analyzer: Arc<dyn Analyzer>,
    spell: Option<Arc<dyn SpellChecker>>,
    dates: Arc<dyn DateParser>,
}

impl QueryCompiler {
    /// Validates `config` and compiles its regex rules
    pub fn new(config: Configuration) -> Result<Self> {
        config.validate()?;
        let rules = CompiledRule::compile_all(&config.regex_rules)?;
        Ok(Self {
            config,
            rules,
            analyzer: Arc::new(StandardAnalyzer::new()),
            spell: None,
            dates: Arc::new(DefaultDateParser::new()),
        })
    }

    pub fn with_analyzer(mut self, analyzer: impl Analyzer + 'static) -> Self {
        self.analyzer = Arc::new(analyzer);
        self
    }

    /// Enables suggested searches
    pub fn with_spell_checker(mut self, checker: impl SpellChecker + 'static) -> Self {
        self.spell = Some(Arc::new(checker));
        self
    }

    pub fn with_date_parser(mut self, parser: impl DateParser + 'static) -> Self {
        self.dates = Arc::new(parser);
        self
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Compile `query`, searching `field` wherever no field is named
    pub fn compile(&self, field: &str, query: &str) -> Result<Compiled> {
        debug!(field, query, "compiling");
        let search = Grammar::for_input(&self.config).parse(query)?;

        let mut rewriter = Rewriter::new(&self.config, &self.rules);
        if self.spell.is_some() {
            rewriter = rewriter.with_suggestions();
        }
        let rewritten = rewriter.rewrite(&search);

        let suggested_search = match (&self.spell, &rewritten.suggestion) {
            (Some(checker), Some(builder)) => {
                builder.resolve(field, self.analyzer.as_ref(), checker.as_ref())
            }
            _ => None,
        };
        if let Some(suggested) = &suggested_search {
            debug!(suggested = %suggested, "suggested search");
        }

        let canonical = Grammar::canonical(&self.config).parse(&rewritten.text)?;
        let builder = Builder {
            config: &self.config,
            analyzer: self.analyzer.as_ref(),
            dates: self.dates.as_ref(),
        };
        let node = builder.check(&canonical.root, field)?;

        if node.is_empty() {
            return Err(CompileError::EmptyResult(query.to_string()));
        }

        Ok(Compiled {
            query: node,
            rewritten: rewritten.text,
            suggested_search,
        })
    }
}

impl std::fmt::Debug for QueryCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCompiler")
            .field("config", &self.config)
            .field("spell_checker", &self.spell.is_some())
            .finish_non_exhaustive()
    }
}

/// One-shot compile with the [`StandardAnalyzer`]
pub fn compile_query(field: &str, query: &str, config: &Configuration) -> Result<QueryNode> {
    Ok(QueryCompiler::new(config.clone())?
        .compile(field, query)?
        .into_query())
}

/// Builds query trees from the canonical parse
pub(crate) struct Builder<'a> {
    pub(crate) config: &'a Configuration,
    analyzer: &'a dyn Analyzer,
    dates: &'a dyn DateParser,
}

impl Builder<'_> {
    pub(crate) fn check(&self, check: &Check, field: &str) -> Result<QueryNode> {
        let Some(first) = check.chain.first() else {
            return self.operand(&check.head, field);
        };

        let kind = first.op.kind;
        trace!(level = check.level, op = ?kind, links = check.chain.len(), "building level");
        if kind == OperatorKind::Proximity {
            return ProximityBuilder::new(self, field).build(check);
        }

        let mut operands = Vec::with_capacity(check.chain.len() + 1);
        operands.push(self.operand(&check.head, field)?);
        for link in &check.chain {
            operands.push(self.operand(&link.operand, field)?);
        }
        if operands.iter().any(QueryNode::is_empty) {
            trace!(op = ?kind, "eliding empty operands");
        }

        Ok(match kind {
            OperatorKind::And => QueryNode::and(operands),
            OperatorKind::Or => QueryNode::or(operands),
            _ => {
                let negative = operands.split_off(1);
                QueryNode::and_not(operands, negative)
            }
        })
    }

    fn operand(&self, operand: &Operand, field: &str) -> Result<QueryNode> {
        match operand {
            Operand::Check(check) => self.check(check, field),
            Operand::Basic(basic) => self.basic(basic, field),
        }
    }

    fn basic(&self, basic: &BasicSearch, field: &str) -> Result<QueryNode> {
        let units = basic
            .units
            .iter()
            .map(|unit| self.unit(unit, field))
            .collect::<Result<Vec<_>>>()?;
        Ok(match self.config.default_operator {
            DefaultOperator::And => QueryNode::and(units),
            DefaultOperator::Or => QueryNode::or(units),
        })
    }

    fn unit(&self, unit: &Unit, field: &str) -> Result<QueryNode> {
        match unit {
            Unit::Field(search) => self.field_search(search),
            Unit::Token(token) => self.token_query(token, field),
            Unit::Paren(inner) => self.check(inner, field),
        }
    }

    fn field_search(&self, search: &FieldSearch) -> Result<QueryNode> {
        let mut fields = Vec::new();
        let mut clauses = Vec::new();

        for name in &search.fields {
            let mapped = self.config.map_field(name);
            let clause = if self.config.is_date_field(name) {
                self.dates.parse(mapped, &search.raw, self.config.locale)?
            } else {
                self.check(&search.body, mapped)?
            };
            if !clause.is_empty() {
                fields.push(mapped.to_string());
                clauses.push(clause);
            }
        }

        if clauses.is_empty() {
            return Ok(QueryNode::Empty);
        }
        Ok(QueryNode::FieldGroup { fields, clauses })
    }

    /// Query for a single search token
    pub(crate) fn token_query(&self, token: &SearchToken, field: &str) -> Result<QueryNode> {
        let image = token.image.as_str();
        let malformed = || {
            CompileError::syntax(token.start, format!("malformed search token `{}`", image))
        };

        match token.kind {
            SearchKind::MatchAll => Ok(QueryNode::MatchAll),
            SearchKind::Quoted | SearchKind::BoostedQuoted => {
                let quoted = token::parse_quoted(image).ok_or_else(malformed)?;
                Ok(self.analyzed(field, &token::unescape(quoted.text), quoted.slop, quoted.boost))
            }
            SearchKind::Range => {
                let range = token::parse_range(image).ok_or_else(malformed)?;
                Ok(QueryNode::Range {
                    field: field.to_string(),
                    lo: Some(self.expanded(&token::unescape(range.lo))),
                    hi: Some(self.expanded(&token::unescape(range.hi))),
                    inclusive_lo: range.inclusive_lo(),
                    inclusive_hi: range.inclusive_hi(),
                })
            }
            SearchKind::Wildcard => Ok(QueryNode::Wildcard {
                field: field.to_string(),
                pattern: self.expanded(image),
            }),
            SearchKind::Fuzzy => {
                let text = image.strip_suffix('`').unwrap_or(image);
                Ok(QueryNode::Fuzzy {
                    field: field.to_string(),
                    text: self.expanded(&token::unescape(text)),
                })
            }
            SearchKind::BoostedTerm => {
                let (text, boost) = token::split_boost(image).ok_or_else(malformed)?;
                Ok(self.analyzed(field, &token::unescape(text), 0, boost))
            }
            SearchKind::Term => Ok(self.analyzed(field, &token::unescape(image), 0, 1.0)),
        }
    }

    /// Wildcard, fuzzy and range terms skip analysis
    fn expanded(&self, text: &str) -> String {
        if self.config.lowercase_expanded_terms {
            text.to_lowercase()
        } else {
            text.to_string()
        }
    }

    /// Run `text` through the analyzer and shape the result by token positions
    fn analyzed(&self, field: &str, text: &str, slop: u32, boost: f32) -> QueryNode {
        let tokens = self.analyzer.analyze(field, text);

        // tokens sharing a position form one group
        let mut groups: Vec<Vec<String>> = Vec::new();
        for token in tokens {
            match groups.last_mut() {
                Some(group) if token.position_increment == 0 => group.push(token.text),
                _ => groups.push(vec![token.text]),
            }
        }

        let terms = |group: Vec<String>| -> Vec<QueryNode> {
            group
                .into_iter()
                .map(|text| QueryNode::boosted_term(field, text, boost))
                .collect()
        };

        match groups.len() {
            0 => {
                trace!(field, text, "analyzed to nothing");
                QueryNode::Empty
            }
            1 => {
                let mut group = terms(groups.swap_remove(0));
                if group.len() == 1 {
                    group.swap_remove(0)
                } else {
                    QueryNode::Or(group)
                }
            }
            // boost sits on the terms, not the span
            _ if groups.iter().any(|g| g.len() > 1) => {
                let children = groups
                    .into_iter()
                    .map(|group| {
                        let mut group = terms(group);
                        if group.len() == 1 {
                            group.swap_remove(0)
                        } else {
                            QueryNode::Or(group)
                        }
                    })
                    .collect();
                QueryNode::near(children, slop, true)
            }
            _ => QueryNode::Phrase {
                field: field.to_string(),
                terms: groups.into_iter().flatten().collect(),
                slop,
                boost,
            },
        }
    }
}
