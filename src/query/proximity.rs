//! Proximity distribution.
//!
//! Nearness is only defined between span-like leaves, so `(a | b) ~3 (c & d)`
//! has to be pushed down through the boolean structure on both sides, the
//! way multiplication distributes over addition:
//!
//! ```text
//! (a | b) ~3 (c & d)  =>  (a~3c & a~3d) | (b~3c & b~3d)
//! ```
//!
//! Operands are first collected as [`Distributable`]s that keep their
//! boolean shape, then [`ProximityBuilder::distribute`] walks both sides.
//! Runs of OR-connected span results are merged into one flat `Or`.

use crate::config::{DefaultOperator, OperatorKind};
use crate::error::{CompileError, Result};
use crate::query::compiler::Builder;
use crate::query::lexer::SearchKind;
use crate::query::node::QueryNode;
use crate::query::parser::{Check, Operand, Unit};
use crate::query::token::{self, ProxOperator, ProxUnit};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    Must,
    Should,
    MustNot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub occur: Occur,
    pub item: Distributable,
}

impl Clause {
    fn new(occur: Occur, item: Distributable) -> Self {
        Self { occur, item }
    }
}

/// A proximity operand that has not been reduced to a single query yet
#[derive(Debug, Clone, PartialEq)]
pub enum Distributable {
    /// Span-like query
    Leaf(QueryNode),
    /// Boolean combination of further operands
    Group(Vec<Clause>),
}

impl Distributable {
    /// Group of `clauses`; a lone positive clause stands for itself
    pub fn group(mut clauses: Vec<Clause>) -> Self {
        if clauses.len() == 1 && clauses[0].occur != Occur::MustNot {
            return clauses.swap_remove(0).item;
        }
        Distributable::Group(clauses)
    }

    /// Every one of `items`
    pub fn all_of(items: Vec<Distributable>) -> Self {
        Self::group(
            items
                .into_iter()
                .map(|item| Clause::new(Occur::Must, item))
                .collect(),
        )
    }

    /// Recover boolean structure from an already built query so it can be
    /// distributed again
    pub fn from_query(node: QueryNode) -> Self {
        match node {
            QueryNode::And(children) => Self::group(
                children
                    .into_iter()
                    .map(|c| Clause::new(Occur::Must, Self::from_query(c)))
                    .collect(),
            ),
            QueryNode::Or(children) if !children.iter().all(QueryNode::is_span) => Self::group(
                children
                    .into_iter()
                    .map(|c| Clause::new(Occur::Should, Self::from_query(c)))
                    .collect(),
            ),
            QueryNode::AndNot { positive, negative } => Self::group(
                positive
                    .into_iter()
                    .map(|c| Clause::new(Occur::Must, Self::from_query(c)))
                    .chain(
                        negative
                            .into_iter()
                            .map(|c| Clause::new(Occur::MustNot, Self::from_query(c))),
                    )
                    .collect(),
            ),
            other => Distributable::Leaf(other),
        }
    }
}

/// Builds the query for one proximity level
pub(crate) struct ProximityBuilder<'b, 'a> {
    builder: &'b Builder<'a>,
    field: &'b str,
}

impl<'b, 'a> ProximityBuilder<'b, 'a> {
    pub(crate) fn new(builder: &'b Builder<'a>, field: &'b str) -> Self {
        Self { builder, field }
    }

    /// `a ~ b ~ c` distributes each new operand against everything before it
    /// and requires all of the results
    pub(crate) fn build(&self, check: &Check) -> Result<QueryNode> {
        let mut operands = vec![self.collect_operand(&check.head)?];
        let mut results = Vec::with_capacity(check.chain.len());

        for link in &check.chain {
            let info = token::parse_proximity(&link.op.image).ok_or_else(|| {
                CompileError::syntax(
                    link.op.start,
                    format!("malformed proximity operator `{}`", link.op.image),
                )
            })?;
            let right = self.collect_operand(&link.operand)?;
            let left = Distributable::all_of(operands.clone());
            trace!(?info, "distributing proximity");
            results.push(self.distribute(&left, &right, &info)?);
            operands.push(right);
        }

        Ok(QueryNode::and(results))
    }

    fn collect_check(&self, check: &Check) -> Result<Distributable> {
        let Some(first) = check.chain.first() else {
            return self.collect_operand(&check.head);
        };

        let occur = match first.op.kind {
            // parenthesised proximity is resolved on its own first
            OperatorKind::Proximity => {
                return Ok(Distributable::from_query(self.build(check)?));
            }
            OperatorKind::And => Occur::Must,
            OperatorKind::Or => Occur::Should,
            OperatorKind::AndNot => Occur::MustNot,
        };

        let head_occur = if occur == Occur::MustNot { Occur::Must } else { occur };
        let mut clauses = vec![Clause::new(head_occur, self.collect_operand(&check.head)?)];
        for link in &check.chain {
            clauses.push(Clause::new(occur, self.collect_operand(&link.operand)?));
        }
        Ok(Distributable::group(clauses))
    }

    fn collect_operand(&self, operand: &Operand) -> Result<Distributable> {
        let basic = match operand {
            Operand::Check(check) => return self.collect_check(check),
            Operand::Basic(basic) => basic,
        };

        let occur = match self.builder.config.default_operator {
            DefaultOperator::And => Occur::Must,
            DefaultOperator::Or => Occur::Should,
        };
        let clauses = basic
            .units
            .iter()
            .map(|unit| Ok(Clause::new(occur, self.collect_unit(unit)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Distributable::group(clauses))
    }

    fn collect_unit(&self, unit: &Unit) -> Result<Distributable> {
        match unit {
            Unit::Paren(inner) => self.collect_check(inner),
            Unit::Field(search) => {
                let config = self.builder.config;
                let what = if search.fields.iter().any(|f| config.is_date_field(f)) {
                    "a date search"
                } else {
                    "a field search"
                };
                Err(CompileError::ProximityScope(what.to_string()))
            }
            Unit::Token(token) => match token.kind {
                SearchKind::MatchAll => Err(CompileError::ProximityScope(
                    "a match-all search".to_string(),
                )),
                SearchKind::Range => Err(CompileError::ProximityScope(
                    "a range search".to_string(),
                )),
                _ => Ok(Distributable::Leaf(
                    self.builder.token_query(token, self.field)?,
                )),
            },
        }
    }

    pub(crate) fn distribute(
        &self,
        left: &Distributable,
        right: &Distributable,
        info: &ProxOperator,
    ) -> Result<QueryNode> {
        match (left, right) {
            (Distributable::Leaf(a), Distributable::Leaf(b)) => self.near(a, b, info),
            (Distributable::Group(clauses), _) => {
                self.fan_out(clauses, |item| self.distribute(item, right, info))
            }
            (Distributable::Leaf(_), Distributable::Group(clauses)) => {
                self.fan_out(clauses, |item| self.distribute(left, item, info))
            }
        }
    }

    /// Distribute over each clause of a group and recombine with the group's
    /// connectors
    fn fan_out(
        &self,
        clauses: &[Clause],
        mut distribute: impl FnMut(&Distributable) -> Result<QueryNode>,
    ) -> Result<QueryNode> {
        let mut must = Vec::new();
        let mut should = Vec::new();
        let mut must_not = Vec::new();
        let mut span_run: Vec<QueryNode> = Vec::new();

        for clause in clauses {
            let query = distribute(&clause.item)?;
            if clause.occur == Occur::Should && query.is_span() {
                span_run.push(query);
                continue;
            }
            if !span_run.is_empty() {
                should.push(QueryNode::or(std::mem::take(&mut span_run)));
            }
            match clause.occur {
                Occur::Must => must.push(query),
                Occur::Should => should.push(query),
                Occur::MustNot => must_not.push(query),
            }
        }
        if !span_run.is_empty() {
            should.push(QueryNode::or(span_run));
        }

        if must.is_empty() && must_not.is_empty() {
            return Ok(QueryNode::or(should));
        }
        if !should.is_empty() {
            must.push(QueryNode::or(should));
        }
        Ok(QueryNode::and_not(must, must_not))
    }

    /// Base case between two leaves
    fn near(&self, a: &QueryNode, b: &QueryNode, info: &ProxOperator) -> Result<QueryNode> {
        if a.is_empty() || b.is_empty() {
            return Err(CompileError::ProximityOnStopWord);
        }

        let config = self.builder.config;
        let pair = vec![a.clone(), b.clone()];
        let (near, marker) = match info.unit {
            ProxUnit::Word => (QueryNode::near(pair, info.distance, info.ordered), None),
            ProxUnit::Sentence => (
                QueryNode::near(pair, QueryNode::UNBOUNDED, false),
                Some(config.sentence_marker.as_deref().ok_or_else(|| {
                    CompileError::Configuration(
                        "sentence proximity needs a sentence marker".to_string(),
                    )
                })?),
            ),
            ProxUnit::Paragraph => (
                QueryNode::near(pair, QueryNode::UNBOUNDED, false),
                Some(config.paragraph_marker.as_deref().ok_or_else(|| {
                    CompileError::Configuration(
                        "paragraph proximity needs a paragraph marker".to_string(),
                    )
                })?),
            ),
        };

        let near = match &config.field_break_marker {
            Some(field_break) => QueryNode::within(near, QueryNode::term(self.field, field_break), 0),
            None => near,
        };

        Ok(match marker {
            Some(marker) => QueryNode::within(near, QueryNode::term(self.field, marker), info.distance),
            None => near,
        })
    }
}
