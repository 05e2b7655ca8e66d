//! The query algebra produced by compilation.
//!
//! Trees are built bottom-up and never mutated afterwards. Boolean
//! constructors ([`QueryNode::and`], [`QueryNode::or`], [`QueryNode::and_not`])
//! drop [`QueryNode::Empty`] operands so that `Empty` only ever appears as a
//! whole result, never as a child.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Compiled query tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryNode {
    /// Single index term
    Term {
        field: String,
        text: String,
        boost: f32,
    },
    /// Ordered terms with a shared positional slack
    Phrase {
        field: String,
        terms: Vec<String>,
        slop: u32,
        boost: f32,
    },
    /// Pattern with `*` and `?`
    Wildcard { field: String, pattern: String },
    /// Edit-distance match
    Fuzzy { field: String, text: String },
    /// Term range; a missing bound is open-ended
    Range {
        field: String,
        lo: Option<String>,
        hi: Option<String>,
        inclusive_lo: bool,
        inclusive_hi: bool,
    },
    /// Matches every document
    MatchAll,
    /// Children must occur within `distance` positions of each other
    Near {
        children: Vec<QueryNode>,
        distance: u32,
        ordered: bool,
        boost: f32,
    },
    /// Any child
    Or(Vec<QueryNode>),
    /// Every child
    And(Vec<QueryNode>),
    /// Every positive child and none of the negative ones
    AndNot {
        positive: Vec<QueryNode>,
        negative: Vec<QueryNode>,
    },
    /// `include` spans that overlap `exclude` at most `max_overlaps` times
    Within {
        include: Box<QueryNode>,
        exclude: Box<QueryNode>,
        max_overlaps: u32,
    },
    /// One clause per field name, any of which may match
    FieldGroup {
        fields: Vec<String>,
        clauses: Vec<QueryNode>,
    },
    /// Nothing left to search for
    Empty,
}

impl QueryNode {
    /// Distance used for "anywhere in the same unit" nearness
    pub const UNBOUNDED: u32 = u32::MAX;

    pub fn term(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::boosted_term(field, text, 1.0)
    }

    pub fn boosted_term(field: impl Into<String>, text: impl Into<String>, boost: f32) -> Self {
        QueryNode::Term {
            field: field.into(),
            text: text.into(),
            boost,
        }
    }

    pub fn phrase<S: Into<String>>(
        field: impl Into<String>,
        terms: impl IntoIterator<Item = S>,
        slop: u32,
    ) -> Self {
        QueryNode::Phrase {
            field: field.into(),
            terms: terms.into_iter().map(Into::into).collect(),
            slop,
            boost: 1.0,
        }
    }

    pub fn near(children: Vec<QueryNode>, distance: u32, ordered: bool) -> Self {
        QueryNode::Near {
            children,
            distance,
            ordered,
            boost: 1.0,
        }
    }

    pub fn within(include: QueryNode, exclude: QueryNode, max_overlaps: u32) -> Self {
        QueryNode::Within {
            include: Box::new(include),
            exclude: Box::new(exclude),
            max_overlaps,
        }
    }

    /// Conjunction with `Empty` children removed; collapses to the single
    /// remaining child or to `Empty`
    pub fn and(children: Vec<QueryNode>) -> Self {
        let mut children = without_empty(children);
        match children.len() {
            0 => QueryNode::Empty,
            1 => children.swap_remove(0),
            _ => QueryNode::And(children),
        }
    }

    /// Disjunction with `Empty` children removed
    pub fn or(children: Vec<QueryNode>) -> Self {
        let mut children = without_empty(children);
        match children.len() {
            0 => QueryNode::Empty,
            1 => children.swap_remove(0),
            _ => QueryNode::Or(children),
        }
    }

    /// Exclusion; with no positive clause left there is nothing to exclude from
    pub fn and_not(positive: Vec<QueryNode>, negative: Vec<QueryNode>) -> Self {
        let mut positive = without_empty(positive);
        let negative = without_empty(negative);
        if positive.is_empty() {
            return QueryNode::Empty;
        }
        if negative.is_empty() {
            return if positive.len() == 1 {
                positive.swap_remove(0)
            } else {
                QueryNode::And(positive)
            };
        }
        QueryNode::AndNot { positive, negative }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, QueryNode::Empty)
    }

    /// Whether the node is a positional constraint that can sit inside `Near`.
    /// An `Or` counts when all of its children do.
    pub fn is_span(&self) -> bool {
        match self {
            QueryNode::Term { .. }
            | QueryNode::Phrase { .. }
            | QueryNode::Wildcard { .. }
            | QueryNode::Fuzzy { .. }
            | QueryNode::Near { .. }
            | QueryNode::Within { .. } => true,
            QueryNode::Or(children) => !children.is_empty() && children.iter().all(Self::is_span),
            _ => false,
        }
    }

    fn is_compound(&self) -> bool {
        match self {
            QueryNode::And(_) | QueryNode::Or(_) | QueryNode::AndNot { .. } => true,
            QueryNode::FieldGroup { clauses, .. } => clauses.len() > 1,
            _ => false,
        }
    }
}

fn without_empty(children: Vec<QueryNode>) -> Vec<QueryNode> {
    children.into_iter().filter(|c| !c.is_empty()).collect()
}

fn write_boost(f: &mut fmt::Formatter<'_>, boost: f32) -> fmt::Result {
    if boost != 1.0 {
        write!(f, "^{}", boost)?;
    }
    Ok(())
}

/// Writes a boolean clause, parenthesizing nested compounds
fn write_clause(f: &mut fmt::Formatter<'_>, prefix: &str, node: &QueryNode) -> fmt::Result {
    if node.is_compound() {
        write!(f, "{}({})", prefix, node)
    } else {
        write!(f, "{}{}", prefix, node)
    }
}

fn write_clauses(f: &mut fmt::Formatter<'_>, clauses: &[(&str, &QueryNode)]) -> fmt::Result {
    for (i, (prefix, node)) in clauses.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write_clause(f, prefix, node)?;
    }
    Ok(())
}

/// Span children render `Or` as `or([..])` so nesting stays readable
fn write_span(f: &mut fmt::Formatter<'_>, node: &QueryNode) -> fmt::Result {
    match node {
        QueryNode::Or(children) => {
            f.write_str("or([")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_span(f, child)?;
            }
            f.write_str("])")
        }
        other => write!(f, "{}", other),
    }
}

/// Lucene-like rendering: `+a +b`, `a b`, `+a -b`, `field:"x y"~2`
impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Term { field, text, boost } => {
                write!(f, "{}:{}", field, text)?;
                write_boost(f, *boost)
            }
            QueryNode::Phrase {
                field,
                terms,
                slop,
                boost,
            } => {
                write!(f, "{}:\"{}\"", field, terms.join(" "))?;
                if *slop > 0 {
                    write!(f, "~{}", slop)?;
                }
                write_boost(f, *boost)
            }
            QueryNode::Wildcard { field, pattern } => write!(f, "{}:{}", field, pattern),
            QueryNode::Fuzzy { field, text } => write!(f, "{}:{}~", field, text),
            QueryNode::Range {
                field,
                lo,
                hi,
                inclusive_lo,
                inclusive_hi,
            } => write!(
                f,
                "{}:{}{} TO {}{}",
                field,
                if *inclusive_lo { '[' } else { '{' },
                lo.as_deref().unwrap_or("*"),
                hi.as_deref().unwrap_or("*"),
                if *inclusive_hi { ']' } else { '}' },
            ),
            QueryNode::MatchAll => f.write_str("*:*"),
            QueryNode::Near {
                children,
                distance,
                ordered,
                boost,
            } => {
                f.write_str("near([")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_span(f, child)?;
                }
                f.write_str("], ")?;
                if *distance == Self::UNBOUNDED {
                    f.write_str("inf")?;
                } else {
                    write!(f, "{}", distance)?;
                }
                f.write_str(if *ordered { ", ordered)" } else { ")" })?;
                write_boost(f, *boost)
            }
            QueryNode::Or(children) => {
                let clauses: Vec<_> = children.iter().map(|c| ("", c)).collect();
                write_clauses(f, &clauses)
            }
            QueryNode::And(children) => {
                let clauses: Vec<_> = children.iter().map(|c| ("+", c)).collect();
                write_clauses(f, &clauses)
            }
            QueryNode::AndNot { positive, negative } => {
                let clauses: Vec<_> = positive
                    .iter()
                    .map(|c| ("+", c))
                    .chain(negative.iter().map(|c| ("-", c)))
                    .collect();
                write_clauses(f, &clauses)
            }
            QueryNode::Within {
                include,
                exclude,
                max_overlaps,
            } => {
                f.write_str("within(")?;
                write_span(f, include)?;
                f.write_str(", ")?;
                write_span(f, exclude)?;
                write!(f, ", {})", max_overlaps)
            }
            QueryNode::FieldGroup { clauses, .. } => {
                let clauses: Vec<_> = clauses.iter().map(|c| ("", c)).collect();
                write_clauses(f, &clauses)
            }
            QueryNode::Empty => Ok(()),
        }
    }
}
