//! Terminal rendering of compiled queries and compile errors

use crate::error::CompileError;
use crate::query::{Compiled, QueryNode};
use std::io;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print a compiled query as an indented tree, optionally preceded by the
/// rewritten query text
pub fn print_compiled(compiled: &Compiled, show_rewrite: bool, choice: ColorChoice) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(choice);
    write_compiled(&mut stdout, compiled, show_rewrite)
}

pub fn write_compiled<W: WriteColor>(out: &mut W, compiled: &Compiled, show_rewrite: bool) -> io::Result<()> {
    if show_rewrite {
        write_label(out, "rewritten: ", Color::Cyan)?;
        writeln!(out, "{}", compiled.rewritten())?;
    }
    if let Some(suggested) = compiled.suggested_search() {
        write_label(out, "did you mean: ", Color::Yellow)?;
        writeln!(out, "{}", suggested)?;
    }
    write_tree(out, compiled.query(), 0)?;
    Ok(())
}

/// One node per line, children indented by two spaces
pub fn write_tree<W: WriteColor>(out: &mut W, node: &QueryNode, depth: usize) -> io::Result<()> {
    write_node(out, "", node, depth)
}

fn write_node<W: WriteColor>(out: &mut W, prefix: &str, node: &QueryNode, depth: usize) -> io::Result<()> {
    write!(out, "{:indent$}{}", "", prefix, indent = depth * 2)?;

    match node {
        QueryNode::And(children) => {
            write_operator(out, "and")?;
            for child in children {
                write_node(out, "", child, depth + 1)?;
            }
        }
        QueryNode::Or(children) => {
            write_operator(out, "or")?;
            for child in children {
                write_node(out, "", child, depth + 1)?;
            }
        }
        QueryNode::AndNot { positive, negative } => {
            write_operator(out, "and-not")?;
            for child in positive {
                write_node(out, "+ ", child, depth + 1)?;
            }
            for child in negative {
                write_node(out, "- ", child, depth + 1)?;
            }
        }
        QueryNode::Near {
            children,
            distance,
            ordered,
            boost,
        } => {
            let distance = if *distance == QueryNode::UNBOUNDED {
                "inf".to_string()
            } else {
                distance.to_string()
            };
            let mut label = format!("near {}", distance);
            if *ordered {
                label.push_str(" ordered");
            }
            if *boost != 1.0 {
                label.push_str(&format!(" ^{}", boost));
            }
            write_operator(out, &label)?;
            for child in children {
                write_node(out, "", child, depth + 1)?;
            }
        }
        QueryNode::Within {
            include,
            exclude,
            max_overlaps,
        } => {
            write_operator(out, &format!("within {}", max_overlaps))?;
            write_node(out, "", include, depth + 1)?;
            write_node(out, "excluding ", exclude, depth + 1)?;
        }
        QueryNode::FieldGroup { fields, clauses } => {
            write_operator(out, &format!("fields {}", fields.join(",")))?;
            for clause in clauses {
                write_node(out, "", clause, depth + 1)?;
            }
        }
        leaf => {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(out, "{}", leaf)?;
            out.reset()?;
            writeln!(out)?;
        }
    }

    Ok(())
}

fn write_operator<W: WriteColor>(out: &mut W, label: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    write!(out, "{}", label)?;
    out.reset()?;
    writeln!(out)
}

fn write_label<W: WriteColor>(out: &mut W, label: &str, color: Color) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)))?;
    write!(out, "{}", label)?;
    out.reset()
}

/// Print a compile error to stderr; syntax errors get a caret under the
/// offending byte
pub fn print_error(err: &CompileError, query: &str, choice: ColorChoice) -> io::Result<()> {
    let mut stderr = StandardStream::stderr(choice);
    write_error(&mut stderr, err, query)
}

pub fn write_error<W: WriteColor>(out: &mut W, err: &CompileError, query: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
    write!(out, "error[{}]", err.code())?;
    out.reset()?;
    writeln!(out, ": {}", err)?;

    if let CompileError::Syntax { position, .. } = err {
        if *position <= query.len() {
            writeln!(out, "  {}", query)?;
            let column = query
                .get(..*position)
                .map(|prefix| prefix.chars().count())
                .unwrap_or(*position);
            out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
            writeln!(out, "  {:width$}^", "", width = column)?;
            out.reset()?;
        }
    }

    Ok(())
}
