//! Rewrite pass: turns the first parse into canonical query text.
//!
//! Adjacent units get the default operator between them, tokens go through
//! the regex and find/replace tables, numeric tokens in padded fields are
//! zero-padded, and date field text is copied through untouched. The output
//! is parsed again, so a replacement may introduce operators or groups.

use crate::config::{Configuration, RegexRule};
use crate::error::Result;
use crate::query::lexer::SearchKind;
use crate::query::parser::{BasicSearch, Check, FieldSearch, Operand, Search, SearchToken, Unit};
use crate::query::suggest::SuggestionBuilder;
use crate::query::token;
use regex::Regex;
use tracing::{debug, trace};

/// A [`RegexRule`] with its pattern compiled
#[derive(Debug, Clone)]
pub struct CompiledRule {
    regex: Regex,
    replace: String,
    field: Option<String>,
    is_operator: bool,
}

impl CompiledRule {
    pub fn new(rule: &RegexRule) -> Result<Self> {
        Ok(Self {
            regex: rule.compile()?,
            replace: rule.replace.clone(),
            field: rule.field.clone(),
            is_operator: rule.is_operator,
        })
    }

    pub fn compile_all(rules: &[RegexRule]) -> Result<Vec<Self>> {
        rules.iter().map(Self::new).collect()
    }
}

/// Output of the rewrite pass
#[derive(Debug, Clone)]
pub struct Rewritten {
    pub text: String,
    pub suggestion: Option<SuggestionBuilder>,
}

pub struct Rewriter<'a> {
    config: &'a Configuration,
    rules: &'a [CompiledRule],
    /// Field lists of enclosing field searches, innermost last
    scopes: Vec<&'a [String]>,
    suggestion: Option<SuggestionBuilder>,
}

impl<'a> Rewriter<'a> {
    pub fn new(config: &'a Configuration, rules: &'a [CompiledRule]) -> Self {
        Self {
            config,
            rules,
            scopes: Vec::new(),
            suggestion: None,
        }
    }

    /// Also record a suggestion template while rewriting
    pub fn with_suggestions(mut self) -> Self {
        self.suggestion = Some(SuggestionBuilder::new());
        self
    }

    pub fn rewrite(mut self, search: &'a Search) -> Rewritten {
        let text = self.check(&search.root);
        debug!(rewritten = %text, "rewrote query");
        Rewritten {
            text,
            suggestion: self.suggestion,
        }
    }

    fn check(&mut self, check: &'a Check) -> String {
        let mut out = self.operand(&check.head);
        for link in &check.chain {
            let op = format!(" {} ", link.op.image);
            self.text(&op);
            out.push_str(&op);
            out.push_str(&self.operand(&link.operand));
        }
        out
    }

    fn operand(&mut self, operand: &'a Operand) -> String {
        match operand {
            Operand::Check(check) => self.check(check),
            Operand::Basic(basic) => self.basic(basic),
        }
    }

    fn basic(&mut self, basic: &'a BasicSearch) -> String {
        let mut out = String::new();
        let mut last_was_operator = false;

        for (i, unit) in basic.units.iter().enumerate() {
            if i > 0 {
                self.text(" ");
            }
            let (text, is_operator) = self.unit(unit);
            if i > 0 {
                // no default operator next to a token that became an operator
                if is_operator || last_was_operator {
                    out.push(' ');
                } else {
                    out.push(' ');
                    out.push_str(self.config.default_operator.symbol());
                    out.push(' ');
                }
            }
            out.push_str(&text);
            last_was_operator = is_operator;
        }

        out
    }

    /// Rewritten unit text and whether it is an operator replacement
    fn unit(&mut self, unit: &'a Unit) -> (String, bool) {
        match unit {
            Unit::Field(field) => (self.field(field), false),
            Unit::Paren(inner) => {
                self.text("(");
                let text = format!("({})", self.check(inner));
                self.text(")");
                (text, false)
            }
            Unit::Token(token) => self.token(token),
        }
    }

    fn field(&mut self, search: &'a FieldSearch) -> String {
        let list = search.fields.join(",");

        if search.fields.iter().any(|f| self.config.is_date_field(f)) {
            let text = format!("{}({})", list, search.raw);
            self.text(&text);
            return text;
        }

        self.text(&format!("{}(", list));
        self.scopes.push(&search.fields);
        let inner = self.check(&search.body);
        self.scopes.pop();
        self.text(")");

        format!("{}({})", list, inner)
    }

    fn token(&mut self, token: &SearchToken) -> (String, bool) {
        if token.kind == SearchKind::Range {
            let text = self.pad_range(&token.image);
            self.text(&text);
            return (text, false);
        }

        let (text, is_operator) = self.replace(token.image.trim());
        if is_operator {
            self.text(&text);
            return (text, true);
        }

        if token.kind == SearchKind::Term {
            let text = self.pad(&text);
            if let Some(suggestion) = self.suggestion.as_mut() {
                suggestion.push_slot(text.as_str());
            }
            (text, false)
        } else {
            self.text(&text);
            (text, false)
        }
    }

    /// Apply the first matching regex rule, then the synonym table or, failing
    /// that, the thesaurus
    fn replace(&self, token: &str) -> (String, bool) {
        let mut text = token.to_string();
        let mut is_operator = false;

        if let Some(rule) = self
            .rules
            .iter()
            .find(|rule| self.in_scope(rule.field.as_deref()) && rule.regex.is_match(&text))
        {
            text = rule.regex.replace(&text, rule.replace.as_str()).into_owned();
            is_operator = rule.is_operator;
            trace!(token, replaced = %text, "regex rule applied");
        }

        let key = text.to_lowercase();
        let table_hit = [&self.config.synonyms, &self.config.thesaurus]
            .into_iter()
            .filter_map(|table| table.get(&key))
            .find(|rule| self.in_scope(rule.field.as_deref()) && rule.apply(&text).is_some());
        if let Some(rule) = table_hit {
            trace!(token = %text, replaced = %rule.replace, "find/replace applied");
            text = rule.replace.clone();
            is_operator |= rule.is_operator;
        }

        (text, is_operator)
    }

    fn in_scope(&self, field: Option<&str>) -> bool {
        let Some(field) = field else {
            return true;
        };
        self.scopes.last().is_some_and(|names| {
            names
                .iter()
                .any(|name| name == field || self.config.map_field(name) == field)
        })
    }

    fn pad_width(&self) -> Option<usize> {
        self.scopes
            .last()?
            .iter()
            .find_map(|name| self.config.pad_width(name))
    }

    fn pad(&self, text: &str) -> String {
        match self.pad_width() {
            Some(width) => token::zero_pad(text, width).unwrap_or_else(|| text.to_string()),
            None => text.to_string(),
        }
    }

    fn pad_range(&self, image: &str) -> String {
        let Some(width) = self.pad_width() else {
            return image.to_string();
        };
        match token::parse_range(image) {
            Some(parts) => {
                parts.render(|bound| token::zero_pad(bound, width).unwrap_or_else(|| bound.to_string()))
            }
            None => image.to_string(),
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(suggestion) = self.suggestion.as_mut() {
            suggestion.push_text(text);
        }
    }
}
