//! Compiler configuration.
//!
//! A [`Configuration`] is plain data: operator precedence, hidden operators,
//! find/replace tables, field mappings, zero padding, date fields, markers
//! and the date locale. It is read-only during a compile and can be loaded
//! from JSON.

use crate::error::{CompileError, Result};
use regex::RegexBuilder;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Widest zero-pad width accepted
const MAX_PAD_WIDTH: usize = 32;

/// Parenthesis and field-search depth allowed by default
pub const DEFAULT_MAX_NESTING: usize = 32;

/// Upper bound for `max_nesting`; every pass recurses once per level
const NESTING_LIMIT: usize = 128;

/// The four operators of the query language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    Or,
    And,
    Proximity,
    AndNot,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 4] = [
        OperatorKind::Or,
        OperatorKind::And,
        OperatorKind::Proximity,
        OperatorKind::AndNot,
    ];

    /// Canonical symbol in the query syntax
    pub fn symbol(self) -> &'static str {
        match self {
            OperatorKind::Or => "|",
            OperatorKind::And => "&",
            OperatorKind::Proximity => "~",
            OperatorKind::AndNot => "!",
        }
    }
}

/// Operator inserted between adjacent search units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultOperator {
    #[default]
    And,
    Or,
}

impl DefaultOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            DefaultOperator::And => "&",
            DefaultOperator::Or => "|",
        }
    }
}

/// Short date layout used when parsing date fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateLocale {
    /// M/D/Y
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    /// D/M/Y
    #[serde(rename = "en-GB")]
    EnGb,
    /// D.M.Y
    #[serde(rename = "de")]
    De,
    /// Y/M/D
    #[serde(rename = "ja")]
    Ja,
}

/// Literal token replacement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindReplace {
    pub find: String,
    pub replace: String,
    #[serde(default)]
    pub case_sensitive: bool,
    /// The replacement is itself an operator, so no default operator is
    /// inserted around it
    #[serde(default)]
    pub is_operator: bool,
    /// Only applies to tokens inside a search on this field
    #[serde(default)]
    pub field: Option<String>,
}

impl FindReplace {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
            case_sensitive: false,
            is_operator: false,
            field: None,
        }
    }

    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    pub fn for_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Replacement for `token`, honouring case sensitivity
    pub fn apply(&self, token: &str) -> Option<&str> {
        if self.case_sensitive && token != self.find {
            return None;
        }
        Some(&self.replace)
    }
}

/// Regex token replacement. The pattern must match the whole token;
/// `$1`-style group references are expanded in `replace`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexRule {
    pub pattern: String,
    pub replace: String,
    /// Only applies to tokens inside a search on this field
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub is_operator: bool,
    #[serde(default)]
    pub case_insensitive: bool,
}

impl RegexRule {
    pub fn new(pattern: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replace: replace.into(),
            field: None,
            is_operator: false,
            case_insensitive: false,
        }
    }

    pub fn for_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Builds the anchored regex this rule matches tokens with
    pub fn compile(&self) -> Result<regex::Regex> {
        RegexBuilder::new(&format!("^(?:{})$", self.pattern))
            .case_insensitive(self.case_insensitive)
            .build()
            .map_err(|e| CompileError::InvalidPattern {
                pattern: self.pattern.clone(),
                message: e.to_string(),
            })
    }
}

/// Everything that shapes how a query is compiled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Binding strength per slot, loosest first
    pub precedence: [OperatorKind; 4],
    /// Operators whose symbols are treated as plain text in user input
    pub disabled: FxHashSet<OperatorKind>,
    /// Literal replacements keyed by lowercased token
    pub synonyms: FxHashMap<String, FindReplace>,
    /// Word expansions keyed by lowercased token
    pub thesaurus: FxHashMap<String, FindReplace>,
    /// Regex replacements, tried in order
    pub regex_rules: Vec<RegexRule>,
    pub field_map: FxHashMap<String, String>,
    /// Field name to zero-pad width
    pub zero_pad: FxHashMap<String, usize>,
    pub date_fields: FxHashSet<String>,
    pub default_operator: DefaultOperator,
    pub sentence_marker: Option<String>,
    pub paragraph_marker: Option<String>,
    pub field_break_marker: Option<String>,
    pub locale: DateLocale,
    /// Lowercase wildcard, fuzzy and range terms
    pub lowercase_expanded_terms: bool,
    /// Deepest allowed nesting of parentheses and field searches
    pub max_nesting: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            precedence: OperatorKind::ALL,
            disabled: FxHashSet::default(),
            synonyms: FxHashMap::default(),
            thesaurus: FxHashMap::default(),
            regex_rules: Vec::new(),
            field_map: FxHashMap::default(),
            zero_pad: FxHashMap::default(),
            date_fields: FxHashSet::default(),
            default_operator: DefaultOperator::And,
            sentence_marker: None,
            paragraph_marker: None,
            field_break_marker: None,
            locale: DateLocale::EnUs,
            lowercase_expanded_terms: true,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Configuration = serde_json::from_str(json)
            .map_err(|e| CompileError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the binding order, loosest first
    pub fn set_precedence(&mut self, order: [OperatorKind; 4]) -> &mut Self {
        self.precedence = order;
        self
    }

    /// Zero-based slot of `kind`, 0 = loosest
    pub fn level_of(&self, kind: OperatorKind) -> Option<usize> {
        self.precedence.iter().position(|k| *k == kind)
    }

    pub fn hide_operators(&mut self, or: bool, and: bool, and_not: bool, proximity: bool) -> &mut Self {
        self.disabled.clear();
        for (hide, kind) in [
            (or, OperatorKind::Or),
            (and, OperatorKind::And),
            (and_not, OperatorKind::AndNot),
            (proximity, OperatorKind::Proximity),
        ] {
            if hide {
                self.disabled.insert(kind);
            }
        }
        self
    }

    pub fn is_disabled(&self, kind: OperatorKind) -> bool {
        self.disabled.contains(&kind)
    }

    /// Add an alternative, case-sensitive spelling for an operator, e.g. `AND`
    /// for `&`. Proximity spellings keep the `ord` prefix and the distance/unit
    /// suffix.
    pub fn add_operator(&mut self, kind: OperatorKind, spelling: &str) -> &mut Self {
        match kind {
            OperatorKind::Proximity => {
                self.regex_rules.push(RegexRule {
                    pattern: format!("(ord)?{}(\\d*)([sp])?", regex::escape(spelling)),
                    replace: "${1}~${2}${3}".to_string(),
                    field: None,
                    is_operator: true,
                    case_insensitive: false,
                });
            }
            _ => {
                self.synonyms.insert(
                    spelling.to_lowercase(),
                    FindReplace {
                        find: spelling.to_string(),
                        replace: kind.symbol().to_string(),
                        case_sensitive: true,
                        is_operator: true,
                        field: None,
                    },
                );
            }
        }
        self
    }

    pub fn add_find_replace(&mut self, rule: FindReplace) -> &mut Self {
        self.synonyms.insert(rule.find.to_lowercase(), rule);
        self
    }

    pub fn add_regex_rule(&mut self, rule: RegexRule) -> &mut Self {
        self.regex_rules.push(rule);
        self
    }

    /// Expand `word` into an OR of `words`
    pub fn add_thesaurus_entry<S: AsRef<str>>(
        &mut self,
        word: &str,
        words: impl IntoIterator<Item = S>,
        case_sensitive: bool,
    ) -> &mut Self {
        let expansion = words
            .into_iter()
            .map(|w| w.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(" | ");
        self.thesaurus.insert(
            word.to_lowercase(),
            FindReplace {
                find: word.to_string(),
                replace: format!("({})", expansion),
                case_sensitive,
                is_operator: false,
                field: None,
            },
        );
        self
    }

    pub fn add_field_mapping(&mut self, from: &str, to: &str) -> &mut Self {
        self.field_map.insert(from.to_string(), to.to_string());
        self
    }

    pub fn add_zero_pad_field(&mut self, field: &str, width: usize) -> &mut Self {
        self.zero_pad.insert(field.to_string(), width);
        self
    }

    pub fn mark_date_field(&mut self, field: &str) -> &mut Self {
        self.date_fields.insert(field.to_string());
        self
    }

    pub fn set_default_operator(&mut self, op: DefaultOperator) -> &mut Self {
        self.default_operator = op;
        self
    }

    pub fn set_sentence_marker(&mut self, marker: &str) -> &mut Self {
        self.sentence_marker = Some(marker.to_string());
        self
    }

    pub fn set_paragraph_marker(&mut self, marker: &str) -> &mut Self {
        self.paragraph_marker = Some(marker.to_string());
        self
    }

    pub fn set_field_break_marker(&mut self, marker: &str) -> &mut Self {
        self.field_break_marker = Some(marker.to_string());
        self
    }

    pub fn set_locale(&mut self, locale: DateLocale) -> &mut Self {
        self.locale = locale;
        self
    }

    pub fn set_max_nesting(&mut self, depth: usize) -> &mut Self {
        self.max_nesting = depth;
        self
    }

    /// Field name after mapping
    pub fn map_field<'a>(&'a self, field: &'a str) -> &'a str {
        self.field_map.get(field).map(String::as_str).unwrap_or(field)
    }

    /// Whether `field`, by its own name or after mapping, holds dates
    pub fn is_date_field(&self, field: &str) -> bool {
        self.date_fields.contains(field) || self.date_fields.contains(self.map_field(field))
    }

    /// Zero-pad width for `field`, by its own name or after mapping
    pub fn pad_width(&self, field: &str) -> Option<usize> {
        self.zero_pad
            .get(field)
            .or_else(|| self.zero_pad.get(self.map_field(field)))
            .copied()
    }

    pub fn validate(&self) -> Result<()> {
        for kind in OperatorKind::ALL {
            if self.level_of(kind).is_none() {
                return Err(CompileError::Configuration(format!(
                    "precedence order is missing {:?}",
                    kind
                )));
            }
        }

        if self.max_nesting == 0 || self.max_nesting > NESTING_LIMIT {
            return Err(CompileError::Configuration(format!(
                "max nesting {} must be between 1 and {}",
                self.max_nesting, NESTING_LIMIT
            )));
        }

        for (field, width) in &self.zero_pad {
            if *width == 0 || *width > MAX_PAD_WIDTH {
                return Err(CompileError::Configuration(format!(
                    "zero-pad width {} for field `{}` must be between 1 and {}",
                    width, field, MAX_PAD_WIDTH
                )));
            }
            if self.date_fields.contains(field) {
                return Err(CompileError::Configuration(format!(
                    "field `{}` cannot be both a date field and zero-padded",
                    field
                )));
            }
        }

        for rule in self.synonyms.values().chain(self.thesaurus.values()) {
            if rule.find.trim().is_empty() {
                return Err(CompileError::Configuration(
                    "find/replace rules need a non-empty find term".to_string(),
                ));
            }
        }

        for rule in &self.regex_rules {
            let regex = rule.compile()?;
            // an empty proximity spelling leaves a pattern that matches ""
            if rule.is_operator && regex.is_match("") {
                return Err(CompileError::Configuration(format!(
                    "operator rule `{}` has an empty spelling",
                    rule.pattern
                )));
            }
        }

        Ok(())
    }
}
