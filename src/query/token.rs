//! Search-token images: escapes, quoted phrases, ranges, boosts,
//! proximity operators and zero padding.

/// Unit a proximity distance is counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxUnit {
    Word,
    Sentence,
    Paragraph,
}

/// Parsed `[ord|pre]~[n][s|p]` operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxOperator {
    pub ordered: bool,
    pub distance: u32,
    pub unit: ProxUnit,
}

/// `"text"[:slop][^boost]`
#[derive(Debug, Clone, PartialEq)]
pub struct Quoted<'a> {
    pub text: &'a str,
    pub slop: u32,
    pub boost: f32,
}

/// `[lo TO hi]`, `{lo RNG hi}` or `lo RNG hi`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeParts<'a> {
    pub open: Option<char>,
    pub lo: &'a str,
    pub keyword: &'a str,
    pub hi: &'a str,
    pub close: Option<char>,
}

impl RangeParts<'_> {
    pub fn inclusive_lo(&self) -> bool {
        self.open == Some('[')
    }

    pub fn inclusive_hi(&self) -> bool {
        self.close == Some(']')
    }

    /// Re-emit the range with both bounds passed through `map`
    pub fn render(&self, map: impl Fn(&str) -> String) -> String {
        let mut out = String::new();
        if let Some(open) = self.open {
            out.push(open);
        }
        out.push_str(&map(self.lo));
        out.push(' ');
        out.push_str(self.keyword);
        out.push(' ');
        out.push_str(&map(self.hi));
        if let Some(close) = self.close {
            out.push(close);
        }
        out
    }
}

const RANGE_KEYWORDS: [&str; 3] = [" TO ", " RNG ", " rng "];

/// Drop escaping backslashes: `m\&m` becomes `m&m`
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Whether `ch` occurs in `text` outside an escape
pub fn contains_unescaped(text: &str, targets: &[char]) -> bool {
    let mut escaped = false;
    for ch in text.chars() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if targets.contains(&ch) {
            return true;
        }
    }
    false
}

/// `\d+(\.\d+)?`
fn parse_boost(text: &str) -> Option<f32> {
    let (int, frac) = match text.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (text, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(int) || frac.is_some_and(|f| !digits(f)) {
        return None;
    }
    text.parse().ok()
}

pub fn parse_quoted(image: &str) -> Option<Quoted<'_>> {
    let rest = image.strip_prefix('"')?;
    let close = rest.rfind('"')?;
    let text = &rest[..close];
    let mut suffix = &rest[close + 1..];

    let mut boost = 1.0;
    if let Some((head, value)) = suffix.split_once('^') {
        boost = parse_boost(value)?;
        suffix = head;
    }

    let slop = if suffix.is_empty() {
        0
    } else {
        let digits = suffix.strip_prefix(':')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()?
    };

    Some(Quoted { text, slop, boost })
}

pub fn parse_range(image: &str) -> Option<RangeParts<'_>> {
    let (open, body) = match image.chars().next() {
        Some(c @ ('[' | '{')) => (Some(c), &image[1..]),
        _ => (None, image),
    };
    let (body, close) = match body.chars().last() {
        Some(c @ (']' | '}')) => (&body[..body.len() - 1], Some(c)),
        _ => (body, None),
    };

    let (at, keyword) = RANGE_KEYWORDS
        .iter()
        .filter_map(|kw| body.find(kw).map(|at| (at, *kw)))
        .min_by_key(|(at, _)| *at)?;

    let lo = body[..at].trim();
    let hi = body[at + keyword.len()..].trim();
    if lo.is_empty() || hi.is_empty() {
        return None;
    }

    Some(RangeParts {
        open,
        lo,
        keyword: keyword.trim(),
        hi,
        close,
    })
}

/// Whether a bare word is a range keyword
pub fn is_range_keyword(word: &str) -> bool {
    RANGE_KEYWORDS.iter().any(|kw| kw.trim() == word)
}

/// `term^2.5` into `("term", 2.5)`
pub fn split_boost(image: &str) -> Option<(&str, f32)> {
    let (text, value) = image.rsplit_once('^')?;
    if text.is_empty() || text.ends_with('\\') {
        return None;
    }
    Some((text, parse_boost(value)?))
}

pub fn is_fuzzy(image: &str) -> bool {
    image.len() > 1 && image.ends_with('`') && !image.ends_with("\\`")
}

pub fn is_wildcard(image: &str) -> bool {
    contains_unescaped(image, &['*', '?'])
}

/// `[ord|pre]~[n][s|p]`, case-insensitive; distance defaults to 1
pub fn parse_proximity(image: &str) -> Option<ProxOperator> {
    let lower = image.to_ascii_lowercase();
    let (ordered, rest) = match lower.strip_prefix("ord").or_else(|| lower.strip_prefix("pre")) {
        Some(rest) => (true, rest),
        None => (false, lower.as_str()),
    };
    let rest = rest.strip_prefix('~')?;

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (digits, unit) = rest.split_at(digits_end);
    let unit = match unit {
        "" => ProxUnit::Word,
        "s" => ProxUnit::Sentence,
        "p" => ProxUnit::Paragraph,
        _ => return None,
    };
    let distance = if digits.is_empty() {
        1
    } else {
        digits.parse().ok()?
    };

    Some(ProxOperator {
        ordered,
        distance,
        unit,
    })
}

/// Fixed-width, zero-padded rendering of a numeric token; `None` if the
/// token is not a plain decimal number. Fractions round half to even and
/// the digits are never truncated, however long.
pub fn zero_pad(token: &str, width: usize) -> Option<String> {
    let trimmed = token.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }

    let mut digits: Vec<u8> = int_part.bytes().skip_while(|b| *b == b'0').collect();
    let frac = frac_part.as_bytes();
    let round_up = match frac.first() {
        Some(b'6'..=b'9') => true,
        Some(b'5') => {
            frac[1..].iter().any(|b| *b != b'0')
                || digits.last().is_some_and(|d| (d - b'0') % 2 == 1)
        }
        _ => false,
    };
    if round_up {
        increment(&mut digits);
    }
    if digits.is_empty() {
        digits.push(b'0');
    }

    let body: String = digits.iter().map(|b| char::from(*b)).collect();
    let sign = if negative && body.bytes().any(|b| b != b'0') { "-" } else { "" };
    Some(format!("{}{:0>width$}", sign, body, width = width))
}

/// Add one to a big-endian ASCII digit string
fn increment(digits: &mut Vec<u8>) {
    for d in digits.iter_mut().rev() {
        if *d == b'9' {
            *d = b'0';
        } else {
            *d += 1;
            return;
        }
    }
    digits.insert(0, b'1');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"m\&m's"), "m&m's");
        assert_eq!(unescape(r"a\\b"), r"a\b");
        assert_eq!(unescape("plain"), "plain");
    }

    #[test]
    fn test_quoted() {
        let q = parse_quoted("\"big time\"").unwrap();
        assert_eq!((q.text, q.slop, q.boost), ("big time", 0, 1.0));

        let q = parse_quoted("\"big time\":2").unwrap();
        assert_eq!(q.slop, 2);

        let q = parse_quoted("\"big time\":3^4.5").unwrap();
        assert_eq!((q.slop, q.boost), (3, 4.5));

        assert!(parse_quoted("\"x\":").is_none());
        assert!(parse_quoted("\"x\"^abc").is_none());
    }

    #[test]
    fn test_range() {
        let r = parse_range("[85 TO 86}").unwrap();
        assert_eq!((r.lo, r.hi, r.keyword), ("85", "86", "TO"));
        assert!(r.inclusive_lo());
        assert!(!r.inclusive_hi());

        let r = parse_range("6 rng 10").unwrap();
        assert_eq!(r.open, None);
        assert!(!r.inclusive_lo());
        assert_eq!(r.render(|s| format!("0{}", s)), "06 rng 010");

        assert!(parse_range("[85 86]").is_none());
    }

    #[test]
    fn test_boost() {
        assert_eq!(split_boost("grape^4"), Some(("grape", 4.0)));
        assert_eq!(split_boost("grape^1.5"), Some(("grape", 1.5)));
        assert_eq!(split_boost("grape^x"), None);
        assert_eq!(split_boost("^4"), None);
    }

    #[test]
    fn test_proximity() {
        let p = parse_proximity("~").unwrap();
        assert_eq!((p.ordered, p.distance, p.unit), (false, 1, ProxUnit::Word));

        let p = parse_proximity("ORD~3p").unwrap();
        assert_eq!((p.ordered, p.distance, p.unit), (true, 3, ProxUnit::Paragraph));

        let p = parse_proximity("pre~12s").unwrap();
        assert_eq!((p.ordered, p.distance, p.unit), (true, 12, ProxUnit::Sentence));

        assert!(parse_proximity("~3x").is_none());
        assert!(parse_proximity("3").is_none());
    }

    #[test]
    fn test_wildcard_and_fuzzy() {
        assert!(is_wildcard("f*x"));
        assert!(is_wildcard("7.33?"));
        assert!(!is_wildcard(r"f\*x"));
        assert!(is_fuzzy("fox`"));
        assert!(!is_fuzzy("`"));
    }

    #[test]
    fn test_zero_pad() {
        assert_eq!(zero_pad("45", 6).as_deref(), Some("000045"));
        assert_eq!(zero_pad("045", 6).as_deref(), Some("000045"));
        assert_eq!(zero_pad("2.5", 3).as_deref(), Some("002"));
        assert_eq!(zero_pad("-45", 6).as_deref(), Some("-000045"));
        assert_eq!(zero_pad("abc", 6), None);
        assert_eq!(zero_pad("1234567", 6).as_deref(), Some("1234567"));
    }

    #[test]
    fn test_zero_pad_rounding_and_size() {
        assert_eq!(zero_pad("3.5", 3).as_deref(), Some("004"));
        assert_eq!(zero_pad("2.51", 3).as_deref(), Some("003"));
        assert_eq!(zero_pad("0.5", 2).as_deref(), Some("00"));
        assert_eq!(zero_pad("-0.4", 2).as_deref(), Some("00"));
        assert_eq!(zero_pad("999.9", 2).as_deref(), Some("1000"));
        assert_eq!(zero_pad(".7", 3).as_deref(), Some("001"));
        assert_eq!(
            zero_pad("99999999999999999999999", 6).as_deref(),
            Some("99999999999999999999999")
        );
        assert_eq!(zero_pad(".", 3), None);
        assert_eq!(zero_pad("1.2.3", 3), None);
    }
}
