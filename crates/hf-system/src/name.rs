//! Species-name normalisation.
//!
//! Chemical names come in several spellings for the same ion: `Fe+2`, `Fe 2+`,
//! `fe+2`, `Fe++`. They all normalise to `fe+2`. Rules:
//!
//! - comparison is case-insensitive and ignores whitespace inside the formula
//! - a trailing `(aq)` is dropped
//! - a separated last token `2+`, `+2`, `++` or `+` is the charge
//! - otherwise a compact suffix `+2` or a run `++` is the charge
//! - `Fe2+` is read as formula `Fe2` with charge +1

use std::fmt;

/// A parsed species name: lower-case formula plus integer charge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpeciesName {
    pub base: String,
    pub charge: i32,
}

impl SpeciesName {
    pub fn parse(raw: &str) -> Self {
        let trimmed = strip_aq(raw.trim());

        if let Some((head, last)) = trimmed.rsplit_once(char::is_whitespace) {
            let head = head.trim();
            if !head.is_empty() {
                if let Some(charge) = parse_charge_token(last) {
                    return Self {
                        base: compact_lower(head),
                        charge,
                    };
                }
            }
        }

        let compact = compact_lower(trimmed);
        let (base, charge) = split_compact_charge(&compact);
        Self {
            base: base.to_string(),
            charge,
        }
    }

    /// Canonical text form (`fe+2`, `so4-2`, `h2o`).
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SpeciesName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.charge {
            0 => write!(f, "{}", self.base),
            z if z > 0 => write!(f, "{}+{}", self.base, z),
            z => write!(f, "{}-{}", self.base, -z),
        }
    }
}

/// Canonical form of a species name, for map keys and comparisons.
pub fn normalize_species_name(raw: &str) -> String {
    SpeciesName::parse(raw).canonical()
}

/// True when `raw` names liquid water.
pub fn is_water_name(raw: &str) -> bool {
    let name = SpeciesName::parse(raw);
    name.charge == 0 && matches!(name.base.as_str(), "h2o" | "h2o(l)")
}

/// True for a bare charge token such as `2+`, `+2`, `-` or `--`.
pub fn is_charge_token(token: &str) -> bool {
    parse_charge_token(token).is_some()
}

fn strip_aq(s: &str) -> &str {
    let cut = s.len().saturating_sub(4);
    if s.len() >= 4 && s.is_char_boundary(cut) && s[cut..].eq_ignore_ascii_case("(aq)") {
        s[..cut].trim_end()
    } else {
        s
    }
}

fn compact_lower(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn sign_of(c: char) -> Option<i32> {
    match c {
        '+' => Some(1),
        '-' => Some(-1),
        _ => None,
    }
}

/// `2+`, `+2`, `+`, `++`, `--`.
fn parse_charge_token(token: &str) -> Option<i32> {
    let token = token.trim();
    let first = token.chars().next()?;
    let last = token.chars().last()?;

    if let Some(sign) = sign_of(first) {
        let rest = &token[1..];
        if rest.is_empty() {
            return Some(sign);
        }
        if rest.chars().all(|c| c.is_ascii_digit()) {
            return rest.parse::<i32>().ok().map(|n| sign * n);
        }
        if rest.chars().all(|c| sign_of(c) == Some(sign)) {
            return Some(sign * token.len() as i32);
        }
        return None;
    }

    let sign = sign_of(last)?;
    let digits = &token[..token.len() - 1];
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        return digits.parse::<i32>().ok().map(|n| sign * n);
    }
    None
}

fn split_compact_charge(s: &str) -> (&str, i32) {
    // Trailing digits preceded by a sign: "fe+2"
    let digits_start = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);
    if let Some(ds) = digits_start {
        if ds > 1 && s.is_char_boundary(ds - 1) {
            let sign_pos = ds - 1;
            if let Some(sign) = s[sign_pos..ds].chars().next().and_then(sign_of) {
                if let Ok(n) = s[ds..].parse::<i32>() {
                    return (&s[..sign_pos], sign * n);
                }
            }
        }
        return (s, 0);
    }

    // Run of identical signs: "na+", "so4--"
    let Some(last) = s.chars().last() else {
        return (s, 0);
    };
    let Some(sign) = sign_of(last) else {
        return (s, 0);
    };
    let run = s.chars().rev().take_while(|&c| c == last).count();
    if run == s.len() {
        return (s, 0);
    }
    (&s[..s.len() - run], sign * run as i32)
}
