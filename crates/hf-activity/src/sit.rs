//! SIT ion-interaction coefficients.
//!
//! The table covers every aqueous species plus two fictive ions, `Na+` at
//! index `n_aq` and `Cl-` at index `n_aq + 1`, that carry the electroneutrality
//! and background-electrolyte contributions. Coefficients are symmetric and
//! stored once, in the lower triangle addressed by [`fold`]. Entries between
//! species of the same nonzero charge sign are never stored and read as zero.
//!
//! File format (`SIT-coefficients.dta`): comma or whitespace separated tokens in
//! three sections, each closed by `END`:
//!
//! 1. `cation, anion, eps0, eps1, eps2`, optionally preceded by `NoDefaults`
//! 2. `neutral, eps0, eps1, eps2`: the neutral species against every ion
//! 3. `neutral, eps0, eps1, eps2`: self-interaction of the neutral species
//!
//! `eps(T) = eps0 + eps1·T + eps2·T²` with `T` in kelvin. A bare charge token
//! such as `2+` belongs to the name before it. Lines starting with `/` or `#`
//! are comments.

use crate::error::{ActivityError, ActivityResult};
use hf_system::name::{is_charge_token, normalize_species_name};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const SIT_FILE_NAME: &str = "SIT-coefficients.dta";

/// Directories consulted by [`load_epsilon_table`].
pub const MAX_SIT_PATHS: usize = 3;

/// Position of the symmetric pair `(i, j)` in lower-triangle storage.
///
/// `fold(i, j) == fold(j, i)`; rows are laid out one after another, row `r`
/// holding columns `0..=r`.
#[inline]
pub fn fold(i: usize, j: usize) -> usize {
    let (r, c) = if i >= j { (i, j) } else { (j, i) };
    r * (r + 1) / 2 + c
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpsilonTable {
    keys: Vec<String>,
    charges: Vec<f64>,
    coeffs: Vec<[f64; 3]>,
    set: Vec<bool>,
    no_defaults: bool,
}

impl EpsilonTable {
    /// Empty table for the given aqueous species. The two fictive ions are
    /// appended here.
    pub fn new(names: &[String], charges: &[f64]) -> ActivityResult<Self> {
        hf_core::ensure_len(charges.len(), names.len(), "SIT species charges")?;
        let mut keys: Vec<String> = names.iter().map(|n| normalize_species_name(n)).collect();
        keys.push(normalize_species_name("Na+"));
        keys.push(normalize_species_name("Cl-"));
        let mut all_charges = charges.to_vec();
        all_charges.push(1.0);
        all_charges.push(-1.0);

        let n = keys.len();
        let len = n * (n + 1) / 2;
        Ok(Self {
            keys,
            charges: all_charges,
            coeffs: vec![[0.0; 3]; len],
            set: vec![false; len],
            no_defaults: false,
        })
    }

    /// Parse a single file's text and complete the table with defaults.
    pub fn parse(text: &str, names: &[String], charges: &[f64]) -> ActivityResult<Self> {
        let mut table = Self::new(names, charges)?;
        table.merge_text(text, "<text>")?;
        table.apply_defaults();
        Ok(table)
    }

    /// Species count including the two fictive ions.
    pub fn size(&self) -> usize {
        self.keys.len()
    }

    pub fn na_index(&self) -> usize {
        self.keys.len() - 2
    }

    pub fn cl_index(&self) -> usize {
        self.keys.len() - 1
    }

    pub fn charge(&self, i: usize) -> f64 {
        self.charges[i]
    }

    pub fn no_defaults(&self) -> bool {
        self.no_defaults
    }

    pub fn coefficients(&self, i: usize, j: usize) -> [f64; 3] {
        self.coeffs[fold(i, j)]
    }

    pub fn is_set(&self, i: usize, j: usize) -> bool {
        self.set[fold(i, j)]
    }

    /// ε(i, j) at `t_k` kelvin.
    pub fn eps(&self, i: usize, j: usize, t_k: f64) -> f64 {
        let [e0, e1, e2] = self.coefficients(i, j);
        e0 + e1 * t_k + e2 * t_k * t_k
    }

    /// ε at `t_k` for every stored pair, in [`fold`] order.
    pub fn evaluate_into(&self, t_k: f64, out: &mut Vec<f64>) {
        out.clear();
        out.extend(
            self.coeffs
                .iter()
                .map(|[e0, e1, e2]| e0 + e1 * t_k + e2 * t_k * t_k),
        );
    }

    /// Store a pair unless both charges have the same nonzero sign.
    pub fn set_pair(&mut self, i: usize, j: usize, value: [f64; 3]) -> bool {
        if self.charges[i] * self.charges[j] > 0.0 {
            return false;
        }
        let k = fold(i, j);
        self.coeffs[k] = value;
        self.set[k] = true;
        true
    }

    fn matches(&self, name: &str) -> Vec<usize> {
        let key = normalize_species_name(name);
        self.keys
            .iter()
            .enumerate()
            .filter(|(_, k)| **k == key)
            .map(|(i, _)| i)
            .collect()
    }

    /// Merge the entries of one file. Entries already present are overwritten.
    pub fn merge_text(&mut self, text: &str, source: &str) -> ActivityResult<()> {
        let tokens = tokenize(text);
        let mut it = tokens.iter().map(String::as_str);
        let mut section = 1;
        let mut entries = 0usize;

        while let Some(tok) = it.next() {
            if tok.eq_ignore_ascii_case("END") {
                section += 1;
                if section > 3 {
                    break;
                }
                continue;
            }
            if section == 1 && tok.eq_ignore_ascii_case("NoDefaults") {
                self.no_defaults = true;
                continue;
            }
            match section {
                1 => {
                    let anion = next_name(&mut it, source, tok)?;
                    let value = read_triple(&mut it, source, tok)?;
                    self.set_ion_pair(tok, anion, value);
                }
                2 => {
                    let value = read_triple(&mut it, source, tok)?;
                    self.set_neutral_ions(tok, value);
                }
                _ => {
                    let value = read_triple(&mut it, source, tok)?;
                    self.set_neutral_self(tok, value);
                }
            }
            entries += 1;
        }

        if section <= 3 {
            debug!(source, section, "SIT file ended before the last END");
        }
        debug!(source, entries, no_defaults = self.no_defaults, "SIT file merged");
        Ok(())
    }

    fn set_ion_pair(&mut self, a: &str, b: &str, value: [f64; 3]) {
        let ia = self.matches(a);
        let ib = self.matches(b);
        if ia.is_empty() || ib.is_empty() {
            debug!(first = a, second = b, "SIT entry for species not in system skipped");
            return;
        }
        for &i in &ia {
            for &j in &ib {
                if self.charges[i] * self.charges[j] >= 0.0 {
                    warn!(
                        first = a,
                        second = b,
                        "SIT cation-anion entry without opposite charges ignored"
                    );
                    continue;
                }
                self.set_pair(i, j, value);
            }
        }
    }

    fn set_neutral_ions(&mut self, name: &str, value: [f64; 3]) {
        let found = self.matches(name);
        if found.is_empty() {
            debug!(species = name, "SIT neutral entry for species not in system skipped");
            return;
        }
        for n in found {
            if self.charges[n] != 0.0 {
                warn!(species = name, "SIT neutral entry for a charged species ignored");
                continue;
            }
            for j in 0..self.size() {
                if self.charges[j] != 0.0 {
                    self.set_pair(n, j, value);
                }
            }
        }
    }

    fn set_neutral_self(&mut self, name: &str, value: [f64; 3]) {
        let found = self.matches(name);
        if found.is_empty() {
            debug!(species = name, "SIT self-interaction for species not in system skipped");
            return;
        }
        for n in found {
            if self.charges[n] != 0.0 {
                warn!(species = name, "SIT self-interaction for a charged species ignored");
                continue;
            }
            self.set_pair(n, n, value);
        }
    }

    /// Fill unset cation–anion pairs. With `NoDefaults` they stay zero, as do
    /// all unset pairs involving neutral species.
    pub fn apply_defaults(&mut self) {
        if self.no_defaults {
            return;
        }
        let cl = normalize_species_name("Cl-");
        let clo4 = normalize_species_name("ClO4-");
        let na = normalize_species_name("Na+");
        let mut filled = 0usize;

        for i in 0..self.size() {
            for j in 0..i {
                let (zi, zj) = (self.charges[i], self.charges[j]);
                if zi * zj >= 0.0 || self.set[fold(i, j)] {
                    continue;
                }
                let (c, a) = if zi > 0.0 { (i, j) } else { (j, i) };
                let zc = self.charges[c];
                let za = self.charges[a].abs();
                let with_cl = 0.1 * zc - 0.05;
                let with_na = 0.05 - 0.15 * (za - 1.0);
                let e0 = if self.keys[a] == cl {
                    with_cl
                } else if self.keys[a] == clo4 {
                    0.2 * zc - 0.1
                } else if self.keys[c] == na {
                    with_na
                } else {
                    0.5 * (with_cl + with_na)
                };
                let k = fold(i, j);
                self.coeffs[k] = [e0, 0.0, 0.0];
                self.set[k] = true;
                filled += 1;
            }
        }
        if filled > 0 {
            debug!(filled, "SIT default coefficients applied");
        }
    }
}

fn next_name<'a>(
    it: &mut impl Iterator<Item = &'a str>,
    source: &str,
    after: &str,
) -> ActivityResult<&'a str> {
    it.next().ok_or_else(|| ActivityError::SitData {
        message: format!("{source}: unexpected end of file after '{after}'"),
    })
}

fn read_triple<'a>(
    it: &mut impl Iterator<Item = &'a str>,
    source: &str,
    name: &str,
) -> ActivityResult<[f64; 3]> {
    let mut out = [0.0; 3];
    for v in &mut out {
        let tok = next_name(it, source, name)?;
        *v = tok.parse::<f64>().map_err(|_| ActivityError::SitData {
            message: format!("{source}: expected a number for '{name}', found '{tok}'"),
        })?;
    }
    Ok(out)
}

fn joins_previous(tok: &str) -> bool {
    let Some(last) = tok.chars().last() else {
        return false;
    };
    (last == '+' || last == '-')
        && tok[..tok.len() - 1].chars().all(|c| c.is_ascii_digit())
        && is_charge_token(tok)
}

fn tokenize(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = line.trim_start();
        if line.starts_with('/') || line.starts_with('#') {
            continue;
        }
        for tok in line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            if joins_previous(tok) {
                if let Some(prev) = out.last_mut() {
                    let is_word = prev.parse::<f64>().is_err()
                        && !prev.eq_ignore_ascii_case("END")
                        && !prev.eq_ignore_ascii_case("NoDefaults");
                    if is_word {
                        prev.push(' ');
                        prev.push_str(tok);
                        continue;
                    }
                }
            }
            out.push(tok.to_string());
        }
    }
    out
}

fn sit_file(path: &Path) -> PathBuf {
    if path.is_file() {
        path.to_path_buf()
    } else {
        path.join(SIT_FILE_NAME)
    }
}

/// Build the ε table for the given aqueous species from up to three
/// directories. Later directories override entries of earlier ones. A path
/// may also name the file itself.
pub fn load_epsilon_table(
    paths: &[PathBuf],
    names: &[String],
    charges: &[f64],
) -> ActivityResult<EpsilonTable> {
    let mut table = EpsilonTable::new(names, charges)?;
    if paths.len() > MAX_SIT_PATHS {
        warn!(
            given = paths.len(),
            used = MAX_SIT_PATHS,
            "extra SIT search paths ignored"
        );
    }

    let mut found = 0usize;
    for dir in paths.iter().take(MAX_SIT_PATHS) {
        let file = sit_file(dir);
        if !file.is_file() {
            debug!(path = %file.display(), "no SIT file");
            continue;
        }
        let text = std::fs::read_to_string(&file).map_err(|e| ActivityError::SitData {
            message: format!("cannot read {}: {e}", file.display()),
        })?;
        table.merge_text(&text, &file.display().to_string())?;
        found += 1;
    }

    if found == 0 {
        return Err(ActivityError::SitData {
            message: format!(
                "{SIT_FILE_NAME} not found in {} search path(s)",
                paths.len().min(MAX_SIT_PATHS)
            ),
        });
    }
    table.apply_defaults();
    Ok(table)
}
