//! DIMACS load/save for [`Cnf`](super::Cnf), grounded on `satgalaxy`'s
//! `parser::dimacs` module (same `pest` grammar approach, trimmed to the
//! subset spec §4.1/§6 actually needs: no quantifier lines, no
//! compression). Quantified QDIMACS lives in [`crate::qdimacs`].

use super::Cnf;
use crate::errors::{DemiurgeError, Result};
use pest::Parser;
use std::path::Path;

#[derive(pest_derive::Parser)]
#[grammar = "dimacs.pest"]
struct DimacsParser;

/// Parses a DIMACS CNF string. Requires every referenced variable to be
/// `<= max_var` (the registry's current maximum), per spec §4.1's load
/// precondition.
pub fn parse(input: &str, max_var: u32) -> Result<Cnf> {
    let mut cnf = Cnf::new();
    let pairs = DimacsParser::parse(Rule::file, input)
        .map_err(|e| DemiurgeError::Input(format!("malformed DIMACS: {e}")))?;
    for pair in pairs {
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::clause => {
                    let mut clause = Vec::new();
                    for lit_pair in inner.into_inner() {
                        let lit: i32 = lit_pair
                            .as_str()
                            .parse()
                            .map_err(|e| DemiurgeError::Input(format!("bad literal: {e}")))?;
                        if lit.unsigned_abs() > max_var {
                            return Err(DemiurgeError::Input(format!(
                                "variable {} exceeds registry maximum {}",
                                lit.unsigned_abs(),
                                max_var
                            )));
                        }
                        clause.push(lit);
                    }
                    cnf.add_clause(clause);
                }
                Rule::header => {}
                Rule::EOI => {}
                _ => {}
            }
        }
    }
    Ok(cnf)
}

pub fn load(path: impl AsRef<Path>, max_var: u32) -> Result<Cnf> {
    let content = std::fs::read_to_string(path)?;
    parse(&content, max_var)
}

pub fn save(cnf: &Cnf, max_var: u32, path: impl AsRef<Path>) -> Result<()> {
    std::fs::write(path, cnf.to_dimacs(max_var))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_dimacs() {
        let mut cnf = Cnf::new();
        cnf.add2(1, -2);
        cnf.add1(3);
        let text = cnf.to_dimacs(3);
        let parsed = parse(&text, 3).unwrap();
        let mut expected = cnf.clone();
        expected.remove_duplicates();
        let mut got = parsed;
        got.remove_duplicates();
        assert_eq!(expected, got);
    }

    #[test]
    fn rejects_variables_above_registry_max() {
        let text = "p cnf 2 1\n1 3 0\n";
        assert!(parse(text, 2).is_err());
    }

    #[test]
    fn skips_comment_lines() {
        let text = "c a header comment\np cnf 1 1\nc inline comment\n1 0\n";
        let cnf = parse(text, 1).unwrap();
        assert_eq!(cnf.nr_of_clauses(), 1);
    }
}
