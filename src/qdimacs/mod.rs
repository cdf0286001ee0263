//! QDIMACS codec (C5): serialize a prefix+CNF to QDIMACS (merging adjacent
//! same-quantifier blocks, since some downstream certifiers reject
//! adjacent same-quantifier blocks — spec §4.5/§6), parse solver response
//! lines, per `original_source/tool/src/ExtQBFSolver.cpp`'s `dumpQBF` /
//! `parseAnswer` / `parseModel`.

use crate::cnf::Cnf;
use crate::errors::QdimacsError;
use crate::vars::Var;
use pest::Parser;

#[derive(pest_derive::Parser)]
#[grammar = "qdimacs.pest"]
struct QdimacsParser;

/// Quantifier kind, leftmost prefix block = outermost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quant {
    Exists,
    ForAll,
}

/// An ordered sequence of (quantifier, variable-set) blocks, leftmost =
/// outermost (spec §3 "Quantifier prefix").
pub type Prefix = Vec<(Quant, Vec<Var>)>;

/// Writes `p cnf <maxvar> <nclauses>`, then quantifier lines, merging
/// consecutive blocks of the same quantifier into a single line.
pub fn write(prefix: &Prefix, cnf: &Cnf, max_var: u32) -> String {
    let mut out = format!("p cnf {} {}\n", max_var, cnf.nr_of_clauses());
    let mut merged: Vec<(Quant, Vec<Var>)> = Vec::new();
    for (q, vars) in prefix {
        if vars.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some((last_q, last_vars)) if *last_q == *q => last_vars.extend(vars.iter().copied()),
            _ => merged.push((*q, vars.clone())),
        }
    }
    for (q, vars) in &merged {
        out.push(match q {
            Quant::Exists => 'e',
            Quant::ForAll => 'a',
        });
        for v in vars {
            out.push(' ');
            out.push_str(&v.to_string());
        }
        out.push_str(" 0\n");
    }
    for clause in cnf.get_clauses() {
        for lit in clause {
            out.push_str(&lit.to_string());
            out.push(' ');
        }
        out.push_str("0\n");
    }
    out
}

/// Parses a QDIMACS document into its prefix and CNF.
pub fn parse(input: &str) -> Result<(Prefix, Cnf), QdimacsError> {
    let mut prefix = Prefix::new();
    let mut cnf = Cnf::new();
    let pairs =
        QdimacsParser::parse(Rule::file, input).map_err(|e| QdimacsError::Parse(e.to_string()))?;
    for pair in pairs {
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::quant_line => {
                    let mut it = inner.into_inner();
                    let quant_pair = it.next().expect("quant_line has a quant");
                    let quant = match quant_pair.as_str() {
                        "e" => Quant::Exists,
                        "a" => Quant::ForAll,
                        other => return Err(QdimacsError::Parse(format!("bad quantifier {other}"))),
                    };
                    let mut vars = Vec::new();
                    for v in it {
                        vars.push(v.as_str().parse::<Var>()?);
                    }
                    prefix.push((quant, vars));
                }
                Rule::clause => {
                    let mut clause = Vec::new();
                    for lit_pair in inner.into_inner() {
                        clause.push(lit_pair.as_str().parse::<i32>()?);
                    }
                    cnf.add_clause(clause);
                }
                _ => {}
            }
        }
    }
    Ok((prefix, cnf))
}

/// Maps an external solver's exit code to a SAT/UNSAT answer, per spec
/// §4.4/§6: `10` = SAT, `20` = UNSAT, anything else is fatal.
pub fn classify_exit_code(code: i32) -> Option<bool> {
    match code {
        10 => Some(true),
        20 => Some(false),
        _ => None,
    }
}

/// Scans a solver answer stream for `s cnf 1`/`s cnf 0` and `V <lit> 0`
/// model lines, per spec §4.4/§6.
pub fn parse_model_output(text: &str) -> Result<(bool, Vec<i32>), QdimacsError> {
    let mut sat = None;
    let mut model = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("s cnf") {
            let rest = rest.trim();
            sat = match rest {
                "1" => Some(true),
                "0" => Some(false),
                _ => sat,
            };
        } else if let Some(rest) = line.strip_prefix('V') {
            for tok in rest.split_whitespace() {
                let lit: i32 = tok
                    .parse()
                    .map_err(|_| QdimacsError::BadResponse(format!("bad literal token {tok}")))?;
                if lit != 0 {
                    model.push(lit);
                }
            }
        }
    }
    let sat = sat.ok_or_else(|| QdimacsError::BadResponse("missing 's cnf' line".into()))?;
    Ok((sat, model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_adjacent_same_quantifier_blocks() {
        let mut cnf = Cnf::new();
        cnf.add2(1, 2);
        let prefix = vec![
            (Quant::Exists, vec![1]),
            (Quant::Exists, vec![2]),
            (Quant::ForAll, vec![3]),
        ];
        let text = write(&prefix, &cnf, 3);
        let e_lines = text.lines().filter(|l| l.starts_with('e')).count();
        assert_eq!(e_lines, 1);
        assert!(text.contains("e 1 2 0"));
    }

    #[test]
    fn round_trips_prefix_and_cnf() {
        let mut cnf = Cnf::new();
        cnf.add2(1, -2);
        let prefix = vec![(Quant::Exists, vec![1]), (Quant::ForAll, vec![2])];
        let text = write(&prefix, &cnf, 2);
        let (parsed_prefix, parsed_cnf) = parse(&text).unwrap();
        assert_eq!(parsed_prefix, prefix);
        assert_eq!(parsed_cnf.get_clauses(), cnf.get_clauses());
    }

    #[test]
    fn classifies_exit_codes() {
        assert_eq!(classify_exit_code(10), Some(true));
        assert_eq!(classify_exit_code(20), Some(false));
        assert_eq!(classify_exit_code(1), None);
    }

    #[test]
    fn parses_model_lines() {
        let text = "c comment\ns cnf 1\nV 1 0\nV -2 3 0\n";
        let (sat, model) = parse_model_output(text).unwrap();
        assert!(sat);
        assert_eq!(model, vec![1, -2, 3]);
    }
}
