//! Argument tables parsed from a directive body.
//!
//! An argument group has the shape `key[:flavor[:cond,...]][values...]`.
//! Groups are collected until the closing `)` of the directive. Unflavored
//! values land in [`Args::unflavored`]; flavored values are written to both
//! [`Args::flavored`] and [`Args::flavors`] so per-key and per-flavor
//! consumers see the same data.

use crate::error::{ParseError, ParseErrorKind};
use crate::scanner::{Mode, Scanner};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;

/// Ordered `key -> values` table.
pub type ArgMap = IndexMap<String, Vec<String>>;

/// Set of conditions that hold for this build.
pub type Conditions = BTreeSet<String>;

/// How condition lists in argument keys are treated.
#[derive(Debug, Clone, Copy)]
pub enum CondEval<'a> {
    /// Condition lists are an error (used while reading `CONFIG`).
    Disallowed,
    /// Condition lists are evaluated against this set.
    Against(&'a Conditions),
}

/// The three co-indexed argument tables of one directive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Args {
    /// `key -> values` for groups without a flavor.
    pub unflavored: ArgMap,
    /// `key -> flavor -> values`.
    pub flavored: IndexMap<String, ArgMap>,
    /// `flavor -> key -> values`.
    pub flavors: IndexMap<String, ArgMap>,
}

/// Result of parsing a directive body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    /// Argument tables after condition filtering.
    pub args: Args,
    /// Whether an `enabled` key appeared, kept or not.
    pub have_enabled: bool,
    /// Whether parsing stopped at `)` rather than end of input.
    pub closed: bool,
}

/// Return `true` if every entry of the comma-separated `condlist` holds.
///
/// Entries prefixed with `!` must be absent from `conditions`.
///
/// # Examples
///
/// ```
/// use builddesc::args::{check_conditions, Conditions};
/// let conds: Conditions = ["linux".to_owned()].into();
/// assert!(check_conditions("linux,!darwin", &conds));
/// assert!(!check_conditions("!linux", &conds));
/// ```
#[must_use]
pub fn check_conditions(condlist: &str, conditions: &Conditions) -> bool {
    condlist.split(',').all(|cond| match cond.strip_prefix('!') {
        Some(negated) => !conditions.contains(negated),
        None => conditions.contains(cond),
    })
}

impl Args {
    /// Parse argument groups from `scanner` until a bare `)` or end of input.
    ///
    /// # Errors
    ///
    /// Fails on a key not followed by `[`, on a condition list under
    /// [`CondEval::Disallowed`], or when input ends inside a group.
    pub fn parse(scanner: &mut Scanner<'_>, conditions: CondEval<'_>) -> Result<ParsedArgs, ParseError> {
        let mut parsed = ParsedArgs::default();
        while let Some(first) = scanner.next_token() {
            if first.text == ")" {
                parsed.closed = true;
                break;
            }
            let mut tok = first;
            let mut fields: [String; 3] = Default::default();
            // Empty keys are allowed; COMPONENT uses them for its directory list.
            if tok.text != "[" {
                for field in &mut fields {
                    if tok.text != ":" {
                        tok.text.clone_into(field);
                        tok = scanner.expect_token()?;
                        if tok.text != ":" {
                            break;
                        }
                    }
                    tok = scanner.expect_token()?;
                }
            }
            let [key, flavor, cond] = fields;
            if key == "enabled" {
                parsed.have_enabled = true;
            }
            if tok.text != "[" {
                return Err(scanner.error(ParseErrorKind::MissingOpenBracket, tok.text));
            }
            let values = scan_values(scanner)?;

            if !cond.is_empty() {
                match conditions {
                    CondEval::Disallowed => {
                        return Err(scanner.error(ParseErrorKind::ConditionsNotAllowed, &cond));
                    }
                    CondEval::Against(set) if !check_conditions(&cond, set) => continue,
                    CondEval::Against(_) => {}
                }
            }
            parsed.args.insert(key, &flavor, values);
        }
        Ok(parsed)
    }

    /// Append `values` under `key`, flavored if `flavor` is non-empty.
    pub fn insert(&mut self, key: String, flavor: &str, values: Vec<String>) {
        if flavor.is_empty() {
            self.unflavored.entry(key).or_default().extend(values);
            return;
        }
        self.flavors
            .entry(flavor.to_owned())
            .or_default()
            .entry(key.clone())
            .or_default()
            .extend(values.iter().cloned());
        self.flavored
            .entry(key)
            .or_default()
            .entry(flavor.to_owned())
            .or_default()
            .extend(values);
    }

    /// Unflavored arguments merged with the arguments for `flavor`.
    #[must_use]
    pub fn merged_for(&self, flavor: &str) -> ArgMap {
        let mut merged = self.unflavored.clone();
        if let Some(flargs) = self.flavors.get(flavor) {
            for (key, values) in flargs {
                merged.entry(key.clone()).or_default().extend(values.iter().cloned());
            }
        }
        merged
    }
}

fn scan_values(scanner: &mut Scanner<'_>) -> Result<Vec<String>, ParseError> {
    scanner.set_mode(Mode::Bracket);
    let mut values: Vec<String> = Vec::new();
    let mut level = 1_usize;
    let mut new_word = true;
    loop {
        let tok = scanner.expect_token()?;
        match tok.text {
            "[" => level += 1,
            "]" => level -= 1,
            _ => {}
        }
        if level == 0 {
            break;
        }
        let glued = !(new_word || tok.spaced);
        match values.last_mut() {
            Some(last) if glued => last.push_str(tok.text),
            _ => values.push(tok.text.to_owned()),
        }
        new_word = false;
    }
    scanner.set_mode(Mode::Structural);
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(src: &str, conds: CondEval<'_>) -> Result<ParsedArgs, ParseError> {
        let mut scanner = Scanner::new(src, "Builddesc");
        Args::parse(&mut scanner, conds)
    }

    fn owned(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[test]
    fn nested_brackets_stay_in_values() {
        let conds = Conditions::new();
        let parsed = parse("a[b[]] b[c [ ] ] c[d[ ]])", CondEval::Against(&conds)).expect("parse");
        let unfl = &parsed.args.unflavored;
        assert_eq!(unfl.get("a"), Some(&owned(&["b[]"])));
        assert_eq!(unfl.get("b"), Some(&owned(&["c", "[", "]"])));
        assert_eq!(unfl.get("c"), Some(&owned(&["d[", "]"])));
    }

    #[test]
    fn values_keep_order_and_accumulate() {
        let conds = Conditions::new();
        let parsed = parse("srcs[b.c a.c] srcs[c.c])", CondEval::Against(&conds)).expect("parse");
        assert_eq!(
            parsed.args.unflavored.get("srcs"),
            Some(&owned(&["b.c", "a.c", "c.c"]))
        );
    }

    #[test]
    fn empty_brackets_give_an_empty_list() {
        let conds = Conditions::new();
        let parsed = parse("no_analyse[])", CondEval::Against(&conds)).expect("parse");
        assert_eq!(parsed.args.unflavored.get("no_analyse"), Some(&Vec::new()));
    }

    #[test]
    fn empty_key_collects_unlabeled_values() {
        let parsed = parse("[lib bin])", CondEval::Disallowed).expect("parse");
        assert_eq!(parsed.args.unflavored.get(""), Some(&owned(&["lib", "bin"])));
    }

    #[test]
    fn filtered_enabled_is_still_reported() {
        let conds = Conditions::new();
        let parsed = parse("enabled::none[])", CondEval::Against(&conds)).expect("parse");
        assert!(parsed.have_enabled);
        assert!(parsed.closed);
        assert_eq!(parsed.args, Args::default());
    }

    #[test]
    fn flavored_values_are_cross_indexed() {
        let conds = Conditions::new();
        let parsed = parse("cflags:prod[-O2] cflags[-g])", CondEval::Against(&conds)).expect("parse");
        let args = &parsed.args;
        assert_eq!(args.flavored["cflags"]["prod"], owned(&["-O2"]));
        assert_eq!(args.flavors["prod"]["cflags"], owned(&["-O2"]));
        assert_eq!(args.merged_for("prod")["cflags"], owned(&["-g", "-O2"]));
        assert_eq!(args.merged_for("dev")["cflags"], owned(&["-g"]));
    }

    #[test]
    fn empty_flavor_with_condition_is_unflavored() {
        let conds: Conditions = ["linux".to_owned()].into();
        let parsed = parse("libs::linux[rt] libs::!linux[m])", CondEval::Against(&conds))
            .expect("parse");
        assert_eq!(parsed.args.unflavored.get("libs"), Some(&owned(&["rt"])));
        assert!(parsed.args.flavors.is_empty());
    }

    #[test]
    fn conditions_rejected_when_disallowed() {
        let err = parse("flavors::linux[a])", CondEval::Disallowed).expect_err("must fail");
        assert_eq!(err.kind, ParseErrorKind::ConditionsNotAllowed);
        assert_eq!(err.token, "linux");
    }

    #[rstest]
    #[case("srcs foo)", ParseErrorKind::MissingOpenBracket)]
    #[case("srcs[a.c", ParseErrorKind::UnexpectedEof)]
    #[case("srcs:", ParseErrorKind::UnexpectedEof)]
    fn malformed_groups_fail(#[case] src: &str, #[case] kind: ParseErrorKind) {
        let conds = Conditions::new();
        let err = parse(src, CondEval::Against(&conds)).expect_err("must fail");
        assert_eq!(err.kind, kind);
    }

    #[test]
    fn empty_input_is_empty_args() {
        let parsed = parse("", CondEval::Disallowed).expect("parse");
        assert_eq!(parsed, ParsedArgs::default());
        assert!(!parsed.closed);
    }

    #[rstest]
    #[case("a", true)]
    #[case("a,b", true)]
    #[case("a,c", false)]
    #[case("!c", true)]
    #[case("!a", false)]
    fn condition_lists(#[case] list: &str, #[case] expected: bool) {
        let conds: Conditions = ["a".to_owned(), "b".to_owned()].into();
        assert_eq!(check_conditions(list, &conds), expected);
    }
}
