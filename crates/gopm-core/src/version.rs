//! Version algebra: parse range constraints, totally order version strings,
//! and pick the best match out of a registry document.
//!
//! The grammar follows what registry metadata actually contains rather than
//! strict semver: bare integers (`"1"` means any `1.*`), `x` wildcards,
//! `||` disjunctions and `npm:alias@range` carriers all appear in the wild.

use std::cmp::Ordering;

use crate::error::InstallError;
use crate::registry::RegistryDocument;

/// A single parsed constraint. Disjunctions are handled above this level by
/// splitting on `||` before parsing each arm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Empty string or `*`: matches everything.
    Any,
    Exact(String),
    Caret(String),
    Tilde(String),
    Greater(String),
    GreaterEq(String),
    Less(String),
    LessEq(String),
    /// Closed interval `A - B`.
    Hyphen(String, String),
    /// `x` wildcard pattern such as `1.x` or `1.2.x`.
    Pattern(String),
}

/// Classify one constraint arm. Checks run in order: wildcard, operator
/// prefixes, hyphen interval, `x` pattern, exact.
pub fn parse_constraint(raw: &str) -> Result<Constraint, InstallError> {
    let c = raw.trim();
    if c.is_empty() || c == "*" {
        return Ok(Constraint::Any);
    }
    if let Some(rest) = c.strip_prefix('^') {
        return Ok(Constraint::Caret(rest.trim().to_string()));
    }
    if let Some(rest) = c.strip_prefix('~') {
        return Ok(Constraint::Tilde(rest.trim().to_string()));
    }
    if let Some(rest) = c.strip_prefix(">=") {
        return Ok(Constraint::GreaterEq(rest.trim().to_string()));
    }
    if let Some(rest) = c.strip_prefix("<=") {
        return Ok(Constraint::LessEq(rest.trim().to_string()));
    }
    if let Some(rest) = c.strip_prefix('>') {
        return Ok(Constraint::Greater(rest.trim().to_string()));
    }
    if let Some(rest) = c.strip_prefix('<') {
        return Ok(Constraint::Less(rest.trim().to_string()));
    }
    if let Some(rest) = c.strip_prefix('=') {
        return Ok(Constraint::Exact(rest.trim().to_string()));
    }
    if let Some((lo, hi)) = c.split_once(" - ") {
        return Ok(Constraint::Hyphen(lo.trim().to_string(), hi.trim().to_string()));
    }
    if c.contains('x') {
        return Ok(Constraint::Pattern(c.to_string()));
    }
    if c.chars().any(char::is_whitespace) {
        return Err(InstallError::UnsupportedConstraint {
            constraint: raw.to_string(),
        });
    }
    Ok(Constraint::Exact(c.to_string()))
}

/// Does `version` satisfy one parsed constraint?
pub fn satisfies(version: &str, constraint: &Constraint) -> bool {
    match constraint {
        Constraint::Any => true,
        Constraint::Exact(operand) => version == operand,
        Constraint::Caret(operand) => satisfies_caret(version, operand),
        Constraint::Tilde(operand) => satisfies_tilde(version, operand),
        Constraint::Greater(operand) => compare_versions(version, operand) == Ordering::Greater,
        Constraint::GreaterEq(operand) => compare_versions(version, operand) != Ordering::Less,
        Constraint::Less(operand) => compare_versions(version, operand) == Ordering::Less,
        Constraint::LessEq(operand) => compare_versions(version, operand) != Ordering::Greater,
        Constraint::Hyphen(lo, hi) => {
            compare_versions(version, lo) != Ordering::Less
                && compare_versions(version, hi) != Ordering::Greater
        }
        Constraint::Pattern(pattern) => matches_pattern(version, pattern),
    }
}

/// Does `version` satisfy the raw range string? Handles bare-integer
/// shorthands, `npm:` alias carriers and `||` disjunctions before the
/// single-constraint grammar.
pub fn range_matches(version: &str, range: &str) -> bool {
    let mut range = range.trim();
    if range.parse::<u64>().is_ok() {
        return version.starts_with(&format!("{}.", range));
    }
    if let Some(tail) = alias_range(range) {
        range = tail;
    }
    range.split("||").any(|arm| match parse_constraint(arm.trim()) {
        Ok(constraint) => satisfies(version, &constraint),
        Err(_) => false,
    })
}

/// `npm:name@range` carries a range in its tail; the alias itself is not a
/// fetch redirect.
fn alias_range(range: &str) -> Option<&str> {
    let rest = range.strip_prefix("npm:")?;
    rest.rsplit_once('@').map(|(_, tail)| tail)
}

/// Total order over dotted version strings: component-wise numeric where
/// both sides parse as integers, lexicographic otherwise. A prerelease tail
/// sorts below the bare release; tails compare lexicographically.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (a_parts, a_pre) = split_version(a);
    let (b_parts, b_pre) = split_version(b);
    let len = a_parts.len().max(b_parts.len());
    for i in 0..len {
        let pa = a_parts.get(i).copied().unwrap_or("");
        let pb = b_parts.get(i).copied().unwrap_or("");
        let ord = match (pa.parse::<u64>(), pb.parse::<u64>()) {
            (Ok(na), Ok(nb)) => na.cmp(&nb),
            _ => pa.cmp(pb),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    match (a_pre.is_empty(), b_pre.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a_pre.cmp(b_pre),
    }
}

/// Split off an optional leading `v` and a `-prerelease` tail, then break
/// the core into dotted components.
fn split_version(v: &str) -> (Vec<&str>, &str) {
    let v = v.strip_prefix('v').unwrap_or(v);
    let (core, pre) = match v.split_once('-') {
        Some((core, pre)) => (core, pre),
        None => (v, ""),
    };
    (core.split('.').collect(), pre)
}

fn satisfies_caret(version: &str, operand: &str) -> bool {
    let cv: Vec<&str> = operand.split('.').collect();
    let vv: Vec<&str> = version.split('.').collect();
    if cv.is_empty() || vv.is_empty() || cv[0] != vv[0] {
        return false;
    }
    if cv[0] == "0" {
        // Zero major: the operand pins minor and patch outright.
        if cv.len() > 1 && vv.len() > 1 && cv[1] != vv[1] {
            return false;
        }
        if cv.len() > 2 && vv.len() > 2 && cv[2] != vv[2] {
            return false;
        }
        return true;
    }
    compare_versions(version, operand) != Ordering::Less
}

fn satisfies_tilde(version: &str, operand: &str) -> bool {
    let cv: Vec<&str> = operand.split('.').collect();
    let vv: Vec<&str> = version.split('.').collect();
    if cv.is_empty() || vv.is_empty() {
        return false;
    }
    if cv.len() >= 3 && vv.len() >= 3 {
        return cv[0] == vv[0]
            && cv[1] == vv[1]
            && compare_versions(version, operand) != Ordering::Less;
    }
    if cv.len() >= 2 && vv.len() >= 2 {
        return cv[0] == vv[0] && compare_versions(version, operand) != Ordering::Less;
    }
    cv[0] == vv[0]
}

/// `x` segments accept any numeric component; other segments must match
/// exactly. Surplus version components beyond the pattern are unconstrained,
/// so `1.x` matches `1.2.3`.
fn matches_pattern(version: &str, pattern: &str) -> bool {
    let vparts: Vec<&str> = version.split('.').collect();
    for (i, pseg) in pattern.split('.').enumerate() {
        let Some(vseg) = vparts.get(i) else {
            return false;
        };
        if pseg == "x" {
            if vseg.is_empty() || !vseg.chars().all(|c| c.is_ascii_digit()) {
                return false;
            }
        } else if pseg != *vseg {
            return false;
        }
    }
    true
}

/// Pick the version of `doc` to install for `range`: the `latest` dist-tag
/// when asked for, the highest version matching a bare-integer major, an
/// exact key hit, or the highest key that satisfies the range.
pub fn select_version(doc: &RegistryDocument, range: &str) -> Result<String, InstallError> {
    let range = range.trim();
    if range == "latest" {
        return doc.dist_tags.get("latest").cloned().ok_or_else(|| {
            InstallError::NoMatchingVersion {
                package: doc.name.clone(),
                requested: range.to_string(),
                candidates: sorted_versions(doc),
            }
        });
    }
    if range.parse::<u64>().is_ok() {
        let prefix = format!("{}.", range);
        let mut matching: Vec<&String> = doc
            .versions
            .keys()
            .filter(|v| v.starts_with(&prefix))
            .collect();
        matching.sort_by(|a, b| compare_versions(b, a));
        return matching.first().map(|v| (*v).clone()).ok_or_else(|| {
            InstallError::NoMatchingVersion {
                package: doc.name.clone(),
                requested: range.to_string(),
                candidates: sorted_versions(doc),
            }
        });
    }
    if doc.versions.contains_key(range) {
        return Ok(range.to_string());
    }
    if range
        .split("||")
        .all(|arm| parse_constraint(arm.trim()).is_err())
    {
        return Err(InstallError::UnsupportedConstraint {
            constraint: range.to_string(),
        });
    }
    let candidates = sorted_versions(doc);
    for v in &candidates {
        if range_matches(v, range) {
            return Ok(v.clone());
        }
    }
    Err(InstallError::NoMatchingVersion {
        package: doc.name.clone(),
        requested: range.to_string(),
        candidates,
    })
}

/// All version keys, highest first. The descending scan order doubles as the
/// tie-break: a bare release sorts above its own prereleases.
fn sorted_versions(doc: &RegistryDocument) -> Vec<String> {
    let mut versions: Vec<String> = doc.versions.keys().cloned().collect();
    versions.sort_by(|a, b| compare_versions(b, a));
    versions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(versions: &[&str], latest: Option<&str>) -> RegistryDocument {
        let mut vers = serde_json::Map::new();
        for v in versions {
            vers.insert((*v).to_string(), serde_json::json!({ "version": v }));
        }
        let mut tags = serde_json::Map::new();
        if let Some(l) = latest {
            tags.insert("latest".to_string(), serde_json::json!(l));
        }
        serde_json::from_value(serde_json::json!({
            "name": "fixture",
            "versions": vers,
            "dist-tags": tags,
        }))
        .expect("fixture document")
    }

    #[test]
    fn compare_numeric_components() {
        assert_eq!(compare_versions("1.2.3", "1.2.3"), Ordering::Equal);
        assert_eq!(compare_versions("1.10.0", "1.9.0"), Ordering::Greater);
        assert_eq!(compare_versions("0.9.9", "1.0.0"), Ordering::Less);
        assert_eq!(compare_versions("v2.0.0", "2.0.0"), Ordering::Equal);
    }

    #[test]
    fn compare_uneven_lengths() {
        assert_eq!(compare_versions("1.2", "1.2.0"), Ordering::Less);
        assert_eq!(compare_versions("1.2.0.1", "1.2.0"), Ordering::Greater);
    }

    #[test]
    fn prerelease_sorts_below_release() {
        assert_eq!(compare_versions("1.2.3-beta", "1.2.3"), Ordering::Less);
        assert_eq!(compare_versions("1.2.3", "1.2.3-rc.1"), Ordering::Greater);
        assert_eq!(compare_versions("1.2.3-alpha", "1.2.3-beta"), Ordering::Less);
        assert_eq!(compare_versions("1.2.3-beta.2", "1.2.3"), Ordering::Less);
    }

    #[test]
    fn parse_recognizes_each_shape() {
        assert_eq!(parse_constraint("*").unwrap(), Constraint::Any);
        assert_eq!(parse_constraint("").unwrap(), Constraint::Any);
        assert_eq!(
            parse_constraint("^1.2.3").unwrap(),
            Constraint::Caret("1.2.3".to_string())
        );
        assert_eq!(
            parse_constraint("~2.1.0").unwrap(),
            Constraint::Tilde("2.1.0".to_string())
        );
        assert_eq!(
            parse_constraint(">=1.0.0").unwrap(),
            Constraint::GreaterEq("1.0.0".to_string())
        );
        assert_eq!(
            parse_constraint("1.0.0 - 2.0.0").unwrap(),
            Constraint::Hyphen("1.0.0".to_string(), "2.0.0".to_string())
        );
        assert_eq!(
            parse_constraint("1.2.x").unwrap(),
            Constraint::Pattern("1.2.x".to_string())
        );
        assert_eq!(
            parse_constraint("=1.2.3").unwrap(),
            Constraint::Exact("1.2.3".to_string())
        );
        assert_eq!(
            parse_constraint("1.2.3").unwrap(),
            Constraint::Exact("1.2.3".to_string())
        );
    }

    #[test]
    fn parse_rejects_unclassifiable_ranges() {
        assert!(parse_constraint("1.0.0 2.0.0").is_err());
    }

    #[test]
    fn caret_on_nonzero_major() {
        assert!(range_matches("1.5.0", "^1.2.3"));
        assert!(range_matches("1.2.3", "^1.2.3"));
        assert!(!range_matches("1.2.2", "^1.2.3"));
        assert!(!range_matches("2.0.0", "^1.2.3"));
        assert!(!range_matches("1.2.3-beta", "^1.2.3"));
    }

    #[test]
    fn caret_on_zero_major_pins_minor_and_patch() {
        assert!(range_matches("0.2.1", "^0.2.1"));
        assert!(!range_matches("0.2.2", "^0.2.1"));
        assert!(!range_matches("0.3.0", "^0.2.1"));
        assert!(!range_matches("1.2.1", "^0.2.1"));
    }

    #[test]
    fn tilde_pins_minor() {
        assert!(range_matches("2.1.4", "~2.1.0"));
        assert!(!range_matches("2.2.0", "~2.1.0"));
        assert!(!range_matches("2.1.0", "~2.1.1"));
        assert!(range_matches("2.5.0", "~2.1"));
        assert!(!range_matches("3.0.0", "~2.1"));
    }

    #[test]
    fn comparators_and_hyphen_interval() {
        assert!(range_matches("1.0.1", ">1.0.0"));
        assert!(!range_matches("1.0.0", ">1.0.0"));
        assert!(range_matches("1.0.0", ">=1.0.0"));
        assert!(range_matches("0.9.0", "<1.0.0"));
        assert!(range_matches("1.0.0", "<=1.0.0"));
        assert!(range_matches("1.5.0", "1.0.0 - 2.0.0"));
        assert!(range_matches("2.0.0", "1.0.0 - 2.0.0"));
        assert!(!range_matches("2.0.1", "1.0.0 - 2.0.0"));
    }

    #[test]
    fn wildcard_patterns_allow_surplus_components() {
        assert!(range_matches("1.2.3", "1.x"));
        assert!(range_matches("1.2.3", "1.2.x"));
        assert!(!range_matches("1.3.0", "1.2.x"));
        assert!(!range_matches("2.0.0", "1.x"));
        assert!(!range_matches("1", "1.x"));
    }

    #[test]
    fn bare_integer_is_major_prefix() {
        assert!(range_matches("1.2.3", "1"));
        assert!(!range_matches("2.0.0", "1"));
        assert!(!range_matches("1", "1"));
        assert!(!range_matches("10.0.0", "1"));
    }

    #[test]
    fn disjunction_matches_any_arm() {
        assert!(range_matches("1.5.0", "^1.0.0 || ^2.0.0"));
        assert!(range_matches("2.5.0", "^1.0.0 || ^2.0.0"));
        assert!(!range_matches("3.0.0", "^1.0.0 || ^2.0.0"));
    }

    #[test]
    fn alias_acts_as_range_carrier() {
        assert!(range_matches("1.5.0", "npm:other-name@^1.0.0"));
        assert!(!range_matches("2.0.0", "npm:other-name@^1.0.0"));
        assert!(range_matches("3.1.0", "npm:@scope/name@~3.1.0"));
    }

    #[test]
    fn upgrade_within_interval_stays_satisfied() {
        // For upward-closed range shapes, a higher version inside the
        // interval never stops matching once a lower one matched.
        let pairs = [
            ("^1.2.0", "1.2.1", "1.9.9"),
            ("~2.1.0", "2.1.1", "2.1.9"),
            (">=0.5.0", "0.5.0", "4.0.0"),
            ("1.0.0 - 3.0.0", "1.5.0", "2.9.0"),
        ];
        for (range, lower, higher) in pairs {
            assert!(range_matches(lower, range), "{} vs {}", lower, range);
            assert!(range_matches(higher, range), "{} vs {}", higher, range);
            assert_eq!(compare_versions(higher, lower), Ordering::Greater);
        }
    }

    #[test]
    fn select_latest_uses_dist_tag() {
        let d = doc(&["7.6.2", "7.6.3", "8.0.0-beta.1"], Some("7.6.3"));
        assert_eq!(select_version(&d, "latest").unwrap(), "7.6.3");
    }

    #[test]
    fn select_caret_zero_major_pins_to_operand() {
        let d = doc(&["0.2.1", "0.2.2", "0.3.0", "0.2.9"], None);
        assert_eq!(select_version(&d, "^0.2.1").unwrap(), "0.2.1");
    }

    #[test]
    fn select_prefers_highest_match() {
        let d = doc(&["1.0.0", "1.4.2", "1.9.0", "2.0.0"], None);
        assert_eq!(select_version(&d, "^1.0.0").unwrap(), "1.9.0");
        assert_eq!(select_version(&d, "1.x").unwrap(), "1.9.0");
        assert_eq!(select_version(&d, "1").unwrap(), "1.9.0");
    }

    #[test]
    fn select_prefers_release_over_prerelease() {
        let d = doc(&["1.2.0", "1.2.0-rc.1"], None);
        assert_eq!(select_version(&d, "^1.0.0").unwrap(), "1.2.0");
    }

    #[test]
    fn select_exact_key_short_circuits() {
        let d = doc(&["1.3.0", "1.2.0"], None);
        assert_eq!(select_version(&d, "1.2.0").unwrap(), "1.2.0");
    }

    #[test]
    fn select_reports_candidates_on_no_match() {
        let d = doc(&["1.0.0", "2.0.0"], None);
        match select_version(&d, "^3.0.0") {
            Err(InstallError::NoMatchingVersion { candidates, .. }) => {
                assert_eq!(candidates, vec!["2.0.0".to_string(), "1.0.0".to_string()]);
            }
            other => panic!("expected NoMatchingVersion, got {:?}", other),
        }
    }

    #[test]
    fn select_surfaces_unsupported_constraint() {
        let d = doc(&["1.0.0"], None);
        assert!(matches!(
            select_version(&d, "1.0.0 banana"),
            Err(InstallError::UnsupportedConstraint { .. })
        ));
    }
}
