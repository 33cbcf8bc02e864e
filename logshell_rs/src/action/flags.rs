//! Flag schemas and token parsing for actions and the global surface.
//!
//! Every action carries a [`FlagSet`] built from [`FlagSpec`]s declared at
//! tree-construction time. Parsing accepts `--flag=value`, `--flag value`,
//! and shorthand `-f value` forms. Parse failures are user-facing strings
//! (invalid reasons), not programmer errors.

use std::collections::HashMap;

/// Value type a flag accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    /// Presence flag; `--flag` sets it, `--flag=false` clears it.
    Bool,
    /// Free-form string value.
    Text,
    /// Unsigned integer value.
    Int,
}

/// Declaration of a single flag.
#[derive(Debug, Clone)]
pub struct FlagSpec {
    /// Long name without the leading dashes, e.g. `format`.
    pub long: String,
    /// Optional shorthand character, e.g. `f`.
    pub short: Option<char>,
    pub kind: FlagKind,
    /// Default value rendered in usage and returned when unset.
    pub default: Option<String>,
    pub required: bool,
    /// One-line usage text.
    pub usage: String,
    /// Hidden flags (help, completion, scheduling) never render in usage.
    pub hidden: bool,
}

impl FlagSpec {
    pub fn new(long: &str, kind: FlagKind, usage: &str) -> Self {
        Self {
            long: long.to_string(),
            short: None,
            kind,
            default: None,
            required: false,
            usage: usage.to_string(),
            hidden: false,
        }
    }

    pub fn short(mut self, c: char) -> Self {
        self.short = Some(c);
        self
    }

    pub fn default_value(mut self, v: &str) -> Self {
        self.default = Some(v.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// A set of declared flags plus any values parsed from an argument list.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    specs: Vec<FlagSpec>,
    values: HashMap<String, String>,
}

impl FlagSet {
    pub fn new(specs: Vec<FlagSpec>) -> Self {
        Self {
            specs,
            values: HashMap::new(),
        }
    }

    pub fn specs(&self) -> &[FlagSpec] {
        &self.specs
    }

    /// Parse tokens against the schema. Returns the positional remainder, or
    /// a user-facing reason why the input is invalid.
    pub fn parse(&mut self, tokens: &[String]) -> Result<Vec<String>, String> {
        let mut positional = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let tok = &tokens[i];
            if let Some(rest) = tok.strip_prefix("--") {
                let (name, inline) = match rest.split_once('=') {
                    Some((n, v)) => (n.to_string(), Some(v.to_string())),
                    None => (rest.to_string(), None),
                };
                let spec = self
                    .spec_by_long(&name)
                    .ok_or_else(|| format!("unknown flag --{name}"))?
                    .clone();
                i += 1;
                let value = self.take_value(&spec, inline, tokens, &mut i)?;
                self.values.insert(spec.long.clone(), value);
            } else if let Some(c) = short_flag_char(tok) {
                let spec = self
                    .spec_by_short(c)
                    .ok_or_else(|| format!("unknown flag -{c}"))?
                    .clone();
                i += 1;
                let value = self.take_value(&spec, None, tokens, &mut i)?;
                self.values.insert(spec.long.clone(), value);
            } else {
                positional.push(tok.clone());
                i += 1;
            }
        }

        for spec in &self.specs {
            if spec.required && !self.values.contains_key(&spec.long) {
                return Err(format!("missing required flag --{}", spec.long));
            }
        }
        Ok(positional)
    }

    fn take_value(
        &self,
        spec: &FlagSpec,
        inline: Option<String>,
        tokens: &[String],
        i: &mut usize,
    ) -> Result<String, String> {
        let raw = match (spec.kind, inline) {
            (FlagKind::Bool, Some(v)) => v,
            (FlagKind::Bool, None) => "true".to_string(),
            (_, Some(v)) => v,
            (_, None) => {
                if *i >= tokens.len() || tokens[*i].starts_with('-') {
                    return Err(format!("flag --{} requires a value", spec.long));
                }
                let v = tokens[*i].clone();
                *i += 1;
                v
            }
        };
        match spec.kind {
            FlagKind::Bool => match raw.as_str() {
                "true" | "false" => Ok(raw),
                other => Err(format!("flag --{} expects true/false, got \"{other}\"", spec.long)),
            },
            FlagKind::Int => raw
                .parse::<u64>()
                .map(|_| raw.clone())
                .map_err(|_| format!("flag --{} expects an integer, got \"{raw}\"", spec.long)),
            FlagKind::Text => Ok(raw),
        }
    }

    fn spec_by_long(&self, long: &str) -> Option<&FlagSpec> {
        self.specs.iter().find(|s| s.long == long)
    }

    fn spec_by_short(&self, c: char) -> Option<&FlagSpec> {
        self.specs.iter().find(|s| s.short == Some(c))
    }

    /// Parsed or default value for a flag.
    pub fn get(&self, long: &str) -> Option<String> {
        self.values
            .get(long)
            .cloned()
            .or_else(|| self.spec_by_long(long).and_then(|s| s.default.clone()))
    }

    /// True when the user set the flag explicitly.
    pub fn is_set(&self, long: &str) -> bool {
        self.values.contains_key(long)
    }

    /// Record a value directly, bypassing token parsing. Used by the global
    /// surface, which scans argv itself.
    pub fn set(&mut self, long: &str, value: &str) {
        if self.spec_by_long(long).is_some() {
            self.values.insert(long.to_string(), value.to_string());
        }
    }

    pub fn get_bool(&self, long: &str) -> bool {
        self.get(long).as_deref() == Some("true")
    }

    pub fn get_int(&self, long: &str) -> Option<u64> {
        self.get(long).and_then(|v| v.parse().ok())
    }

    /// Drop parsed values, keeping the schema. Restores the pristine state.
    pub fn reset(&mut self) {
        self.values.clear();
    }

    /// Usage block listing non-hidden flags, one per line.
    pub fn usage_block(&self) -> String {
        let mut out = String::new();
        for spec in self.specs.iter().filter(|s| !s.hidden) {
            let mut head = match spec.short {
                Some(c) => format!("-{c}, --{}", spec.long),
                None => format!("    --{}", spec.long),
            };
            if spec.kind != FlagKind::Bool {
                head.push_str(" <value>");
            }
            out.push_str(&format!("  {head:<28} {}", spec.usage));
            if let Some(d) = &spec.default {
                out.push_str(&format!(" (default: {d})"));
            }
            if spec.required {
                out.push_str(" (required)");
            }
            out.push('\n');
        }
        out
    }
}

/// `-x` where x is a letter; negative numbers and long flags do not match.
fn short_flag_char(tok: &str) -> Option<char> {
    let mut chars = tok.chars();
    if chars.next() != Some('-') {
        return None;
    }
    let c = chars.next()?;
    if chars.next().is_some() || !c.is_alphabetic() {
        return None;
    }
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> FlagSet {
        FlagSet::new(vec![
            FlagSpec::new("format", FlagKind::Text, "Output format").default_value("table"),
            FlagSpec::new("limit", FlagKind::Int, "Max rows").short('l'),
            FlagSpec::new("force", FlagKind::Bool, "Skip confirmation"),
        ])
    }

    #[test]
    fn parses_equals_and_space_forms() {
        let mut f = set();
        let rest = f.parse(&tokens(&["--format=csv", "--limit", "5", "extra"])).unwrap();
        assert_eq!(f.get("format").as_deref(), Some("csv"));
        assert_eq!(f.get_int("limit"), Some(5));
        assert_eq!(rest, vec!["extra"]);
    }

    #[test]
    fn shorthand_takes_value() {
        let mut f = set();
        f.parse(&tokens(&["-l", "9"])).unwrap();
        assert_eq!(f.get_int("limit"), Some(9));
    }

    #[test]
    fn bool_presence_and_explicit_false() {
        let mut f = set();
        f.parse(&tokens(&["--force"])).unwrap();
        assert!(f.get_bool("force"));
        let mut f = set();
        f.parse(&tokens(&["--force=false"])).unwrap();
        assert!(!f.get_bool("force"));
    }

    #[test]
    fn unknown_flag_is_user_facing() {
        let mut f = set();
        let err = f.parse(&tokens(&["--bogus"])).unwrap_err();
        assert!(err.contains("--bogus"));
    }

    #[test]
    fn missing_value_reports_flag_name() {
        let mut f = set();
        let err = f.parse(&tokens(&["--limit"])).unwrap_err();
        assert!(err.contains("--limit"));
    }

    #[test]
    fn missing_required_flag_named() {
        let mut f = FlagSet::new(vec![
            FlagSpec::new("name", FlagKind::Text, "Record name").required(),
        ]);
        let err = f.parse(&[]).unwrap_err();
        assert!(err.contains("--name"));
    }

    #[test]
    fn defaults_survive_reset() {
        let mut f = set();
        f.parse(&tokens(&["--format=json"])).unwrap();
        f.reset();
        assert_eq!(f.get("format").as_deref(), Some("table"));
        assert!(!f.is_set("format"));
    }

    #[test]
    fn hidden_flags_not_in_usage() {
        let f = FlagSet::new(vec![
            FlagSpec::new("visible", FlagKind::Bool, "Shown"),
            FlagSpec::new("help", FlagKind::Bool, "Hidden").hidden(),
        ]);
        let usage = f.usage_block();
        assert!(usage.contains("--visible"));
        assert!(!usage.contains("--help"));
    }

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }
}
