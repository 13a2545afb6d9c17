//! Loading of the heuristics rules file.
//!
//! ```toml
//! [[person_non_grata]]
//! name = "Bob Marley"
//!
//! [[person_non_grata]]
//! name = "Peter Tosh"
//! birth_date = "19.10.1944"
//! ```

use std::path::Path;

use banhammer_core::rules::RuleSet;

use crate::error::Error;

/// Read, decode and validate the rules file at `path`.
pub fn load_rules(path: &Path) -> Result<RuleSet, Error> {
  let raw = std::fs::read_to_string(path).map_err(|source| Error::ReadHeuristics {
    path: path.to_path_buf(),
    source,
  })?;
  parse_rules(&raw)
}

/// Decode and validate rules from TOML text.
pub fn parse_rules(raw: &str) -> Result<RuleSet, Error> {
  let rules: RuleSet = toml::from_str(raw)?;
  rules.validate()?;
  Ok(rules)
}
