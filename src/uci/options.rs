//! Engine options applied via `setoption`.

use std::fmt;

/// Option values with their advertised ranges. Out-of-range values are
/// clamped, never rejected.
#[derive(Clone, Debug)]
pub struct EngineOptions {
    pub multipv: usize,
    pub skill_level: i32,
    pub threads: usize,
    pub hash_mb: usize,
    pub use_nnue: bool,
    pub book_file: Option<String>,
}

pub const MULTIPV_RANGE: (usize, usize) = (1, 100);
pub const SKILL_LEVEL_RANGE: (i32, i32) = (1, 20);
pub const THREADS_RANGE: (usize, usize) = (1, 256);
pub const HASH_RANGE: (usize, usize) = (1, 262_144);

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            multipv: 1,
            skill_level: 20,
            threads: 1,
            hash_mb: crate::tt::DEFAULT_TT_MB,
            use_nnue: false,
            book_file: None,
        }
    }
}

/// Which option an accepted `setoption` changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionChange {
    MultiPv,
    SkillLevel,
    Threads,
    Hash,
    UseNnue,
    BookFile,
}

#[derive(Clone, Debug)]
pub enum OptionError {
    UnknownOption { name: String },
    MissingValue { name: String },
    InvalidValue { name: String, value: String },
}

impl fmt::Display for OptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionError::UnknownOption { name } => write!(f, "unknown option '{name}'"),
            OptionError::MissingValue { name } => {
                write!(f, "option '{name}' requires a value")
            }
            OptionError::InvalidValue { name, value } => {
                write!(f, "invalid value '{value}' for option '{name}'")
            }
        }
    }
}

impl std::error::Error for OptionError {}

impl EngineOptions {
    /// The `option name ...` lines emitted in reply to `uci`.
    #[must_use]
    pub fn uci_declarations() -> Vec<String> {
        vec![
            format!(
                "option name MultiPV type spin default 1 min {} max {}",
                MULTIPV_RANGE.0, MULTIPV_RANGE.1
            ),
            format!(
                "option name Skill Level type spin default 20 min {} max {}",
                SKILL_LEVEL_RANGE.0, SKILL_LEVEL_RANGE.1
            ),
            format!(
                "option name Threads type spin default 1 min {} max {}",
                THREADS_RANGE.0, THREADS_RANGE.1
            ),
            format!(
                "option name Hash type spin default {} min {} max {}",
                crate::tt::DEFAULT_TT_MB,
                HASH_RANGE.0,
                HASH_RANGE.1
            ),
            "option name Use NNUE type check default false".to_string(),
            "option name Book File type string default <empty>".to_string(),
        ]
    }

    /// Apply one option by name (matched case-insensitively). Numeric values
    /// are clamped to their advertised ranges.
    pub fn apply(
        &mut self,
        name: &str,
        value: Option<&str>,
    ) -> Result<OptionChange, OptionError> {
        let lowered = name.to_ascii_lowercase();
        fn require<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, OptionError> {
            value.ok_or(OptionError::MissingValue {
                name: name.to_string(),
            })
        }
        let parse_int = |value: &str| {
            value.parse::<i64>().map_err(|_| OptionError::InvalidValue {
                name: name.to_string(),
                value: value.to_string(),
            })
        };

        match lowered.as_str() {
            "multipv" => {
                let v = parse_int(require(value, name)?)?;
                self.multipv =
                    (v.max(0) as usize).clamp(MULTIPV_RANGE.0, MULTIPV_RANGE.1);
                Ok(OptionChange::MultiPv)
            }
            "skill level" => {
                let v = parse_int(require(value, name)?)?;
                self.skill_level = (v as i32).clamp(SKILL_LEVEL_RANGE.0, SKILL_LEVEL_RANGE.1);
                Ok(OptionChange::SkillLevel)
            }
            "threads" => {
                let v = parse_int(require(value, name)?)?;
                self.threads = (v.max(0) as usize).clamp(THREADS_RANGE.0, THREADS_RANGE.1);
                Ok(OptionChange::Threads)
            }
            "hash" => {
                let v = parse_int(require(value, name)?)?;
                self.hash_mb = (v.max(0) as usize).clamp(HASH_RANGE.0, HASH_RANGE.1);
                Ok(OptionChange::Hash)
            }
            "use nnue" => {
                let v = require(value, name)?;
                self.use_nnue = match v.to_ascii_lowercase().as_str() {
                    "true" | "1" | "on" => true,
                    "false" | "0" | "off" => false,
                    _ => {
                        return Err(OptionError::InvalidValue {
                            name: name.to_string(),
                            value: v.to_string(),
                        })
                    }
                };
                Ok(OptionChange::UseNnue)
            }
            "book file" => {
                self.book_file = value.map(str::to_string);
                Ok(OptionChange::BookFile)
            }
            _ => Err(OptionError::UnknownOption {
                name: name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EngineOptions::default();
        assert_eq!(options.multipv, 1);
        assert_eq!(options.skill_level, 20);
        assert_eq!(options.threads, 1);
    }

    #[test]
    fn test_case_insensitive_names() {
        let mut options = EngineOptions::default();
        assert!(options.apply("MULTIPV", Some("3")).is_ok());
        assert_eq!(options.multipv, 3);
        assert!(options.apply("skill level", Some("5")).is_ok());
        assert_eq!(options.skill_level, 5);
    }

    #[test]
    fn test_values_clamped() {
        let mut options = EngineOptions::default();
        options.apply("Hash", Some("99999999")).unwrap();
        assert_eq!(options.hash_mb, HASH_RANGE.1);
        options.apply("Threads", Some("0")).unwrap();
        assert_eq!(options.threads, 1);
        options.apply("Skill Level", Some("-4")).unwrap();
        assert_eq!(options.skill_level, 1);
    }

    #[test]
    fn test_errors() {
        let mut options = EngineOptions::default();
        assert!(options.apply("NoSuchOption", Some("1")).is_err());
        assert!(options.apply("Hash", None).is_err());
        assert!(options.apply("Hash", Some("abc")).is_err());
        assert!(options.apply("Use NNUE", Some("maybe")).is_err());
    }

    #[test]
    fn test_use_nnue_check_values() {
        let mut options = EngineOptions::default();
        options.apply("Use NNUE", Some("true")).unwrap();
        assert!(options.use_nnue);
        options.apply("use nnue", Some("false")).unwrap();
        assert!(!options.use_nnue);
    }
}
