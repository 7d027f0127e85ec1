use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Architecture the emitted names are for.
    #[serde(default = "defaults::target", deserialize_with = "target")]
    pub target: Target,

    /// Keep symbols that failed to transcode under their original name.
    #[serde(default = "defaults::passthrough")]
    pub passthrough: bool,

    /// Drop symbols that aren't Itanium names to begin with, such as C functions.
    #[serde(default = "defaults::skip_unmangled")]
    pub skip_unmangled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    X86,
    X64,
}

impl Target {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "x86" | "i386" | "i686" => Some(Target::X86),
            "x64" | "x86_64" | "amd64" => Some(Target::X64),
            _ => None,
        }
    }

    pub fn options(self) -> symbols::msvc::Options {
        symbols::msvc::Options {
            ptr64: self == Target::X64,
        }
    }
}

/// Default values when one is missing in the config.yaml.
mod defaults {
    use super::Target;

    pub fn target() -> Target {
        Target::X86
    }
    pub fn passthrough() -> bool {
        true
    }
    pub fn skip_unmangled() -> bool {
        false
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: defaults::target(),
            passthrough: defaults::passthrough(),
            skip_unmangled: defaults::skip_unmangled(),
        }
    }
}

impl Config {
    /// Read the config at `path`, or at the user's config directory if none is given.
    pub fn parse(path: Option<&Path>) -> Self {
        let explicit = path.is_some();
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_path() {
                Some(path) => path,
                None => {
                    log::warning!("No config directory found, using the default config.");
                    return Self::default();
                }
            },
        };

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            // no config in the user's config directory is fine
            Err(err) if !explicit && err.kind() == std::io::ErrorKind::NotFound => {
                return Self::default();
            }
            Err(err) => {
                log::warning!("Failed to read config {path:?}.\nError: {err}.");
                return Self::default();
            }
        };

        match Self::from_yaml(&raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::warning!("Failed to parse config {path:?}.\nError: {err}.");

                // parse everything as default
                Self::default()
            }
        }
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(raw)
    }
}

fn default_path() -> Option<PathBuf> {
    let mut dir = dirs::config_dir()?;
    dir.push("symbridge");
    dir.push("config.yaml");
    Some(dir)
}

fn target<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Target, D::Error> {
    struct TargetParsing;
    impl<'de> Visitor<'de> for TargetParsing {
        type Value = Target;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("expected either x86 or x64")
        }

        fn visit_str<E: de::Error>(self, s: &str) -> Result<Self::Value, E> {
            Target::from_name(s).ok_or_else(|| E::custom(format!("unknown target '{s}'")))
        }
    }

    deserializer.deserialize_str(TargetParsing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
        assert_eq!(Config::from_yaml("\n  \n").unwrap(), Config::default());
    }

    #[test]
    fn partial_config() {
        let config = Config::from_yaml("target: amd64").unwrap();
        assert_eq!(config.target, Target::X64);
        assert!(config.passthrough);
        assert!(!config.skip_unmangled);

        let config = Config::from_yaml("passthrough: false\nskip_unmangled: true").unwrap();
        assert_eq!(config.target, Target::X86);
        assert!(!config.passthrough);
        assert!(config.skip_unmangled);
    }

    #[test]
    fn bad_target() {
        assert!(Config::from_yaml("target: sparc").is_err());
    }

    #[test]
    fn targets() {
        assert_eq!(Target::from_name("X86_64"), Some(Target::X64));
        assert_eq!(Target::from_name("i386"), Some(Target::X86));
        assert!(Target::X64.options().ptr64);
        assert!(!Target::X86.options().ptr64);
    }

    #[test]
    fn missing_file_is_default() {
        let config = Config::parse(Some(Path::new("/nonexistent/symbridge/config.yaml")));
        assert_eq!(config, Config::default());

        let logger = log::LOGGER.lock().unwrap();
        let warned = logger.lines().any(|(line, level)| {
            *level == log::Level::Warning
                && line.starts_with("Failed to read config")
                && line.contains("/nonexistent/symbridge/config.yaml")
        });
        assert!(warned, "a missing config should be reported");
    }
}
