use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};

/// A request path such as `.slp.findsrvs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScrPath {
    components: Vec<String>,
}

/// Returned when a dotted path contains an empty component, e.g. `.slp..reg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePathError(String);

impl fmt::Display for ParsePathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid path {:?}: empty component", self.0)
    }
}

impl std::error::Error for ParsePathError {}

impl ScrPath {
    pub fn new<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            components: components.into_iter().map(Into::into).collect(),
        }
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Trailing component, the one selecting the operation
    pub fn last(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl FromStr for ScrPath {
    type Err = ParsePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix('.').unwrap_or(s);
        if body.is_empty() {
            return Ok(Self::default());
        }
        let components: Vec<String> = body.split('.').map(str::to_string).collect();
        if components.iter().any(String::is_empty) {
            return Err(ParsePathError(s.to_string()));
        }
        Ok(Self { components })
    }
}

impl TryFrom<String> for ScrPath {
    type Error = ParsePathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ScrPath> for String {
    fn from(path: ScrPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for ScrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, ".");
        }
        for component in &self.components {
            write!(f, ".{}", component)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotted_path() {
        let path: ScrPath = ".slp.findsrvs".parse().unwrap();
        assert_eq!(path.components(), &["slp".to_string(), "findsrvs".to_string()]);
        assert_eq!(path.last(), Some("findsrvs"));
        assert_eq!(path.to_string(), ".slp.findsrvs");
    }

    #[test]
    fn test_root_path() {
        let path: ScrPath = ".".parse().unwrap();
        assert!(path.is_empty());
        assert_eq!(path.last(), None);
        assert_eq!(path.to_string(), ".");
    }

    #[test]
    fn test_empty_component_rejected() {
        assert!(".slp..reg".parse::<ScrPath>().is_err());
        assert!(".slp.".parse::<ScrPath>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let path: ScrPath = serde_json::from_str(r#"".slp.reg""#).unwrap();
        assert_eq!(path, ScrPath::new(["slp", "reg"]));
        assert_eq!(serde_json::to_string(&path).unwrap(), r#"".slp.reg""#);
    }
}
