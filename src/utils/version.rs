// src/utils/version.rs: numeric pipeline versions

use std::fmt;
use std::str::FromStr;

/// A `major.minor.patch` version compared numerically, field by field.
///
/// "1.10.0" orders after "1.8.0" even though it sorts before it as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SemVer {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SemVer {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        SemVer { major, minor, patch }
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemVer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(format!("'{}' is not a major.minor.patch version", s));
        }
        let mut fields = [0u32; 3];
        for (i, part) in parts.iter().enumerate() {
            fields[i] = part
                .parse::<u32>()
                .map_err(|_| format!("'{}' has a non-numeric component '{}'", s, part))?;
        }
        Ok(SemVer::new(fields[0], fields[1], fields[2]))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_not_lexicographic() {
        let a: SemVer = "1.10.0".parse().unwrap();
        let b: SemVer = "1.8.0".parse().unwrap();
        assert!("1.10.0" < "1.8.0");
        assert!(a > b);
    }

    #[test]
    fn test_requires_three_fields() {
        assert!("1.8".parse::<SemVer>().is_err());
        assert_eq!(" 1.8.0 ".parse::<SemVer>().unwrap(), SemVer::new(1, 8, 0));
        assert_eq!(SemVer::new(1, 8, 0).to_string(), "1.8.0");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("1".parse::<SemVer>().is_err());
        assert!("1.x.0".parse::<SemVer>().is_err());
        assert!("1.2.3.4".parse::<SemVer>().is_err());
        assert!("".parse::<SemVer>().is_err());
    }
}
