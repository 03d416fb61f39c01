//! Measurement classification
//!
//! Torque sends three kinds of uploads to the same route: sensor data, unit
//! declarations (`defaultUnit..`/`userUnit..`) and profile information
//! (`profileName`, ...). The kind selects the measurement a point is stored in.

use std::fmt;

const UNIT_PATTERNS: [&str; 2] = ["defaultunit", "userunit"];
const PROFILE_PATTERNS: [&str; 1] = ["profilename"];

/// Measurement a point is stored under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementCategory {
    Data,
    Units,
    Profile,
}

impl MeasurementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Units => "units",
            Self::Profile => "profile",
        }
    }
}

impl fmt::Display for MeasurementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_unit_key(key: &str) -> bool {
    UNIT_PATTERNS.iter().any(|pattern| key.contains(pattern))
}

pub fn is_profile_key(key: &str) -> bool {
    PROFILE_PATTERNS.iter().any(|pattern| key.contains(pattern))
}

/// Select the category for a set of lower-cased keys
///
/// Unit keys take precedence over profile keys: if any key is unit-like the
/// upload is `units`, whatever else it carries. The result depends only on
/// the key set, never on iteration order.
pub fn classify<'a, I>(keys: I) -> MeasurementCategory
where
    I: IntoIterator<Item = &'a str>,
{
    let mut has_profile = false;
    for key in keys {
        if is_unit_key(key) {
            return MeasurementCategory::Units;
        }
        has_profile |= is_profile_key(key);
    }

    if has_profile {
        MeasurementCategory::Profile
    } else {
        MeasurementCategory::Data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_when_no_pattern_matches() {
        let keys = ["v", "session", "id", "time", "kff1005", "k0c"];
        assert_eq!(classify(keys), MeasurementCategory::Data);
        assert_eq!(classify(Vec::<&str>::new()), MeasurementCategory::Data);
    }

    #[test]
    fn test_units() {
        assert_eq!(
            classify(["session", "defaultunit0d"]),
            MeasurementCategory::Units
        );
        assert_eq!(
            classify(["userunitff1001", "v"]),
            MeasurementCategory::Units
        );
    }

    #[test]
    fn test_profile() {
        assert_eq!(
            classify(["profilename", "profilefuelcost", "v"]),
            MeasurementCategory::Profile
        );
    }

    #[test]
    fn test_units_win_over_profile_in_any_order() {
        assert_eq!(
            classify(["profilename", "userunit0c"]),
            MeasurementCategory::Units
        );
        assert_eq!(
            classify(["userunit0c", "profilename"]),
            MeasurementCategory::Units
        );
    }

    #[test]
    fn test_pattern_is_substring_match() {
        assert!(is_unit_key("xdefaultunitx"));
        assert!(is_profile_key("myprofilename2"));
        assert!(!is_unit_key("unit"));
        assert!(!is_profile_key("profile"));
    }

    #[test]
    fn test_display() {
        assert_eq!(MeasurementCategory::Units.to_string(), "units");
        assert_eq!(MeasurementCategory::Profile.as_str(), "profile");
        assert_eq!(MeasurementCategory::Data.to_string(), "data");
    }
}
