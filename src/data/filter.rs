use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::IngestError;

// ---------------------------------------------------------------------------
// Dataset selection: which per-unit files take part in a load
// ---------------------------------------------------------------------------

/// Unit codes kept by [`DatasetSelector::mid`].
pub const MID_UNITS: [&str; 10] = ["HL", "BX", "BE", "ST", "SY", "PZWA", "MS", "KI", "OO", "BR"];

/// Number of files kept by [`DatasetSelector::few`].
pub const FEW_COUNT: usize = 3;

/// File selection policy applied to the sorted list of borehole CSV files.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DatasetSelector {
    /// Keep every file.
    #[default]
    NoFilter,
    /// Keep the first `n` files.
    FirstN(usize),
    /// Keep files whose unit prefix is one of the listed codes.
    AllowList(BTreeSet<String>),
}

impl DatasetSelector {
    pub fn few() -> Self {
        DatasetSelector::FirstN(FEW_COUNT)
    }

    pub fn mid() -> Self {
        DatasetSelector::AllowList(MID_UNITS.iter().map(|s| s.to_string()).collect())
    }

    pub fn all() -> Self {
        DatasetSelector::NoFilter
    }

    /// Apply the policy to `(unit, item)` pairs, keeping their order.
    pub fn apply<T>(&self, files: Vec<(String, T)>) -> Vec<(String, T)> {
        match self {
            DatasetSelector::NoFilter => files,
            DatasetSelector::FirstN(n) => files.into_iter().take(*n).collect(),
            DatasetSelector::AllowList(units) => files
                .into_iter()
                .filter(|(unit, _)| units.contains(unit))
                .collect(),
        }
    }
}

impl FromStr for DatasetSelector {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "few" => Ok(Self::few()),
            "mid" => Ok(Self::mid()),
            "all" => Ok(Self::all()),
            _ => Err(IngestError::InvalidSelector(s.to_string())),
        }
    }
}

impl fmt::Display for DatasetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSelector::NoFilter => write!(f, "all"),
            DatasetSelector::FirstN(n) if *n == FEW_COUNT => write!(f, "few"),
            DatasetSelector::FirstN(n) => write!(f, "first {n}"),
            DatasetSelector::AllowList(_) if *self == Self::mid() => write!(f, "mid"),
            DatasetSelector::AllowList(units) => {
                let list: Vec<&str> = units.iter().map(String::as_str).collect();
                write!(f, "units [{}]", list.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(units: &[&str]) -> Vec<(String, usize)> {
        units
            .iter()
            .enumerate()
            .map(|(i, u)| (u.to_string(), i))
            .collect()
    }

    #[test]
    fn test_parse_named_policies() {
        assert_eq!("few".parse::<DatasetSelector>().unwrap(), DatasetSelector::FirstN(3));
        assert_eq!("MID".parse::<DatasetSelector>().unwrap(), DatasetSelector::mid());
        assert_eq!(" all ".parse::<DatasetSelector>().unwrap(), DatasetSelector::NoFilter);
    }

    #[test]
    fn test_parse_unknown_policy_fails() {
        let err = "most".parse::<DatasetSelector>().unwrap_err();
        assert!(matches!(err, IngestError::InvalidSelector(ref s) if s == "most"));
    }

    #[test]
    fn test_first_n_keeps_order_and_tolerates_short_lists() {
        let kept = DatasetSelector::few().apply(files(&["A", "B", "C", "D"]));
        assert_eq!(kept.iter().map(|(_, i)| *i).collect::<Vec<_>>(), vec![0, 1, 2]);

        let kept = DatasetSelector::few().apply(files(&["A", "B"]));
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_allow_list_matches_unit_codes() {
        let kept = DatasetSelector::mid().apply(files(&["HL", "AAOP", "BR", "PZWA", "NIHO"]));
        let units: Vec<&str> = kept.iter().map(|(u, _)| u.as_str()).collect();
        assert_eq!(units, vec!["HL", "BR", "PZWA"]);
    }

    #[test]
    fn test_display_round_trips_named_policies() {
        for name in ["few", "mid", "all"] {
            let selector: DatasetSelector = name.parse().unwrap();
            assert_eq!(selector.to_string(), name);
        }
    }
}
