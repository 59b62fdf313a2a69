use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Distinct values of an identity column such as the callsign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Identity {
    Unique(String),
    Ambiguous(BTreeSet<String>),
}

impl Identity {
    /// Collects the distinct non-null values. `None` when there are none.
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a Option<String>>) -> Option<Self> {
        let mut distinct: BTreeSet<String> = values.into_iter().flatten().cloned().collect();
        match distinct.len() {
            0 => None,
            1 => distinct.pop_first().map(Identity::Unique),
            _ => Some(Identity::Ambiguous(distinct)),
        }
    }

    pub fn unique(&self) -> Option<&str> {
        match self {
            Identity::Unique(v) => Some(v),
            Identity::Ambiguous(_) => None,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Unique(v) => write!(f, "{}", v),
            Identity::Ambiguous(values) => {
                let joined: Vec<&str> = values.iter().map(String::as_str).collect();
                write!(f, "{{{}}}", joined.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AircraftInfo {
    pub registration: String,
    pub model: String,
}

/// Lookup of aircraft details by transponder address.
pub trait AircraftRegistry {
    fn lookup(&self, icao24: &str) -> Option<AircraftInfo>;
}

impl AircraftRegistry for std::collections::HashMap<String, AircraftInfo> {
    fn lookup(&self, icao24: &str) -> Option<AircraftInfo> {
        self.get(icao24).cloned()
    }
}
