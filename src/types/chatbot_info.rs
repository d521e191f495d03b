use serde::{Deserialize, Serialize};

/// The span of dates covered by the backend's price data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DateRange {
    /// First date with data, as formatted by the backend.
    pub start: String,

    /// Last date with data, as formatted by the backend.
    pub end: String,
}

impl DateRange {
    /// Returns true if neither bound is known.
    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.end.is_empty()
    }
}

/// Reference data served by `GET /info`.
///
/// These lookup lists are for display only and play no part in the chat
/// exchange. The `Default` value is the empty shape kept when the fetch
/// fails.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChatbotInfo {
    /// Food items the backend has prices for.
    pub foods: Vec<String>,

    /// States covered by the data.
    pub states: Vec<String>,

    /// Local government areas covered by the data.
    pub lgas: Vec<String>,

    /// Market outlet types.
    pub outlets: Vec<String>,

    /// Dates covered by the data.
    pub date_range: DateRange,
}

impl ChatbotInfo {
    /// Returns true if nothing has been loaded.
    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
            && self.states.is_empty()
            && self.lgas.is_empty()
            && self.outlets.is_empty()
            && self.date_range.is_empty()
    }
}
