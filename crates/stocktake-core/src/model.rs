use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const MIN_AMOUNT: f64 = 0.0;
pub const MAX_AMOUNT: f64 = 100_000.0;

pub type ItemId = u64;
pub type ListId = u64;

/// A recorded quantity.
///
/// The server stores amounts as decimals and may send them either as JSON
/// numbers or as decimal strings (`"4.0"`). Rendering drops insignificant
/// formatting, so `"4.0"` displays as `4` and `"2.50"` as `2.5`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(f64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("'{input}' is not a number")]
    NotANumber { input: String },
    #[error("amount {value} must be between 0 and 100000")]
    OutOfRange { value: String },
}

impl Amount {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Parses user input and enforces the server's accepted range.
    pub fn parse_input(input: &str) -> Result<Self, AmountError> {
        let amount: Amount = input.parse()?;
        if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&amount.0) {
            return Err(AmountError::OutOfRange {
                value: amount.to_string(),
            });
        }
        Ok(amount)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Self(value)),
            _ => Err(AmountError::NotANumber {
                input: input.to_string(),
            }),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // -0 renders as 0
        if self.0 == 0.0 {
            return write!(f, "0");
        }
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl Visitor<'_> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number or a decimal string")
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<Amount, E> {
                Ok(Amount(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Amount, E> {
                Ok(Amount(value as f64))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Amount, E> {
                Ok(Amount(value as f64))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Amount, E> {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ListKind {
    Count,
    Addition,
    Subtraction,
    Other(String),
}

impl ListKind {
    pub fn label(&self) -> &str {
        match self {
            Self::Count => "Count",
            Self::Addition => "Addition",
            Self::Subtraction => "Subtraction",
            Self::Other(value) => value.as_str(),
        }
    }

    pub fn is_count(&self) -> bool {
        matches!(self, Self::Count)
    }
}

impl From<String> for ListKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Count" | "CO" => Self::Count,
            "Addition" | "AD" => Self::Addition,
            "Subtraction" | "SU" => Self::Subtraction,
            _ => Self::Other(value),
        }
    }
}

impl From<ListKind> for String {
    fn from(value: ListKind) -> Self {
        value.label().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItemRef {
    pub list_id: ListId,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub list_items: Vec<ListItemRef>,
}

impl Item {
    pub fn amount_for(&self, list_id: ListId) -> Option<Amount> {
        self.list_items
            .iter()
            .find(|list_item| list_item.list_id == list_id)
            .map(|list_item| list_item.amount)
    }

    /// Inserts or replaces the record for `list_id`. Returns `true` when the
    /// item had no record for that list before.
    pub fn upsert_amount(&mut self, list_id: ListId, amount: Amount) -> bool {
        match self
            .list_items
            .iter_mut()
            .find(|list_item| list_item.list_id == list_id)
        {
            Some(existing) => {
                existing.amount = amount;
                false
            }
            None => {
                self.list_items.push(ListItemRef { list_id, amount });
                true
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ListKind,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemsSnapshot {
    pub items: Vec<Item>,
    pub lists: Vec<List>,
}

impl ItemsSnapshot {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
