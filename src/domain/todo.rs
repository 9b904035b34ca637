use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Largest order a todo may hold; clients treat orders as JSON numbers.
pub const MAX_ORDER: i64 = 9_007_199_254_740_991;

/// Every order up to [`MAX_ORDER`] is taken, so a new todo has nowhere to go.
#[derive(Debug, Error)]
#[error("no order above {} is available", MAX_ORDER)]
pub struct OrderExhausted;

/// Identifier assigned by the store when a todo is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TodoId(pub Uuid);

impl TodoId {
    pub fn new() -> Self { Self(Uuid::new_v4()) }

    /// Parses a path segment. Anything that isn't a UUID can't name a stored todo.
    pub fn parse(s: &str) -> Option<Self> { Uuid::parse_str(s).ok().map(Self) }
}

impl Default for TodoId {
    fn default() -> Self { Self::new() }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: TodoId,
    pub value: String,
    pub order: i64,
    #[serde(rename = "doneAt")]
    pub done_at: Option<DateTime<Utc>>,
}

impl Todo {
    pub fn is_done(&self) -> bool { self.done_at.is_some() }
}

/// A validated creation payload. The order is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTodo {
    pub value: String,
}

/// Partial update of a todo.
///
/// `done` distinguishes an absent key (`None`) from an explicit `null`
/// (`Some(None)`), which clears completion just like `false`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct UpdateTodo {
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default, deserialize_with = "present")]
    pub done: Option<Option<bool>>,
    #[serde(default)]
    pub value: Option<String>,
}

impl UpdateTodo {
    /// Requested order, ignoring zero.
    pub fn target_order(&self) -> Option<i64> { self.order.filter(|o| *o != 0) }

    /// Completion to apply, if the key was sent at all.
    pub fn completion(&self) -> Option<bool> { self.done.map(|d| d.unwrap_or(false)) }

    /// Replacement text; empty strings leave the value untouched.
    pub fn new_value(&self) -> Option<&str> { self.value.as_deref().filter(|v| !v.is_empty()) }
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<bool>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(Some)
}
