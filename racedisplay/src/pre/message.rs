use anyhow::Context;
use helpers::general::number_text;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::convert::TryFrom;
use std::fmt;

/// Action is the `action` discriminator of the messages the display knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Setup,
    Warmup,
    Update,
    Finish,
    Leaderboard,
    Cancel,
}

impl Action {
    pub fn from_tag(tag: &str) -> Option<Action> {
        match tag {
            "setup" => Some(Action::Setup),
            "warmup" => Some(Action::Warmup),
            "update" => Some(Action::Update),
            "finish" => Some(Action::Finish),
            "leaderboard" => Some(Action::Leaderboard),
            "cancel" => Some(Action::Cancel),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Action::Setup => "setup",
            Action::Warmup => "warmup",
            Action::Update => "update",
            Action::Finish => "finish",
            Action::Leaderboard => "leaderboard",
            Action::Cancel => "cancel",
        }
    }
}

/// Field distinguishes a key missing from the payload from a key explicitly set to null.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Absent
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Field::Value(value),
            None => Field::Null,
        })
    }
}

/// Position is the ranking display value, sent either as a number or as a ready-made label.
#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    Rank(i64),
    Label(String),
}

impl Position {
    /// from_value builds the display value. Integral numbers (also `1.0`) become a rank, other
    /// numbers and strings a label; anything else carries no position.
    pub fn from_value(value: &Value) -> Option<Position> {
        match value {
            Value::Number(number) => {
                if let Some(rank) = number.as_i64() {
                    return Some(Position::Rank(rank));
                }
                let x = number.as_f64()?;
                if x.fract() == 0.0 && x.abs() < 1e15 {
                    Some(Position::Rank(x as i64))
                } else {
                    Some(Position::Label(number_text(x)))
                }
            }
            Value::String(label) => Some(Position::Label(label.to_owned())),
            _ => None,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Position::Rank(rank) => write!(f, "{}", rank),
            Position::Label(label) => write!(f, "{}", label),
        }
    }
}

/// * `name` - Name of the rule set used for this race
/// * `gates` - Labels of the active gates, in route order
/// * `lap_target` - Number of laps needed to clear the race, if relevant
/// * `time_limit_ds` - (ds) Time available before the race ends, if relevant
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct RaceDescriptor {
    #[serde(rename = "nom", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "portes", default, deserialize_with = "lenient_strings")]
    pub gates: Vec<String>,
    #[serde(rename = "tours", default, deserialize_with = "lenient_u32")]
    pub lap_target: Option<u32>,
    #[serde(rename = "temps", default, deserialize_with = "lenient_u64")]
    pub time_limit_ds: Option<u64>,
}

/// * `id` - Identification of the beacon given to the pilot for the race
/// * `name` - Name of the pilot
/// * `drone` - Kind of drone flown
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CompetitorEntry {
    pub id: u32,
    #[serde(rename = "nom", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub drone: String,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct SetupPayload {
    #[serde(rename = "course", default)]
    pub race: RaceDescriptor,
    #[serde(rename = "pilotes", default)]
    pub competitors: Vec<CompetitorEntry>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct WarmupPayload {
    #[serde(rename = "texte", default, deserialize_with = "lenient_string")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub start: bool,
}

/// DroneStatus is the per-competitor record carried by `update` messages and by each entry of a
/// `leaderboard`. Times are in seconds; every field but `id` may be missing, and values of an
/// unexpected type count as missing.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct DroneStatus {
    pub id: u32,
    #[serde(default, deserialize_with = "lenient_position")]
    pub position: Option<Position>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub points: Option<f64>,
    #[serde(rename = "temps", default, deserialize_with = "lenient_f64")]
    pub elapsed_s: Option<f64>,
    #[serde(rename = "tours", default, deserialize_with = "lenient_u32")]
    pub laps: Option<u32>,
    #[serde(rename = "retard", default, deserialize_with = "lenient_f64")]
    pub lag_s: Option<f64>,
    #[serde(rename = "tour", default, deserialize_with = "lenient_f64")]
    pub lap_time_s: Option<f64>,
    #[serde(rename = "porte", default)]
    pub gate: Field<Value>,
    #[serde(default)]
    pub finish: Field<bool>,
}

impl DroneStatus {
    /// gate_label returns the new gate cell text, `None` if the message does not carry a gate.
    /// Falsy gate values (null, false, "", 0) reset the cell to "-".
    pub fn gate_label(&self) -> Option<String> {
        match &self.gate {
            Field::Absent => None,
            Field::Null => Some(String::from("-")),
            Field::Value(value) => Some(truthy_text(value).unwrap_or_else(|| String::from("-"))),
        }
    }
}

fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some(String::from("true")),
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.to_owned()),
        Value::Number(number) if number.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

// LENIENT FIELD DECODING ----------------------------------------------------------------------

fn number(value: &Value) -> Option<f64> {
    let x = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse().ok()?,
        _ => return None,
    };
    if x.is_finite() {
        Some(x)
    } else {
        None
    }
}

fn count(value: &Value) -> Option<u64> {
    number(value)
        .filter(|x| *x >= 0.0)
        .map(|x| x.round() as u64)
}

fn text(value: &Value) -> String {
    match value {
        Value::String(text) => text.to_owned(),
        Value::Number(number) => number
            .as_f64()
            .map_or_else(|| number.to_string(), number_text),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(text(&Value::deserialize(deserializer)?))
}

fn lenient_strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.iter().map(text).collect(),
        _ => Vec::new(),
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(number(&Value::deserialize(deserializer)?))
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(count(&Value::deserialize(deserializer)?).and_then(|n| u32::try_from(n).ok()))
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(count(&Value::deserialize(deserializer)?))
}

fn lenient_position<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Position>, D::Error> {
    Ok(Position::from_value(&Value::deserialize(deserializer)?))
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct LeaderboardPayload {
    #[serde(default)]
    pub drones: Vec<DroneStatus>,
}

/// Message is one decoded message of the race server. Anything whose `action` is not known ends up
/// in `Other` with its complete JSON content.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Setup(SetupPayload),
    Warmup(WarmupPayload),
    Update(DroneStatus),
    Finish,
    Leaderboard(LeaderboardPayload),
    Cancel,
    Other(Value),
}

impl Message {
    /// decode parses one JSON text into a message.
    pub fn decode(text: &str) -> anyhow::Result<Message> {
        let value: Value = serde_json::from_str(text).context("Message is not valid JSON!")?;
        Message::from_value(value)
    }

    /// from_value interprets an already parsed JSON value as a message.
    pub fn from_value(value: Value) -> anyhow::Result<Message> {
        if !value.is_object() {
            anyhow::bail!("Message must be a JSON object, got {}!", value);
        }

        let action = match value
            .get("action")
            .and_then(Value::as_str)
            .and_then(Action::from_tag)
        {
            Some(action) => action,
            None => return Ok(Message::Other(value)),
        };

        let message = match action {
            Action::Setup => Message::Setup(
                serde_json::from_value(value).context("Failed to decode setup message!")?,
            ),
            Action::Warmup => Message::Warmup(
                serde_json::from_value(value).context("Failed to decode warmup message!")?,
            ),
            Action::Update => Message::Update(
                serde_json::from_value(value).context("Failed to decode update message!")?,
            ),
            Action::Leaderboard => Message::Leaderboard(
                serde_json::from_value(value).context("Failed to decode leaderboard message!")?,
            ),
            Action::Finish => Message::Finish,
            Action::Cancel => Message::Cancel,
        };
        Ok(message)
    }

    /// action returns the known action of the message, `None` for `Other`.
    pub fn action(&self) -> Option<Action> {
        match self {
            Message::Setup(_) => Some(Action::Setup),
            Message::Warmup(_) => Some(Action::Warmup),
            Message::Update(_) => Some(Action::Update),
            Message::Finish => Some(Action::Finish),
            Message::Leaderboard(_) => Some(Action::Leaderboard),
            Message::Cancel => Some(Action::Cancel),
            Message::Other(_) => None,
        }
    }
}
