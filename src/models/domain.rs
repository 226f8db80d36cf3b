use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One matched neighborhood pair, as emitted to the client
///
/// The text fields come straight from the model. Images and map links are
/// attached during enrichment, so a value of this type is always complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodMatch {
    pub neighborhood1: String,
    pub neighborhood1_description: String,
    pub neighborhood2: String,
    pub neighborhood2_description: String,
    pub similarity_reason: String,
    #[serde(default)]
    pub characteristics: Vec<String>,
    pub image1: Option<String>,
    pub image2: Option<String>,
    pub maps_link1: String,
    pub maps_link2: String,
}

/// Text fields of a match as produced by the model, before enrichment
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawMatch {
    pub neighborhood1: String,
    pub neighborhood1_description: String,
    pub neighborhood2: String,
    pub neighborhood2_description: String,
    pub similarity_reason: String,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub characteristics: Vec<String>,
}

/// Accept whatever the model wrote for `characteristics`
///
/// `null` is an empty list, a bare string is one tag, and scalar entries
/// are stringified. Nested arrays and objects are dropped.
fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    fn tag(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(tag).collect(),
        other => tag(other).into_iter().collect(),
    })
}

/// Static list of selectable cities, grouped by country
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityCatalog {
    pub countries: Vec<Country>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    pub cities: Vec<String>,
}
