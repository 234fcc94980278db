use serde::{Deserialize, Deserializer, Serialize};

/// The hierarchy handed back by the concept service: one root topic plus a
/// flat list of subtopics that point at their parent by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMap {
    pub main_topic: Topic,
    pub subtopics: Vec<Subtopic>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub emoji: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subtopic {
    pub name: String,
    pub parent: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub emoji: String,
}

/// Models sometimes send `null` for a field they have nothing for.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl ConceptMap {
    pub fn new(main_topic: Topic) -> Self {
        Self {
            main_topic,
            subtopics: Vec::new(),
        }
    }

    pub fn with_subtopic(mut self, name: &str, parent: &str) -> Self {
        self.subtopics.push(Subtopic {
            name: name.to_string(),
            parent: parent.to_string(),
            ..Default::default()
        });
        self
    }
}

impl Topic {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}
