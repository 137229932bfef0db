use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ProducerId;

/// A source in the project bin, as far as the timeline needs to know it.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Producer {
    pub id: ProducerId,
    pub name: String,
    /// Native length in frames.
    pub length: i64,
    /// Generators (color, title) can be stretched without limit.
    #[serde(default)]
    pub endless: bool,
}

impl Producer {
    pub fn new(name: &str, length: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            length,
            endless: false,
        }
    }

    pub fn endless(name: &str, length: i64) -> Self {
        Self {
            endless: true,
            ..Self::new(name, length)
        }
    }
}

/// Read access to the bin. The timeline only looks producers up when a clip
/// is constructed.
pub trait ProducerLookup {
    fn producer(&self, id: ProducerId) -> Option<&Producer>;
}

/// In-memory bin.
#[derive(Default, Debug)]
pub struct BinModel {
    producers: HashMap<ProducerId, Producer>,
}

impl BinModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a producer and return its id.
    pub fn add_producer(&mut self, producer: Producer) -> ProducerId {
        let id = producer.id;
        self.producers.insert(id, producer);
        id
    }

    pub fn remove(&mut self, id: ProducerId) -> Option<Producer> {
        self.producers.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }

    pub fn clean(&mut self) {
        self.producers.clear();
    }
}

impl ProducerLookup for BinModel {
    fn producer(&self, id: ProducerId) -> Option<&Producer> {
        self.producers.get(&id)
    }
}
