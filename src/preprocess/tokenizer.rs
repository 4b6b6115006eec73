use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use super::VocabularyError;

/// Class ID of every descriptor the vocabulary has not seen.
pub const UNKNOWN_CLASS: i32 = 0;

/// Maps feature descriptors to small integer classes.
///
/// IDs are handed out from 1 in first-seen order while `train` is on; a
/// frozen tokenizer maps anything new to [`UNKNOWN_CLASS`]. Only the
/// vocabulary is serialized, the train flag always comes back off.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    into = "VocabularyRecord<T>",
    try_from = "VocabularyRecord<T>",
    bound(
        serialize = "T: Serialize + Clone + Eq + Hash",
        deserialize = "T: Deserialize<'de> + Clone + Eq + Hash + std::fmt::Debug"
    )
)]
pub struct Tokenizer<T: Clone + Eq + Hash> {
    vocabulary: Vec<T>,
    ids: HashMap<T, i32>,
    train: bool,
}

/// Persisted form of a [`Tokenizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyRecord<T> {
    pub vocabulary: Vec<T>,
}

impl<T: Clone + Eq + Hash> Default for Tokenizer<T> {
    fn default() -> Self {
        Self {
            vocabulary: Vec::new(),
            ids: HashMap::new(),
            train: false,
        }
    }
}

impl<T: Clone + Eq + Hash> Tokenizer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_training(&self) -> bool {
        self.train
    }

    pub fn set_train(&mut self, train: bool) {
        self.train = train;
    }

    /// The class of `descriptor`, growing the vocabulary in train mode.
    pub fn tokenize(&mut self, descriptor: &T) -> i32 {
        if let Some(&id) = self.ids.get(descriptor) {
            return id;
        }
        if !self.train {
            return UNKNOWN_CLASS;
        }
        self.vocabulary.push(descriptor.clone());
        let id = self.vocabulary.len() as i32;
        self.ids.insert(descriptor.clone(), id);
        id
    }

    /// Lookup without learning, whatever the train flag says.
    pub fn get(&self, descriptor: &T) -> i32 {
        self.ids.get(descriptor).copied().unwrap_or(UNKNOWN_CLASS)
    }

    /// Distinct descriptors learned so far.
    pub fn num_classes(&self) -> usize {
        self.vocabulary.len()
    }

    /// Descriptors in ID order (`vocabulary()[i]` has ID `i + 1`).
    pub fn vocabulary(&self) -> &[T] {
        &self.vocabulary
    }
}

impl<T: Clone + Eq + Hash + std::fmt::Debug> Tokenizer<T> {
    /// Rebuild a frozen tokenizer from a vocabulary in ID order.
    pub fn from_vocabulary(vocabulary: Vec<T>) -> Result<Self, VocabularyError> {
        let mut ids = HashMap::with_capacity(vocabulary.len());
        for (i, descriptor) in vocabulary.iter().enumerate() {
            if ids.insert(descriptor.clone(), i as i32 + 1).is_some() {
                return Err(VocabularyError::Duplicate(format!("{descriptor:?}")));
            }
        }
        Ok(Self {
            vocabulary,
            ids,
            train: false,
        })
    }
}

impl<T: Clone + Eq + Hash> From<Tokenizer<T>> for VocabularyRecord<T> {
    fn from(tokenizer: Tokenizer<T>) -> Self {
        Self {
            vocabulary: tokenizer.vocabulary,
        }
    }
}

impl<T: Clone + Eq + Hash + std::fmt::Debug> TryFrom<VocabularyRecord<T>> for Tokenizer<T> {
    type Error = VocabularyError;

    fn try_from(record: VocabularyRecord<T>) -> Result<Self, Self::Error> {
        Tokenizer::from_vocabulary(record.vocabulary)
    }
}
