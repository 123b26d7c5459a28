//! Checkpoint loading and parameter-name normalization.
//!
//! Checkpoints come from an external training process and are stored as
//! JSON: either a training-framework envelope `{"state_dict": {...}}` or a
//! bare `{name: tensor}` object, each tensor being
//! `{"shape": [..], "data": [..]}` in row-major order.
//!
//! Training wrappers decorate parameter names (`model.encoder.weight`,
//! `module.encoder.weight`). A [`KeyNormalizer`] maps those names back to
//! the bare network's own names before binding.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;

use deixis_common::error::{DeixisError, DeixisResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A dense row-major tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl Tensor {
    /// Build a tensor, checking that `data` fills `shape` exactly.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, String> {
        let tensor = Self { shape, data };
        tensor.check()?;
        Ok(tensor)
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![0.0; len],
        }
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    fn check(&self) -> Result<(), String> {
        if self.data.len() != self.numel() {
            return Err(format!(
                "shape {:?} needs {} values, found {}",
                self.shape,
                self.numel(),
                self.data.len()
            ));
        }
        Ok(())
    }
}

/// Parameter name → tensor, as stored in a checkpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckpointStateMap {
    entries: BTreeMap<String, Tensor>,
}

/// Result of normalizing a state map's keys.
#[derive(Debug, Clone, Default)]
pub struct NormalizedStateMap {
    pub state: CheckpointStateMap,
    /// Original names whose normalized name was already taken.
    pub collisions: Vec<String>,
}

impl CheckpointStateMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor) -> Option<Tensor> {
        self.entries.insert(name.into(), tensor)
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Read and parse a checkpoint file.
    pub fn from_path(path: &Path) -> DeixisResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DeixisError::model_load(path, format!("cannot read checkpoint: {e}")))?;
        Self::parse(&content, path)
    }

    /// Parse checkpoint JSON held in memory.
    pub fn from_json_str(content: &str) -> DeixisResult<Self> {
        Self::parse(content, Path::new("<memory>"))
    }

    /// Parse checkpoint JSON. `origin` is only used in error messages.
    pub fn parse(content: &str, origin: &Path) -> DeixisResult<Self> {
        let root: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| DeixisError::model_load(origin, format!("invalid JSON: {e}")))?;

        let object = match root.get("state_dict") {
            Some(serde_json::Value::Object(inner)) => inner,
            Some(_) => {
                return Err(DeixisError::model_load(
                    origin,
                    "`state_dict` is not an object",
                ))
            }
            None => root.as_object().ok_or_else(|| {
                DeixisError::model_load(origin, "checkpoint root is not an object")
            })?,
        };

        let mut entries = BTreeMap::new();
        for (name, value) in object {
            let tensor: Tensor = serde_json::from_value(value.clone()).map_err(|e| {
                DeixisError::model_load(origin, format!("parameter `{name}`: {e}"))
            })?;
            tensor
                .check()
                .map_err(|e| DeixisError::model_load(origin, format!("parameter `{name}`: {e}")))?;
            entries.insert(name.clone(), tensor);
        }

        debug!("Parsed {} parameters from {}", entries.len(), origin.display());
        Ok(Self { entries })
    }

    /// Serialize as a bare `{name: tensor}` JSON object.
    pub fn to_json(&self) -> DeixisResult<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Rename every key through `normalizer`.
    ///
    /// When two names normalize to the same key, the first in sorted order is
    /// kept and the other is reported in `collisions`.
    pub fn into_normalized(self, normalizer: &dyn KeyNormalizer) -> NormalizedStateMap {
        let mut state = CheckpointStateMap::new();
        let mut collisions = Vec::new();

        for (name, tensor) in self.entries {
            let cleaned = normalizer.normalize(&name).into_owned();
            if state.contains(&cleaned) {
                warn!("Checkpoint key `{name}` normalizes to `{cleaned}`, which is already taken");
                collisions.push(name);
                continue;
            }
            state.insert(cleaned, tensor);
        }

        NormalizedStateMap { state, collisions }
    }
}

impl FromIterator<(String, Tensor)> for CheckpointStateMap {
    fn from_iter<I: IntoIterator<Item = (String, Tensor)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Maps a checkpoint parameter name to the network's parameter name.
pub trait KeyNormalizer {
    fn normalize<'a>(&self, name: &'a str) -> Cow<'a, str>;
}

impl<F> KeyNormalizer for F
where
    F: Fn(&str) -> String,
{
    fn normalize<'a>(&self, name: &'a str) -> Cow<'a, str> {
        Cow::Owned(self(name))
    }
}

/// Leaves names untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl KeyNormalizer for Identity {
    fn normalize<'a>(&self, name: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(name)
    }
}

/// Strips a wrapper prefix, repeatedly, so no result still starts with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripPrefix {
    prefix: String,
}

impl StripPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Lightning-style `model.` prefix.
    pub fn lightning() -> Self {
        Self::new("model.")
    }

    /// `module.` prefix added by data-parallel wrappers.
    pub fn data_parallel() -> Self {
        Self::new("module.")
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl KeyNormalizer for StripPrefix {
    fn normalize<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if self.prefix.is_empty() {
            return Cow::Borrowed(name);
        }
        let mut rest = name;
        while let Some(stripped) = rest.strip_prefix(self.prefix.as_str()) {
            rest = stripped;
        }
        Cow::Borrowed(rest)
    }
}

/// Applies normalizers in order until none of them changes the name.
#[derive(Default)]
pub struct NormalizerChain {
    steps: Vec<Box<dyn KeyNormalizer + Send + Sync>>,
}

impl NormalizerChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, step: impl KeyNormalizer + Send + Sync + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }
}

impl KeyNormalizer for NormalizerChain {
    fn normalize<'a>(&self, name: &'a str) -> Cow<'a, str> {
        let mut current: Cow<'a, str> = Cow::Borrowed(name);
        loop {
            let mut changed = false;
            for step in &self.steps {
                let next = step.normalize(&current).into_owned();
                if next != *current {
                    current = Cow::Owned(next);
                    changed = true;
                }
            }
            if !changed {
                return current;
            }
        }
    }
}

/// The wrapper conventions recognized out of the box: `model.` and `module.`.
pub fn default_normalizer() -> NormalizerChain {
    NormalizerChain::new()
        .then(StripPrefix::lightning())
        .then(StripPrefix::data_parallel())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor(values: &[f32]) -> Tensor {
        Tensor::new(vec![values.len()], values.to_vec()).unwrap()
    }

    #[test]
    fn lightning_prefix_is_stripped() {
        let strip = StripPrefix::lightning();
        assert_eq!(strip.normalize("model.layer1.weight"), "layer1.weight");
        assert_eq!(strip.normalize("layer1.weight"), "layer1.weight");
        assert_eq!(strip.normalize("model.model.fc.bias"), "fc.bias");
        assert_eq!(strip.normalize("models.fc"), "models.fc");
    }

    #[test]
    fn cleaned_map_has_no_prefixed_keys() {
        let map: CheckpointStateMap = [
            ("model.layer1.weight".to_string(), tensor(&[1.0])),
            ("model.model.layer2.bias".to_string(), tensor(&[2.0])),
            ("head.bias".to_string(), tensor(&[3.0])),
        ]
        .into_iter()
        .collect();

        let normalized = map.into_normalized(&StripPrefix::lightning());
        let names: Vec<&str> = normalized.state.names().collect();
        assert_eq!(names, vec!["head.bias", "layer1.weight", "layer2.bias"]);
        assert!(normalized.state.names().all(|n| !n.starts_with("model.")));
        assert!(normalized.collisions.is_empty());
    }

    #[test]
    fn collisions_are_reported() {
        let map: CheckpointStateMap = [
            ("fc.weight".to_string(), tensor(&[1.0])),
            ("model.fc.weight".to_string(), tensor(&[2.0])),
        ]
        .into_iter()
        .collect();

        let normalized = map.into_normalized(&StripPrefix::lightning());
        assert_eq!(normalized.state.len(), 1);
        assert_eq!(normalized.state.get("fc.weight").unwrap().data, vec![1.0]);
        assert_eq!(normalized.collisions, vec!["model.fc.weight".to_string()]);
    }

    #[test]
    fn chain_handles_interleaved_wrappers() {
        let chain = default_normalizer();
        assert_eq!(chain.normalize("module.model.encoder.weight"), "encoder.weight");
        assert_eq!(chain.normalize("model.module.encoder.weight"), "encoder.weight");
        assert_eq!(chain.normalize("encoder.weight"), "encoder.weight");
    }

    #[test]
    fn closures_are_normalizers() {
        let upper = |name: &str| name.to_uppercase();
        assert_eq!(upper.normalize("fc.bias"), "FC.BIAS");
        assert_eq!(Identity.normalize("model.x"), "model.x");
    }

    #[test]
    fn parses_state_dict_envelope() {
        let json = r#"{
            "epoch": 12,
            "state_dict": {
                "model.fc.weight": {"shape": [2, 2], "data": [1, 2, 3, 4]},
                "model.fc.bias": {"shape": [2], "data": [0.5, -0.5]}
            }
        }"#;
        let map = CheckpointStateMap::parse(json, Path::new("ckpt.json")).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("model.fc.weight").unwrap().shape, vec![2, 2]);
    }

    #[test]
    fn parses_bare_mapping() {
        let json = r#"{"fc.bias": {"shape": [1], "data": [0.25]}}"#;
        let map = CheckpointStateMap::from_json_str(json).unwrap();
        assert_eq!(map.get("fc.bias").unwrap().data, vec![0.25]);
    }

    #[test]
    fn unparseable_checkpoints_are_model_load_errors() {
        let origin = Path::new("bad.json");
        for content in [
            "not json at all",
            "[1, 2, 3]",
            r#"{"state_dict": 5}"#,
            r#"{"fc.bias": {"shape": [3], "data": [1.0]}}"#,
            r#"{"fc.bias": "weights"}"#,
        ] {
            let err = CheckpointStateMap::parse(content, origin).unwrap_err();
            assert!(
                matches!(err, DeixisError::ModelLoad { .. }),
                "{content}: {err}"
            );
        }
    }

    #[test]
    fn missing_file_is_model_load_error() {
        let err = CheckpointStateMap::from_path(Path::new("/nonexistent/ckpt.json")).unwrap_err();
        assert!(matches!(err, DeixisError::ModelLoad { .. }));
    }

    #[test]
    fn json_round_trip() {
        let mut map = CheckpointStateMap::new();
        map.insert("a", Tensor::zeros(vec![2, 3]));
        let json = map.to_json().unwrap();
        let back = CheckpointStateMap::parse(&json, Path::new("mem")).unwrap();
        assert_eq!(back, map);
    }
}
