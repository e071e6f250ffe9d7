use crate::backend::PropertyValue;
use crate::keyframes::KeyframeGroup;
use crate::keypath::AnimationKeypath;

/// A value supplied at runtime in place of the document's keyframes.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderValue {
    Constant(PropertyValue),
    Keyframes(KeyframeGroup<PropertyValue>),
}

impl ProviderValue {
    pub fn keyframes(&self) -> KeyframeGroup<PropertyValue> {
        match self {
            ProviderValue::Constant(value) => KeyframeGroup::from_value(value.clone()),
            ProviderValue::Keyframes(group) => group.clone(),
        }
    }
}

/// Registered value overrides, addressed by keypath patterns whose last
/// component names the property (for example `**.Fill 1.Color`).
#[derive(Debug, Clone, Default)]
pub struct ValueProviderStore {
    providers: Vec<(AnimationKeypath, ProviderValue)>,
}

impl ValueProviderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value_provider(&mut self, keypath: AnimationKeypath, value: ProviderValue) {
        self.providers.push((keypath, value));
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// The most recently registered provider matching `keypath`.
    pub fn custom_keyframes(
        &self,
        keypath: &AnimationKeypath,
    ) -> Option<KeyframeGroup<PropertyValue>> {
        self.providers
            .iter()
            .rev()
            .find(|(pattern, _)| pattern.matches(keypath))
            .map(|(_, value)| value.keyframes())
    }
}
