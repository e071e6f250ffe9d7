use std::fmt;

/// A dotted path addressing layers, groups and properties by name.
///
/// `*` matches exactly one component and `**` matches any number of
/// components, including none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AnimationKeypath {
    keys: Vec<String>,
}

impl AnimationKeypath {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AnimationKeypath {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn parse(dotted: &str) -> Self {
        AnimationKeypath::new(dotted.split('.').filter(|key| !key.is_empty()))
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn appending(&self, key: impl Into<String>) -> Self {
        let mut keys = self.keys.clone();
        keys.push(key.into());
        AnimationKeypath { keys }
    }

    /// Whether this pattern matches the concrete keypath `other`.
    pub fn matches(&self, other: &AnimationKeypath) -> bool {
        let pattern: Vec<&str> = self.keys.iter().map(String::as_str).collect();
        let concrete: Vec<&str> = other.keys.iter().map(String::as_str).collect();
        keys_match(&pattern, &concrete)
    }
}

pub(crate) fn keys_match(pattern: &[&str], concrete: &[&str]) -> bool {
    match (pattern.split_first(), concrete.split_first()) {
        (None, None) => true,
        (Some((&"**", rest)), _) => {
            keys_match(rest, concrete)
                || concrete
                    .split_first()
                    .map_or(false, |(_, tail)| keys_match(pattern, tail))
        }
        (Some((head, rest)), Some((key, tail))) => {
            (*head == "*" || head == key) && keys_match(rest, tail)
        }
        _ => false,
    }
}

impl fmt::Display for AnimationKeypath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.keys.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards() {
        let concrete = AnimationKeypath::parse("Layer.Group 1.Fill 1.Color");
        assert!(AnimationKeypath::parse("Layer.Group 1.Fill 1.Color").matches(&concrete));
        assert!(AnimationKeypath::parse("Layer.*.Fill 1.Color").matches(&concrete));
        assert!(AnimationKeypath::parse("**.Color").matches(&concrete));
        assert!(AnimationKeypath::parse("Layer.**.Fill 1.Color").matches(&concrete));
        assert!(AnimationKeypath::parse("Layer.**").matches(&concrete));
        assert!(!AnimationKeypath::parse("Layer.*.Color").matches(&concrete));
        assert!(!AnimationKeypath::parse("Other.**").matches(&concrete));
    }

    #[test]
    fn display_joins_with_dots() {
        let keypath = AnimationKeypath::new(["Layer", "Transform"]).appending("Opacity");
        assert_eq!(keypath.to_string(), "Layer.Transform.Opacity");
    }
}
