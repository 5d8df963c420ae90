//! Profiles: named bundles of features
//!
//! An endpoint is built from a [`ProfileSet`], the union of several profiles.
//! Each action may appear only once across the set.

use std::collections::HashMap;

use crate::error::OcppError;
use crate::feature::{Feature, Request};

/// A named bundle of features
#[derive(Debug, Clone)]
pub struct Profile {
    name: &'static str,
    features: Vec<Feature>,
}

impl Profile {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            features: Vec::new(),
        }
    }

    /// Add the feature for request type `R`
    pub fn with<R: Request>(self) -> Self {
        self.with_feature(Feature::of::<R>())
    }

    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature(&self, action: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.action() == action)
    }
}

/// Union of the profiles an endpoint supports, indexed by action
#[derive(Debug, Clone, Default)]
pub struct ProfileSet {
    names: Vec<&'static str>,
    features: HashMap<&'static str, (Feature, &'static str)>,
}

impl ProfileSet {
    /// Build the action index. Fails if two features share an action.
    pub fn new(profiles: impl IntoIterator<Item = Profile>) -> Result<Self, OcppError> {
        let mut set = Self::default();
        for profile in profiles {
            set.add(profile)?;
        }
        Ok(set)
    }

    fn add(&mut self, profile: Profile) -> Result<(), OcppError> {
        for feature in &profile.features {
            if self.features.contains_key(feature.action()) {
                return Err(OcppError::DuplicateAction(feature.action().to_string()));
            }
            self.features.insert(feature.action(), (*feature, profile.name));
        }
        self.names.push(profile.name);
        Ok(())
    }

    pub fn feature(&self, action: &str) -> Option<&Feature> {
        self.features.get(action).map(|(feature, _)| feature)
    }

    /// Name of the profile that contributed `action`
    pub fn profile_of(&self, action: &str) -> Option<&'static str> {
        self.features.get(action).map(|(_, profile)| *profile)
    }

    pub fn supports(&self, action: &str) -> bool {
        self.features.contains_key(action)
    }

    pub fn profile_names(&self) -> &[&'static str] {
        &self.names
    }

    /// All registered actions, sorted
    pub fn actions(&self) -> Vec<&'static str> {
        let mut actions: Vec<_> = self.features.keys().copied().collect();
        actions.sort_unstable();
        actions
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
