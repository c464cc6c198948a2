//! Persisted profile shape.
//!
//! These types mirror the YAML files one to one. Nothing here holds a
//! resolved handle or an output callback; that runtime state lives in
//! `engine::compiled::ActiveProfile` and `engine::outputs`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::slots::{ButtonId, GateId, KnobId, LedId, StepId};

const fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// A complete aircraft profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<BTreeMap<ButtonId, ButtonProfile>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knobs: Option<BTreeMap<KnobId, KnobProfile>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leds: Option<BTreeMap<LedId, LedProfile>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<StepId, DataProfile>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<BTreeMap<GateId, ConditionProfile>>,
}

/// Descriptive header of a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Substrings matched against the loaded aircraft's identity.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selectors: Vec<String>,
}

/// Reference to a simulator command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(default)]
    pub command_str: String,
}

/// Reference to a simulator dataref, optionally an element of an array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataref {
    #[serde(default)]
    pub dataref_str: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub index: u32,
}

/// A dataref compared against a threshold, or bound to an expression variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatarefCondition {
    #[serde(default)]
    pub dataref_str: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub index: u32,

    /// Variable name used by the `condition` expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// One of `==`, `!=`, `<`, `<=`, `>`, `>=`. Validated when compiled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl DatarefCondition {
    /// The variable name an expression refers to this dataref by.
    ///
    /// Falls back to the last path segment of the dataref, with array
    /// indices other than zero appended (`N1_percent_1`).
    pub fn variable_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        let leaf = self
            .dataref_str
            .rsplit('/')
            .next()
            .unwrap_or(&self.dataref_str)
            .trim();
        if self.index == 0 {
            leaf.to_string()
        } else {
            format!("{leaf}_{}", self.index)
        }
    }
}

/// Datarefs plus an optional combining expression.
///
/// Without `condition`, each dataref is compared against its threshold and
/// the results are AND-combined. `condition: any` ORs them instead; any
/// other string is compiled as an expression over the dataref variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionProfile {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datarefs: Vec<DatarefCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl ConditionProfile {
    /// True when neither datarefs nor an expression are declared.
    pub fn is_empty(&self) -> bool {
        self.datarefs.is_empty()
            && self
                .condition
                .as_deref()
                .is_none_or(|c| c.trim().is_empty())
    }
}

/// Indicator light configuration.
pub type LedProfile = ConditionProfile;

/// Step size source for knobs that write datarefs directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataProfile {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datarefs: Vec<Dataref>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// Autopilot knob binding.
///
/// `commands[0]` increases the value and `commands[1]` decreases it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnobProfile {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datarefs: Vec<Dataref>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Command>,
}

/// Button binding for single and double clicks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonProfile {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub single_click: Vec<Command>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub double_click: Vec<Command>,
}

impl Profile {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn selectors(&self) -> &[String] {
        &self.metadata.selectors
    }

    pub fn led(&self, id: LedId) -> Option<&LedProfile> {
        self.leds.as_ref()?.get(&id)
    }

    pub fn button(&self, id: ButtonId) -> Option<&ButtonProfile> {
        self.buttons.as_ref()?.get(&id)
    }

    pub fn knob(&self, id: KnobId) -> Option<&KnobProfile> {
        self.knobs.as_ref()?.get(&id)
    }

    pub fn step(&self, id: StepId) -> Option<&DataProfile> {
        self.data.as_ref()?.get(&id)
    }

    pub fn gate(&self, id: GateId) -> Option<&ConditionProfile> {
        self.conditions.as_ref()?.get(&id)
    }

    /// Parse a profile from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Render the profile as YAML text.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
