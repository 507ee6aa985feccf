//! Declarative argument schemas.
//!
//! A command declares an ordered list of typed argument specs. The same schema
//! drives structured-surface publication, text tokenization, and the catalog
//! fingerprint (which is why everything here serializes deterministically).

use crate::platform::{ChannelKind, PayloadChoice, PayloadOption};
use serde::Serialize;
use std::collections::BTreeMap;

/// Argument value types a command can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArgumentKind {
    Attachment,
    Boolean,
    Channel,
    Integer,
    /// Users and roles only; never resolves to a member.
    Mentionable,
    Number,
    Role,
    String,
    SubCommand,
    SubCommandGroup,
    User,
}

impl ArgumentKind {
    /// Platform option type code for publication payloads.
    pub(crate) fn payload_code(self) -> u8 {
        match self {
            Self::SubCommand => 1,
            Self::SubCommandGroup => 2,
            Self::String => 3,
            Self::Integer => 4,
            Self::Boolean => 5,
            Self::User => 6,
            Self::Channel => 7,
            Self::Role => 8,
            Self::Mentionable => 9,
            Self::Number => 10,
            Self::Attachment => 11,
        }
    }

    pub fn is_subcommand_like(self) -> bool {
        matches!(self, Self::SubCommand | Self::SubCommandGroup)
    }
}

/// A fixed choice for a string argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub name: String,
    pub value: String,
}

/// Type-specific constraints. Empty by default; only the fields matching the
/// argument's kind are honored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArgumentConstraints {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub choices: Vec<Choice>,
    pub autocomplete: bool,
    pub channel_kinds: Vec<ChannelKindFilter>,
}

/// Serializable channel-kind filter for channel arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChannelKindFilter {
    CommunityText,
    DirectMessage,
    Other,
}

impl From<ChannelKind> for ChannelKindFilter {
    fn from(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::CommunityText => Self::CommunityText,
            ChannelKind::DirectMessage => Self::DirectMessage,
            ChannelKind::Other => Self::Other,
        }
    }
}

/// One declared argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgumentSpec {
    pub name: String,
    pub description: String,
    pub kind: ArgumentKind,
    pub optional: bool,
    pub name_localizations: BTreeMap<String, String>,
    pub description_localizations: BTreeMap<String, String>,
    /// Shown when validation fails or the argument is missing.
    pub error_message: Option<String>,
    pub constraints: ArgumentConstraints,
    /// Child arguments for subcommands and subcommand groups.
    pub arguments: Vec<ArgumentSpec>,
}

impl ArgumentSpec {
    pub fn required(kind: ArgumentKind, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            optional: false,
            name_localizations: BTreeMap::new(),
            description_localizations: BTreeMap::new(),
            error_message: None,
            constraints: ArgumentConstraints::default(),
            arguments: Vec::new(),
        }
    }

    pub fn optional(kind: ArgumentKind, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            optional: true,
            ..Self::required(kind, name, description)
        }
    }

    pub fn with_constraints(mut self, constraints: ArgumentConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_children(mut self, arguments: Vec<ArgumentSpec>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Convert to the platform's publication shape.
    pub(crate) fn to_payload(&self) -> PayloadOption {
        let sub = self.kind.is_subcommand_like();
        let numeric = matches!(self.kind, ArgumentKind::Integer | ArgumentKind::Number);
        let string = self.kind == ArgumentKind::String;
        PayloadOption {
            name: self.name.clone(),
            description: self.description.clone(),
            kind: self.kind.payload_code(),
            required: (!sub).then_some(!self.optional),
            autocomplete: (string || numeric).then_some(self.constraints.autocomplete),
            min_value: numeric.then_some(self.constraints.min_value).flatten(),
            max_value: numeric.then_some(self.constraints.max_value).flatten(),
            min_length: string.then_some(self.constraints.min_length).flatten(),
            max_length: string.then_some(self.constraints.max_length).flatten(),
            choices: if string {
                self.constraints
                    .choices
                    .iter()
                    .map(|c| PayloadChoice {
                        name: c.name.clone(),
                        value: c.value.clone(),
                    })
                    .collect()
            } else {
                Vec::new()
            },
            options: self.arguments.iter().map(Self::to_payload).collect(),
        }
    }
}
