//! Inbound event shapes.
//!
//! The dispatcher consumes exactly two event shapes from the externally-owned
//! gateway connection: structured command interactions and free-text messages.

use super::{Attachment, ChannelId, CommunityId, Member, MessageId, RoleId, User, UserId};

/// An inbound platform event, as delivered by the host's gateway connection.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    InteractionCreate(Interaction),
    MessageCreate(TextMessage),
}

/// What kind of interaction the platform delivered. Only
/// [`InteractionKind::ApplicationCommand`] reaches the dispatch pipeline;
/// everything else is dropped at the enabled gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    ApplicationCommand,
    Component,
    Autocomplete,
    ModalSubmit,
}

/// The modality a structured command was invoked through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationSurface {
    ChatInput,
    MessageContext,
    UserContext,
}

/// A structured command interaction.
///
/// The option tree arrives pre-parsed and pre-typed by the platform; the
/// argument resolver only walks it, it never re-validates values.
#[derive(Debug, Clone)]
pub struct Interaction {
    pub id: String,
    pub kind: InteractionKind,
    pub surface: InvocationSurface,
    /// Invoked command name, as registered on the platform.
    pub name: String,
    pub options: Vec<OptionValue>,
    pub user: User,
    pub member: Option<Member>,
    pub community: Option<CommunityId>,
    pub channel: ChannelId,
}

/// One node of an interaction's option tree.
#[derive(Debug, Clone)]
pub struct OptionValue {
    pub name: String,
    pub data: OptionData,
}

/// Typed option payloads. Subcommands and groups nest further options.
#[derive(Debug, Clone)]
pub enum OptionData {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    User(UserId),
    Role(RoleId),
    Channel(ChannelId),
    Mentionable(String),
    Attachment(Attachment),
    SubCommand(Vec<OptionValue>),
    SubCommandGroup(Vec<OptionValue>),
}

/// A free-text message, possibly a prefix-triggered invocation.
#[derive(Debug, Clone)]
pub struct TextMessage {
    pub id: MessageId,
    pub content: String,
    pub author: User,
    pub member: Option<Member>,
    pub community: Option<CommunityId>,
    pub channel: ChannelId,
}
