//! Argument resolution.
//!
//! Two structurally different invocation sources - pre-parsed interaction
//! option trees and tokenized free text - normalized behind one typed accessor
//! surface. Getters never raise for a missing-but-optional argument: absence
//! is the only failure signal. The single exception is attachment retrieval
//! through a text cause, which reports a distinct unsupported condition so
//! callers can tell it apart from a genuinely missing optional attachment.
//!
//! Identifier getters (user/member/role/channel) resolve against the
//! platform's in-memory cache only. No getter performs a network fetch.

use crate::command::{ArgumentKind, ArgumentSpec};
use crate::error::ArgumentError;
use crate::platform::{
    Attachment, ChannelInfo, CommunityId, Member, Mentionable, OptionData, OptionValue, Platform,
    Role, User,
};
use regex::Regex;
use std::sync::{Arc, OnceLock};

fn user_mention_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<@!?([0-9]+)>$").expect("static regex"))
}

fn role_mention_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<@&([0-9]+)>$").expect("static regex"))
}

fn channel_mention_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<#([0-9]+)>$").expect("static regex"))
}

fn bare_id(token: &str) -> Option<&str> {
    (!token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())).then_some(token)
}

/// A text token labeled against the command's declared schema.
#[derive(Debug, Clone)]
struct TextInput {
    name: String,
    kind: ArgumentKind,
    raw: String,
}

/// Typed accessors over one invocation's arguments.
pub enum ArgumentResolver {
    Structured(StructuredArgs),
    Text(TextArgs),
}

/// Accessor over a platform-parsed option tree.
pub struct StructuredArgs {
    options: Vec<OptionValue>,
    platform: Arc<dyn Platform>,
    community: Option<CommunityId>,
}

/// Accessor over positionally-labeled text tokens.
pub struct TextArgs {
    inputs: Vec<TextInput>,
    subcommand_path: Vec<String>,
    platform: Arc<dyn Platform>,
    community: Option<CommunityId>,
}

impl ArgumentResolver {
    pub fn structured(
        options: Vec<OptionValue>,
        platform: Arc<dyn Platform>,
        community: Option<CommunityId>,
    ) -> Self {
        Self::Structured(StructuredArgs {
            options,
            platform,
            community,
        })
    }

    /// Label raw tokens against the declared schema.
    ///
    /// Leading tokens matching declared subcommand/group names descend the
    /// schema; the remaining tokens are zipped positionally with the leaf
    /// arguments in declaration order. Surplus tokens are ignored; missing
    /// trailing tokens simply leave their arguments absent.
    pub fn text(
        schema: &[ArgumentSpec],
        tokens: &[String],
        platform: Arc<dyn Platform>,
        community: Option<CommunityId>,
    ) -> Self {
        let mut level = schema;
        let mut path = Vec::new();
        let mut idx = 0;
        while idx < tokens.len() {
            let next = level
                .iter()
                .find(|spec| spec.kind.is_subcommand_like() && spec.name == tokens[idx]);
            match next {
                Some(spec) => {
                    path.push(spec.name.clone());
                    level = &spec.arguments;
                    idx += 1;
                }
                None => break,
            }
        }

        let inputs = level
            .iter()
            .filter(|spec| !spec.kind.is_subcommand_like())
            .zip(tokens[idx..].iter())
            .map(|(spec, token)| TextInput {
                name: spec.name.clone(),
                kind: spec.kind,
                raw: token.clone(),
            })
            .collect();

        Self::Text(TextArgs {
            inputs,
            subcommand_path: path,
            platform,
            community,
        })
    }

    pub fn string(&self, name: &str) -> Option<String> {
        match self {
            Self::Structured(s) => s.find(name, |d| match d {
                OptionData::String(v) => Some(v.clone()),
                _ => None,
            }),
            Self::Text(t) => t.find(name, ArgumentKind::String).map(str::to_string),
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self {
            Self::Structured(s) => s.find(name, |d| match d {
                OptionData::Integer(v) => Some(*v),
                _ => None,
            }),
            Self::Text(t) => t.find(name, ArgumentKind::Integer)?.parse().ok(),
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self {
            Self::Structured(s) => s.find(name, |d| match d {
                OptionData::Number(v) => Some(*v),
                _ => None,
            }),
            Self::Text(t) => t
                .find(name, ArgumentKind::Number)?
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite()),
        }
    }

    /// Boolean coercion for text causes accepts `y`, `yes`, and `true`
    /// (case-sensitive) as true; any other present token is false.
    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self {
            Self::Structured(s) => s.find(name, |d| match d {
                OptionData::Boolean(v) => Some(*v),
                _ => None,
            }),
            Self::Text(t) => t
                .find(name, ArgumentKind::Boolean)
                .map(|raw| matches!(raw, "y" | "yes" | "true")),
        }
    }

    pub fn user(&self, name: &str) -> Option<User> {
        match self {
            Self::Structured(s) => {
                let id = s.find(name, |d| match d {
                    OptionData::User(id) => Some(id.clone()),
                    _ => None,
                })?;
                s.platform.cached_user(&id)
            }
            Self::Text(t) => {
                let raw = t.find(name, ArgumentKind::User)?;
                let id = parse_user_token(raw)?;
                t.platform.cached_user(&id.to_string())
            }
        }
    }

    /// The member behind a user argument, for community causes only.
    pub fn member(&self, name: &str) -> Option<Member> {
        let user = self.user(name)?;
        let (platform, community) = match self {
            Self::Structured(s) => (&s.platform, s.community.as_ref()?),
            Self::Text(t) => (&t.platform, t.community.as_ref()?),
        };
        platform.cached_member(community, &user.id)
    }

    pub fn role(&self, name: &str) -> Option<Role> {
        match self {
            Self::Structured(s) => {
                let id = s.find(name, |d| match d {
                    OptionData::Role(id) => Some(id.clone()),
                    _ => None,
                })?;
                s.platform.cached_role(s.community.as_ref()?, &id)
            }
            Self::Text(t) => {
                let raw = t.find(name, ArgumentKind::Role)?;
                let id = parse_role_token(raw)?;
                t.platform
                    .cached_role(t.community.as_ref()?, &id.to_string())
            }
        }
    }

    /// A user or role. Never resolves to a member.
    pub fn mentionable(&self, name: &str) -> Option<Mentionable> {
        match self {
            Self::Structured(s) => {
                let id = s.find(name, |d| match d {
                    OptionData::Mentionable(id) => Some(id.clone()),
                    _ => None,
                })?;
                if let Some(user) = s.platform.cached_user(&id) {
                    return Some(Mentionable::User(user));
                }
                let community = s.community.as_ref()?;
                s.platform
                    .cached_role(community, &id)
                    .map(Mentionable::Role)
            }
            Self::Text(t) => {
                let input = t
                    .inputs
                    .iter()
                    .find(|i| {
                        i.name == name
                            && matches!(
                                i.kind,
                                ArgumentKind::Mentionable | ArgumentKind::User | ArgumentKind::Role
                            )
                    })
                    .map(|i| i.raw.as_str())?;
                if let Some(id) = parse_user_token(input)
                    && let Some(user) = t.platform.cached_user(&id.to_string())
                {
                    return Some(Mentionable::User(user));
                }
                let id = parse_role_token(input).or_else(|| bare_id(input).map(str::to_string))?;
                t.platform
                    .cached_role(t.community.as_ref()?, &id)
                    .map(Mentionable::Role)
            }
        }
    }

    pub fn channel(&self, name: &str) -> Option<ChannelInfo> {
        match self {
            Self::Structured(s) => {
                let id = s.find(name, |d| match d {
                    OptionData::Channel(id) => Some(id.clone()),
                    _ => None,
                })?;
                s.platform.cached_channel(&id)
            }
            Self::Text(t) => {
                let raw = t.find(name, ArgumentKind::Channel)?;
                let id = channel_mention_re()
                    .captures(raw)
                    .map(|c| c[1].to_string())
                    .or_else(|| bare_id(raw).map(str::to_string))?;
                t.platform.cached_channel(&id)
            }
        }
    }

    /// Attachment retrieval. Text causes report the distinct unsupported
    /// condition instead of silent absence.
    pub fn attachment(&self, name: &str) -> Result<Option<Attachment>, ArgumentError> {
        match self {
            Self::Structured(s) => Ok(s.find(name, |d| match d {
                OptionData::Attachment(a) => Some(a.clone()),
                _ => None,
            })),
            Self::Text(_) => Err(ArgumentError::TextAttachmentsUnsupported),
        }
    }

    /// The invoked subcommand path: `[group, subcommand]`, `[subcommand]`, or
    /// empty for a plain invocation.
    pub fn subcommand_path(&self) -> Vec<String> {
        match self {
            Self::Structured(s) => {
                let mut path = Vec::new();
                let mut level = &s.options;
                loop {
                    let next = level.iter().find_map(|opt| match &opt.data {
                        OptionData::SubCommand(children)
                        | OptionData::SubCommandGroup(children) => {
                            Some((opt.name.clone(), children))
                        }
                        _ => None,
                    });
                    match next {
                        Some((name, children)) => {
                            path.push(name);
                            level = children;
                        }
                        None => break,
                    }
                }
                path
            }
            Self::Text(t) => t.subcommand_path.clone(),
        }
    }
}

impl StructuredArgs {
    /// Depth-first search of the option tree, descending into subcommands.
    fn find<T>(&self, name: &str, extract: impl Fn(&OptionData) -> Option<T> + Copy) -> Option<T> {
        fn walk<T>(
            options: &[OptionValue],
            name: &str,
            extract: impl Fn(&OptionData) -> Option<T> + Copy,
        ) -> Option<T> {
            for opt in options {
                match &opt.data {
                    OptionData::SubCommand(children) | OptionData::SubCommandGroup(children) => {
                        if let Some(found) = walk(children, name, extract) {
                            return Some(found);
                        }
                    }
                    data if opt.name == name => {
                        if let Some(found) = extract(data) {
                            return Some(found);
                        }
                    }
                    _ => {}
                }
            }
            None
        }
        walk(&self.options, name, extract)
    }
}

impl TextArgs {
    fn find(&self, name: &str, kind: ArgumentKind) -> Option<&str> {
        self.inputs
            .iter()
            .find(|i| i.name == name && i.kind == kind)
            .map(|i| i.raw.as_str())
    }
}

fn parse_user_token(token: &str) -> Option<String> {
    user_mention_re()
        .captures(token)
        .map(|c| c[1].to_string())
        .or_else(|| bare_id(token).map(str::to_string))
}

fn parse_role_token(token: &str) -> Option<String> {
    role_mention_re().captures(token).map(|c| c[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ArgumentSpec;
    use crate::error::PlatformError;
    use crate::permissions::Permissions;
    use crate::platform::{
        ChannelId, ChannelKind, CommandPayload, CommunityId, Reply, RoleId, UserId,
    };
    use async_trait::async_trait;

    /// Cache-only platform stub; transport methods are never called by getters.
    struct StubPlatform;

    #[async_trait]
    impl Platform for StubPlatform {
        fn agent_id(&self) -> UserId {
            "agent".into()
        }
        async fn acknowledge(&self, _: &str) -> Result<(), PlatformError> {
            unreachable!("getters must not touch the transport")
        }
        async fn reply_interaction(&self, _: &str, _: Reply) -> Result<(), PlatformError> {
            unreachable!("getters must not touch the transport")
        }
        async fn edit_interaction_reply(&self, _: &str, _: Reply) -> Result<(), PlatformError> {
            unreachable!("getters must not touch the transport")
        }
        async fn create_message(&self, _: &ChannelId, _: Reply) -> Result<(), PlatformError> {
            unreachable!("getters must not touch the transport")
        }
        async fn create_direct_message(&self, _: &UserId, _: Reply) -> Result<(), PlatformError> {
            unreachable!("getters must not touch the transport")
        }
        async fn publish_global_commands(
            &self,
            _: Vec<CommandPayload>,
        ) -> Result<(), PlatformError> {
            unreachable!("getters must not touch the transport")
        }
        async fn publish_community_commands(
            &self,
            _: &CommunityId,
            _: Vec<CommandPayload>,
        ) -> Result<(), PlatformError> {
            unreachable!("getters must not touch the transport")
        }
        fn cached_user(&self, id: &UserId) -> Option<User> {
            (id == "42").then(|| User {
                id: "42".into(),
                username: "someone".into(),
                global_name: None,
                bot: false,
            })
        }
        fn cached_member(&self, _: &CommunityId, user: &UserId) -> Option<Member> {
            (user == "42").then(|| Member {
                user_id: "42".into(),
                nickname: Some("Somebody".into()),
                roles: vec![],
            })
        }
        fn cached_role(&self, _: &CommunityId, id: &RoleId) -> Option<Role> {
            (id == "77").then(|| Role {
                id: "77".into(),
                name: "Mods".into(),
                permissions: Permissions::KICK_MEMBERS,
            })
        }
        fn cached_channel(&self, id: &ChannelId) -> Option<ChannelInfo> {
            (id == "9").then(|| ChannelInfo {
                id: "9".into(),
                name: Some("general".into()),
                kind: ChannelKind::CommunityText,
                community: Some("g1".into()),
            })
        }
        fn permissions_in_community(&self, _: &CommunityId, _: &UserId) -> Option<Permissions> {
            None
        }
        fn permissions_in_channel(&self, _: &ChannelId, _: &UserId) -> Option<Permissions> {
            None
        }
    }

    fn platform() -> Arc<dyn Platform> {
        Arc::new(StubPlatform)
    }

    fn text_resolver(schema: &[ArgumentSpec], tokens: &[&str]) -> ArgumentResolver {
        let tokens: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        ArgumentResolver::text(schema, &tokens, platform(), Some("g1".into()))
    }

    #[test]
    fn test_text_boolean_coercion_table() {
        let schema = vec![ArgumentSpec::required(ArgumentKind::Boolean, "flag", "f")];
        for (token, expected) in [
            ("y", true),
            ("yes", true),
            ("true", true),
            ("Y", false),
            ("True", false),
            ("no", false),
            ("1", false),
        ] {
            let args = text_resolver(&schema, &[token]);
            assert_eq!(args.boolean("flag"), Some(expected), "token {token:?}");
        }
        let args = text_resolver(&schema, &[]);
        assert_eq!(args.boolean("flag"), None);
    }

    #[test]
    fn test_text_number_rejects_nan_and_infinity() {
        let schema = vec![ArgumentSpec::required(ArgumentKind::Number, "n", "n")];
        assert_eq!(text_resolver(&schema, &["1.5"]).number("n"), Some(1.5));
        assert_eq!(text_resolver(&schema, &["NaN"]).number("n"), None);
        assert_eq!(text_resolver(&schema, &["inf"]).number("n"), None);
        assert_eq!(text_resolver(&schema, &["-inf"]).number("n"), None);
        assert_eq!(text_resolver(&schema, &["abc"]).number("n"), None);
    }

    #[test]
    fn test_text_integer_parses_or_absents() {
        let schema = vec![ArgumentSpec::required(ArgumentKind::Integer, "n", "n")];
        assert_eq!(text_resolver(&schema, &["12"]).integer("n"), Some(12));
        assert_eq!(text_resolver(&schema, &["12.5"]).integer("n"), None);
    }

    #[test]
    fn test_text_user_mention_resolved_from_cache() {
        let schema = vec![ArgumentSpec::required(ArgumentKind::User, "who", "w")];
        let args = text_resolver(&schema, &["<@42>"]);
        assert_eq!(args.user("who").unwrap().username, "someone");
        // Nickname mention form and bare id also resolve.
        assert!(text_resolver(&schema, &["<@!42>"]).user("who").is_some());
        assert!(text_resolver(&schema, &["42"]).user("who").is_some());
        // Uncached id is absent, not an error.
        assert!(text_resolver(&schema, &["<@43>"]).user("who").is_none());
    }

    #[test]
    fn test_text_member_requires_community() {
        let schema = vec![ArgumentSpec::required(ArgumentKind::User, "who", "w")];
        let args = text_resolver(&schema, &["<@42>"]);
        assert_eq!(args.member("who").unwrap().nickname.as_deref(), Some("Somebody"));

        let tokens = vec!["<@42>".to_string()];
        let dm = ArgumentResolver::text(&schema, &tokens, platform(), None);
        assert!(dm.member("who").is_none());
    }

    #[test]
    fn test_text_role_and_channel_mentions() {
        let schema = vec![
            ArgumentSpec::required(ArgumentKind::Role, "r", "r"),
            ArgumentSpec::required(ArgumentKind::Channel, "c", "c"),
        ];
        let args = text_resolver(&schema, &["<@&77>", "<#9>"]);
        assert_eq!(args.role("r").unwrap().name, "Mods");
        assert_eq!(args.channel("c").unwrap().name.as_deref(), Some("general"));
    }

    #[test]
    fn test_text_mentionable_prefers_user() {
        let schema = vec![ArgumentSpec::required(ArgumentKind::Mentionable, "m", "m")];
        match text_resolver(&schema, &["<@42>"]).mentionable("m") {
            Some(Mentionable::User(u)) => assert_eq!(u.id, "42"),
            other => panic!("expected user, got {other:?}"),
        }
        match text_resolver(&schema, &["<@&77>"]).mentionable("m") {
            Some(Mentionable::Role(r)) => assert_eq!(r.id, "77"),
            other => panic!("expected role, got {other:?}"),
        }
    }

    #[test]
    fn test_text_attachment_is_distinct_unsupported() {
        let schema = vec![ArgumentSpec::optional(ArgumentKind::Attachment, "file", "f")];
        let args = text_resolver(&schema, &[]);
        assert_eq!(
            args.attachment("file").unwrap_err(),
            ArgumentError::TextAttachmentsUnsupported
        );
    }

    #[test]
    fn test_structured_missing_optional_attachment_is_absent() {
        let args = ArgumentResolver::structured(Vec::new(), platform(), None);
        assert_eq!(args.attachment("file"), Ok(None));
    }

    #[test]
    fn test_text_subcommand_descent() {
        let schema = vec![
            ArgumentSpec::required(ArgumentKind::SubCommandGroup, "config", "cfg").with_children(
                vec![
                    ArgumentSpec::required(ArgumentKind::SubCommand, "set", "set").with_children(
                        vec![ArgumentSpec::required(ArgumentKind::String, "key", "k")],
                    ),
                ],
            ),
        ];
        let args = text_resolver(&schema, &["config", "set", "volume"]);
        assert_eq!(args.subcommand_path(), vec!["config", "set"]);
        assert_eq!(args.string("key").as_deref(), Some("volume"));
    }

    #[test]
    fn test_structured_getters_walk_subcommands() {
        let options = vec![OptionValue {
            name: "set".into(),
            data: OptionData::SubCommand(vec![OptionValue {
                name: "key".into(),
                data: OptionData::String("volume".into()),
            }]),
        }];
        let args = ArgumentResolver::structured(options, platform(), None);
        assert_eq!(args.subcommand_path(), vec!["set"]);
        assert_eq!(args.string("key").as_deref(), Some("volume"));
        assert_eq!(args.string("missing"), None);
    }

    #[test]
    fn test_structured_type_mismatch_is_absent() {
        let options = vec![OptionValue {
            name: "n".into(),
            data: OptionData::String("12".into()),
        }];
        let args = ArgumentResolver::structured(options, platform(), None);
        assert_eq!(args.integer("n"), None);
    }
}
