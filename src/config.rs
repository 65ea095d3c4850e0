//! Process-wide lookup tables: renames, blacklists, seeds, path partitions.
//!
//! Loaded once (defaults or a JSON file) and passed by reference into the
//! extractors. Nothing here is mutated after `validate`.
use std::path::Path;

use indexmap::IndexMap;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::common::Renamer;
use crate::error::{Error, Result};
use crate::ir::{Alias, Combinator, Field, IdMap, Structure, TypeDescriptor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global identifier renames.
    pub renames: IndexMap<String, String>,
    /// Per-document overrides, keyed by path relative to the docs root.
    pub file_renames: IndexMap<String, IndexMap<String, String>>,
    /// Per-document renames applied on top of `file_renames` to identifiers
    /// derived from heading text only.
    pub heading_renames: IndexMap<String, IndexMap<String, String>>,
    /// Structure / enum / flags identifiers never emitted.
    pub blacklist: Vec<String>,
    pub alias_blacklist: Vec<String>,
    pub seed_structures: Vec<Structure>,
    pub seed_aliases: Vec<Alias>,
    pub id_maps: Vec<IdMap>,
    pub partitions: Partitions,
}

/// Path regexes deciding which extractors see which document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Partitions {
    pub schema: String,
    pub gateway: String,
}

#[derive(Debug, Clone)]
pub struct CompiledPartitions {
    pub schema: Regex,
    pub gateway: Regex,
}

impl Default for Partitions {
    fn default() -> Self {
        Self {
            schema: r"(?i)^(interactions|resources|topics/(gateway|oauth2|permissions|teams|opcodes))".into(),
            gateway: r"(?i)^topics/gateway".into(),
        }
    }
}

impl Partitions {
    pub fn compile(&self) -> Result<CompiledPartitions> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|source| Error::Pattern { pattern: pattern.to_string(), source })
        };
        Ok(CompiledPartitions {
            schema: compile(&self.schema)?,
            gateway: compile(&self.gateway)?,
        })
    }
}

impl Config {
    pub fn from_path(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        let config: Self = from_str_with_path(&source)
            .map_err(|message| Error::Config { path: path.to_path_buf(), message })?;
        config.validate()?;
        Ok(config)
    }

    /// Every rename chain must settle after one step, and partitions must compile.
    pub fn validate(&self) -> Result<()> {
        let files = std::iter::once("").chain(self.file_renames.keys().map(String::as_str));
        for file in files {
            let renamer = Renamer::new(self, file);
            let local = self.file_renames.get(file).into_iter().flat_map(|t| t.keys());
            for key in self.renames.keys().chain(local) {
                check_settles(key, |id| renamer.rename(id))?;
            }
        }
        for (file, table) in &self.heading_renames {
            let renamer = Renamer::new(self, file);
            for key in self.renames.keys().chain(table.keys()) {
                check_settles(key, |id| renamer.rename_heading(id))?;
            }
        }
        self.partitions.compile()?;
        Ok(())
    }

    pub fn is_blacklisted(&self, identifier: &str) -> bool {
        self.blacklist.iter().any(|b| b == identifier)
    }

    pub fn is_alias_blacklisted(&self, identifier: &str) -> bool {
        self.alias_blacklist.iter().any(|b| b == identifier)
    }

    /// Config with every table empty; handy for isolating one heuristic in tests.
    pub fn empty() -> Self {
        Self {
            renames: IndexMap::new(),
            file_renames: IndexMap::new(),
            heading_renames: IndexMap::new(),
            blacklist: Vec::new(),
            alias_blacklist: Vec::new(),
            seed_structures: Vec::new(),
            seed_aliases: Vec::new(),
            id_maps: Vec::new(),
            partitions: Partitions::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            renames: pairs(DEFAULT_RENAMES),
            file_renames: per_file(DEFAULT_FILE_RENAMES),
            heading_renames: per_file(DEFAULT_HEADING_RENAMES),
            blacklist: DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect(),
            alias_blacklist: Vec::new(),
            seed_structures: seed_structures(),
            seed_aliases: seed_aliases(),
            id_maps: id_maps(),
            partitions: Partitions::default(),
        }
    }
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> std::result::Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path} → {}", err.into_inner()))
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DEFAULT TABLES
// ————————————————————————————————————————————————————————————————————————————

const DEFAULT_RENAMES: &[(&str, &str)] = &[
    ("Allowedmention", "AllowedMention"),
    ("Applicationcommand", "ApplicationCommand"),
    ("Applicationcommandoption", "ApplicationCommandOption"),
    ("Applicationcommandoptionchoice", "ApplicationCommandOptionChoice"),
    ("Applicationcommandoptiontype", "ApplicationCommandOptionType"),
    ("Applicationcommandpermission", "ApplicationCommandPermission"),
    ("Applicationcommandpermissiontype", "ApplicationCommandPermissionType"),
    ("Binary", "string"),
    ("BooleanQueryString", "boolean"),
    (
        "BulkOverwriteGuildApplicationCommandBulkApplicationCommandParams",
        "BulkOverwriteGuildApplicationCommandParams",
    ),
    ("Connecting", "mixed"),
    ("DocsInteractionsMessageComponent", "Component"),
    ("Filecontent", "string"),
    ("GetGateway", "mixed"),
    ("Guildapplicationcommandpermission", "GuildApplicationCommandPermission"),
    ("InteractionRequestType", "InteractionType"),
    ("ImageDatum", "string"),
    ("Oauth2Scope", "OAuth2Scope"),
    ("Object", "mixed"),
    ("Presence", "PresenceUpdateEvent"),
    ("PresenceUpdate", "PresenceUpdateEvent"),
    ("Messageinteraction", "MessageInteraction"),
    ("UpdatePresenceStatusType", "StatusType"),
    (
        "StartThreadInForumChannelForumThreadMessageParam",
        "StartThreadInForumChannelForumThreadMessageParams",
    ),
    ("StartThreadInForumOrMediaChannelForumAndMediaThreadMessageParam", "Message"),
    ("TeamMemberRolesTeamMemberRoleType", "TeamMemberRoleType"),
    ("TextInputsTextInputStyle", "TextInputStyle"),
    ("MessageComponent", "Component"),
    ("MessageInteractionMetadataStructure", "MessageInteractionMetadatum"),
    // gateway commands
    ("GuildRequestMember", "RequestGuildMember"),
    ("GatewayPresenceUpdate", "UpdatePresence"),
    ("GatewayVoiceStateUpdate", "UpdateVoiceState"),
    ("MessageReactionRemoveEmoji", "MessageReactionRemoveEmojiEvent"),
    ("WebhookUpdateEvent", "WebhooksUpdateEvent"),
    // gateway events
    ("Hello", "HelloEvent"),
    // polls
    ("MessagePollVoteAdd", "MessagePollVoteAddEvent"),
    ("MessagePollVoteRemove", "MessagePollVoteRemoveEvent"),
    // reactions
    ("GetReactionsReactionType", "ReactionType"),
];

const DEFAULT_FILE_RENAMES: &[(&str, &[(&str, &str)])] = &[
    ("resources/Guild.md", &[("listActiveThreads", "listGuildActiveThreads")]),
];

const DEFAULT_HEADING_RENAMES: &[(&str, &[(&str, &str)])] = &[
    (
        "interactions/Receiving_and_Responding.md",
        &[
            ("Autocomplete", "InteractionCallbackAutocomplete"),
            ("Message", "InteractionCallbackMessage"),
            ("Modal", "InteractionCallbackModal"),
        ],
    ),
];

const DEFAULT_BLACKLIST: &[&str] = &["GatewayPayload"];

const LOCALES: &[(&str, &str)] = &[
    ("da", "Danish"),
    ("de", "German"),
    ("en-GB", "English, UK"),
    ("en-US", "English, US"),
    ("es-ES", "Spanish"),
    ("fr", "French"),
    ("hr", "Croatian"),
    ("it", "Italian"),
    ("lt", "Lithuanian"),
    ("hu", "Hungarian"),
    ("nl", "Dutch"),
    ("no", "Norwegian"),
    ("pl", "Polish"),
    ("pt-BR", "Portuguese, Brazilian"),
    ("ro", "Romanian, Romania"),
    ("fi", "Finnish"),
    ("sv-SE", "Swedish"),
    ("vi", "Vietnamese"),
    ("tr", "Turkish"),
    ("cs", "Czech"),
    ("el", "Greek"),
    ("bg", "Bulgarian"),
    ("ru", "Russian"),
    ("uk", "Ukrainian"),
    ("hi", "Hindi"),
    ("th", "Thai"),
    ("zh-CN", "Chinese, China"),
    ("ja", "Japanese"),
    ("zh-TW", "Chinese, Taiwan"),
    ("ko", "Korean"),
];

fn pairs(table: &[(&str, &str)]) -> IndexMap<String, String> {
    table.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn per_file(tables: &[(&str, &[(&str, &str)])]) -> IndexMap<String, IndexMap<String, String>> {
    tables.iter().map(|(file, table)| (file.to_string(), pairs(table))).collect()
}

fn check_settles(key: &str, rename: impl Fn(&str) -> String) -> Result<()> {
    let once = rename(key);
    let twice = rename(&once);
    if once == twice {
        Ok(())
    } else {
        Err(Error::NonIdempotentRename { from: key.to_string(), to: once, next: twice })
    }
}

fn field(name: &str, optional: bool, ty: TypeDescriptor, description: &str) -> Field {
    Field { name: name.into(), optional, ty, description: description.into() }
}

fn seed_structures() -> Vec<Structure> {
    vec![
        Structure {
            identifier: "Locale".into(),
            fields: LOCALES
                .iter()
                .map(|(code, name)| field(code, true, TypeDescriptor::named("string"), name))
                .collect(),
        },
        Structure {
            identifier: "UnavailableGuild".into(),
            fields: vec![
                field("id", false, TypeDescriptor::named("snowflake"), ""),
                field("unavailable", false, TypeDescriptor::named("boolean"), ""),
            ],
        },
        Structure {
            identifier: "ActionRow".into(),
            fields: vec![
                field("type", false, TypeDescriptor::named("ComponentType"), "component type"),
                field("components", false, TypeDescriptor::array_of("Component"), "a list of child components"),
            ],
        },
    ]
}

fn seed_aliases() -> Vec<Alias> {
    let list: &[(&str, &[&str])] = &[
        ("Heartbeat", &["integer"]),
        ("ApplicationCommandCreateEvent", &["ApplicationCommand", "ApplicationCommandExtra"]),
        ("ApplicationCommandUpdateEvent", &["ApplicationCommand", "ApplicationCommandExtra"]),
        ("ApplicationCommandDeleteEvent", &["ApplicationCommand", "ApplicationCommandExtra"]),
        ("GuildMemberAddEvent", &["GuildMember", "GuildMemberAddExtra"]),
        ("InvalidSessionEvent", &["boolean"]),
        ("ResumedEvent", &["null"]),
        ("ReconnectEvent", &["null"]),
    ];
    list.iter()
        .map(|(identifier, types)| Alias {
            identifier: identifier.to_string(),
            nullable: false,
            types: types.iter().map(|t| t.to_string()).collect(),
            combinator: (types.len() > 1).then_some(Combinator::And),
            array: None,
        })
        .collect()
}

fn id_maps() -> Vec<IdMap> {
    [("ChannelMap", "Channel"), ("MemberMap", "GuildMember"), ("RoleMap", "Role"), ("UserMap", "User")]
        .into_iter()
        .map(|(identifier, value)| IdMap {
            identifier: identifier.into(),
            key: "snowflake".into(),
            value: value.into(),
        })
        .collect()
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn chained_rename_is_rejected() {
        let mut config = Config::empty();
        config.renames.insert("A".into(), "B".into());
        config.renames.insert("B".into(), "C".into());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::NonIdempotentRename { .. }), "{err}");
    }

    #[test]
    fn file_override_feeding_global_key_is_rejected() {
        let mut config = Config::empty();
        config.renames.insert("Message".into(), "Msg".into());
        let mut table = IndexMap::new();
        table.insert("Callback".into(), "Message".into());
        config.file_renames.insert("a.md".into(), table);
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_partition_pattern_is_rejected() {
        let mut config = Config::empty();
        config.partitions.schema = "(".into();
        assert!(matches!(config.validate(), Err(Error::Pattern { .. })));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: Config = from_str_with_path(r#"{ "blacklist": ["Foo"] }"#).unwrap();
        assert_eq!(config.blacklist, vec!["Foo".to_string()]);
        assert_eq!(config.renames.get("Hello").map(String::as_str), Some("HelloEvent"));
        assert_eq!(config.seed_structures.len(), 3);
    }

    #[test]
    fn json_errors_name_the_path() {
        let err = from_str_with_path::<Config>(r#"{ "renames": { "A": 1 } }"#).unwrap_err();
        assert!(err.contains("renames.A"), "{err}");
    }

    #[test]
    fn seeds_match_expected_shapes() {
        let config = Config::default();
        let heartbeat = &config.seed_aliases[0];
        assert_eq!(heartbeat.types, vec!["integer"]);
        assert_eq!(heartbeat.combinator, None);
        let create = &config.seed_aliases[1];
        assert_eq!(create.combinator, Some(Combinator::And));
        assert_eq!(config.id_maps.len(), 4);
    }
}
