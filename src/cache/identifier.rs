//! Identifiers addressing one scope of ledger data.

use std::fmt;

use crate::error::{EconomyError, Result};
use crate::models::GUILD_KEYS;
use crate::store::PATH_SEPARATOR;

/// One identifier field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    GuildId,
    MemberId,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GuildId => "guildID",
            Self::MemberId => "memberID",
        }
    }
}

/// Set of identifier fields, used to report what a slot required versus
/// what an identifier carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldSet {
    guild: bool,
    member: bool,
}

impl FieldSet {
    pub const GUILD: Self = Self {
        guild: true,
        member: false,
    };
    pub const GUILD_MEMBER: Self = Self {
        guild: true,
        member: true,
    };

    pub fn contains(self, field: Field) -> bool {
        match field {
            Field::GuildId => self.guild,
            Field::MemberId => self.member,
        }
    }

    /// Whether every field of `other` is present in `self`.
    pub fn covers(self, other: Self) -> bool {
        (self.guild || !other.guild) && (self.member || !other.member)
    }
}

impl fmt::Display for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = [Field::GuildId, Field::MemberId]
            .into_iter()
            .filter(|field| self.contains(*field))
            .map(Field::as_str)
            .collect();
        write!(f, "{{{}}}", fields.join(", "))
    }
}

/// A `{guildID, memberID?}` pair.
///
/// Both ids are validated on construction: never empty, never containing
/// the store's path separator. Member ids may not shadow guild-level keys
/// such as `shop`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    guild_id: String,
    member_id: Option<String>,
}

fn validate(field: &'static str, value: String) -> Result<String> {
    if value.is_empty() || value.contains(PATH_SEPARATOR) {
        return Err(EconomyError::MalformedIdentifier { field, value });
    }
    Ok(value)
}

impl Identifier {
    /// Identifier for guild-scoped data.
    pub fn guild(guild_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            guild_id: validate("guildID", guild_id.into())?,
            member_id: None,
        })
    }

    /// Identifier for one member of a guild.
    pub fn member(guild_id: impl Into<String>, member_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            guild_id: validate("guildID", guild_id.into())?,
            member_id: Some(validate("memberID", member_id.into()).and_then(|member| {
                if GUILD_KEYS.contains(&member.as_str()) {
                    return Err(EconomyError::MalformedIdentifier {
                        field: "memberID",
                        value: member,
                    });
                }
                Ok(member)
            })?),
        })
    }

    pub fn guild_id(&self) -> &str {
        &self.guild_id
    }

    pub fn member_id(&self) -> Option<&str> {
        self.member_id.as_deref()
    }

    /// The fields this identifier carries.
    pub fn fields(&self) -> FieldSet {
        FieldSet {
            guild: true,
            member: self.member_id.is_some(),
        }
    }

    /// Same guild, without the member.
    pub fn to_guild(&self) -> Self {
        Self {
            guild_id: self.guild_id.clone(),
            member_id: None,
        }
    }

    /// Another member of the same guild.
    pub fn with_member(&self, member_id: impl Into<String>) -> Result<Self> {
        Self::member(self.guild_id.clone(), member_id)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member_id {
            Some(member) => write!(f, "{}/{}", self.guild_id, member),
            None => write!(f, "{}", self.guild_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_and_dotted_ids() {
        assert!(Identifier::guild("").is_err());
        assert!(Identifier::guild("g.1").is_err());
        assert!(Identifier::member("g1", "").is_err());
        assert!(Identifier::member("g1", "shop").is_err());
        assert!(Identifier::member("g1", "u1").is_ok());
    }

    #[test]
    fn test_fields_and_coverage() {
        let guild = Identifier::guild("g1").unwrap();
        let member = Identifier::member("g1", "u1").unwrap();

        assert_eq!(guild.fields(), FieldSet::GUILD);
        assert_eq!(member.fields(), FieldSet::GUILD_MEMBER);
        assert!(member.fields().covers(FieldSet::GUILD));
        assert!(!guild.fields().covers(FieldSet::GUILD_MEMBER));
        assert_eq!(member.to_guild(), guild);
    }

    #[test]
    fn test_field_set_display() {
        assert_eq!(FieldSet::GUILD.to_string(), "{guildID}");
        assert_eq!(FieldSet::GUILD_MEMBER.to_string(), "{guildID, memberID}");
    }
}
