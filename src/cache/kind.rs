//! Slot table.
//!
//! Every cache slot is described by one [`SlotSpec`] row: which identifier
//! fields it needs, whether it holds one record or a list, and where its
//! record lives in the store. Adding a slot means adding a [`SlotName`]
//! variant and its row; nothing is inferred from argument counts.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;

use super::identifier::{FieldSet, Identifier};
use crate::error::{EconomyError, Result};
use crate::options::EconomyOptions;
use crate::store::{key_path, KeyPathStore};

/// Fixed set of cache slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotName {
    Guilds,
    Users,
    Cooldowns,
    Balance,
    Bank,
    Currencies,
    Shop,
    Inventory,
    History,
}

impl SlotName {
    pub const ALL: [SlotName; 9] = [
        Self::Guilds,
        Self::Users,
        Self::Cooldowns,
        Self::Balance,
        Self::Bank,
        Self::Currencies,
        Self::Shop,
        Self::Inventory,
        Self::History,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guilds => "guilds",
            Self::Users => "users",
            Self::Cooldowns => "cooldowns",
            Self::Balance => "balance",
            Self::Bank => "bank",
            Self::Currencies => "currencies",
            Self::Shop => "shop",
            Self::Inventory => "inventory",
            Self::History => "history",
        }
    }

    /// This slot's row in the table.
    pub fn spec(self) -> &'static SlotSpec {
        &SLOTS[self as usize]
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotName {
    type Err = EconomyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| EconomyError::InvalidSlotName(s.to_string()))
    }
}

/// Which identifier fields a slot is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Guild,
    Member,
}

impl Scope {
    pub fn required(self) -> FieldSet {
        match self {
            Self::Guild => FieldSet::GUILD,
            Self::Member => FieldSet::GUILD_MEMBER,
        }
    }
}

/// Whether a slot hydrates into one entity or a list of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    List,
}

/// Where a slot's record lives relative to its scope.
#[derive(Debug, Clone, Copy)]
enum Location {
    /// The whole scope record (`{guild}` or `{guild}.{member}`).
    Root,
    /// One field under the scope record.
    Field(&'static str),
}

/// One row of the slot table.
#[derive(Debug)]
pub struct SlotSpec {
    pub name: SlotName,
    pub scope: Scope,
    pub shape: Shape,
    location: Location,
}

const fn row(name: SlotName, scope: Scope, shape: Shape, location: Location) -> SlotSpec {
    SlotSpec {
        name,
        scope,
        shape,
        location,
    }
}

// Indexed by `SlotName as usize`; keep in declaration order.
static SLOTS: [SlotSpec; 9] = [
    row(SlotName::Guilds, Scope::Guild, Shape::Scalar, Location::Root),
    row(SlotName::Users, Scope::Member, Shape::Scalar, Location::Root),
    row(SlotName::Cooldowns, Scope::Member, Shape::Scalar, Location::Root),
    row(SlotName::Balance, Scope::Member, Shape::Scalar, Location::Field("money")),
    row(SlotName::Bank, Scope::Member, Shape::Scalar, Location::Field("bank")),
    row(SlotName::Currencies, Scope::Guild, Shape::List, Location::Field("currencies")),
    row(SlotName::Shop, Scope::Guild, Shape::List, Location::Field("shop")),
    row(SlotName::Inventory, Scope::Member, Shape::List, Location::Field("inventory")),
    row(SlotName::History, Scope::Member, Shape::List, Location::Field("history")),
];

impl SlotSpec {
    /// Identifier fields this slot needs.
    pub fn required(&self) -> FieldSet {
        self.scope.required()
    }

    /// Whether `id` carries every field this slot needs.
    pub fn accepts(&self, id: &Identifier) -> bool {
        id.fields().covers(self.required())
    }

    /// Fail with [`EconomyError::InvalidIdentifier`] unless `id` fits this slot.
    ///
    /// Returns the member id for member-scoped slots, `None` otherwise (an
    /// extra member id on a guild-scoped slot is ignored).
    pub fn check<'a>(&self, id: &'a Identifier) -> Result<Option<&'a str>> {
        if !self.accepts(id) {
            return Err(EconomyError::InvalidIdentifier {
                slot: self.name,
                required: self.required(),
                received: id.fields(),
            });
        }

        Ok(match self.scope {
            Scope::Guild => None,
            Scope::Member => id.member_id(),
        })
    }

    /// Store path of the record `id` addresses in this slot.
    pub fn path(&self, id: &Identifier) -> Result<String> {
        let member = self.check(id)?;

        let mut segments = vec![id.guild_id()];
        segments.extend(member);
        if let Location::Field(field) = self.location {
            segments.push(field);
        }
        Ok(key_path(&segments))
    }

    /// Constructor arguments for entities hydrated from this slot.
    pub fn build_args(&self, id: &Identifier, ctx: &HydrationContext) -> Result<EntityArgs> {
        let member = self.check(id)?;
        Ok(EntityArgs {
            guild_id: id.guild_id().to_string(),
            member_id: member.map(str::to_string),
            options: ctx.options(),
            store: Arc::clone(&ctx.store),
        })
    }
}

/// What every entity is built from besides its raw record.
#[derive(Clone)]
pub struct EntityArgs {
    pub guild_id: String,
    /// Present only for member-scoped slots.
    pub member_id: Option<String>,
    pub options: Arc<EconomyOptions>,
    pub store: Arc<dyn KeyPathStore>,
}

impl fmt::Debug for EntityArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityArgs")
            .field("guild_id", &self.guild_id)
            .field("member_id", &self.member_id)
            .finish_non_exhaustive()
    }
}

impl PartialEq for EntityArgs {
    fn eq(&self, other: &Self) -> bool {
        self.guild_id == other.guild_id
            && self.member_id == other.member_id
            && self.options == other.options
            && std::ptr::addr_eq(Arc::as_ptr(&self.store), Arc::as_ptr(&other.store))
    }
}

/// Store handle and live options shared by every slot.
#[derive(Clone)]
pub struct HydrationContext {
    pub store: Arc<dyn KeyPathStore>,
    options: Arc<RwLock<Arc<EconomyOptions>>>,
}

impl HydrationContext {
    pub fn new(store: Arc<dyn KeyPathStore>, options: EconomyOptions) -> Self {
        Self {
            store,
            options: Arc::new(RwLock::new(Arc::new(options))),
        }
    }

    /// Current options snapshot.
    pub fn options(&self) -> Arc<EconomyOptions> {
        Arc::clone(&self.options.read())
    }

    /// Replace the options; entities hydrated afterwards see the new values.
    pub fn set_options(&self, options: EconomyOptions) {
        *self.options.write() = Arc::new(options);
    }
}

/// Small copyable set of slot names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotSet(u16);

impl SlotSet {
    pub const EMPTY: Self = Self(0);

    pub fn of(names: &[SlotName]) -> Self {
        names.iter().copied().collect()
    }

    #[must_use]
    pub fn with(self, name: SlotName) -> Self {
        Self(self.0 | name.bit())
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn contains(self, name: SlotName) -> bool {
        self.0 & name.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = SlotName> {
        SlotName::ALL.into_iter().filter(move |name| self.contains(*name))
    }
}

impl FromIterator<SlotName> for SlotSet {
    fn from_iter<I: IntoIterator<Item = SlotName>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl fmt::Display for SlotSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(SlotName::as_str).collect();
        f.write_str(&names.join(", "))
    }
}
