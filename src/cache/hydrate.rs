//! Entity hydration.
//!
//! Slots keep raw records only; entities are rebuilt on every read so they
//! always carry the current options and store handle.

use serde::de::Error as _;
use serde_json::Value;

use super::kind::{EntityArgs, Shape, SlotSpec};
use crate::error::{EconomyError, Result};

/// A typed view built from one raw record.
pub trait Entity: Sized + Send + Sync + 'static {
    fn from_raw(raw: &Value, args: &EntityArgs) -> Result<Self, serde_json::Error>;
}

/// Result of hydrating a slot entry: one entity for scalar slots, a list
/// for list slots.
#[derive(Debug, Clone, PartialEq)]
pub enum Hydrated<E> {
    One(E),
    Many(Vec<E>),
}

impl<E> Hydrated<E> {
    pub fn one(self) -> Option<E> {
        match self {
            Self::One(entity) => Some(entity),
            Self::Many(_) => None,
        }
    }

    pub fn many(self) -> Option<Vec<E>> {
        match self {
            Self::One(_) => None,
            Self::Many(entities) => Some(entities),
        }
    }

    pub fn into_vec(self) -> Vec<E> {
        match self {
            Self::One(entity) => vec![entity],
            Self::Many(entities) => entities,
        }
    }
}

/// Build the entity (or entities) for `raw` according to the slot's shape.
pub fn hydrate<E: Entity>(spec: &SlotSpec, raw: &Value, args: &EntityArgs) -> Result<Hydrated<E>> {
    let wrap = |source| EconomyError::Hydration {
        slot: spec.name,
        source,
    };

    match spec.shape {
        Shape::Scalar => E::from_raw(raw, args).map(Hydrated::One).map_err(wrap),
        Shape::List => {
            let items = raw
                .as_array()
                .ok_or_else(|| wrap(serde_json::Error::custom("expected an array of records")))?;

            items
                .iter()
                .map(|item| E::from_raw(item, args))
                .collect::<Result<Vec<E>, _>>()
                .map(Hydrated::Many)
                .map_err(wrap)
        }
    }
}
