//! MongoDB-backed key-path store.
//!
//! Each guild is one document whose `_id` is the guild id. The rest of a
//! key path maps onto MongoDB's dotted field paths, so `g1.u1.money` reads
//! field `u1.money` of document `g1`.

use async_trait::async_trait;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::options::{ClientOptions, FindOneOptions, ReplaceOptions, UpdateOptions};
use mongodb::{Client, Collection};
use serde_json::Value;
use tracing::{debug, info};

use super::{split_path, KeyPathStore};
use crate::error::StoreError;

/// Key-path store over a single MongoDB collection.
#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
    collection: Collection<Document>,
}

impl MongoStore {
    /// Connect to MongoDB and bind to `db_name.collection`.
    ///
    /// # Errors
    /// Returns error if the connection or the initial ping fails.
    pub async fn connect(uri: &str, db_name: &str, collection: &str) -> Result<Self, StoreError> {
        let options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(options)?;

        // Ping the database to verify connection
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        info!("Connected to MongoDB, using {}.{}", db_name, collection);

        Ok(Self {
            collection: client.database(db_name).collection(collection),
            client,
        })
    }

    /// Get a reference to the underlying MongoDB client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn to_bson(value: &Value) -> Result<Bson, StoreError> {
    bson::to_bson(value).map_err(|e| StoreError::Encoding(e.to_string()))
}

fn to_json(document: Document) -> Value {
    Bson::Document(document).into_relaxed_extjson()
}

/// Split a key path into the guild id and the field path inside its document.
fn locate(path: &str) -> Result<(String, Option<String>), StoreError> {
    let segments = split_path(path)?;
    let Some((guild, rest)) = segments.split_first() else {
        return Err(StoreError::InvalidPath(path.to_string()));
    };

    let field = (!rest.is_empty()).then(|| rest.join("."));
    Ok((guild.to_string(), field))
}

fn walk(mut node: Value, field: &str) -> Option<Value> {
    for segment in field.split('.') {
        node = match node {
            Value::Object(mut map) => map.remove(segment)?,
            Value::Array(mut items) => {
                let index = segment.parse::<usize>().ok()?;
                if index >= items.len() {
                    return None;
                }
                items.swap_remove(index)
            }
            _ => return None,
        };
    }
    Some(node)
}

fn upsert() -> UpdateOptions {
    UpdateOptions::builder().upsert(true).build()
}

#[async_trait]
impl KeyPathStore for MongoStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let (guild, field) = locate(path)?;
        let mut options = FindOneOptions::default();
        if let Some(field) = &field {
            options.projection = Some(doc! { field.as_str(): 1 });
        }

        let found = self
            .collection
            .find_one(doc! { "_id": guild.as_str() })
            .with_options(options)
            .await?;

        let Some(mut document) = found else {
            return Ok(None);
        };
        document.remove("_id");

        let value = to_json(document);
        Ok(match field {
            Some(field) => walk(value, &field).filter(|v| !v.is_null()),
            None => Some(value),
        })
    }

    async fn set(&self, path: &str, value: Value) -> Result<bool, StoreError> {
        let (guild, field) = locate(path)?;

        match field {
            Some(field) => {
                let update = doc! { "$set": { field.as_str(): to_bson(&value)? } };
                self.collection
                    .update_one(doc! { "_id": guild.as_str() }, update)
                    .with_options(upsert())
                    .await?;
            }
            None => {
                let Bson::Document(mut document) = to_bson(&value)? else {
                    return Err(StoreError::Write {
                        path: path.to_string(),
                        message: "guild record must be an object".to_string(),
                    });
                };
                document.insert("_id", guild.clone());
                let options = ReplaceOptions::builder().upsert(true).build();
                self.collection
                    .replace_one(doc! { "_id": guild.as_str() }, document)
                    .with_options(options)
                    .await?;
            }
        }

        debug!("mongo store: set {}", path);
        Ok(true)
    }

    async fn push(&self, path: &str, value: Value) -> Result<bool, StoreError> {
        let (guild, field) = locate(path)?;
        let field = field.ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;

        let update = doc! { "$push": { field.as_str(): to_bson(&value)? } };
        self.collection
            .update_one(doc! { "_id": guild.as_str() }, update)
            .with_options(upsert())
            .await?;

        debug!("mongo store: push {}", path);
        Ok(true)
    }

    async fn pull(&self, path: &str, index: usize, value: Value) -> Result<bool, StoreError> {
        let (guild, field) = locate(path)?;
        let field = field.ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;

        // Only replace an element that exists; `$set` on a missing index would pad with nulls.
        let element = format!("{field}.{index}");
        let filter = doc! { "_id": guild.as_str(), element.as_str(): { "$exists": true } };
        let update = doc! { "$set": { element.as_str(): to_bson(&value)? } };
        let result = self.collection.update_one(filter, update).await?;

        debug!("mongo store: pull {}[{}]", path, index);
        Ok(result.matched_count > 0)
    }

    async fn remove(&self, path: &str) -> Result<bool, StoreError> {
        let (guild, field) = locate(path)?;

        let removed = match field {
            Some(field) => {
                let update = doc! { "$unset": { field.as_str(): "" } };
                let result = self
                    .collection
                    .update_one(doc! { "_id": guild.as_str() }, update)
                    .await?;
                result.modified_count > 0
            }
            None => {
                let result = self.collection.delete_one(doc! { "_id": guild.as_str() }).await?;
                result.deleted_count > 0
            }
        };

        debug!("mongo store: remove {} ({})", path, removed);
        Ok(removed)
    }

    async fn keys_list(&self, path: &str) -> Result<Vec<String>, StoreError> {
        if path.is_empty() {
            let ids = self.collection.distinct("_id", doc! {}).await?;
            return Ok(ids
                .into_iter()
                .filter_map(|id| id.as_str().map(str::to_string))
                .collect());
        }

        Ok(match self.get(path).await? {
            Some(Value::Object(map)) => map.into_iter().map(|(key, _)| key).collect(),
            _ => Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_locate_splits_guild_and_field() {
        assert_eq!(locate("g1").unwrap(), ("g1".to_string(), None));
        assert_eq!(
            locate("g1.u1.money").unwrap(),
            ("g1".to_string(), Some("u1.money".to_string()))
        );
        assert!(locate("").is_err());
    }

    #[test]
    fn test_walk_descends_objects_and_arrays() {
        let value = json!({ "shop": [{ "id": 1 }, { "id": 2 }] });
        assert_eq!(walk(value.clone(), "shop.1.id"), Some(json!(2)));
        assert_eq!(walk(value.clone(), "shop.5"), None);
        assert_eq!(walk(value, "missing"), None);
    }
}
