//! Repository abstraction over one record type.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::ScaffoldError;
use crate::schema::{EntitySchema, Schema};
use crate::store::{Record, RecordKey, Session};

/// CRUD operations on one record type.
pub trait Repository {
    /// Record type served by this repository.
    fn entity(&self) -> Result<&Arc<EntitySchema>, ScaffoldError>;

    /// Creates a record from field values.
    fn create(
        &self,
        session: &mut Session,
        values: Map<String, Value>,
    ) -> Result<Record, ScaffoldError>;

    /// Reads a record by key, failing with `RecordNotFound` when absent.
    fn get(&self, session: &Session, key: &RecordKey) -> Result<Record, ScaffoldError>;

    fn get_all(&self, session: &Session) -> Result<Vec<Record>, ScaffoldError>;

    /// First record matching every field in `condition`, if any.
    fn get_one(
        &self,
        session: &Session,
        condition: &Map<String, Value>,
    ) -> Result<Option<Record>, ScaffoldError>;

    fn update(
        &self,
        session: &mut Session,
        key: &RecordKey,
        values: Map<String, Value>,
    ) -> Result<Record, ScaffoldError>;

    fn delete(&self, session: &mut Session, key: &RecordKey) -> Result<(), ScaffoldError>;
}

/// Repository forwarding every operation to the session.
#[derive(Debug, Clone, Default)]
pub struct EntityRepository {
    entity: Option<Arc<EntitySchema>>,
}

impl EntityRepository {
    pub fn for_entity(entity: Arc<EntitySchema>) -> Self {
        Self {
            entity: Some(entity),
        }
    }

    /// Repository for the record type `name` of `schema`.
    pub fn from_schema(schema: &Schema, name: &str) -> Result<Self, ScaffoldError> {
        Ok(Self::for_entity(Arc::clone(schema.entity(name)?)))
    }

    /// A repository with no record type; every call fails.
    pub fn unbound() -> Self {
        Self { entity: None }
    }

    fn name(&self) -> Result<&str, ScaffoldError> {
        Ok(self.entity()?.name())
    }
}

impl Repository for EntityRepository {
    fn entity(&self) -> Result<&Arc<EntitySchema>, ScaffoldError> {
        self.entity.as_ref().ok_or_else(|| {
            ScaffoldError::Configuration("record type is not assigned".to_string())
        })
    }

    fn create(
        &self,
        session: &mut Session,
        values: Map<String, Value>,
    ) -> Result<Record, ScaffoldError> {
        let record = session.insert(self.name()?, values)?;
        tracing::info!("Created {}[{}]", record.entity, record.key);
        Ok(record)
    }

    fn get(&self, session: &Session, key: &RecordKey) -> Result<Record, ScaffoldError> {
        let name = self.name()?;
        session
            .get(name, key)?
            .ok_or_else(|| ScaffoldError::RecordNotFound {
                entity: name.to_string(),
                key: key.to_string(),
            })
    }

    fn get_all(&self, session: &Session) -> Result<Vec<Record>, ScaffoldError> {
        session.select(self.name()?)
    }

    fn get_one(
        &self,
        session: &Session,
        condition: &Map<String, Value>,
    ) -> Result<Option<Record>, ScaffoldError> {
        session.find(self.name()?, condition)
    }

    fn update(
        &self,
        session: &mut Session,
        key: &RecordKey,
        values: Map<String, Value>,
    ) -> Result<Record, ScaffoldError> {
        let record = session.update(self.name()?, key, values)?;
        tracing::info!("Updated {}[{}]", record.entity, record.key);
        Ok(record)
    }

    fn delete(&self, session: &mut Session, key: &RecordKey) -> Result<(), ScaffoldError> {
        let name = self.name()?;
        session.delete(name, key)?;
        tracing::info!("Deleted {}[{}]", name, key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDescriptor, ValueKind};
    use crate::store::Database;
    use serde_json::json;

    fn setup() -> (Arc<Database>, EntityRepository) {
        let customer = EntitySchema::new(
            "Customer",
            vec![
                FieldDescriptor::required("email", ValueKind::Str).unique(),
                FieldDescriptor::required("name", ValueKind::Str),
            ],
        )
        .unwrap();
        let schema = Schema::new(vec![customer]).unwrap();
        let repository = EntityRepository::from_schema(&schema, "Customer").unwrap();
        (Arc::new(Database::memory(schema)), repository)
    }

    fn attrs(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_crud_round() {
        let (db, repository) = setup();
        let mut session = db.session();

        let created = repository
            .create(&mut session, attrs(json!({"email": "a@b.com", "name": "A"})))
            .unwrap();
        assert_eq!(repository.get(&session, &created.key).unwrap(), created);
        assert_eq!(repository.get_all(&session).unwrap().len(), 1);

        let one = repository
            .get_one(&session, &attrs(json!({"name": "A"})))
            .unwrap();
        assert_eq!(one.map(|r| r.key), Some(created.key.clone()));

        let updated = repository
            .update(&mut session, &created.key, attrs(json!({"name": "B"})))
            .unwrap();
        assert_eq!(updated.get("name"), Some(&json!("B")));

        repository.delete(&mut session, &created.key).unwrap();
        let err = repository.get(&session, &created.key).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unbound_repository_fails_every_call() {
        let (db, _) = setup();
        let repository = EntityRepository::unbound();
        let mut session = db.session();

        let expected = ScaffoldError::Configuration("record type is not assigned".to_string());
        assert_eq!(repository.entity().unwrap_err(), expected);
        assert_eq!(repository.get_all(&session).unwrap_err(), expected);
        assert_eq!(
            repository.create(&mut session, Map::new()).unwrap_err(),
            expected
        );
    }

    #[test]
    fn test_unknown_entity() {
        let (db, _) = setup();
        let err = EntityRepository::from_schema(db.schema(), "Vendor").unwrap_err();
        assert!(err.is_not_found());
    }
}
