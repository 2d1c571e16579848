//! Saving, loading and deleting entities.
//!
//! [`Persist`] is implemented for every [`Entity`]. An entity whose key is
//! still empty is inserted and the generated key is returned; otherwise it
//! is updated in place. Statements name the table with the entity's schema
//! when it declares one.

use storm_core::dml::{delete_by_key, select_by_key};
use storm_core::{
    BuildError, ColumnValue, Entity, Field, Insert, NullColumns, SqlValue, Statement, ToSqlValue,
    Update,
};
use tracing::debug;

use crate::error::{Result, StormError};
use crate::executor::{Executor, Row};

/// Builds the INSERT for `entity`, returning its key column.
///
/// The key itself is a column only when `include_key` is set. Absent values
/// are left to their column defaults.
///
/// # Errors
///
/// Returns [`BuildError::MissingKey`] for an entity without fields.
pub fn insert_statement<T: Entity>(
    entity: &T,
    include_key: bool,
    created_by: Option<SqlValue>,
) -> Result<Statement> {
    let fields = entity.fields();
    let key = fields.first().ok_or_else(|| missing_key::<T>())?;

    let mut insert = Insert::into(T::qualified_table());
    for field in fields.iter().skip(usize::from(!include_key)) {
        if let Some(value) = field.render() {
            insert = insert.value(&field.column_name(), value);
        }
    }
    if let Some(user) = created_by {
        insert = insert.created_by(user);
    }
    Ok(insert.returning(&key.column_name()).build())
}

/// Builds the UPDATE of every non-key field of `entity` holding a value,
/// resetting the columns in `nulls`.
///
/// # Errors
///
/// Returns [`BuildError::MissingKey`] when the key has no value, and
/// [`BuildError::NothingToUpdate`] when no column would change.
pub fn update_statement<T: Entity>(entity: &T, nulls: &NullColumns) -> Result<Statement> {
    let (key, key_value) = key_of(entity)?;
    let mut update = Update::table(T::qualified_table());
    for field in entity.fields().iter().skip(1) {
        if let Some(value) = field.render() {
            update = update.set(&field.column_name(), value);
        }
    }
    Ok(update.reset(nulls).build(&key, key_value)?)
}

fn key_of<T: Entity>(entity: &T) -> Result<(String, SqlValue)> {
    match entity.primary_key() {
        Some((name, Some(value))) => Ok((name, value)),
        _ => Err(missing_key::<T>()),
    }
}

fn missing_key<T: Entity>() -> StormError {
    StormError::Build(BuildError::MissingKey {
        table: T::TABLE.to_string(),
    })
}

async fn insert_returning<E: Executor>(exec: &E, stmt: &Statement) -> Result<Option<SqlValue>> {
    let rows = exec.query(&stmt.sql, &stmt.params).await?;
    Ok(rows
        .into_iter()
        .next()
        .and_then(|row| row.values.into_iter().next()))
}

/// Persistence operations available on every entity.
#[allow(async_fn_in_trait)]
pub trait Persist: Entity {
    /// Inserts the entity when its key is empty, updates it otherwise.
    ///
    /// Returns the generated key after an insert and the existing key after
    /// an update. `nulls` is emptied once an update succeeds.
    ///
    /// # Errors
    ///
    /// Returns the executor error, or a build error when there is nothing
    /// to write.
    async fn save<E: Executor>(&self, exec: &E, nulls: &mut NullColumns) -> Result<Option<SqlValue>>
    where
        Self: Sized,
    {
        if self.key_is_empty() {
            debug!(table = %Self::TABLE, "Inserting entity");
            let stmt = insert_statement(self, false, None)?;
            return insert_returning(exec, &stmt).await;
        }

        debug!(table = %Self::TABLE, resets = nulls.len(), "Updating entity");
        let stmt = update_statement(self, nulls)?;
        exec.exec(&stmt.sql, &stmt.params).await?;
        nulls.clear();
        Ok(self.primary_key().and_then(|(_, value)| value))
    }

    /// Like [`Persist::save`], handing a generated key to `set_key`.
    ///
    /// # Errors
    ///
    /// See [`Persist::save`].
    async fn save_with<E, F>(&self, exec: &E, nulls: &mut NullColumns, set_key: F) -> Result<()>
    where
        Self: Sized,
        E: Executor,
        F: FnOnce(SqlValue),
    {
        let inserted = self.key_is_empty();
        let key = self.save(exec, nulls).await?;
        if inserted {
            if let Some(key) = key {
                set_key(key);
            }
        }
        Ok(())
    }

    /// Inserts every field, the key included.
    ///
    /// # Errors
    ///
    /// Returns the executor error.
    async fn create<E: Executor>(&self, exec: &E) -> Result<Option<SqlValue>>
    where
        Self: Sized,
    {
        let stmt = insert_statement(self, true, None)?;
        insert_returning(exec, &stmt).await
    }

    /// Like [`Persist::create`], recording `user` in the `createdby` column.
    ///
    /// # Errors
    ///
    /// Returns the executor error.
    async fn create_with_audit<E, U>(&self, exec: &E, user: U) -> Result<Option<SqlValue>>
    where
        Self: Sized,
        E: Executor,
        U: ToSqlValue,
    {
        let stmt = insert_statement(self, true, Some(user.to_sql_value()))?;
        insert_returning(exec, &stmt).await
    }

    /// Updates the given columns of this entity's row.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NothingToUpdate`] when `columns` and `nulls`
    /// are both empty.
    async fn update_columns<E: Executor>(
        &self,
        exec: &E,
        columns: Vec<(String, ColumnValue)>,
        nulls: &mut NullColumns,
    ) -> Result<u64>
    where
        Self: Sized,
    {
        let (key, key_value) = key_of(self)?;
        let update = columns
            .into_iter()
            .fold(Update::table(Self::qualified_table()), |update, (column, value)| {
                update.set(&column, value)
            });
        let stmt = update.reset(nulls).build(&key, key_value)?;
        let affected = exec.exec(&stmt.sql, &stmt.params).await?;
        nulls.clear();
        Ok(affected)
    }

    /// Loads the row with the given key. Custom column types shape the
    /// select list through this instance's fields.
    ///
    /// # Errors
    ///
    /// Returns [`StormError::NotFound`] when no row matches.
    async fn find<E, K>(&self, exec: &E, key: K) -> Result<Row>
    where
        Self: Sized,
        E: Executor,
        K: ToSqlValue,
    {
        let fields = self.fields();
        let key_column = fields.first().ok_or_else(|| missing_key::<Self>())?.column_name();
        let expressions: Vec<String> = fields.iter().map(Field::select_expression).collect();
        let stmt = select_by_key(&Self::qualified_table(), &expressions, &key_column, key.to_sql_value());
        exec.query(&stmt.sql, &stmt.params)
            .await?
            .into_iter()
            .next()
            .ok_or(StormError::NotFound)
    }

    /// Deletes this entity's row.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingKey`] when the key has no value.
    async fn delete<E: Executor>(&self, exec: &E) -> Result<u64>
    where
        Self: Sized,
    {
        let (key, key_value) = key_of(self)?;
        let stmt = delete_by_key(&Self::qualified_table(), &key, key_value);
        exec.exec(&stmt.sql, &stmt.params).await
    }
}

impl<T: Entity> Persist for T {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Person {
        id: i64,
        name: Option<String>,
        age: Option<i64>,
    }

    impl Entity for Person {
        const TABLE: &'static str = "person";
        const COLUMNS: &'static [&'static str] = &["id", "name", "age"];

        fn fields(&self) -> Vec<Field<'_>> {
            vec![
                Field::new("id", &self.id, true),
                Field::new("name", &self.name, false),
                Field::new("age", &self.age, false),
            ]
        }
    }

    #[test]
    fn test_update_statement_from_entity() {
        let person = Person {
            id: 5,
            name: Some("Alice".into()),
            age: None,
        };
        let stmt = update_statement(&person, &NullColumns::new()).unwrap();
        assert_eq!(stmt.sql, r#"UPDATE person SET "name" = $1 WHERE "id" = $2"#);
        assert_eq!(stmt.param_strings(), vec!["Alice", "5"]);
    }

    #[test]
    fn test_insert_statement_skips_key_and_absent_values() {
        let person = Person {
            id: 0,
            name: Some("Bob".into()),
            age: None,
        };
        let stmt = insert_statement(&person, false, None).unwrap();
        assert_eq!(
            stmt.sql,
            r#"INSERT INTO person ("name") VALUES ($1) RETURNING "id""#
        );
    }

    #[test]
    fn test_insert_statement_with_key_and_audit() {
        let person = Person {
            id: 7,
            name: None,
            age: Some(40),
        };
        let stmt = insert_statement(&person, true, Some(SqlValue::Text("admin".into()))).unwrap();
        assert_eq!(
            stmt.sql,
            r#"INSERT INTO person ("id", "age", "createdby") VALUES ($1, $2, $3) RETURNING "id""#
        );
        assert_eq!(stmt.param_strings(), vec!["7", "40", "admin"]);
    }

    #[test]
    fn test_update_without_changes() {
        let person = Person {
            id: 5,
            name: None,
            age: None,
        };
        let err = update_statement(&person, &NullColumns::new()).unwrap_err();
        assert!(matches!(
            err,
            StormError::Build(BuildError::NothingToUpdate { .. })
        ));
    }
}
