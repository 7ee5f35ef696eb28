//! Generic per-table repository.
//!
//! Every persisted type implements [`Entity`], which declares its table,
//! DDL, column order and identity. [`Repository`] turns that into the usual
//! CRUD queries with `QueryBuilder`, so no table needs hand-written SQL
//! beyond its schema.

use sqlx::postgres::{PgPool, PgRow};
use sqlx::query_builder::Separated;
use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};
use std::marker::PhantomData;

/// Postgres caps a statement at 65535 bind parameters
const MAX_BIND_PARAMS: usize = 65_535;

/// A row type with a declared table and identity
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin {
    /// Value identifying one row
    type Id: Send + Sync;

    const TABLE: &'static str;

    /// Idempotent `CREATE TABLE IF NOT EXISTS` statement
    const SCHEMA: &'static str;

    /// Column names, in the order [`Entity::bind_row`] binds them
    const COLUMNS: &'static [&'static str];

    /// Identity columns, a subset of [`Entity::COLUMNS`]
    const KEY: &'static [&'static str];

    /// Conflict clause appended to inserts
    const ON_CONFLICT: &'static str = "ON CONFLICT DO NOTHING";

    /// Binds every column of `self`, in [`Entity::COLUMNS`] order
    fn bind_row<'args>(&self, row: Separated<'_, 'args, Postgres, &'static str>);

    /// Pushes a predicate matching the row identified by `id`
    fn push_key<'args>(id: &Self::Id, qb: &mut QueryBuilder<'args, Postgres>);
}

/// CRUD access to the table of `T`
pub struct Repository<T> {
    pool: PgPool,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    pub async fn create_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(T::SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Inserts `entities`; rows whose identity already exists are resolved by
    /// [`Entity::ON_CONFLICT`], which skips them unless overridden.
    ///
    /// Returns the number of rows actually written.
    pub async fn insert(&self, entities: &[T]) -> Result<u64, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_with(&mut conn, entities).await
    }

    /// Same as [`Repository::insert`], on a caller-provided connection or transaction
    pub async fn insert_with(conn: &mut PgConnection, entities: &[T]) -> Result<u64, sqlx::Error> {
        let mut written = 0;

        for chunk in entities.chunks(Self::rows_per_statement()) {
            let mut qb = QueryBuilder::<Postgres>::new(format!(
                "INSERT INTO {} ({}) ",
                T::TABLE,
                T::COLUMNS.join(", ")
            ));
            qb.push_values(chunk, |row, entity| entity.bind_row(row));
            qb.push(" ").push(T::ON_CONFLICT);

            written += qb.build().execute(&mut *conn).await?.rows_affected();
        }

        Ok(written)
    }

    /// Replaces the whole table content with `entities`, on a caller-provided
    /// connection or transaction; returns the number of rows written
    pub async fn replace_with(conn: &mut PgConnection, entities: &[T]) -> Result<u64, sqlx::Error> {
        sqlx::query(&format!("DELETE FROM {}", T::TABLE))
            .execute(&mut *conn)
            .await?;
        Self::insert_with(conn, entities).await
    }

    pub async fn find_one(&self, id: &T::Id) -> Result<Option<T>, sqlx::Error> {
        let mut qb = self.select();
        qb.push(" WHERE ");
        T::push_key(id, &mut qb);
        qb.build_query_as::<T>().fetch_optional(&self.pool).await
    }

    pub async fn find_all(&self) -> Result<Vec<T>, sqlx::Error> {
        self.select()
            .build_query_as::<T>()
            .fetch_all(&self.pool)
            .await
    }

    /// Overwrites the non-key columns of every row matching an entity's key.
    ///
    /// Returns the number of rows updated.
    pub async fn update(&self, entities: &[T]) -> Result<u64, sqlx::Error> {
        let assignments: Vec<String> = T::COLUMNS
            .iter()
            .filter(|column| !T::KEY.contains(column))
            .map(|column| format!("{column} = v.{column}"))
            .collect();
        if assignments.is_empty() {
            return Ok(0);
        }

        let matches: Vec<String> = T::KEY
            .iter()
            .map(|column| format!("t.{column} = v.{column}"))
            .collect();

        let mut tx = self.pool.begin().await?;
        let mut updated = 0;

        for chunk in entities.chunks(Self::rows_per_statement()) {
            let mut qb = QueryBuilder::<Postgres>::new(format!(
                "UPDATE {} AS t SET {} FROM (",
                T::TABLE,
                assignments.join(", ")
            ));
            qb.push_values(chunk, |row, entity| entity.bind_row(row));
            qb.push(format!(
                ") AS v ({}) WHERE {}",
                T::COLUMNS.join(", "),
                matches.join(" AND ")
            ));

            updated += qb.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(updated)
    }

    /// Deletes the row identified by `id`; returns whether one existed
    pub async fn delete(&self, id: &T::Id) -> Result<bool, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("DELETE FROM {} WHERE ", T::TABLE));
        T::push_key(id, &mut qb);
        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn exists(&self, id: &T::Id) -> Result<bool, sqlx::Error> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT EXISTS (SELECT 1 FROM {} WHERE ", T::TABLE));
        T::push_key(id, &mut qb);
        qb.push(")");
        qb.build_query_scalar::<bool>().fetch_one(&self.pool).await
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", T::TABLE))
            .fetch_one(&self.pool)
            .await
    }

    /// On-disk size of the table including indexes and TOAST, in bytes.
    /// A table that does not exist yet has size 0.
    pub async fn table_size(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(pg_total_relation_size(c.oid)), 0)::BIGINT
            FROM pg_class c
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE c.relname = $1
              AND c.relkind = 'r'
              AND n.nspname = current_schema()
            "#,
        )
        .bind(T::TABLE)
        .fetch_one(&self.pool)
        .await
    }

    fn select(&self) -> QueryBuilder<'static, Postgres> {
        QueryBuilder::new(format!("SELECT {} FROM {}", T::COLUMNS.join(", "), T::TABLE))
    }

    fn rows_per_statement() -> usize {
        (MAX_BIND_PARAMS / T::COLUMNS.len().max(1)).max(1)
    }
}
