//! Typed CRUD façade.
//!
//! A [`Repository`] combines an entity's table descriptor with the fragment
//! builder, the pager and the staging coordinator, and runs the resulting
//! statements on a caller-supplied [`Session`].

use std::marker::PhantomData;
use std::time::Duration;

use oxide_contrib_core::fragment::{
    join_sql, normalize_where, quoted_assignment_list, quoted_key_predicate,
};
use oxide_contrib_core::{
    CoreError, DialectId, Entity, PageRequest, PageResult, Params, TableDescriptor, ToSqlValue,
};
use tracing::debug;

use crate::config::ContribConfig;
use crate::error::{ContribError, Result};
use crate::filter::Filter;
use crate::pager::paginate;
use crate::session::Session;
use crate::staging::StagingCoordinator;
use crate::tracked::Tracked;

/// Options for [`Repository::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOptions {
    /// Custom `where` clause replacing the identity match.
    pub where_sql: Option<String>,
    /// Columns to assign; `None` assigns every updatable column.
    pub columns: Option<Vec<String>>,
    /// Extra placeholder values for `where_sql`, overlaid on the entity's.
    pub params: Params,
}

impl UpdateOptions {
    /// Creates options matching on identity and assigning every column.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches rows with a custom `where` clause instead of the identity.
    #[must_use]
    pub fn filter(mut self, where_sql: &str) -> Self {
        self.where_sql = Some(where_sql.to_string());
        self
    }

    /// Restricts the assigned columns.
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| (*c).to_string()).collect());
        self
    }

    /// Binds a placeholder value for the custom `where` clause.
    #[must_use]
    pub fn param<V: ToSqlValue>(mut self, name: &str, value: V) -> Self {
        self.params.insert(name, value);
        self
    }
}

/// Database access for one entity type.
///
/// Repositories are lightweight and can be created freely.
///
/// # Example
///
/// ```ignore
/// use oxide_contrib::{EntityExt, Filter};
///
/// let mut conn = pool.acquire().await?;
/// let repo = Country::repository();
///
/// let country = repo.get_by_id(&mut *conn, 7).await?;
/// let active = repo
///     .get_all(&mut *conn, &Filter::with_where("Status = @s").param("s", 1))
///     .await?;
/// ```
#[derive(Debug)]
pub struct Repository<E: Entity> {
    timeout: Option<Duration>,
    staging: StagingCoordinator,
    _marker: PhantomData<E>,
}

impl<E: Entity> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            timeout: self.timeout,
            staging: self.staging.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E: Entity> Default for Repository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Repository<E> {
    /// Creates a repository with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: None,
            staging: StagingCoordinator::new(),
            _marker: PhantomData,
        }
    }

    /// Creates a repository from shared settings.
    #[must_use]
    pub fn from_config(config: &ContribConfig) -> Self {
        Self {
            timeout: config.command_timeout(),
            staging: StagingCoordinator::from_config(config),
            _marker: PhantomData,
        }
    }

    /// Sets the per-statement timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self.staging = self.staging.timeout(timeout);
        self
    }

    fn table() -> &'static TableDescriptor {
        E::descriptor()
    }

    /// Fetches the first row matching `filter`, or `None`.
    ///
    /// # Errors
    ///
    /// Database and row mapping errors.
    pub async fn get<S: Session>(&self, session: &mut S, filter: &Filter) -> Result<Option<E>> {
        let sql = filter.select_first_sql(&session.dialect(), Self::table().name());
        let rows = session.query(&sql, &filter.params, self.timeout).await?;
        match rows.first() {
            Some(row) => Ok(Some(E::from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Fetches the row whose single identity column equals `id`.
    ///
    /// # Errors
    ///
    /// `MissingKey` / `CompositeKey` when the table has no single identity
    /// column, plus database and row mapping errors.
    pub async fn get_by_id<S: Session, V: ToSqlValue>(
        &self,
        session: &mut S,
        id: V,
    ) -> Result<Option<E>> {
        let key = Self::table().single_identity()?;
        let filter = Filter::with_where(&format!(
            "{} = @id",
            session.dialect().quote_identifier(key)
        ))
        .param("id", id);
        self.get(session, &filter).await
    }

    /// Like [`Repository::get`], wrapping the entity for change tracking.
    ///
    /// # Errors
    ///
    /// Same as [`Repository::get`].
    pub async fn get_tracked<S: Session>(
        &self,
        session: &mut S,
        filter: &Filter,
    ) -> Result<Option<Tracked<E>>> {
        Ok(self.get(session, filter).await?.map(Tracked::new))
    }

    /// Fetches every row matching `filter`, in its order.
    ///
    /// # Errors
    ///
    /// Database and row mapping errors.
    pub async fn get_all<S: Session>(&self, session: &mut S, filter: &Filter) -> Result<Vec<E>> {
        let sql = filter.select_sql(Self::table().name());
        let rows = session.query(&sql, &filter.params, self.timeout).await?;
        rows.iter()
            .map(|row| E::from_row(row).map_err(ContribError::from))
            .collect()
    }

    /// Inserts one entity and returns the number of affected rows.
    ///
    /// Database-generated keys and computed columns are left to the
    /// database; explicit keys are inserted.
    ///
    /// # Errors
    ///
    /// Database errors.
    pub async fn insert<S: Session>(&self, session: &mut S, entity: &E) -> Result<u64> {
        let table = Self::table();
        let dialect = session.dialect();
        let columns = table.insert_columns();

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", table.name())
        } else {
            let names = columns
                .iter()
                .map(|c| dialect.quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", ");
            let values = columns
                .iter()
                .map(|c| format!("@{c}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("INSERT INTO {} ({names}) VALUES ({values})", table.name())
        };
        session.execute(&sql, &entity.to_params(), self.timeout).await
    }

    /// Updates one entity; true iff at least one row was affected.
    ///
    /// Without a custom `where` clause, the row is matched on the identity
    /// columns.
    ///
    /// # Errors
    ///
    /// - `MissingKey` when matching on identity and the table has none.
    /// - `InvalidEntity` when an identity value of the entity is NULL.
    /// - `UnknownColumn` for a requested column the table does not map.
    /// - `EmptyUpdate` when no assignable column remains.
    pub async fn update<S: Session>(
        &self,
        session: &mut S,
        entity: &E,
        options: &UpdateOptions,
    ) -> Result<bool> {
        let table = Self::table();
        let dialect = session.dialect();
        let columns = assignable_columns(table, options.columns.as_deref())?;

        let mut params = entity.to_params();
        let predicate = match options
            .where_sql
            .as_deref()
            .filter(|w| !w.trim().is_empty())
        {
            Some(where_sql) => {
                params.merge(&options.params);
                normalize_where(where_sql)
            }
            None => identity_predicate(table, &dialect, &params)?,
        };

        let sql = join_sql(&[
            "UPDATE",
            table.name(),
            "SET",
            &quoted_assignment_list(&dialect, &columns),
            &predicate,
        ]);
        let affected = session.execute(&sql, &params, self.timeout).await?;
        Ok(affected > 0)
    }

    /// Updates a tracked entity if it changed since it was read.
    ///
    /// Returns false without issuing SQL for a clean entity. A successful
    /// update marks the entity clean.
    ///
    /// # Errors
    ///
    /// Same as [`Repository::update`].
    pub async fn update_tracked<S: Session>(
        &self,
        session: &mut S,
        tracked: &mut Tracked<E>,
        options: &UpdateOptions,
    ) -> Result<bool> {
        if !tracked.is_dirty() {
            debug!(table = Self::table().name(), "Skipping update of unchanged entity");
            return Ok(false);
        }
        let updated = self.update(session, tracked, options).await?;
        if updated {
            tracked.mark_clean();
        }
        Ok(updated)
    }

    /// Deletes one entity; true iff at least one row was affected.
    ///
    /// `where_sql` replaces the identity match and may refer to the entity's
    /// columns as `@column`.
    ///
    /// # Errors
    ///
    /// `MissingKey` / `InvalidEntity` when matching on identity, plus
    /// database errors.
    pub async fn delete<S: Session>(
        &self,
        session: &mut S,
        entity: &E,
        where_sql: Option<&str>,
    ) -> Result<bool> {
        let table = Self::table();
        let dialect = session.dialect();
        let params = entity.to_params();
        let predicate = match where_sql.filter(|w| !w.trim().is_empty()) {
            Some(where_sql) => normalize_where(where_sql),
            None => identity_predicate(table, &dialect, &params)?,
        };

        let sql = join_sql(&["DELETE FROM", table.name(), &predicate]);
        let affected = session.execute(&sql, &params, self.timeout).await?;
        Ok(affected > 0)
    }

    /// Deletes the row whose single identity column equals `id`.
    ///
    /// # Errors
    ///
    /// `MissingKey` / `CompositeKey` when the table has no single identity
    /// column, plus database errors.
    pub async fn delete_by_id<S: Session, V: ToSqlValue>(
        &self,
        session: &mut S,
        id: V,
    ) -> Result<bool> {
        let table = Self::table();
        let key = table.single_identity()?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = @id",
            table.name(),
            session.dialect().quote_identifier(key)
        );
        let affected = session
            .execute(&sql, &Params::new().with("id", id), self.timeout)
            .await?;
        Ok(affected > 0)
    }

    /// Fetches one page of entities with the total row count.
    ///
    /// # Errors
    ///
    /// `UnsupportedDialect`, `AmbiguousSort`, database and row mapping
    /// errors.
    pub async fn page<S: Session>(
        &self,
        session: &mut S,
        request: &PageRequest,
    ) -> Result<PageResult<E>> {
        let page = paginate(session, Self::table(), request, self.timeout).await?;
        page.try_map(|row| E::from_row(&row).map_err(ContribError::from))
    }

    /// Bulk-copies entities into the table.
    ///
    /// # Errors
    ///
    /// See [`StagingCoordinator::bulk_insert`].
    pub async fn bulk_insert<S: Session>(&self, session: &mut S, entities: &[E]) -> Result<u64> {
        let rows: Vec<Params> = entities.iter().map(Entity::to_params).collect();
        self.staging.bulk_insert(session, Self::table(), &rows).await
    }

    /// Updates many entities through a staging table, matched on identity.
    ///
    /// # Errors
    ///
    /// See [`StagingCoordinator::bulk_update`].
    pub async fn bulk_update<S: Session>(
        &self,
        session: &mut S,
        entities: &[E],
        columns: Option<&[&str]>,
    ) -> Result<u64> {
        let rows: Vec<Params> = entities.iter().map(Entity::to_params).collect();
        self.staging
            .bulk_update(session, Self::table(), &rows, columns)
            .await
    }

    /// Fetches the entities whose `column` holds one of `values`.
    ///
    /// # Errors
    ///
    /// See [`StagingCoordinator::fetch_by_values`].
    pub async fn fetch_by_values<S, I, V>(
        &self,
        session: &mut S,
        column: &str,
        values: I,
        filter: &Filter,
    ) -> Result<Vec<E>>
    where
        S: Session,
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let values = values.into_iter().map(ToSqlValue::to_sql_value).collect();
        let rows = self
            .staging
            .fetch_by_values(session, Self::table(), column, values, filter)
            .await?;
        rows.iter()
            .map(|row| E::from_row(row).map_err(ContribError::from))
            .collect()
    }
}

/// Access to a repository from the entity type, as in `Country::repository()`.
pub trait EntityExt: Entity {
    /// Returns a repository with default settings.
    #[must_use]
    fn repository() -> Repository<Self> {
        Repository::new()
    }
}

impl<E: Entity> EntityExt for E {}

fn assignable_columns<'t>(
    table: &'t TableDescriptor,
    requested: Option<&[String]>,
) -> Result<Vec<&'t str>> {
    let columns = match requested {
        Some(requested) => {
            let identity = table.identity_columns();
            let mut resolved: Vec<&str> = Vec::with_capacity(requested.len());
            for column in requested {
                let column = table.resolve_column(column)?;
                let fixed = identity.iter().any(|k| k.eq_ignore_ascii_case(column))
                    || table
                        .computed_columns()
                        .iter()
                        .any(|c| c.eq_ignore_ascii_case(column));
                if !fixed && !resolved.contains(&column) {
                    resolved.push(column);
                }
            }
            resolved
        }
        None => table.update_columns(),
    };
    if columns.is_empty() {
        return Err(CoreError::EmptyUpdate {
            table: table.name().to_string(),
        }
        .into());
    }
    Ok(columns)
}

fn identity_predicate(
    table: &TableDescriptor,
    dialect: &DialectId,
    params: &Params,
) -> Result<String> {
    let identity = table.require_identity()?;
    for column in &identity {
        if params.get(column).map_or(true, |v| v.is_null()) {
            return Err(CoreError::InvalidEntity(format!(
                "identity column '{column}' of '{}' has no value",
                table.name()
            ))
            .into());
        }
    }
    Ok(format!(
        " where {}",
        quoted_key_predicate(dialect, &identity, "and")
    ))
}
