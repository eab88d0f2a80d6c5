//! # Tenant-Scoped Repository
//!
//! Generic data access for entities that belong to a journal. Every read built
//! from [`ScopedRepository::select`] carries `tenant_id = <active journal>` when a
//! journal context is active, and every insert is stamped with the active journal
//! before it is persisted. In global mode no filter is added and unstamped rows
//! keep a null tenant.

use std::marker::PhantomData;

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait,
    DatabaseConnection, EntityTrait, IntoActiveModel, PrimaryKeyTrait, QueryFilter, Select, Value,
    sea_query::ValueType,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::tenancy::TenantContext;

/// An entity whose rows are owned by a tenant through a nullable uuid column.
pub trait TenantScoped: EntityTrait {
    /// Column holding the owning tenant id.
    fn tenant_column() -> Self::Column;
}

/// Repository that filters and stamps an entity by the active tenant.
///
/// Generic over the connection so the same scoping applies inside transactions.
pub struct ScopedRepository<'a, E, C = DatabaseConnection>
where
    E: TenantScoped,
    C: ConnectionTrait,
{
    db: &'a C,
    tenant_id: Option<Uuid>,
    _entity: PhantomData<E>,
}

impl<'a, E, C> ScopedRepository<'a, E, C>
where
    E: TenantScoped,
    C: ConnectionTrait,
{
    /// Scope to the request's tenant context.
    pub fn new(db: &'a C, context: &TenantContext) -> Self {
        Self {
            db,
            tenant_id: context.tenant_id(),
            _entity: PhantomData,
        }
    }

    /// Administrative access across all tenants. Reads are unfiltered and inserts
    /// are never stamped.
    pub fn unscoped(db: &'a C) -> Self {
        Self {
            db,
            tenant_id: None,
            _entity: PhantomData,
        }
    }

    pub fn tenant_id(&self) -> Option<Uuid> {
        self.tenant_id
    }

    /// Adds the tenant predicate to any filterable statement (select, update or delete).
    pub fn apply<Q: QueryFilter>(&self, query: Q) -> Q {
        match self.tenant_id {
            Some(tenant_id) => query.filter(E::tenant_column().eq(tenant_id)),
            None => query,
        }
    }

    /// Starting point for every read of the entity.
    pub fn select(&self) -> Select<E> {
        self.apply(E::find())
    }

    pub async fn all(&self) -> Result<Vec<E::Model>, RepositoryError> {
        self.select()
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_id<K>(&self, id: K) -> Result<Option<E::Model>, RepositoryError>
    where
        K: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    {
        self.apply(E::find_by_id(id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Before-save stage: assigns the active tenant when the record carries none.
    ///
    /// A tenant id that is already set is left untouched.
    pub fn stamp(&self, model: &mut E::ActiveModel) {
        let Some(tenant_id) = self.tenant_id else {
            return;
        };

        if assigned_tenant(&model.get(E::tenant_column())).is_none() {
            model.set(E::tenant_column(), tenant_id.into());
        }
    }

    /// Stamps and inserts a new record.
    pub async fn insert(&self, mut model: E::ActiveModel) -> Result<E::Model, RepositoryError>
    where
        E::ActiveModel: ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<E::ActiveModel>,
    {
        self.stamp(&mut model);
        model
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Persists changes to a record previously loaded through this repository.
    ///
    /// Moving a record to another tenant is refused.
    pub async fn update(&self, model: E::ActiveModel) -> Result<E::Model, RepositoryError>
    where
        E::ActiveModel: ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<E::ActiveModel>,
    {
        if let ActiveValue::Set(_) = model.get(E::tenant_column()) {
            return Err(RepositoryError::validation_error(
                "tenant ownership cannot be changed",
            ));
        }
        if let Some(tenant_id) = self.tenant_id {
            if assigned_tenant(&model.get(E::tenant_column())) != Some(tenant_id) {
                return Err(RepositoryError::not_found("record not found in this journal"));
            }
        }

        model
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Deletes a record visible in the current scope. Returns `false` when none matched.
    pub async fn delete_by_id<K>(&self, id: K) -> Result<bool, RepositoryError>
    where
        K: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    {
        let result = self
            .apply(E::delete_by_id(id))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(result.rows_affected > 0)
    }
}

/// Tenant id carried by an active value, treating unset and null alike.
fn assigned_tenant(value: &ActiveValue<Value>) -> Option<Uuid> {
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => {
            <Option<Uuid> as ValueType>::try_from(v.clone()).ok().flatten()
        }
        ActiveValue::NotSet => None,
    }
}
