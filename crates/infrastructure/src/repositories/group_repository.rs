use crate::database::GravityDb;
use std::sync::Arc;
use tracing::{error, instrument};
use umbra_dns_domain::group::DEFAULT_GROUP_ID;
use umbra_dns_domain::{DomainError, Group};

type GroupRow = (i64, i64, String, i64, i64, Option<String>);

pub struct SqliteGroupRepository {
    db: Arc<GravityDb>,
}

impl SqliteGroupRepository {
    pub fn new(db: Arc<GravityDb>) -> Self {
        Self { db }
    }

    fn row_to_group(row: GroupRow) -> Group {
        let (id, enabled, name, date_added, date_modified, description) = row;
        Group {
            id: Some(id),
            name: Arc::from(name.as_str()),
            enabled: enabled != 0,
            description: description.map(|s| Arc::from(s.as_str())),
            date_added: Some(date_added),
            date_modified: Some(date_modified),
        }
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Group, DomainError> {
        Group::validate_name(name).map_err(DomainError::InvalidGroupName)?;
        let pool = self.db.acquire().await?;

        let row = sqlx::query_as::<_, GroupRow>(
            "INSERT INTO \"group\" (enabled, name, description) VALUES (1, ?1, ?2)
             RETURNING id, enabled, name, date_added, date_modified, description",
        )
        .bind(name)
        .bind(description)
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                DomainError::InvalidGroupName(format!("Group '{name}' already exists"))
            } else {
                error!(error = %e, "Failed to create group");
                DomainError::DatabaseError(e.to_string())
            }
        })?;

        Ok(Self::row_to_group(row))
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Group>, DomainError> {
        let pool = self.db.acquire().await?;
        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT id, enabled, name, date_added, date_modified, description
             FROM \"group\" WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to query group by id");
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(Self::row_to_group))
    }

    #[instrument(skip(self))]
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Group>, DomainError> {
        let pool = self.db.acquire().await?;
        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT id, enabled, name, date_added, date_modified, description
             FROM \"group\" WHERE name = ?1",
        )
        .bind(name)
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to query group by name");
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(Self::row_to_group))
    }

    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Group>, DomainError> {
        let pool = self.db.acquire().await?;
        let rows = sqlx::query_as::<_, GroupRow>(
            "SELECT id, enabled, name, date_added, date_modified, description
             FROM \"group\" ORDER BY id",
        )
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list groups");
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(Self::row_to_group).collect())
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: i64,
        name: &str,
        enabled: bool,
        description: Option<&str>,
    ) -> Result<(), DomainError> {
        Group::validate_name(name).map_err(DomainError::InvalidGroupName)?;
        let pool = self.db.acquire().await?;

        let result = sqlx::query(
            "UPDATE \"group\"
             SET name = ?1, enabled = ?2, description = ?3,
                 date_modified = cast(strftime('%s', 'now') as int)
             WHERE id = ?4",
        )
        .bind(name)
        .bind(enabled)
        .bind(description)
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to update group");
            DomainError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::GroupNotFound(id));
        }
        Ok(())
    }

    /// The default group is the fallback of the whole identity chain and
    /// can never be removed.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), DomainError> {
        if id == DEFAULT_GROUP_ID {
            return Err(DomainError::InvalidGroupName(
                "The default group cannot be deleted".to_string(),
            ));
        }
        let pool = self.db.acquire().await?;

        let result = sqlx::query("DELETE FROM \"group\" WHERE id = ?1")
            .bind(id)
            .execute(&pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to delete group");
                DomainError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::GroupNotFound(id));
        }
        Ok(())
    }
}
