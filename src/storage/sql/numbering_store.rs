//! Unified SQL NumberingStore implementation.
//!
//! Uses a macro to generate implementations for each SQL backend,
//! eliminating code duplication while maintaining type safety.
//!
//! Finalization runs in one transaction:
//! 1. insert-or-ignore the scope's counter row (first statement, so SQLite
//!    takes its write lock before anything is read)
//! 2. read `last_issued`
//! 3. `UPDATE counters ... WHERE last_issued = <read value>`
//! 4. `UPDATE documents ... WHERE status = 'draft'`
//!
//! A zero-row update in step 3 or 4 rolls the whole transaction back and
//! reports `StorageError::Conflict`.

use std::marker::PhantomData;

use super::SqlDatabase;

/// SQL-based implementation of NumberingStore.
///
/// This generic implementation works with any SQL database that implements
/// the `SqlDatabase` trait (PostgreSQL, SQLite).
pub struct SqlNumberingStore<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlNumberingStore<DB> {
    /// Create a new SQL numbering store with the given pool.
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &DB::Pool {
        &self.pool
    }
}

/// Macro to implement the numbering store traits for a specific SQL backend.
macro_rules! impl_numbering_store {
    ($db_type:ty, $conn:ty, $row:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        impl SqlNumberingStore<$db_type> {
            /// Create the tables and indexes if they do not exist.
            pub async fn init(&self) -> crate::interfaces::Result<()> {
                for statement in <$db_type as SqlDatabase>::SCHEMA {
                    sqlx::query(*statement).execute(&self.pool).await?;
                }
                Ok(())
            }

            fn document_columns() -> [crate::storage::schema::Documents; 7] {
                use crate::storage::schema::Documents;
                [
                    Documents::Id,
                    Documents::Subject,
                    Documents::Status,
                    Documents::ScopeKey,
                    Documents::SequenceNumber,
                    Documents::FinalizedAt,
                    Documents::CreatedAt,
                ]
            }

            fn read_document(row: &$row) -> crate::interfaces::Result<crate::model::Document> {
                use sqlx::Row;

                super::row::DocumentRow {
                    id: row.try_get("id")?,
                    subject: row.try_get("subject")?,
                    status: row.try_get("status")?,
                    scope_key: row.try_get("scope_key")?,
                    sequence_number: row.try_get("sequence_number")?,
                    finalized_at: row.try_get("finalized_at")?,
                    created_at: row.try_get("created_at")?,
                }
                .into_document()
            }

            /// Counter compare-and-swap within an open transaction.
            async fn bump_counter(
                conn: &mut $conn,
                scope: &crate::model::ScopeKey,
            ) -> crate::interfaces::Result<u64> {
                use sea_query::{Expr, OnConflict, Query};
                use sqlx::Row;

                use crate::interfaces::StorageError;
                use crate::storage::schema::Counters;

                let now = chrono::Utc::now().to_rfc3339();

                let ensure = Query::insert()
                    .into_table(Counters::Table)
                    .columns([Counters::ScopeKey, Counters::LastIssued, Counters::UpdatedAt])
                    .values_panic([scope.as_str().into(), 0i64.into(), now.clone().into()])
                    .on_conflict(OnConflict::column(Counters::ScopeKey).do_nothing().to_owned())
                    .to_owned();
                let sql = <$db_type>::build_insert(ensure);
                sqlx::query(&sql).execute(&mut *conn).await?;

                let select = Query::select()
                    .column(Counters::LastIssued)
                    .from(Counters::Table)
                    .and_where(Expr::col(Counters::ScopeKey).eq(scope.as_str()))
                    .to_owned();
                let sql = <$db_type>::build_select(select);
                let row = sqlx::query(&sql).fetch_one(&mut *conn).await?;
                let observed: i64 = row.try_get("last_issued")?;
                let next = super::row::to_sequence(observed)? + 1;

                let swap = Query::update()
                    .table(Counters::Table)
                    .values([
                        (Counters::LastIssued, super::row::from_sequence(next)?.into()),
                        (Counters::UpdatedAt, now.into()),
                    ])
                    .and_where(Expr::col(Counters::ScopeKey).eq(scope.as_str()))
                    .and_where(Expr::col(Counters::LastIssued).eq(observed))
                    .to_owned();
                let sql = <$db_type>::build_update(swap);
                let result = sqlx::query(&sql).execute(&mut *conn).await?;

                if result.rows_affected() == 0 {
                    return Err(StorageError::Conflict(format!(
                        "counter for scope {} moved past {}",
                        scope, observed
                    )));
                }

                Ok(next)
            }

            /// Stamp a draft within an open transaction.
            async fn stamp_document(
                conn: &mut $conn,
                id: crate::model::DocumentId,
                numbering: &crate::model::Numbering,
            ) -> crate::interfaces::Result<()> {
                use sea_query::{Expr, Query};

                use crate::interfaces::StorageError;
                use crate::model::DocumentStatus;
                use crate::storage::schema::Documents;

                let stamp = Query::update()
                    .table(Documents::Table)
                    .values([
                        (Documents::Status, DocumentStatus::Finalized.as_str().into()),
                        (Documents::ScopeKey, numbering.scope_key.as_str().into()),
                        (
                            Documents::SequenceNumber,
                            super::row::from_sequence(numbering.sequence_number)?.into(),
                        ),
                        (
                            Documents::FinalizedAt,
                            numbering.finalized_at.to_rfc3339().into(),
                        ),
                    ])
                    .and_where(Expr::col(Documents::Id).eq(id.to_string()))
                    .and_where(Expr::col(Documents::Status).eq(DocumentStatus::Draft.as_str()))
                    .to_owned();
                let sql = <$db_type>::build_update(stamp);
                let result = sqlx::query(&sql).execute(&mut *conn).await?;

                if result.rows_affected() == 0 {
                    return Err(StorageError::Conflict(format!(
                        "document {} is no longer a draft",
                        id
                    )));
                }

                Ok(())
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::CounterStore for SqlNumberingStore<$db_type> {
            async fn increment(
                &self,
                scope: &crate::model::ScopeKey,
            ) -> crate::interfaces::Result<u64> {
                let mut tx = self.pool.begin().await?;

                match Self::bump_counter(&mut *tx, scope).await {
                    Ok(next) => {
                        tx.commit().await?;
                        Ok(next)
                    }
                    Err(e) => {
                        let _ = tx.rollback().await;
                        Err(e)
                    }
                }
            }

            async fn last_issued(
                &self,
                scope: &crate::model::ScopeKey,
            ) -> crate::interfaces::Result<u64> {
                use sea_query::{Expr, Query};
                use sqlx::Row;

                use crate::storage::schema::Counters;

                let select = Query::select()
                    .column(Counters::LastIssued)
                    .from(Counters::Table)
                    .and_where(Expr::col(Counters::ScopeKey).eq(scope.as_str()))
                    .to_owned();
                let sql = <$db_type>::build_select(select);
                let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

                match row {
                    Some(row) => super::row::to_sequence(row.try_get("last_issued")?),
                    None => Ok(0),
                }
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::DocumentStore for SqlNumberingStore<$db_type> {
            async fn insert(
                &self,
                document: &crate::model::Document,
            ) -> crate::interfaces::Result<()> {
                use sea_query::{Query, SimpleExpr};

                use crate::interfaces::StorageError;
                use crate::storage::schema::Documents;

                let numbering = document.numbering();
                let sequence_number = numbering
                    .map(|n| super::row::from_sequence(n.sequence_number))
                    .transpose()?;

                let values: [SimpleExpr; 7] = [
                    document.id.to_string().into(),
                    document.subject.clone().into(),
                    document.status().as_str().into(),
                    numbering.map(|n| n.scope_key.as_str().to_string()).into(),
                    sequence_number.into(),
                    numbering.map(|n| n.finalized_at.to_rfc3339()).into(),
                    document.created_at.to_rfc3339().into(),
                ];

                let insert = Query::insert()
                    .into_table(Documents::Table)
                    .columns(Self::document_columns())
                    .values_panic(values)
                    .to_owned();
                let sql = <$db_type>::build_insert(insert);

                match sqlx::query(&sql).execute(&self.pool).await {
                    Ok(_) => Ok(()),
                    Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                        Err(StorageError::Duplicate(document.id))
                    }
                    Err(e) => Err(e.into()),
                }
            }

            async fn load(
                &self,
                id: crate::model::DocumentId,
            ) -> crate::interfaces::Result<Option<crate::model::Document>> {
                use sea_query::{Expr, Query};

                use crate::storage::schema::Documents;

                let select = Query::select()
                    .columns(Self::document_columns())
                    .from(Documents::Table)
                    .and_where(Expr::col(Documents::Id).eq(id.to_string()))
                    .to_owned();
                let sql = <$db_type>::build_select(select);
                let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

                row.as_ref().map(Self::read_document).transpose()
            }

            async fn find_by_number(
                &self,
                scope: &crate::model::ScopeKey,
                sequence_number: u64,
            ) -> crate::interfaces::Result<Option<crate::model::Document>> {
                use sea_query::{Expr, Query};

                use crate::storage::schema::Documents;

                let select = Query::select()
                    .columns(Self::document_columns())
                    .from(Documents::Table)
                    .and_where(Expr::col(Documents::ScopeKey).eq(scope.as_str()))
                    .and_where(
                        Expr::col(Documents::SequenceNumber)
                            .eq(super::row::from_sequence(sequence_number)?),
                    )
                    .to_owned();
                let sql = <$db_type>::build_select(select);
                let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

                row.as_ref().map(Self::read_document).transpose()
            }

            async fn delete(
                &self,
                id: crate::model::DocumentId,
            ) -> crate::interfaces::Result<bool> {
                use sea_query::{Expr, Query};

                use crate::storage::schema::Documents;

                let delete = Query::delete()
                    .from_table(Documents::Table)
                    .and_where(Expr::col(Documents::Id).eq(id.to_string()))
                    .to_owned();
                let sql = <$db_type>::build_delete(delete);
                let result = sqlx::query(&sql).execute(&self.pool).await?;

                Ok(result.rows_affected() > 0)
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::NumberingStore for SqlNumberingStore<$db_type> {
            async fn commit_finalization(
                &self,
                id: crate::model::DocumentId,
                scope: &crate::model::ScopeKey,
                finalized_at: chrono::DateTime<chrono::Utc>,
            ) -> crate::interfaces::Result<crate::model::Numbering> {
                let mut tx = self.pool.begin().await?;

                let result = async {
                    let sequence_number = Self::bump_counter(&mut *tx, scope).await?;
                    let numbering = crate::model::Numbering {
                        scope_key: scope.clone(),
                        sequence_number,
                        finalized_at,
                    };
                    Self::stamp_document(&mut *tx, id, &numbering).await?;
                    Ok::<_, crate::interfaces::StorageError>(numbering)
                }
                .await;

                match result {
                    Ok(numbering) => {
                        tx.commit().await?;
                        tracing::debug!(
                            %id,
                            %scope,
                            sequence = numbering.sequence_number,
                            "Finalization committed"
                        );
                        Ok(numbering)
                    }
                    Err(e) => {
                        let _ = tx.rollback().await;
                        Err(e)
                    }
                }
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_numbering_store!(
    super::postgres::Postgres,
    sqlx::PgConnection,
    sqlx::postgres::PgRow,
    "postgres"
);
impl_numbering_store!(
    super::sqlite::Sqlite,
    sqlx::SqliteConnection,
    sqlx::sqlite::SqliteRow,
    "sqlite"
);
