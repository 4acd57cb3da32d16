//! PostgreSQL repository implementations.
//!
//! Lifecycle writes are single `UPDATE ... WHERE id = ? AND status = ?`
//! statements; zero affected rows means another writer got there first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use pulse_core::domain::{Metrics, Post, PostAnalytics, PostStatus, ReactionKind, User};
use pulse_core::error::RepoError;
use pulse_core::ports::{
    AnalyticsRepository, AnalyticsScope, PostQuery, PostRepository, StatusCounts, Transition,
    UserRepository,
};

use super::entity::analytics::{self, Entity as AnalyticsEntity, reaction_column};
use super::entity::post::{self, Entity as PostEntity, Status};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL analytics repository.
pub type PostgresAnalyticsRepository = PostgresBaseRepository<AnalyticsEntity>;

fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{first}***@{domain}")
        }
        None => "***".to_string(),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(login))
                    .add(user::Column::Email.eq(login)),
            )
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<User>, RepoError> {
        let result = UserEntity::find()
            .order_by_asc(user::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepoError> {
        let result = UserEntity::update_many()
            .col_expr(user::Column::LastLogin, Expr::value(at.fixed_offset()))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

impl PostgresPostRepository {
    async fn fetch(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let model = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(model.map(Into::into))
    }

    /// Turn the affected-row count of a conditional update into a `Transition`.
    async fn settle(&self, id: Uuid, rows_affected: u64) -> Result<Transition, RepoError> {
        Ok(match (rows_affected, self.fetch(id).await?) {
            (_, None) => Transition::NotFound,
            (0, Some(current)) => Transition::Conflict {
                current: current.status,
            },
            (_, Some(stored)) => Transition::Applied(stored),
        })
    }

    fn scheduled() -> sea_orm::Select<PostEntity> {
        PostEntity::find().filter(post::Column::Status.eq(Status::Scheduled))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list(&self, query: &PostQuery, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        let mut select = PostEntity::find();

        if let Some(author_id) = query.author_id {
            select = select.filter(post::Column::AuthorId.eq(author_id));
        }
        if let Some(status) = query.status {
            select = select.filter(post::Column::Status.eq(Status::from(status)));
        }
        if let Some(after) = query.created_after {
            select = select.filter(post::Column::CreatedAt.gte(after.fixed_offset()));
        }
        if let Some(before) = query.created_before {
            select = select.filter(post::Column::CreatedAt.lte(before.fixed_offset()));
        }

        if query.status == Some(PostStatus::Scheduled) {
            select = match query.upcoming_only {
                Some(true) => select.filter(post::Column::ScheduledAt.gt(now.fixed_offset())),
                Some(false) => select.filter(post::Column::ScheduledAt.lte(now.fixed_offset())),
                None => select,
            };
            select = select.order_by_asc(post::Column::ScheduledAt);
        } else {
            select = select.order_by_desc(post::Column::CreatedAt);
        }

        let result = select
            .offset(query.skip)
            .limit(query.limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn update_content(
        &self,
        id: Uuid,
        title: Option<String>,
        content: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<Post>, RepoError> {
        let Some(model) = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };

        let mut active: post::ActiveModel = model.into();
        if let Some(title) = title {
            active.title = Set(title);
        }
        if let Some(content) = content {
            active.content = Set(content);
        }
        active.updated_at = Set(now.fixed_offset());

        let updated = active.update(&self.db).await.map_err(map_db_err)?;
        Ok(Some(updated.into()))
    }

    async fn schedule(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Transition, RepoError> {
        let result = PostEntity::update_many()
            .set(post::ActiveModel {
                status: Set(Status::Scheduled),
                scheduled_at: Set(Some(at.fixed_offset())),
                last_error: Set(None),
                publish_attempts: Set(0),
                updated_at: Set(now.fixed_offset()),
                ..Default::default()
            })
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::Status.is_in([Status::Draft, Status::Scheduled]))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        self.settle(id, result.rows_affected).await
    }

    async fn unschedule(&self, id: Uuid, now: DateTime<Utc>) -> Result<Transition, RepoError> {
        let result = PostEntity::update_many()
            .set(post::ActiveModel {
                status: Set(Status::Draft),
                scheduled_at: Set(None),
                updated_at: Set(now.fixed_offset()),
                ..Default::default()
            })
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::Status.eq(Status::Scheduled))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        self.settle(id, result.rows_affected).await
    }

    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        let result = Self::scheduled()
            .filter(post::Column::ScheduledAt.lte(now.fixed_offset()))
            .order_by_asc(post::Column::ScheduledAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn try_publish(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        external_id: Option<String>,
    ) -> Result<Transition, RepoError> {
        let result = PostEntity::update_many()
            .set(post::ActiveModel {
                status: Set(Status::Published),
                scheduled_at: Set(None),
                published_at: Set(Some(now.fixed_offset())),
                external_id: Set(external_id),
                last_error: Set(None),
                updated_at: Set(now.fixed_offset()),
                ..Default::default()
            })
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::Status.eq(Status::Scheduled))
            .filter(post::Column::ScheduledAt.lte(now.fixed_offset()))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        self.settle(id, result.rows_affected).await
    }

    async fn record_failure(
        &self,
        id: Uuid,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, RepoError> {
        let result = PostEntity::update_many()
            .col_expr(
                post::Column::PublishAttempts,
                Expr::col(post::Column::PublishAttempts).add(1),
            )
            .set(post::ActiveModel {
                last_error: Set(Some(error.to_string())),
                updated_at: Set(now.fixed_offset()),
                ..Default::default()
            })
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::Status.eq(Status::Scheduled))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        self.settle(id, result.rows_affected).await
    }

    async fn count_by_status(&self) -> Result<StatusCounts, RepoError> {
        let mut counts = StatusCounts::default();
        for status in PostStatus::ALL {
            let n = PostEntity::find()
                .filter(post::Column::Status.eq(Status::from(status)))
                .count(&self.db)
                .await
                .map_err(map_db_err)?;
            counts.add(status, n);
        }
        Ok(counts)
    }

    async fn find_overdue(&self, cutoff: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        let result = Self::scheduled()
            .filter(post::Column::ScheduledAt.lt(cutoff.fixed_offset()))
            .order_by_asc(post::Column::ScheduledAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn count_scheduled_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, RepoError> {
        Self::scheduled()
            .filter(post::Column::ScheduledAt.gt(from.fixed_offset()))
            .filter(post::Column::ScheduledAt.lte(to.fixed_offset()))
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }
}

impl PostgresAnalyticsRepository {
    async fn fetch(&self, post_id: Uuid) -> Result<Option<PostAnalytics>, RepoError> {
        let model = AnalyticsEntity::find()
            .filter(analytics::Column::PostId.eq(post_id))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(model.map(Into::into))
    }
}

#[async_trait]
impl AnalyticsRepository for PostgresAnalyticsRepository {
    async fn find_by_post(&self, post_id: Uuid) -> Result<Option<PostAnalytics>, RepoError> {
        self.fetch(post_id).await
    }

    async fn insert(&self, record: PostAnalytics) -> Result<PostAnalytics, RepoError> {
        let active: analytics::ActiveModel = record.into();
        let model = active.insert(&self.db).await.map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn update_metrics(
        &self,
        post_id: Uuid,
        metrics: Metrics,
        now: DateTime<Utc>,
    ) -> Result<Option<PostAnalytics>, RepoError> {
        let mut active = analytics::ActiveModel {
            updated_at: Set(now.fixed_offset()),
            ..Default::default()
        };
        active.set_metrics(metrics);

        let result = AnalyticsEntity::update_many()
            .set(active)
            .filter(analytics::Column::PostId.eq(post_id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.fetch(post_id).await
    }

    async fn increment_reaction(
        &self,
        post_id: Uuid,
        kind: ReactionKind,
        by: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<PostAnalytics>, RepoError> {
        let column = reaction_column(kind);
        let result = AnalyticsEntity::update_many()
            .col_expr(column, Expr::col(column).add(by))
            .col_expr(analytics::Column::UpdatedAt, Expr::value(now.fixed_offset()))
            .filter(analytics::Column::PostId.eq(post_id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.fetch(post_id).await
    }

    async fn delete_by_post(&self, post_id: Uuid) -> Result<bool, RepoError> {
        let result = AnalyticsEntity::delete_many()
            .filter(analytics::Column::PostId.eq(post_id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<PostAnalytics>, RepoError> {
        let result = AnalyticsEntity::find()
            .order_by_asc(analytics::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_with_posts(
        &self,
        scope: &AnalyticsScope,
    ) -> Result<Vec<(PostAnalytics, Post)>, RepoError> {
        let mut select = AnalyticsEntity::find().find_also_related(PostEntity);
        if let Some(author_id) = scope.author_id {
            select = select.filter(post::Column::AuthorId.eq(author_id));
        }
        if let Some(after) = scope.posts_created_after {
            select = select.filter(post::Column::CreatedAt.gte(after.fixed_offset()));
        }

        let rows = select.all(&self.db).await.map_err(map_db_err)?;
        Ok(rows
            .into_iter()
            .filter_map(|(a, p)| p.map(|p| (a.into(), p.into())))
            .collect())
    }
}
