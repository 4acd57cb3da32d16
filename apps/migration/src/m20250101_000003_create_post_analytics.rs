use sea_orm_migration::prelude::*;

use crate::m20250101_000002_create_posts::Posts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PostAnalytics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostAnalytics::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PostAnalytics::PostId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(counter(PostAnalytics::ReactionsLike))
                    .col(counter(PostAnalytics::ReactionsPraise))
                    .col(counter(PostAnalytics::ReactionsEmpathy))
                    .col(counter(PostAnalytics::ReactionsInterest))
                    .col(counter(PostAnalytics::ReactionsAppreciation))
                    .col(counter(PostAnalytics::TotalImpressions))
                    .col(counter(PostAnalytics::TotalShares))
                    .col(counter(PostAnalytics::TotalComments))
                    .col(
                        ColumnDef::new(PostAnalytics::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PostAnalytics::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_analytics_post")
                            .from(PostAnalytics::Table, PostAnalytics::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostAnalytics::Table).to_owned())
            .await
    }
}

fn counter(column: PostAnalytics) -> ColumnDef {
    ColumnDef::new(column)
        .big_integer()
        .not_null()
        .default(0)
        .to_owned()
}

#[derive(DeriveIden)]
enum PostAnalytics {
    Table,
    Id,
    PostId,
    ReactionsLike,
    ReactionsPraise,
    ReactionsEmpathy,
    ReactionsInterest,
    ReactionsAppreciation,
    TotalImpressions,
    TotalShares,
    TotalComments,
    CreatedAt,
    UpdatedAt,
}
