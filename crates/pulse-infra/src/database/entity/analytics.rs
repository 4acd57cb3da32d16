//! Post analytics entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use pulse_core::domain::{Metrics, PostAnalytics, ReactionKind};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "post_analytics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub post_id: Uuid,
    pub reactions_like: i64,
    pub reactions_praise: i64,
    pub reactions_empathy: i64,
    pub reactions_interest: i64,
    pub reactions_appreciation: i64,
    pub total_impressions: i64,
    pub total_shares: i64,
    pub total_comments: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Counter column backing a reaction kind.
pub fn reaction_column(kind: ReactionKind) -> Column {
    match kind {
        ReactionKind::Like => Column::ReactionsLike,
        ReactionKind::Praise => Column::ReactionsPraise,
        ReactionKind::Empathy => Column::ReactionsEmpathy,
        ReactionKind::Interest => Column::ReactionsInterest,
        ReactionKind::Appreciation => Column::ReactionsAppreciation,
    }
}

impl ActiveModel {
    pub fn set_metrics(&mut self, m: Metrics) {
        self.reactions_like = Set(m.reactions_like);
        self.reactions_praise = Set(m.reactions_praise);
        self.reactions_empathy = Set(m.reactions_empathy);
        self.reactions_interest = Set(m.reactions_interest);
        self.reactions_appreciation = Set(m.reactions_appreciation);
        self.total_impressions = Set(m.total_impressions);
        self.total_shares = Set(m.total_shares);
        self.total_comments = Set(m.total_comments);
    }
}

impl From<Model> for PostAnalytics {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            post_id: model.post_id,
            metrics: Metrics {
                reactions_like: model.reactions_like,
                reactions_praise: model.reactions_praise,
                reactions_empathy: model.reactions_empathy,
                reactions_interest: model.reactions_interest,
                reactions_appreciation: model.reactions_appreciation,
                total_impressions: model.total_impressions,
                total_shares: model.total_shares,
                total_comments: model.total_comments,
            },
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<PostAnalytics> for ActiveModel {
    fn from(analytics: PostAnalytics) -> Self {
        let mut active = Self {
            id: Set(analytics.id),
            post_id: Set(analytics.post_id),
            created_at: Set(analytics.created_at.into()),
            updated_at: Set(analytics.updated_at.into()),
            ..Default::default()
        };
        active.set_metrics(analytics.metrics);
        active
    }
}
