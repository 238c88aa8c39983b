use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, ConnectionTrait, QueryOrder, Set};
use serde::Serialize;

/// A persisted attendance session. Never deleted; only its attendance grows.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub teacher_id: i64,
    /// Caller-chosen identifier, unique per teacher. This is what QR codes carry.
    pub session_id: String,
    pub name: String,
    pub course: String,
    pub section: String,
    pub date: String,
    pub time: String,
    /// Minutes.
    pub duration: i32,
    /// Teacher position as `"lat,lon"`, or empty when none was given.
    pub location: String,
    /// Metres.
    pub radius: i32,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::teacher::Entity",
        from = "Column::TeacherId",
        to = "super::teacher::Column::Id"
    )]
    Teacher,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::teacher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Column values for a new session row, already defaulted and validated.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionFields {
    pub session_id: String,
    pub name: String,
    pub course: String,
    pub section: String,
    pub date: String,
    pub time: String,
    pub duration: i32,
    pub location: String,
    pub radius: i32,
}

impl Model {
    pub async fn create<C>(db: &C, teacher_id: i64, fields: &SessionFields) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        ActiveModel {
            teacher_id: Set(teacher_id),
            session_id: Set(fields.session_id.clone()),
            name: Set(fields.name.clone()),
            course: Set(fields.course.clone()),
            section: Set(fields.section.clone()),
            date: Set(fields.date.clone()),
            time: Set(fields.time.clone()),
            duration: Set(fields.duration),
            location: Set(fields.location.clone()),
            radius: Set(fields.radius),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find_for_teacher<C>(
        db: &C,
        teacher_id: i64,
        session_id: &str,
    ) -> Result<Option<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .filter(Column::SessionId.eq(session_id))
            .one(db)
            .await
    }

    /// All sessions of a teacher in creation order.
    pub async fn list_for_teacher<C>(db: &C, teacher_id: i64) -> Result<Vec<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }
}
