use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, ConnectionTrait, QueryOrder, Set};
use serde::Serialize;

/// Denormalized copy of an attended session kept on the student side for history lookups.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "student_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub student_id: i64,
    pub session_id: String,
    pub teacher_email: String,
    pub name: String,
    pub course: String,
    pub date: String,
    pub time: String,
    pub duration: i32,
    pub distance: Option<String>,
    pub radius: i32,
    pub image: String,
    #[serde(rename = "marked_at")]
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone)]
pub struct NewStudentSession {
    pub student_id: i64,
    pub session_id: String,
    pub teacher_email: String,
    pub name: String,
    pub course: String,
    pub date: String,
    pub time: String,
    pub duration: i32,
    pub distance: Option<String>,
    pub radius: i32,
    pub image: String,
}

impl Model {
    pub async fn create<C>(db: &C, new: NewStudentSession) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        ActiveModel {
            student_id: Set(new.student_id),
            session_id: Set(new.session_id),
            teacher_email: Set(new.teacher_email),
            name: Set(new.name),
            course: Set(new.course),
            date: Set(new.date),
            time: Set(new.time),
            duration: Set(new.duration),
            distance: Set(new.distance),
            radius: Set(new.radius),
            image: Set(new.image),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn list_for_student<C>(db: &C, student_id: i64) -> Result<Vec<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }
}
