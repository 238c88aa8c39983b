use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, Condition, ConnectionTrait, QueryOrder, Set};
use serde::Serialize;

/// One student's attendance in one session.
///
/// At most one row per `(session_pk, regno)` and per `(session_pk, student_email)`;
/// the unique indexes back up the in-process duplicate check.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub session_pk: i64,
    pub regno: Option<String>,
    pub student_email: Option<String>,
    /// Reference returned by the image store.
    pub image: String,
    pub date: String,
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "Location")]
    pub location: String,
    pub distance: Option<String>,
    pub within_radius: Option<bool>,
    #[serde(rename = "marked_at")]
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::session::Entity",
        from = "Column::SessionPk",
        to = "super::session::Column::Id"
    )]
    Session,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone)]
pub struct NewAttendanceRecord {
    pub session_pk: i64,
    pub regno: Option<String>,
    pub student_email: Option<String>,
    pub image: String,
    pub date: String,
    pub ip: String,
    pub location: String,
    pub distance: Option<String>,
    pub within_radius: Option<bool>,
}

impl Model {
    pub async fn create<C>(db: &C, new: NewAttendanceRecord) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        ActiveModel {
            session_pk: Set(new.session_pk),
            regno: Set(new.regno),
            student_email: Set(new.student_email),
            image: Set(new.image),
            date: Set(new.date),
            ip: Set(new.ip),
            location: Set(new.location),
            distance: Set(new.distance),
            within_radius: Set(new.within_radius),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Existing record of the session matching either identity key.
    ///
    /// Returns `None` without querying when both keys are absent.
    pub async fn find_by_identity<C>(
        db: &C,
        session_pk: i64,
        regno: Option<&str>,
        student_email: Option<&str>,
    ) -> Result<Option<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        if regno.is_none() && student_email.is_none() {
            return Ok(None);
        }

        let mut identity = Condition::any();
        if let Some(regno) = regno {
            identity = identity.add(Column::Regno.eq(regno));
        }
        if let Some(email) = student_email {
            identity = identity.add(Column::StudentEmail.eq(email));
        }

        Entity::find()
            .filter(Column::SessionPk.eq(session_pk))
            .filter(identity)
            .one(db)
            .await
    }

    /// Records of the given sessions in insertion order.
    pub async fn list_for_sessions<C>(db: &C, session_pks: &[i64]) -> Result<Vec<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        if session_pks.is_empty() {
            return Ok(Vec::new());
        }
        Entity::find()
            .filter(Column::SessionPk.is_in(session_pks.iter().copied()))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    pub async fn count_for_session<C>(db: &C, session_pk: i64) -> Result<u64, DbErr>
    where
        C: ConnectionTrait,
    {
        use sea_orm::PaginatorTrait;
        Entity::find()
            .filter(Column::SessionPk.eq(session_pk))
            .count(db)
            .await
    }
}
