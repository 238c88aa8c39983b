use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510010004_create_attendance_records"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("attendance_records"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("session_pk"))
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("regno")).string().null())
                    .col(ColumnDef::new(Alias::new("student_email")).string().null())
                    .col(ColumnDef::new(Alias::new("image")).string().not_null())
                    .col(ColumnDef::new(Alias::new("date")).string().not_null().default(""))
                    .col(ColumnDef::new(Alias::new("ip")).string().not_null().default(""))
                    .col(ColumnDef::new(Alias::new("location")).string().not_null())
                    // Metres, two decimals, as text. Null when the session has no location.
                    .col(ColumnDef::new(Alias::new("distance")).string().null())
                    .col(ColumnDef::new(Alias::new("within_radius")).boolean().null())
                    .col(
                        ColumnDef::new(Alias::new("created_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_att_rec_session")
                            .from(Alias::new("attendance_records"), Alias::new("session_pk"))
                            .to(Alias::new("sessions"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // SQLite treats NULLs as distinct, so a record keyed only by email
        // never collides on the regno index and vice versa.
        manager
            .create_index(
                Index::create()
                    .name("ux_att_rec_session_regno")
                    .table(Alias::new("attendance_records"))
                    .col(Alias::new("session_pk"))
                    .col(Alias::new("regno"))
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_att_rec_session_email")
                    .table(Alias::new("attendance_records"))
                    .col(Alias::new("session_pk"))
                    .col(Alias::new("student_email"))
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(Alias::new("attendance_records"))
                    .to_owned(),
            )
            .await
    }
}
