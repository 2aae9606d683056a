use sea_orm_migration::prelude::*;

const LANGUAGES: [&str; 5] = ["English", "Portuguese", "Spanish", "French", "Japanese"];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert =
            Query::insert().into_table(Languages::Table).columns([Languages::Name]).to_owned();
        for name in LANGUAGES {
            insert.values_panic([name.into()]);
        }
        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = Query::delete()
            .from_table(Languages::Table)
            .and_where(Expr::col(Languages::Name).is_in(LANGUAGES))
            .to_owned();
        manager.exec_stmt(delete).await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Languages {
    Table,
    Name,
}
