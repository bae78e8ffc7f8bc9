//! Initial schema for Viatic.
//!
//! - `users`: registered claimants
//! - `entries`: expense-reimbursement records, one row per entry. Fuel and
//!   expense columns are nullable; exactly one group is populated per row.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    Password,
    Name,
    Foraneo,
}

#[derive(Iden)]
enum Entries {
    Table,
    Id,
    CreatedBy,
    Tipo,
    ClaimantName,
    ExpenseDate,
    Reason,
    CostCenter,
    Branch,
    Folio,
    Notes,
    ServiceType,
    Origin,
    Destination,
    StartKm,
    EndKm,
    Km,
    AmountToJustify,
    CreatedAt,
    UpdatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(
                        ColumnDef::new(Users::Foraneo)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Entries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Entries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Entries::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Entries::Tipo).string().not_null())
                    .col(ColumnDef::new(Entries::ClaimantName).string().not_null())
                    .col(ColumnDef::new(Entries::ExpenseDate).timestamp_with_time_zone())
                    .col(ColumnDef::new(Entries::Reason).string().not_null())
                    .col(ColumnDef::new(Entries::CostCenter).string().not_null())
                    .col(ColumnDef::new(Entries::Branch).string().not_null())
                    .col(ColumnDef::new(Entries::Folio).string().not_null())
                    .col(ColumnDef::new(Entries::Notes).string())
                    .col(ColumnDef::new(Entries::ServiceType).string())
                    .col(ColumnDef::new(Entries::Origin).string())
                    .col(ColumnDef::new(Entries::Destination).string())
                    .col(ColumnDef::new(Entries::StartKm).double())
                    .col(ColumnDef::new(Entries::EndKm).double())
                    .col(ColumnDef::new(Entries::Km).double())
                    .col(ColumnDef::new(Entries::AmountToJustify).double())
                    .col(
                        ColumnDef::new(Entries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Entries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-entries-created_by")
                            .from(Entries::Table, Entries::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Owner listing is always newest-first.
        manager
            .create_index(
                Index::create()
                    .name("idx-entries-created_by-created_at")
                    .table(Entries::Table)
                    .col(Entries::CreatedBy)
                    .col(Entries::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Entries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}
