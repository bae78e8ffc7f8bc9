//! The module contains the `Entry` type, an expense-reimbursement record.
//!
//! An entry is either a fuel-mileage claim or a generic expense claim. The two
//! variants never share fields: [`EntryKind`] holds exactly one of them, and
//! the `entries` table rebuilds that enum from its nullable columns on read.
use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

pub(crate) const FUEL: &str = "fuel";
pub(crate) const EXPENSE: &str = "expense";

/// Area of the company the expense is charged to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceType {
    FieldServices,
    Installations,
    TransportMaintenance,
    Administration,
}

impl ServiceType {
    /// Label used on the wire and in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FieldServices => "Field Services",
            Self::Installations => "Instalaciones",
            Self::TransportMaintenance => "Mantenimiento equipo de transporte",
            Self::Administration => "Administración",
        }
    }
}

impl TryFrom<&str> for ServiceType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Field Services" => Ok(Self::FieldServices),
            "Instalaciones" => Ok(Self::Installations),
            "Mantenimiento equipo de transporte" => Ok(Self::TransportMaintenance),
            "Administración" => Ok(Self::Administration),
            other => Err(other.to_string()),
        }
    }
}

/// Fields every entry carries, whatever its variant.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryDetails {
    pub claimant_name: String,
    pub expense_date: Option<DateTime<Utc>>,
    pub reason: String,
    /// Four digit cost-center code.
    pub cost_center: String,
    pub branch: String,
    pub folio: String,
    pub notes: Option<String>,
    pub service_type: Option<ServiceType>,
}

/// A fuel-mileage claim.
#[derive(Clone, Debug, PartialEq)]
pub struct FuelTrip {
    pub origin: String,
    pub destination: String,
    pub start_km: f64,
    pub end_km: f64,
    /// Distance claimed. Either `end_km - start_km` or the value supplied by
    /// the claimant; always finite and non-negative.
    pub km: f64,
}

/// A generic reimbursable expense.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseClaim {
    pub amount_to_justify: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntryKind {
    Fuel(FuelTrip),
    Expense(ExpenseClaim),
}

impl EntryKind {
    /// The `tipo` discriminant.
    pub fn tipo(&self) -> &'static str {
        match self {
            Self::Fuel(_) => FUEL,
            Self::Expense(_) => EXPENSE,
        }
    }
}

/// A validated entry that has not been stored yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewEntry {
    /// Owning user id. Taken from the caller identity, never from the payload.
    pub created_by: String,
    pub details: EntryDetails,
    pub kind: EntryKind,
}

/// A stored entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub id: Uuid,
    pub created_by: String,
    pub details: EntryDetails,
    pub kind: EntryKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// Give a fresh identifier and timestamps to a validated entry.
    pub(crate) fn stamp(new: NewEntry, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_by: new.created_by,
            details: new.details,
            kind: new.kind,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub created_by: String,
    pub tipo: String,
    pub claimant_name: String,
    pub expense_date: Option<DateTimeUtc>,
    pub reason: String,
    pub cost_center: String,
    pub branch: String,
    pub folio: String,
    pub notes: Option<String>,
    pub service_type: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    #[sea_orm(column_type = "Double", nullable)]
    pub start_km: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub end_km: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub km: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub amount_to_justify: Option<f64>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::users::Entity",
        from = "Column::CreatedBy",
        to = "crate::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<crate::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn require_column<T>(value: Option<T>, entry_id: &str, column: &str) -> ResultEngine<T> {
    value.ok_or_else(|| {
        EngineError::Corrupted(format!("entry {entry_id} has no {column}"))
    })
}

impl TryFrom<Model> for Entry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let kind = match model.tipo.as_str() {
            FUEL => EntryKind::Fuel(FuelTrip {
                origin: require_column(model.origin, &model.id, "origin")?,
                destination: require_column(model.destination, &model.id, "destination")?,
                start_km: require_column(model.start_km, &model.id, "start_km")?,
                end_km: require_column(model.end_km, &model.id, "end_km")?,
                km: require_column(model.km, &model.id, "km")?,
            }),
            EXPENSE => EntryKind::Expense(ExpenseClaim {
                amount_to_justify: require_column(
                    model.amount_to_justify,
                    &model.id,
                    "amount_to_justify",
                )?,
            }),
            other => {
                return Err(EngineError::Corrupted(format!(
                    "entry {} has unknown tipo {other}",
                    model.id
                )));
            }
        };
        let service_type = model
            .service_type
            .as_deref()
            .map(ServiceType::try_from)
            .transpose()
            .map_err(|value| {
                EngineError::Corrupted(format!(
                    "entry {} has unknown service type {value}",
                    model.id
                ))
            })?;

        Ok(Self {
            id: parse_uuid(&model.id, "entry")?,
            created_by: model.created_by,
            details: EntryDetails {
                claimant_name: model.claimant_name,
                expense_date: model.expense_date,
                reason: model.reason,
                cost_center: model.cost_center,
                branch: model.branch,
                folio: model.folio,
                notes: model.notes,
                service_type,
            },
            kind,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<&Entry> for ActiveModel {
    fn from(entry: &Entry) -> Self {
        let (fuel, expense) = match &entry.kind {
            EntryKind::Fuel(trip) => (Some(trip), None),
            EntryKind::Expense(claim) => (None, Some(claim)),
        };
        let details = &entry.details;

        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            created_by: ActiveValue::Set(entry.created_by.clone()),
            tipo: ActiveValue::Set(entry.kind.tipo().to_string()),
            claimant_name: ActiveValue::Set(details.claimant_name.clone()),
            expense_date: ActiveValue::Set(details.expense_date),
            reason: ActiveValue::Set(details.reason.clone()),
            cost_center: ActiveValue::Set(details.cost_center.clone()),
            branch: ActiveValue::Set(details.branch.clone()),
            folio: ActiveValue::Set(details.folio.clone()),
            notes: ActiveValue::Set(details.notes.clone()),
            service_type: ActiveValue::Set(details.service_type.map(|s| s.as_str().to_string())),
            origin: ActiveValue::Set(fuel.map(|t| t.origin.clone())),
            destination: ActiveValue::Set(fuel.map(|t| t.destination.clone())),
            start_km: ActiveValue::Set(fuel.map(|t| t.start_km)),
            end_km: ActiveValue::Set(fuel.map(|t| t.end_km)),
            km: ActiveValue::Set(fuel.map(|t| t.km)),
            amount_to_justify: ActiveValue::Set(expense.map(|c| c.amount_to_justify)),
            created_at: ActiveValue::Set(entry.created_at),
            updated_at: ActiveValue::Set(entry.updated_at),
        }
    }
}
