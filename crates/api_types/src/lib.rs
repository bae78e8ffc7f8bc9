use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of every non-2xx JSON response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    /// Underlying failure detail, only set for store-level errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub ok: bool,
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserNew {
        pub name: String,
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UserCreated {
        pub message: String,
        pub user_id: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LoginResponse {
        /// Bearer credential for the `/api/viaticos` endpoints.
        pub token: String,
        pub user_id: String,
    }

    /// Public projection of a user. The password hash never leaves the server.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserView {
        pub name: String,
        pub username: String,
        pub foraneo: bool,
    }

    /// Allow-listed profile patch.
    ///
    /// Any other key in the request body (including `password`) is ignored.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserPatch {
        pub name: Option<String>,
        pub username: Option<String>,
        pub foraneo: Option<bool>,
    }
}

pub mod entry {
    use super::*;

    /// Raw entry payload as sent by clients.
    ///
    /// Kept untyped on purpose: required-field rules coerce values the same way
    /// regardless of their JSON type, so the engine inspects the map directly.
    pub type EntryPayload = serde_json::Map<String, serde_json::Value>;

    /// Variant-specific part of an entry, tagged by `tipo`.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "tipo", rename_all = "lowercase")]
    pub enum EntryKindView {
        #[serde(rename_all = "camelCase")]
        Fuel {
            origin: String,
            destination: String,
            start_km: f64,
            end_km: f64,
            km: f64,
        },
        #[serde(rename_all = "camelCase")]
        Expense { amount_to_justify: f64 },
    }

    /// A stored entry as returned by the API.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EntryView {
        pub id: String,
        #[serde(flatten)]
        pub kind: EntryKindView,
        pub claimant_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub expense_date: Option<DateTime<Utc>>,
        pub reason: String,
        pub cost_center: String,
        pub branch: String,
        pub folio: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub notes: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub service_type: Option<String>,
        pub created_by: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryDeleted {
        pub ok: bool,
    }
}
