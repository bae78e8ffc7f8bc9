//! Domain core of Viatic.
//!
//! - [`validation`] decides whether an entry payload is well formed and builds
//!   the variant-typed [`Entry`] out of it. It is pure and never touches the
//!   database.
//! - [`identity`] turns a bearer credential into an [`Identity`].
//! - [`Engine`] is the persistence side: ownership-scoped entry storage and
//!   the user store.
pub use entry::{Entry, EntryDetails, EntryKind, ExpenseClaim, FuelTrip, NewEntry, ServiceType};
pub use error::EngineError;
pub use identity::{
    Claims, Identity, IdentityError, IdentityVerifier, JwtIdentity, TokenIssuer,
};
pub use ops::{ENTRY_LIST_LIMIT, Engine, EngineBuilder};
pub use users::{User, UserChanges};
pub use validation::{Rejection, validate_create, validate_update};

mod entry;
mod error;
pub mod identity;
mod ops;
mod password;
mod users;
mod util;
pub mod validation;

type ResultEngine<T> = Result<T, EngineError>;
