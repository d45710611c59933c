//! Domain models for the Kiosky API.
//!
//! These are validated domain types. Database row types live next to the
//! queries in `db::postgres` and are converted into these on the way out.

pub mod category;
pub mod product;
pub mod store;
pub mod user;

pub use category::{Category, CategoryFields};
pub use product::{Product, ProductFields};
pub use store::{Store, StoreFields};
pub use user::{NewUser, UserChanges, UserRecord};
