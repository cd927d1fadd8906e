pub mod api_key;
pub mod home;
pub mod location;
pub mod user;

pub use api_key::ApiKey;
pub use home::{Home, HomeMember, HomeRole, UnknownRole};
pub use location::{Item, Location};
pub use user::User;
