pub mod claims;
pub mod error;
pub mod identity;
pub mod password;
pub mod role;
pub mod service;

pub use claims::{Claims, SessionToken, TokenSettings};
pub use error::{AuthError, AuthResult};
pub use identity::{Identity, NewIdentity};
pub use role::{Role, RoleCategory, RoleSet, UnknownRole};
pub use service::{authorize, CredentialService, Signup};
