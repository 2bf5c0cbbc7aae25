pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod policy;

pub use claims::{Claims, UserRole};
pub use jwt::JwtService;
pub use middleware::{AuthMiddleware, AuthenticatedUser};
pub use policy::AccessPolicy;
