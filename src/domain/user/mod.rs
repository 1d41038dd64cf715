//! User aggregate
//!
//! Contains the User entity, its query/creation DTOs, and the repository interface.

pub mod model;
pub mod repository;

mod dto_create;
mod dto_get;

pub use model::{User, UserRole, UserTag};

pub use dto_create::CreateUserDto;
pub use dto_get::{GetUserDto, UserSortField};

pub use repository::UserRepository;
