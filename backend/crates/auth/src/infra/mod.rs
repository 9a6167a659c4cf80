//! Infrastructure Layer
//!
//! Identity provider and profile table clients, plus in-memory
//! implementations of both ports for tests and local runs.

pub mod memory;
pub mod profiles;
pub mod supabase;

pub use memory::{InMemoryIdentityProvider, InMemoryProfileRepository};
pub use profiles::SupabaseProfileRepository;
pub use supabase::SupabaseAuthClient;
