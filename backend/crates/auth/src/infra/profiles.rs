//! Profile repository backed by the `profiles` table over PostgREST

use platform::postgrest::{OnConflict, PostgrestClient};

use crate::domain::entity::profile::UserProfile;
use crate::domain::repository::ProfileRepository;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

const TABLE: &str = "profiles";

#[derive(Debug, Clone)]
pub struct SupabaseProfileRepository {
    client: PostgrestClient,
}

impl SupabaseProfileRepository {
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

impl ProfileRepository for SupabaseProfileRepository {
    async fn upsert(&self, profile: &UserProfile) -> AuthResult<UserProfile> {
        self.client
            .upsert(TABLE, "id", OnConflict::Merge, profile)
            .await?
            .ok_or_else(|| AuthError::Internal("profile upsert returned no row".to_string()))
    }

    async fn find_by_id(&self, id: &UserId) -> AuthResult<Option<UserProfile>> {
        let id = id.to_string();
        Ok(self.client.select_one(TABLE, &[("id", id.as_str())]).await?)
    }
}
