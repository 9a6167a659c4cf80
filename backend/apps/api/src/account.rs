//! Account provisioning
//!
//! The dashboard provisions on the first visit after sign-in; the extension
//! may call the endpoint directly. Creates or refreshes the profile row and
//! makes sure a plan row exists without touching an existing one. Safe to
//! call any number of times.

use std::sync::Arc;

use auth::domain::ProfileRepository;
use auth::middleware::RequireUser;
use auth::models::{AuthUser, UserProfile};
use auth::AuthError;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use billing::domain::{PlanRepository, UserPlan};
use billing::models::{Plan, PlanResponse};
use billing::BillingError;
use kernel::error::app_error::AppError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone)]
pub struct AccountState<P, R>
where
    P: ProfileRepository + Clone + Send + Sync + 'static,
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    pub profiles: Arc<P>,
    pub plans: Arc<R>,
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Billing(#[from] BillingError),
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        match self {
            AccountError::Auth(e) => e.into_response(),
            AccountError::Billing(e) => e.into_response(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionResponse {
    pub profile: UserProfile,
    pub plan: PlanResponse,
}

pub async fn provision_account<P, R>(
    profiles: &P,
    plans: &R,
    user: &AuthUser,
    full_name: Option<String>,
) -> Result<ProvisionResponse, AccountError>
where
    P: ProfileRepository + Clone + Send + Sync + 'static,
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    let email = user.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AuthError::InvalidInput("Your account has no email address".to_string()).into());
    }

    let full_name = full_name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| user.full_name().map(str::to_string));

    let profile = profiles
        .upsert(&UserProfile::new(user.id, &email, full_name))
        .await?;

    let plan = plans
        .create_if_missing(&UserPlan::new(&email, Plan::Free).with_user_id(Some(user.id)))
        .await?;

    tracing::info!(user_id = %user.id, plan = %plan.plan, "Account provisioned");

    Ok(ProvisionResponse {
        profile,
        plan: plan.plan.into(),
    })
}

/// Provision only when the profile row is missing
pub async fn ensure_provisioned<P, R>(
    profiles: &P,
    plans: &R,
    user: &AuthUser,
) -> Result<Option<ProvisionResponse>, AccountError>
where
    P: ProfileRepository + Clone + Send + Sync + 'static,
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    if profiles.find_by_id(&user.id).await?.is_some() {
        return Ok(None);
    }
    provision_account(profiles, plans, user, None).await.map(Some)
}

/// POST /api/account/provision
pub async fn provision<P, R>(
    State(state): State<AccountState<P, R>>,
    RequireUser(session): RequireUser,
    body: Bytes,
) -> Result<Json<ProvisionResponse>, AccountError>
where
    P: ProfileRepository + Clone + Send + Sync + 'static,
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    let req: ProvisionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ProvisionRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|_| {
            AuthError::from(AppError::bad_request("Invalid request body"))
        })?
    };

    let response = provision_account(
        state.profiles.as_ref(),
        state.plans.as_ref(),
        &session.user,
        req.full_name,
    )
    .await?;
    Ok(Json(response))
}

/// Routes mounted under `/api`
pub fn account_router<P, R>(state: AccountState<P, R>) -> Router
where
    P: ProfileRepository + Clone + Send + Sync + 'static,
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/account/provision", post(provision::<P, R>))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::infra::InMemoryProfileRepository;
    use billing::infra::InMemoryPlanRepository;
    use kernel::id::UserId;

    fn user(email: &str) -> AuthUser {
        AuthUser {
            id: UserId::new(),
            email: email.to_string(),
            email_confirmed_at: None,
            user_metadata: serde_json::json!({"full_name": "Ada Lovelace"}),
        }
    }

    #[tokio::test]
    async fn test_provision_is_idempotent() {
        let profiles = InMemoryProfileRepository::new();
        let plans = InMemoryPlanRepository::new();
        let user = user("Ada@Example.com");

        let first = provision_account(&profiles, &plans, &user, None).await.unwrap();
        let second = provision_account(&profiles, &plans, &user, None).await.unwrap();

        assert_eq!(first.profile.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(second.plan.plan, "free");
        assert_eq!(profiles.count().await, 1);
        assert_eq!(plans.count().await, 1);
    }

    #[tokio::test]
    async fn test_provision_never_downgrades() {
        let profiles = InMemoryProfileRepository::new();
        let plans = InMemoryPlanRepository::new();
        plans
            .insert(UserPlan::new("ada@example.com", Plan::Founding))
            .await;

        let response = provision_account(&profiles, &plans, &user("ada@example.com"), None)
            .await
            .unwrap();

        assert_eq!(response.plan.plan, "founding");
        assert!(response.plan.is_paid);
    }

    #[tokio::test]
    async fn test_ensure_provisioned_runs_once() {
        let profiles = InMemoryProfileRepository::new();
        let plans = InMemoryPlanRepository::new();
        let user = user("ada@example.com");

        let first = ensure_provisioned(&profiles, &plans, &user).await.unwrap();
        let second = ensure_provisioned(&profiles, &plans, &user).await.unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(profiles.count().await, 1);
        assert_eq!(plans.count().await, 1);
        assert_eq!(plans.write_calls().await, 1);
    }

    #[tokio::test]
    async fn test_explicit_name_wins() {
        let profiles = InMemoryProfileRepository::new();
        let plans = InMemoryPlanRepository::new();

        let response = provision_account(
            &profiles,
            &plans,
            &user("ada@example.com"),
            Some("Countess".to_string()),
        )
        .await
        .unwrap();

        assert_eq!(response.profile.full_name.as_deref(), Some("Countess"));
    }
}
