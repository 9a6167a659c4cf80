//! Application state and dependency wiring
//!
//! `AppState` owns one handle per port. Production wires the hosted
//! providers; tests wire the in-memory implementations.

use std::sync::Arc;
use std::time::Duration;

use auth::AuthConfig;
use auth::domain::{IdentityProvider, ProfileRepository};
use auth::infra::{SupabaseAuthClient, SupabaseProfileRepository};
use auth::presentation::AuthAppState;
use billing::BillingConfig;
use billing::domain::{PaymentGateway, PlanRepository};
use billing::infra::{StripeCheckoutClient, SupabasePlanRepository};
use billing::presentation::BillingAppState;
use platform::http::build_http_client;
use platform::postgrest::PostgrestClient;

use crate::account::AccountState;
use crate::config::AppConfig;
use crate::diagnostics::DiagnosticsState;
use crate::pages::PagesState;

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AppState<I, P, R, G>
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
    P: ProfileRepository + Clone + Send + Sync + 'static,
    R: PlanRepository + Clone + Send + Sync + 'static,
    G: PaymentGateway + Clone + Send + Sync + 'static,
{
    pub identity: Arc<I>,
    pub profiles: Arc<P>,
    pub plans: Arc<R>,
    pub payments: Arc<G>,
    pub config: Arc<AppConfig>,
    pub auth_config: Arc<AuthConfig>,
    pub billing_config: Arc<BillingConfig>,
}

/// State backed by the hosted identity provider and Stripe
pub type LiveAppState = AppState<
    SupabaseAuthClient,
    SupabaseProfileRepository,
    SupabasePlanRepository,
    StripeCheckoutClient,
>;

impl<I, P, R, G> AppState<I, P, R, G>
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
    P: ProfileRepository + Clone + Send + Sync + 'static,
    R: PlanRepository + Clone + Send + Sync + 'static,
    G: PaymentGateway + Clone + Send + Sync + 'static,
{
    pub fn new(config: AppConfig, identity: I, profiles: P, plans: R, payments: G) -> Self {
        Self::with_configs(
            config.auth_config(),
            config.billing_config(),
            config,
            identity,
            profiles,
            plans,
            payments,
        )
    }

    /// Explicit crate configs, e.g. a tighter retry policy in tests
    pub fn with_configs(
        auth_config: AuthConfig,
        billing_config: BillingConfig,
        config: AppConfig,
        identity: I,
        profiles: P,
        plans: R,
        payments: G,
    ) -> Self {
        Self {
            identity: Arc::new(identity),
            profiles: Arc::new(profiles),
            plans: Arc::new(plans),
            payments: Arc::new(payments),
            config: Arc::new(config),
            auth_config: Arc::new(auth_config),
            billing_config: Arc::new(billing_config),
        }
    }

    pub fn auth_state(&self) -> AuthAppState<I> {
        AuthAppState::new(self.identity.clone(), self.auth_config.clone())
    }

    pub fn billing_state(&self) -> BillingAppState<R, G> {
        BillingAppState::new(
            self.plans.clone(),
            self.payments.clone(),
            self.billing_config.clone(),
        )
    }

    pub fn pages_state(&self) -> PagesState<P, R> {
        PagesState {
            profiles: self.profiles.clone(),
            plans: self.plans.clone(),
            config: self.config.clone(),
        }
    }

    pub fn account_state(&self) -> AccountState<P, R> {
        AccountState {
            profiles: self.profiles.clone(),
            plans: self.plans.clone(),
        }
    }

    pub fn diagnostics_state(&self) -> DiagnosticsState {
        DiagnosticsState {
            config: self.config.clone(),
            auth_config: self.auth_config.clone(),
        }
    }
}

impl LiveAppState {
    /// Build the provider clients. No network traffic happens here.
    pub fn connect(config: AppConfig) -> Result<Self, reqwest::Error> {
        let http = build_http_client(PROVIDER_TIMEOUT)?;

        let identity = SupabaseAuthClient::new(
            http.clone(),
            &config.supabase_url,
            config.supabase_anon_key.clone(),
        );
        let tables = PostgrestClient::new(
            http.clone(),
            &config.supabase_url,
            config.supabase_service_role_key.clone(),
        );
        let billing_config = config.billing_config();
        let payments = StripeCheckoutClient::new(http, &billing_config);

        Ok(Self::with_configs(
            config.auth_config(),
            billing_config,
            config,
            identity,
            SupabaseProfileRepository::new(tables.clone()),
            SupabasePlanRepository::new(tables),
            payments,
        ))
    }
}
