use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{CredentialService, Role, RoleSet, TokenSettings};
use crate::config::AppConfig;
use crate::database::{IdentityStore, MemoryStore, RecordStore};
use crate::filter::QueryShaper;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{require_session, restrict_to};
use crate::services::{AppointmentNotifier, LogNotifier};

const PATIENT_ONLY: RoleSet = RoleSet::of(&[Role::Patient]);
const BOOKING: RoleSet = RoleSet::of(&[Role::Patient, Role::Admin]);
const CLINICAL: RoleSet = RoleSet::of(&[Role::Doctor, Role::Admin]);
const MAINTENANCE: RoleSet = RoleSet::of(&[Role::Technician, Role::Admin]);
const ADMIN_ONLY: RoleSet = RoleSet::of(&[Role::Admin]);

/// Everything a handler needs, cloned per request
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialService>,
    pub records: Arc<dyn RecordStore>,
    pub shaper: QueryShaper,
    pub notifier: Arc<dyn AppointmentNotifier>,
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(identities: Arc<dyn IdentityStore>, records: Arc<dyn RecordStore>, config: &AppConfig) -> Self {
        Self {
            credentials: Arc::new(CredentialService::new(
                identities,
                TokenSettings::from_config(&config.security),
            )),
            records,
            shaper: QueryShaper::from_config(&config.query),
            notifier: Arc::new(LogNotifier),
            cookie_secure: config.security.cookie_secure,
        }
    }

    /// State backed by a single process-local store
    pub fn in_memory(config: &AppConfig) -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (Self::new(store.clone(), store.clone(), config), store)
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn AppointmentNotifier>) -> Self {
        self.notifier = notifier;
        self
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/login", post(public::auth::login_post))
        .route("/signup", post(public::auth::signup_post))
        // Session required
        .merge(session_routes(state.clone()))
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn session_routes(state: AppState) -> Router<AppState> {
    // Same path, different gates per method
    let devices = get(protected::records::devices_list)
        .route_layer(middleware::from_fn_with_state(MAINTENANCE, restrict_to))
        .merge(post(elevated::devices::device_create).route_layer(middleware::from_fn_with_state(ADMIN_ONLY, restrict_to)));

    Router::new()
        .route("/home", get(protected::account::home_get))
        .route("/password", post(protected::account::password_post))
        .merge(gated(Router::new().route("/contact", post(protected::contact::contact_post)), PATIENT_ONLY))
        .merge(gated(
            Router::new().route("/appointments", post(protected::appointments::appointment_post)),
            BOOKING,
        ))
        .merge(gated(Router::new().route("/patients", get(protected::records::patients_list)), CLINICAL))
        .route("/devices", devices)
        .merge(gated(
            Router::new()
                .route("/doctors", get(elevated::staff::doctors_list))
                .route("/technicians", get(elevated::staff::technicians_list))
                .route("/complaints", get(elevated::complaints::complaints_list)),
            ADMIN_ONLY,
        ))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}

fn gated(routes: Router<AppState>, allowed: RoleSet) -> Router<AppState> {
    routes.route_layer(middleware::from_fn_with_state(allowed, restrict_to))
}
