//! Authenticated session context and role-gated routing.
//!
//! A [`Session`] is an owned value handed to whatever needs it; there is no
//! process-wide store. Route resolution depends only on the session's
//! authentication state and role.

use crate::error::AqmapError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Account role as sent by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Driver,
}

impl Role {
    /// Parse a wire role. Anything that is not `user` or `driver` is
    /// treated as an admin.
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Role::User,
            "driver" => Role::Driver,
            _ => Role::Admin,
        }
    }
}

/// Profile returned on login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub email: String,
    pub username: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, rename = "comAssociate", skip_serializing_if = "Option::is_none")]
    pub com_associate: Option<String>,
}

/// Pages reachable through the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Login,
    SignUp,
    MakeRequest,
    UserHome,
    AiAssistant,
    AdminHome,
    AdminDrivers,
    AdminDashboard,
    Messages,
}

impl Page {
    pub fn path(&self) -> &'static str {
        match self {
            Page::Login => "/",
            Page::SignUp => "/signup",
            Page::MakeRequest => "/makerequest",
            Page::UserHome => "/userhome",
            Page::AiAssistant => "/aiPage",
            Page::AdminHome => "/admin",
            Page::AdminDrivers => "/admindriver",
            Page::AdminDashboard => "/admindash",
            Page::Messages => "/message",
        }
    }
}

/// What the router should do with a requested path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Render(Page),
    /// Replace the location with this path.
    Redirect(&'static str),
}

const ANONYMOUS_PAGES: &[Page] = &[Page::Login, Page::SignUp];
const USER_PAGES: &[Page] = &[Page::MakeRequest, Page::UserHome, Page::AiAssistant];
const ADMIN_PAGES: &[Page] = &[
    Page::AdminHome,
    Page::AdminDrivers,
    Page::AdminDashboard,
    Page::Messages,
];

/// Authentication state for one client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    token: Option<String>,
    user: Option<UserInfo>,
}

impl Session {
    /// A session with nobody logged in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Record a successful login.
    pub fn login(&mut self, token: impl Into<String>, user: UserInfo) -> Result<(), AqmapError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(AqmapError::validation("session token must not be empty"));
        }

        info!("Logged in as {} ({:?})", user.username, user.role);
        self.token = Some(token);
        self.user = Some(user);
        Ok(())
    }

    /// Forget the token and profile.
    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!("Logged out {}", user.username);
        }
        self.token = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    /// Resolve `path` against the route table for the current role.
    pub fn resolve(&self, path: &str) -> RouteDecision {
        let (pages, fallback) = match self.role().filter(|_| self.is_authenticated()) {
            None => (ANONYMOUS_PAGES, Page::Login),
            Some(Role::User) => (USER_PAGES, Page::UserHome),
            Some(Role::Admin | Role::Driver) => (ADMIN_PAGES, Page::AdminHome),
        };

        match pages.iter().find(|page| page.path() == path) {
            Some(page) => RouteDecision::Render(*page),
            None => {
                debug!("Redirecting {} to {}", path, fallback.path());
                RouteDecision::Redirect(fallback.path())
            }
        }
    }
}
