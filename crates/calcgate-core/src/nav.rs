//! Application routes.
//!
//! A `Route` names one view of the client. Only `Home` is protected; every
//! navigation to it goes through the `RouteGuard`.

/// Views reachable in the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Home,
    Unauthorized,
    NotFound,
}

impl Route {
    /// Parse a path into a route. Unknown paths map to `NotFound`.
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim();
        let normalized = if trimmed.len() > 1 {
            trimmed.trim_end_matches('/')
        } else {
            trimmed
        };

        match normalized {
            "" | "/" => Route::Login,
            "/register" => Route::Register,
            "/home" => Route::Home,
            "/error" => Route::Unauthorized,
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Register => "/register",
            Route::Home => "/home",
            Route::Unauthorized => "/error",
            // Any path not matched above lands here; this is just the canonical one
            Route::NotFound => "/not-found",
        }
    }

    /// Whether the route may only render for an authorized session
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Home)
    }

    /// Get the display title for this route.
    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Sign in",
            Route::Register => "Sign up",
            Route::Home => "Calculator",
            Route::Unauthorized => "Unauthorized",
            Route::NotFound => "Page not found",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_known_routes() {
        assert_eq!(Route::from_path("/"), Route::Login);
        assert_eq!(Route::from_path(""), Route::Login);
        assert_eq!(Route::from_path("/register"), Route::Register);
        assert_eq!(Route::from_path("/home"), Route::Home);
        assert_eq!(Route::from_path("/home/"), Route::Home);
        assert_eq!(Route::from_path("/error"), Route::Unauthorized);
    }

    #[test]
    fn test_from_path_unknown_is_not_found() {
        assert_eq!(Route::from_path("/settings"), Route::NotFound);
        assert_eq!(Route::from_path("home"), Route::NotFound);
        assert_eq!(Route::from_path("/home/extra"), Route::NotFound);
    }

    #[test]
    fn test_path_round_trips_for_named_routes() {
        for route in [Route::Login, Route::Register, Route::Home, Route::Unauthorized] {
            assert_eq!(Route::from_path(route.path()), route);
        }
    }

    #[test]
    fn test_only_home_is_protected() {
        assert!(Route::Home.is_protected());
        assert!(!Route::Login.is_protected());
        assert!(!Route::Register.is_protected());
        assert!(!Route::Unauthorized.is_protected());
        assert!(!Route::NotFound.is_protected());
    }
}
