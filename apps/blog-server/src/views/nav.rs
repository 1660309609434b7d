//! Navigation bar.

use blogify_core::routing::Route;
use serde::Serialize;

/// A navigation entry. `method` is `POST` for actions such as logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
    pub method: &'static str,
    pub active: bool,
}

impl NavLink {
    fn page(label: &'static str, route: Route, current: Option<Route>) -> Self {
        Self {
            label,
            href: route.path(),
            method: "GET",
            active: current == Some(route),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Navbar {
    pub brand: &'static str,
    pub links: Vec<NavLink>,
}

impl Navbar {
    pub fn new(current: Option<Route>, signed_in: bool) -> Self {
        let mut links = vec![NavLink::page("Home", Route::Home, current)];
        if signed_in {
            links.push(NavLink::page("Blog Feed", Route::BlogFeed, current));
            links.push(NavLink::page("Dashboard", Route::Dashboard, current));
            links.push(NavLink {
                label: "Logout",
                href: "/api/auth/logout",
                method: "POST",
                active: false,
            });
        } else {
            links.push(NavLink::page("Login", Route::Login, current));
            links.push(NavLink::page("Sign Up", Route::Signup, current));
        }

        Self {
            brand: "Blogify ✍️",
            links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(navbar: &Navbar) -> Vec<&'static str> {
        navbar.links.iter().map(|link| link.label).collect()
    }

    #[test]
    fn test_signed_in_links() {
        let navbar = Navbar::new(Some(Route::BlogFeed), true);

        assert_eq!(labels(&navbar), ["Home", "Blog Feed", "Dashboard", "Logout"]);
        let active: Vec<_> = navbar.links.iter().filter(|l| l.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].href, "/blog-feed");
    }

    #[test]
    fn test_signed_out_links() {
        let navbar = Navbar::new(Some(Route::Login), false);
        assert_eq!(labels(&navbar), ["Home", "Login", "Sign Up"]);
    }
}
