//! Route Table
//!
//! Structural mapping from paths to pages. Child routes render inside their
//! parent's page, which acts as a layout shell. There are no guards and no
//! data loading: the only navigation decision outside this table is the
//! startup redirect made during bootstrap.
//!
//! ```text
//! /login                    Login
//! /                         Dashboard
//! ├── /file                 Dashboard > File
//! ├── /task                 Dashboard > Task
//! ├── /task/:id             Dashboard > TaskResult
//! ├── /shell                Dashboard > Shell
//! └── /settings             Dashboard > Settings
//! ```
//!
//! Paths with no matching route are rejected; there is no catch-all.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Path of the login page, the target of the startup redirect
pub const LOGIN_PATH: &str = "/login";

/// Pages the router can resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Login,
    Dashboard,
    File,
    Task,
    TaskResult,
    Shell,
    Settings,
}

impl Page {
    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Login => "login",
            Page::Dashboard => "dashboard",
            Page::File => "file",
            Page::Task => "task",
            Page::TaskResult => "task_result",
            Page::Shell => "shell",
            Page::Settings => "settings",
        }
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A route declaration
#[derive(Debug, Clone)]
pub struct RouteDef {
    pub name: &'static str,
    pub path: &'static str,
    pub page: Page,
    pub children: Vec<RouteDef>,
}

impl RouteDef {
    fn leaf(name: &'static str, path: &'static str, page: Page) -> Self {
        Self {
            name,
            path,
            page,
            children: Vec::new(),
        }
    }
}

/// The console's route table
pub fn default_routes() -> Vec<RouteDef> {
    vec![
        RouteDef::leaf("login", LOGIN_PATH, Page::Login),
        RouteDef {
            name: "admin",
            path: "/",
            page: Page::Dashboard,
            children: vec![
                RouteDef::leaf("file", "/file", Page::File),
                RouteDef::leaf("task", "/task", Page::Task),
                RouteDef::leaf("task_result", "/task/:id", Page::TaskResult),
                RouteDef::leaf("shell", "/shell", Page::Shell),
                RouteDef::leaf("settings", "/settings", Page::Settings),
            ],
        },
    ]
}

/// Flattened route: pattern plus the page chain from outermost layout to leaf
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub name: &'static str,
    pub pattern: &'static str,
    pub pages: Vec<Page>,
}

/// A resolved location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    /// Route name, e.g. `task_result`
    pub name: &'static str,
    /// Route pattern, e.g. `/task/:id`
    pub pattern: &'static str,
    /// Normalized path that was resolved
    pub path: String,
    /// Pages to render, outermost layout first
    pub pages: Vec<Page>,
    /// Captured dynamic segments
    pub params: BTreeMap<String, String>,
}

impl RouteMatch {
    /// The innermost page
    pub fn page(&self) -> Page {
        // Every entry has at least its own page
        self.pages.last().copied().unwrap_or(Page::Dashboard)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Routing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("No route matches {0}")]
    NoMatch(String),

    #[error("Unknown route name: {0}")]
    UnknownRoute(String),

    #[error("Route {route} requires parameter {param}")]
    MissingParam { route: String, param: String },
}

/// Path router with navigation history
#[derive(Debug, Clone)]
pub struct Router {
    base: String,
    entries: Vec<RouteEntry>,
    history: Vec<RouteMatch>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(default_routes())
    }
}

impl Router {
    pub fn new(routes: Vec<RouteDef>) -> Self {
        let mut entries = Vec::new();
        flatten(&routes, &[], &mut entries);
        Self {
            base: String::new(),
            entries,
            history: Vec::new(),
        }
    }

    /// Set the base path the application is served under (e.g. `/admin/`)
    pub fn with_base(mut self, base: &str) -> Self {
        self.base = normalize_base(base);
        self
    }

    pub fn base(&self) -> &str {
        if self.base.is_empty() {
            "/"
        } else {
            &self.base
        }
    }

    /// All routes in declaration order, parents before children
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Resolve an application path; query string, fragment and a trailing
    /// slash are ignored
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        let path = normalize_path(path);
        let segments: Vec<&str> = split_segments(&path);

        self.entries.iter().find_map(|entry| {
            match_pattern(entry.pattern, &segments).map(|params| RouteMatch {
                name: entry.name,
                pattern: entry.pattern,
                path: path.clone(),
                pages: entry.pages.clone(),
                params,
            })
        })
    }

    /// Resolve a full location that includes the base path
    pub fn resolve_location(&self, location: &str) -> Option<RouteMatch> {
        self.resolve(self.strip_base(location)?)
    }

    /// Prefix an application path with the base path
    pub fn href(&self, path: &str) -> String {
        let path = normalize_path(path);
        if self.base.is_empty() {
            path
        } else if path == "/" {
            format!("{}/", self.base)
        } else {
            format!("{}{}", self.base, path)
        }
    }

    /// Navigate to a path. Unmatched paths leave the current location as is.
    pub fn push(&mut self, path: &str) -> Result<RouteMatch, RouterError> {
        let matched = self
            .resolve(path)
            .ok_or_else(|| RouterError::NoMatch(path.to_string()))?;

        tracing::debug!(path = %matched.path, page = %matched.page(), "Navigated");
        self.history.push(matched.clone());
        Ok(matched)
    }

    /// Navigate to a named route, filling dynamic segments from `params`
    pub fn push_named(
        &mut self,
        name: &str,
        params: &[(&str, &str)],
    ) -> Result<RouteMatch, RouterError> {
        let path = self.path_for(name, params)?;
        self.push(&path)
    }

    /// Build the path of a named route
    pub fn path_for(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouterError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| RouterError::UnknownRoute(name.to_string()))?;

        let mut path = String::new();
        for segment in split_segments(entry.pattern) {
            path.push('/');
            match segment.strip_prefix(':') {
                Some(param) => {
                    let value = params
                        .iter()
                        .find(|(k, _)| *k == param)
                        .map(|(_, v)| *v)
                        .filter(|v| !v.is_empty())
                        .ok_or_else(|| RouterError::MissingParam {
                            route: name.to_string(),
                            param: param.to_string(),
                        })?;
                    path.push_str(&urlencoding::encode(value));
                }
                None => path.push_str(segment),
            }
        }

        if path.is_empty() {
            path.push('/');
        }
        Ok(path)
    }

    /// Current location, `None` before the first navigation
    pub fn current(&self) -> Option<&RouteMatch> {
        self.history.last()
    }

    /// Return to the previous location; the first location is never popped
    pub fn back(&mut self) -> Option<&RouteMatch> {
        if self.history.len() > 1 {
            self.history.pop();
        }
        self.history.last()
    }

    pub fn history(&self) -> &[RouteMatch] {
        &self.history
    }

    fn strip_base<'a>(&self, location: &'a str) -> Option<&'a str> {
        if self.base.is_empty() {
            return Some(location);
        }
        let rest = location.strip_prefix(self.base.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with(['/', '?', '#']) {
            Some(rest)
        } else {
            None
        }
    }
}

fn flatten(routes: &[RouteDef], parents: &[Page], out: &mut Vec<RouteEntry>) {
    for route in routes {
        let mut pages = parents.to_vec();
        pages.push(route.page);
        out.push(RouteEntry {
            name: route.name,
            pattern: route.path,
            pages: pages.clone(),
        });
        flatten(&route.children, &pages, out);
    }
}

/// `/admin/` → `/admin`, `/` → ``
fn normalize_base(base: &str) -> String {
    let trimmed = base.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Drop query and fragment, collapse to a leading-slash path without a
/// trailing slash
fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let segments = split_segments(path);
    format!("/{}", segments.join("/"))
}

fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn match_pattern(pattern: &str, segments: &[&str]) -> Option<BTreeMap<String, String>> {
    let pattern_segments = split_segments(pattern);
    if pattern_segments.len() != segments.len() {
        return None;
    }

    let mut params = BTreeMap::new();
    for (expected, actual) in pattern_segments.iter().zip(segments) {
        match expected.strip_prefix(':') {
            Some(name) => {
                let value = urlencoding::decode(actual)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| actual.to_string());
                params.insert(name.to_string(), value);
            }
            None if expected == actual => {}
            None => return None,
        }
    }
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_routes() {
        let router = Router::default();

        let cases = [
            ("/login", "login", vec![Page::Login]),
            ("/", "admin", vec![Page::Dashboard]),
            ("/file", "file", vec![Page::Dashboard, Page::File]),
            ("/task", "task", vec![Page::Dashboard, Page::Task]),
            ("/shell", "shell", vec![Page::Dashboard, Page::Shell]),
            ("/settings", "settings", vec![Page::Dashboard, Page::Settings]),
        ];

        for (path, name, pages) in cases {
            let matched = router.resolve(path).unwrap();
            assert_eq!(matched.name, name, "path {}", path);
            assert_eq!(matched.pages, pages, "path {}", path);
            assert!(matched.params.is_empty());
        }
    }

    #[test]
    fn test_dynamic_segment() {
        let router = Router::default();
        let matched = router.resolve("/task/42").unwrap();

        assert_eq!(matched.name, "task_result");
        assert_eq!(matched.pattern, "/task/:id");
        assert_eq!(matched.page(), Page::TaskResult);
        assert_eq!(matched.pages, vec![Page::Dashboard, Page::TaskResult]);
        assert_eq!(matched.param("id"), Some("42"));
    }

    #[test]
    fn test_param_is_decoded() {
        let router = Router::default();
        let matched = router.resolve("/task/job%201").unwrap();
        assert_eq!(matched.param("id"), Some("job 1"));
    }

    #[test]
    fn test_normalization() {
        let router = Router::default();
        assert_eq!(router.resolve("/file/").unwrap().name, "file");
        assert_eq!(router.resolve("/task/7?tab=log#end").unwrap().param("id"), Some("7"));
        assert_eq!(router.resolve("").unwrap().name, "admin");
        assert_eq!(router.resolve("?x=1").unwrap().path, "/");
    }

    #[test]
    fn test_unmatched_paths() {
        let router = Router::default();
        for path in ["/nope", "/task/1/2", "/files", "/login/extra"] {
            assert!(router.resolve(path).is_none(), "path {}", path);
        }
    }

    #[test]
    fn test_push_and_history() {
        let mut router = Router::default();
        assert!(router.current().is_none());

        router.push("/").unwrap();
        router.push("/task").unwrap();
        router.push("/task/9").unwrap();
        assert_eq!(router.current().unwrap().param("id"), Some("9"));
        assert_eq!(router.history().len(), 3);

        assert_eq!(router.back().unwrap().name, "task");
        assert_eq!(router.back().unwrap().name, "admin");
        assert_eq!(router.back().unwrap().name, "admin");
    }

    #[test]
    fn test_push_unmatched_keeps_location() {
        let mut router = Router::default();
        router.push("/shell").unwrap();

        let err = router.push("/missing").unwrap_err();
        assert_eq!(err, RouterError::NoMatch("/missing".to_string()));
        assert_eq!(router.current().unwrap().name, "shell");
        assert_eq!(router.history().len(), 1);
    }

    #[test]
    fn test_named_routes() {
        let mut router = Router::default();

        assert_eq!(router.path_for("admin", &[]).unwrap(), "/");
        assert_eq!(router.path_for("task_result", &[("id", "a/b")]).unwrap(), "/task/a%2Fb");

        let matched = router.push_named("task_result", &[("id", "17")]).unwrap();
        assert_eq!(matched.path, "/task/17");

        assert_eq!(
            router.path_for("task_result", &[]),
            Err(RouterError::MissingParam {
                route: "task_result".to_string(),
                param: "id".to_string(),
            })
        );
        assert_eq!(
            router.push_named("reports", &[]),
            Err(RouterError::UnknownRoute("reports".to_string()))
        );
    }

    #[test]
    fn test_base_path() {
        let router = Router::default().with_base("/admin/");
        assert_eq!(router.base(), "/admin");
        assert_eq!(router.href("/task/3"), "/admin/task/3");
        assert_eq!(router.href("/"), "/admin/");

        assert_eq!(router.resolve_location("/admin/file").unwrap().name, "file");
        assert_eq!(router.resolve_location("/admin").unwrap().name, "admin");
        assert_eq!(router.resolve_location("/admin?x=1").unwrap().name, "admin");
        assert!(router.resolve_location("/administrator").is_none());
        assert!(router.resolve_location("/file").is_none());

        let root = Router::default().with_base("/");
        assert_eq!(root.base(), "/");
        assert_eq!(root.href("file"), "/file");
        assert_eq!(root.resolve_location("/file").unwrap().name, "file");
    }

    #[test]
    fn test_entries_order() {
        let router = Router::default();
        let names: Vec<&str> = router.entries().iter().map(|e| e.name).collect();
        assert_eq!(
            names,
            vec!["login", "admin", "file", "task", "task_result", "shell", "settings"]
        );
    }
}
