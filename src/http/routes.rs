use axum::Router;
use crate::app::AppContext;

/// Trait for composable route modules
///
/// Each module returns a router that still needs [`AppContext`] state; the
/// [`App`](crate::App) supplies it when the modules are merged.
///
/// # Example
///
/// ```ignore
/// struct StatusModule;
///
/// impl RouteModule for StatusModule {
///     fn routes(&self) -> Router<AppContext> {
///         Router::new().route("/status", get(status))
///     }
/// }
/// ```
pub trait RouteModule {
    fn routes(&self) -> Router<AppContext>;

    /// Optional: path prefix for all routes in this module
    fn prefix(&self) -> Option<&str> {
        None
    }

    /// Merge (or nest, when a prefix is set) this module into `router`
    fn register(self, router: Router<AppContext>) -> Router<AppContext>
    where
        Self: Sized,
    {
        let routes = self.routes();

        match self.prefix() {
            Some(prefix) => router.nest(prefix, routes),
            None => router.merge(routes),
        }
    }
}
