//! # Router and Dispatcher
//!
//! Segment-based route table with positional variables, plus the dispatch
//! sequence applied to every request.
//!
//! ## Lifecycle
//!
//! Routes are registered on a mutable [`Router`] during startup. Calling
//! [`Router::seal`] turns it into an immutable, cheaply clonable
//! [`Dispatcher`] that can be shared across worker tasks; there is no way to
//! register a route on a `Dispatcher`.
//!
//! ## Matching
//!
//! The inbound path is split on `/` with empty segments dropped. Only routes
//! of the same kind and segment count are candidates, and every literal
//! segment must match positionally. When several candidates match, the one
//! with a literal at the leftmost position where they differ wins, so
//! `/notes/all` beats `/notes/:id` regardless of registration order.
//!
//! ## Dispatch
//!
//! 1. no route: `ResourceNotFound`
//! 2. private route without bearer token: `AuthenticationRequired`
//! 3. contract errors: `InvalidData` with the errors under `"errors"`
//! 4. otherwise the handler runs and its error is returned untouched
//!
//! A payload that passed a contract reaches the handler with lowercased
//! keys, the same view the contract validated.

use crate::contract::Contract;
use crate::error::HandlerResult;
use crate::request::{Request, RequestKind, Response, Status};
use crate::route::{split_path, RouteInfo};
use crate::validation::ERRORS_KEY;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Request handler
pub type Handler = Arc<dyn Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync>;

/// A registered route: metadata, handler and optional contract
#[derive(Clone)]
pub struct Route {
    /// Template metadata
    pub info: RouteInfo,
    handler: Handler,
    contract: Option<Arc<Contract>>,
}

impl Route {
    /// Payload contract, if any
    #[must_use]
    pub fn contract(&self) -> Option<&Contract> {
        self.contract.as_deref()
    }

    /// Run the handler
    ///
    /// # Errors
    ///
    /// Returns whatever the handler returns
    pub fn invoke(&self, request: &mut Request, response: &mut Response) -> HandlerResult {
        (self.handler)(request, response)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("info", &self.info)
            .field("has_contract", &self.contract.is_some())
            .finish_non_exhaustive()
    }
}

/// Per-kind route storage
#[derive(Clone, Default)]
struct RouteTable {
    by_kind: HashMap<RequestKind, Vec<Route>>,
}

impl RouteTable {
    fn insert(&mut self, route: Route) -> bool {
        let routes = self.by_kind.entry(route.info.kind).or_default();
        if let Some(existing) = routes.iter().find(|r| r.info.collides_with(&route.info)) {
            error!(
                route = %route.info,
                existing = %existing.info.template,
                "Route already exists, registration dropped"
            );
            return false;
        }
        routes.push(route);
        true
    }

    fn find(&self, kind: RequestKind, path: &str) -> Option<&Route> {
        let parts = split_path(path);
        self.by_kind
            .get(&kind)?
            .iter()
            .filter(|route| route.info.matches(&parts))
            .max_by_key(|route| route.info.specificity())
    }

    fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }
}

/// Mutable route registry used during startup
#[derive(Clone, Default)]
pub struct Router {
    table: RouteTable,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("routes", &self.len()).finish()
    }
}

impl Router {
    /// Create a new empty router
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route
    ///
    /// A route colliding with an existing one (same kind, same literal
    /// segments, variables in the same positions) is logged and dropped.
    ///
    /// # Returns
    ///
    /// `true` if the route was inserted
    pub fn add_route<H>(
        &mut self,
        kind: RequestKind,
        template: &str,
        is_public: bool,
        handler: H,
        contract: Option<Contract>,
    ) -> bool
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        debug!(kind = %kind, template = %template, "Adding route");

        let info = RouteInfo::new(kind, template, is_public);
        debug!(segments = ?info.segments, "Route segments");

        let route = Route {
            info,
            handler: Arc::new(handler),
            contract: contract.map(Arc::new),
        };
        let route_name = route.info.to_string();

        let inserted = self.table.insert(route);
        if inserted {
            info!(route = %route_name, public = is_public, "Route added");
        }
        inserted
    }

    /// Register a public pull route
    pub fn public_pull<H>(&mut self, path: &str, handler: H, contract: Option<Contract>) -> bool
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_route(RequestKind::Pull, path, true, handler, contract)
    }

    /// Register a public push route
    pub fn public_push<H>(&mut self, path: &str, handler: H, contract: Option<Contract>) -> bool
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_route(RequestKind::Push, path, true, handler, contract)
    }

    /// Register a public update route
    pub fn public_update<H>(&mut self, path: &str, handler: H, contract: Option<Contract>) -> bool
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_route(RequestKind::Update, path, true, handler, contract)
    }

    /// Register a public delete route
    pub fn public_delete<H>(&mut self, path: &str, handler: H, contract: Option<Contract>) -> bool
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_route(RequestKind::Delete, path, true, handler, contract)
    }

    /// Register a private pull route
    pub fn private_pull<H>(&mut self, path: &str, handler: H, contract: Option<Contract>) -> bool
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_route(RequestKind::Pull, path, false, handler, contract)
    }

    /// Register a private push route
    pub fn private_push<H>(&mut self, path: &str, handler: H, contract: Option<Contract>) -> bool
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_route(RequestKind::Push, path, false, handler, contract)
    }

    /// Register a private update route
    pub fn private_update<H>(&mut self, path: &str, handler: H, contract: Option<Contract>) -> bool
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_route(RequestKind::Update, path, false, handler, contract)
    }

    /// Register a private delete route
    pub fn private_delete<H>(&mut self, path: &str, handler: H, contract: Option<Contract>) -> bool
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_route(RequestKind::Delete, path, false, handler, contract)
    }

    /// Match a request against registered routes
    #[must_use]
    pub fn find(&self, kind: RequestKind, path: &str) -> Option<&Route> {
        self.table.find(kind, path)
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True when no route is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freeze the route table
    #[must_use]
    pub fn seal(self) -> Dispatcher {
        info!(routes = self.len(), "Route table sealed");
        Dispatcher {
            table: Arc::new(self.table),
        }
    }
}

/// Immutable route table plus the dispatch sequence
#[derive(Clone)]
pub struct Dispatcher {
    table: Arc<RouteTable>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.len())
            .finish()
    }
}

impl Dispatcher {
    /// Match a request against the sealed routes
    #[must_use]
    pub fn find(&self, kind: RequestKind, path: &str) -> Option<&Route> {
        self.table.find(kind, path)
    }

    /// Number of routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True when no route is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Route, gate, validate and handle one request
    ///
    /// Routing misses, missing tokens and contract failures only set the
    /// response status.
    ///
    /// # Errors
    ///
    /// Returns the handler's error unchanged; the response is left as the
    /// handler last set it.
    pub fn handle(&self, request: &mut Request, response: &mut Response) -> HandlerResult {
        info!(
            request_id = %request.id,
            kind = %request.kind,
            path = %request.path,
            "Request received"
        );

        let Some(route) = self.find(request.kind, &request.path) else {
            debug!(request_id = %request.id, "No route found");
            response.status = Status::ResourceNotFound;
            return Ok(());
        };

        debug!(request_id = %request.id, route = %route.info, "Route found");
        request.route_data = route.info.extract_route_data(&request.path);

        if !route.info.is_public && request.token().is_none() {
            debug!(
                request_id = %request.id,
                "Route is private and no authorization token was specified"
            );
            response.status = Status::AuthenticationRequired;
            return Ok(());
        }

        if let Some(contract) = route.contract() {
            let errors = contract.validate(&request.payload);
            if !errors.is_empty() {
                debug!(
                    request_id = %request.id,
                    errors = %errors.to_json(),
                    "Payload has contract validation errors"
                );
                response.status = Status::InvalidData;
                response.payload.set(ERRORS_KEY, errors.to_value());
                return Ok(());
            }
            request.payload = request.payload.lowercase_keys();
        }

        debug!(request_id = %request.id, "Handling request");
        route.invoke(request, response)
    }
}
