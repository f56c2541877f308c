//! CFRoute admission.
//!
//! A route is identified by host, domain and path across the whole
//! installation, so its name is registered in the root namespace.

use std::cell::Cell;
use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use kube::ResourceExt;
use tracing::error;

use crate::coordination::RequestContext;
use crate::crd::{CFDomain, CFRoute};
use crate::webhooks::duplicate::{NameValidator, UniqueResource};
use crate::webhooks::error::ValidationError;
use crate::webhooks::lookup::ResourceLookup;
use crate::webhooks::validator::{AdmissionValidator, ensure_unchanged, is_being_deleted, owner_of};

pub const ROUTE_ENTITY_TYPE: &str = "cfroute";

pub const ROUTE_DESTINATION_NOT_IN_SPACE_ERROR: &str = "RouteDestinationNotInSpaceError";
pub const ROUTE_DESTINATION_NOT_IN_SPACE_MESSAGE: &str = "Route destination app not found in space";
pub const ROUTE_HOST_NAME_VALIDATION_ERROR: &str = "RouteHostNameValidationError";
pub const ROUTE_PATH_VALIDATION_ERROR: &str = "RoutePathValidationError";
pub const ROUTE_SUBDOMAIN_VALIDATION_ERROR: &str = "RouteSubdomainValidationError";

const DNS1123_LABEL_MAX_LENGTH: usize = 63;
const DNS1123_SUBDOMAIN_MAX_LENGTH: usize = 253;
const MAX_PATH_LENGTH: usize = 128;

const INVALID_URI_ERROR: &str = "Invalid Route URI";
const PATH_IS_SLASH_ERROR: &str = "Path cannot be a single slash";
const PATH_HAS_QUESTION_MARK_ERROR: &str = "Path cannot contain a question mark";
const PATH_LENGTH_EXCEEDED_ERROR: &str = "Path cannot exceed 128 characters";

/// Name registered for a route: `lower(host)::domainNamespace::domainName::path`.
pub fn unique_route_name(route: &CFRoute) -> String {
    [
        route.spec.host.to_lowercase().as_str(),
        route.spec.domain_ref.namespace.as_str(),
        route.spec.domain_ref.name.as_str(),
        route.spec.path.as_str(),
    ]
    .join("::")
}

/// A route as seen by the name registry.
pub struct UniqueRoute<'a> {
    route: &'a CFRoute,
    root_namespace: &'a str,
    domain_name: &'a str,
}

impl<'a> UniqueRoute<'a> {
    pub fn new(route: &'a CFRoute, root_namespace: &'a str, domain_name: &'a str) -> Self {
        Self {
            route,
            root_namespace,
            domain_name,
        }
    }
}

impl UniqueResource for UniqueRoute<'_> {
    fn unique_scope_and_name(&self) -> (String, String) {
        (self.root_namespace.to_string(), unique_route_name(self.route))
    }

    fn unique_validation_error_message(&self) -> String {
        let path_details = if self.route.spec.path.is_empty() {
            String::new()
        } else {
            format!(" and path '{}'", self.route.spec.path)
        };
        format!(
            "Route already exists with host '{}'{} for domain '{}'.",
            self.route.spec.host, path_details, self.domain_name
        )
    }

    fn owner_namespace(&self) -> String {
        owner_of(self.route).0
    }

    fn owner_name(&self) -> String {
        owner_of(self.route).1
    }

    fn is_being_deleted(&self) -> bool {
        is_being_deleted(self.route)
    }
}

/// Problems with `host` as a DNS-1123 label, empty when valid or `*`.
pub fn host_errors(host: &str) -> Vec<String> {
    static LABEL_RE: LazyLock<Option<regex::Regex>> =
        LazyLock::new(|| regex::Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").ok());

    if host == "*" {
        return Vec::new();
    }

    let mut errors = Vec::new();
    if host.len() > DNS1123_LABEL_MAX_LENGTH {
        errors.push(format!(
            "must be no more than {} characters",
            DNS1123_LABEL_MAX_LENGTH
        ));
    }
    if !LABEL_RE.as_ref().is_some_and(|re| re.is_match(host)) {
        errors.push(
            "a lowercase RFC 1123 label must consist of lower case alphanumeric characters or '-', \
             and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    errors
}

/// Check that `<host>.<domain>` is a usable fully qualified domain name.
pub fn validate_fqdn(host: &str, domain: &str) -> Result<(), ValidationError> {
    if host.len() + 1 + domain.len() > DNS1123_SUBDOMAIN_MAX_LENGTH {
        return Err(ValidationError::new(
            ROUTE_SUBDOMAIN_VALIDATION_ERROR,
            format!(
                "A valid DNS-1123 subdomain must not exceed {} characters.",
                DNS1123_SUBDOMAIN_MAX_LENGTH
            ),
        ));
    }

    let errors = host_errors(host);
    if !errors.is_empty() {
        return Err(ValidationError::new(
            ROUTE_HOST_NAME_VALIDATION_ERROR,
            format!("Host {:?} is not valid: {}", host, errors.join("; ")),
        ));
    }
    Ok(())
}

/// Whether `path` parses as the path of an absolute request URI.
///
/// Anything the URL parser has to repair, such as a bad percent escape or a
/// character outside the URL code points, counts as invalid.
fn is_request_uri_path(path: &str) -> bool {
    if !path.starts_with('/') {
        return false;
    }

    let repaired = Cell::new(false);
    let on_violation: &dyn Fn(url::SyntaxViolation) = &|_| repaired.set(true);
    let parsed = url::Url::options()
        .syntax_violation_callback(Some(on_violation))
        .parse(&format!("http://localhost{path}"));

    parsed.is_ok() && !repaired.get()
}

/// Check the optional route path. All problems are reported together.
pub fn validate_path(path: &str) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Ok(());
    }

    let mut errors = Vec::new();
    if !is_request_uri_path(path) {
        errors.push(INVALID_URI_ERROR);
    }
    if path == "/" {
        errors.push(PATH_IS_SLASH_ERROR);
    }
    if path.contains('?') {
        errors.push(PATH_HAS_QUESTION_MARK_ERROR);
    }
    if path.len() > MAX_PATH_LENGTH {
        errors.push(PATH_LENGTH_EXCEEDED_ERROR);
    }

    if errors.is_empty() {
        return Ok(());
    }
    Err(ValidationError::new(
        ROUTE_PATH_VALIDATION_ERROR,
        errors.join(", "),
    ))
}

pub struct CFRouteValidator {
    names: Arc<dyn NameValidator>,
    lookup: Arc<dyn ResourceLookup>,
    root_namespace: String,
}

impl CFRouteValidator {
    pub fn new(
        names: Arc<dyn NameValidator>,
        lookup: Arc<dyn ResourceLookup>,
        root_namespace: &str,
    ) -> Self {
        Self {
            names,
            lookup,
            root_namespace: root_namespace.to_string(),
        }
    }

    async fn fetch_domain(
        &self,
        ctx: &RequestContext,
        route: &CFRoute,
    ) -> Result<CFDomain, ValidationError> {
        let domain_ref = &route.spec.domain_ref;
        let message = "Error while retrieving CFDomain object";

        match self
            .lookup
            .get_domain(ctx, &domain_ref.namespace, &domain_ref.name)
            .await
        {
            Ok(Some(domain)) => Ok(domain),
            Ok(None) => {
                error!(
                    namespace = %domain_ref.namespace,
                    name = %domain_ref.name,
                    "{}: not found", message
                );
                Err(ValidationError::unknown_with_message(message))
            }
            Err(e) => {
                error!(
                    namespace = %domain_ref.namespace,
                    name = %domain_ref.name,
                    error = %e,
                    "{}", message
                );
                Err(ValidationError::unknown_with_message(message))
            }
        }
    }

    async fn check_destinations(
        &self,
        ctx: &RequestContext,
        route: &CFRoute,
    ) -> Result<(), ValidationError> {
        let namespace = route.namespace().unwrap_or_default();

        for destination in &route.spec.destinations {
            let app = &destination.app_ref.name;
            match self.lookup.app_exists(ctx, &namespace, app).await {
                Ok(true) => {}
                Ok(false) => {
                    error!(namespace = %namespace, app = %app, "{}", ROUTE_DESTINATION_NOT_IN_SPACE_MESSAGE);
                    return Err(ValidationError::new(
                        ROUTE_DESTINATION_NOT_IN_SPACE_ERROR,
                        ROUTE_DESTINATION_NOT_IN_SPACE_MESSAGE,
                    ));
                }
                Err(e) => {
                    error!(namespace = %namespace, app = %app, error = %e, "Failed to look up destination app");
                    return Err(ValidationError::unknown());
                }
            }
        }
        Ok(())
    }

}

#[async_trait]
impl AdmissionValidator<CFRoute> for CFRouteValidator {
    async fn validate_create(
        &self,
        ctx: &RequestContext,
        route: &CFRoute,
    ) -> Result<(), ValidationError> {
        let domain = self.fetch_domain(ctx, route).await?;
        self.check_destinations(ctx, route).await?;
        validate_fqdn(&route.spec.host, &domain.spec.name)?;
        validate_path(&route.spec.path)?;

        let unique = UniqueRoute::new(route, &self.root_namespace, &domain.spec.name);
        self.names.validate_create(ctx, &unique).await
    }

    async fn validate_update(
        &self,
        ctx: &RequestContext,
        old: &CFRoute,
        new: &CFRoute,
    ) -> Result<(), ValidationError> {
        if is_being_deleted(new) {
            return Ok(());
        }

        ensure_unchanged("CFRoute.Spec.Host", &old.spec.host, &new.spec.host)?;
        ensure_unchanged("CFRoute.Spec.Path", &old.spec.path, &new.spec.path)?;
        ensure_unchanged("CFRoute.Spec.Protocol", &old.spec.protocol, &new.spec.protocol)?;
        ensure_unchanged(
            "CFRoute.Spec.DomainRef.Name",
            &old.spec.domain_ref.name,
            &new.spec.domain_ref.name,
        )?;

        self.check_destinations(ctx, new).await?;

        let old_unique = UniqueRoute::new(old, &self.root_namespace, &old.spec.domain_ref.name);
        let new_unique = UniqueRoute::new(new, &self.root_namespace, &new.spec.domain_ref.name);
        self.names.validate_update(ctx, &old_unique, &new_unique).await
    }

    async fn validate_delete(
        &self,
        ctx: &RequestContext,
        route: &CFRoute,
    ) -> Result<(), ValidationError> {
        let unique = UniqueRoute::new(route, &self.root_namespace, &route.spec.domain_ref.name);
        self.names.validate_delete(ctx, &unique).await
    }
}
