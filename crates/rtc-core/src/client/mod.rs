//! Work-item client: the façade over session, decoder, projector and query
//! builder.
//!
//! Reads live here; mutations and lifecycle actions are in `write`.

mod endpoints;
mod write;

pub use write::ItemIds;

use crate::attributes::{FieldMap, project};
use crate::config::{Config, ServerConfig};
use crate::envelope::{AttributeValuesDto, Envelope, Value, decode};
use crate::error::RtcError;
use crate::model::{Iteration, Owner, Reference, Release, WorkItem, flatten, owners_from};
use crate::query::{self, Filter, QuerySpec};
use crate::transport::{
    CookiePolicy, Exchange, HttpResponse, Method, Session, UreqExchange, redact_url,
};
use endpoints::Endpoints;
use std::collections::BTreeMap;
use tracing::{debug, info};

const AUTH_FAILED_MARKER: &str = "authfailed";

const PARENT_ENDPOINT: &str = "parent";
const CHILDREN_ENDPOINT: &str = "children";

/// Login identity and the owner used for "my items" queries.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub user: String,
    pub password: String,
    pub owner_id: String,
}

impl Identity {
    /// Identity from config, with the password environment override applied.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            user: config.credentials.username.clone(),
            password: config.credentials.resolved_password().unwrap_or_default(),
            owner_id: config.credentials.owner_id.clone(),
        }
    }
}

pub struct Client<X = UreqExchange> {
    session: Session<X>,
    endpoints: Endpoints,
    server: ServerConfig,
    identity: Identity,
}

impl Client<UreqExchange> {
    /// Production client talking to the configured server.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::with_exchange(
            UreqExchange::new(),
            config.server.clone(),
            Identity::from_config(config),
        )
    }
}

impl<X: Exchange> Client<X> {
    pub fn with_exchange(exchange: X, server: ServerConfig, identity: Identity) -> Self {
        Self::with_session(Session::new(exchange), server, identity)
    }

    pub fn with_policy(
        exchange: X,
        policy: CookiePolicy,
        server: ServerConfig,
        identity: Identity,
    ) -> Self {
        Self::with_session(Session::with_policy(exchange, policy), server, identity)
    }

    fn with_session(session: Session<X>, server: ServerConfig, identity: Identity) -> Self {
        Self {
            session,
            endpoints: Endpoints::new(&server),
            server,
            identity,
        }
    }

    /// Log request details at `info` instead of `debug`.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.session.set_verbose(verbose);
    }

    #[must_use]
    pub const fn session(&self) -> &Session<X> {
        &self.session
    }

    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Establish the session: login check, then the web UI initializer.
    ///
    /// # Errors
    ///
    /// - [`RtcError::Validation`] when user or password is empty.
    /// - [`RtcError::Auth`] when the login check redirects to the failure page.
    /// - [`RtcError::HttpStatus`] / [`RtcError::Transport`] from either call.
    pub fn login(&mut self) -> Result<(), RtcError> {
        if self.identity.user.is_empty() || self.identity.password.is_empty() {
            return Err(RtcError::validation(
                "username and password are required to log in",
            ));
        }

        let check = self
            .endpoints
            .login_check(&self.identity.user, &self.identity.password);
        let response = self.session.send(Method::Get, &check, "")?;
        if response
            .header("Location")
            .is_some_and(|location| location.contains(AUTH_FAILED_MARKER))
        {
            return Err(RtcError::Auth {
                user: self.identity.user.clone(),
            });
        }
        ensure_success(&response, &redact_url(&check))?;

        let init = self.endpoints.initializer();
        let response = self.session.send(Method::Post, &init, "")?;
        ensure_success(&response, &init)?;

        info!(user = %self.identity.user, cookies = self.session.jar().len(), "logged in");
        Ok(())
    }

    /// Identity, summary, description, owner, creator, type and URI of `id`.
    ///
    /// # Errors
    ///
    /// [`RtcError::NotFound`] when the server returns no item for `id`.
    pub fn retrieve(&mut self, id: &str) -> Result<WorkItem, RtcError> {
        let url = self.endpoints.retrieve(id);
        let envelope = self.envelope(Method::Get, &url, "")?;
        envelope
            .value()
            .summaries
            .first()
            .map(WorkItem::from_summary)
            .ok_or_else(|| not_found(id))
    }

    /// The item with state, planning fields and links filled in.
    ///
    /// # Errors
    ///
    /// Propagates failures of the retrieve and the detail read.
    pub fn get_work_item(&mut self, id: &str) -> Result<WorkItem, RtcError> {
        let mut item = self.retrieve(id)?;
        let detail = self.detail(id)?;

        item.item_id.clone_from(&detail.item_id);
        item.state_id.clone_from(&detail.state_id);
        item.apply_detail(&project(&detail));

        for link_type in &detail.link_types {
            let bucket = match link_type.endpoint_id.as_str() {
                PARENT_ENDPOINT => &mut item.parents,
                CHILDREN_ENDPOINT => &mut item.children,
                _ => continue,
            };
            bucket.extend(link_type.links.iter().map(|l| Reference::from_target(&l.target)));
        }

        Ok(item)
    }

    /// Full-text search. Hits carry no planning data (`planned_for` is `-`).
    ///
    /// # Errors
    ///
    /// Transport, status and decode failures.
    pub fn search(&mut self, text: &str) -> Result<Vec<WorkItem>, RtcError> {
        let url = self.endpoints.search(text);
        let envelope = self.envelope(Method::Get, &url, "")?;
        Ok(envelope
            .value()
            .summaries
            .iter()
            .map(WorkItem::from_search_hit)
            .collect())
    }

    /// Open or in-progress items owned by the configured owner.
    ///
    /// # Errors
    ///
    /// [`RtcError::Validation`] without a configured owner, otherwise as
    /// [`Client::query`].
    pub fn current_work_items(&mut self) -> Result<Vec<WorkItem>, RtcError> {
        if self.identity.owner_id.is_empty() {
            return Err(RtcError::validation(
                "credentials.owner_id is not configured; see `rtc config owners`",
            ));
        }
        let spec = QuerySpec::with_filters(vec![
            Filter::owner(self.identity.owner_id.clone()),
            Filter::open(),
        ]);
        self.query(&spec)
    }

    /// Run a result-set query; rows are mapped by column position.
    ///
    /// # Errors
    ///
    /// Validation from the builder, then transport, status and decode failures.
    pub fn query(&mut self, spec: &QuerySpec) -> Result<Vec<WorkItem>, RtcError> {
        let request = query::build(spec, self.endpoints.project_area())?;
        debug!(filters = spec.filters.len(), sort = %spec.sort_field, "querying");
        let url = self.endpoints.result_set();
        let envelope = self.envelope(Method::Post, &url, &request.body())?;
        Ok(envelope.value().rows.iter().map(WorkItem::from_row).collect())
    }

    /// Releases of the configured process area, each with its iterations.
    ///
    /// # Errors
    ///
    /// Transport, status and decode failures.
    pub fn releases(&mut self) -> Result<Vec<Release>, RtcError> {
        let url = self.endpoints.iterations();
        let envelope = self.envelope(Method::Get, &url, "")?;
        Ok(envelope.return_value().releases.iter().map(Release::from).collect())
    }

    /// Every iteration, flattened in release order.
    ///
    /// # Errors
    ///
    /// As [`Client::releases`].
    pub fn iterations(&mut self) -> Result<Vec<Iteration>, RtcError> {
        Ok(flatten(&self.releases()?))
    }

    /// Iterations keyed by their stable item id.
    ///
    /// # Errors
    ///
    /// As [`Client::releases`].
    pub fn iterations_by_item_id(&mut self) -> Result<BTreeMap<String, Iteration>, RtcError> {
        Ok(self
            .iterations()?
            .into_iter()
            .map(|it| (it.item_id.clone(), it))
            .collect())
    }

    /// Lookup tables keyed by attribute id, each mapping item id to label.
    ///
    /// # Errors
    ///
    /// Transport, status and decode failures.
    pub fn all_values(&mut self) -> Result<BTreeMap<String, FieldMap>, RtcError> {
        Ok(self
            .lookup_tables()?
            .iter()
            .map(|table| (table.attribute_id.clone(), project(table)))
            .collect())
    }

    /// Possible owners, sorted by name.
    ///
    /// # Errors
    ///
    /// As [`Client::all_values`].
    pub fn owners(&mut self) -> Result<Vec<Owner>, RtcError> {
        Ok(owners_from(&self.lookup_tables()?))
    }

    /// Web location of `id`, for opening in a browser.
    ///
    /// # Errors
    ///
    /// As [`Client::retrieve`].
    pub fn work_item_uri(&mut self, id: &str) -> Result<String, RtcError> {
        Ok(self.retrieve(id)?.location_uri)
    }

    /// Raw response body of an arbitrary service URL.
    ///
    /// # Errors
    ///
    /// [`RtcError::HttpStatus`] for error statuses, or a transport failure.
    pub fn raw_request(&mut self, method: Method, url: &str) -> Result<Vec<u8>, RtcError> {
        let url = self.endpoints.absolute(url);
        self.fetch(method, &url, "")
    }

    fn lookup_tables(&mut self) -> Result<Vec<AttributeValuesDto>, RtcError> {
        let url = self.endpoints.all_values();
        let envelope = self.envelope(Method::Get, &url, "")?;
        Ok(envelope.body.response.return_value.attribute_values)
    }

    /// Detail read: internal ids, attributes and links.
    fn detail(&mut self, id: &str) -> Result<Value, RtcError> {
        let url = self.endpoints.detail(id);
        let envelope = self.envelope(Method::Get, &url, "")?;
        let value = envelope.body.response.return_value.value;
        if value.item_id.is_empty() {
            return Err(not_found(id));
        }
        Ok(value)
    }

    fn fetch(&mut self, method: Method, url: &str, body: &str) -> Result<Vec<u8>, RtcError> {
        let response = self.session.send(method, url, body)?;
        ensure_success(&response, url)?;
        Ok(response.body)
    }

    fn envelope(&mut self, method: Method, url: &str, body: &str) -> Result<Envelope, RtcError> {
        let raw = self.fetch(method, url, body)?;
        decode(&raw)
    }
}

fn ensure_success(response: &HttpResponse, url: &str) -> Result<(), RtcError> {
    if response.is_error() {
        return Err(RtcError::HttpStatus {
            status: response.status,
            url: url.to_string(),
        });
    }
    Ok(())
}

fn not_found(id: &str) -> RtcError {
    RtcError::NotFound {
        what: "work item",
        id: id.to_string(),
    }
}
