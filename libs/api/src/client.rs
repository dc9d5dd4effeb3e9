//! Signed HTTP client for the management API.

use async_trait::async_trait;
use rigger_id::{RemoteId, ResourceKind, ResourceRef};
use rigger_lifecycle::{
    wait_until, DeleteAction, DeleteError, Deleter, ResourceHandle, WaitConfig, WaitError,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::commands::delete_action;
use crate::config::ClientConfig;
use crate::de::number_field;
use crate::error::ApiError;
use crate::principal::Principal;
use crate::resource::{CreateSpec, Created, ListQuery, Params, RemoteResource};
use crate::signing;

/// Parameters the client sets itself on every request.
const RESERVED_PARAMS: &[&str] = &["command", "response", "apiKey", "signature"];

/// API client bound to one principal.
///
/// Cloning is cheap; the underlying HTTP connection pool is shared.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoint: Url,
    principal: Principal,
    async_wait: WaitConfig,
}

impl Client {
    /// Create a new API client from config.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint,
            principal: config.principal,
            async_wait: WaitConfig::fixed(config.async_poll_interval, config.async_timeout),
        })
    }

    /// A view of this client that signs requests as `principal`.
    ///
    /// `self` keeps its own principal.
    pub fn acting_as(&self, principal: &Principal) -> Self {
        Self {
            principal: principal.clone(),
            ..self.clone()
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build the signed request URL.
    fn url(&self, command: &str, params: Params) -> Result<Url, ApiError> {
        let mut pairs: Vec<(String, String)> = params
            .into_pairs()
            .into_iter()
            .filter(|(k, _)| !RESERVED_PARAMS.contains(&k.as_str()))
            .collect();
        pairs.push(("command".to_string(), command.to_string()));
        pairs.push(("response".to_string(), "json".to_string()));
        pairs.push(("apiKey".to_string(), self.principal.api_key().to_string()));

        let query = signing::signed_query(&pairs, self.principal.secret_key())?;
        let mut url = self.endpoint.clone();
        url.set_query(Some(&query));
        Ok(url)
    }

    /// Send one request and unwrap the response envelope.
    ///
    /// Does not follow async jobs; see [`execute`](Client::execute).
    pub async fn request(&self, command: &str, params: Params) -> Result<Value, ApiError> {
        let url = self.url(command, params)?;
        debug!(command, principal = %self.principal.display_name(), "Calling API");

        let response = self.http.get(url).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        let body: Value = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if status >= 400 => {
                return Err(ApiError::Api {
                    command: command.to_string(),
                    status,
                    cs_error_code: None,
                    message: text,
                })
            }
            Err(e) => return Err(ApiError::decode(command, e.to_string())),
        };

        let inner = unwrap_envelope(command, body)?;
        if status >= 400 || inner.get("errorcode").is_some() {
            return Err(error_from_body(command, status, &inner));
        }
        Ok(inner)
    }

    /// Run a command to completion.
    ///
    /// Async commands answer with a `jobid`; the job is polled until it
    /// finishes and its `jobresult` is returned instead.
    pub async fn execute(&self, command: &str, params: Params) -> Result<Value, ApiError> {
        let inner = self.request(command, params).await?;
        match inner.get("jobid").and_then(Value::as_str) {
            Some(job_id) => self.wait_for_job(command, job_id).await,
            None => Ok(inner),
        }
    }

    /// Poll `queryAsyncJobResult` until the job leaves the pending state.
    pub async fn wait_for_job(&self, command: &str, job_id: &str) -> Result<Value, ApiError> {
        let what = format!("{command} job {job_id}");
        let client = self;

        let result = wait_until(&self.async_wait, &what, move || async move {
            let job = client
                .request("queryAsyncJobResult", Params::new().set("jobid", job_id))
                .await?;
            let result = job.get("jobresult").cloned().unwrap_or(Value::Null);

            match number_field(&job, "jobstatus") {
                Some(0) => Ok(None),
                Some(1) => Ok(Some(result)),
                Some(2) => Err(ApiError::AsyncJobFailed {
                    command: command.to_string(),
                    job_id: job_id.to_string(),
                    status: number_field(&result, "errorcode")
                        .and_then(|c| u16::try_from(c).ok())
                        .unwrap_or(530),
                    message: result
                        .get("errortext")
                        .and_then(Value::as_str)
                        .unwrap_or("async job failed")
                        .to_string(),
                }),
                other => Err(ApiError::decode(
                    "queryAsyncJobResult",
                    format!("unexpected jobstatus {other:?} for job {job_id}"),
                )),
            }
        })
        .await;

        result.map_err(|e| match e {
            WaitError::Timeout { elapsed, .. } => ApiError::AsyncJobTimeout {
                command: command.to_string(),
                job_id: job_id.to_string(),
                elapsed,
            },
            WaitError::Check(e) => e,
        })
    }

    /// Run a create command and build the teardown handle for its result.
    ///
    /// Nothing needs tearing down when the call fails, unless the error
    /// carries a [`leaked_handle`](ApiError::leaked_handle): the resource was
    /// created but its result could not be read.
    pub async fn create<S: CreateSpec>(&self, spec: &S) -> Result<Created<S::Output>, ApiError> {
        let kind = <S::Output as RemoteResource>::KIND;
        let result = self.execute(S::COMMAND, spec.params()).await?;
        let attributes =
            take_field(S::COMMAND, result, <S::Output as RemoteResource>::CREATE_KEY)?;
        let resource: S::Output = serde_json::from_value(attributes.clone())
            .map_err(|e| unreadable_create(S::COMMAND, kind, &attributes, e.to_string()))?;

        let created = Created::new(resource, attributes.clone())
            .map_err(|e| unreadable_create(S::COMMAND, kind, &attributes, e.to_string()))?;
        info!(
            command = S::COMMAND,
            resource = %created.handle,
            principal = %self.principal.display_name(),
            "Created resource"
        );
        Ok(created)
    }

    /// List resources of one kind. An empty response yields an empty vector.
    pub async fn list<T: RemoteResource>(&self, query: &ListQuery) -> Result<Vec<T>, ApiError> {
        let inner = self.request(T::LIST_COMMAND, query.params()).await?;
        match inner.get(T::RESPONSE_KEY) {
            Some(items) => serde_json::from_value(items.clone())
                .map_err(|e| ApiError::decode(T::LIST_COMMAND, e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    /// Look one resource up by ID.
    pub async fn find<T: RemoteResource>(&self, id: &str) -> Result<Option<T>, ApiError> {
        let mut items = self.list::<T>(&ListQuery::by_id(id).list_all()).await?;
        Ok(if items.is_empty() {
            None
        } else {
            Some(items.swap_remove(0))
        })
    }

    /// Run a command and decode the object under `key` in its result.
    pub(crate) async fn execute_into<T: DeserializeOwned>(
        &self,
        command: &str,
        params: Params,
        key: &str,
    ) -> Result<T, ApiError> {
        let result = self.execute(command, params).await?;
        let field = take_field(command, result, key)?;
        serde_json::from_value(field).map_err(|e| ApiError::decode(command, e.to_string()))
    }

    /// Run a command whose result is a `success` flag.
    pub(crate) async fn execute_success(
        &self,
        command: &str,
        params: Params,
    ) -> Result<(), ApiError> {
        let result = self.execute(command, params).await?;
        check_success(command, &result)
    }
}

#[async_trait]
impl Deleter for Client {
    async fn delete(&self, target: &ResourceRef, action: &DeleteAction) -> Result<(), DeleteError> {
        debug!(resource = %target, command = %action.command, "Issuing delete");
        self.execute_success(&action.command, Params::from(action))
            .await
            .map_err(DeleteError::from)
    }
}

/// Strip the `{"<command>response": {...}}` wrapper.
fn unwrap_envelope(command: &str, body: Value) -> Result<Value, ApiError> {
    let key = format!("{}response", command.to_lowercase());
    match body {
        Value::Object(mut map) => {
            if let Some(inner) = map.remove(&key) {
                return Ok(inner);
            }
            // Errors raised before dispatch use a generic wrapper.
            let fallback = map
                .keys()
                .find(|k| k.ends_with("response"))
                .cloned();
            match fallback.and_then(|k| map.remove(&k)) {
                Some(inner) => Ok(inner),
                None => Err(ApiError::decode(command, format!("missing '{key}'"))),
            }
        }
        other => Err(ApiError::decode(command, format!("expected object, got {other}"))),
    }
}

fn error_from_body(command: &str, status: u16, inner: &Value) -> ApiError {
    let status = number_field(inner, "errorcode")
        .and_then(|c| u16::try_from(c).ok())
        .unwrap_or(status);
    ApiError::Api {
        command: command.to_string(),
        status,
        cs_error_code: number_field(inner, "cserrorcode").and_then(|c| u32::try_from(c).ok()),
        message: inner
            .get("errortext")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string(),
    }
}

/// Take the object under `key`, or the value itself when it already is the
/// resource (some commands skip the inner wrapper).
/// Error for a create whose result did not decode. When the result still
/// names an ID, the error carries a handle that deletes it.
fn unreadable_create(
    command: &str,
    kind: ResourceKind,
    attributes: &Value,
    message: String,
) -> ApiError {
    let Some(id) = attributes
        .get("id")
        .and_then(Value::as_str)
        .and_then(|id| RemoteId::parse(id).ok())
    else {
        return ApiError::decode(command, message);
    };

    let action = delete_action(kind, &id);
    let handle = ResourceHandle::new(kind, id, action).with_attributes(attributes.clone());
    warn!(
        command,
        resource = %handle,
        error = %message,
        "Created resource has an unreadable result"
    );
    ApiError::CreatedUnreadable {
        command: command.to_string(),
        message,
        handle: Box::new(handle),
    }
}

fn take_field(command: &str, value: Value, key: &str) -> Result<Value, ApiError> {
    match value {
        Value::Object(mut map) => match map.remove(key) {
            Some(field) => Ok(field),
            None if map.contains_key("id") || map.contains_key("name") => Ok(Value::Object(map)),
            None => Err(ApiError::decode(command, format!("missing '{key}' in result"))),
        },
        other => Err(ApiError::decode(command, format!("expected object, got {other}"))),
    }
}

fn check_success(command: &str, result: &Value) -> Result<(), ApiError> {
    let success = match result.get("success") {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(_) => true,
    };
    if success {
        Ok(())
    } else {
        Err(ApiError::Api {
            command: command.to_string(),
            status: 530,
            cs_error_code: None,
            message: result
                .get("displaytext")
                .and_then(Value::as_str)
                .unwrap_or("operation reported failure")
                .to_string(),
        })
    }
}
