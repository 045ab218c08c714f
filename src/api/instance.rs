//! Instance endpoints.
//!
//! # Routes
//! - `GET /api/instances`
//! - `POST /api/instances`
//! - `GET|DELETE /api/instance/{instanceId}`
//! - `GET /api/instance/{instanceId}/channel/{channelId}/screenshot`
//! - `GET /api/instance/{instanceId}/channel/{channelId}/video/{streamType}`

use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::api::{bind, ApiError, Controller, Handler};
use crate::http::{json_error, RequestContext};
use crate::instances::{ConnectedInstance, Instance, InstancePool, InstanceStore, NewInstance};
use crate::routing::{Params, PatternError, RouteTable};
use crate::vms::{ChannelMap, StreamType};

const INSTANCE_ID: &str = r"\d+";

/// Instance row merged with its live state and channel listing.
#[derive(Debug, Serialize)]
pub struct InstanceView {
    #[serde(flatten)]
    pub instance: Instance,
    pub state: String,
    #[serde(flatten)]
    pub channels: ChannelMap,
}

impl InstanceView {
    fn connected(connected: ConnectedInstance) -> Self {
        Self {
            state: connected.client.state(),
            channels: connected.client.channels(),
            instance: connected.instance,
        }
    }

    fn unavailable(instance: Instance) -> Self {
        Self {
            instance,
            state: "unavailable".to_string(),
            channels: ChannelMap::new(),
        }
    }
}

pub struct InstanceController {
    store: Arc<dyn InstanceStore>,
    pool: Arc<InstancePool>,
}

impl InstanceController {
    pub fn new(store: Arc<dyn InstanceStore>, pool: Arc<InstancePool>) -> Self {
        Self { store, pool }
    }

    async fn list(
        self: Arc<Self>,
        _params: Params,
        _context: RequestContext,
    ) -> Result<Response, ApiError> {
        let mut views = Vec::new();
        for instance in self.store.list().await? {
            match self.pool.get(instance.id).await {
                Ok(connected) => views.push(InstanceView::connected(connected)),
                Err(e) => {
                    tracing::warn!(instance_id = instance.id, error = %e, "Instance unavailable");
                    views.push(InstanceView::unavailable(instance));
                }
            }
        }
        Ok(Json(views).into_response())
    }

    async fn add(
        self: Arc<Self>,
        _params: Params,
        context: RequestContext,
    ) -> Result<Response, ApiError> {
        let new: NewInstance = serde_json::from_slice(context.body())
            .map_err(|_| ApiError::BadRequest("Invalid JSON"))?;
        if !new.is_complete() {
            return Err(ApiError::BadRequest("Invalid data"));
        }

        let instance = self.store.insert(new).await?;
        let id = instance.id;

        let connected = match self.pool.connect(id).await {
            Ok(connected) => connected,
            Err(e) => {
                tracing::warn!(
                    request_id = %context.request_id(),
                    instance_id = id,
                    error = %e,
                    "Instance connection failed, discarding"
                );
                self.store.delete(id).await?;
                self.pool.evict(id);
                return Ok(json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
            }
        };

        if let Some(name) = connected.client.server_name() {
            self.store.update_name(id, &name).await?;
        }
        tracing::info!(instance_id = id, ip = %instance.ip, "Instance added");

        self.pool.pull().await?;
        Ok(Json(json!({ "status": "success", "id": id })).into_response())
    }

    async fn show(
        self: Arc<Self>,
        params: Params,
        _context: RequestContext,
    ) -> Result<Response, ApiError> {
        let connected = self.pool.get(instance_id(&params)?).await?;
        Ok(Json(InstanceView::connected(connected)).into_response())
    }

    async fn remove(
        self: Arc<Self>,
        params: Params,
        _context: RequestContext,
    ) -> Result<Response, ApiError> {
        let id = instance_id(&params)?;
        if !self.store.delete(id).await? {
            tracing::warn!(instance_id = id, "Delete of unknown instance");
            return Err(ApiError::NotFound("Instance not found"));
        }

        self.pool.evict(id);
        self.pool.pull().await?;
        tracing::info!(instance_id = id, "Instance deleted");
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    async fn screenshot(
        self: Arc<Self>,
        params: Params,
        _context: RequestContext,
    ) -> Result<Response, ApiError> {
        let connected = self.pool.get(instance_id(&params)?).await?;
        let channel = params.get("channelId").unwrap_or_default();

        let channels = connected.client.channels();
        let server = channels
            .media_server(channel, connected.server_name())
            .ok_or(ApiError::NotFound("Channel not found"))?;

        let image = connected.client.screenshot(server, channel).await?;
        Ok(([(header::CONTENT_TYPE, "image/jpeg")], image).into_response())
    }

    async fn video(
        self: Arc<Self>,
        params: Params,
        context: RequestContext,
    ) -> Result<Response, ApiError> {
        let stream: StreamType = params
            .get("streamType")
            .unwrap_or_default()
            .parse()
            .map_err(|_| ApiError::BadRequest("Invalid stream type"))?;

        let connected = self.pool.get(instance_id(&params)?).await?;
        let channel = params.get("channelId").unwrap_or_default();

        let channels = connected.client.channels();
        let server = channels
            .media_server(channel, connected.server_name())
            .ok_or(ApiError::NotFound("Channel not found"))?;

        let url = connected.client.video(server, channel, stream).await?;
        if context.query_flag("redirect") {
            return Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response());
        }
        Ok(url.into_response())
    }
}

impl Controller for InstanceController {
    fn add_routes(self: Arc<Self>, table: &mut RouteTable<Handler>) -> Result<(), PatternError> {
        table.get("/api/instances", bind(&self, Self::list))?;
        table.post("/api/instances", bind(&self, Self::add))?;
        table
            .delete("/api/instance/{instanceId}", bind(&self, Self::remove))?
            .constrain("instanceId", INSTANCE_ID)?;
        table
            .get("/api/instance/{instanceId}", bind(&self, Self::show))?
            .constrain("instanceId", INSTANCE_ID)?;
        table.get(
            r"/api/instance/{instanceId<\d+>}/channel/{channelId}/screenshot",
            bind(&self, Self::screenshot),
        )?;
        table
            .get(
                "/api/instance/{instanceId}/channel/{channelId}/video/{streamType}",
                bind(&self, Self::video),
            )?
            .constrain("instanceId", INSTANCE_ID)?;
        Ok(())
    }
}

/// Numeric instance id; values that overflow cannot name a stored row.
fn instance_id(params: &Params) -> Result<i64, ApiError> {
    params
        .get("instanceId")
        .and_then(|v| v.parse().ok())
        .ok_or(ApiError::NotFound("Instance not found"))
}
