//! Service information endpoints.
//!
//! The OpenAPI document is compiled into the binary and parsed once when the
//! controller is built. `/api/version` reports its `info.version`.

use std::sync::Arc;

use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use thiserror::Error;

use crate::api::{bind, ApiError, Controller, Handler};
use crate::http::RequestContext;
use crate::routing::{Params, PatternError, RouteTable};

const OPENAPI: &str = include_str!("../../api.yml");

/// Errors loading the OpenAPI document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid OpenAPI document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("OpenAPI document has no info.version")]
    MissingVersion,
}

pub struct InfoController {
    yaml: String,
    document: Value,
    version: String,
}

impl InfoController {
    /// Controller serving the bundled document.
    pub fn new() -> Result<Self, DocumentError> {
        Self::from_yaml(OPENAPI)
    }

    fn from_yaml(yaml: &str) -> Result<Self, DocumentError> {
        let document: Value = serde_yaml::from_str(yaml)?;
        let version = document
            .pointer("/info/version")
            .and_then(Value::as_str)
            .ok_or(DocumentError::MissingVersion)?
            .to_string();

        Ok(Self {
            yaml: yaml.to_string(),
            document,
            version,
        })
    }

    async fn version(
        self: Arc<Self>,
        _params: Params,
        _context: RequestContext,
    ) -> Result<Response, ApiError> {
        Ok(self.version.clone().into_response())
    }

    async fn yml(
        self: Arc<Self>,
        _params: Params,
        _context: RequestContext,
    ) -> Result<Response, ApiError> {
        Ok(([(header::CONTENT_TYPE, "application/x-yaml")], self.yaml.clone()).into_response())
    }

    async fn json(
        self: Arc<Self>,
        _params: Params,
        _context: RequestContext,
    ) -> Result<Response, ApiError> {
        Ok(Json(self.document.clone()).into_response())
    }
}

impl Controller for InfoController {
    fn add_routes(self: Arc<Self>, table: &mut RouteTable<Handler>) -> Result<(), PatternError> {
        table.get("/api/version", bind(&self, Self::version))?;
        table.get("/api/openapi.yml", bind(&self, Self::yml))?;
        table.get("/api/openapi.json", bind(&self, Self::json))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_document_matches_package_version() {
        let controller = InfoController::new().unwrap();
        assert_eq!(controller.version, env!("CARGO_PKG_VERSION"));
        assert!(controller.document["paths"]["/api/instances"].is_object());
    }

    #[test]
    fn test_document_without_version() {
        let err = InfoController::from_yaml("openapi: 3.0.3\ninfo:\n  title: x\n").err();
        assert!(matches!(err, Some(DocumentError::MissingVersion)));

        let err = InfoController::from_yaml("info: [unclosed").err();
        assert!(matches!(err, Some(DocumentError::Parse(_))));
    }

    #[test]
    fn test_routes_registered() {
        let mut table = RouteTable::new();
        Arc::new(InfoController::from_yaml("info:\n  version: 9.9.9\n").unwrap())
            .add_routes(&mut table)
            .unwrap();

        assert_eq!(table.len(), 3);
        assert!(table.resolve("/api/openapi.json", "GET").is_some());
        assert!(table.resolve("/api/openapi.yml", "GET").is_some());
        assert!(table.resolve("/api/openapi.yaml", "GET").is_none());
    }
}
