//! OpenAPI 3.0 description of the media API.

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::AppState;

/// Creates the OpenAPI document route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_document))
}

async fn openapi_document() -> Json<Value> {
    Json(document())
}

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": { "schema": { "$ref": "#/components/schemas/Error" } }
        }
    })
}

fn json_response(description: &str, schema: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": { "schema": { "$ref": format!("#/components/schemas/{schema}") } }
        }
    })
}

/// Builds the OpenAPI document served at `/v1/media/openapi.json`.
#[must_use]
pub fn document() -> Value {
    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Mediagate media API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Tenant-scoped media asset ingestion into S3-compatible storage."
        },
        "servers": [{ "url": "/v1/media" }],
        "paths": paths(),
        "components": {
            "securitySchemes": {
                "bearerAuth": { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" }
            },
            "schemas": schemas()
        }
    })
}

#[allow(clippy::too_many_lines)]
fn paths() -> Value {
    let secured = json!([{ "bearerAuth": [] }]);
    let asset_id = json!({
        "name": "id",
        "in": "path",
        "required": true,
        "description": "Final key segment as returned by upload or list",
        "schema": { "type": "string" }
    });

    json!({
        "/health": {
            "get": {
                "summary": "Liveness check",
                "responses": { "200": json_response("Service is up", "Health") }
            }
        },
        "/upload": {
            "post": {
                "summary": "Upload a file through the gateway",
                "security": secured,
                "requestBody": {
                    "required": true,
                    "content": {
                        "multipart/form-data": {
                            "schema": {
                                "type": "object",
                                "required": ["file"],
                                "properties": {
                                    "file": { "type": "string", "format": "binary" }
                                }
                            }
                        }
                    }
                },
                "responses": {
                    "201": json_response("Stored", "AssetDescriptor"),
                    "400": error_response("Missing file, malformed body or file too large"),
                    "401": error_response("Missing or invalid credential"),
                    "500": error_response("Storage failure")
                }
            }
        },
        "/presign": {
            "post": {
                "summary": "Get a presigned PUT URL for direct upload",
                "security": secured,
                "requestBody": {
                    "required": true,
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/PresignRequest" }
                        }
                    }
                },
                "responses": {
                    "200": json_response("Presigned URL issued", "PresignDescriptor"),
                    "400": error_response("Malformed body"),
                    "401": error_response("Missing or invalid credential"),
                    "500": error_response("Storage failure")
                }
            }
        },
        "/assets": {
            "get": {
                "summary": "List the caller's assets",
                "security": secured,
                "responses": {
                    "200": json_response("All assets of the caller", "AssetList"),
                    "401": error_response("Missing or invalid credential"),
                    "500": error_response("Storage failure")
                }
            }
        },
        "/assets/{id}": {
            "get": {
                "summary": "Get asset metadata",
                "security": secured,
                "parameters": [asset_id],
                "responses": {
                    "200": json_response("Asset metadata", "AssetMetadata"),
                    "400": error_response("Invalid asset id"),
                    "401": error_response("Missing or invalid credential"),
                    "404": error_response("No such asset"),
                    "500": error_response("Storage failure")
                }
            },
            "delete": {
                "summary": "Delete an asset",
                "security": secured,
                "parameters": [asset_id],
                "responses": {
                    "204": { "description": "Deleted (or already absent)" },
                    "400": error_response("Invalid asset id"),
                    "401": error_response("Missing or invalid credential"),
                    "500": error_response("Storage failure")
                }
            }
        }
    })
}

fn schemas() -> Value {
    json!({
        "Health": {
            "type": "object",
            "properties": {
                "status": { "type": "string" },
                "version": { "type": "string" }
            }
        },
        "Error": {
            "type": "object",
            "properties": {
                "error": { "type": "string" },
                "message": { "type": "string" }
            }
        },
        "PresignRequest": {
            "type": "object",
            "required": ["filename"],
            "properties": { "filename": { "type": "string" } }
        },
        "AssetDescriptor": {
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "filename": { "type": "string" },
                "url": { "type": "string" },
                "size": { "type": "integer", "format": "int64" },
                "mime_type": { "type": "string" },
                "created_at": { "type": "string", "format": "date-time" }
            }
        },
        "PresignDescriptor": {
            "type": "object",
            "properties": {
                "url": { "type": "string" },
                "key": { "type": "string" },
                "expires_at": { "type": "string", "format": "date-time" }
            }
        },
        "AssetSummary": {
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "key": { "type": "string" },
                "size": { "type": "integer", "format": "int64" },
                "last_modified": { "type": "string", "format": "date-time", "nullable": true },
                "url": { "type": "string" }
            }
        },
        "AssetList": {
            "type": "object",
            "properties": {
                "assets": {
                    "type": "array",
                    "items": { "$ref": "#/components/schemas/AssetSummary" }
                }
            }
        },
        "AssetMetadata": {
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "key": { "type": "string" },
                "size": { "type": "integer", "format": "int64" },
                "mime_type": { "type": "string", "nullable": true },
                "last_modified": { "type": "string", "format": "date-time", "nullable": true },
                "url": { "type": "string" }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = document();
        let paths = doc["paths"].as_object().unwrap();
        for path in ["/health", "/upload", "/presign", "/assets", "/assets/{id}"] {
            assert!(paths.contains_key(path), "missing {path}");
        }
        assert_eq!(doc["openapi"], "3.0.3");
    }

    #[test]
    fn test_protected_routes_require_bearer() {
        let doc = document();
        assert!(doc["paths"]["/health"]["get"].get("security").is_none());
        assert_eq!(
            doc["paths"]["/upload"]["post"]["security"][0]["bearerAuth"],
            json!([])
        );
        assert_eq!(
            doc["components"]["securitySchemes"]["bearerAuth"]["scheme"],
            "bearer"
        );
    }
}
