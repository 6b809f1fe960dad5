use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::checklist::{dtos as checklist_dtos, handlers as checklist_handlers};
use crate::features::fraud::{
    dtos as fraud_dtos, engine as fraud_engine, handlers as fraud_handlers,
};
use crate::features::geo::services::GeoAddress;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Checklist
        checklist_handlers::checklist_handler::submit_checklist,
        checklist_handlers::checklist_handler::list_entries,
        checklist_handlers::checklist_handler::get_entry,
        checklist_handlers::checklist_handler::approve_entry,
        checklist_handlers::checklist_handler::delete_entry,
        checklist_handlers::checklist_handler::feed_events,
        checklist_handlers::checklist_handler::list_expected_locations,
        checklist_handlers::checklist_handler::upsert_expected_location,
        // Fraud
        fraud_handlers::fraud_handler::get_fraud_report,
        fraud_handlers::fraud_handler::get_fraud_summary,
    ),
    components(
        schemas(
            // Shared
            Meta,
            auth::model::AuthenticatedUser,
            GeoAddress,
            // Checklist
            checklist_dtos::SubmitChecklistDto,
            checklist_dtos::DeviceAuditInput,
            checklist_dtos::ChecklistEntryDto,
            checklist_dtos::ExpectedLocationDto,
            checklist_dtos::UpsertExpectedLocationDto,
            ApiResponse<checklist_dtos::ChecklistEntryDto>,
            ApiResponse<Vec<checklist_dtos::ChecklistEntryDto>>,
            ApiResponse<checklist_dtos::ExpectedLocationDto>,
            ApiResponse<Vec<checklist_dtos::ExpectedLocationDto>>,
            // Fraud
            fraud_engine::FraudFlag,
            fraud_engine::GpsStats,
            fraud_dtos::FraudSummaryDto,
            ApiResponse<fraud_dtos::FraudSummaryDto>,
        )
    ),
    tags(
        (name = "checklist", description = "Checklist photo submissions and approvals"),
        (name = "fraud", description = "Fraud reporting over submission metadata"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Siteproof API",
        version = "0.1.0",
        description = "API documentation for Siteproof",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
