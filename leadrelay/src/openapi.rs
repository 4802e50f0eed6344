//! OpenAPI document for the relay's HTTP surface, served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::api;
use crate::config::BusinessContact;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lead relay",
        description = "Accepts leads from the landing page form and forwards them to the workshop's messaging bot."
    ),
    paths(
        api::handlers::leads::submit_lead,
        api::handlers::contact::get_contact,
    ),
    components(
        schemas(
            api::models::leads::LeadSubmission,
            api::models::leads::RelayAck,
            api::models::leads::RelayErrorBody,
            BusinessContact,
        )
    ),
    tags(
        (name = "leads", description = "Submit a lead from the landing page.

Submissions are not stored. Each accepted lead becomes exactly one bot message, so sending the same lead twice notifies staff twice."),
        (name = "contact", description = "How to reach the workshop without the form."),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_relay_paths() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/lead"));
        assert!(doc.paths.paths.contains_key("/api/contact"));
    }

    #[test]
    fn test_document_has_schemas() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().unwrap().schemas;

        for name in ["LeadSubmission", "RelayAck", "RelayErrorBody", "BusinessContact"] {
            assert!(schemas.contains_key(name), "missing schema {name}");
        }
    }
}
