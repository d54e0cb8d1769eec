use super::handlers::{auth::types, health, user_info, user_signin, user_signup};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        user_signup::signup,
        user_signin::signin,
        user_info::info,
    ),
    components(schemas(
        health::Health,
        types::Identity,
        types::SignUpRequest,
        types::SignInRequest,
        types::SignInResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "user", description = "Sign-up, sign-in and identity lookup"),
        (name = "health", description = "Service and credential store status"),
    )
)]
struct ApiDoc;

/// Registers the `bearer` scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// The `OpenAPI` document served at `/api-docs/openapi.json`.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let doc = openapi();
        assert_eq!(doc.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(doc.info.version, env!("CARGO_PKG_VERSION"));

        let license = doc.info.license;
        assert!(license.is_some());
        if let Some(license) = license {
            assert_eq!(license.name, "BSD-3-Clause");
        }
    }

    #[test]
    fn openapi_tags_and_paths() {
        let doc = openapi();
        let tags = doc.tags.clone().unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "user"));
        assert!(tags.iter().any(|tag| tag.name == "health"));
        for path in ["/health", "/user/signup", "/user/signin", "/user/{id}/info"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn openapi_declares_bearer_scheme() {
        let doc = openapi();
        let has_bearer = doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer"));
        assert!(has_bearer);
    }
}
