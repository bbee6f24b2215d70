#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::openapi::schema::Schema;
    use utoipa::openapi::{PathItemType, RefOr};
    use utoipa::OpenApi;

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        assert!(openapi.components.is_some());
        let components = openapi.components.as_ref().unwrap();

        for name in [
            "ErrorResponse",
            "HealthResponse",
            "ResponseStatus",
            "RegisterRequest",
            "LoginResponse",
            "AccountDetailResponse",
            "DeliveryResponse",
        ] {
            assert!(components.schemas.contains_key(name), "missing schema {}", name);
        }

        let json_result = serde_json::to_string(&openapi);
        assert!(json_result.is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        let error_response_schema = components.schemas.get("ErrorResponse").unwrap();

        if let RefOr::T(Schema::Object(obj)) = error_response_schema {
            let properties = &obj.properties;
            assert!(properties.contains_key("status"));
            assert!(properties.contains_key("message"));
            assert!(properties.contains_key("details"));
        } else {
            panic!("ErrorResponse should be an object schema");
        }
    }

    #[test]
    fn test_login_response_uses_camel_case() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();

        if let Some(RefOr::T(Schema::Object(obj))) = components.schemas.get("LoginResponse") {
            assert!(obj.properties.contains_key("requiresRoleSelection"));
            assert!(obj.properties.contains_key("candidates"));
        } else {
            panic!("LoginResponse should be an object schema");
        }
    }

    #[test]
    fn test_openapi_paths() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        for (path, method) in [
            ("/health", PathItemType::Get),
            ("/account/register", PathItemType::Post),
            ("/account/login", PathItemType::Post),
            ("/account/login/select-role", PathItemType::Post),
            ("/account/check-phone", PathItemType::Post),
            ("/account/{account_id}", PathItemType::Get),
            ("/delivery/user/{user_id}", PathItemType::Get),
            ("/delivery/sent/{user_id}", PathItemType::Get),
            ("/delivery/received/{user_id}", PathItemType::Get),
            ("/delivery/user/{user_id}/status/{status}", PathItemType::Get),
            ("/image/{filename}", PathItemType::Get),
        ] {
            let item = paths
                .get(path)
                .unwrap_or_else(|| panic!("missing path {}", path));
            assert!(item.operations.contains_key(&method), "missing method on {}", path);
        }

        let login = paths.get("/account/login").unwrap();
        let responses = &login.operations.get(&PathItemType::Post).unwrap().responses;
        assert!(responses.responses.contains_key("200"));
        assert!(responses.responses.contains_key("401"));
        assert!(responses.responses.contains_key("429"));
    }
}
