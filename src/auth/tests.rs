//! Unit tests for authentication module

#[cfg(test)]
mod tests {
    use crate::auth::jwt::{generate_token, get_token_expiry, validate_token};
    use crate::auth::model::{Claims, LoginRequest, TokenResponse, User, UserInfo};
    use uuid::Uuid;

    #[test]
    fn test_generate_and_validate_token() {
        let user_id = Uuid::new_v4().to_string();
        let email = "test@example.com";

        let token = generate_token(&user_id, email).expect("Failed to generate token");

        let claims = validate_token(&token).expect("Failed to validate token");

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, email);
    }

    #[test]
    fn test_token_is_valid_for_seven_days() {
        let token =
            generate_token("test-user-id", "test@example.com").expect("Failed to generate token");

        let claims = validate_token(&token).expect("Failed to validate token");

        assert_eq!(claims.exp - claims.iat, get_token_expiry() as usize);
        assert_eq!(get_token_expiry(), 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_invalid_token_returns_error() {
        let result = validate_token("invalid.token.here");
        assert!(result.is_err());
    }

    #[test]
    fn test_tampered_token_returns_error() {
        let token =
            generate_token("test-user-id", "test@example.com").expect("Failed to generate token");

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('x');

        assert!(validate_token(&tampered).is_err());
    }

    #[test]
    fn test_user_to_user_info_conversion() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "hashedpassword".to_string(),
            created_at: chrono::Utc::now(),
        };

        let info: UserInfo = user.clone().into();

        assert_eq!(info.id, user.id);
        assert_eq!(info.name, user.name);
        assert_eq!(info.email, user.email);

        // UserInfo must not leak credential material
        let json = serde_json::to_string(&info).expect("Failed to serialize");
        assert!(!json.contains("password"));
        assert!(!json.contains("hashedpassword"));
    }

    #[test]
    fn test_claims_clone() {
        let claims = Claims {
            sub: "test-id".to_string(),
            email: "test@example.com".to_string(),
            exp: 12345,
            iat: 12340,
        };

        let cloned = claims.clone();

        assert_eq!(claims.sub, cloned.sub);
        assert_eq!(claims.email, cloned.email);
        assert_eq!(claims.exp, cloned.exp);
        assert_eq!(claims.iat, cloned.iat);
    }

    #[test]
    fn test_login_request_deserialize() {
        let json = r#"{"email": "user@example.com", "password": "secret123"}"#;
        let request: LoginRequest = serde_json::from_str(json).expect("Failed to deserialize");

        assert_eq!(request.email, "user@example.com");
        assert_eq!(request.password, "secret123");
    }

    #[test]
    fn test_token_response_serialize() {
        let response = TokenResponse {
            token: "jwt-token".to_string(),
            user: UserInfo {
                id: Uuid::new_v4(),
                name: "Test".to_string(),
                email: "test@example.com".to_string(),
                created_at: chrono::Utc::now(),
            },
            expires_in: 604800,
        };

        let json = serde_json::to_string(&response).expect("Failed to serialize");

        assert!(json.contains("token"));
        assert!(json.contains("user"));
        assert!(json.contains("expiresIn"));
    }
}
