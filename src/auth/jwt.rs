use jsonwebtoken::{decode, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Claims issued by the identity provider. This service only verifies them.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: i64,
    #[serde(default)]
    pub aud: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

pub fn verify_token(token: &str, config: &Config) -> AppResult<TokenData<Claims>> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.set_audience(&[config.jwt_audience.as_str()]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::Unauthorized
    })
}

#[cfg(test)]
pub(crate) fn sign_test_token(user_id: Uuid, config: &Config) -> String {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        sub: user_id,
        exp: (Utc::now() + Duration::seconds(900)).timestamp(),
        aud: Some(config.jwt_audience.clone()),
        email: Some("someone@example.com".into()),
        role: Some("authenticated".into()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(aud: &str, exp_offset_secs: i64) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            exp: (Utc::now() + Duration::seconds(exp_offset_secs)).timestamp(),
            aud: Some(aud.into()),
            email: None,
            role: None,
        }
    }

    #[test]
    fn test_valid_token_yields_subject() {
        let config = test_config();
        let user = Uuid::new_v4();
        let token = sign_test_token(user, &config);

        let data = verify_token(&token, &config).unwrap();
        assert_eq!(data.claims.sub, user);
        assert_eq!(data.claims.email.as_deref(), Some("someone@example.com"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = test_config();
        let token = sign(&claims("authenticated", 900), "some-other-secret");
        assert!(matches!(verify_token(&token, &config), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let config = test_config();
        let token = sign(&claims("anon", 900), &config.jwt_secret);
        assert!(matches!(verify_token(&token, &config), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = test_config();
        // well past the default 60s leeway
        let token = sign(&claims("authenticated", -3600), &config.jwt_secret);
        assert!(matches!(verify_token(&token, &config), Err(AppError::Unauthorized)));
    }
}
