use crate::{domain::AdministrativeUser, domain::TenantId, error::AppError};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(rename = "companyId")]
    pub company_id: Option<TenantId>,
    pub profile: String,
    pub iat: usize,
    pub exp: usize,
}

pub fn parse_expiry(expires_in: &str) -> Result<Duration, AppError> {
    let invalid = || AppError::InternalServerError("Invalid JWT expiration format".to_string());
    let split = expires_in.char_indices().last().map(|(i, _)| i).unwrap_or(0);
    let (amount, unit) = expires_in.split_at(split);
    let amount = amount.parse::<i64>().map_err(|_| invalid())?;

    match unit {
        "m" => Ok(Duration::minutes(amount)),
        "h" => Ok(Duration::hours(amount)),
        "d" => Ok(Duration::days(amount)),
        _ => Err(invalid()),
    }
}

pub fn generate_jwt_token(
    user: &AdministrativeUser,
    jwt_secret: &str,
    expires_in: &str,
) -> Result<String, AppError> {
    if jwt_secret.is_empty() {
        return Err(AppError::ConfigurationError("JWT secret cannot be empty".to_string()));
    }

    let now = Utc::now();
    let claims = TokenClaims {
        sub: user.id.to_string(),
        company_id: user.company_id,
        profile: user.profile.clone(),
        iat: now.timestamp().max(0) as usize,
        exp: (now + parse_expiry(expires_in)?).timestamp().max(0) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to generate JWT token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, TokenData, Validation};

    fn verify_jwt_token(jwt_secret: &str, token: &str) -> Result<TokenData<TokenClaims>, AppError> {
        let validation = Validation::default();

        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|e| AppError::AuthError(format!("Invalid token: {}", e)))
    }

    #[test]
    fn test_token_roundtrip_carries_company() {
        let user = AdministrativeUser::new_super("Admin", "admin@admin.com", "hash".into(), 1);
        let token = generate_jwt_token(&user, "secret", "15m").unwrap();
        let data = verify_jwt_token("secret", &token).unwrap();
        assert_eq!(data.claims.sub, user.id.to_string());
        assert_eq!(data.claims.company_id, Some(1));
        assert!(verify_jwt_token("other", &token).is_err());
    }

    #[test]
    fn test_expiry_formats() {
        assert_eq!(parse_expiry("7d").unwrap(), Duration::days(7));
        assert_eq!(parse_expiry("2h").unwrap(), Duration::hours(2));
        assert!(parse_expiry("15s").is_err());
        assert!(parse_expiry("").is_err());
    }
}
