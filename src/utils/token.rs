// utils/token.rs
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::models::chatmodels::SenderRole;

/// Claims carried in the bearer token: the participant's phone number as the
/// subject and their marketplace side. Tokens are minted by the account
/// service; this side only verifies them.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub role: SenderRole,
    pub iat: usize,
    pub exp: usize,
}

pub fn decode_token(token: &str, secret: &[u8]) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
    let decoded = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(decoded.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &[u8] = b"test-secret";

    fn issue_token(phone: &str, role: SenderRole, secret: &[u8], expires_in_seconds: i64) -> String {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: phone.to_string(),
            role,
            iat: now.timestamp() as usize,
            exp: (now + Duration::seconds(expires_in_seconds)).timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn test_token_round_trip() {
        let token = issue_token("01012345678", SenderRole::Worker, SECRET, 3600);
        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "01012345678");
        assert_eq!(claims.role, SenderRole::Worker);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token("01012345678", SenderRole::Client, SECRET, 3600);
        assert!(decode_token(&token, b"other-secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token("01012345678", SenderRole::Worker, SECRET, -3600);
        assert!(decode_token(&token, SECRET).is_err());
    }
}
