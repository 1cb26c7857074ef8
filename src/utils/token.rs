use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: String,
    pub jti: Uuid,
    pub exp: usize,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.exp as i64, 0).unwrap_or_else(Utc::now)
    }
}

pub fn issue_session_token(
    secret: &str,
    user_id: Uuid,
    role: &str,
    ttl_hours: i64,
) -> jsonwebtoken::errors::Result<(String, Claims)> {
    let exp = Utc::now() + Duration::hours(ttl_hours);
    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        jti: Uuid::new_v4(),
        exp: exp.timestamp() as usize,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok((token, claims))
}

pub fn decode_session_token(secret: &str, token: &str) -> jsonwebtoken::errors::Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_decodes_with_same_secret() {
        let user = Uuid::new_v4();
        let (token, claims) = issue_session_token("secret", user, "hr", 1).unwrap();
        let decoded = decode_session_token("secret", &token).unwrap();
        assert_eq!(decoded.sub, user);
        assert_eq!(decoded.jti, claims.jti);
        assert_eq!(decoded.role, "hr");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let (token, _) = issue_session_token("secret", Uuid::new_v4(), "hr", 1).unwrap();
        assert!(decode_session_token("other", &token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let (token, _) = issue_session_token("secret", Uuid::new_v4(), "hr", -2).unwrap();
        assert!(decode_session_token("secret", &token).is_err());
    }
}
