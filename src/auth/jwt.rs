use anyhow::Context;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use super::claims::{Claims, UserClaims};
use crate::{config::JwtConfig, errors::AppError};

/// HS256 signing and verification keys, built once at startup.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    /// Fails when the configured secret is not valid base64.
    pub fn from_config(cfg: &JwtConfig) -> anyhow::Result<Self> {
        let encoding =
            EncodingKey::from_base64_secret(&cfg.secret).context("JWT_SECRET is not base64")?;
        let decoding =
            DecodingKey::from_base64_secret(&cfg.secret).context("JWT_SECRET is not base64")?;
        Ok(Self {
            encoding,
            decoding,
            ttl: Duration::minutes(cfg.expiration_minutes),
        })
    }

    pub fn issue(
        &self,
        subject: &str,
        user: UserClaims,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let exp = now + self.ttl;
        let claims = Claims {
            sub: subject.to_string(),
            user,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("sign jwt")?;
        debug!(subject = %subject, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    /// Verifies signature and expiry before any claim is read.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            warn!(error = %e, "jwt rejected");
            AppError::InvalidToken
        })?;
        // jsonwebtoken accepts exp == now; a token is only valid strictly before exp
        if data.claims.exp <= OffsetDateTime::now_utc().unix_timestamp() {
            warn!(subject = %data.claims.sub, exp = data.claims.exp, "jwt expired");
            return Err(AppError::InvalidToken);
        }
        debug!(subject = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}
