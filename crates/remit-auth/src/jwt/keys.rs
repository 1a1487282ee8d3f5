//! RSA key material for signing and verifying tokens.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use remit_core::config::auth::AuthConfig;
use remit_core::error::{AppError, ErrorKind};

/// The RS256 key pair shared by the encoder and decoder.
///
/// Only the public half is needed to verify; downstream services holding
/// just the public key can validate tokens without calling back here.
#[derive(Clone)]
pub struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeys")
            .field("algorithm", &Algorithm::RS256)
            .finish_non_exhaustive()
    }
}

impl SigningKeys {
    /// Parse a PEM key pair and check that the halves belong together.
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, AppError> {
        let encoding = EncodingKey::from_rsa_pem(private_pem).map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid RSA private key", e)
        })?;
        let decoding = DecodingKey::from_rsa_pem(public_pem).map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid RSA public key", e)
        })?;

        let keys = Self { encoding, decoding };
        keys.check_pair()?;
        Ok(keys)
    }

    /// Load the key pair from configuration: inline PEM first, then paths.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        let private = load_pem(
            "private",
            config.jwt_private_key.as_deref(),
            config.jwt_private_key_path.as_deref(),
        )?;
        let public = load_pem(
            "public",
            config.jwt_public_key.as_deref(),
            config.jwt_public_key_path.as_deref(),
        )?;
        Self::from_pem(&private, &public)
    }

    pub(crate) fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }

    fn check_pair(&self) -> Result<(), AppError> {
        let sample = serde_json::json!({ "check": true });
        let token = encode(&Header::new(Algorithm::RS256), &sample, &self.encoding).map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "RSA private key cannot sign", e)
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        decode::<serde_json::Value>(&token, &self.decoding, &validation).map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                "RSA public key does not match the private key",
                e,
            )
        })?;
        Ok(())
    }
}

fn load_pem(which: &str, inline: Option<&str>, path: Option<&str>) -> Result<Vec<u8>, AppError> {
    if let Some(pem) = inline.filter(|s| !s.trim().is_empty()) {
        return Ok(pem.as_bytes().to_vec());
    }
    match path {
        Some(path) => std::fs::read(path).map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Cannot read JWT {which} key from '{path}'"),
                e,
            )
        }),
        None => Err(AppError::configuration(format!(
            "JWT {which} key is not configured"
        ))),
    }
}
