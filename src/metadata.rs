//! Loan metadata embedded in the on-chain `metadataCID` field.
//!
//! The borrower client inlines the descriptor as a `json:`-prefixed
//! string; anything else is a real content identifier resolved through
//! the storage gateway. Decoding is non-critical display data, so a
//! malformed payload degrades to defaults instead of failing the loan.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{error::Error, types::LoanCategory};

/// Prefix marking an inline JSON descriptor instead of a gateway CID.
pub const INLINE_PREFIX: &str = "json:";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanMetadata {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: LoanCategory,
    #[serde(default, rename = "supportingImage")]
    pub supporting_image: Option<String>,
    #[serde(default, rename = "emergencyContacts")]
    pub emergency_contacts: Option<EmergencyContacts>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContacts {
    pub contact1: EmergencyContact,
    pub contact2: EmergencyContact,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// Decode an inline descriptor. Returns `None` for a real CID, which the
/// caller resolves through the gateway and feeds to [`decode_document`].
pub fn decode_inline(metadata_cid: &str) -> Option<LoanMetadata> {
    metadata_cid
        .strip_prefix(INLINE_PREFIX)
        .map(|payload| decode_document(payload, metadata_cid))
}

/// Decode a JSON descriptor body, defaulting on any parse failure.
pub fn decode_document(payload: &str, origin: &str) -> LoanMetadata {
    match serde_json::from_str(payload) {
        Ok(metadata) => metadata,
        Err(e) => {
            let origin = origin.chars().take(64).collect::<String>();
            warn!(origin = %origin, "could not parse loan metadata: {}", e);
            LoanMetadata::default()
        },
    }
}

/// Encode a descriptor the way the borrower client embeds it at
/// loan-creation time.
pub fn encode_inline(metadata: &LoanMetadata) -> Result<String, Error> {
    Ok(format!("{}{}", INLINE_PREFIX, serde_json::to_string(metadata)?))
}

/// Check that a supporting image is a decodable base64 data-URI.
pub fn validate_data_uri(value: &str) -> Result<(), Error> {
    let rest = value.strip_prefix("data:").ok_or_else(|| {
        Error::Validation(String::from(
            "Supporting image must be a data URI",
        ))
    })?;

    let (mime, payload) = rest.split_once(";base64,").ok_or_else(|| {
        Error::Validation(String::from(
            "Supporting image must be base64 encoded",
        ))
    })?;

    if !mime.starts_with("image/") {
        return Err(Error::Validation(format!(
            "Supporting image has non-image type {}",
            mime
        )));
    }

    BASE64.decode(payload)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_round_trip() {
        let metadata = LoanMetadata {
            description: String::from("x"),
            category: LoanCategory::Retail,
            supporting_image: None,
            emergency_contacts: None,
        };

        let encoded = encode_inline(&metadata).unwrap();
        assert!(encoded.starts_with(INLINE_PREFIX));
        assert_eq!(decode_inline(&encoded).unwrap(), metadata);
    }

    #[test]
    fn contacts_survive_round_trip() {
        let metadata = LoanMetadata {
            description: String::from("pottery workshop"),
            category: LoanCategory::Crafts,
            supporting_image: None,
            emergency_contacts: Some(EmergencyContacts {
                contact1: EmergencyContact {
                    name: String::from("Ana"),
                    phone: String::from("+15551234567"),
                },
                contact2: EmergencyContact {
                    name: String::from("Luis"),
                    phone: String::from("+15557654321"),
                },
            }),
        };

        let encoded = encode_inline(&metadata).unwrap();
        assert_eq!(decode_inline(&encoded).unwrap(), metadata);
    }

    #[test]
    fn malformed_payload_defaults() {
        let decoded = decode_inline("json:{not json").unwrap();
        assert_eq!(decoded, LoanMetadata::default());
        assert_eq!(decoded.category, LoanCategory::Other);
        assert!(decoded.supporting_image.is_none());
    }

    #[test]
    fn real_cid_is_not_inline() {
        assert!(decode_inline("QmYwAPJzv5CZsnAzt8auVZRn").is_none());
    }

    #[test]
    fn unknown_category_defaults_to_other() {
        let decoded = decode_inline(
            r#"json:{"description":"d","category":"aviation"}"#,
        )
        .unwrap();
        assert_eq!(decoded.category, LoanCategory::Other);
        assert_eq!(decoded.description, "d");
    }

    #[test]
    fn wire_field_names_match_client() {
        let decoded = decode_inline(
            r#"json:{"description":"d","category":"retail","supportingImage":"data:image/png;base64,aGk=","emergencyContacts":{"contact1":{"name":"a","phone":"1"},"contact2":{"name":"b","phone":"2"}}}"#,
        )
        .unwrap();

        assert!(decoded.supporting_image.is_some());
        let contacts = decoded.emergency_contacts.unwrap();
        assert_eq!(contacts.contact1.name, "a");
        assert_eq!(contacts.contact2.phone, "2");
    }

    #[test]
    fn data_uri_validation() {
        assert!(validate_data_uri("data:image/png;base64,aGVsbG8=").is_ok());
        assert!(validate_data_uri("https://example.com/x.png").is_err());
        assert!(validate_data_uri("data:image/png;base64,!!!").is_err());
        assert!(validate_data_uri("data:text/plain;base64,aGk=").is_err());
    }
}
