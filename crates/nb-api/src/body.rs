//! Request body decoding.
//!
//! Nullboard sends boards as `application/x-www-form-urlencoded` with the
//! board JSON in a `data` field; other clients send plain JSON. The
//! encoding is resolved once here and the core only ever sees documents.

use nb_core::error::{AppError, Result};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    FormEncoded,
    JsonEncoded,
    Unrecognized,
}

impl BodyEncoding {
    /// `mime` is the bare content type without parameters.
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "application/x-www-form-urlencoded" => BodyEncoding::FormEncoded,
            "application/json" | "text/javascript" => BodyEncoding::JsonEncoded,
            _ => BodyEncoding::Unrecognized,
        }
    }
}

/// The two views of a request body.
#[derive(Debug, Default, PartialEq)]
pub struct DecodedBody {
    /// Everything that was sent.
    pub full: Option<Value>,
    /// Just the board.
    pub board: Option<Value>,
}

pub fn decode(encoding: BodyEncoding, body: &[u8]) -> Result<DecodedBody> {
    match encoding {
        BodyEncoding::FormEncoded => decode_form(body),
        BodyEncoding::JsonEncoded => {
            if body.iter().all(u8::is_ascii_whitespace) {
                return Ok(DecodedBody::default());
            }
            let document: Value = serde_json::from_slice(body)
                .map_err(|e| AppError::ValidationError(format!("body is not valid JSON: {e}")))?;
            Ok(DecodedBody {
                full: Some(document.clone()),
                board: Some(document),
            })
        }
        BodyEncoding::Unrecognized => Ok(DecodedBody::default()),
    }
}

fn decode_form(body: &[u8]) -> Result<DecodedBody> {
    let fields: Map<String, Value> = url::form_urlencoded::parse(body)
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect();

    let board = match fields.get("data").and_then(Value::as_str) {
        None | Some("") => Value::Object(Map::new()),
        Some(text) => serde_json::from_str(text)
            .map_err(|e| AppError::ValidationError(format!("form field `data` is not valid JSON: {e}")))?,
    };

    Ok(DecodedBody {
        full: Some(Value::Object(fields)),
        board: Some(board),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodings() {
        assert_eq!(BodyEncoding::from_mime("application/x-www-form-urlencoded"), BodyEncoding::FormEncoded);
        assert_eq!(BodyEncoding::from_mime("Application/JSON"), BodyEncoding::JsonEncoded);
        assert_eq!(BodyEncoding::from_mime("text/javascript"), BodyEncoding::JsonEncoded);
        assert_eq!(BodyEncoding::from_mime("text/plain"), BodyEncoding::Unrecognized);
        assert_eq!(BodyEncoding::from_mime(""), BodyEncoding::Unrecognized);
    }

    #[test]
    fn form_body_splits_envelope_and_board() {
        let body = b"self=http%3A%2F%2Flocalhost&data=%7B%22id%22%3A7%2C%22title%22%3A%22a+b%22%7D";
        let decoded = decode(BodyEncoding::FormEncoded, body).unwrap();

        assert_eq!(decoded.board, Some(json!({ "id": 7, "title": "a b" })));
        assert_eq!(
            decoded.full,
            Some(json!({ "self": "http://localhost", "data": "{\"id\":7,\"title\":\"a b\"}" }))
        );
    }

    #[test]
    fn form_without_data_gives_empty_board() {
        let decoded = decode(BodyEncoding::FormEncoded, b"x=1").unwrap();
        assert_eq!(decoded.board, Some(json!({})));
    }

    #[test]
    fn malformed_json_is_a_client_error() {
        let err = decode(BodyEncoding::FormEncoded, b"data=%7Bnope").unwrap_err();
        assert!(err.is_client_error());
        let err = decode(BodyEncoding::JsonEncoded, b"[1,").unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn unrecognized_and_empty_bodies_carry_nothing() {
        assert_eq!(decode(BodyEncoding::Unrecognized, b"whatever").unwrap(), DecodedBody::default());
        assert_eq!(decode(BodyEncoding::JsonEncoded, b"  ").unwrap(), DecodedBody::default());
    }
}
