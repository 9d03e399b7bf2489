//! Request envelopes and response payloads of the download service.

use descarga_model::{CfdiMeta, Progress, QueryId, SearchParams, Summary};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::{DescargaError, Result};
use crate::transport::ApiResponse;

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

static FORMAT_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Cf}").expect("format-character class compiles"));

/// Build the JSON envelope for a new query.
///
/// The SAT credentials travel inside the body; the contract credentials go in
/// headers and never appear here.
pub fn encode_submit(params: &SearchParams) -> String {
    let sat = params.sat_credentials();
    let mut descarga = json!({
        "rfcContribuyente": sat.user(),
        "password": sat.password(),
        "fechaInicio": params.start().format(DATE_TIME_FORMAT).to_string(),
        "fechaFin": params.end().format(DATE_TIME_FORMAT).to_string(),
        "tipoDoc": params.document_type().as_wire(),
        "status": params.status().as_wire(),
    });

    if let Some(direction) = params.direction() {
        descarga["tipo"] = json!(direction.as_wire());
    }
    if let Some(rfc) = params.search_rfc() {
        descarga["rfcBusqueda"] = json!(rfc);
    }

    json!({
        "servicio": params.service().code(),
        "descarga": descarga,
    })
    .to_string()
}

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    data: Option<SubmitData>,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    uuid: QueryId,
}

fn error_text(value: &Value) -> String {
    match value {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}

fn parse_reply(response: &ApiResponse) -> Result<Reply> {
    match serde_json::from_str::<Reply>(&response.body) {
        Ok(reply) => Ok(reply),
        Err(_) if !response.is_ok() => Err(unexpected(response)),
        Err(err) => Err(DescargaError::Decode(err)),
    }
}

/// Extract the new query id, or the service's rejection message.
pub fn decode_submit(response: &ApiResponse) -> Result<QueryId> {
    let reply = parse_reply(response)?;
    if let Some(error) = reply.error.as_ref() {
        return Err(DescargaError::rejected(error_text(error)));
    }
    match reply.data {
        Some(data) => Ok(data.uuid),
        None => Err(unexpected(response)),
    }
}

/// A repeat reply carries no id; only a rejection message matters.
pub fn decode_repeat(response: &ApiResponse) -> Result<()> {
    let reply = parse_reply(response)?;
    if let Some(error) = reply.error.as_ref() {
        return Err(DescargaError::rejected(error_text(error)));
    }
    if !response.is_ok() {
        return Err(unexpected(response));
    }
    Ok(())
}

/// Decode a progress reply; non-200 is an unexpected status.
pub fn decode_progress(response: &ApiResponse) -> Result<Progress> {
    decode_ok(response)
}

/// Decode a summary reply.
pub fn decode_summary(response: &ApiResponse) -> Result<Summary> {
    decode_ok(response)
}

/// Decode one page of result rows.
pub fn decode_page(response: &ApiResponse) -> Result<Vec<CfdiMeta>> {
    decode_ok(response)
}

fn decode_ok<T: DeserializeOwned>(response: &ApiResponse) -> Result<T> {
    if !response.is_ok() {
        return Err(unexpected(response));
    }
    Ok(serde_json::from_str(&response.body)?)
}

fn unexpected(response: &ApiResponse) -> DescargaError {
    DescargaError::UnexpectedStatus {
        status: response.status,
        body: response.body.clone(),
    }
}

/// Strip invisible format characters (BOM, zero-width joiners) and
/// surrounding whitespace. `None` when nothing is left.
pub fn normalize_xml(raw: &str) -> Option<String> {
    let cleaned = FORMAT_CHARS.replace_all(raw, "");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use descarga_model::{Credentials, DocumentDirection, DocumentStatus, QueryStatus, Service};

    fn params() -> SearchParams {
        let day = |d| {
            NaiveDate::from_ymd_opt(2023, 3, d)
                .and_then(|date| date.and_hms_opt(8, 30, 0))
                .expect("valid date")
        };
        SearchParams::builder()
            .start(day(1))
            .end(day(31))
            .status(DocumentStatus::Canceled)
            .direction(DocumentDirection::Received)
            .service(Service::ApiCiec)
            .search_rfc("XAXX010101000")
            .sat_credentials(Credentials::new("AAA010101AAA", "ciec"))
            .build()
            .expect("valid params")
    }

    #[test]
    fn submit_envelope_layout() {
        let body: Value = serde_json::from_str(&encode_submit(&params())).expect("json");

        assert_eq!(body["servicio"], "CRAPI");
        let descarga = &body["descarga"];
        assert_eq!(descarga["rfcContribuyente"], "AAA010101AAA");
        assert_eq!(descarga["password"], "ciec");
        assert_eq!(descarga["fechaInicio"], "2023-03-01T08:30:00");
        assert_eq!(descarga["fechaFin"], "2023-03-31T08:30:00");
        assert_eq!(descarga["tipo"], "recibidas");
        assert_eq!(descarga["tipoDoc"], "cfdi");
        assert_eq!(descarga["status"], "cancelados");
        assert_eq!(descarga["rfcBusqueda"], "XAXX010101000");
    }

    #[test]
    fn optional_envelope_fields_are_omitted() {
        let params = SearchParams::builder()
            .start(params().start())
            .end(params().end())
            .sat_credentials(Credentials::new("AAA010101AAA", "ciec"))
            .build()
            .expect("valid params");
        let body: Value = serde_json::from_str(&encode_submit(&params)).expect("json");

        assert_eq!(body["servicio"], "CSRN");
        assert!(body["descarga"].get("tipo").is_none());
        assert!(body["descarga"].get("rfcBusqueda").is_none());
        assert_eq!(body["descarga"]["status"], "todos");
    }

    #[test]
    fn submit_reply_yields_id_or_rejection() {
        let ok = ApiResponse::new(
            200,
            r#"{"data":{"uuid":"67e55044-10b1-426f-9247-bb680e5fe0c8"}}"#,
        );
        assert_eq!(
            decode_submit(&ok).expect("id").to_string(),
            "67e55044-10b1-426f-9247-bb680e5fe0c8"
        );

        let rejected = ApiResponse::new(200, r#"{"error":"credenciales invalidas"}"#);
        match decode_submit(&rejected) {
            Err(DescargaError::InvalidQuery { message, cause }) => {
                assert_eq!(message, "credenciales invalidas");
                assert!(cause.is_none());
            }
            other => panic!("expected rejection, got {other:?}"),
        }

        let gateway = ApiResponse::new(502, "<html>bad gateway</html>");
        assert!(matches!(
            decode_submit(&gateway),
            Err(DescargaError::UnexpectedStatus { status: 502, .. })
        ));
    }

    #[test]
    fn repeat_reply_only_reports_errors() {
        assert!(decode_repeat(&ApiResponse::new(200, "{}")).is_ok());
        assert!(matches!(
            decode_repeat(&ApiResponse::new(200, r#"{"error":"no"}"#)),
            Err(DescargaError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn progress_requires_success_status() {
        let progress = decode_progress(&ApiResponse::new(
            200,
            r#"{"estado":"DESCARGANDO","encontrados":12}"#,
        ))
        .expect("progress");
        assert_eq!(progress.status, QueryStatus::Downloading);
        assert_eq!(progress.found, 12);

        assert!(matches!(
            decode_progress(&ApiResponse::new(500, "boom")),
            Err(DescargaError::UnexpectedStatus { status: 500, .. })
        ));
    }

    #[test]
    fn xml_is_stripped_of_format_characters() {
        assert_eq!(
            normalize_xml("\u{feff}  <cfdi/>\u{200b}\n").as_deref(),
            Some("<cfdi/>")
        );
        assert_eq!(normalize_xml("\u{feff}\u{200d} \n"), None);
        assert_eq!(normalize_xml(""), None);
    }
}
