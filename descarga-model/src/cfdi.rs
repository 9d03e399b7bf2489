use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Taxpayer appearing on a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FiscalEntity {
    pub rfc: String,
    #[cfg_attr(feature = "serde", serde(rename = "razonSocial", default))]
    pub legal_name: Option<String>,
}

/// Document kind as stamped on the CFDI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum CfdiKind {
    Ingreso,
    Egreso,
    Traslado,
    Pago,
    Nomina,
}

/// Validity of a document according to the tax authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CfdiStatus {
    #[cfg_attr(feature = "serde", serde(rename = "CANCELADO"))]
    Canceled,
    #[cfg_attr(feature = "serde", serde(rename = "VIGENTE"))]
    Active,
}

/// Metadata row returned in a results page.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CfdiMeta {
    pub folio: Uuid,
    #[cfg_attr(feature = "serde", serde(rename = "emisor", default))]
    pub issuer: Option<FiscalEntity>,
    #[cfg_attr(feature = "serde", serde(rename = "receptor", default))]
    pub receiver: Option<FiscalEntity>,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "fechaEmision", default, with = "wire_datetime")
    )]
    pub issued_at: Option<NaiveDateTime>,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "fechaCertificacion", default, with = "wire_datetime")
    )]
    pub certified_at: Option<NaiveDateTime>,
    #[cfg_attr(feature = "serde", serde(rename = "PACCertificador", default))]
    pub certifier: Option<FiscalEntity>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub total: Option<Decimal>,
    #[cfg_attr(feature = "serde", serde(rename = "tipo", default))]
    pub kind: Option<CfdiKind>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: Option<CfdiStatus>,
}

impl CfdiMeta {
    pub fn is_canceled(&self) -> bool {
        self.status == Some(CfdiStatus::Canceled)
    }
}

/// Date-times arrive either with an offset (`2022-01-05T10:00:00-06:00`) or
/// without one; the local wall-clock time is kept in both cases.
#[cfg(feature = "serde")]
mod wire_datetime {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(with_offset.naive_local()));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}
