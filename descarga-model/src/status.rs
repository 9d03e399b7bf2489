use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a remote query, as reported by the service.
///
/// The service is the only authority on legal transitions; the client only
/// observes and classifies. Every value falls in exactly one of three
/// buckets: finished (completed or failed), [`QueryStatus::Repeat`], or still
/// running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QueryStatus {
    /// Queued, nothing downloaded yet.
    #[cfg_attr(feature = "serde", serde(rename = "EN_ESPERA"))]
    Waiting,
    /// Metadata download in progress.
    #[cfg_attr(feature = "serde", serde(rename = "EN_PROCESO"))]
    InProgress,
    /// Result count is known, XML documents are still being fetched.
    #[cfg_attr(feature = "serde", serde(rename = "DESCARGANDO"))]
    Downloading,
    /// The tax portal rejected the supplied credentials.
    #[cfg_attr(feature = "serde", serde(rename = "FALLO_AUTENTICACION"))]
    AuthFailed,
    /// More than 500 documents share the same issue minute.
    #[cfg_attr(feature = "serde", serde(rename = "FALLO_500_MISMO_HORARIO"))]
    RateLimitedSameWindow,
    #[cfg_attr(feature = "serde", serde(rename = "FALLO"))]
    Failed,
    #[cfg_attr(feature = "serde", serde(rename = "COMPLETADO"))]
    Completed,
    #[cfg_attr(feature = "serde", serde(rename = "COMPLETADO_CON_FALTANTES"))]
    CompletedWithGaps,
    /// All metadata was downloaded but some XML documents were not.
    #[cfg_attr(feature = "serde", serde(rename = "COMPLETADO_XML_FALTANTES"))]
    CompletedMissingXml,
    /// The service wants the query re-submitted, usually to fetch missing XML.
    #[cfg_attr(feature = "serde", serde(rename = "REPETIR"))]
    Repeat,
}

impl QueryStatus {
    pub const ALL: [QueryStatus; 10] = [
        QueryStatus::Waiting,
        QueryStatus::InProgress,
        QueryStatus::Downloading,
        QueryStatus::AuthFailed,
        QueryStatus::RateLimitedSameWindow,
        QueryStatus::Failed,
        QueryStatus::Completed,
        QueryStatus::CompletedWithGaps,
        QueryStatus::CompletedMissingXml,
        QueryStatus::Repeat,
    ];

    /// Wire token used by the remote service.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Waiting => "EN_ESPERA",
            QueryStatus::InProgress => "EN_PROCESO",
            QueryStatus::Downloading => "DESCARGANDO",
            QueryStatus::AuthFailed => "FALLO_AUTENTICACION",
            QueryStatus::RateLimitedSameWindow => "FALLO_500_MISMO_HORARIO",
            QueryStatus::Failed => "FALLO",
            QueryStatus::Completed => "COMPLETADO",
            QueryStatus::CompletedWithGaps => "COMPLETADO_CON_FALTANTES",
            QueryStatus::CompletedMissingXml => "COMPLETADO_XML_FALTANTES",
            QueryStatus::Repeat => "REPETIR",
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::CompletedWithGaps | Self::CompletedMissingXml
        ) || self.is_failed()
    }

    pub fn is_failed(self) -> bool {
        matches!(
            self,
            Self::AuthFailed | Self::RateLimitedSameWindow | Self::Failed
        )
    }

    pub fn is_repeat(self) -> bool {
        matches!(self, Self::Repeat)
    }

    /// Neither finished nor waiting for a repeat.
    pub fn is_running(self) -> bool {
        !self.is_finished() && !self.is_repeat()
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when the service reports a status token this client does not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown query status token '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for QueryStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Status snapshot plus the number of documents found so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Progress {
    #[cfg_attr(feature = "serde", serde(rename = "estado"))]
    pub status: QueryStatus,
    #[cfg_attr(feature = "serde", serde(rename = "encontrados", default))]
    pub found: u64,
}

impl Progress {
    pub fn new(status: QueryStatus, found: u64) -> Self {
        Self { status, found }
    }
}
