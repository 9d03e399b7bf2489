use chrono::{Local, NaiveDateTime};

use crate::credentials::Credentials;
use crate::error::{Result, ValidationError};

/// Document validity to filter by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DocumentStatus {
    Active,
    Canceled,
    #[default]
    All,
}

impl DocumentStatus {
    pub fn as_wire(&self) -> &'static str {
        match self {
            DocumentStatus::Active => "vigentes",
            DocumentStatus::Canceled => "cancelados",
            DocumentStatus::All => "todos",
        }
    }
}

/// Which side of the transaction the queried taxpayer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentDirection {
    Issued,
    Received,
    All,
}

impl DocumentDirection {
    pub fn as_wire(&self) -> &'static str {
        match self {
            DocumentDirection::Issued => "emitidas",
            DocumentDirection::Received => "recibidas",
            DocumentDirection::All => "todas",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DocumentType {
    #[default]
    Cfdi,
    Retention,
}

impl DocumentType {
    pub fn as_wire(&self) -> &'static str {
        match self {
            DocumentType::Cfdi => "cfdi",
            DocumentType::Retention => "retencion",
        }
    }
}

/// Back-end product that executes the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Service {
    #[default]
    CsReporter,
    ApiCiec,
}

impl Service {
    pub fn code(&self) -> &'static str {
        match self {
            Service::CsReporter => "CSRN",
            Service::ApiCiec => "CRAPI",
        }
    }
}

/// Validated search parameters for a new bulk query.
///
/// Only obtainable through [`SearchParams::builder`], so a value in hand has
/// already passed the date-range and credential checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    search_rfc: Option<String>,
    start: NaiveDateTime,
    end: NaiveDateTime,
    status: DocumentStatus,
    direction: Option<DocumentDirection>,
    service: Service,
    document_type: DocumentType,
    sat_credentials: Credentials,
}

impl SearchParams {
    pub fn builder() -> SearchParamsBuilder {
        SearchParamsBuilder::default()
    }

    /// RFC of the counterpart to filter by, if any.
    pub fn search_rfc(&self) -> Option<&str> {
        self.search_rfc.as_deref()
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn direction(&self) -> Option<DocumentDirection> {
        self.direction
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn sat_credentials(&self) -> &Credentials {
        &self.sat_credentials
    }

    pub fn validate(&self) -> Result<()> {
        validate_window(self.start, self.end)?;
        if !self.sat_credentials.is_complete() {
            return Err(ValidationError::MissingSatCredentials);
        }
        Ok(())
    }
}

fn validate_window(start: NaiveDateTime, end: NaiveDateTime) -> Result<()> {
    if start > end {
        return Err(ValidationError::InvertedDateRange);
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct SearchParamsBuilder {
    search_rfc: Option<String>,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    status: DocumentStatus,
    direction: Option<DocumentDirection>,
    service: Service,
    document_type: DocumentType,
    sat_credentials: Option<Credentials>,
}

impl SearchParamsBuilder {
    pub fn search_rfc(mut self, rfc: impl Into<String>) -> Self {
        self.search_rfc = Some(rfc.into());
        self
    }

    /// Earliest issue date-time to include.
    pub fn start(mut self, start: NaiveDateTime) -> Self {
        self.start = Some(start);
        self
    }

    /// Latest issue date-time to include; defaults to now.
    pub fn end(mut self, end: NaiveDateTime) -> Self {
        self.end = Some(end);
        self
    }

    pub fn status(mut self, status: DocumentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn direction(mut self, direction: DocumentDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn service(mut self, service: Service) -> Self {
        self.service = service;
        self
    }

    pub fn document_type(mut self, document_type: DocumentType) -> Self {
        self.document_type = document_type;
        self
    }

    pub fn sat_credentials(mut self, credentials: Credentials) -> Self {
        self.sat_credentials = Some(credentials);
        self
    }

    pub fn build(self) -> Result<SearchParams> {
        let start = self.start.ok_or(ValidationError::MissingField("start"))?;
        let end = self.end.unwrap_or_else(|| Local::now().naive_local());
        validate_window(start, end)?;

        let sat_credentials = self
            .sat_credentials
            .filter(Credentials::is_complete)
            .ok_or(ValidationError::MissingSatCredentials)?;

        Ok(SearchParams {
            search_rfc: self.search_rfc.filter(|rfc| !rfc.trim().is_empty()),
            start,
            end,
            status: self.status,
            direction: self.direction,
            service: self.service,
            document_type: self.document_type,
            sat_credentials,
        })
    }
}
