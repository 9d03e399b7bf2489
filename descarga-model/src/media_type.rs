/// Representation requested from the document endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Json,
    Xml,
    Zip,
}

impl MediaType {
    pub fn as_mime(&self) -> &'static str {
        match self {
            MediaType::Json => "application/json",
            MediaType::Xml => "application/xml",
            MediaType::Zip => "application/zip",
        }
    }
}
