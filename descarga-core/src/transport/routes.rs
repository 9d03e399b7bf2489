use descarga_model::MediaType;

use super::ApiRequest;

/// HTTP verb of a request.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Request kind without its arguments; handy for logging and test assertions.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Submit,
    Repeat,
    Progress,
    Summary,
    Page,
    Document,
    Archive,
}

impl ApiRequest {
    /// Endpoint family, without ids.
    pub fn endpoint(&self) -> Endpoint {
        match self {
            ApiRequest::Submit { .. } => Endpoint::Submit,
            ApiRequest::Repeat { .. } => Endpoint::Repeat,
            ApiRequest::Progress(_) => Endpoint::Progress,
            ApiRequest::Summary(_) => Endpoint::Summary,
            ApiRequest::Page { .. } => Endpoint::Page,
            ApiRequest::Document { .. } => Endpoint::Document,
            ApiRequest::Archive(_) => Endpoint::Archive,
        }
    }

    /// Only submit and repeat are POSTs.
    pub fn method(&self) -> HttpMethod {
        match self {
            ApiRequest::Submit { .. } => HttpMethod::Post,
            _ => HttpMethod::Get,
        }
    }

    /// Path (and query string) relative to the service root.
    pub fn path(&self) -> String {
        match self {
            ApiRequest::Submit { .. } => "/consultar".to_string(),
            ApiRequest::Repeat { id, .. } => format!("/repetir?uuid={id}"),
            ApiRequest::Progress(id) => format!("/consultas/{id}/progreso"),
            ApiRequest::Summary(id) => format!("/consultas/{id}/resumen"),
            ApiRequest::Page { id, page } => format!("/consultas/{id}/{page}"),
            ApiRequest::Document { cfdi, .. } => format!("/cfdi/{cfdi}"),
            ApiRequest::Archive(id) => format!("/consultas/{id}"),
        }
    }

    /// Representation asked for in the `Accept` header.
    pub fn accept(&self) -> MediaType {
        match self {
            ApiRequest::Document { media_type, .. } => *media_type,
            ApiRequest::Archive(_) => MediaType::Zip,
            _ => MediaType::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use descarga_model::{Credentials, QueryId};
    use uuid::Uuid;

    const ID: QueryId = QueryId(Uuid::from_u128(0x67e5_5044_10b1_426f_9247_bb68_0e5f_e0c8));

    #[test]
    fn query_scoped_paths() {
        assert_eq!(
            ApiRequest::Progress(ID).path(),
            "/consultas/67e55044-10b1-426f-9247-bb680e5fe0c8/progreso"
        );
        assert_eq!(
            ApiRequest::Summary(ID).path(),
            "/consultas/67e55044-10b1-426f-9247-bb680e5fe0c8/resumen"
        );
        assert_eq!(
            ApiRequest::Page { id: ID, page: 2 }.path(),
            "/consultas/67e55044-10b1-426f-9247-bb680e5fe0c8/2"
        );
        assert_eq!(
            ApiRequest::Archive(ID).path(),
            "/consultas/67e55044-10b1-426f-9247-bb680e5fe0c8"
        );
        assert_eq!(ApiRequest::Archive(ID).accept(), MediaType::Zip);
    }

    #[test]
    fn submit_is_the_only_post() {
        let creds = Credentials::new("AAA010101AAA", "pw");
        let submit = ApiRequest::Submit {
            credentials: creds.clone(),
            body: "{}".into(),
        };
        let repeat = ApiRequest::Repeat {
            id: ID,
            credentials: creds,
        };

        assert_eq!(submit.method(), HttpMethod::Post);
        assert_eq!(submit.path(), "/consultar");
        assert_eq!(repeat.method(), HttpMethod::Get);
        assert_eq!(
            repeat.path(),
            "/repetir?uuid=67e55044-10b1-426f-9247-bb680e5fe0c8"
        );
    }

    #[test]
    fn documents_honour_the_requested_media_type() {
        let cfdi = Uuid::from_u128(1);
        let request = ApiRequest::Document {
            cfdi,
            media_type: MediaType::Xml,
        };
        assert_eq!(request.endpoint(), Endpoint::Document);
        assert_eq!(request.accept(), MediaType::Xml);
        assert_eq!(request.path(), format!("/cfdi/{cfdi}"));
    }
}
