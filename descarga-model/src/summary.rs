/// Aggregate counts available once a query has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Summary {
    /// Total documents found.
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "null_as_default")
    )]
    pub total: u64,
    /// Number of result pages the service will serve.
    #[cfg_attr(feature = "serde", serde(rename = "paginas", default))]
    pub pages: u32,
    /// Whether some documents lack their XML.
    #[cfg_attr(feature = "serde", serde(rename = "xmlFaltantes", default))]
    pub has_missing_xml: bool,
    /// Documents reported as canceled.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "cancelados", default, deserialize_with = "null_as_default")
    )]
    pub canceled: u64,
}

impl Summary {
    pub fn has_results(&self) -> bool {
        self.total > 0
    }

    /// Whether `page` (1-based) can be requested from the service.
    pub fn contains_page(&self, page: u32) -> bool {
        self.has_results() && page >= 1 && page <= self.pages
    }
}

// The service sends `null` counts for queries that found nothing.
#[cfg(feature = "serde")]
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    use serde::Deserialize;
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
