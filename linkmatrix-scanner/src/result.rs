use serde::{Deserialize, Deserializer, Serialize};

/// One crawled page as delivered by the crawl service.
///
/// Every field defaults when absent so a partial record still counts as a
/// page. `outbound_links` and `inbound_links` come from separate sources on
/// the server and are not guaranteed to agree with each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(
        default,
        alias = "outboundLinks",
        deserialize_with = "null_as_default"
    )]
    pub outbound_links: Vec<LinkRef>,
    #[serde(default, alias = "inboundLinks", deserialize_with = "null_as_default")]
    pub inbound_links: Vec<LinkRef>,
}

impl PageRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_outbound(mut self, targets: &[&str]) -> Self {
        self.outbound_links
            .extend(targets.iter().map(|t| LinkRef::new(*t)));
        self
    }

    pub fn with_inbound(mut self, sources: &[&str]) -> Self {
        self.inbound_links
            .extend(sources.iter().map(|s| LinkRef::new(*s)));
        self
    }
}

/// A hyperlink found on (or pointing at) a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LinkRefRepr")]
pub struct LinkRef {
    pub target_url: String,
    pub anchor_text: Option<String>,
    pub is_follow: bool,
    pub http_status: Option<u16>,
}

impl LinkRef {
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            anchor_text: None,
            is_follow: true,
            http_status: None,
        }
    }
}

/// Links arrive either as bare URL strings or as full objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum LinkRefRepr {
    Bare(String),
    Full {
        #[serde(
            default,
            alias = "targetUrl",
            alias = "url",
            alias = "href",
            deserialize_with = "null_as_default"
        )]
        target_url: String,
        #[serde(default, alias = "anchorText", alias = "text")]
        anchor_text: Option<String>,
        #[serde(default, alias = "isFollow", alias = "follow")]
        is_follow: Option<bool>,
        #[serde(default, alias = "httpStatus", alias = "status")]
        http_status: Option<u16>,
    },
}

impl From<LinkRefRepr> for LinkRef {
    fn from(repr: LinkRefRepr) -> Self {
        match repr {
            LinkRefRepr::Bare(url) => LinkRef::new(url),
            LinkRefRepr::Full {
                target_url,
                anchor_text,
                is_follow,
                http_status,
            } => LinkRef {
                target_url,
                anchor_text,
                is_follow: is_follow.unwrap_or(true),
                http_status,
            },
        }
    }
}

/// Explicit `null` reads the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
